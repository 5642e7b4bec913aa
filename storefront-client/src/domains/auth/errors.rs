//! Authentication error types
//!
//! Storage and session failures for the auth domain, built on thiserror.
//! HTTP failures live in [`crate::infra::errors`] and are wrapped here when
//! an auth operation goes over the network.

use std::path::PathBuf;

use storefront_model::ModelError;
use thiserror::Error;

use crate::infra::errors::ClientError;

/// Main authentication error type
#[derive(Debug, Error)]
pub enum AuthError {
    /// Durable session storage failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The backend call failed
    #[error("Request error: {0}")]
    Client(#[from] ClientError),

    /// The backend returned a token/role pair we cannot hold
    #[error("Invalid session: {0}")]
    InvalidSession(#[from] ModelError),

    /// The operation needs a session and there is none
    #[error("Not authenticated")]
    NotAuthenticated,
}

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to read session from {path}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write session to {path}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove session at {path}")]
    RemoveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize session")]
    Serialize(#[source] serde_json::Error),
}

/// Result type alias for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
