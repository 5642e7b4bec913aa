//! Errors raised by model constructors and parsers.

use std::fmt::{self, Display};

/// Errors produced by model constructors and parsers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A role string outside `{customer, seller, admin}`.
    UnknownRole(String),
    /// A severity string outside `{info, success, warning, error}`.
    UnknownSeverity(String),
    /// A session token that is empty or whitespace only.
    EmptyToken,
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::UnknownRole(raw) => write!(f, "unknown role: {raw}"),
            ModelError::UnknownSeverity(raw) => {
                write!(f, "unknown severity: {raw}")
            }
            ModelError::EmptyToken => write!(f, "session token is empty"),
        }
    }
}

impl std::error::Error for ModelError {}

/// Result alias for model constructors and parsers.
pub type Result<T> = std::result::Result<T, ModelError>;
