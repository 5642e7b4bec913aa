use reqwest::StatusCode;
use thiserror::Error;

/// Failures surfaced by [`crate::infra::api_client::ApiClient`].
///
/// A 401 is reported as [`ClientError::Unauthorized`] after the session
/// expiry hooks have run; callers still see the failure.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No response was received.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend rejected the bearer credential.
    #[error("Unauthorized - please login again")]
    Unauthorized,

    /// Any other non-success status, passed through untouched.
    #[error("Request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// The response body was not the JSON the caller asked for.
    #[error("Failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

impl ClientError {
    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Transport(err) => err.status(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }
}
