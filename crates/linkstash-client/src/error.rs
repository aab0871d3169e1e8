use linkstash_types::LinkInputError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Not signed in")]
    NotSignedIn,

    /// 401/403. The session drops back to signed-out when it sees this.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("User not found")]
    UserNotFound,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Link {0} is not in the local collection")]
    UnknownLink(String),

    #[error(transparent)]
    InvalidInput(#[from] LinkInputError),

    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid server URL: {0}")]
    BaseUrl(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ClientError {
    /// Classify a non-2xx response.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => ClientError::Unauthorized(message),
            404 => ClientError::NotFound(message),
            500..=599 => ClientError::Unavailable(message),
            _ => ClientError::Rejected { status, message },
        }
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ClientError::Unauthorized(_))
    }
}
