use linkstash_types::LinkInputError;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    InvalidInput(#[from] LinkInputError),

    #[error("User already exists: {0}")]
    DuplicateUser(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Link not found: {0}")]
    LinkNotFound(String),

    #[error("Link already saved: {0}")]
    DuplicateUrl(String),

    /// Every compare-and-swap attempt on a shared document lost the race.
    #[error("Write conflict on document {0}")]
    Conflict(String),

    #[error("Backing store unavailable: {0}")]
    Unavailable(String),

    #[error("Stored data is corrupt: {0}")]
    Corrupt(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Corrupt(e.to_string())
    }
}

impl From<linkstash_crypto::HashError> for StoreError {
    fn from(e: linkstash_crypto::HashError) -> Self {
        StoreError::Corrupt(e.to_string())
    }
}
