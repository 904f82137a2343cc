//! Server error types and their mapping onto wire error kinds.

use sealnote_crypto::CryptoError;
use sealnote_storage::StorageError;
use sealnote_types::ErrorKind;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur while handling a request.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("authentication required")]
    Unauthorized,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("access denied")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error("storage error: {0}")]
    Storage(StorageError),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

impl From<StorageError> for ServerError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound => ServerError::NotFound,
            StorageError::Forbidden => ServerError::Forbidden,
            StorageError::Conflict(msg) => ServerError::Conflict(msg),
            StorageError::InvalidInput(msg) => ServerError::BadRequest(msg),
            other => ServerError::Storage(other),
        }
    }
}

impl ServerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServerError::BadRequest(_) => ErrorKind::BadRequest,
            ServerError::Unauthorized | ServerError::InvalidCredentials => ErrorKind::Unauthorized,
            ServerError::Forbidden => ErrorKind::Forbidden,
            ServerError::NotFound => ErrorKind::NotFound,
            ServerError::Conflict(_) => ErrorKind::Conflict,
            ServerError::Config(_)
            | ServerError::PasswordHash(_)
            | ServerError::Storage(_)
            | ServerError::Crypto(_) => ErrorKind::Internal,
        }
    }

    /// Message sent to the client. Internal failures are not described.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => "internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}
