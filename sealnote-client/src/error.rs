//! Client error types.

use sealnote_crypto::CryptoError;
use sealnote_types::protocol::ErrorBody;
use sealnote_types::{ErrorKind, TypesError};
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced to the user of a [`crate::NoteClient`].
///
/// Server refusals arrive as coarse kinds: `AccessDenied` and `NotFound`
/// never say whether a record expired, was revoked, or never existed.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("access denied")]
    AccessDenied,

    #[error("not found")]
    NotFound,

    #[error("already exists: {0}")]
    Conflict(String),

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("session expired, log in again")]
    Unauthorized,

    #[error("request rejected: {0}")]
    BadRequest(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("not logged in")]
    NotLoggedIn,

    #[error("identity key unavailable, shared notes cannot be opened in this session")]
    NoIdentityKey,

    #[error("no recipient could be added to the share link")]
    NoRecipients,

    #[error("local key storage: {0}")]
    KeyStore(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    Protocol(String),

    #[error("invalid input: {0}")]
    InvalidInput(#[from] TypesError),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

impl From<ErrorBody> for ClientError {
    fn from(body: ErrorBody) -> Self {
        match body.kind {
            ErrorKind::Forbidden => ClientError::AccessDenied,
            ErrorKind::NotFound => ClientError::NotFound,
            ErrorKind::Conflict => ClientError::Conflict(body.message),
            ErrorKind::Unauthorized => ClientError::Unauthorized,
            ErrorKind::BadRequest => ClientError::BadRequest(body.message),
            ErrorKind::Internal => ClientError::Server(body.message),
        }
    }
}

impl ClientError {
    /// True when the stored ciphertext or envelope did not open.
    pub fn is_integrity(&self) -> bool {
        matches!(self, ClientError::Crypto(e) if e.is_integrity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(kind: ErrorKind) -> ErrorBody {
        ErrorBody {
            kind,
            message: "detail".into(),
        }
    }

    #[test]
    fn server_kinds_map_to_client_errors() {
        assert!(matches!(ClientError::from(body(ErrorKind::Forbidden)), ClientError::AccessDenied));
        assert!(matches!(ClientError::from(body(ErrorKind::NotFound)), ClientError::NotFound));
        assert!(matches!(ClientError::from(body(ErrorKind::Unauthorized)), ClientError::Unauthorized));
        assert!(matches!(
            ClientError::from(body(ErrorKind::Conflict)),
            ClientError::Conflict(m) if m == "detail"
        ));
    }

    #[test]
    fn integrity_is_classified() {
        assert!(ClientError::Crypto(CryptoError::Integrity).is_integrity());
        assert!(!ClientError::Crypto(CryptoError::Rng).is_integrity());
        assert!(!ClientError::NotFound.is_integrity());
    }
}
