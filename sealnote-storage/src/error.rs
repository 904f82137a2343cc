//! Error types for the storage layer.

use thiserror::Error;

/// All errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// Record is missing, expired, or not visible to the caller.
    #[error("not found")]
    NotFound,

    /// Caller does not own the record it tried to modify.
    #[error("forbidden")]
    Forbidden,

    #[error("already exists: {0}")]
    Conflict(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] sealnote_crypto::CryptoError),
}

pub type StorageResult<T> = Result<T, StorageError>;
