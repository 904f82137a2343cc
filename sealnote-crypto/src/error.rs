//! Error types for cryptographic operations.
//!
//! Messages are fixed strings or structural facts (lengths, parse errors).
//! They never carry key bytes, passwords, or plaintext.

use thiserror::Error;

pub type CryptoResult<T> = Result<T, CryptoError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// The OS entropy source failed. Fatal for every composed operation.
    #[error("secure random generation failed")]
    Rng,

    #[error("key agreement failed: {0}")]
    KeyAgreement(String),

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// Authentication, padding, or length check failed after decryption.
    /// Means wrong key or tampered data; callers must not retry.
    #[error("cannot decrypt: wrong key or tampered data")]
    Integrity,

    #[error("malformed encoding: {0}")]
    Encoding(String),
}

impl CryptoError {
    /// True for the "wrong key or tampered data" family.
    pub fn is_integrity(&self) -> bool {
        matches!(self, CryptoError::Integrity)
    }

    /// True for failures of the primitives themselves (entropy, curve math).
    pub fn is_fatal(&self) -> bool {
        matches!(self, CryptoError::Rng | CryptoError::KeyAgreement(_))
    }
}
