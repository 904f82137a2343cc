//! Encryption layer for SealNote.
//!
//! Provides end-to-end encryption of notes using:
//! - PBKDF2-HMAC-SHA256 for key derivation from passwords
//! - AES-256-CBC with an HMAC-SHA256 tag (encrypt-then-MAC) for content
//!   and key wrapping
//! - P-256 ECDH, hashed with SHA-256, for per-share session keys
//! - Secure key management with zeroization
//!
//! # Architecture
//!
//! The encryption uses a three-tier key system:
//!
//! 1. **Master Key**: Derived from the user's password and a server-issued
//!    salt. Never stored - it's derived each time the user logs in.
//!
//! 2. **File Key**: A random key generated for each uploaded note. The file
//!    key is wrapped with the master key and stored alongside the ciphertext.
//!
//! 3. **Session Key**: Derived per share from an ephemeral key pair and the
//!    recipient's identity public key. It wraps the file key for exactly one
//!    recipient; the ephemeral private key is dropped as soon as the
//!    envelope is sealed.
//!
//! The server only ever sees ciphertext, wrapped keys, and public keys.

mod cipher;
pub mod ecdh;
mod encoding;
pub mod envelope;
mod error;
mod key;
mod random;

pub use cipher::{decrypt, encrypt, BLOCK_SIZE, TAG_SIZE};
pub use ecdh::{compute_shared_secret, parse_public_key, KeyPair, PUBLIC_KEY_SIZE, SECRET_KEY_SIZE};
pub use encoding::{base64_decode, base64_encode, from_hex, to_hex};
pub use envelope::{
    decrypt_note, derive_session_key, encrypt_note, open_file_key, protect_identity_key,
    recover_identity_key, seal_file_key, unwrap_key, wrap_key, EncryptedNote,
    ProtectedIdentityKey, SealedFileKey, WRAPPED_KEY_LEN,
};
pub use error::{CryptoError, CryptoResult};
pub use key::{
    derive_key, generate_salt, KdfParams, SymmetricKey, IV_SIZE, KEY_SIZE,
    MIN_PBKDF2_ITERATIONS, PBKDF2_ITERATIONS, SALT_SIZE,
};
pub use random::{fill_random, generate_random_bytes};
