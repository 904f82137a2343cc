//! Envelope encryption for notes and shares.
//!
//! A note's content is encrypted under a fresh file key. The file key is
//! wrapped under the owner's master key for storage, and rewrapped under a
//! per-share session key (ephemeral ECDH) for each recipient. The identity
//! private key is itself wrapped under a password-derived key for local
//! storage.

use crate::cipher::{decrypt, encrypt};
use crate::ecdh::{compute_shared_secret, parse_public_key, KeyPair};
use crate::encoding::{base64_decode, base64_encode, from_hex, to_hex};
use crate::error::{CryptoError, CryptoResult};
use crate::key::{derive_key, generate_salt, KdfParams, SymmetricKey, IV_SIZE, KEY_SIZE};
use crate::random::fill_random;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Decoded length of a wrapped 32-byte key: IV + two CBC blocks + padding block + tag.
pub const WRAPPED_KEY_LEN: usize = 96;

fn random_iv() -> CryptoResult<[u8; IV_SIZE]> {
    let mut iv = [0u8; IV_SIZE];
    fill_random(&mut iv)?;
    Ok(iv)
}

fn require_key_len(bytes: &[u8]) -> CryptoResult<()> {
    if bytes.len() != KEY_SIZE {
        return Err(CryptoError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: bytes.len(),
        });
    }
    Ok(())
}

/// Wraps a 32-byte key under a 32-byte wrapping key.
///
/// Returns `base64(iv ‖ ciphertext ‖ tag)`. The caller still owns
/// `key_to_wrap` and its zeroing obligation.
pub fn wrap_key(key_to_wrap: &[u8], wrapping_key: &[u8]) -> CryptoResult<String> {
    require_key_len(key_to_wrap)?;
    require_key_len(wrapping_key)?;

    let iv = random_iv()?;
    let ciphertext = encrypt(key_to_wrap, wrapping_key, &iv)?;

    let mut blob = Vec::with_capacity(IV_SIZE + ciphertext.len());
    blob.extend_from_slice(&iv);
    blob.extend_from_slice(&ciphertext);
    Ok(base64_encode(&blob))
}

/// Inverse of [`wrap_key`].
///
/// Anything other than an authentic 32-byte key comes back as
/// `CryptoError::Integrity`, including malformed base64.
pub fn unwrap_key(wrapped: &str, wrapping_key: &[u8]) -> CryptoResult<SymmetricKey> {
    require_key_len(wrapping_key)?;
    let blob = base64_decode(wrapped).map_err(|_| CryptoError::Integrity)?;
    if blob.len() != WRAPPED_KEY_LEN {
        return Err(CryptoError::Integrity);
    }

    let (iv, ciphertext) = blob.split_at(IV_SIZE);
    let plaintext = Zeroizing::new(decrypt(ciphertext, wrapping_key, iv)?);
    if plaintext.len() != KEY_SIZE {
        return Err(CryptoError::Integrity);
    }
    SymmetricKey::from_slice(&plaintext)
}

/// Output of [`encrypt_note`]. The file key must be wrapped, then dropped.
#[derive(Debug)]
pub struct EncryptedNote {
    pub file_key: SymmetricKey,
    /// Hex-encoded IV.
    pub iv: String,
    /// Base64-encoded ciphertext.
    pub ciphertext: String,
}

/// Encrypts note content under a fresh random file key and IV.
pub fn encrypt_note(plaintext: &[u8]) -> CryptoResult<EncryptedNote> {
    let file_key = SymmetricKey::generate()?;
    let iv = random_iv()?;
    let ciphertext = encrypt(plaintext, file_key.as_bytes(), &iv)?;

    Ok(EncryptedNote {
        file_key,
        iv: to_hex(&iv),
        ciphertext: base64_encode(&ciphertext),
    })
}

/// Decrypts note content produced by [`encrypt_note`].
pub fn decrypt_note(ciphertext: &str, file_key: &SymmetricKey, iv: &str) -> CryptoResult<Vec<u8>> {
    let iv = from_hex(iv).map_err(|_| CryptoError::Integrity)?;
    let ciphertext = base64_decode(ciphertext).map_err(|_| CryptoError::Integrity)?;
    decrypt(&ciphertext, file_key.as_bytes(), &iv)
}

/// `SHA-256(ECDH(mine, peer))`, with the peer key given as hex.
///
/// Both ends of a share arrive at the same key: the sender with its
/// ephemeral pair and the recipient's identity key, the recipient with its
/// identity pair and the sender's ephemeral key.
pub fn derive_session_key(mine: &KeyPair, peer_public_hex: &str) -> CryptoResult<SymmetricKey> {
    let peer = parse_public_key(peer_public_hex)?;
    Ok(compute_shared_secret(mine, &peer))
}

/// A file key rewrapped for one recipient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedFileKey {
    /// Hex-encoded ephemeral public key of the sender.
    pub ephemeral_public_key: String,
    /// File key wrapped under the session key.
    pub wrapped_key: String,
}

/// Seals `file_key` for the holder of `recipient_public_hex`.
///
/// A fresh ephemeral key pair is generated per call and dropped (zeroed)
/// before returning, along with the session key.
pub fn seal_file_key(file_key: &SymmetricKey, recipient_public_hex: &str) -> CryptoResult<SealedFileKey> {
    let ephemeral = KeyPair::generate()?;
    let session_key = derive_session_key(&ephemeral, recipient_public_hex)?;
    let wrapped_key = wrap_key(file_key.as_bytes(), session_key.as_bytes())?;

    Ok(SealedFileKey {
        ephemeral_public_key: ephemeral.public_key_hex(),
        wrapped_key,
    })
}

/// Opens a sealed file key with the recipient's identity key pair.
pub fn open_file_key(sealed: &SealedFileKey, identity: &KeyPair) -> CryptoResult<SymmetricKey> {
    let session_key = derive_session_key(identity, &sealed.ephemeral_public_key)?;
    unwrap_key(&sealed.wrapped_key, session_key.as_bytes())
}

/// Identity private key wrapped under a password-derived key.
///
/// Bundles the hex salt with the wrapped key so the password is the only
/// other input needed to recover it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedIdentityKey {
    pub salt: String,
    pub wrapped_key: String,
}

/// Wraps the identity private key under `derive_key(password, fresh salt)`.
pub fn protect_identity_key(
    identity: &KeyPair,
    password: &str,
    params: &KdfParams,
) -> CryptoResult<ProtectedIdentityKey> {
    let salt = generate_salt()?;
    let storage_key = derive_key(password, &salt, params)?;
    let wrapped_key = wrap_key(&identity.secret_bytes()[..], storage_key.as_bytes())?;
    Ok(ProtectedIdentityKey { salt, wrapped_key })
}

/// Recovers the identity key pair. A wrong password is `Integrity`.
pub fn recover_identity_key(
    protected: &ProtectedIdentityKey,
    password: &str,
    params: &KdfParams,
) -> CryptoResult<KeyPair> {
    let storage_key = derive_key(password, &protected.salt, params)?;
    let secret = unwrap_key(&protected.wrapped_key, storage_key.as_bytes())?;
    KeyPair::from_secret_bytes(secret.as_bytes())
}
