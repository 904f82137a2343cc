//! Symmetric keys and password-based key derivation.

use crate::encoding::{from_hex, to_hex};
use crate::error::{CryptoError, CryptoResult};
use crate::random::fill_random;
use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of every symmetric key (AES-256).
pub const KEY_SIZE: usize = 32;

/// Size of a CBC initialization vector.
pub const IV_SIZE: usize = 16;

/// Size of freshly generated password salts.
pub const SALT_SIZE: usize = 16;

/// Production PBKDF2 iteration count.
pub const PBKDF2_ITERATIONS: u32 = 310_000;

/// Floor below which `KdfParams` are rejected outright.
pub const MIN_PBKDF2_ITERATIONS: u32 = 1_000;

/// A 256-bit symmetric key (master, file, session, or storage key).
///
/// The buffer is zeroed on drop. Equality is constant time. `Debug` never
/// prints the key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_SIZE]);

impl SymmetricKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Copies a key out of a slice, failing unless it is exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; KEY_SIZE];
        arr.copy_from_slice(bytes);
        let key = Self(arr);
        arr.zeroize();
        Ok(key)
    }

    /// Generates a fresh random key.
    pub fn generate() -> CryptoResult<Self> {
        let mut key = Self([0u8; KEY_SIZE]);
        fill_random(&mut key.0)?;
        Ok(key)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl PartialEq for SymmetricKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for SymmetricKey {}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricKey(<redacted>)")
    }
}

/// PBKDF2 parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: PBKDF2_ITERATIONS,
        }
    }
}

impl KdfParams {
    pub fn validate(&self) -> CryptoResult<()> {
        if self.iterations < MIN_PBKDF2_ITERATIONS {
            return Err(CryptoError::KeyDerivation(format!(
                "iteration count {} below minimum {MIN_PBKDF2_ITERATIONS}",
                self.iterations
            )));
        }
        Ok(())
    }
}

/// Derives a 32-byte key from a password and a hex-encoded salt.
///
/// Deterministic: the same password, salt and params always give the same
/// key, which is what lets a user recover their master key on every login.
pub fn derive_key(password: &str, salt_hex: &str, params: &KdfParams) -> CryptoResult<SymmetricKey> {
    params.validate()?;
    let salt = from_hex(salt_hex)?;
    if salt.is_empty() {
        return Err(CryptoError::KeyDerivation("empty salt".to_string()));
    }

    let mut key = SymmetricKey([0u8; KEY_SIZE]);
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, params.iterations, &mut key.0);
    Ok(key)
}

/// Generates a fresh random salt, hex-encoded.
pub fn generate_salt() -> CryptoResult<String> {
    let mut salt = [0u8; SALT_SIZE];
    fill_random(&mut salt)?;
    Ok(to_hex(&salt))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: KdfParams = KdfParams { iterations: 1_000 };

    #[test]
    fn derivation_is_deterministic() {
        let salt = generate_salt().unwrap();
        let a = derive_key("correct horse", &salt, &FAST).unwrap();
        let b = derive_key("correct horse", &salt, &FAST).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_salt_gives_different_key() {
        let a = derive_key("pw", &generate_salt().unwrap(), &FAST).unwrap();
        let b = derive_key("pw", &generate_salt().unwrap(), &FAST).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn different_password_gives_different_key() {
        let salt = generate_salt().unwrap();
        let a = derive_key("pw-one", &salt, &FAST).unwrap();
        let b = derive_key("pw-two", &salt, &FAST).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn known_vector() {
        // PBKDF2-HMAC-SHA256("password", "salt", 4096, 32)
        let params = KdfParams { iterations: 4096 };
        let key = derive_key("password", &to_hex(b"salt"), &params).unwrap();
        assert_eq!(
            to_hex(key.as_bytes()),
            "c5e478d59288c841aa530db6845c4c8d962893a001ce4e11a4963873aa98134a"
        );
    }

    #[test]
    fn production_params_are_the_default() {
        assert_eq!(KdfParams::default().iterations, PBKDF2_ITERATIONS);
        assert!(KdfParams::default().validate().is_ok());
    }

    #[test]
    fn weak_params_rejected() {
        let weak = KdfParams { iterations: 10 };
        assert!(matches!(
            derive_key("pw", "00ff", &weak),
            Err(CryptoError::KeyDerivation(_))
        ));
    }

    #[test]
    fn malformed_salt_rejected() {
        assert!(matches!(
            derive_key("pw", "abc", &FAST),
            Err(CryptoError::Encoding(_))
        ));
        assert!(matches!(
            derive_key("pw", "", &FAST),
            Err(CryptoError::KeyDerivation(_))
        ));
    }

    #[test]
    fn from_slice_enforces_length() {
        assert!(SymmetricKey::from_slice(&[1u8; 32]).is_ok());
        assert_eq!(
            SymmetricKey::from_slice(&[1u8; 31]),
            Err(CryptoError::InvalidKeyLength {
                expected: 32,
                actual: 31
            })
        );
    }

    #[test]
    fn debug_does_not_leak() {
        let key = SymmetricKey::from_bytes([0xAA; KEY_SIZE]);
        let rendered = format!("{key:?}");
        assert!(!rendered.contains("aa") && !rendered.contains("170"));
    }
}
