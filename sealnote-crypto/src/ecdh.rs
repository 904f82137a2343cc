//! P-256 key agreement.
//!
//! Identity key pairs and per-share ephemeral key pairs are the same type.
//! Public keys travel as hex-encoded SEC1 uncompressed points.

use crate::encoding::{from_hex, to_hex};
use crate::error::{CryptoError, CryptoResult};
use crate::key::SymmetricKey;
use crate::random::fill_random;
use p256::ecdh::diffie_hellman;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::{PublicKey, SecretKey};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, Zeroizing};

/// SEC1 uncompressed point: `0x04 ‖ x[32] ‖ y[32]`.
pub const PUBLIC_KEY_SIZE: usize = 65;

/// Private scalar size.
pub const SECRET_KEY_SIZE: usize = 32;

// A uniformly random 32-byte string is out of range with probability ~2^-32.
const MAX_KEYGEN_ATTEMPTS: usize = 8;

/// A P-256 key pair. The secret scalar is zeroed on drop.
pub struct KeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl KeyPair {
    /// Generates a new key pair from the OS RNG.
    pub fn generate() -> CryptoResult<Self> {
        for _ in 0..MAX_KEYGEN_ATTEMPTS {
            let mut candidate = Zeroizing::new([0u8; SECRET_KEY_SIZE]);
            fill_random(&mut candidate[..])?;
            if let Ok(secret) = SecretKey::from_slice(&candidate[..]) {
                return Ok(Self::from_secret(secret));
            }
        }
        Err(CryptoError::KeyAgreement(
            "could not sample a valid P-256 scalar".to_string(),
        ))
    }

    /// Reconstructs a key pair from a raw 32-byte private scalar.
    pub fn from_secret_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() != SECRET_KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: SECRET_KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let secret = SecretKey::from_slice(bytes)
            .map_err(|_| CryptoError::KeyAgreement("invalid private scalar".to_string()))?;
        Ok(Self::from_secret(secret))
    }

    fn from_secret(secret: SecretKey) -> Self {
        let public = secret.public_key();
        Self { secret, public }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Hex-encoded SEC1 uncompressed public key.
    pub fn public_key_hex(&self) -> String {
        to_hex(self.public.to_encoded_point(false).as_bytes())
    }

    /// Raw private scalar, for wrapping into local key storage only.
    pub fn secret_bytes(&self) -> Zeroizing<[u8; SECRET_KEY_SIZE]> {
        let mut field = self.secret.to_bytes();
        let mut out = Zeroizing::new([0u8; SECRET_KEY_SIZE]);
        out.copy_from_slice(&field);
        field.as_mut_slice().zeroize();
        out
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public_key_hex())
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Parses a hex-encoded SEC1 uncompressed P-256 point.
pub fn parse_public_key(hex: &str) -> CryptoResult<PublicKey> {
    let bytes = from_hex(hex)?;
    if bytes.len() != PUBLIC_KEY_SIZE {
        return Err(CryptoError::InvalidKeyLength {
            expected: PUBLIC_KEY_SIZE,
            actual: bytes.len(),
        });
    }
    PublicKey::from_sec1_bytes(&bytes)
        .map_err(|_| CryptoError::KeyAgreement("public key is not a valid P-256 point".to_string()))
}

/// ECDH between `mine` and `peer`, hashed with SHA-256.
///
/// The raw x-coordinate is never returned; only its digest is usable as a
/// key.
pub fn compute_shared_secret(mine: &KeyPair, peer: &PublicKey) -> SymmetricKey {
    let shared = diffie_hellman(mine.secret.to_nonzero_scalar(), peer.as_affine());
    let mut digest: [u8; 32] = Sha256::digest(shared.raw_secret_bytes()).into();
    let key = SymmetricKey::from_bytes(digest);
    digest.zeroize();
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_key_is_uncompressed_sec1() {
        let kp = KeyPair::generate().unwrap();
        let hex = kp.public_key_hex();
        assert_eq!(hex.len(), PUBLIC_KEY_SIZE * 2);
        assert!(hex.starts_with("04"));
        assert_eq!(&parse_public_key(&hex).unwrap(), kp.public_key());
    }

    #[test]
    fn secret_bytes_reconstruct_same_pair() {
        let kp = KeyPair::generate().unwrap();
        let restored = KeyPair::from_secret_bytes(&kp.secret_bytes()[..]).unwrap();
        assert_eq!(restored.public_key_hex(), kp.public_key_hex());
    }

    #[test]
    fn shared_secret_is_symmetric() {
        let alice = KeyPair::generate().unwrap();
        let bob = KeyPair::generate().unwrap();
        assert_eq!(
            compute_shared_secret(&alice, bob.public_key()),
            compute_shared_secret(&bob, alice.public_key())
        );
    }

    #[test]
    fn different_peers_give_different_secrets() {
        let alice = KeyPair::generate().unwrap();
        let bob = KeyPair::generate().unwrap();
        let carol = KeyPair::generate().unwrap();
        assert_ne!(
            compute_shared_secret(&alice, bob.public_key()),
            compute_shared_secret(&alice, carol.public_key())
        );
    }

    #[test]
    fn zero_scalar_rejected() {
        assert!(matches!(
            KeyPair::from_secret_bytes(&[0u8; 32]),
            Err(CryptoError::KeyAgreement(_))
        ));
    }

    #[test]
    fn malformed_public_keys_rejected() {
        let kp = KeyPair::generate().unwrap();
        let hex = kp.public_key_hex();

        // compressed form
        let compressed = to_hex(kp.public_key().to_encoded_point(true).as_bytes());
        assert!(matches!(
            parse_public_key(&compressed),
            Err(CryptoError::InvalidKeyLength { .. })
        ));

        // not on the curve
        let mut off_curve = hex.clone();
        off_curve.replace_range(128..130, if &hex[128..130] == "00" { "01" } else { "00" });
        assert!(parse_public_key(&off_curve).is_err());

        assert!(matches!(parse_public_key("04zz"), Err(CryptoError::Encoding(_))));
    }

    #[test]
    fn debug_hides_secret() {
        let kp = KeyPair::generate().unwrap();
        let secret_hex = to_hex(&kp.secret_bytes()[..]);
        let rendered = format!("{kp:?}");
        assert!(!rendered.contains(&secret_hex));
        assert!(rendered.contains("<redacted>"));
    }
}
