//! AES-256-CBC with an HMAC-SHA256 tag over `iv ‖ ciphertext`.
//!
//! The caller's 32-byte key is never used directly: HKDF-SHA256 splits it
//! into an encryption subkey and a MAC subkey. Output layout is
//! `CBC-PKCS7(plaintext) ‖ tag[32]`; the IV travels separately.

use crate::error::{CryptoError, CryptoResult};
use crate::key::{IV_SIZE, KEY_SIZE};
use aes::Aes256;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroizing;

/// AES block size.
pub const BLOCK_SIZE: usize = 16;

/// HMAC-SHA256 tag size.
pub const TAG_SIZE: usize = 32;

const ENC_LABEL: &[u8] = b"sealnote/v1/aes-256-cbc";
const MAC_LABEL: &[u8] = b"sealnote/v1/hmac-sha256";

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;
type HmacSha256 = Hmac<Sha256>;

struct Subkeys {
    enc: Zeroizing<[u8; KEY_SIZE]>,
    mac: Zeroizing<[u8; KEY_SIZE]>,
}

fn subkeys(key: &[u8]) -> CryptoResult<Subkeys> {
    if key.len() != KEY_SIZE {
        return Err(CryptoError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: key.len(),
        });
    }
    let hk = Hkdf::<Sha256>::new(None, key);
    let mut enc = Zeroizing::new([0u8; KEY_SIZE]);
    let mut mac = Zeroizing::new([0u8; KEY_SIZE]);
    hk.expand(ENC_LABEL, &mut enc[..])
        .map_err(|e| CryptoError::KeyDerivation(format!("hkdf: {e}")))?;
    hk.expand(MAC_LABEL, &mut mac[..])
        .map_err(|e| CryptoError::KeyDerivation(format!("hkdf: {e}")))?;
    Ok(Subkeys { enc, mac })
}

fn new_mac(mac_key: &[u8], iv: &[u8], ciphertext: &[u8]) -> CryptoResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(mac_key)
        .map_err(|e| CryptoError::KeyDerivation(format!("hmac: {e}")))?;
    mac.update(iv);
    mac.update(ciphertext);
    Ok(mac)
}

/// Encrypts `plaintext` under a 32-byte key and 16-byte IV.
///
/// Fails with `InvalidKeyLength` if either the key or the IV has the wrong
/// size.
pub fn encrypt(plaintext: &[u8], key: &[u8], iv: &[u8]) -> CryptoResult<Vec<u8>> {
    let keys = subkeys(key)?;
    if iv.len() != IV_SIZE {
        return Err(CryptoError::InvalidKeyLength {
            expected: IV_SIZE,
            actual: iv.len(),
        });
    }

    let mut out = Aes256CbcEnc::new_from_slices(&keys.enc[..], iv)
        .map_err(|e| CryptoError::KeyDerivation(format!("cipher init: {e}")))?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let tag = new_mac(&keys.mac[..], iv, &out)?.finalize().into_bytes();
    out.extend_from_slice(&tag);
    Ok(out)
}

/// Verifies and decrypts the output of [`encrypt`].
///
/// The tag is checked in constant time before any decryption happens.
/// A wrong key, a wrong IV, truncation, or any flipped bit all return
/// `CryptoError::Integrity`.
pub fn decrypt(data: &[u8], key: &[u8], iv: &[u8]) -> CryptoResult<Vec<u8>> {
    let keys = subkeys(key)?;
    if iv.len() != IV_SIZE || data.len() < BLOCK_SIZE + TAG_SIZE {
        return Err(CryptoError::Integrity);
    }

    let (ciphertext, tag) = data.split_at(data.len() - TAG_SIZE);
    if ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::Integrity);
    }

    new_mac(&keys.mac[..], iv, ciphertext)?
        .verify_slice(tag)
        .map_err(|_| CryptoError::Integrity)?;

    Aes256CbcDec::new_from_slices(&keys.enc[..], iv)
        .map_err(|_| CryptoError::Integrity)?
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptoError::Integrity)
}
