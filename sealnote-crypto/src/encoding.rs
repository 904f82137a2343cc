//! Hex and base64 codecs. Decoding is strict: odd-length hex, non-hex
//! digits, and non-canonical base64 are errors, never truncated input.

use crate::error::{CryptoError, CryptoResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

pub fn from_hex(s: &str) -> CryptoResult<Vec<u8>> {
    hex::decode(s).map_err(|e| CryptoError::Encoding(format!("hex: {e}")))
}

pub fn base64_encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn base64_decode(s: &str) -> CryptoResult<Vec<u8>> {
    STANDARD
        .decode(s)
        .map_err(|e| CryptoError::Encoding(format!("base64: {e}")))
}
