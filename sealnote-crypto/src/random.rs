use crate::error::{CryptoError, CryptoResult};
use rand::rngs::OsRng;
use rand::TryRngCore;

/// Fills `buf` from the OS entropy source.
pub fn fill_random(buf: &mut [u8]) -> CryptoResult<()> {
    OsRng.try_fill_bytes(buf).map_err(|_| CryptoError::Rng)
}

/// Returns `n` cryptographically secure random bytes.
pub fn generate_random_bytes(n: usize) -> CryptoResult<Vec<u8>> {
    let mut buf = vec![0u8; n];
    fill_random(&mut buf)?;
    Ok(buf)
}
