//! Client configuration.

use sealnote_crypto::KdfParams;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Directory holding the password-protected identity key files.
    pub key_dir: PathBuf,

    /// Password KDF cost, used for both the master key and the local
    /// identity key. Must match across sessions.
    pub kdf: KdfParams,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            key_dir: PathBuf::from("keys"),
            kdf: KdfParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealnote_crypto::PBKDF2_ITERATIONS;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.key_dir, PathBuf::from("keys"));
        assert_eq!(config.kdf.iterations, PBKDF2_ITERATIONS);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: ClientConfig = serde_json::from_str(r#"{"key_dir":"/tmp/k"}"#).unwrap();
        assert_eq!(config.key_dir, PathBuf::from("/tmp/k"));
        assert_eq!(config.kdf.iterations, PBKDF2_ITERATIONS);
    }
}
