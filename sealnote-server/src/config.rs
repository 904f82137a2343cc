//! Server configuration.

use crate::error::{ServerError, ServerResult};
use sealnote_types::LinkToken;
use serde::{Deserialize, Serialize};

/// Configuration for the note server.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Public base URL used to build share links (e.g., "https://notes.example.com").
    pub public_base_url: String,

    /// Session token lifetime in seconds.
    pub token_ttl_secs: i64,

    /// Hex-encoded 32-byte HMAC secret for session tokens. A random secret
    /// is generated at startup when absent, which invalidates old tokens on
    /// every restart.
    pub token_secret_hex: Option<String>,

    /// Upper bound for share and share link lifetimes, in seconds.
    pub max_share_ttl_secs: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            public_base_url: "http://localhost:8080".to_string(),
            token_ttl_secs: 1800, // 30 minutes
            token_secret_hex: None,
            max_share_ttl_secs: 30 * 24 * 3600,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> ServerResult<()> {
        if self.token_ttl_secs <= 0 {
            return Err(ServerError::Config("token_ttl_secs must be positive".into()));
        }
        if self.max_share_ttl_secs <= 0 {
            return Err(ServerError::Config("max_share_ttl_secs must be positive".into()));
        }
        if self.public_base_url.is_empty() {
            return Err(ServerError::Config("public_base_url is empty".into()));
        }
        if let Some(secret) = &self.token_secret_hex {
            let len = sealnote_crypto::from_hex(secret)
                .map_err(|_| ServerError::Config("token_secret_hex is not hex".into()))?
                .len();
            if len != 32 {
                return Err(ServerError::Config(format!(
                    "token_secret_hex must encode 32 bytes, got {len}"
                )));
            }
        }
        Ok(())
    }

    /// `"{base}/share/{token}"`.
    pub fn share_url(&self, token: &LinkToken) -> String {
        format!("{}/share/{}", self.public_base_url.trim_end_matches('/'), token)
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("public_base_url", &self.public_base_url)
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field(
                "token_secret_hex",
                &self.token_secret_hex.as_ref().map(|_| "<redacted>"),
            )
            .field("max_share_ttl_secs", &self.max_share_ttl_secs)
            .finish()
    }
}
