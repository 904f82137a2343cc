//! SealNote server.
//!
//! Stores ciphertext and wrapped keys, authenticates users with Argon2id
//! verifiers and HMAC-signed session tokens, and enforces the sharing rules:
//! only owners read, share, or delete their notes; a direct share opens for
//! its one recipient; a share link opens only for users on its whitelist;
//! nothing opens after it expires.
//!
//! Transport is out of scope: callers hand [`NoteServer::handle_json`] the
//! request body and the `Authorization` header value from whatever channel
//! they run.

mod auth;
mod config;
mod error;
mod server;
mod sharing;

pub use auth::{AuthService, AuthenticatedUser, LoginGrant};
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::NoteServer;
