//! SealNote client.
//!
//! Holds the per-login secrets and does all encryption and decryption on
//! the device:
//!
//! - `register` generates the identity key pair, publishes the public half
//!   and keeps the private half on disk only wrapped under the password.
//! - `login` derives the master key from the password and the server-issued
//!   salt, then unwraps the identity key. A missing or unreadable identity
//!   key yields a degraded session rather than a failed login.
//! - Notes are encrypted under a fresh file key, which is wrapped under the
//!   master key for the owner and re-wrapped per recipient for sharing.
//!
//! The server is reached through the collaborator traits in [`api`]; plug
//! any [`Transport`] into [`ApiClient`] to get all of them.

pub mod api;
mod client;
mod config;
mod error;
mod keystore;
mod session;
mod sharing;

pub use api::{ApiClient, AuthService, Backend, IdentityDirectory, NoteStorage, ShareStorage, Transport};
pub use client::{DecryptedNote, LoginOutcome, NoteClient};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use keystore::{FileKeyStore, KeyStore};
pub use session::Session;
pub use sharing::ShareLinkOutcome;
