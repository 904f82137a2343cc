//! DuckDB storage layer for the SealNote server.
//!
//! Stores only what the server is allowed to see: ciphertext, wrapped keys,
//! public keys, password verifiers, and share metadata.
//!
//! # Architecture
//!
//! - `users`, `notes`, `user_shares` (direct shares), `share_links` and
//!   `share_link_access` (one row per whitelisted recipient) tables
//! - One connection behind a mutex; every check-then-act sequence runs under
//!   the lock, so concurrent readers and revokers see one consistent outcome
//! - A share or link is live only while `expires_at > clock.now()`; access
//!   paths delete expired records when they find them

mod clock;
mod error;
mod schema;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{StorageError, StorageResult};
pub use store::links::{LinkEnvelope, LinkGrant, ResolvedLink, ShareLinkInfo};
pub use store::notes::{CascadeReport, NewNote, NoteMeta, StoredNote};
pub use store::shares::{DirectShare, NewDirectShare, ShareGrant, SharedNoteRecord};
pub use store::users::{NewUser, UserRecord};
pub use store::{PurgeReport, Store};
