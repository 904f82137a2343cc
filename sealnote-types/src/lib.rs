//! Shared types for SealNote.
//!
//! Identifiers, validated usernames, and the closed set of wire messages
//! exchanged between the client and the server. Every message body is a
//! plain struct with `deny_unknown_fields`, so a payload with a missing,
//! misspelled, or extra field is rejected at the boundary instead of being
//! defaulted.

mod error;
mod ids;
pub mod protocol;

pub use error::{TypesError, TypesResult};
pub use ids::{LinkToken, NoteId, ShareId, UserId, Username, LINK_TOKEN_BYTES};
pub use protocol::{ErrorKind, Request, Response};

/// Unix timestamp in seconds.
pub type Timestamp = i64;
