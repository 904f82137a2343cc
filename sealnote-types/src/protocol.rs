//! Wire messages.
//!
//! Requests and responses are closed, adjacently tagged enums:
//! `{"op": "upload_note", "body": {...}}`. Encodings follow one convention
//! throughout: public keys and IVs are hex, wrapped keys and ciphertext are
//! base64 (IV prepended inside wrapped-key blobs), timestamps are unix
//! seconds.

use crate::{LinkToken, NoteId, ShareId, Timestamp, Username};
use serde::{Deserialize, Serialize};

// ============================================================================
// Requests
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "body", rename_all = "snake_case", deny_unknown_fields)]
pub enum Request {
    Register(RegisterRequest),
    Login(LoginRequest),
    UploadNote(UploadNoteRequest),
    GetNote(NoteRef),
    ListNotes,
    DeleteNote(NoteRef),
    GetPublicKey(PublicKeyQuery),
    ShareWithUser(ShareWithUserRequest),
    CreateShareLink(CreateShareLinkRequest),
    AccessShareLink(LinkRef),
    RevokeShareLink(LinkRef),
    ListSharedWithMe,
    GetSharedNote(ShareRef),
    ListMyShareLinks,
}

impl Request {
    /// Whether the request must carry a valid session token.
    pub fn requires_auth(&self) -> bool {
        !matches!(
            self,
            Request::Register(_) | Request::Login(_) | Request::GetPublicKey(_)
        )
    }

    /// Operation name for logs. Never includes request contents.
    pub fn op_name(&self) -> &'static str {
        match self {
            Request::Register(_) => "register",
            Request::Login(_) => "login",
            Request::UploadNote(_) => "upload_note",
            Request::GetNote(_) => "get_note",
            Request::ListNotes => "list_notes",
            Request::DeleteNote(_) => "delete_note",
            Request::GetPublicKey(_) => "get_public_key",
            Request::ShareWithUser(_) => "share_with_user",
            Request::CreateShareLink(_) => "create_share_link",
            Request::AccessShareLink(_) => "access_share_link",
            Request::RevokeShareLink(_) => "revoke_share_link",
            Request::ListSharedWithMe => "list_shared_with_me",
            Request::GetSharedNote(_) => "get_shared_note",
            Request::ListMyShareLinks => "list_my_share_links",
        }
    }
}

// Password fields are plaintext on the wire; transport encryption is the
// channel's job. `Debug` is implemented by hand so they never reach a log.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: Username,
    pub password: String,
    /// Identity public key, SEC1 uncompressed P-256 point, hex.
    pub identity_public_key: String,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("identity_public_key", &self.identity_public_key)
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: Username,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UploadNoteRequest {
    pub filename: String,
    /// Base64 content ciphertext.
    pub ciphertext: String,
    /// Base64 file key wrapped under the owner's master key.
    pub wrapped_key: String,
    /// Hex content IV.
    pub iv: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoteRef {
    pub note_id: NoteId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublicKeyQuery {
    pub username: Username,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShareWithUserRequest {
    pub note_id: NoteId,
    pub recipient: Username,
    /// Sender's ephemeral public key, hex.
    pub ephemeral_public_key: String,
    /// Base64 file key wrapped under the ECDH session key.
    pub wrapped_key: String,
    pub ttl_secs: i64,
}

/// One whitelist entry of a share link: an independent envelope of the
/// note's file key for a single recipient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkEntry {
    pub username: Username,
    pub ephemeral_public_key: String,
    pub wrapped_key: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateShareLinkRequest {
    pub note_id: NoteId,
    pub entries: Vec<LinkEntry>,
    pub ttl_secs: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkRef {
    pub token: LinkToken,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShareRef {
    pub share_id: ShareId,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "body", rename_all = "snake_case", deny_unknown_fields)]
pub enum Response {
    Registered,
    LoggedIn(LoginResponse),
    NoteUploaded(NoteRef),
    Note(NoteRecord),
    Notes(NoteList),
    NoteDeleted,
    PublicKey(PublicKeyRecord),
    SharedWithUser(DirectShareCreated),
    ShareLinkCreated(ShareLinkCreated),
    ShareLinkAccess(LinkAccess),
    ShareLinkRevoked,
    SharedWithMe(DirectShareList),
    SharedNote(SharedNote),
    MyShareLinks(ShareLinkList),
    Error(ErrorBody),
}

impl Response {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Response::Error(ErrorBody {
            kind,
            message: message.into(),
        })
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginResponse {
    pub token: String,
    /// Hex salt for client-side master key derivation.
    pub password_salt: String,
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("token", &"<redacted>")
            .field("password_salt", &self.password_salt)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoteRecord {
    pub note_id: NoteId,
    pub owner: Username,
    pub filename: String,
    pub ciphertext: String,
    pub wrapped_key: String,
    pub iv: String,
    pub created_at: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoteSummary {
    pub note_id: NoteId,
    pub filename: String,
    pub created_at: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoteList {
    pub notes: Vec<NoteSummary>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublicKeyRecord {
    pub username: Username,
    pub public_key: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectShareCreated {
    pub share_id: ShareId,
    pub expires_at: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShareLinkCreated {
    pub token: LinkToken,
    pub url: String,
    pub expires_at: Timestamp,
}

/// What a whitelisted user receives for a share link: their own envelope
/// plus the note ciphertext.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkAccess {
    pub note_id: NoteId,
    pub filename: String,
    pub ciphertext: String,
    pub iv: String,
    pub ephemeral_public_key: String,
    pub wrapped_key: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectShareSummary {
    pub share_id: ShareId,
    pub note_id: NoteId,
    pub sender: Username,
    pub expires_at: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectShareList {
    pub shares: Vec<DirectShareSummary>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SharedNote {
    pub share_id: ShareId,
    pub note_id: NoteId,
    pub sender: Username,
    pub filename: String,
    pub ciphertext: String,
    pub iv: String,
    pub ephemeral_public_key: String,
    pub wrapped_key: String,
    pub expires_at: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShareLinkSummary {
    pub token: LinkToken,
    pub note_id: NoteId,
    pub expires_at: Timestamp,
    pub shared_with: Vec<Username>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShareLinkList {
    pub links: Vec<ShareLinkSummary>,
}

/// Error categories. Authorization failures are deliberately coarse: a
/// caller cannot tell "expired" from "not whitelisted" from "never existed".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    Internal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}
