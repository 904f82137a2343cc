//! Server collaborators.
//!
//! The client talks to the server through four narrow traits, one per
//! collaborator: authentication, note storage, share storage and the public
//! key directory. [`ApiClient`] implements all of them on top of any
//! [`Transport`] that can carry one [`Request`] and bring back one
//! [`Response`]; tests plug the server in directly.

use crate::error::{ClientError, ClientResult};
use sealnote_types::protocol::{
    CreateShareLinkRequest, DirectShareCreated, DirectShareSummary, LinkAccess, LinkRef,
    LoginRequest, LoginResponse, NoteRecord, NoteRef, NoteSummary, PublicKeyQuery,
    RegisterRequest, ShareLinkCreated, ShareLinkSummary, ShareRef, ShareWithUserRequest,
    SharedNote, UploadNoteRequest,
};
use sealnote_types::{LinkToken, NoteId, Request, Response, ShareId, Username};
use tracing::debug;

/// Carries one request to the server. `auth` is the raw session token.
pub trait Transport {
    fn send(&self, auth: Option<&str>, request: Request) -> ClientResult<Response>;
}

pub trait AuthService {
    fn register(&self, username: &Username, password: &str, identity_public_key: &str) -> ClientResult<()>;

    /// Returns the session token and the master key salt.
    fn login(&self, username: &Username, password: &str) -> ClientResult<LoginResponse>;
}

pub trait NoteStorage {
    fn put_note(&self, token: &str, note: UploadNoteRequest) -> ClientResult<NoteId>;
    fn get_note(&self, token: &str, note_id: &NoteId) -> ClientResult<NoteRecord>;
    fn list_notes(&self, token: &str) -> ClientResult<Vec<NoteSummary>>;
    fn delete_note(&self, token: &str, note_id: &NoteId) -> ClientResult<()>;
}

pub trait ShareStorage {
    fn create_direct_share(&self, token: &str, share: ShareWithUserRequest) -> ClientResult<DirectShareCreated>;
    fn resolve_direct_share(&self, token: &str, share_id: &ShareId) -> ClientResult<SharedNote>;
    fn list_direct_shares(&self, token: &str) -> ClientResult<Vec<DirectShareSummary>>;
    fn create_link(&self, token: &str, link: CreateShareLinkRequest) -> ClientResult<ShareLinkCreated>;
    fn resolve_link(&self, token: &str, link: &LinkToken) -> ClientResult<LinkAccess>;
    fn revoke_link(&self, token: &str, link: &LinkToken) -> ClientResult<()>;
    fn list_links(&self, token: &str) -> ClientResult<Vec<ShareLinkSummary>>;
}

pub trait IdentityDirectory {
    /// Hex SEC1 public key of `username`.
    fn get_public_key(&self, username: &Username) -> ClientResult<String>;
}

/// Everything a [`crate::NoteClient`] needs from the server side.
pub trait Backend: AuthService + NoteStorage + ShareStorage + IdentityDirectory {}

impl<T: AuthService + NoteStorage + ShareStorage + IdentityDirectory> Backend for T {}

/// Typed API over a [`Transport`].
pub struct ApiClient<T> {
    transport: T,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn call(&self, auth: Option<&str>, request: Request) -> ClientResult<Response> {
        let op = request.op_name();
        match self.transport.send(auth, request)? {
            Response::Error(body) => {
                debug!(op, kind = ?body.kind, "server refused request");
                Err(body.into())
            }
            response => Ok(response),
        }
    }
}

fn unexpected(op: &str, response: &Response) -> ClientError {
    // Only the variant name; bodies may carry ciphertext or wrapped keys.
    let variant = format!("{response:?}");
    let variant = variant.split(['(', ' ']).next().unwrap_or_default();
    ClientError::Protocol(format!("{variant} in reply to {op}"))
}

impl<T: Transport> AuthService for ApiClient<T> {
    fn register(&self, username: &Username, password: &str, identity_public_key: &str) -> ClientResult<()> {
        let request = Request::Register(RegisterRequest {
            username: username.clone(),
            password: password.to_string(),
            identity_public_key: identity_public_key.to_string(),
        });
        match self.call(None, request)? {
            Response::Registered => Ok(()),
            other => Err(unexpected("register", &other)),
        }
    }

    fn login(&self, username: &Username, password: &str) -> ClientResult<LoginResponse> {
        let request = Request::Login(LoginRequest {
            username: username.clone(),
            password: password.to_string(),
        });
        match self.call(None, request) {
            Ok(Response::LoggedIn(grant)) => Ok(grant),
            Ok(other) => Err(unexpected("login", &other)),
            Err(ClientError::Unauthorized) => Err(ClientError::InvalidCredentials),
            Err(e) => Err(e),
        }
    }
}

impl<T: Transport> NoteStorage for ApiClient<T> {
    fn put_note(&self, token: &str, note: UploadNoteRequest) -> ClientResult<NoteId> {
        match self.call(Some(token), Request::UploadNote(note))? {
            Response::NoteUploaded(NoteRef { note_id }) => Ok(note_id),
            other => Err(unexpected("upload_note", &other)),
        }
    }

    fn get_note(&self, token: &str, note_id: &NoteId) -> ClientResult<NoteRecord> {
        match self.call(Some(token), Request::GetNote(NoteRef { note_id: *note_id }))? {
            Response::Note(note) => Ok(note),
            other => Err(unexpected("get_note", &other)),
        }
    }

    fn list_notes(&self, token: &str) -> ClientResult<Vec<NoteSummary>> {
        match self.call(Some(token), Request::ListNotes)? {
            Response::Notes(list) => Ok(list.notes),
            other => Err(unexpected("list_notes", &other)),
        }
    }

    fn delete_note(&self, token: &str, note_id: &NoteId) -> ClientResult<()> {
        match self.call(Some(token), Request::DeleteNote(NoteRef { note_id: *note_id }))? {
            Response::NoteDeleted => Ok(()),
            other => Err(unexpected("delete_note", &other)),
        }
    }
}

impl<T: Transport> ShareStorage for ApiClient<T> {
    fn create_direct_share(&self, token: &str, share: ShareWithUserRequest) -> ClientResult<DirectShareCreated> {
        match self.call(Some(token), Request::ShareWithUser(share))? {
            Response::SharedWithUser(created) => Ok(created),
            other => Err(unexpected("share_with_user", &other)),
        }
    }

    fn resolve_direct_share(&self, token: &str, share_id: &ShareId) -> ClientResult<SharedNote> {
        let request = Request::GetSharedNote(ShareRef { share_id: *share_id });
        match self.call(Some(token), request)? {
            Response::SharedNote(note) => Ok(note),
            other => Err(unexpected("get_shared_note", &other)),
        }
    }

    fn list_direct_shares(&self, token: &str) -> ClientResult<Vec<DirectShareSummary>> {
        match self.call(Some(token), Request::ListSharedWithMe)? {
            Response::SharedWithMe(list) => Ok(list.shares),
            other => Err(unexpected("list_shared_with_me", &other)),
        }
    }

    fn create_link(&self, token: &str, link: CreateShareLinkRequest) -> ClientResult<ShareLinkCreated> {
        match self.call(Some(token), Request::CreateShareLink(link))? {
            Response::ShareLinkCreated(created) => Ok(created),
            other => Err(unexpected("create_share_link", &other)),
        }
    }

    fn resolve_link(&self, token: &str, link: &LinkToken) -> ClientResult<LinkAccess> {
        let request = Request::AccessShareLink(LinkRef { token: link.clone() });
        match self.call(Some(token), request)? {
            Response::ShareLinkAccess(access) => Ok(access),
            other => Err(unexpected("access_share_link", &other)),
        }
    }

    fn revoke_link(&self, token: &str, link: &LinkToken) -> ClientResult<()> {
        let request = Request::RevokeShareLink(LinkRef { token: link.clone() });
        match self.call(Some(token), request)? {
            Response::ShareLinkRevoked => Ok(()),
            other => Err(unexpected("revoke_share_link", &other)),
        }
    }

    fn list_links(&self, token: &str) -> ClientResult<Vec<ShareLinkSummary>> {
        match self.call(Some(token), Request::ListMyShareLinks)? {
            Response::MyShareLinks(list) => Ok(list.links),
            other => Err(unexpected("list_my_share_links", &other)),
        }
    }
}

impl<T: Transport> IdentityDirectory for ApiClient<T> {
    fn get_public_key(&self, username: &Username) -> ClientResult<String> {
        let request = Request::GetPublicKey(PublicKeyQuery {
            username: username.clone(),
        });
        match self.call(None, request)? {
            Response::PublicKey(record) => Ok(record.public_key),
            other => Err(unexpected("get_public_key", &other)),
        }
    }
}
