//! Request dispatch.
//!
//! Every request goes through [`NoteServer::handle`], which authenticates
//! the caller when the operation needs it and turns every failure into a
//! `Response::Error`. Handlers never see an unauthenticated caller for an
//! authenticated operation.

use crate::auth::{AuthService, AuthenticatedUser};
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use sealnote_storage::{NewNote, Store};
use sealnote_types::protocol::{
    LoginResponse, NoteList, NoteRecord, NoteRef, NoteSummary, PublicKeyRecord, UploadNoteRequest,
};
use sealnote_types::{ErrorKind, NoteId, Request, Response, Username};
use tracing::{debug, warn};

// Hand-written so it cannot fail to serialize.
const INTERNAL_ERROR_JSON: &str =
    r#"{"op":"error","body":{"kind":"internal","message":"internal server error"}}"#;

pub struct NoteServer {
    pub(crate) config: ServerConfig,
    pub(crate) store: Store,
    auth: AuthService,
}

impl NoteServer {
    pub fn new(config: ServerConfig, store: Store) -> ServerResult<Self> {
        config.validate()?;
        let auth = AuthService::new(&config, store.clone())?;
        Ok(Self {
            config,
            store,
            auth,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Handles one request. `auth` is the raw session token, if any.
    pub fn handle(&self, auth: Option<&str>, request: Request) -> Response {
        let op = request.op_name();
        match self.dispatch(auth, request) {
            Ok(response) => response,
            Err(e) => {
                match e.kind() {
                    ErrorKind::Internal => warn!(op, error = %e, "request failed"),
                    _ => debug!(op, error = %e, "request rejected"),
                }
                Response::error(e.kind(), e.public_message())
            }
        }
    }

    /// Parses a JSON request body strictly and returns a JSON response.
    ///
    /// `auth_header` may be `Bearer <token>` or the bare token.
    pub fn handle_json(&self, auth_header: Option<&str>, body: &str) -> String {
        let response = match serde_json::from_str::<Request>(body) {
            Ok(request) => self.handle(auth_header.map(strip_bearer), request),
            Err(e) => {
                debug!(line = e.line(), column = e.column(), "malformed request body");
                // serde messages can quote field values; report position only
                Response::error(
                    ErrorKind::BadRequest,
                    format!("malformed request at line {} column {}", e.line(), e.column()),
                )
            }
        };
        serde_json::to_string(&response).unwrap_or_else(|_| INTERNAL_ERROR_JSON.to_string())
    }

    fn authenticate(&self, auth: Option<&str>) -> ServerResult<AuthenticatedUser> {
        let token = auth.filter(|t| !t.is_empty()).ok_or(ServerError::Unauthorized)?;
        self.auth.verify_token(token)
    }

    fn dispatch(&self, auth: Option<&str>, request: Request) -> ServerResult<Response> {
        let caller = if request.requires_auth() {
            Some(self.authenticate(auth)?)
        } else {
            None
        };

        match (request, caller) {
            (Request::Register(req), _) => {
                self.auth
                    .register(req.username, &req.password, &req.identity_public_key)?;
                Ok(Response::Registered)
            }
            (Request::Login(req), _) => {
                let grant = self.auth.login(&req.username, &req.password)?;
                Ok(Response::LoggedIn(LoginResponse {
                    token: grant.token,
                    password_salt: grant.password_salt,
                }))
            }
            (Request::GetPublicKey(query), _) => self.get_public_key(&query.username),
            (request, Some(caller)) => self.dispatch_authenticated(&caller, request),
            (_, None) => Err(ServerError::Unauthorized),
        }
    }

    fn dispatch_authenticated(
        &self,
        caller: &AuthenticatedUser,
        request: Request,
    ) -> ServerResult<Response> {
        match request {
            Request::UploadNote(req) => self.upload_note(caller, req),
            Request::GetNote(NoteRef { note_id }) => self.get_note(caller, &note_id),
            Request::ListNotes => self.list_notes(caller),
            Request::DeleteNote(NoteRef { note_id }) => {
                self.store.delete_note(&note_id, &caller.id)?;
                Ok(Response::NoteDeleted)
            }
            Request::ShareWithUser(req) => self.share_with_user(caller, req),
            Request::CreateShareLink(req) => self.create_share_link(caller, req),
            Request::AccessShareLink(link) => self.access_share_link(caller, &link.token),
            Request::RevokeShareLink(link) => {
                self.store.revoke_share_link(&link.token, &caller.id)?;
                Ok(Response::ShareLinkRevoked)
            }
            Request::ListSharedWithMe => self.list_shared_with_me(caller),
            Request::GetSharedNote(share) => self.get_shared_note(caller, &share.share_id),
            Request::ListMyShareLinks => self.list_my_share_links(caller),
            Request::Register(_) | Request::Login(_) | Request::GetPublicKey(_) => {
                Err(ServerError::BadRequest("unexpected operation".into()))
            }
        }
    }

    fn get_public_key(&self, username: &Username) -> ServerResult<Response> {
        let user = self.store.find_user(username)?.ok_or(ServerError::NotFound)?;
        Ok(Response::PublicKey(PublicKeyRecord {
            username: user.username,
            public_key: user.public_key,
        }))
    }

    fn upload_note(&self, caller: &AuthenticatedUser, req: UploadNoteRequest) -> ServerResult<Response> {
        if req.filename.trim().is_empty() {
            return Err(ServerError::BadRequest("filename is empty".into()));
        }
        // Shape checks only; the server cannot verify content it cannot decrypt.
        sealnote_crypto::base64_decode(&req.ciphertext)
            .map_err(|_| ServerError::BadRequest("ciphertext is not base64".into()))?;
        sealnote_crypto::base64_decode(&req.wrapped_key)
            .map_err(|_| ServerError::BadRequest("wrapped key is not base64".into()))?;
        sealnote_crypto::from_hex(&req.iv)
            .map_err(|_| ServerError::BadRequest("iv is not hex".into()))?;

        let note_id = self.store.put_note(NewNote {
            owner_id: caller.id,
            filename: req.filename,
            ciphertext: req.ciphertext,
            wrapped_key: req.wrapped_key,
            iv: req.iv,
        })?;
        Ok(Response::NoteUploaded(NoteRef { note_id }))
    }

    fn get_note(&self, caller: &AuthenticatedUser, note_id: &NoteId) -> ServerResult<Response> {
        let note = self.store.get_note(note_id)?.ok_or(ServerError::NotFound)?;
        if note.owner_id != caller.id {
            return Err(ServerError::Forbidden);
        }
        Ok(Response::Note(NoteRecord {
            note_id: note.id,
            owner: note.owner,
            filename: note.filename,
            ciphertext: note.ciphertext,
            wrapped_key: note.wrapped_key,
            iv: note.iv,
            created_at: note.created_at,
        }))
    }

    fn list_notes(&self, caller: &AuthenticatedUser) -> ServerResult<Response> {
        let notes = self
            .store
            .list_notes(&caller.id)?
            .into_iter()
            .map(|n| NoteSummary {
                note_id: n.id,
                filename: n.filename,
                created_at: n.created_at,
            })
            .collect();
        Ok(Response::Notes(NoteList { notes }))
    }
}

fn strip_bearer(header: &str) -> &str {
    let header = header.trim();
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .unwrap_or(header)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_prefix_is_optional() {
        assert_eq!(strip_bearer("Bearer abc.def"), "abc.def");
        assert_eq!(strip_bearer("bearer abc.def"), "abc.def");
        assert_eq!(strip_bearer("  abc.def "), "abc.def");
    }

    #[test]
    fn internal_error_json_is_a_valid_response() {
        let parsed: Response = serde_json::from_str(INTERNAL_ERROR_JSON).unwrap();
        assert_eq!(
            parsed,
            Response::error(ErrorKind::Internal, "internal server error")
        );
    }
}
