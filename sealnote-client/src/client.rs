//! Session lifecycle and owner-side note operations.

use crate::api::Backend;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::keystore::KeyStore;
use crate::session::Session;
use sealnote_crypto::{
    decrypt_note, derive_key, encrypt_note, protect_identity_key, recover_identity_key,
    unwrap_key, wrap_key, KeyPair,
};
use sealnote_types::protocol::{NoteSummary, UploadNoteRequest};
use sealnote_types::{NoteId, Username};
use tracing::{info, warn};
use zeroize::Zeroizing;

/// How a login ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Master key and identity key are both available.
    Ready,
    /// Logged in, but the identity key could not be recovered: own notes
    /// work, anything shared with this user cannot be opened.
    Degraded,
}

/// A note decrypted on this device.
#[derive(Clone, PartialEq, Eq)]
pub struct DecryptedNote {
    pub note_id: NoteId,
    pub filename: String,
    pub content: Vec<u8>,
}

impl std::fmt::Debug for DecryptedNote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptedNote")
            .field("note_id", &self.note_id)
            .field("filename", &self.filename)
            .field("content_len", &self.content.len())
            .finish()
    }
}

enum SessionState {
    LoggedOut,
    LoggedIn(Session),
}

/// End-to-end encrypted note client.
///
/// Everything that touches plaintext or unwrapped keys happens here; the
/// backend only ever receives ciphertext, wrapped keys and public keys.
pub struct NoteClient<B, K> {
    pub(crate) backend: B,
    keys: K,
    config: ClientConfig,
    state: SessionState,
}

impl<B: Backend, K: KeyStore> NoteClient<B, K> {
    pub fn new(backend: B, keys: K, config: ClientConfig) -> Self {
        Self {
            backend,
            keys,
            config,
            state: SessionState::LoggedOut,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn key_store(&self) -> &K {
        &self.keys
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.state, SessionState::LoggedIn(_))
    }

    pub fn session(&self) -> ClientResult<&Session> {
        match &self.state {
            SessionState::LoggedIn(session) => Ok(session),
            SessionState::LoggedOut => Err(ClientError::NotLoggedIn),
        }
    }

    /// Creates the account and stores the identity key locally, wrapped
    /// under the password. Does not log in.
    pub fn register(&mut self, username: &Username, password: &str) -> ClientResult<()> {
        self.config.kdf.validate()?;
        let identity = KeyPair::generate()?;
        // Wrapped up front: once the server accepts, only the disk write
        // can still fail.
        let protected = protect_identity_key(&identity, password, &self.config.kdf)?;
        self.backend
            .register(username, password, &identity.public_key_hex())?;
        self.keys.save_identity(username, &protected)?;
        info!(user = %username, "registered");
        Ok(())
    }

    /// Authenticates, derives the master key and recovers the identity key.
    ///
    /// Any existing session is ended first. Losing the local identity key
    /// file does not fail the login; the session is [`LoginOutcome::Degraded`].
    pub fn login(&mut self, username: &Username, password: &str) -> ClientResult<LoginOutcome> {
        self.logout();

        let grant = self.backend.login(username, password)?;
        let token = Zeroizing::new(grant.token);
        // On failure `token` is dropped, and zeroed, with this frame.
        let master_key = derive_key(password, &grant.password_salt, &self.config.kdf)?;
        let identity = self.recover_identity(username, password);

        let outcome = if identity.is_some() {
            LoginOutcome::Ready
        } else {
            LoginOutcome::Degraded
        };
        self.state = SessionState::LoggedIn(Session::new(
            username.clone(),
            token,
            master_key,
            identity,
        ));
        info!(user = %username, ?outcome, "logged in");
        Ok(outcome)
    }

    fn recover_identity(&self, username: &Username, password: &str) -> Option<KeyPair> {
        let protected = match self.keys.load_identity(username) {
            Ok(Some(protected)) => protected,
            Ok(None) => {
                warn!(user = %username, "no identity key on this device; shared notes unavailable");
                return None;
            }
            Err(e) => {
                warn!(user = %username, error = %e, "identity key unreadable; shared notes unavailable");
                return None;
            }
        };
        match recover_identity_key(&protected, password, &self.config.kdf) {
            Ok(identity) => Some(identity),
            Err(e) => {
                warn!(user = %username, error = %e, "identity key did not unlock; shared notes unavailable");
                None
            }
        }
    }

    /// Ends the session and zeroes its keys. Returns whether one was active.
    pub fn logout(&mut self) -> bool {
        match std::mem::replace(&mut self.state, SessionState::LoggedOut) {
            SessionState::LoggedIn(session) => {
                info!(user = %session.username(), "logged out");
                true
            }
            SessionState::LoggedOut => false,
        }
    }

    /// Encrypts `content` under a fresh file key and uploads it.
    pub fn upload_note(&self, filename: &str, content: &[u8]) -> ClientResult<NoteId> {
        let session = self.session()?;
        let note = encrypt_note(content)?;
        let wrapped_key = wrap_key(note.file_key.as_bytes(), session.master_key().as_bytes())?;
        drop(note.file_key);

        let note_id = self.backend.put_note(
            session.token(),
            UploadNoteRequest {
                filename: filename.to_string(),
                ciphertext: note.ciphertext,
                wrapped_key,
                iv: note.iv,
            },
        )?;
        info!(user = %session.username(), %note_id, "uploaded note");
        Ok(note_id)
    }

    pub fn download_note(&self, note_id: &NoteId) -> ClientResult<DecryptedNote> {
        let session = self.session()?;
        let record = self.backend.get_note(session.token(), note_id)?;
        let file_key = unwrap_key(&record.wrapped_key, session.master_key().as_bytes())?;
        let content = decrypt_note(&record.ciphertext, &file_key, &record.iv)?;
        Ok(DecryptedNote {
            note_id: record.note_id,
            filename: record.filename,
            content,
        })
    }

    pub fn list_notes(&self) -> ClientResult<Vec<NoteSummary>> {
        let session = self.session()?;
        self.backend.list_notes(session.token())
    }

    /// Deletes a note together with every share and link that exposes it.
    pub fn delete_note(&self, note_id: &NoteId) -> ClientResult<()> {
        let session = self.session()?;
        self.backend.delete_note(session.token(), note_id)?;
        info!(user = %session.username(), %note_id, "deleted note");
        Ok(())
    }
}
