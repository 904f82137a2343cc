//! In-process server fixtures for the wire-level tests.

#![allow(dead_code)]

use sealnote_crypto::{encrypt_note, seal_file_key, wrap_key, KeyPair, SealedFileKey, SymmetricKey};
use sealnote_server::{NoteServer, ServerConfig};
use sealnote_storage::{ManualClock, Store};
use sealnote_types::protocol::{
    LinkEntry, LoginRequest, NoteRef, RegisterRequest, UploadNoteRequest,
};
use sealnote_types::{ErrorKind, NoteId, Request, Response, Username};
use std::sync::{Arc, Once};

pub const T0: i64 = 1_700_000_000;

pub struct Harness {
    pub server: NoteServer,
    pub clock: ManualClock,
}

pub struct TestUser {
    pub username: Username,
    pub identity: KeyPair,
    pub token: String,
}

/// Routes server logs to the test writer; filter with `RUST_LOG`.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

impl Harness {
    pub fn new() -> Self {
        init_tracing();
        let clock = ManualClock::new(T0);
        let store = Store::in_memory_with_clock(Arc::new(clock.clone())).unwrap();
        let config = ServerConfig {
            public_base_url: "https://notes.test".into(),
            ..Default::default()
        };
        Self {
            server: NoteServer::new(config, store).unwrap(),
            clock,
        }
    }

    pub fn call(&self, user: &TestUser, request: Request) -> Response {
        self.server.handle(Some(&user.token), request)
    }

    pub fn user(&self, name: &str) -> TestUser {
        let username = Username::parse(name).unwrap();
        let identity = KeyPair::generate().unwrap();
        let registered = self.server.handle(
            None,
            Request::Register(RegisterRequest {
                username: username.clone(),
                password: format!("{name}-password"),
                identity_public_key: identity.public_key_hex(),
            }),
        );
        assert_eq!(registered, Response::Registered);

        let token = match self.server.handle(
            None,
            Request::Login(LoginRequest {
                username: username.clone(),
                password: format!("{name}-password"),
            }),
        ) {
            Response::LoggedIn(login) => login.token,
            other => panic!("login failed: {other:?}"),
        };
        TestUser {
            username,
            identity,
            token,
        }
    }

    /// Uploads a note under a throwaway master key; returns the id and file key.
    pub fn upload(&self, owner: &TestUser, filename: &str) -> (NoteId, SymmetricKey) {
        let master = SymmetricKey::generate().unwrap();
        let note = encrypt_note(filename.as_bytes()).unwrap();
        let response = self.call(
            owner,
            Request::UploadNote(UploadNoteRequest {
                filename: filename.to_string(),
                ciphertext: note.ciphertext.clone(),
                wrapped_key: wrap_key(note.file_key.as_bytes(), master.as_bytes()).unwrap(),
                iv: note.iv.clone(),
            }),
        );
        match response {
            Response::NoteUploaded(NoteRef { note_id }) => (note_id, note.file_key),
            other => panic!("upload failed: {other:?}"),
        }
    }
}

pub fn seal_for(file_key: &SymmetricKey, recipient: &TestUser) -> SealedFileKey {
    seal_file_key(file_key, &recipient.identity.public_key_hex()).unwrap()
}

pub fn link_entry(file_key: &SymmetricKey, recipient: &TestUser) -> LinkEntry {
    let sealed = seal_for(file_key, recipient);
    LinkEntry {
        username: recipient.username.clone(),
        ephemeral_public_key: sealed.ephemeral_public_key,
        wrapped_key: sealed.wrapped_key,
    }
}

pub fn error_kind(response: &Response) -> Option<ErrorKind> {
    match response {
        Response::Error(body) => Some(body.kind),
        _ => None,
    }
}
