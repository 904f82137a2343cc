//! In-process client/server fixtures.
//!
//! Requests travel as JSON through `NoteServer::handle_json`, the same path
//! a network transport would take.

#![allow(dead_code)]

use sealnote_client::{
    ApiClient, ClientConfig, ClientError, ClientResult, FileKeyStore, NoteClient, Transport,
};
use sealnote_crypto::KdfParams;
use sealnote_server::{NoteServer, ServerConfig};
use sealnote_storage::{ManualClock, Store};
use sealnote_types::{Request, Response, Username};
use std::path::Path;
use std::sync::{Arc, Once};
use tempfile::TempDir;

pub const T0: i64 = 1_700_000_000;

/// Cheap enough for tests, still above the floor `KdfParams` enforces.
pub const TEST_KDF: KdfParams = KdfParams { iterations: 1_000 };

pub type TestClient = NoteClient<ApiClient<JsonTransport>, FileKeyStore>;

pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

#[derive(Clone)]
pub struct JsonTransport {
    server: Arc<NoteServer>,
}

impl Transport for JsonTransport {
    fn send(&self, auth: Option<&str>, request: Request) -> ClientResult<Response> {
        let body =
            serde_json::to_string(&request).map_err(|e| ClientError::Transport(e.to_string()))?;
        let header = auth.map(|token| format!("Bearer {token}"));
        let reply = self.server.handle_json(header.as_deref(), &body);
        serde_json::from_str(&reply).map_err(|e| ClientError::Protocol(e.to_string()))
    }
}

/// One server, any number of clients, each with its own key directory.
pub struct World {
    pub server: Arc<NoteServer>,
    pub clock: ManualClock,
    pub dir: TempDir,
}

impl World {
    pub fn new() -> Self {
        init_tracing();
        let clock = ManualClock::new(T0);
        let store = Store::in_memory_with_clock(Arc::new(clock.clone())).unwrap();
        let config = ServerConfig {
            public_base_url: "https://notes.test".into(),
            ..Default::default()
        };
        Self {
            server: Arc::new(NoteServer::new(config, store).unwrap()),
            clock,
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// A client whose keys live in `<tmp>/<device>`.
    pub fn device(&self, device: &str) -> TestClient {
        self.client_with_keys(&self.dir.path().join(device))
    }

    pub fn client_with_keys(&self, key_dir: &Path) -> TestClient {
        let transport = JsonTransport {
            server: Arc::clone(&self.server),
        };
        let config = ClientConfig {
            key_dir: key_dir.to_path_buf(),
            kdf: TEST_KDF,
        };
        NoteClient::new(
            ApiClient::new(transport),
            FileKeyStore::new(&config.key_dir),
            config,
        )
    }

    /// Registers `name` on a fresh device and logs in.
    pub fn user(&self, name: &str) -> TestClient {
        let mut client = self.device(name);
        let username = username(name);
        client.register(&username, &password(name)).unwrap();
        client.login(&username, &password(name)).unwrap();
        client
    }
}

pub fn username(name: &str) -> Username {
    Username::parse(name).unwrap()
}

pub fn password(name: &str) -> String {
    format!("{name}-correct-horse")
}
