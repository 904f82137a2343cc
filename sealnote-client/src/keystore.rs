//! Local storage for the password-protected identity key.
//!
//! Only the wrapped private key and its salt ever touch disk. One JSON file
//! per user: `<key_dir>/<username>_identity.json`. Validated usernames
//! contain no path separators, so every file stays inside `key_dir`.

use crate::error::{ClientError, ClientResult};
use sealnote_crypto::ProtectedIdentityKey;
use sealnote_types::Username;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub trait KeyStore {
    fn save_identity(&self, username: &Username, key: &ProtectedIdentityKey) -> ClientResult<()>;

    /// `Ok(None)` when nothing was ever saved for `username`.
    fn load_identity(&self, username: &Username) -> ClientResult<Option<ProtectedIdentityKey>>;
}

/// Identity key files in a directory.
#[derive(Clone, Debug)]
pub struct FileKeyStore {
    dir: PathBuf,
}

impl FileKeyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, username: &Username) -> PathBuf {
        self.dir.join(format!("{}_identity.json", username.as_str()))
    }
}

fn io_error(action: &str, path: &Path, e: std::io::Error) -> ClientError {
    ClientError::KeyStore(format!("{action} {}: {e}", path.display()))
}

impl KeyStore for FileKeyStore {
    fn save_identity(&self, username: &Username, key: &ProtectedIdentityKey) -> ClientResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| io_error("create", &self.dir, e))?;
        let path = self.path_for(username);
        let json = serde_json::to_vec_pretty(key)
            .map_err(|e| ClientError::KeyStore(format!("encode identity key: {e}")))?;

        // A reader sees the old file or the new one, never a partial write.
        let tmp = path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp).map_err(|e| io_error("create", &tmp, e))?;
        file.write_all(&json).map_err(|e| io_error("write", &tmp, e))?;
        file.sync_all().map_err(|e| io_error("sync", &tmp, e))?;
        drop(file);
        fs::rename(&tmp, &path).map_err(|e| io_error("rename", &tmp, e))?;

        debug!(user = %username, path = %path.display(), "saved identity key");
        Ok(())
    }

    fn load_identity(&self, username: &Username) -> ClientResult<Option<ProtectedIdentityKey>> {
        let path = self.path_for(username);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error("read", &path, e)),
        };
        let key = serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::KeyStore(format!("corrupt key file {}: {e}", path.display())))?;
        Ok(Some(key))
    }
}
