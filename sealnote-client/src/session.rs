//! Per-login secrets.
//!
//! A [`Session`] is the only owner of the master key and the identity key
//! pair. Both zero their buffers on drop, as does the session token, so
//! ending a session (logout, a failed re-login, or an unwinding panic) is
//! dropping the value.

use crate::error::{ClientError, ClientResult};
use sealnote_crypto::{KeyPair, SymmetricKey};
use sealnote_types::Username;
use std::fmt;
use zeroize::Zeroizing;

pub struct Session {
    username: Username,
    token: Zeroizing<String>,
    master_key: SymmetricKey,
    identity: Option<KeyPair>,
}

impl Session {
    pub(crate) fn new(
        username: Username,
        token: Zeroizing<String>,
        master_key: SymmetricKey,
        identity: Option<KeyPair>,
    ) -> Self {
        Self {
            username,
            token,
            master_key,
            identity,
        }
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub(crate) fn token(&self) -> &str {
        &self.token
    }

    pub(crate) fn master_key(&self) -> &SymmetricKey {
        &self.master_key
    }

    /// The identity key pair, needed to open anything shared with this user.
    pub(crate) fn identity(&self) -> ClientResult<&KeyPair> {
        self.identity.as_ref().ok_or(ClientError::NoIdentityKey)
    }

    /// True when the identity key could not be recovered at login.
    pub fn is_degraded(&self) -> bool {
        self.identity.is_none()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("degraded", &self.is_degraded())
            .finish_non_exhaustive()
    }
}
