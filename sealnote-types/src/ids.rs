//! Identifier newtypes.

use crate::error::{TypesError, TypesResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub(crate) const MAX_USERNAME_LEN: usize = 32;

/// Number of random bytes behind a share link token.
pub const LINK_TOKEN_BYTES: usize = 32;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new time-ordered identifier.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = TypesError;

            fn from_str(s: &str) -> TypesResult<Self> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|_| TypesError::InvalidId(s.chars().take(40).collect()))
            }
        }
    };
}

uuid_id!(
    /// Server-assigned user identifier.
    UserId
);
uuid_id!(
    /// Identifier of an uploaded note.
    NoteId
);
uuid_id!(
    /// Identifier of a direct (user-to-user) share.
    ShareId
);

/// A validated username.
///
/// 1 to 32 characters from `[A-Za-z0-9_.-]`, and not `.` or `..`. The
/// restriction keeps usernames safe to embed in session tokens (no `:`)
/// and in local key file names (no path separators).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    pub fn parse(s: impl Into<String>) -> TypesResult<Self> {
        let s = s.into();
        let valid_chars = s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
        if s.is_empty() || s.len() > MAX_USERNAME_LEN || !valid_chars || s == "." || s == ".." {
            return Err(TypesError::InvalidUsername);
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Username {
    type Error = TypesError;

    fn try_from(value: String) -> TypesResult<Self> {
        Self::parse(value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl FromStr for Username {
    type Err = TypesError;

    fn from_str(s: &str) -> TypesResult<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Opaque share link token: 32 random bytes, lowercase hex.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LinkToken(String);

impl LinkToken {
    pub fn from_bytes(bytes: &[u8; LINK_TOKEN_BYTES]) -> Self {
        Self(hex::encode(bytes))
    }

    pub fn parse(s: &str) -> TypesResult<Self> {
        let s = s.trim();
        let well_formed = s.len() == LINK_TOKEN_BYTES * 2
            && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !well_formed {
            return Err(TypesError::InvalidLinkToken);
        }
        Ok(Self(s.to_string()))
    }

    /// Accepts either a bare token or a full share URL
    /// (`https://host/share/<token>`), as users tend to paste either.
    pub fn from_link_or_token(input: &str) -> TypesResult<Self> {
        let input = input.trim().trim_end_matches('/');
        let candidate = input.rsplit('/').next().unwrap_or(input);
        Self::parse(candidate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for log lines; the full token is a bearer capability.
    pub fn log_prefix(&self) -> &str {
        &self.0[..8]
    }
}

impl TryFrom<String> for LinkToken {
    type Error = TypesError;

    fn try_from(value: String) -> TypesResult<Self> {
        Self::parse(&value)
    }
}

impl From<LinkToken> for String {
    fn from(value: LinkToken) -> Self {
        value.0
    }
}

impl fmt::Display for LinkToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LinkToken {
    type Err = TypesError;

    fn from_str(s: &str) -> TypesResult<Self> {
        Self::parse(s)
    }
}

impl fmt::Debug for LinkToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LinkToken({}..)", self.log_prefix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_accepts_simple_names() {
        for name in ["alice", "bob_2", "c.d-e", "A"] {
            assert!(Username::parse(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn username_rejects_path_and_token_separators() {
        let too_long = "x".repeat(33);
        for name in ["", "a/b", "..", ".", "a:b", "a b", "ü", too_long.as_str()] {
            assert_eq!(Username::parse(name), Err(TypesError::InvalidUsername));
        }
    }

    #[test]
    fn link_token_from_url() {
        let raw = [7u8; LINK_TOKEN_BYTES];
        let token = LinkToken::from_bytes(&raw);
        let url = format!("http://localhost:8080/share/{token}");

        assert_eq!(LinkToken::from_link_or_token(&url).unwrap(), token);
        assert_eq!(LinkToken::from_link_or_token(token.as_str()).unwrap(), token);
    }

    #[test]
    fn link_token_rejects_malformed() {
        assert!(LinkToken::parse("abc").is_err());
        assert!(LinkToken::parse(&"G".repeat(64)).is_err());
        assert!(LinkToken::parse(&"A".repeat(64)).is_err());
    }

    #[test]
    fn link_token_debug_is_truncated() {
        let token = LinkToken::from_bytes(&[0xab; LINK_TOKEN_BYTES]);
        assert_eq!(format!("{token:?}"), "LinkToken(abababab..)");
    }

    #[test]
    fn note_id_round_trips_through_string() {
        let id = NoteId::new();
        let parsed: NoteId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<NoteId>().is_err());
    }
}
