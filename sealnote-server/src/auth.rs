//! Password verification and session tokens.
//!
//! Passwords are stored only as Argon2id PHC strings. A session token is
//! `base64(user_id:username:exp) "." hex(HMAC-SHA256(secret, base))`; the
//! server keeps no session table, so a token is valid exactly while its
//! signature checks out, it has not expired, and its user still exists.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use hmac::{Hmac, Mac};
use sealnote_crypto::{
    base64_decode, base64_encode, from_hex, generate_random_bytes, generate_salt, parse_public_key,
    to_hex, SymmetricKey,
};
use sealnote_storage::{NewUser, Store, UserRecord};
use sealnote_types::{Timestamp, UserId, Username};
use sha2::Sha256;
use tracing::{debug, info};

type HmacSha256 = Hmac<Sha256>;

/// The caller behind a verified session token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub username: Username,
}

/// Successful login: the token plus the salt for master key derivation.
pub struct LoginGrant {
    pub token: String,
    pub password_salt: String,
    pub expires_at: Timestamp,
}

impl std::fmt::Debug for LoginGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginGrant")
            .field("token", &"<redacted>")
            .field("password_salt", &self.password_salt)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

pub struct AuthService {
    store: Store,
    secret: SymmetricKey,
    token_ttl_secs: i64,
    hasher: Argon2<'static>,
    /// Verified against when the username is unknown, so both failure paths
    /// cost one Argon2 run.
    dummy_hash: String,
}

impl AuthService {
    pub fn new(config: &ServerConfig, store: Store) -> ServerResult<Self> {
        let secret = match &config.token_secret_hex {
            Some(hex) => SymmetricKey::from_slice(&from_hex(hex)?)?,
            None => SymmetricKey::generate()?,
        };
        let hasher = Argon2::default();
        let dummy_hash = hash_password(&hasher, "sealnote-dummy-password")?;
        Ok(Self {
            store,
            secret,
            token_ttl_secs: config.token_ttl_secs,
            hasher,
            dummy_hash,
        })
    }

    /// Creates an account. The identity key must be a P-256 SEC1 point.
    pub fn register(
        &self,
        username: Username,
        password: &str,
        identity_public_key: &str,
    ) -> ServerResult<UserRecord> {
        if password.is_empty() {
            return Err(ServerError::BadRequest("password is empty".into()));
        }
        parse_public_key(identity_public_key)
            .map_err(|_| ServerError::BadRequest("identity public key is not a P-256 point".into()))?;

        let user = self.store.create_user(NewUser {
            username,
            password_hash: hash_password(&self.hasher, password)?,
            password_salt: generate_salt()?,
            public_key: identity_public_key.to_string(),
        })?;
        info!(user = %user.username, "registered user");
        Ok(user)
    }

    /// Verifies credentials and issues a session token.
    ///
    /// Unknown usernames and wrong passwords give the same error.
    pub fn login(&self, username: &Username, password: &str) -> ServerResult<LoginGrant> {
        let Some(user) = self.store.find_user(username)? else {
            let _ = self.verify_password(&self.dummy_hash, password);
            debug!(user = %username, "login for unknown user");
            return Err(ServerError::InvalidCredentials);
        };
        if !self.verify_password(&user.password_hash, password)? {
            debug!(user = %username, "login with wrong password");
            return Err(ServerError::InvalidCredentials);
        }

        let expires_at = self.store.clock().now().saturating_add(self.token_ttl_secs);
        let token = self.issue_token(&user.id, &user.username, expires_at)?;
        info!(user = %user.username, expires_at, "issued session token");
        Ok(LoginGrant {
            token,
            password_salt: user.password_salt,
            expires_at,
        })
    }

    /// Checks signature, expiry, and that the user still exists.
    pub fn verify_token(&self, token: &str) -> ServerResult<AuthenticatedUser> {
        let (base, signature) = token.rsplit_once('.').ok_or(ServerError::Unauthorized)?;
        let signature = from_hex(signature).map_err(|_| ServerError::Unauthorized)?;
        self.mac(base)?
            .verify_slice(&signature)
            .map_err(|_| ServerError::Unauthorized)?;

        let payload = base64_decode(base).map_err(|_| ServerError::Unauthorized)?;
        let payload = String::from_utf8(payload).map_err(|_| ServerError::Unauthorized)?;
        let mut parts = payload.splitn(3, ':');
        let (Some(id), Some(username), Some(expires_at)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(ServerError::Unauthorized);
        };
        let id: UserId = id.parse().map_err(|_| ServerError::Unauthorized)?;
        let expires_at: Timestamp = expires_at.parse().map_err(|_| ServerError::Unauthorized)?;
        if expires_at <= self.store.clock().now() {
            return Err(ServerError::Unauthorized);
        }

        match self.store.get_user(&id)? {
            Some(user) if user.username.as_str() == username => Ok(AuthenticatedUser {
                id: user.id,
                username: user.username,
            }),
            _ => Err(ServerError::Unauthorized),
        }
    }

    fn issue_token(&self, id: &UserId, username: &Username, expires_at: Timestamp) -> ServerResult<String> {
        let base = base64_encode(format!("{id}:{username}:{expires_at}").as_bytes());
        let signature = self.mac(&base)?.finalize().into_bytes();
        Ok(format!("{base}.{}", to_hex(&signature)))
    }

    fn mac(&self, base: &str) -> ServerResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| ServerError::Config(format!("token secret: {e}")))?;
        mac.update(base.as_bytes());
        Ok(mac)
    }

    fn verify_password(&self, phc: &str, password: &str) -> ServerResult<bool> {
        let parsed = PasswordHash::new(phc).map_err(|e| ServerError::PasswordHash(e.to_string()))?;
        Ok(self
            .hasher
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

fn hash_password(hasher: &Argon2<'_>, password: &str) -> ServerResult<String> {
    let salt_bytes = generate_random_bytes(16)?;
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| ServerError::PasswordHash(e.to_string()))?;
    Ok(hasher
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ServerError::PasswordHash(e.to_string()))?
        .to_string())
}
