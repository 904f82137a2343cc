//! Registered users.

use super::helpers::{optional, parse_col};
use super::Store;
use crate::error::{StorageError, StorageResult};
use duckdb::{params, Row};
use sealnote_types::{Timestamp, UserId, Username};

/// Registration data. The password itself never reaches storage.
pub struct NewUser {
    pub username: Username,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// Hex salt handed back at login for client-side master key derivation.
    pub password_salt: String,
    /// Hex SEC1 identity public key.
    pub public_key: String,
}

#[derive(Clone)]
pub struct UserRecord {
    pub id: UserId,
    pub username: Username,
    pub password_hash: String,
    pub password_salt: String,
    pub public_key: String,
    pub created_at: Timestamp,
}

impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

const USER_COLUMNS: &str =
    "id, username, password_hash, password_salt, public_key, created_at";

fn row_to_user(row: &Row<'_>) -> duckdb::Result<UserRecord> {
    Ok(UserRecord {
        id: parse_col(row, 0)?,
        username: parse_col(row, 1)?,
        password_hash: row.get(2)?,
        password_salt: row.get(3)?,
        public_key: row.get(4)?,
        created_at: row.get(5)?,
    })
}

impl Store {
    /// Inserts a new user. A taken username is `Conflict`.
    pub fn create_user(&self, new: NewUser) -> StorageResult<UserRecord> {
        let record = UserRecord {
            id: UserId::new(),
            username: new.username,
            password_hash: new.password_hash,
            password_salt: new.password_salt,
            public_key: new.public_key,
            created_at: self.now(),
        };

        let conn = self.lock_conn();
        let taken: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE username = ?",
            params![record.username.as_str()],
            |row| row.get(0),
        )?;
        if taken > 0 {
            return Err(StorageError::Conflict(format!(
                "username {} is taken",
                record.username
            )));
        }

        conn.execute(
            &format!("INSERT INTO users ({USER_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?)"),
            params![
                record.id.to_string(),
                record.username.as_str(),
                record.password_hash,
                record.password_salt,
                record.public_key,
                record.created_at,
            ],
        )?;
        Ok(record)
    }

    pub fn find_user(&self, username: &Username) -> StorageResult<Option<UserRecord>> {
        let conn = self.lock_conn();
        optional(conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?"),
            params![username.as_str()],
            row_to_user,
        ))
    }

    pub fn get_user(&self, id: &UserId) -> StorageResult<Option<UserRecord>> {
        let conn = self.lock_conn();
        optional(conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"),
            params![id.to_string()],
            row_to_user,
        ))
    }
}
