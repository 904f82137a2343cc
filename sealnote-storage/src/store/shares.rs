//! Direct (user-to-user) shares.

use super::helpers::{optional, parse_col, validate_ttl};
use super::notes::{load_note, require_owner, StoredNote};
use super::Store;
use crate::error::StorageResult;
use duckdb::{params, Connection, Row};
use sealnote_types::{NoteId, ShareId, Timestamp, UserId, Username};

pub struct NewDirectShare {
    pub note_id: NoteId,
    pub sender_id: UserId,
    pub recipient_id: UserId,
    pub ephemeral_public_key: String,
    /// File key wrapped under the ECDH session key.
    pub wrapped_key: String,
    pub ttl_secs: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShareGrant {
    pub id: ShareId,
    pub expires_at: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectShare {
    pub id: ShareId,
    pub note_id: NoteId,
    pub sender: Username,
    pub recipient_id: UserId,
    pub ephemeral_public_key: String,
    pub wrapped_key: String,
    pub expires_at: Timestamp,
}

/// A live direct share together with the note it points at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SharedNoteRecord {
    pub share: DirectShare,
    pub note: StoredNote,
}

const SHARE_SELECT: &str = "SELECT s.id, s.note_id, u.username, s.recipient_id, \
     s.ephemeral_public_key, s.wrapped_key, s.expires_at \
     FROM user_shares s JOIN users u ON u.id = s.sender_id";

fn row_to_share(row: &Row<'_>) -> duckdb::Result<DirectShare> {
    Ok(DirectShare {
        id: parse_col(row, 0)?,
        note_id: parse_col(row, 1)?,
        sender: parse_col(row, 2)?,
        recipient_id: parse_col(row, 3)?,
        ephemeral_public_key: row.get(4)?,
        wrapped_key: row.get(5)?,
        expires_at: row.get(6)?,
    })
}

fn purge_expired_for_recipient(conn: &Connection, recipient: &UserId, now: Timestamp) -> StorageResult<usize> {
    let purged = conn.execute(
        "DELETE FROM user_shares WHERE recipient_id = ? AND expires_at <= ?",
        params![recipient.to_string(), now],
    )?;
    if purged > 0 {
        tracing::debug!(recipient = %recipient, purged, "purged expired direct shares");
    }
    Ok(purged)
}

impl Store {
    /// Records a direct share. `sender_id` must own the note.
    pub fn create_direct_share(&self, share: NewDirectShare) -> StorageResult<ShareGrant> {
        validate_ttl(share.ttl_secs)?;
        let grant = ShareGrant {
            id: ShareId::new(),
            expires_at: self.now().saturating_add(share.ttl_secs),
        };

        let conn = self.lock_conn();
        require_owner(&conn, &share.note_id, &share.sender_id)?;
        conn.execute(
            "INSERT INTO user_shares \
             (id, note_id, sender_id, recipient_id, ephemeral_public_key, wrapped_key, expires_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                grant.id.to_string(),
                share.note_id.to_string(),
                share.sender_id.to_string(),
                share.recipient_id.to_string(),
                share.ephemeral_public_key,
                share.wrapped_key,
                grant.expires_at,
            ],
        )?;

        tracing::info!(
            share = %grant.id,
            note = %share.note_id,
            recipient = %share.recipient_id,
            expires_at = grant.expires_at,
            "created direct share"
        );
        Ok(grant)
    }

    /// Looks up a direct share for its recipient.
    ///
    /// Missing, expired, and addressed-to-someone-else all return `None`.
    /// An expired record is deleted on the way out.
    pub fn resolve_direct_share(
        &self,
        id: &ShareId,
        recipient_id: &UserId,
    ) -> StorageResult<Option<SharedNoteRecord>> {
        let now = self.now();
        let conn = self.lock_conn();

        let share = optional(conn.query_row(
            &format!("{SHARE_SELECT} WHERE s.id = ?"),
            params![id.to_string()],
            row_to_share,
        ))?;
        let Some(share) = share else {
            return Ok(None);
        };

        if share.expires_at <= now {
            conn.execute("DELETE FROM user_shares WHERE id = ?", params![id.to_string()])?;
            tracing::debug!(share = %id, "removed expired direct share on access");
            return Ok(None);
        }
        if share.recipient_id != *recipient_id {
            return Ok(None);
        }

        Ok(load_note(&conn, &share.note_id)?.map(|note| SharedNoteRecord { share, note }))
    }

    /// Live direct shares addressed to `recipient_id`, soonest expiry first.
    pub fn list_direct_shares(&self, recipient_id: &UserId) -> StorageResult<Vec<DirectShare>> {
        let now = self.now();
        let conn = self.lock_conn();
        purge_expired_for_recipient(&conn, recipient_id, now)?;

        let mut stmt = conn.prepare(&format!(
            "{SHARE_SELECT} WHERE s.recipient_id = ? AND s.expires_at > ? ORDER BY s.expires_at, s.id"
        ))?;
        let shares = stmt
            .query_map(params![recipient_id.to_string(), now], row_to_share)?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(shares)
    }
}
