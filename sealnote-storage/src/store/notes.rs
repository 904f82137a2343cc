//! Encrypted notes and the delete cascade.

use super::helpers::{optional, parse_col, with_transaction};
use super::Store;
use crate::error::{StorageError, StorageResult};
use duckdb::{params, Connection, Row};
use sealnote_types::{NoteId, Timestamp, UserId, Username};

pub struct NewNote {
    pub owner_id: UserId,
    pub filename: String,
    /// Base64 ciphertext.
    pub ciphertext: String,
    /// File key wrapped under the owner's master key.
    pub wrapped_key: String,
    /// Hex IV.
    pub iv: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredNote {
    pub id: NoteId,
    pub owner_id: UserId,
    pub owner: Username,
    pub filename: String,
    pub ciphertext: String,
    pub wrapped_key: String,
    pub iv: String,
    pub created_at: Timestamp,
}

/// Listing entry; no ciphertext.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoteMeta {
    pub id: NoteId,
    pub filename: String,
    pub created_at: Timestamp,
}

/// Rows removed by [`Store::delete_note`], besides the note itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub link_entries: usize,
    pub share_links: usize,
    pub direct_shares: usize,
}

fn row_to_note(row: &Row<'_>) -> duckdb::Result<StoredNote> {
    Ok(StoredNote {
        id: parse_col(row, 0)?,
        owner_id: parse_col(row, 1)?,
        owner: parse_col(row, 2)?,
        filename: row.get(3)?,
        ciphertext: row.get(4)?,
        wrapped_key: row.get(5)?,
        iv: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// Loads a note with its owner's username. Caller holds the lock.
pub(crate) fn load_note(conn: &Connection, id: &NoteId) -> StorageResult<Option<StoredNote>> {
    optional(conn.query_row(
        "SELECT n.id, n.owner_id, u.username, n.filename, n.ciphertext, n.wrapped_key, n.iv, n.created_at \
         FROM notes n JOIN users u ON u.id = n.owner_id WHERE n.id = ?",
        params![id.to_string()],
        row_to_note,
    ))
}

/// Fails with `NotFound` if the note is absent and `Forbidden` if `owner_id`
/// does not own it. Caller holds the lock.
pub(crate) fn require_owner(conn: &Connection, id: &NoteId, owner_id: &UserId) -> StorageResult<()> {
    let owner: Option<UserId> = optional(conn.query_row(
        "SELECT owner_id FROM notes WHERE id = ?",
        params![id.to_string()],
        |row| parse_col(row, 0),
    ))?;
    match owner {
        None => Err(StorageError::NotFound),
        Some(owner) if owner != *owner_id => Err(StorageError::Forbidden),
        Some(_) => Ok(()),
    }
}

impl Store {
    pub fn put_note(&self, note: NewNote) -> StorageResult<NoteId> {
        let id = NoteId::new();
        let created_at = self.now();
        let conn = self.lock_conn();
        conn.execute(
            "INSERT INTO notes (id, owner_id, filename, ciphertext, wrapped_key, iv, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                id.to_string(),
                note.owner_id.to_string(),
                note.filename,
                note.ciphertext,
                note.wrapped_key,
                note.iv,
                created_at,
            ],
        )?;
        tracing::debug!(note = %id, owner = %note.owner_id, "stored note");
        Ok(id)
    }

    pub fn get_note(&self, id: &NoteId) -> StorageResult<Option<StoredNote>> {
        let conn = self.lock_conn();
        load_note(&conn, id)
    }

    /// Notes owned by `owner_id`, oldest first.
    pub fn list_notes(&self, owner_id: &UserId) -> StorageResult<Vec<NoteMeta>> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare(
            "SELECT id, filename, created_at FROM notes WHERE owner_id = ? ORDER BY created_at, id",
        )?;
        let notes = stmt
            .query_map(params![owner_id.to_string()], |row| {
                Ok(NoteMeta {
                    id: parse_col(row, 0)?,
                    filename: row.get(1)?,
                    created_at: row.get(2)?,
                })
            })?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(notes)
    }

    /// Deletes a note and everything that references it.
    ///
    /// Order: link whitelist entries, links, direct shares, then the note,
    /// all in one transaction under the lock.
    pub fn delete_note(&self, id: &NoteId, owner_id: &UserId) -> StorageResult<CascadeReport> {
        let conn = self.lock_conn();
        require_owner(&conn, id, owner_id)?;

        let note_id = id.to_string();
        let report = with_transaction(&conn, |conn| {
            let link_entries = conn.execute(
                "DELETE FROM share_link_access WHERE token IN \
                 (SELECT token FROM share_links WHERE note_id = ?)",
                params![note_id],
            )?;
            let share_links =
                conn.execute("DELETE FROM share_links WHERE note_id = ?", params![note_id])?;
            let direct_shares =
                conn.execute("DELETE FROM user_shares WHERE note_id = ?", params![note_id])?;
            conn.execute("DELETE FROM notes WHERE id = ?", params![note_id])?;
            Ok(CascadeReport {
                link_entries,
                share_links,
                direct_shares,
            })
        })?;

        tracing::info!(
            note = %id,
            links = report.share_links,
            link_entries = report.link_entries,
            direct_shares = report.direct_shares,
            "deleted note and dependents"
        );
        Ok(report)
    }
}
