//! Share links: one token, one whitelisted envelope per recipient.
//!
//! Lifecycle: Active until `expires_at`, then Expired (indistinguishable
//! from never having existed), then Deleted on revocation, note deletion,
//! or the first access that notices the expiry.

use super::helpers::{optional, parse_col, validate_ttl, with_transaction};
use super::notes::{load_note, require_owner, StoredNote};
use super::Store;
use crate::error::{StorageError, StorageResult};
use duckdb::{params, Connection};
use sealnote_types::{LinkToken, NoteId, Timestamp, UserId, Username, LINK_TOKEN_BYTES};
use std::collections::HashSet;

/// One recipient's copy of the file key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkEnvelope {
    pub username: Username,
    pub ephemeral_public_key: String,
    pub wrapped_key: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkGrant {
    pub token: LinkToken,
    pub expires_at: Timestamp,
}

/// What a whitelisted recipient gets back from a live link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedLink {
    pub token: LinkToken,
    pub envelope: LinkEnvelope,
    pub expires_at: Timestamp,
    pub note: StoredNote,
}

/// Owner's view of a link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShareLinkInfo {
    pub token: LinkToken,
    pub note_id: NoteId,
    pub expires_at: Timestamp,
    pub shared_with: Vec<Username>,
}

struct LinkRow {
    note_id: NoteId,
    owner_id: UserId,
    expires_at: Timestamp,
}

fn load_link(conn: &Connection, token: &LinkToken) -> StorageResult<Option<LinkRow>> {
    optional(conn.query_row(
        "SELECT note_id, owner_id, expires_at FROM share_links WHERE token = ?",
        params![token.as_str()],
        |row| {
            Ok(LinkRow {
                note_id: parse_col(row, 0)?,
                owner_id: parse_col(row, 1)?,
                expires_at: row.get(2)?,
            })
        },
    ))
}

fn delete_link(conn: &Connection, token: &LinkToken) -> StorageResult<()> {
    with_transaction(conn, |conn| {
        conn.execute(
            "DELETE FROM share_link_access WHERE token = ?",
            params![token.as_str()],
        )?;
        conn.execute("DELETE FROM share_links WHERE token = ?", params![token.as_str()])?;
        Ok(())
    })
}

fn new_token() -> StorageResult<LinkToken> {
    let mut bytes = [0u8; LINK_TOKEN_BYTES];
    sealnote_crypto::fill_random(&mut bytes)?;
    Ok(LinkToken::from_bytes(&bytes))
}

impl Store {
    /// Creates a link for `note_id` with one envelope per whitelisted user.
    ///
    /// `owner_id` must own the note. The whitelist must be non-empty and
    /// name each user at most once.
    pub fn create_share_link(
        &self,
        note_id: &NoteId,
        owner_id: &UserId,
        entries: &[LinkEnvelope],
        ttl_secs: i64,
    ) -> StorageResult<LinkGrant> {
        validate_ttl(ttl_secs)?;
        if entries.is_empty() {
            return Err(StorageError::InvalidInput("share link whitelist is empty".into()));
        }
        let mut seen = HashSet::with_capacity(entries.len());
        if let Some(dup) = entries.iter().find(|e| !seen.insert(&e.username)) {
            return Err(StorageError::InvalidInput(format!(
                "{} appears twice in the whitelist",
                dup.username
            )));
        }

        let grant = LinkGrant {
            token: new_token()?,
            expires_at: self.now().saturating_add(ttl_secs),
        };

        let conn = self.lock_conn();
        require_owner(&conn, note_id, owner_id)?;
        with_transaction(&conn, |conn| {
            conn.execute(
                "INSERT INTO share_links (token, note_id, owner_id, expires_at) VALUES (?, ?, ?, ?)",
                params![
                    grant.token.as_str(),
                    note_id.to_string(),
                    owner_id.to_string(),
                    grant.expires_at,
                ],
            )?;
            let mut stmt = conn.prepare(
                "INSERT INTO share_link_access (token, username, ephemeral_public_key, wrapped_key) \
                 VALUES (?, ?, ?, ?)",
            )?;
            for entry in entries {
                stmt.execute(params![
                    grant.token.as_str(),
                    entry.username.as_str(),
                    entry.ephemeral_public_key,
                    entry.wrapped_key,
                ])?;
            }
            Ok(())
        })?;

        tracing::info!(
            link = grant.token.log_prefix(),
            note = %note_id,
            recipients = entries.len(),
            expires_at = grant.expires_at,
            "created share link"
        );
        Ok(grant)
    }

    /// Resolves a link for one requesting user.
    ///
    /// Missing, expired, and not-whitelisted all return `None`. An expired
    /// link is deleted, with its whitelist, before returning.
    pub fn resolve_share_link(
        &self,
        token: &LinkToken,
        username: &Username,
    ) -> StorageResult<Option<ResolvedLink>> {
        let now = self.now();
        let conn = self.lock_conn();

        let Some(link) = load_link(&conn, token)? else {
            return Ok(None);
        };
        if link.expires_at <= now {
            delete_link(&conn, token)?;
            tracing::debug!(link = token.log_prefix(), "removed expired share link on access");
            return Ok(None);
        }

        let envelope = optional(conn.query_row(
            "SELECT username, ephemeral_public_key, wrapped_key FROM share_link_access \
             WHERE token = ? AND username = ?",
            params![token.as_str(), username.as_str()],
            |row| {
                Ok(LinkEnvelope {
                    username: parse_col(row, 0)?,
                    ephemeral_public_key: row.get(1)?,
                    wrapped_key: row.get(2)?,
                })
            },
        ))?;
        let Some(envelope) = envelope else {
            return Ok(None);
        };

        Ok(load_note(&conn, &link.note_id)?.map(|note| ResolvedLink {
            token: token.clone(),
            envelope,
            expires_at: link.expires_at,
            note,
        }))
    }

    /// Deletes a link and its whitelist.
    ///
    /// Only the owner may revoke. A token that does not exist (or no longer
    /// exists) is `Forbidden` too, so revocation does not reveal existence.
    pub fn revoke_share_link(&self, token: &LinkToken, owner_id: &UserId) -> StorageResult<()> {
        let conn = self.lock_conn();
        match load_link(&conn, token)? {
            Some(link) if link.owner_id == *owner_id => {
                delete_link(&conn, token)?;
                tracing::info!(link = token.log_prefix(), "revoked share link");
                Ok(())
            }
            _ => Err(StorageError::Forbidden),
        }
    }

    /// The owner's live links with their whitelists, soonest expiry first.
    pub fn list_share_links(&self, owner_id: &UserId) -> StorageResult<Vec<ShareLinkInfo>> {
        let now = self.now();
        let conn = self.lock_conn();

        let expired: Vec<LinkToken> = {
            let mut stmt = conn
                .prepare("SELECT token FROM share_links WHERE owner_id = ? AND expires_at <= ?")?;
            let tokens = stmt
                .query_map(params![owner_id.to_string(), now], |row| parse_col(row, 0))?
                .collect::<duckdb::Result<Vec<_>>>()?;
            tokens
        };
        for token in &expired {
            delete_link(&conn, token)?;
        }
        if !expired.is_empty() {
            tracing::debug!(owner = %owner_id, purged = expired.len(), "purged expired share links");
        }

        let mut stmt = conn.prepare(
            "SELECT l.token, l.note_id, l.expires_at, a.username \
             FROM share_links l JOIN share_link_access a ON a.token = l.token \
             WHERE l.owner_id = ? ORDER BY l.expires_at, l.token, a.username",
        )?;
        let rows = stmt
            .query_map(params![owner_id.to_string()], |row| {
                Ok((
                    parse_col::<LinkToken>(row, 0)?,
                    parse_col::<NoteId>(row, 1)?,
                    row.get::<_, Timestamp>(2)?,
                    parse_col::<Username>(row, 3)?,
                ))
            })?
            .collect::<duckdb::Result<Vec<_>>>()?;

        // Rows arrive grouped by token.
        let mut links: Vec<ShareLinkInfo> = Vec::new();
        for (token, note_id, expires_at, username) in rows {
            match links.last_mut() {
                Some(last) if last.token == token => last.shared_with.push(username),
                _ => links.push(ShareLinkInfo {
                    token,
                    note_id,
                    expires_at,
                    shared_with: vec![username],
                }),
            }
        }
        Ok(links)
    }
}
