//! DuckDB schema.
//!
//! DuckDB has no `ON DELETE CASCADE`; note deletion removes dependents
//! explicitly (see `Store::delete_note`).

use crate::error::StorageResult;
use duckdb::Connection;

pub(crate) fn initialize_schema(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id VARCHAR PRIMARY KEY,
            username VARCHAR NOT NULL UNIQUE,
            password_hash VARCHAR NOT NULL,
            password_salt VARCHAR NOT NULL,
            public_key VARCHAR NOT NULL,
            created_at BIGINT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS notes (
            id VARCHAR PRIMARY KEY,
            owner_id VARCHAR NOT NULL,
            filename VARCHAR NOT NULL,
            ciphertext VARCHAR NOT NULL,
            wrapped_key VARCHAR NOT NULL,
            iv VARCHAR NOT NULL,
            created_at BIGINT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_notes_owner ON notes(owner_id);

        CREATE TABLE IF NOT EXISTS user_shares (
            id VARCHAR PRIMARY KEY,
            note_id VARCHAR NOT NULL,
            sender_id VARCHAR NOT NULL,
            recipient_id VARCHAR NOT NULL,
            ephemeral_public_key VARCHAR NOT NULL,
            wrapped_key VARCHAR NOT NULL,
            expires_at BIGINT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_user_shares_recipient ON user_shares(recipient_id);
        CREATE INDEX IF NOT EXISTS idx_user_shares_note ON user_shares(note_id);

        CREATE TABLE IF NOT EXISTS share_links (
            token VARCHAR PRIMARY KEY,
            note_id VARCHAR NOT NULL,
            owner_id VARCHAR NOT NULL,
            expires_at BIGINT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_share_links_note ON share_links(note_id);
        CREATE INDEX IF NOT EXISTS idx_share_links_owner ON share_links(owner_id);

        CREATE TABLE IF NOT EXISTS share_link_access (
            token VARCHAR NOT NULL,
            username VARCHAR NOT NULL,
            ephemeral_public_key VARCHAR NOT NULL,
            wrapped_key VARCHAR NOT NULL,
            PRIMARY KEY (token, username)
        );
        "#,
    )?;
    Ok(())
}
