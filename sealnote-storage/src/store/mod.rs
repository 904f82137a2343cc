//! Thread-safe DuckDB wrapper, split by table family.

mod helpers;
pub(crate) mod links;
pub(crate) mod notes;
pub(crate) mod shares;
pub(crate) mod users;

use crate::clock::{Clock, SystemClock};
use crate::error::StorageResult;
use crate::schema::initialize_schema;
use duckdb::{params, Connection};
use sealnote_types::Timestamp;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Server-side row store.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
    clock: Arc<dyn Clock>,
}

/// Rows removed by [`Store::purge_expired`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub direct_shares: usize,
    pub share_links: usize,
}

impl Store {
    /// Opens (or creates) the database at `path` on the system clock.
    pub fn open(path: &Path) -> StorageResult<Self> {
        Self::open_with_clock(path, Arc::new(SystemClock))
    }

    /// A failed open is returned as is; the WAL next to the file is left
    /// untouched, since it may hold committed revocations and deletes.
    pub fn open_with_clock(path: &Path, clock: Arc<dyn Clock>) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn, clock)
    }

    /// Opens an in-memory database (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::in_memory_with_clock(Arc::new(SystemClock))
    }

    pub fn in_memory_with_clock(clock: Arc<dyn Clock>) -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?, clock)
    }

    fn from_connection(conn: Connection, clock: Arc<dyn Clock>) -> StorageResult<Self> {
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            clock,
        })
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub(crate) fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Acquire the connection lock, recovering from poison and discarding
    /// any transaction the panicking holder left open.
    pub(crate) fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("recovering from poisoned storage mutex");
            let conn = poisoned.into_inner();
            let _ = conn.execute_batch("ROLLBACK");
            conn
        })
    }

    /// Deletes every expired direct share and share link.
    pub fn purge_expired(&self) -> StorageResult<PurgeReport> {
        let now = self.now();
        let conn = self.lock_conn();
        let report = helpers::with_transaction(&conn, |conn| {
            conn.execute(
                "DELETE FROM share_link_access WHERE token IN \
                 (SELECT token FROM share_links WHERE expires_at <= ?)",
                params![now],
            )?;
            let share_links =
                conn.execute("DELETE FROM share_links WHERE expires_at <= ?", params![now])?;
            let direct_shares =
                conn.execute("DELETE FROM user_shares WHERE expires_at <= ?", params![now])?;
            Ok(PurgeReport {
                direct_shares,
                share_links,
            })
        })?;

        if report != PurgeReport::default() {
            tracing::info!(
                direct_shares = report.direct_shares,
                share_links = report.share_links,
                "purged expired shares"
            );
        }
        Ok(report)
    }
}
