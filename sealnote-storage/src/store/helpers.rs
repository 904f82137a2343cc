use crate::error::{StorageError, StorageResult};
use duckdb::types::Type;
use duckdb::{Connection, Row};
use std::str::FromStr;

/// Runs `f` inside `BEGIN TRANSACTION` / `COMMIT`, rolling back on error.
pub(crate) fn with_transaction<T>(
    conn: &Connection,
    f: impl FnOnce(&Connection) -> StorageResult<T>,
) -> StorageResult<T> {
    conn.execute_batch("BEGIN TRANSACTION")?;
    match f(conn) {
        Ok(value) => {
            conn.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK");
            Err(e)
        }
    }
}

/// Reads a VARCHAR column and parses it into a typed id or name.
pub(crate) fn parse_col<T>(row: &Row<'_>, idx: usize) -> duckdb::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| duckdb::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Maps `QueryReturnedNoRows` to `None`.
pub(crate) fn optional<T>(result: duckdb::Result<T>) -> StorageResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(StorageError::DuckDb(e)),
    }
}

pub(crate) fn validate_ttl(ttl_secs: i64) -> StorageResult<()> {
    if ttl_secs <= 0 {
        return Err(StorageError::InvalidInput(format!(
            "ttl must be positive, got {ttl_secs}"
        )));
    }
    Ok(())
}
