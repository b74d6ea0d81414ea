//! Schema initialization and connection pragmas.
//!
//! One table, `yapdict`, holds every entry. The schema is created if
//! missing and never migrated.

use rusqlite::Connection;
use std::time::Duration;

/// Longest busy timeout SQLite accepts (`i32::MAX` milliseconds).
pub const MAX_BUSY_TIMEOUT: Duration = Duration::from_millis(i32::MAX as u64);

/// Name of the key-value table.
pub const TABLE: &str = "yapdict";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS yapdict (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS yapdict_key ON yapdict (key);
"#;

/// Apply connection pragmas for concurrent readers and a single writer.
///
/// WAL lets readers proceed while a writer holds the lock, and
/// `synchronous = NORMAL` trades durability of the last commits on power
/// loss for throughput. The busy timeout bounds how long a writer waits
/// for the lock; longer timeouts are clamped to [`MAX_BUSY_TIMEOUT`].
pub fn apply_pragmas(conn: &Connection, timeout: Duration) -> rusqlite::Result<()> {
    let timeout = timeout.min(MAX_BUSY_TIMEOUT);
    conn.busy_timeout(timeout)?;

    // In-memory databases report "memory" and ignore the request.
    let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;

    tracing::debug!(
        journal_mode = %mode,
        busy_timeout_ms = timeout.as_millis() as u64,
        "Applied pragmas"
    );
    Ok(())
}

/// Create the key-value table and its unique index if missing.
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)?;
    tracing::debug!(table = TABLE, "Schema ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        initialize_schema(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'yapdict'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 1);

        let indexes: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = 'yapdict_key'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(indexes, 1);
    }

    #[test]
    fn test_pragmas_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let conn = Connection::open(temp_dir.path().join("test.db")).unwrap();
        apply_pragmas(&conn, Duration::from_millis(500)).unwrap();

        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode, "wal");

        // NORMAL = 1
        let sync: i64 = conn
            .query_row("PRAGMA synchronous", [], |row| row.get(0))
            .unwrap();
        assert_eq!(sync, 1);

        let timeout: i64 = conn
            .query_row("PRAGMA busy_timeout", [], |row| row.get(0))
            .unwrap();
        assert_eq!(timeout, 500);
    }

    #[test]
    fn test_oversized_timeout_is_clamped() {
        let conn = Connection::open_in_memory().unwrap();
        apply_pragmas(&conn, Duration::from_secs(10_000_000)).unwrap();

        let timeout: i64 = conn
            .query_row("PRAGMA busy_timeout", [], |row| row.get(0))
            .unwrap();
        assert_eq!(timeout, i64::from(i32::MAX));
    }
}
