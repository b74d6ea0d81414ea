//! Lazy scans over the key-value table in insertion order.
//!
//! A scan pages through rows by row id (`rowid > last ORDER BY rowid`), so it
//! never holds a statement open between calls to `next`. Each page is a
//! fresh query: rows committed after the scan started may appear if they
//! sort after the cursor. Wrap the scan in a transaction for a snapshot.

use std::collections::VecDeque;

use rusqlite::{params, Connection, Row};

use crate::error::{Result, StoreError};
use crate::value::Value;

/// Rows fetched per page.
pub const PAGE_SIZE: usize = 128;

const KEYS_SQL: &str = "SELECT rowid, key FROM yapdict WHERE rowid > ?1 ORDER BY rowid LIMIT ?2";
const VALUES_SQL: &str =
    "SELECT rowid, value FROM yapdict WHERE rowid > ?1 ORDER BY rowid LIMIT ?2";
const ITEMS_SQL: &str =
    "SELECT rowid, key, value FROM yapdict WHERE rowid > ?1 ORDER BY rowid LIMIT ?2";

type RowMapper<T> = fn(&Row<'_>) -> rusqlite::Result<T>;

/// Finite iterator over stored rows.
///
/// Yields `Err` at most once and ends after it. Rows decoded before a
/// failing row are yielded first, so the error marks where the scan stopped.
pub struct Scan<'c, T> {
    conn: &'c Connection,
    sql: &'static str,
    map: RowMapper<T>,
    cursor: i64,
    buffer: VecDeque<T>,
    pending: Option<StoreError>,
    exhausted: bool,
}

impl<'c, T> Scan<'c, T> {
    fn new(conn: &'c Connection, sql: &'static str, map: RowMapper<T>) -> Self {
        Self {
            conn,
            sql,
            map,
            cursor: 0,
            buffer: VecDeque::with_capacity(PAGE_SIZE),
            pending: None,
            exhausted: false,
        }
    }

    fn fetch_page(&mut self) -> Result<()> {
        let conn = self.conn;
        let map = self.map;
        let mut stmt = conn.prepare_cached(self.sql)?;
        let rows = stmt.query_map(params![self.cursor, PAGE_SIZE as i64], |row| {
            Ok((row.get::<_, i64>(0)?, map(row)?))
        })?;

        let mut fetched = 0;
        for row in rows {
            match row {
                Ok((rowid, item)) => {
                    self.cursor = rowid;
                    self.buffer.push_back(item);
                    fetched += 1;
                }
                Err(err) => {
                    // Keep rows decoded so far; report the error after them.
                    self.pending = Some(err.into());
                    self.exhausted = true;
                    return Ok(());
                }
            }
        }

        if fetched < PAGE_SIZE {
            self.exhausted = true;
        }
        Ok(())
    }
}

impl<'c> Scan<'c, Value> {
    /// Scan keys in insertion order.
    pub fn keys(conn: &'c Connection) -> Self {
        Self::new(conn, KEYS_SQL, |row| row.get(1))
    }

    /// Scan values in insertion order.
    pub fn values(conn: &'c Connection) -> Self {
        Self::new(conn, VALUES_SQL, |row| row.get(1))
    }
}

impl<'c> Scan<'c, (Value, Value)> {
    /// Scan `(key, value)` pairs in insertion order.
    pub fn items(conn: &'c Connection) -> Self {
        Self::new(conn, ITEMS_SQL, |row| Ok((row.get(1)?, row.get(2)?)))
    }
}

impl<T> Iterator for Scan<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.exhausted {
            if let Err(err) = self.fetch_page() {
                self.exhausted = true;
                self.pending = Some(err);
            }
        }
        match self.buffer.pop_front() {
            Some(item) => Some(Ok(item)),
            None => self.pending.take().map(Err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema::initialize_schema;

    fn seeded(n: usize) -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        for i in 0..n {
            conn.execute(
                "INSERT INTO yapdict (key, value) VALUES (?1, ?2)",
                params![format!("k{i:04}"), format!("v{i}")],
            )
            .unwrap();
        }
        conn
    }

    #[test]
    fn test_scan_crosses_page_boundaries() {
        let n = PAGE_SIZE * 2 + 3;
        let conn = seeded(n);

        let keys: Vec<Value> = Scan::keys(&conn).collect::<Result<_>>().unwrap();
        assert_eq!(keys.len(), n);
        assert_eq!(keys[0], "k0000");
        assert_eq!(keys[n - 1], Value::from(format!("k{:04}", n - 1)));
    }

    #[test]
    fn test_scan_exact_page() {
        let conn = seeded(PAGE_SIZE);
        assert_eq!(Scan::values(&conn).count(), PAGE_SIZE);
    }

    #[test]
    fn test_scan_empty_table() {
        let conn = seeded(0);
        assert!(Scan::items(&conn).next().is_none());
    }

    #[test]
    fn test_scan_yields_good_rows_before_error() {
        // A table created elsewhere without column affinity keeps integers.
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE yapdict (key PRIMARY KEY NOT NULL, value NOT NULL);
             INSERT INTO yapdict (key, value) VALUES ('a', 'ok');
             INSERT INTO yapdict (key, value) VALUES ('n', 42);",
        )
        .unwrap();

        let results: Vec<_> = Scan::values(&conn).collect();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap(), &Value::from("ok"));
        assert!(matches!(results[1], Err(StoreError::TypeMismatch { .. })));

        // Items stop at the same row
        let items: Vec<_> = Scan::items(&conn).collect();
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(items[1].is_err());
    }
}
