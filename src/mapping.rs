//! The dict-like interface shared by stores and transactions.
//!
//! Every operation is expressed against a borrowed SQLite connection, so the
//! same code runs in autocommit mode on a [`Store`](crate::Store) and inside
//! a [`Transaction`](crate::Transaction).

use std::collections::{BTreeMap, BTreeSet};

use rusqlite::{params, Connection, OptionalExtension, Savepoint};

use crate::error::{Result, StoreError};
use crate::storage::scan::Scan;
use crate::value::{Value, ValueRef};

const GET_SQL: &str = "SELECT value FROM yapdict WHERE key = ?1";
const CONTAINS_SQL: &str = "SELECT 1 FROM yapdict WHERE key = ?1";
const COUNT_SQL: &str = "SELECT COUNT(*) FROM yapdict";
const UPSERT_SQL: &str = r#"
INSERT INTO yapdict (key, value) VALUES (?1, ?2)
ON CONFLICT (key) DO UPDATE SET value = excluded.value
"#;
const DELETE_SQL: &str = "DELETE FROM yapdict WHERE key = ?1";
const POP_SQL: &str = "DELETE FROM yapdict WHERE key = ?1 RETURNING key, value";
const CLEAR_SQL: &str = "DELETE FROM yapdict";

/// Persistent mapping from keys to values.
///
/// Lookups fail with [`StoreError::KeyNotFound`] when the key is absent;
/// the `_or` and `_opt` variants turn that case into a default or `None`.
/// Setting an existing key overwrites its value in place, keeping its
/// position in iteration order.
pub trait Mapping {
    /// The connection operations run against.
    fn connection(&self) -> &Connection;

    /// Open a savepoint for a multi-statement write.
    fn savepoint(&mut self) -> rusqlite::Result<Savepoint<'_>>;

    /// Get the value stored under `key`.
    fn get<'k>(&self, key: impl Into<ValueRef<'k>>) -> Result<Value> {
        let key: ValueRef<'k> = key.into();
        self.get_opt(key)?
            .ok_or_else(|| StoreError::KeyNotFound(key.to_owned_value()))
    }

    /// Get the value stored under `key`, or `None`.
    fn get_opt<'k>(&self, key: impl Into<ValueRef<'k>>) -> Result<Option<Value>> {
        let key: ValueRef<'k> = key.into();
        let mut stmt = self.connection().prepare_cached(GET_SQL)?;
        let value = stmt.query_row([key], |row| row.get(0)).optional()?;
        Ok(value)
    }

    /// Get the value stored under `key`, or `default`.
    fn get_or<'k>(
        &self,
        key: impl Into<ValueRef<'k>>,
        default: impl Into<Value>,
    ) -> Result<Value> {
        Ok(self.get_opt(key)?.unwrap_or_else(|| default.into()))
    }

    /// Insert or overwrite the value stored under `key`.
    fn set<'k, 'v>(
        &mut self,
        key: impl Into<ValueRef<'k>>,
        value: impl Into<ValueRef<'v>>,
    ) -> Result<()> {
        let key: ValueRef<'k> = key.into();
        let value: ValueRef<'v> = value.into();
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        let mut stmt = self.connection().prepare_cached(UPSERT_SQL)?;
        stmt.execute(params![key, value])?;
        tracing::trace!(key = %key, "Set");
        Ok(())
    }

    /// Remove `key`. Fails if it is absent.
    fn delete<'k>(&mut self, key: impl Into<ValueRef<'k>>) -> Result<()> {
        let key: ValueRef<'k> = key.into();
        let mut stmt = self.connection().prepare_cached(DELETE_SQL)?;
        if stmt.execute([key])? == 0 {
            return Err(StoreError::KeyNotFound(key.to_owned_value()));
        }
        tracing::trace!(key = %key, "Deleted");
        Ok(())
    }

    fn contains<'k>(&self, key: impl Into<ValueRef<'k>>) -> Result<bool> {
        let key: ValueRef<'k> = key.into();
        let mut stmt = self.connection().prepare_cached(CONTAINS_SQL)?;
        let found = stmt
            .query_row([key], |_| Ok(()))
            .optional()?
            .is_some();
        Ok(found)
    }

    /// Number of stored entries.
    fn len(&self) -> Result<usize> {
        let mut stmt = self.connection().prepare_cached(COUNT_SQL)?;
        let count: i64 = stmt.query_row([], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Keys in insertion order. Each call starts a new scan.
    fn keys(&self) -> Scan<'_, Value> {
        Scan::keys(self.connection())
    }

    /// Values in insertion order. Each call starts a new scan.
    fn values(&self) -> Scan<'_, Value> {
        Scan::values(self.connection())
    }

    /// `(key, value)` pairs in insertion order. Each call starts a new scan.
    fn items(&self) -> Scan<'_, (Value, Value)> {
        Scan::items(self.connection())
    }

    /// Upsert every entry, all or nothing.
    ///
    /// Returns the number of entries written.
    fn update<I, K, V>(&mut self, entries: I) -> Result<usize>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        let sp = self.savepoint()?;
        let mut written = 0;
        {
            let mut stmt = sp.prepare_cached(UPSERT_SQL)?;
            for (key, value) in entries {
                let key: Value = key.into();
                let value: Value = value.into();
                if key.is_empty() {
                    return Err(StoreError::EmptyKey);
                }
                stmt.execute(params![key, value])?;
                written += 1;
            }
        }
        sp.commit()?;
        tracing::debug!(entries = written, "Applied update");
        Ok(written)
    }

    /// Copy every entry of `other` into this mapping, all or nothing.
    fn update_from<M>(&mut self, other: &M) -> Result<usize>
    where
        M: Mapping + ?Sized,
    {
        let entries = other.items().collect::<Result<Vec<_>>>()?;
        self.update(entries)
    }

    /// Remove `key` and return its value. Fails if it is absent.
    fn pop<'k>(&mut self, key: impl Into<ValueRef<'k>>) -> Result<Value> {
        self.popitem(key).map(|(_, value)| value)
    }

    /// Remove `key` and return its value, or `default` if it is absent.
    fn pop_or<'k>(
        &mut self,
        key: impl Into<ValueRef<'k>>,
        default: impl Into<Value>,
    ) -> Result<Value> {
        match self.pop(key) {
            Err(StoreError::KeyNotFound(_)) => Ok(default.into()),
            other => other,
        }
    }

    /// Remove `key` and return the stored pair. Fails if it is absent.
    fn popitem<'k>(&mut self, key: impl Into<ValueRef<'k>>) -> Result<(Value, Value)> {
        let key: ValueRef<'k> = key.into();
        let mut stmt = self.connection().prepare_cached(POP_SQL)?;
        let removed = stmt
            .query_row([key], |row| {
                Ok((row.get::<_, Value>(0)?, row.get::<_, Value>(1)?))
            })
            .optional()?;
        removed.ok_or_else(|| StoreError::KeyNotFound(key.to_owned_value()))
    }

    /// Remove every entry. Returns the number removed.
    fn clear(&mut self) -> Result<usize> {
        let removed = self.connection().execute(CLEAR_SQL, [])?;
        tracing::debug!(removed, "Cleared");
        Ok(removed)
    }

    /// Whether both mappings hold the same entries, ignoring order.
    ///
    /// Each side is read inside its own read transaction when it is not
    /// already in one, so neither side changes mid-comparison. Nothing is
    /// written and the read transactions are rolled back.
    fn equals<M>(&self, other: &M) -> Result<bool>
    where
        M: Mapping + ?Sized,
    {
        let _mine = read_snapshot(self.connection())?;
        let _theirs = read_snapshot(other.connection())?;

        if self.len()? != other.len()? {
            return Ok(false);
        }
        for item in self.items() {
            let (key, value) = item?;
            if other.get_opt(&key)?.as_ref() != Some(&value) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Whether this mapping holds exactly the given entries.
    ///
    /// Repeated keys in `entries` count once.
    fn equals_map<'a, I, K, V>(&self, entries: I) -> Result<bool>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<ValueRef<'a>>,
        V: Into<ValueRef<'a>>,
    {
        let _snapshot = read_snapshot(self.connection())?;

        let mut seen = BTreeSet::new();
        for (key, value) in entries {
            let key: ValueRef<'a> = key.into();
            let value: ValueRef<'a> = value.into();
            match self.get_opt(key)? {
                Some(stored) if stored == value => {
                    seen.insert(key.to_owned_value());
                }
                _ => return Ok(false),
            }
        }
        Ok(seen.len() == self.len()?)
    }

    /// Copy every entry into an ordered in-memory map.
    fn to_map(&self) -> Result<BTreeMap<Value, Value>> {
        self.items().collect()
    }
}

/// Begin a read transaction unless the connection is already inside one.
fn read_snapshot(conn: &Connection) -> Result<Option<rusqlite::Transaction<'_>>> {
    if conn.is_autocommit() {
        Ok(Some(conn.unchecked_transaction()?))
    } else {
        Ok(None)
    }
}
