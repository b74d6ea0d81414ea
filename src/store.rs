//! Store lifecycle: open, configure, transact, close.
//!
//! A [`Store`] exclusively owns one SQLite connection for its whole
//! lifetime. Opening creates parent directories, applies the pragmas and
//! creates the schema if missing. The connection is `Send` but not `Sync`;
//! use one Store per thread and let SQLite's file lock serialize writers.

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, Savepoint};

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::mapping::Mapping;
use crate::storage::schema::{apply_pragmas, initialize_schema};
use crate::transaction::{run_scoped, Transaction};

/// A persistent key-value mapping backed by one SQLite table.
pub struct Store {
    conn: Connection,
    config: StoreConfig,
}

impl Store {
    /// Open (or create) a store at `path` with the default busy timeout.
    ///
    /// Pass [`IN_MEMORY`](crate::IN_MEMORY) for a private in-memory store.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_config(StoreConfig::new(path))
    }

    /// Open (or create) a store at `path` with a custom busy timeout.
    pub fn open_with_timeout<P: AsRef<Path>>(path: P, timeout: Duration) -> Result<Self> {
        Self::with_config(StoreConfig::new(path).with_timeout(timeout))
    }

    /// Open a private in-memory store. Two in-memory stores share nothing.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_config(StoreConfig::in_memory())
    }

    /// Open a store from a full configuration.
    pub fn with_config(config: StoreConfig) -> Result<Self> {
        let conn = if config.is_in_memory() {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = config.path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            Connection::open(&config.path)?
        };

        apply_pragmas(&conn, config.timeout)?;
        initialize_schema(&conn)?;

        tracing::debug!(
            path = %config.path.display(),
            timeout_ms = config.timeout.as_millis() as u64,
            "Opened store"
        );
        Ok(Self { conn, config })
    }

    /// Database path, or the in-memory sentinel.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Busy timeout applied when the connection was opened.
    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Begin a scoped transaction.
    ///
    /// Operations on the returned handle commit together on
    /// [`Transaction::commit`]; dropping it rolls them back. Fails with
    /// [`StoreError::Busy`] if another writer holds the lock past the
    /// busy timeout.
    pub fn begin(&mut self) -> Result<Transaction<'_>> {
        Transaction::begin(&mut self.conn)
    }

    /// Run `f` in a transaction: committed on `Ok`, rolled back on `Err`.
    ///
    /// ```
    /// use yapdict::{Mapping, Store, StoreError};
    ///
    /// let mut store = Store::open_in_memory()?;
    /// let result: Result<(), StoreError> = store.atomic(|tx| {
    ///     tx.set("a", "1")?;
    ///     tx.delete("missing")
    /// });
    /// assert!(result.is_err());
    /// assert!(!store.contains("a")?);
    /// # Ok::<(), StoreError>(())
    /// ```
    pub fn atomic<T, E, F>(&mut self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Transaction<'_>) -> std::result::Result<T, E>,
        E: From<StoreError>,
    {
        let tx = self.begin().map_err(E::from)?;
        run_scoped(tx, f)
    }

    /// Close the connection, reporting any error SQLite raises on close.
    ///
    /// Dropping the store also closes it, silently.
    pub fn close(self) -> Result<()> {
        let path = self.config.path;
        self.conn.close().map_err(|(_, err)| StoreError::from(err))?;
        tracing::debug!(path = %path.display(), "Closed store");
        Ok(())
    }
}

impl Mapping for Store {
    fn connection(&self) -> &Connection {
        &self.conn
    }

    fn savepoint(&mut self) -> rusqlite::Result<Savepoint<'_>> {
        self.conn.savepoint()
    }
}

impl PartialEq for Store {
    /// Same length and every key maps to an equal value. Read errors
    /// compare unequal.
    fn eq(&self, other: &Self) -> bool {
        self.equals(other).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Comparison failed");
            false
        })
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.config.path)
            .field("timeout", &self.config.timeout)
            .finish_non_exhaustive()
    }
}
