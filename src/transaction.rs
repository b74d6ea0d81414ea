//! Scoped transactions.
//!
//! A [`Transaction`] groups operations so they commit together. Dropping it
//! without calling [`Transaction::commit`] rolls everything back, so an
//! early return through `?` never leaves half a batch behind. Nested scopes
//! are SQLite savepoints.

use rusqlite::{Connection, Savepoint, TransactionBehavior};

use crate::error::{Result, StoreError};
use crate::mapping::Mapping;

#[derive(Debug)]
enum Scope<'s> {
    Top(rusqlite::Transaction<'s>),
    Nested(Savepoint<'s>),
}

/// An open transaction or savepoint on a Store's connection.
#[derive(Debug)]
pub struct Transaction<'s> {
    scope: Scope<'s>,
    depth: usize,
}

impl<'s> Transaction<'s> {
    /// Begin a top-level transaction.
    ///
    /// `IMMEDIATE` takes the write lock up front, so the busy timeout
    /// applies when the transaction starts rather than at its first write.
    pub(crate) fn begin(conn: &'s mut Connection) -> Result<Self> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tracing::trace!("Began transaction");
        Ok(Self {
            scope: Scope::Top(tx),
            depth: 0,
        })
    }

    /// Nesting level: 0 for the top-level transaction.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Open a nested scope backed by a savepoint.
    pub fn nested(&mut self) -> Result<Transaction<'_>> {
        let depth = self.depth + 1;
        let sp = self.savepoint()?;
        Ok(Transaction {
            scope: Scope::Nested(sp),
            depth,
        })
    }

    /// Run `f` in a nested scope: released on `Ok`, rolled back on `Err`.
    ///
    /// Rolling back a nested scope leaves the enclosing transaction open.
    pub fn atomic<T, E, F>(&mut self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Transaction<'_>) -> std::result::Result<T, E>,
        E: From<StoreError>,
    {
        let nested = self.nested().map_err(E::from)?;
        run_scoped(nested, f)
    }

    /// Commit the transaction, or release the savepoint.
    pub fn commit(self) -> Result<()> {
        match self.scope {
            Scope::Top(tx) => tx.commit()?,
            Scope::Nested(sp) => sp.commit()?,
        }
        tracing::trace!(depth = self.depth, "Committed");
        Ok(())
    }

    /// Discard every change made in this scope.
    pub fn rollback(self) -> Result<()> {
        match self.scope {
            Scope::Top(tx) => tx.rollback()?,
            // finish() applies the default drop behavior: rollback, then release
            Scope::Nested(sp) => sp.finish()?,
        }
        tracing::trace!(depth = self.depth, "Rolled back");
        Ok(())
    }
}

impl Mapping for Transaction<'_> {
    fn connection(&self) -> &Connection {
        match &self.scope {
            Scope::Top(tx) => &**tx,
            Scope::Nested(sp) => &**sp,
        }
    }

    fn savepoint(&mut self) -> rusqlite::Result<Savepoint<'_>> {
        match &mut self.scope {
            Scope::Top(tx) => tx.savepoint(),
            Scope::Nested(sp) => sp.savepoint(),
        }
    }
}

/// Run `f` against `tx`, committing on `Ok` and rolling back on `Err`.
pub(crate) fn run_scoped<T, E, F>(mut tx: Transaction<'_>, f: F) -> std::result::Result<T, E>
where
    F: FnOnce(&mut Transaction<'_>) -> std::result::Result<T, E>,
    E: From<StoreError>,
{
    match f(&mut tx) {
        Ok(out) => {
            tx.commit().map_err(E::from)?;
            Ok(out)
        }
        Err(err) => {
            let depth = tx.depth;
            if let Err(rollback_err) = tx.rollback() {
                tracing::warn!(depth, error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Mapping, Store, StoreError};

    #[test]
    fn test_commit_persists() {
        let mut store = Store::open_in_memory().unwrap();
        let mut tx = store.begin().unwrap();
        tx.set("a", "1").unwrap();
        tx.set("b", "2").unwrap();
        assert_eq!(tx.len().unwrap(), 2);
        tx.commit().unwrap();

        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn test_drop_rolls_back() {
        let mut store = Store::open_in_memory().unwrap();
        store.set("keep", "1").unwrap();
        {
            let mut tx = store.begin().unwrap();
            tx.set("a", "1").unwrap();
            tx.delete("keep").unwrap();
        }
        assert!(!store.contains("a").unwrap());
        assert!(store.contains("keep").unwrap());
    }

    #[test]
    fn test_nested_rollback_keeps_outer() {
        let mut store = Store::open_in_memory().unwrap();
        let mut tx = store.begin().unwrap();
        tx.set("outer", "1").unwrap();

        let result: Result<(), StoreError> = tx.atomic(|inner| {
            assert_eq!(inner.depth(), 1);
            inner.set("inner", "1")?;
            inner.get("missing").map(|_| ())
        });
        assert!(result.unwrap_err().is_not_found());

        assert!(!tx.contains("inner").unwrap());
        tx.commit().unwrap();

        assert!(store.contains("outer").unwrap());
        assert!(!store.contains("inner").unwrap());
    }

    #[test]
    fn test_nested_commit_then_outer_rollback() {
        let mut store = Store::open_in_memory().unwrap();
        let mut tx = store.begin().unwrap();
        {
            let mut inner = tx.nested().unwrap();
            inner.set("x", "1").unwrap();
            inner.commit().unwrap();
        }
        assert!(tx.contains("x").unwrap());
        tx.rollback().unwrap();

        assert!(store.is_empty().unwrap());
    }
}
