//! SQLite storage layer for Yapdict.
//!
//! Provides:
//! - Connection pragmas (WAL journaling, busy timeout)
//! - Idempotent schema initialization
//! - Lazy keyset scans in insertion order

pub mod scan;
pub mod schema;
