//! Yapdict: a persistent dict-like key-value store backed by SQLite.
//!
//! A [`Store`] owns one SQLite connection and exposes the [`Mapping`]
//! interface over a single `yapdict` table. Writes are serialized by
//! SQLite's file lock; a configurable busy timeout bounds how long a writer
//! waits before failing with [`StoreError::Busy`].
//!
//! # Modules
//!
//! - [`config`]: Store location and busy timeout
//! - [`error`]: Error taxonomy
//! - [`mapping`]: The dict-like operations shared by stores and transactions
//! - [`observability`]: Tracing setup
//! - [`storage`]: Pragmas, schema and row scans
//! - [`store`]: Connection ownership and lifecycle
//! - [`transaction`]: Scoped commit/rollback
//! - [`value`]: Text and byte values
//!
//! # Example
//!
//! ```
//! use yapdict::{Mapping, Store};
//!
//! let mut store = Store::open_in_memory()?;
//! store.set("a", "1")?;
//! assert_eq!(store.get("a")?, "1");
//! assert_eq!(store.len()?, 1);
//! # Ok::<(), yapdict::StoreError>(())
//! ```

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions,    // store::StoreError is fine
    clippy::must_use_candidate,         // Not all functions need #[must_use]
    clippy::missing_errors_doc,         // Error docs can be verbose
    clippy::needless_raw_string_hashes  // r#""# is fine for SQL
)]

pub mod config;
pub mod error;
pub mod mapping;
pub mod observability;
pub mod storage;
pub mod store;
pub mod transaction;
pub mod value;

pub use config::{StoreConfig, IN_MEMORY};
pub use error::{Result, StoreError};
pub use mapping::Mapping;
pub use storage::scan::Scan;
pub use store::Store;
pub use transaction::Transaction;
pub use value::{Value, ValueRef};
