//! Configuration for opening a Store.
//!
//! Supports:
//! - On-disk paths (parent directories are created on open)
//! - The `:memory:` sentinel for an ephemeral, unshared database
//! - A busy timeout applied once at connection setup

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Path sentinel selecting a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// Default time a writer waits for the SQLite lock.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Where a Store lives and how long writers wait for the lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Database file path, or [`IN_MEMORY`]
    pub path: PathBuf,
    /// Busy timeout for lock acquisition
    pub timeout: Duration,
}

impl StoreConfig {
    /// Create a configuration for the given path with the default timeout.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create a configuration for a private in-memory database.
    pub fn in_memory() -> Self {
        Self::new(IN_MEMORY)
    }

    /// Override the busy timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether the path is the in-memory sentinel.
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == IN_MEMORY
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert!(config.is_in_memory());
        assert_eq!(config.timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_disk_config_with_timeout() {
        let config = StoreConfig::new("data/kv.db").with_timeout(Duration::from_millis(250));
        assert!(!config.is_in_memory());
        assert_eq!(config.path, PathBuf::from("data/kv.db"));
        assert_eq!(config.timeout, Duration::from_millis(250));
    }
}
