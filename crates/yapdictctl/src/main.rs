//! yapdictctl: Command-line interface for yapdict stores.
//!
//! Reads and writes entries of a store file from the terminal.
//!
//! ```bash
//! yapdictctl --db ./data/kv.db set greeting hello
//! yapdictctl --db ./data/kv.db -o json items
//! ```

mod commands;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use yapdict::{Store, StoreConfig};

/// Command-line interface for yapdict key-value stores.
#[derive(Parser)]
#[command(name = "yapdictctl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Store file path (":memory:" for a throwaway store)
    #[arg(short, long, env = "YAPDICT_DB", default_value = "./yapdict.db")]
    db: PathBuf,

    /// Seconds a write waits for the lock before failing
    #[arg(short, long, env = "YAPDICT_TIMEOUT", default_value = "1.0", value_parser = parse_timeout)]
    timeout: Duration,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    output: OutputFormat,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

fn parse_timeout(s: &str) -> Result<Duration, String> {
    let secs: f64 = s.parse().map_err(|e| format!("invalid timeout {s:?}: {e}"))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("invalid timeout {s:?}: {e}"))
}

#[derive(Subcommand)]
enum Commands {
    /// Print the value stored under a key
    Get {
        key: String,
        /// Print this instead of failing when the key is absent
        #[arg(long)]
        default: Option<String>,
    },
    /// Store a value under a key, overwriting any previous value
    Set { key: String, value: String },
    /// Delete a key
    Del { key: String },
    /// Delete a key and print its value
    Pop {
        key: String,
        /// Print this instead of failing when the key is absent
        #[arg(long)]
        default: Option<String>,
    },
    /// List keys in insertion order
    Keys,
    /// List key/value pairs in insertion order
    Items,
    /// Print the number of entries
    Len,
    /// Delete every entry
    Clear,
    /// Apply every entry of a JSON object file in one transaction
    Import {
        /// Path to a JSON object (use "-" for stdin)
        file: PathBuf,
    },
}

impl Commands {
    /// Commands that never write, and so must not create a store.
    fn is_read_only(&self) -> bool {
        matches!(
            self,
            Self::Get { .. } | Self::Keys | Self::Items | Self::Len
        )
    }
}

/// Refuse to read from a store file that does not exist yet.
///
/// Opening creates the file, so a mistyped `--db` would otherwise read an
/// empty store and leave a stray database behind.
fn check_store_exists(config: &StoreConfig, command: &Commands) -> Result<()> {
    if command.is_read_only() && !config.is_in_memory() && !config.path.exists() {
        bail!(
            "no store at {}; write to it first (e.g. `set`) to create one",
            config.path.display()
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    yapdict::observability::tracing::init_tracing(&cli.log_level, cli.log_json);

    let config = StoreConfig::new(&cli.db).with_timeout(cli.timeout);
    check_store_exists(&config, &cli.command)?;
    let mut store = Store::with_config(config)?;
    tracing::debug!(db = %cli.db.display(), "Running command");

    match cli.command {
        Commands::Get { key, default } => {
            commands::read::get(&store, &key, default, cli.output)?;
        }
        Commands::Set { key, value } => commands::write::set(&mut store, &key, &value)?,
        Commands::Del { key } => commands::write::delete(&mut store, &key)?,
        Commands::Pop { key, default } => {
            commands::write::pop(&mut store, &key, default, cli.output)?;
        }
        Commands::Keys => commands::read::keys(&store, cli.output)?,
        Commands::Items => commands::read::items(&store, cli.output)?,
        Commands::Len => commands::read::len(&store, cli.output)?,
        Commands::Clear => commands::write::clear(&mut store, cli.output)?,
        Commands::Import { file } => commands::write::import(&mut store, &file, cli.output)?,
    }

    store.close()?;
    Ok(())
}
