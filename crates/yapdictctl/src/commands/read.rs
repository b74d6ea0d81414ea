//! Read-only commands: get, keys, items, len.

use anyhow::{Context, Result};
use serde::Serialize;
use yapdict::{Mapping, Store, Value};

use crate::OutputFormat;

#[derive(Serialize)]
struct Entry {
    key: Value,
    value: Value,
}

#[derive(Serialize)]
struct EntriesOutput {
    entries: Vec<Entry>,
    total: usize,
}

pub fn get(store: &Store, key: &str, default: Option<String>, format: OutputFormat) -> Result<()> {
    let value = match default {
        Some(default) => store.get_or(key, default)?,
        None => store
            .get(key)
            .with_context(|| format!("no entry for {key:?} in {}", store.path().display()))?,
    };
    print_value(&value, format)
}

pub fn keys(store: &Store, format: OutputFormat) -> Result<()> {
    let keys = store.keys().collect::<yapdict::Result<Vec<_>>>()?;

    match format {
        OutputFormat::Text => {
            for key in &keys {
                println!("{key}");
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&keys)?),
    }
    Ok(())
}

pub fn items(store: &Store, format: OutputFormat) -> Result<()> {
    let entries = store
        .items()
        .map(|item| item.map(|(key, value)| Entry { key, value }))
        .collect::<yapdict::Result<Vec<_>>>()?;

    match format {
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("No entries found.");
            } else {
                println!("{:<40} {}", "KEY", "VALUE");
                println!("{}", "-".repeat(62));
                for entry in &entries {
                    println!("{:<40} {}", entry.key.to_string(), entry.value);
                }
                println!();
                println!("Total: {} entr{}", entries.len(), plural(entries.len()));
            }
        }
        OutputFormat::Json => {
            let output = EntriesOutput {
                total: entries.len(),
                entries,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

pub fn len(store: &Store, format: OutputFormat) -> Result<()> {
    let count = store.len()?;
    match format {
        OutputFormat::Text => println!("{count}"),
        OutputFormat::Json => println!("{}", serde_json::json!({ "len": count })),
    }
    Ok(())
}

pub(crate) fn print_value(value: &Value, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => println!("{value}"),
        OutputFormat::Json => println!("{}", serde_json::to_string(value)?),
    }
    Ok(())
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        "y"
    } else {
        "ies"
    }
}
