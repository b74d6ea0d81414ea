//! Mutating commands: set, del, pop, clear, import.

use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::Value as Json;
use yapdict::{Mapping, Store, Value};

use super::read::print_value;
use crate::OutputFormat;

pub fn set(store: &mut Store, key: &str, value: &str) -> Result<()> {
    store
        .set(key, value)
        .with_context(|| format!("failed to set {key:?}"))?;
    Ok(())
}

pub fn delete(store: &mut Store, key: &str) -> Result<()> {
    store
        .delete(key)
        .with_context(|| format!("failed to delete {key:?}"))?;
    Ok(())
}

pub fn pop(
    store: &mut Store,
    key: &str,
    default: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let value = match default {
        Some(default) => store.pop_or(key, default)?,
        None => store
            .pop(key)
            .with_context(|| format!("failed to pop {key:?}"))?,
    };
    print_value(&value, format)
}

pub fn clear(store: &mut Store, format: OutputFormat) -> Result<()> {
    let removed = store.clear()?;
    match format {
        OutputFormat::Text => println!("Removed {removed} entries."),
        OutputFormat::Json => println!("{}", serde_json::json!({ "removed": removed })),
    }
    Ok(())
}

pub fn import(store: &mut Store, file: &Path, format: OutputFormat) -> Result<()> {
    let raw = if file.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?
    };

    let entries = parse_entries(&raw)?;
    let written = store.update(entries).context("import rolled back")?;

    match format {
        OutputFormat::Text => println!("Imported {written} entries."),
        OutputFormat::Json => println!("{}", serde_json::json!({ "imported": written })),
    }
    Ok(())
}

/// Parse a JSON object into entries.
///
/// String values are stored as text, arrays of bytes as bytes; anything
/// else is stored as its JSON text.
fn parse_entries(raw: &str) -> Result<Vec<(String, Value)>> {
    let Json::Object(map) = serde_json::from_str::<Json>(raw).context("invalid JSON")? else {
        bail!("expected a JSON object of key/value pairs");
    };

    map.into_iter()
        .map(|(key, value)| {
            let value = match value {
                Json::String(s) => Value::Text(s),
                Json::Array(_) => serde_json::from_value::<Vec<u8>>(value.clone())
                    .map(Value::Bytes)
                    .unwrap_or_else(|_| Value::Text(value.to_string())),
                other => Value::Text(other.to_string()),
            };
            Ok((key, value))
        })
        .collect()
}
