//! CLI subcommand implementations.

pub mod fetch;
pub mod get;
pub mod list;

use serde_json::Value;

/// Parses a `key=value` argument. The value is read as JSON when it parses,
/// otherwise it is kept as a string.
pub fn parse_key_value(arg: &str) -> Result<(String, Value), String> {
    let (key, raw) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", arg))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", arg));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}
