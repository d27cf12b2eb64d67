//! Category-specific extraction of structured fields from raw command output.
//! A parser that finds nothing returns `None`; the caller degrades that to a
//! `parse_failed` value carrying the raw text.

mod cpu;
mod disk;
mod memory;
mod network;
mod processes;
mod system;

use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::types::Category;

pub const PARSE_FAILED: &str = "parse_failed";

/// Structured view of `stdout`, or the `parse_failed` marker with the raw text.
pub fn parse_output(category: Category, command: &str, stdout: &str) -> Value {
    let parsed = match category {
        Category::SystemInfo => system::parse(command, stdout),
        Category::Memory => memory::parse(command, stdout),
        Category::Cpu => cpu::parse(command, stdout),
        Category::Disk => disk::parse(command, stdout),
        Category::Network => network::parse(command, stdout),
        Category::Processes => processes::parse(command, stdout),
    };
    match parsed {
        Some(Value::Object(map)) if !map.is_empty() => Value::Object(map),
        _ => parse_failed(stdout),
    }
}

pub fn parse_failed(raw: &str) -> Value {
    json!({ "parsed": PARSE_FAILED, "rawOutput": raw })
}

pub fn is_parse_failed(value: &Value) -> bool {
    value.get("parsed").and_then(Value::as_str) == Some(PARSE_FAILED)
}

/// `key: value` and `key=value` lines. Keys keep their original spelling.
pub(crate) fn key_values(text: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for line in text.lines() {
        let line = line.trim();
        let split = match (line.find(':'), line.find('=')) {
            (Some(c), Some(e)) => Some(c.min(e)),
            (Some(c), None) => Some(c),
            (None, Some(e)) => Some(e),
            (None, None) => None,
        };
        let Some(idx) = split else {
            continue;
        };
        let key = line[..idx].trim();
        let value = line[idx + 1..].trim();
        if key.is_empty() || value.is_empty() || key.contains("  ") {
            continue;
        }
        out.insert(key.to_string(), value.to_string());
    }
    out
}

/// Leading numeric portion of a token, ignoring thousands separators.
pub(crate) fn leading_number(token: &str) -> Option<f64> {
    let cleaned: String = token
        .trim()
        .chars()
        .filter(|c| *c != ',')
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse().ok()
}

pub(crate) fn leading_command(command: &str) -> String {
    command
        .split_whitespace()
        .next()
        .unwrap_or("")
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unparseable_output_degrades_to_raw() {
        let v = parse_output(Category::Disk, "df -h", "permission denied");
        assert!(is_parse_failed(&v));
        assert_eq!(v["rawOutput"], "permission denied");
    }

    #[test]
    fn key_values_handles_both_separators() {
        let kv = key_values("Model name:  Intel\nFreeSpace=100\n\nnoise line\n");
        assert_eq!(kv.get("Model name").map(String::as_str), Some("Intel"));
        assert_eq!(kv.get("FreeSpace").map(String::as_str), Some("100"));
        assert_eq!(kv.len(), 2);
    }

    #[test]
    fn leading_number_strips_suffixes() {
        assert_eq!(leading_number("12,345 K"), Some(12345.0));
        assert_eq!(leading_number("87%"), Some(87.0));
        assert_eq!(leading_number("abc"), None);
    }
}
