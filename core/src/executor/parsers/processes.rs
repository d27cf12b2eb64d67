use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Map, Value};

use super::leading_number;

/// Rows kept per listing.
const MAX_ROWS: usize = 20;

lazy_static! {
    static ref TASKLIST_ROW: Regex =
        Regex::new(r"^(.+?)\s+(\d+)\s+(\S+)\s+(\d+)\s+([\d,.]+\s*K)\s*$").unwrap();
}

const NUMERIC_COLUMNS: &[&str] = &["pid", "%cpu", "%mem", "cpu", "cpu(s)", "id", "vsz", "rss"];

pub(super) fn parse(_command: &str, stdout: &str) -> Option<Value> {
    let text = stdout.trim();
    if text.is_empty() {
        return None;
    }
    if text.contains("Image Name") {
        return parse_tasklist(text);
    }
    parse_table(text).or_else(|| parse_tasklist(text))
}

/// Whitespace-aligned tables with a PID column (`ps aux`, `top -b`,
/// `Get-Process`). The final column absorbs the remaining fields.
fn parse_table(text: &str) -> Option<Value> {
    let lines: Vec<&str> = text.lines().collect();
    let header_idx = lines.iter().position(|l| {
        l.split_whitespace()
            .any(|t| t.eq_ignore_ascii_case("pid") || t == "Id")
    })?;
    let header: Vec<String> = lines[header_idx]
        .split_whitespace()
        .map(|h| h.to_ascii_lowercase())
        .collect();
    let width = header.len();

    let mut rows = Vec::new();
    let mut total = 0usize;
    for line in &lines[header_idx + 1..] {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.chars().all(|c| c == '-' || c == '=' || c == ' ') {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() < width {
            continue;
        }
        total += 1;
        if rows.len() >= MAX_ROWS {
            continue;
        }
        let mut row = Map::new();
        for (i, name) in header.iter().enumerate() {
            let value = if i == width - 1 {
                fields[i..].join(" ")
            } else {
                fields[i].to_string()
            };
            let key = match name.as_str() {
                "id" => "pid".to_string(),
                "processname" | "comm" => "command".to_string(),
                other => other.trim_start_matches('%').to_string(),
            };
            let json_value = if NUMERIC_COLUMNS.contains(&name.as_str()) {
                leading_number(&value).map(|n| json!(n)).unwrap_or(json!(value))
            } else {
                json!(value)
            };
            row.insert(key, json_value);
        }
        rows.push(Value::Object(row));
    }
    if rows.is_empty() {
        return None;
    }
    Some(json!({ "count": total, "processes": rows }))
}

fn parse_tasklist(text: &str) -> Option<Value> {
    let mut rows = Vec::new();
    let mut total = 0usize;
    for line in text.lines() {
        let Some(c) = TASKLIST_ROW.captures(line.trim_end()) else {
            continue;
        };
        total += 1;
        if rows.len() < MAX_ROWS {
            rows.push(json!({
                "command": c[1].trim(),
                "pid": c[2].parse::<u64>().ok(),
                "session": &c[3],
                "mem_kb": leading_number(&c[5]),
            }));
        }
    }
    (!rows.is_empty()).then(|| json!({ "count": total, "processes": rows }))
}
