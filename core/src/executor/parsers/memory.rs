use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Map, Value};

use super::{key_values, leading_number};

lazy_static! {
    static ref VMSTAT_S: Regex = Regex::new(r"^\s*(\d+)\s+K\s+(.+)$").unwrap();
    static ref VM_STAT_PAGE: Regex = Regex::new(r"page size of (\d+) bytes").unwrap();
    static ref VM_STAT_ROW: Regex = Regex::new(r#"^"?Pages ([\w -]+)"?:\s+(\d+)\.?$"#).unwrap();
}

pub(super) fn parse(_command: &str, stdout: &str) -> Option<Value> {
    let text = stdout.trim();
    if text.is_empty() {
        return None;
    }
    parse_free(text)
        .or_else(|| parse_meminfo(text))
        .or_else(|| parse_vmstat_s(text))
        .or_else(|| parse_vm_stat(text))
        .or_else(|| parse_wmic(text))
        .or_else(|| parse_memsize(text))
}

fn summary(unit: &str, total: f64, used: Option<f64>, free: Option<f64>, available: Option<f64>) -> Map<String, Value> {
    let mut out = Map::new();
    out.insert("unit".into(), json!(unit));
    out.insert("total".into(), json!(total));
    let used = used.or_else(|| available.or(free).map(|a| (total - a).max(0.0)));
    if let Some(u) = used {
        out.insert("used".into(), json!(u));
        if total > 0.0 {
            out.insert("used_ratio".into(), json!(u / total));
        }
    }
    if let Some(f) = free {
        out.insert("free".into(), json!(f));
    }
    if let Some(a) = available {
        out.insert("available".into(), json!(a));
    }
    out
}

/// `free -m` / `free -h` style table.
fn parse_free(text: &str) -> Option<Value> {
    let header: Vec<&str> = text
        .lines()
        .find(|l| l.contains("total") && l.contains("used"))?
        .split_whitespace()
        .collect();
    let row = text.lines().find(|l| l.trim_start().starts_with("Mem:"))?;
    let values: Vec<f64> = row
        .split_whitespace()
        .skip(1)
        .filter_map(leading_number)
        .collect();
    let col = |name: &str| header.iter().position(|h| *h == name).and_then(|i| values.get(i).copied());

    let total = col("total")?;
    let mut out = summary("MiB", total, col("used"), col("free"), col("available"));

    if let Some(swap) = text.lines().find(|l| l.trim_start().starts_with("Swap:")) {
        let s: Vec<f64> = swap.split_whitespace().skip(1).filter_map(leading_number).collect();
        if s.len() >= 2 {
            out.insert("swap_total".into(), json!(s[0]));
            out.insert("swap_used".into(), json!(s[1]));
        }
    }
    Some(Value::Object(out))
}

/// `/proc/meminfo`.
fn parse_meminfo(text: &str) -> Option<Value> {
    let kv = key_values(text);
    let get = |k: &str| kv.get(k).and_then(|v| leading_number(v));
    let total = get("MemTotal")?;
    let mut out = summary("kB", total, None, get("MemFree"), get("MemAvailable"));
    if let (Some(st), Some(sf)) = (get("SwapTotal"), get("SwapFree")) {
        out.insert("swap_total".into(), json!(st));
        out.insert("swap_used".into(), json!((st - sf).max(0.0)));
    }
    Some(Value::Object(out))
}

/// `vmstat -s`: "N K total memory" lines.
fn parse_vmstat_s(text: &str) -> Option<Value> {
    let mut total = None;
    let mut used = None;
    let mut free = None;
    for line in text.lines() {
        let Some(c) = VMSTAT_S.captures(line) else {
            continue;
        };
        let n: f64 = c[1].parse().ok()?;
        match c[2].trim() {
            "total memory" => total = Some(n),
            "used memory" => used = Some(n),
            "free memory" => free = Some(n),
            _ => {}
        }
    }
    Some(Value::Object(summary("kB", total?, used, free, None)))
}

/// macOS `vm_stat` page counters.
fn parse_vm_stat(text: &str) -> Option<Value> {
    let page_size: f64 = VM_STAT_PAGE.captures(text)?[1].parse().ok()?;
    let mut pages = Map::new();
    for line in text.lines() {
        if let Some(c) = VM_STAT_ROW.captures(line.trim()) {
            let key = c[1].trim().replace(' ', "_");
            if let Ok(n) = c[2].parse::<f64>() {
                pages.insert(key, json!(n));
            }
        }
    }
    let page = |k: &str| pages.get(k).and_then(Value::as_f64).unwrap_or(0.0);
    let free = page("free") + page("speculative");
    let used = page("active") + page("wired_down") + page("occupied_by_compressor");
    if pages.is_empty() {
        return None;
    }
    let total = free + used + page("inactive");
    let mut out = summary("bytes", total * page_size, Some(used * page_size), Some(free * page_size), None);
    out.insert("pages".into(), Value::Object(pages));
    out.insert("page_size".into(), json!(page_size));
    Some(Value::Object(out))
}

/// `wmic OS get FreePhysicalMemory,TotalVisibleMemorySize /Value`.
fn parse_wmic(text: &str) -> Option<Value> {
    let kv = key_values(text);
    let total = kv.get("TotalVisibleMemorySize").and_then(|v| leading_number(v))?;
    let free = kv.get("FreePhysicalMemory").and_then(|v| leading_number(v));
    Some(Value::Object(summary("kB", total, None, free, None)))
}

/// `sysctl hw.memsize`.
fn parse_memsize(text: &str) -> Option<Value> {
    let kv = key_values(text);
    let total = kv.get("hw.memsize").and_then(|v| leading_number(v))?;
    Some(json!({ "unit": "bytes", "total": total }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_m_table() {
        let out = "               total        used        free      shared  buff/cache   available\n\
                   Mem:           15934        9876        1234         210        4823        5600\n\
                   Swap:           2047         100        1947\n";
        let v = parse("free -m", out).unwrap();
        assert_eq!(v["unit"], "MiB");
        assert_eq!(v["total"], 15934.0);
        assert_eq!(v["used"], 9876.0);
        assert_eq!(v["available"], 5600.0);
        assert_eq!(v["swap_used"], 100.0);
    }

    #[test]
    fn proc_meminfo() {
        let out = "MemTotal:       16000000 kB\nMemFree:         1000000 kB\nMemAvailable:    4000000 kB\n";
        let v = parse("cat /proc/meminfo", out).unwrap();
        assert_eq!(v["total"], 16000000.0);
        assert_eq!(v["used"], 12000000.0);
        assert_eq!(v["used_ratio"], 0.75);
    }

    #[test]
    fn vmstat_s_lines() {
        let out = "     16318068 K total memory\n      9000000 K used memory\n      1000000 K free memory\n";
        let v = parse("vmstat -s", out).unwrap();
        assert_eq!(v["used"], 9000000.0);
    }

    #[test]
    fn macos_vm_stat() {
        let out = "Mach Virtual Memory Statistics: (page size of 4096 bytes)\n\
                   Pages free:                               100.\n\
                   Pages active:                             300.\n\
                   Pages inactive:                           100.\n\
                   Pages speculative:                          0.\n\
                   Pages wired down:                         100.\n";
        let v = parse("vm_stat", out).unwrap();
        assert_eq!(v["total"], 600.0 * 4096.0);
        assert_eq!(v["used"], 400.0 * 4096.0);
    }

    #[test]
    fn wmic_value_format() {
        let out = "\r\n\r\nFreePhysicalMemory=2000000\r\nTotalVisibleMemorySize=8000000\r\n\r\n";
        let v = parse("wmic OS get FreePhysicalMemory,TotalVisibleMemorySize /Value", out).unwrap();
        assert_eq!(v["total"], 8000000.0);
        assert_eq!(v["used"], 6000000.0);
    }

    #[test]
    fn garbage_is_none() {
        assert!(parse("free -m", "command not found").is_none());
    }
}
