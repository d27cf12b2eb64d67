use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Map, Value};

use super::{key_values, leading_command, leading_number};

lazy_static! {
    static ref LOADAVG: Regex =
        Regex::new(r"^([\d.]+)\s+([\d.]+)\s+([\d.]+)\s+(\d+)/(\d+)").unwrap();
    static ref TOP_LOAD: Regex =
        Regex::new(r"Load Avg:\s*([\d.]+),\s*([\d.]+),\s*([\d.]+)").unwrap();
    static ref TOP_USAGE: Regex =
        Regex::new(r"CPU usage:\s*([\d.]+)% user,\s*([\d.]+)% sys,\s*([\d.]+)% idle").unwrap();
}

const LSCPU_KEYS: &[(&str, &str)] = &[
    ("Model name", "model_name"),
    ("Architecture", "architecture"),
    ("CPU(s)", "cores"),
    ("Thread(s) per core", "threads_per_core"),
    ("Core(s) per socket", "cores_per_socket"),
    ("Socket(s)", "sockets"),
    ("CPU max MHz", "max_mhz"),
    ("hw.ncpu", "cores"),
    ("Name", "model_name"),
    ("NumberOfCores", "cores"),
    ("LoadPercentage", "load_percentage"),
];

pub(super) fn parse(command: &str, stdout: &str) -> Option<Value> {
    let text = stdout.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(c) = LOADAVG.captures(text) {
        return Some(json!({
            "load_1": c[1].parse::<f64>().ok()?,
            "load_5": c[2].parse::<f64>().ok()?,
            "load_15": c[3].parse::<f64>().ok()?,
            "running": c[4].parse::<u64>().ok()?,
            "total_tasks": c[5].parse::<u64>().ok()?,
        }));
    }

    if let Some(v) = super::system::parse_uptime(text) {
        return Some(v);
    }

    let mut out = Map::new();
    if let Some(c) = TOP_LOAD.captures(text) {
        out.insert("load_1".into(), json!(c[1].parse::<f64>().ok()?));
        out.insert("load_5".into(), json!(c[2].parse::<f64>().ok()?));
        out.insert("load_15".into(), json!(c[3].parse::<f64>().ok()?));
    }
    if let Some(c) = TOP_USAGE.captures(text) {
        out.insert("user_percent".into(), json!(c[1].parse::<f64>().ok()?));
        out.insert("system_percent".into(), json!(c[2].parse::<f64>().ok()?));
        out.insert("idle_percent".into(), json!(c[3].parse::<f64>().ok()?));
    }
    if !out.is_empty() {
        return Some(Value::Object(out));
    }

    let kv = key_values(text);
    for (key, name) in LSCPU_KEYS {
        let Some(raw) = kv.get(*key) else {
            continue;
        };
        let value = match *name {
            "model_name" | "architecture" => json!(raw),
            _ => match leading_number(raw) {
                Some(n) => json!(n),
                None => continue,
            },
        };
        out.entry(name.to_string()).or_insert(value);
    }
    if !out.is_empty() {
        return Some(Value::Object(out));
    }

    let single = text.lines().count() == 1;
    if single {
        if let Ok(n) = text.parse::<u64>() {
            return Some(json!({ "cores": n }));
        }
        if leading_command(command) == "sysctl" {
            return Some(json!({ "model_name": text }));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proc_loadavg() {
        let v = parse("cat /proc/loadavg", "0.52 0.58 0.59 1/389 12345\n").unwrap();
        assert_eq!(v["load_1"], 0.52);
        assert_eq!(v["total_tasks"], 389);
    }

    #[test]
    fn lscpu_fields() {
        let out = "Architecture:            x86_64\nCPU(s):                  8\nModel name:              AMD EPYC 7B13\nThread(s) per core:      2\n";
        let v = parse("lscpu", out).unwrap();
        assert_eq!(v["cores"], 8.0);
        assert_eq!(v["model_name"], "AMD EPYC 7B13");
        assert_eq!(v["threads_per_core"], 2.0);
    }

    #[test]
    fn nproc_and_sysctl() {
        assert_eq!(parse("nproc", "4\n").unwrap()["cores"], 4);
        assert_eq!(parse("sysctl hw.ncpu", "hw.ncpu: 10").unwrap()["cores"], 10.0);
        assert_eq!(
            parse("sysctl -n machdep.cpu.brand_string", "Apple M2 Pro").unwrap()["model_name"],
            "Apple M2 Pro"
        );
    }

    #[test]
    fn macos_top_header() {
        let out = "Processes: 512 total\nLoad Avg: 2.10, 1.90, 1.80\nCPU usage: 5.20% user, 3.10% sys, 91.70% idle\n";
        let v = parse("top -l 1 -n 0", out).unwrap();
        assert_eq!(v["load_1"], 2.1);
        assert_eq!(v["idle_percent"], 91.7);
    }
}
