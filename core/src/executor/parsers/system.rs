use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Map, Value};

use super::{key_values, leading_command};

lazy_static! {
    static ref UPTIME: Regex =
        Regex::new(r"up\s+(.+?),\s+(?:\d+\s+users?|load average)").unwrap();
    static ref LOAD: Regex =
        Regex::new(r"load averages?:\s*([\d.]+),?\s+([\d.]+),?\s+([\d.]+)").unwrap();
}

const UNAME_KERNELS: &[&str] = &["Linux", "Darwin", "FreeBSD", "OpenBSD", "NetBSD", "SunOS"];

const INTERESTING_KEYS: &[(&str, &str)] = &[
    ("Host Name", "hostname"),
    ("OS Name", "os_name"),
    ("OS Version", "os_version"),
    ("System Boot Time", "boot_time"),
    ("ProductName", "os_name"),
    ("ProductVersion", "os_version"),
    ("BuildVersion", "build"),
    ("Distributor ID", "os_name"),
    ("Description", "description"),
    ("Release", "os_version"),
];

pub(super) fn parse(command: &str, stdout: &str) -> Option<Value> {
    let text = stdout.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(v) = parse_uptime(text) {
        return Some(v);
    }

    let cmd = leading_command(command);
    if cmd == "uname" {
        return parse_uname(text);
    }

    let mut out = Map::new();
    let kv = key_values(text);
    for (key, name) in INTERESTING_KEYS {
        if let Some(v) = kv.get(*key) {
            out.insert(name.to_string(), json!(v));
        }
    }
    if !out.is_empty() {
        return Some(Value::Object(out));
    }

    if let Some(v) = parse_uname(text) {
        return Some(v);
    }

    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() == 1 && lines[0].split_whitespace().count() == 1 {
        if cmd == "hostname" || cmd.is_empty() {
            return Some(json!({ "hostname": lines[0].trim() }));
        }
        return Some(json!({ "value": lines[0].trim() }));
    }
    if cmd == "ver" {
        return Some(json!({ "os_version": text }));
    }
    None
}

pub(super) fn parse_uptime(text: &str) -> Option<Value> {
    let loads = LOAD.captures(text)?;
    let load: Vec<f64> = (1..=3)
        .filter_map(|i| loads.get(i)?.as_str().parse().ok())
        .collect();
    let mut out = Map::new();
    if let Some(up) = UPTIME.captures(text).and_then(|c| c.get(1)) {
        out.insert("uptime".into(), json!(up.as_str().trim()));
    }
    if load.len() == 3 {
        out.insert("load_1".into(), json!(load[0]));
        out.insert("load_5".into(), json!(load[1]));
        out.insert("load_15".into(), json!(load[2]));
    }
    (!out.is_empty()).then_some(Value::Object(out))
}

fn parse_uname(text: &str) -> Option<Value> {
    let fields: Vec<&str> = text.split_whitespace().collect();
    if fields.len() < 3 || !UNAME_KERNELS.contains(&fields[0]) {
        return None;
    }
    let machine = fields
        .iter()
        .rev()
        .find(|f| ["x86_64", "aarch64", "arm64", "i686", "armv7l"].contains(f))
        .copied();
    let mut out = json!({
        "os": fields[0],
        "hostname": fields[1],
        "kernel_release": fields[2],
    });
    if let Some(m) = machine {
        out["machine"] = json!(m);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_line() {
        let v = parse(
            "uptime",
            " 10:14:01 up 12 days,  3:02,  2 users,  load average: 0.52, 0.58, 0.59",
        )
        .unwrap();
        assert_eq!(v["uptime"], "12 days,  3:02");
        assert_eq!(v["load_1"], 0.52);
        assert_eq!(v["load_15"], 0.59);
    }

    #[test]
    fn macos_uptime_uses_plural_averages() {
        let v = parse("uptime", "10:00  up 3 days, 4 users, load averages: 1.20 1.10 1.00").unwrap();
        assert_eq!(v["load_5"], 1.1);
    }

    #[test]
    fn uname_fields() {
        let v = parse(
            "uname -a",
            "Linux web-01 5.15.0-91-generic #101-Ubuntu SMP Tue Nov 14 13:30:08 UTC 2023 x86_64 x86_64 x86_64 GNU/Linux",
        )
        .unwrap();
        assert_eq!(v["os"], "Linux");
        assert_eq!(v["hostname"], "web-01");
        assert_eq!(v["machine"], "x86_64");
    }

    #[test]
    fn hostname_and_key_values() {
        assert_eq!(parse("hostname", "web-01\n").unwrap()["hostname"], "web-01");

        let v = parse(
            "sw_vers",
            "ProductName:\tmacOS\nProductVersion:\t14.2\nBuildVersion:\t23C64\n",
        )
        .unwrap();
        assert_eq!(v["os_name"], "macOS");
        assert_eq!(v["os_version"], "14.2");
    }

    #[test]
    fn empty_output_fails() {
        assert!(parse("hostname", "  \n").is_none());
    }
}
