use serde_json::{json, Value};

use super::{key_values, leading_command, leading_number};

pub(super) fn parse(command: &str, stdout: &str) -> Option<Value> {
    let text = stdout.trim();
    if text.is_empty() {
        return None;
    }
    match leading_command(command).as_str() {
        "lsblk" => parse_lsblk(text),
        "wmic" => parse_wmic(text),
        _ => parse_df(text).or_else(|| parse_wmic(text)),
    }
}

/// `df -h` / `df -i` rows. Long device names that wrap onto their own line
/// are joined with the following line.
fn parse_df(text: &str) -> Option<Value> {
    let mut lines = text.lines();
    let header = lines.find(|l| l.starts_with("Filesystem"))?;
    let inode_mode = header.contains("Inodes") || header.contains("IUse%");

    let mut rows = Vec::new();
    let mut pending: Option<String> = None;
    for line in lines {
        let mut fields: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() == 1 {
            pending = Some(fields.remove(0));
            continue;
        }
        if let Some(name) = pending.take() {
            fields.insert(0, name);
        }
        if fields.len() < 6 {
            continue;
        }
        let Some(pct_idx) = fields.iter().position(|f| f.ends_with('%')) else {
            continue;
        };
        if pct_idx < 4 {
            continue;
        }
        let mounted_on = fields[fields.len() - 1].clone();
        let use_percent = leading_number(&fields[pct_idx]);
        rows.push(if inode_mode {
            json!({
                "filesystem": fields[0],
                "inodes": fields[1],
                "inodes_used": fields[2],
                "inodes_free": fields[3],
                "inode_use_percent": use_percent,
                "mounted_on": mounted_on,
            })
        } else {
            json!({
                "filesystem": fields[0],
                "size": fields[1],
                "used": fields[2],
                "available": fields[3],
                "use_percent": use_percent,
                "mounted_on": mounted_on,
            })
        });
    }
    if rows.is_empty() {
        return None;
    }
    Some(json!({ "filesystems": rows }))
}

fn parse_lsblk(text: &str) -> Option<Value> {
    let mut lines = text.lines();
    let header: Vec<&str> = lines.next()?.split_whitespace().collect();
    if header.first() != Some(&"NAME") {
        return None;
    }
    let col = |name: &str| header.iter().position(|h| *h == name);
    let (size_i, type_i) = (col("SIZE")?, col("TYPE")?);
    let mount_i = col("MOUNTPOINT").or_else(|| col("MOUNTPOINTS"));

    let devices: Vec<Value> = lines
        .filter_map(|line| {
            let f: Vec<&str> = line.split_whitespace().collect();
            if f.len() <= type_i {
                return None;
            }
            let name = f[0].trim_start_matches(|c: char| !c.is_alphanumeric());
            Some(json!({
                "name": name,
                "size": f[size_i],
                "type": f[type_i],
                "mountpoint": mount_i.and_then(|i| f.get(i)).copied(),
            }))
        })
        .collect();
    (!devices.is_empty()).then(|| json!({ "devices": devices }))
}

/// `wmic logicaldisk get Caption,FreeSpace,Size /Value`: blank-line separated
/// blocks of key=value pairs.
fn parse_wmic(text: &str) -> Option<Value> {
    let normalized = text.replace("\r\n", "\n");
    let rows: Vec<Value> = normalized
        .split("\n\n")
        .filter_map(|block| {
            let kv = key_values(block);
            let caption = kv.get("Caption")?;
            let size = kv.get("Size").and_then(|v| leading_number(v))?;
            let free = kv.get("FreeSpace").and_then(|v| leading_number(v))?;
            let used = (size - free).max(0.0);
            let pct = if size > 0.0 { (used / size * 100.0).round() } else { 0.0 };
            Some(json!({
                "filesystem": caption,
                "size": size,
                "used": used,
                "available": free,
                "use_percent": pct,
                "mounted_on": caption,
            }))
        })
        .collect();
    (!rows.is_empty()).then(|| json!({ "filesystems": rows }))
}
