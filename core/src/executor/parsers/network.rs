use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};

use super::leading_command;

lazy_static! {
    static ref IP_LINK: Regex = Regex::new(r"^\d+:\s+([^:@\s]+)(?:@\S+)?:").unwrap();
    static ref IFCONFIG_LINK: Regex = Regex::new(r"^([A-Za-z0-9._-]+):?\s+(?:flags=|Link encap)").unwrap();
    static ref INET: Regex =
        Regex::new(r"\binet\s+(?:addr:)?(\d{1,3}(?:\.\d{1,3}){3})(?:/(\d{1,2}))?").unwrap();
    static ref IPCONFIG_ADAPTER: Regex = Regex::new(r"^(\S.*adapter .+):\s*$").unwrap();
    static ref IPCONFIG_V4: Regex =
        Regex::new(r"IPv4 Address[ .]*:\s*(\d{1,3}(?:\.\d{1,3}){3})").unwrap();
    static ref DEFAULT_ROUTE: Regex = Regex::new(r"^default via (\S+)(?: dev (\S+))?").unwrap();
}

pub(super) fn parse(command: &str, stdout: &str) -> Option<Value> {
    let text = stdout.trim();
    if text.is_empty() {
        return None;
    }
    match leading_command(command).as_str() {
        "ss" | "netstat" => parse_sockets(text).or_else(|| parse_routes(text)),
        "ip" if command.contains("route") => parse_routes(text),
        "ipconfig" => parse_ipconfig(text),
        _ => parse_interfaces(text)
            .or_else(|| parse_ipconfig(text))
            .or_else(|| parse_sockets(text)),
    }
}

/// `ip addr show` and `ifconfig` (both the BSD and net-tools layouts).
fn parse_interfaces(text: &str) -> Option<Value> {
    let mut interfaces: Vec<(String, Vec<String>)> = Vec::new();
    for line in text.lines() {
        let link = IP_LINK
            .captures(line)
            .or_else(|| IFCONFIG_LINK.captures(line));
        if let Some(c) = link {
            interfaces.push((c[1].to_string(), Vec::new()));
            continue;
        }
        if let (Some(c), Some(current)) = (INET.captures(line), interfaces.last_mut()) {
            let addr = match c.get(2) {
                Some(prefix) => format!("{}/{}", &c[1], prefix.as_str()),
                None => c[1].to_string(),
            };
            current.1.push(addr);
        }
    }
    if interfaces.is_empty() {
        return None;
    }
    Some(json!({ "interfaces": to_json(interfaces) }))
}

fn parse_ipconfig(text: &str) -> Option<Value> {
    let mut interfaces: Vec<(String, Vec<String>)> = Vec::new();
    for line in text.lines() {
        if let Some(c) = IPCONFIG_ADAPTER.captures(line.trim_end()) {
            interfaces.push((c[1].to_string(), Vec::new()));
            continue;
        }
        if let (Some(c), Some(current)) = (IPCONFIG_V4.captures(line), interfaces.last_mut()) {
            current.1.push(c[1].to_string());
        }
    }
    if interfaces.is_empty() {
        return None;
    }
    Some(json!({ "interfaces": to_json(interfaces) }))
}

fn to_json(interfaces: Vec<(String, Vec<String>)>) -> Vec<Value> {
    interfaces
        .into_iter()
        .map(|(name, ipv4)| json!({ "name": name, "ipv4": ipv4 }))
        .collect()
}

/// Listening sockets from `ss -tuln` / `netstat -an`.
fn parse_sockets(text: &str) -> Option<Value> {
    let listening: Vec<Value> = text
        .lines()
        .filter(|l| l.contains("LISTEN") || l.trim_start().starts_with("udp") || l.trim_start().starts_with("UDP"))
        .filter_map(|line| {
            let f: Vec<&str> = line.split_whitespace().collect();
            let proto = f.first()?.to_ascii_lowercase();
            let local = f
                .iter()
                .skip(1)
                .find(|t| t.contains(':') || t.contains('.'))?;
            Some(json!({ "proto": proto, "local": local }))
        })
        .collect();
    (!listening.is_empty()).then(|| json!({ "listening": listening }))
}

fn parse_routes(text: &str) -> Option<Value> {
    let mut routes = Vec::new();
    let mut gateway = None;
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(c) = DEFAULT_ROUTE.captures(line) {
            gateway = Some(json!({
                "gateway": &c[1],
                "dev": c.get(2).map(|d| d.as_str()),
            }));
        }
        routes.push(line.to_string());
    }
    if gateway.is_none() && routes.is_empty() {
        return None;
    }
    Some(json!({ "default_route": gateway, "routes": routes }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ip_addr_show() {
        let out = "1: lo: <LOOPBACK,UP> mtu 65536\n    inet 127.0.0.1/8 scope host lo\n\
                   2: eth0@if5: <BROADCAST,UP> mtu 1500\n    link/ether 02:42:ac:11:00:02\n    inet 172.17.0.2/16 brd 172.17.255.255 scope global eth0\n";
        let v = parse("ip addr show", out).unwrap();
        let ifs = v["interfaces"].as_array().unwrap();
        assert_eq!(ifs.len(), 2);
        assert_eq!(ifs[1]["name"], "eth0");
        assert_eq!(ifs[1]["ipv4"][0], "172.17.0.2/16");
    }

    #[test]
    fn bsd_ifconfig() {
        let out = "lo0: flags=8049<UP,LOOPBACK> mtu 16384\n\tinet 127.0.0.1 netmask 0xff000000\n\
                   en0: flags=8863<UP,BROADCAST> mtu 1500\n\tinet 192.168.1.20 netmask 0xffffff00 broadcast 192.168.1.255\n";
        let v = parse("ifconfig", out).unwrap();
        assert_eq!(v["interfaces"][1]["name"], "en0");
        assert_eq!(v["interfaces"][1]["ipv4"][0], "192.168.1.20");
    }

    #[test]
    fn windows_ipconfig() {
        let out = "Windows IP Configuration\r\n\r\nEthernet adapter Ethernet:\r\n\r\n   IPv4 Address. . . . . . . . . . . : 10.0.0.7(Preferred)\r\n";
        let v = parse("ipconfig /all", out).unwrap();
        assert_eq!(v["interfaces"][0]["name"], "Ethernet adapter Ethernet");
        assert_eq!(v["interfaces"][0]["ipv4"][0], "10.0.0.7");
    }

    #[test]
    fn ss_listening() {
        let out = "Netid State  Recv-Q Send-Q Local Address:Port Peer Address:Port\n\
                   tcp   LISTEN 0      128    0.0.0.0:22         0.0.0.0:*\n\
                   udp   UNCONN 0      0      127.0.0.53%lo:53   0.0.0.0:*\n";
        let v = parse("ss -tuln", out).unwrap();
        let l = v["listening"].as_array().unwrap();
        assert_eq!(l.len(), 2);
        assert_eq!(l[0]["local"], "0.0.0.0:22");
    }

    #[test]
    fn default_route() {
        let v = parse("ip route show", "default via 10.0.0.1 dev eth0 proto dhcp\n10.0.0.0/24 dev eth0\n").unwrap();
        assert_eq!(v["default_route"]["gateway"], "10.0.0.1");
        assert_eq!(v["routes"].as_array().unwrap().len(), 2);
    }
}
