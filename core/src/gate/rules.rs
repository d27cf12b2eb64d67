use lazy_static::lazy_static;
use regex::Regex;

use crate::config::GateConfig;

/// Fragment → safe read-only substitute. Matched case-insensitively as a
/// substring of the whole command.
const BLACKLIST: &[(&str, &str)] = &[
    // file deletion / mutation
    ("rm -", "ls -la"),
    ("rm ", "ls -la"),
    ("rmdir", "ls -la"),
    ("unlink ", "ls -la"),
    ("shred", "ls -la"),
    ("truncate", "ls -la"),
    ("mv ", "ls -la"),
    ("tee ", "cat"),
    ("del ", "dir"),
    ("erase ", "dir"),
    ("remove-item", "Get-ChildItem"),
    // filesystem formatting / raw disks
    ("mkfs", "lsblk"),
    ("fdisk", "lsblk"),
    ("parted", "lsblk"),
    ("dd if=", "lsblk"),
    ("dd of=", "lsblk"),
    ("format ", "df -h"),
    ("format-volume", "Get-PSDrive -PSProvider FileSystem"),
    ("diskutil erase", "diskutil list"),
    ("umount", "df -h"),
    ("mount -o", "df -h"),
    // power state
    ("shutdown", "uptime"),
    ("reboot", "uptime"),
    ("halt", "uptime"),
    ("poweroff", "uptime"),
    ("init 0", "uptime"),
    ("init 6", "uptime"),
    ("restart-computer", "systeminfo"),
    ("stop-computer", "systeminfo"),
    // service management
    ("systemctl stop", "systemctl status"),
    ("systemctl start", "systemctl status"),
    ("systemctl restart", "systemctl status"),
    ("systemctl enable", "systemctl status"),
    ("systemctl disable", "systemctl status"),
    ("systemctl mask", "systemctl status"),
    ("service ", "systemctl status"),
    ("stop-service", "Get-Service"),
    ("start-service", "Get-Service"),
    ("restart-service", "Get-Service"),
    ("sc stop", "Get-Service"),
    ("sc delete", "Get-Service"),
    // process control
    ("kill", "ps aux"),
    ("stop-process", "Get-Process"),
    ("call create", "tasklist"),
    // user management
    ("useradd", "id"),
    ("userdel", "id"),
    ("usermod", "id"),
    ("groupadd", "id"),
    ("chpasswd", "id"),
    ("passwd", "id"),
    ("net user", "whoami"),
    // privilege escalation / permissions
    ("sudo", "whoami"),
    ("su -", "whoami"),
    ("su root", "whoami"),
    ("doas ", "whoami"),
    ("runas", "whoami"),
    ("chmod", "ls -l"),
    ("chown", "ls -l"),
    ("chgrp", "ls -l"),
    ("setfacl", "ls -l"),
    // raw network egress
    ("wget", "ss -tuln"),
    ("curl", "ss -tuln"),
    ("nc ", "ss -tuln"),
    ("ncat", "ss -tuln"),
    ("netcat", "ss -tuln"),
    ("telnet", "ss -tuln"),
    ("ssh ", "ss -tuln"),
    ("scp ", "ss -tuln"),
    ("sftp", "ss -tuln"),
    ("rsync", "ss -tuln"),
    ("nmap", "ss -tuln"),
    ("invoke-webrequest", "Get-NetIPAddress"),
    ("invoke-restmethod", "Get-NetIPAddress"),
    ("ipconfig /release", "ipconfig /all"),
    ("ipconfig /renew", "ipconfig /all"),
    ("iptables", "ss -tuln"),
    ("firewall-cmd", "ss -tuln"),
    ("ufw ", "ss -tuln"),
    // shell eval constructs
    ("eval", "uname -a"),
    ("exec ", "uname -a"),
    ("source ", "uname -a"),
    ("bash -c", "uname -a"),
    ("sh -c", "uname -a"),
    ("python -c", "uname -a"),
    ("python3 -c", "uname -a"),
    ("perl -e", "uname -a"),
    ("ruby -e", "uname -a"),
    ("base64 -d", "uname -a"),
    ("invoke-expression", "systeminfo"),
    ("iex ", "systeminfo"),
    ("powershell -c", "systeminfo"),
    ("powershell -enc", "systeminfo"),
    // scheduling, kernel, registry, packages
    ("crontab", "ls /etc/cron.d"),
    ("sysctl -w", "sysctl -a"),
    ("insmod", "lsmod"),
    ("rmmod", "lsmod"),
    ("modprobe", "lsmod"),
    ("reg add", "systeminfo"),
    ("reg delete", "systeminfo"),
    ("set-executionpolicy", "systeminfo"),
    ("apt-get", "uname -a"),
    ("apt install", "uname -a"),
    ("yum ", "uname -a"),
    ("dnf ", "uname -a"),
    ("pip install", "uname -a"),
];

const DEFAULT_ALTERNATIVE: &str = "uname -a";

type ArgGuard = fn(&[&str]) -> bool;

/// Read-only utilities. An optional guard restricts the arguments.
const WHITELIST: &[(&str, Option<ArgGuard>)] = &[
    // system / hardware
    ("uname", None),
    ("hostname", Some(flags_only)),
    ("uptime", None),
    ("whoami", None),
    ("id", None),
    ("date", Some(no_set_flag)),
    ("w", None),
    ("who", None),
    ("arch", None),
    ("lsb_release", None),
    ("sw_vers", None),
    ("sysctl", Some(no_write_flag)),
    ("getconf", None),
    ("lspci", None),
    ("lsusb", None),
    ("lsmod", None),
    ("systeminfo", None),
    ("ver", None),
    ("wmic", None),
    ("get-computerinfo", None),
    ("get-ciminstance", None),
    ("get-wmiobject", None),
    // memory / cpu
    ("free", None),
    ("vmstat", None),
    ("vm_stat", None),
    ("lscpu", None),
    ("nproc", None),
    ("iostat", None),
    ("mpstat", None),
    // disk
    ("df", None),
    ("du", None),
    ("lsblk", None),
    ("findmnt", None),
    ("get-psdrive", None),
    ("get-volume", None),
    // network
    ("ip", Some(ip_read_only)),
    ("ifconfig", Some(single_interface_query)),
    ("ss", None),
    ("netstat", None),
    ("ipconfig", None),
    ("get-netipaddress", None),
    ("get-netadapter", None),
    // processes
    ("ps", None),
    ("top", None),
    ("pgrep", None),
    ("pstree", None),
    ("lsof", None),
    ("tasklist", None),
    ("get-process", None),
    ("get-service", None),
    // logs / files
    ("cat", None),
    ("head", None),
    ("tail", None),
    ("journalctl", None),
    ("dmesg", Some(no_clear_flag)),
];

fn flags_only(args: &[&str]) -> bool {
    args.iter().all(|a| a.starts_with('-'))
}

fn no_set_flag(args: &[&str]) -> bool {
    !args.iter().any(|a| *a == "-s" || a.starts_with("--set"))
}

fn no_write_flag(args: &[&str]) -> bool {
    !args.iter().any(|a| *a == "-w" || a.contains('='))
}

fn no_clear_flag(args: &[&str]) -> bool {
    !args
        .iter()
        .any(|a| *a == "-c" || *a == "-C" || *a == "--clear" || *a == "--console-off")
}

fn ip_read_only(args: &[&str]) -> bool {
    const MUTATING: &[&str] = &["add", "del", "delete", "set", "change", "replace", "flush", "append"];
    !args.iter().any(|a| MUTATING.contains(&a.to_ascii_lowercase().as_str()))
}

fn single_interface_query(args: &[&str]) -> bool {
    args.len() <= 1 || args.iter().all(|a| a.starts_with('-'))
}

lazy_static! {
    /// Chaining, substitution, redirection and interpreter pipes.
    static ref DANGEROUS_PATTERNS: Vec<(&'static str, Regex)> = vec![
        ("command chaining (&&)", Regex::new(r"&&").unwrap()),
        ("command chaining (||)", Regex::new(r"\|\|").unwrap()),
        ("command chaining (;)", Regex::new(r";").unwrap()),
        ("background execution (&)", Regex::new(r"&").unwrap()),
        ("newline chaining", Regex::new(r"[\r\n]").unwrap()),
        ("backtick substitution", Regex::new(r"`").unwrap()),
        ("command substitution $( )", Regex::new(r"\$\(").unwrap()),
        ("append redirection (>>)", Regex::new(r">>").unwrap()),
        ("output redirection (>)", Regex::new(r">").unwrap()),
        ("input redirection (<)", Regex::new(r"<").unwrap()),
        (
            "pipe to interpreter",
            Regex::new(r"(?i)\|\s*(sh|bash|zsh|ksh|dash|fish|python3?|perl|ruby|node|php|powershell|pwsh|cmd)\b").unwrap(),
        ),
        ("pipe to xargs", Regex::new(r"(?i)\|\s*xargs\b").unwrap()),
        ("wildcard of wildcard", Regex::new(r"\*\S*\*").unwrap()),
        ("path traversal", Regex::new(r"\.\.[/\\]").unwrap()),
    ];

    /// Residual substitution forms checked in the structural stage.
    static ref RESIDUAL_PATTERNS: Vec<(&'static str, Regex)> = vec![
        ("parameter expansion ${ }", Regex::new(r"\$\{").unwrap()),
        ("process substitution", Regex::new(r"[<>]\(").unwrap()),
        ("nul byte", Regex::new(r"\x00").unwrap()),
        ("heredoc", Regex::new(r"<<").unwrap()),
    ];
}

pub struct BlacklistHit {
    pub fragment: String,
    pub alternative: String,
}

/// Compiled rule set: static tables plus config extras.
pub struct GateRules {
    extra_blacklist: Vec<String>,
    extra_whitelist: Vec<String>,
}

impl GateRules {
    pub fn new(cfg: &GateConfig) -> Self {
        Self {
            extra_blacklist: cfg
                .extra_blacklist
                .iter()
                .map(|s| s.to_lowercase())
                .filter(|s| !s.trim().is_empty())
                .collect(),
            extra_whitelist: cfg
                .extra_whitelist
                .iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn blacklist_hit(&self, command: &str) -> Option<BlacklistHit> {
        let lower = command.to_lowercase();
        if let Some((fragment, alt)) = BLACKLIST.iter().find(|(f, _)| lower.contains(f)) {
            return Some(BlacklistHit {
                fragment: fragment.to_string(),
                alternative: alt.to_string(),
            });
        }
        self.extra_blacklist
            .iter()
            .find(|f| lower.contains(f.as_str()))
            .map(|f| BlacklistHit {
                fragment: f.clone(),
                alternative: DEFAULT_ALTERNATIVE.to_string(),
            })
    }

    /// Label of the first dangerous pattern found.
    pub fn dangerous_pattern_hit(&self, command: &str) -> Option<&'static str> {
        DANGEROUS_PATTERNS
            .iter()
            .find(|(_, re)| re.is_match(command))
            .map(|(label, _)| *label)
    }

    pub fn residual_pattern_hit(&self, command: &str) -> Option<&'static str> {
        RESIDUAL_PATTERNS
            .iter()
            .find(|(_, re)| re.is_match(command))
            .map(|(label, _)| *label)
    }

    /// Leading token (basename) matched against the whitelist, with its guard.
    pub fn whitelisted(&self, command: &str) -> Option<String> {
        let mut tokens = command.split_whitespace();
        let first = tokens.next()?;
        let base = first
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(first)
            .trim_end_matches(".exe")
            .to_lowercase();
        let args: Vec<&str> = tokens.collect();

        if let Some((token, guard)) = WHITELIST.iter().find(|(t, _)| *t == base) {
            if let Some(guard) = guard {
                if !guard(&args) {
                    return None;
                }
            }
            return Some(token.to_string());
        }
        self.extra_whitelist.iter().find(|t| **t == base).cloned()
    }
}
