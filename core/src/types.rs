use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::PreconditionError;

/// Upper bound on any single command's timeout.
pub const MAX_COMMAND_TIMEOUT_SECS: u32 = 30;
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u32 = 10;
pub const DEFAULT_SSH_PORT: u16 = 22;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    SystemInfo,
    Memory,
    Cpu,
    Disk,
    Network,
    Processes,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::SystemInfo,
        Category::Memory,
        Category::Cpu,
        Category::Disk,
        Category::Network,
        Category::Processes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::SystemInfo => "system_info",
            Category::Memory => "memory",
            Category::Cpu => "cpu",
            Category::Disk => "disk",
            Category::Network => "network",
            Category::Processes => "processes",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "system_info" | "system" | "sysinfo" | "system_information" => Ok(Category::SystemInfo),
            "memory" | "mem" | "ram" => Ok(Category::Memory),
            "cpu" | "processor" => Ok(Category::Cpu),
            "disk" | "storage" => Ok(Category::Disk),
            "network" | "net" => Ok(Category::Network),
            "processes" | "process" | "ps" => Ok(Category::Processes),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Safe,
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "safe",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "safe" => Ok(RiskLevel::Safe),
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OsType {
    Linux,
    Windows,
    Macos,
    Unknown,
}

impl FromStr for OsType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Ok(if lower.contains("win") {
            OsType::Windows
        } else if lower.contains("mac") || lower.contains("darwin") || lower == "osx" {
            OsType::Macos
        } else if lower.contains("linux")
            || ["ubuntu", "debian", "centos", "rhel", "fedora", "arch", "alpine"]
                .iter()
                .any(|d| lower.contains(d))
        {
            OsType::Linux
        } else {
            OsType::Unknown
        })
    }
}

impl fmt::Display for OsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OsType::Linux => "linux",
            OsType::Windows => "windows",
            OsType::Macos => "macos",
            OsType::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsInfo {
    #[serde(rename = "type")]
    pub os_type: OsType,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub shell: String,
}

impl Default for OsInfo {
    fn default() -> Self {
        Self {
            os_type: OsType::Linux,
            version: String::new(),
            shell: "bash".to_string(),
        }
    }
}

/// Inbound goal supplied by the upstream classification layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDescription {
    pub description: String,
    #[serde(default)]
    pub os_info: OsInfo,
    #[serde(default)]
    pub prior_commands: Vec<String>,
}

impl TaskDescription {
    pub fn new(description: impl Into<String>, os_info: OsInfo) -> Self {
        Self {
            description: description.into(),
            os_info,
            prior_commands: Vec::new(),
        }
    }

    pub fn with_prior_commands(mut self, prior: Vec<String>) -> Self {
        self.prior_commands = prior;
        self
    }
}

/// A vetted or drafted command proposal. Never mutated after generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateCommand {
    pub command: String,
    pub purpose: String,
    pub category: Category,
    pub risk_level: RiskLevel,
    pub timeout_seconds: u32,
    #[serde(default)]
    pub expected_output_hint: String,
    #[serde(default)]
    pub prerequisites: Vec<String>,
}

impl CandidateCommand {
    pub fn new(
        command: impl Into<String>,
        purpose: impl Into<String>,
        category: Category,
        risk_level: RiskLevel,
    ) -> Self {
        Self {
            command: command.into(),
            purpose: purpose.into(),
            category,
            risk_level,
            timeout_seconds: DEFAULT_COMMAND_TIMEOUT_SECS,
            expected_output_hint: String::new(),
            prerequisites: Vec::new(),
        }
    }

    pub fn with_timeout(mut self, secs: u32) -> Self {
        self.timeout_seconds = clamp_timeout(secs);
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.expected_output_hint = hint.into();
        self
    }
}

pub fn clamp_timeout(secs: u32) -> u32 {
    secs.clamp(1, MAX_COMMAND_TIMEOUT_SECS)
}

/// Borrowed by the executor for one round; owned by the session layer.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDescriptor {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default)]
    pub key_file: Option<PathBuf>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub last_used: Option<DateTime<Utc>>,
}

fn default_port() -> u16 {
    DEFAULT_SSH_PORT
}

impl ConnectionDescriptor {
    pub fn with_password(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_SSH_PORT,
            username: username.into(),
            password: Some(password.into()),
            key_file: None,
            is_active: true,
            last_used: None,
        }
    }

    pub fn with_key_file(
        host: impl Into<String>,
        username: impl Into<String>,
        key_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_SSH_PORT,
            username: username.into(),
            password: None,
            key_file: Some(key_file.into()),
            is_active: true,
            last_used: None,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Checks the usability rules: host, username, and exactly one credential.
    pub fn validate(&self) -> Result<(), PreconditionError> {
        if self.host.trim().is_empty() {
            return Err(PreconditionError::MissingHost);
        }
        if self.username.trim().is_empty() {
            return Err(PreconditionError::MissingUsername);
        }
        let has_password = self.password.as_deref().is_some_and(|p| !p.is_empty());
        let has_key = self
            .key_file
            .as_ref()
            .is_some_and(|k| !k.as_os_str().is_empty());
        match (has_password, has_key) {
            (false, false) => Err(PreconditionError::MissingCredentials),
            (true, true) => Err(PreconditionError::AmbiguousCredentials),
            _ => Ok(()),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("key_file", &self.key_file)
            .field("is_active", &self.is_active)
            .field("last_used", &self.last_used)
            .finish()
    }
}
