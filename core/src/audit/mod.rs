//! Append-only, capacity-capped audit trail of gate and executor decisions.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events_out::{emit_event, EventsOutTx};
use crate::types::RiskLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Validate,
    Execute,
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditResult {
    Success,
    Failure,
    Blocked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub command: String,
    pub action: AuditAction,
    pub result: AuditResult,
    pub risk_level: RiskLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditEntry {
    pub fn new(
        session_id: &str,
        command: &str,
        action: AuditAction,
        result: AuditResult,
        risk_level: RiskLevel,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            session_id: session_id.to_string(),
            command: command.to_string(),
            action,
            result,
            risk_level,
            reason: None,
            error: None,
        }
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

pub struct AuditLog {
    capacity: usize,
    entries: Mutex<VecDeque<AuditEntry>>,
    sink: Option<EventsOutTx>,
}

impl AuditLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            sink: None,
        }
    }

    /// Mirrors every entry to the JSONL event sink.
    pub fn with_sink(mut self, sink: Option<EventsOutTx>) -> Self {
        self.sink = sink;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn record(&self, entry: AuditEntry) {
        emit_event(self.sink.as_ref(), "audit", &entry);
        let mut entries = self.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.lock().iter().cloned().collect()
    }

    /// Newest `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> Vec<AuditEntry> {
        let entries = self.lock();
        let skip = entries.len().saturating_sub(n);
        entries.iter().skip(skip).cloned().collect()
    }

    pub fn blocked(&self) -> Vec<AuditEntry> {
        self.lock()
            .iter()
            .filter(|e| e.result == AuditResult::Blocked)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<AuditEntry>> {
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(cmd: &str, result: AuditResult) -> AuditEntry {
        AuditEntry::new("s-1", cmd, AuditAction::Validate, result, RiskLevel::Safe)
    }

    #[test]
    fn evicts_oldest_past_capacity() {
        let log = AuditLog::new(3);
        for i in 0..5 {
            log.record(entry(&format!("cmd-{i}"), AuditResult::Success));
        }
        let cmds: Vec<String> = log.entries().into_iter().map(|e| e.command).collect();
        assert_eq!(cmds, vec!["cmd-2", "cmd-3", "cmd-4"]);
    }

    #[test]
    fn recent_and_blocked_views() {
        let log = AuditLog::new(10);
        log.record(entry("a", AuditResult::Success));
        log.record(entry("b", AuditResult::Blocked));
        log.record(entry("c", AuditResult::Success));

        let recent: Vec<String> = log.recent(2).into_iter().map(|e| e.command).collect();
        assert_eq!(recent, vec!["b", "c"]);
        assert_eq!(log.blocked().len(), 1);
        assert_eq!(log.recent(99).len(), 3);

        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn entries_serialize_snake_case() {
        let e = AuditEntry::new(
            "s",
            "rm -rf /",
            AuditAction::Block,
            AuditResult::Blocked,
            RiskLevel::High,
        )
        .reason("blacklisted");
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v["action"], "block");
        assert_eq!(v["result"], "blocked");
        assert_eq!(v["risk_level"], "high");
        assert!(v.get("error").is_none());
    }
}
