use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{Category, RiskLevel};

/// Outcome of one approved command. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    pub command: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub parsed_result: Value,
    pub execution_time_ms: u64,
    pub timestamp: DateTime<Utc>,
    pub risk_level: RiskLevel,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionRecord {
    pub(crate) fn failed(
        command: &str,
        category: Category,
        risk_level: RiskLevel,
        error: impl Into<String>,
        execution_time_ms: u64,
    ) -> Self {
        Self {
            command: command.to_string(),
            success: false,
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            parsed_result: Value::Null,
            execution_time_ms,
            timestamp: Utc::now(),
            risk_level,
            category,
            error: Some(error.into()),
        }
    }
}
