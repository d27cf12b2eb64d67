use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::executor::ExecutionRecord;
use crate::gate::RejectedCommand;
use crate::types::Category;

use super::think::NextAction;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub id: String,
    /// Command that produced the data.
    pub source: String,
    pub category: Category,
    pub data: Value,
    pub reliability: f32,
    pub relevance_score: f32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HypothesisStatus {
    Active,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hypothesis {
    pub id: String,
    pub description: String,
    pub confidence: f32,
    pub supporting_evidence_ids: Vec<String>,
    pub contradicting_evidence_ids: Vec<String>,
    pub status: HypothesisStatus,
}

/// Per-task loop state. Owned and mutated by the controller only.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationState {
    pub iteration: u32,
    pub max_iterations: u32,
    pub confidence: f32,
    pub completed: bool,
    pub evidence: Vec<Evidence>,
    pub hypotheses: Vec<Hypothesis>,
    pub explored: Vec<Category>,
    pub actions: Vec<NextAction>,
}

impl IterationState {
    pub fn new(max_iterations: u32) -> Self {
        Self {
            iteration: 0,
            max_iterations,
            confidence: 0.0,
            completed: false,
            evidence: Vec::new(),
            hypotheses: Vec::new(),
            explored: Vec::new(),
            actions: Vec::new(),
        }
    }

    pub fn mark_explored(&mut self, category: Category) {
        if !self.explored.contains(&category) {
            self.explored.push(category);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    EvidenceCollected,
    NoEvidence,
    Degraded,
}

/// Result handed to the response-drafting layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeOutcome {
    pub session_id: String,
    pub records: Vec<ExecutionRecord>,
    pub rejected: Vec<RejectedCommand>,
    pub evidence: Vec<Evidence>,
    pub hypotheses: Vec<Hypothesis>,
    pub confidence: f32,
    pub iterations: u32,
    pub completed: bool,
    pub status: OutcomeStatus,
    pub message: String,
    pub actions: Vec<NextAction>,
}
