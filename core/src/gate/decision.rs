use serde::{Deserialize, Serialize};

use crate::types::CandidateCommand;

/// Which gate stage produced the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStage {
    Blacklist,
    Pattern,
    Whitelist,
    Structural,
    RiskScore,
    Declared,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub approved: bool,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_alternative: Option<String>,
    pub stage: GateStage,
}

impl ValidationOutcome {
    pub(crate) fn approve(stage: GateStage, reason: impl Into<String>) -> Self {
        Self {
            approved: true,
            reason: reason.into(),
            suggested_alternative: None,
            stage,
        }
    }

    pub(crate) fn reject(stage: GateStage, reason: impl Into<String>) -> Self {
        Self {
            approved: false,
            reason: reason.into(),
            suggested_alternative: None,
            stage,
        }
    }

    pub(crate) fn suggest(mut self, alternative: impl Into<String>) -> Self {
        self.suggested_alternative = Some(alternative.into());
        self
    }
}

/// A candidate the gate has approved. Only the gate can construct one, so the
/// executor cannot be handed an unvetted command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApprovedCommand {
    candidate: CandidateCommand,
    reason: String,
}

impl ApprovedCommand {
    pub(crate) fn new(candidate: CandidateCommand, reason: String) -> Self {
        Self { candidate, reason }
    }

    pub fn candidate(&self) -> &CandidateCommand {
        &self.candidate
    }

    pub fn command(&self) -> &str {
        &self.candidate.command
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn into_candidate(self) -> CandidateCommand {
        self.candidate
    }
}

/// A candidate the gate turned down, with the verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedCommand {
    pub candidate: CandidateCommand,
    pub outcome: ValidationOutcome,
}
