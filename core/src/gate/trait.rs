use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::RiskAssessmentError;
use crate::types::CandidateCommand;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// 0.0 (harmless) ..= 1.0 (destructive).
    pub score: f32,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub concerns: Vec<String>,
}

/// External risk scoring capability consulted for non-safe candidates.
#[async_trait]
pub trait RiskScorer: Send + Sync {
    fn name(&self) -> &str;

    async fn assess(
        &self,
        candidate: &CandidateCommand,
    ) -> Result<RiskAssessment, RiskAssessmentError>;
}
