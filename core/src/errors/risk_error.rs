// core/src/errors/risk_error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RiskAssessmentError {
    #[error("risk scorer unavailable: {0}")]
    Unavailable(String),

    #[error("risk scorer timed out after {0}ms")]
    Timeout(u64),

    #[error("malformed risk assessment: {0}")]
    Malformed(String),

    #[error("risk scorer transport error")]
    Transport(#[source] anyhow::Error),
}
