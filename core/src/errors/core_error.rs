// core/src/errors/core_error.rs
use thiserror::Error;

use super::{
    ConfigError, ConnectionError, GenerationError, PreconditionError, RiskAssessmentError,
    TransportError,
};

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("precondition failed: {0}")]
    Precondition(#[from] PreconditionError),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("iteration aborted: {reason}")]
    Aborted { reason: String },

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("executor error: {0}")]
    Executor(#[from] ExecutorError),

    #[error("precondition failed: {0}")]
    Precondition(#[from] PreconditionError),

    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("risk assessment error: {0}")]
    RiskAssessment(#[from] RiskAssessmentError),

    #[error("events output error: {0}")]
    EventsOut(String),

    #[error("plugin error: {0}")]
    Plugin(#[source] anyhow::Error),
}
