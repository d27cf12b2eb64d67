// core/src/errors/generation_error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("drafter unavailable: {0}")]
    Unavailable(String),

    #[error("drafter timed out after {0}ms")]
    Timeout(u64),

    #[error("malformed drafter response: {0}")]
    Malformed(String),

    #[error("drafter transport error")]
    Transport(#[source] anyhow::Error),
}
