pub mod config_error;
pub mod connection_error;
pub mod core_error;
pub mod generation_error;
pub mod risk_error;

pub use config_error::ConfigError;
pub use connection_error::{ConnectionError, PreconditionError, TransportError};
pub use core_error::{CoreError, ExecutorError};
pub use generation_error::GenerationError;
pub use risk_error::RiskAssessmentError;
