//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `sshprobe_core::api` instead of reaching into internal modules.

pub use crate::audit::{AuditAction, AuditEntry, AuditLog, AuditResult};
pub use crate::catalog::{CatalogLookup, CommandCatalog};
pub use crate::config::{
    AppConfig, DrafterProvider, LlmEndpointConfig, LoggingConfig, ScorerProvider,
};
pub use crate::context::{AppContext, Services, ServicesFactory};
pub use crate::controller::{
    Evidence, Hypothesis, HypothesisStatus, IterationController, NextAction, OutcomeStatus,
    ProbeOutcome,
};
pub use crate::errors::{
    ConnectionError, CoreError, ExecutorError, GenerationError, PreconditionError,
    RiskAssessmentError, TransportError,
};
pub use crate::events_out::EventsOutTx;
pub use crate::executor::{
    CommandOutput, ExecuteOptions, ExecutionHistory, ExecutionRecord, ExecutionStats,
    RemoteExecutor, RemoteSession, RemoteTransport,
};
pub use crate::gate::{
    ApprovedCommand, RejectedCommand, RiskAssessment, RiskScorer, SecurityGate,
    ValidationOutcome,
};
pub use crate::generator::{CandidateGenerator, Drafter};
pub use crate::types::{
    CandidateCommand, Category, ConnectionDescriptor, OsInfo, OsType, RiskLevel,
    TaskDescription,
};
