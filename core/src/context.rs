use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::audit::AuditLog;
use crate::catalog::CommandCatalog;
use crate::config::AppConfig;
use crate::controller::IterationController;
use crate::errors::CoreError;
use crate::events_out::{start_events_out, EventsOutTx};
use crate::executor::{ExecuteOptions, ExecutionHistory, RemoteExecutor, RemoteTransport};
use crate::gate::{RiskScorer, SecurityGate};
use crate::generator::{CandidateGenerator, Drafter};

/// Capability implementations chosen from config.
#[derive(Clone)]
pub struct Services {
    pub transport: Arc<dyn RemoteTransport>,
    pub drafter: Option<Arc<dyn Drafter>>,
    pub scorer: Option<Arc<dyn RiskScorer>>,
}

pub trait ServicesFactory: Send + Sync {
    fn build_services(&self, cfg: &AppConfig) -> Result<Services, CoreError>;
}

/// Process-scoped state: config plus the shared catalog, audit ring and
/// execution history. Built once at startup.
#[derive(Clone)]
pub struct AppContext {
    cfg: AppConfig,
    catalog: Arc<CommandCatalog>,
    audit: Arc<AuditLog>,
    history: Arc<ExecutionHistory>,
    events_out: Option<EventsOutTx>,
}

impl AppContext {
    pub async fn new(cfg: AppConfig) -> Result<Self, CoreError> {
        let events_out = start_events_out(&cfg.events_out)
            .await
            .map_err(CoreError::EventsOut)?;
        Ok(Self::with_events_out(cfg, events_out))
    }

    pub fn with_events_out(cfg: AppConfig, events_out: Option<EventsOutTx>) -> Self {
        let audit = AuditLog::new(cfg.audit.capacity).with_sink(events_out.clone());
        let history = ExecutionHistory::new(cfg.executor.history_capacity);
        Self {
            cfg,
            catalog: Arc::new(CommandCatalog::new()),
            audit: Arc::new(audit),
            history: Arc::new(history),
            events_out,
        }
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.cfg
    }

    pub fn catalog(&self) -> Arc<CommandCatalog> {
        self.catalog.clone()
    }

    pub fn audit(&self) -> Arc<AuditLog> {
        self.audit.clone()
    }

    pub fn history(&self) -> Arc<ExecutionHistory> {
        self.history.clone()
    }

    pub fn events_out(&self) -> Option<EventsOutTx> {
        self.events_out.clone()
    }

    pub fn build_services(&self, factory: &dyn ServicesFactory) -> Result<Services, CoreError> {
        factory.build_services(&self.cfg)
    }

    pub fn gate(&self, scorer: Option<Arc<dyn RiskScorer>>, session_id: &str) -> SecurityGate {
        SecurityGate::new(self.cfg.gate.clone(), self.audit(), scorer).with_session(session_id)
    }

    pub fn generator(&self, drafter: Option<Arc<dyn Drafter>>) -> CandidateGenerator {
        CandidateGenerator::new(self.catalog(), drafter)
            .with_default_timeout_secs(self.cfg.executor.default_command_timeout_secs)
    }

    pub fn executor(&self, transport: Arc<dyn RemoteTransport>, session_id: &str) -> RemoteExecutor {
        RemoteExecutor::new(transport, self.history(), self.audit())
            .with_connect_timeout(Duration::from_millis(self.cfg.executor.connect_timeout_ms))
            .with_session(session_id)
    }

    /// A controller for one goal, under a fresh session id.
    pub fn controller(&self, services: &Services) -> IterationController {
        let session_id = Uuid::new_v4().to_string();
        IterationController::new(
            self.cfg.controller.clone(),
            self.generator(services.drafter.clone()),
            self.gate(services.scorer.clone(), &session_id),
            self.executor(services.transport.clone(), &session_id),
            ExecuteOptions::from_config(&self.cfg.executor),
        )
        .with_events(self.events_out())
    }
}
