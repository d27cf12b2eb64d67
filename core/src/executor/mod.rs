//! Remote executor: one session per batch, commands run in sequential groups
//! of at most `max_concurrency`, each bounded by its own timeout and by the
//! batch deadline.

pub mod history;
pub mod parsers;
pub mod record;
pub mod transport;

use std::sync::Arc;
use std::time::Duration;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use serde_json::Value;
use tokio::time::Instant;

use crate::audit::{AuditAction, AuditEntry, AuditLog, AuditResult};
use crate::config::ExecutorConfig;
use crate::errors::{ConnectionError, ExecutorError, TransportError};
use crate::gate::ApprovedCommand;
use crate::types::ConnectionDescriptor;

pub use history::{CategoryStats, ExecutionHistory, ExecutionStats};
pub use parsers::{is_parse_failed, parse_output, PARSE_FAILED};
pub use record::ExecutionRecord;
pub use transport::{CommandOutput, RemoteSession, RemoteTransport};

use transport::SessionGuard;

#[derive(Debug, Clone, Copy)]
pub struct ExecuteOptions {
    pub max_concurrency: usize,
    pub global_timeout: Duration,
}

impl ExecuteOptions {
    pub fn from_config(cfg: &ExecutorConfig) -> Self {
        Self {
            max_concurrency: cfg.max_concurrency,
            global_timeout: Duration::from_millis(cfg.global_timeout_ms),
        }
    }
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self::from_config(&ExecutorConfig::default())
    }
}

pub struct RemoteExecutor {
    transport: Arc<dyn RemoteTransport>,
    history: Arc<ExecutionHistory>,
    audit: Arc<AuditLog>,
    connect_timeout: Duration,
    session_id: String,
}

impl RemoteExecutor {
    pub fn new(
        transport: Arc<dyn RemoteTransport>,
        history: Arc<ExecutionHistory>,
        audit: Arc<AuditLog>,
    ) -> Self {
        Self {
            transport,
            history,
            audit,
            connect_timeout: Duration::from_millis(ExecutorConfig::default().connect_timeout_ms),
            session_id: String::new(),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn history(&self) -> &Arc<ExecutionHistory> {
        &self.history
    }

    /// Runs approved commands against `connection`.
    ///
    /// Returns `Err` only when the connection descriptor is unusable; no
    /// session is opened in that case. Every other failure (connect, timeout,
    /// non-zero exit) becomes a failed record, one per command, in input order.
    pub async fn execute_batch(
        &self,
        commands: Vec<ApprovedCommand>,
        connection: &ConnectionDescriptor,
        options: ExecuteOptions,
    ) -> Result<Vec<ExecutionRecord>, ExecutorError> {
        connection.validate()?;
        if commands.is_empty() {
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let deadline = started + options.global_timeout;
        let group_size = options.max_concurrency.max(1).min(commands.len());

        tracing::info!(
            target: "sshprobe.executor",
            transport = %self.transport.name(),
            host = %connection.host,
            commands = commands.len(),
            group_size,
            "executing batch"
        );

        let mut guard = SessionGuard::new(self.transport.open_session());
        if let Err(e) = self.connect(&mut guard, connection, deadline).await {
            tracing::warn!(
                target: "sshprobe.executor",
                host = %connection.host,
                error = %e,
                "connect failed; failing batch"
            );
            guard.release().await;
            let message = e.to_string();
            let records: Vec<ExecutionRecord> = commands
                .iter()
                .map(|c| failed_record(c, &message, 0))
                .collect();
            self.finish(&records);
            return Ok(records);
        }

        let mut records = Vec::with_capacity(commands.len());
        if let Some(session) = guard.session() {
            for group in commands.chunks(group_size) {
                if Instant::now() >= deadline {
                    let message = TransportError::DeadlineExceeded.to_string();
                    records.extend(group.iter().map(|c| failed_record(c, &message, 0)));
                    continue;
                }
                records.extend(self.run_group(session, group, deadline).await);
            }
        }
        guard.release().await;

        tracing::info!(
            target: "sshprobe.executor",
            elapsed_ms = started.elapsed().as_millis() as u64,
            succeeded = records.iter().filter(|r| r.success).count(),
            failed = records.iter().filter(|r| !r.success).count(),
            "batch finished"
        );
        self.finish(&records);
        Ok(records)
    }

    async fn connect(
        &self,
        guard: &mut SessionGuard,
        connection: &ConnectionDescriptor,
        deadline: Instant,
    ) -> Result<(), ConnectionError> {
        let Some(session) = guard.session_mut() else {
            return Err(ConnectionError::Join("session already released".into()));
        };
        let connect_deadline = deadline.min(Instant::now() + self.connect_timeout);
        match tokio::time::timeout_at(connect_deadline, session.connect(connection)).await {
            Ok(result) => result,
            Err(_) => Err(ConnectionError::Timeout(self.connect_timeout.as_millis() as u64)),
        }
    }

    /// Runs one group concurrently and returns its records in input order.
    async fn run_group(
        &self,
        session: &dyn RemoteSession,
        group: &[ApprovedCommand],
        deadline: Instant,
    ) -> Vec<ExecutionRecord> {
        let mut in_flight: FuturesUnordered<_> = group
            .iter()
            .enumerate()
            .map(|(idx, cmd)| async move { (idx, run_one(session, cmd, deadline).await) })
            .collect();

        let mut done = Vec::with_capacity(group.len());
        while let Some(item) = in_flight.next().await {
            done.push(item);
        }
        done.sort_by_key(|(idx, _)| *idx);
        done.into_iter().map(|(_, r)| r).collect()
    }

    fn finish(&self, records: &[ExecutionRecord]) {
        self.history.append(records);
        for r in records {
            let result = if r.success {
                AuditResult::Success
            } else {
                AuditResult::Failure
            };
            let mut entry = AuditEntry::new(
                &self.session_id,
                &r.command,
                AuditAction::Execute,
                result,
                r.risk_level,
            );
            if let Some(err) = &r.error {
                entry = entry.error(err.clone());
            }
            self.audit.record(entry);
        }
    }
}

async fn run_one(
    session: &dyn RemoteSession,
    approved: &ApprovedCommand,
    deadline: Instant,
) -> ExecutionRecord {
    let candidate = approved.candidate();
    let per_command = Duration::from_secs(u64::from(candidate.timeout_seconds));
    let started = Instant::now();
    let command_deadline = deadline.min(started + per_command);

    let result = tokio::time::timeout_at(
        command_deadline,
        session.exec(&candidate.command, per_command),
    )
    .await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    let output = match result {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return failed_record(approved, &e.to_string(), elapsed_ms),
        Err(_) => {
            let e = if Instant::now() >= deadline {
                TransportError::DeadlineExceeded
            } else {
                TransportError::Timeout(per_command.as_secs())
            };
            tracing::debug!(
                target: "sshprobe.executor",
                command = %candidate.command,
                elapsed_ms,
                error = %e,
                "command timed out"
            );
            return failed_record(approved, &e.to_string(), elapsed_ms);
        }
    };

    let success = matches!(output.exit_code, Some(0) | None);
    let (parsed_result, error) = if success {
        (
            parsers::parse_output(candidate.category, &candidate.command, &output.stdout),
            None,
        )
    } else {
        let code = output.exit_code.unwrap_or_default();
        (Value::Null, Some(format!("exit status {code}")))
    };

    ExecutionRecord {
        command: candidate.command.clone(),
        success,
        exit_code: output.exit_code,
        stdout: output.stdout,
        stderr: output.stderr,
        parsed_result,
        execution_time_ms: elapsed_ms,
        timestamp: chrono::Utc::now(),
        risk_level: candidate.risk_level,
        category: candidate.category,
        error,
    }
}

fn failed_record(approved: &ApprovedCommand, error: &str, elapsed_ms: u64) -> ExecutionRecord {
    let c = approved.candidate();
    ExecutionRecord::failed(&c.command, c.category, c.risk_level, error, elapsed_ms)
}
