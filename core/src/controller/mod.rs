//! Think-act-observe loop driving generator, gate and executor until enough
//! evidence is collected or the iteration budget runs out.

pub mod hypotheses;
pub mod observe;
pub mod state;
pub mod think;

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use serde::Serialize;

use crate::config::ControllerConfig;
use crate::errors::{CoreError, PreconditionError};
use crate::events_out::{emit_event, EventsOutTx};
use crate::executor::{ExecuteOptions, ExecutionRecord, RemoteExecutor};
use crate::gate::{RejectedCommand, SecurityGate};
use crate::generator::{classify, matched_categories, CandidateGenerator};
use crate::types::{CandidateCommand, Category, ConnectionDescriptor, RiskLevel, TaskDescription};

pub use state::{
    Evidence, Hypothesis, HypothesisStatus, IterationState, OutcomeStatus, ProbeOutcome,
};
pub use think::NextAction;

/// What one act step produced.
struct Round {
    records: Vec<ExecutionRecord>,
    rejected: Vec<RejectedCommand>,
}

#[derive(Serialize)]
struct IterationEvent<'a> {
    session_id: &'a str,
    iteration: u32,
    action: NextAction,
    category: Option<Category>,
    records: usize,
    rejected: usize,
    evidence: usize,
    confidence: f32,
}

pub struct IterationController {
    cfg: ControllerConfig,
    generator: CandidateGenerator,
    gate: SecurityGate,
    executor: RemoteExecutor,
    options: ExecuteOptions,
    events: Option<EventsOutTx>,
    session_id: String,
}

impl IterationController {
    pub fn new(
        cfg: ControllerConfig,
        generator: CandidateGenerator,
        gate: SecurityGate,
        executor: RemoteExecutor,
        options: ExecuteOptions,
    ) -> Self {
        let session_id = gate.session_id().to_string();
        Self {
            cfg,
            generator,
            gate,
            executor,
            options,
            events: None,
            session_id,
        }
    }

    pub fn with_events(mut self, events: Option<EventsOutTx>) -> Self {
        self.events = events;
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn executor(&self) -> &RemoteExecutor {
        &self.executor
    }

    /// Runs the loop to completion. Never fails: errors and panics inside an
    /// iteration end the loop with a degraded outcome that keeps the evidence
    /// gathered so far.
    pub async fn run(
        &self,
        task: &TaskDescription,
        connection: &ConnectionDescriptor,
    ) -> ProbeOutcome {
        let mut state = IterationState::new(self.cfg.max_iterations.max(1));
        let mut records: Vec<ExecutionRecord> = Vec::new();
        let mut rejected: Vec<RejectedCommand> = Vec::new();

        let precondition = if task.description.trim().is_empty() {
            Err(PreconditionError::EmptyDescription)
        } else {
            connection.validate()
        };
        if let Err(e) = precondition {
            state.completed = true;
            return self.outcome(state, records, rejected, Some(CoreError::from(e).to_string()));
        }

        let classified = classify(&task.description);
        let task_categories = matched_categories(&task.description);
        let mut working = task.clone();
        let mut alternatives: Vec<CandidateCommand> = Vec::new();
        let mut failure: Option<String> = None;

        while state.iteration < state.max_iterations {
            let action = think::think(&state, &self.cfg, &task_categories);
            state.actions.push(action);
            if action == NextAction::SynthesizeAnswer {
                break;
            }
            let Some(category) =
                think::target_category(action, &state, &task_categories, classified)
            else {
                tracing::debug!(
                    target: "sshprobe.controller",
                    iteration = state.iteration,
                    "no unexplored categories left"
                );
                break;
            };

            let extra = std::mem::take(&mut alternatives);
            let step = AssertUnwindSafe(self.act(&working, category, extra, connection))
                .catch_unwind()
                .await;
            state.iteration += 1;
            state.mark_explored(category);

            let round = match step {
                Ok(Ok(round)) => round,
                Ok(Err(e)) => {
                    tracing::warn!(
                        target: "sshprobe.controller",
                        iteration = state.iteration,
                        error = %e,
                        "iteration failed"
                    );
                    failure = Some(e.to_string());
                    break;
                }
                Err(panic) => {
                    let msg = panic_message(panic.as_ref());
                    tracing::error!(
                        target: "sshprobe.controller",
                        iteration = state.iteration,
                        panic = %msg,
                        "iteration panicked"
                    );
                    failure = Some(format!("internal error: {msg}"));
                    break;
                }
            };

            for r in &round.records {
                if !working.prior_commands.contains(&r.command) {
                    working.prior_commands.push(r.command.clone());
                }
            }
            if self.cfg.feed_alternatives {
                alternatives = suggested_alternatives(&round.rejected, &working.prior_commands);
            }

            let keep_going = self.observe(&mut state, &task.description, &round.records);

            emit_event(
                self.events.as_ref(),
                "iteration",
                &IterationEvent {
                    session_id: &self.session_id,
                    iteration: state.iteration,
                    action,
                    category: Some(category),
                    records: round.records.len(),
                    rejected: round.rejected.len(),
                    evidence: state.evidence.len(),
                    confidence: state.confidence,
                },
            );
            tracing::info!(
                target: "sshprobe.controller",
                iteration = state.iteration,
                action = action.as_str(),
                category = %category,
                records = round.records.len(),
                rejected = round.rejected.len(),
                evidence = state.evidence.len(),
                confidence = state.confidence,
                "iteration complete"
            );

            records.extend(round.records);
            rejected.extend(round.rejected);

            if state.confidence >= self.cfg.early_exit_confidence || !keep_going {
                break;
            }
        }

        state.completed = true;
        self.outcome(state, records, rejected, failure)
    }

    /// Generate for `category`, gate everything, execute the survivors.
    async fn act(
        &self,
        task: &TaskDescription,
        category: Category,
        extra: Vec<CandidateCommand>,
        connection: &ConnectionDescriptor,
    ) -> Result<Round, CoreError> {
        let mut candidates = self.generator.generate_in(task, category).await;
        for alt in extra {
            if !candidates.iter().any(|c| c.command == alt.command) {
                candidates.push(alt);
            }
        }

        let (approved, rejected) = self.gate.approve_all(candidates).await;
        let records = self
            .executor
            .execute_batch(approved, connection, self.options)
            .await?;
        Ok(Round { records, rejected })
    }

    /// Folds new records into evidence, confidence and hypotheses. Returns the
    /// continuation signal.
    fn observe(
        &self,
        state: &mut IterationState,
        description: &str,
        records: &[ExecutionRecord],
    ) -> bool {
        let fresh = observe::collect_evidence(records, description, &self.cfg);
        state.evidence.extend(fresh);
        let computed = observe::confidence(&state.evidence, &self.cfg);
        state.confidence = state.confidence.max(computed);
        state.hypotheses = hypotheses::derive(&state.evidence);
        observe::should_continue(state.confidence, state.evidence.len(), &self.cfg)
    }

    fn outcome(
        &self,
        state: IterationState,
        records: Vec<ExecutionRecord>,
        rejected: Vec<RejectedCommand>,
        failure: Option<String>,
    ) -> ProbeOutcome {
        let evidence_count = state.evidence.len();
        let (status, message) = match (&failure, evidence_count) {
            (Some(err), n) => (
                OutcomeStatus::Degraded,
                format!("investigation stopped early: {err}; kept {n} evidence item(s)"),
            ),
            (None, 0) => (
                OutcomeStatus::NoEvidence,
                format!(
                    "no evidence could be collected: {} command(s) executed, {} rejected by the security gate",
                    records.len(),
                    rejected.len()
                ),
            ),
            (None, n) => (
                OutcomeStatus::EvidenceCollected,
                format!(
                    "collected {n} evidence item(s) over {} iteration(s), confidence {:.2}",
                    state.iteration, state.confidence
                ),
            ),
        };

        ProbeOutcome {
            session_id: self.session_id.clone(),
            records,
            rejected,
            evidence: state.evidence,
            hypotheses: state.hypotheses,
            confidence: state.confidence,
            iterations: state.iteration,
            completed: state.completed,
            status,
            message,
            actions: state.actions,
        }
    }
}

/// Gate suggestions offered back to the next round as low-risk candidates.
fn suggested_alternatives(rejected: &[RejectedCommand], prior: &[String]) -> Vec<CandidateCommand> {
    let mut out: Vec<CandidateCommand> = Vec::new();
    for r in rejected {
        let Some(alt) = r.outcome.suggested_alternative.as_deref() else {
            continue;
        };
        if prior.iter().any(|p| p == alt) || out.iter().any(|c| c.command == alt) {
            continue;
        }
        out.push(CandidateCommand::new(
            alt,
            format!("suggested alternative to `{}`", r.candidate.command),
            r.candidate.category,
            RiskLevel::Low,
        ));
    }
    out
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
