//! Layered security gate. Every candidate passes blacklist, dangerous-pattern
//! scan, whitelist, structural checks and (for non-safe risk) external scoring
//! before it can become an [`ApprovedCommand`].

pub mod decision;
pub mod rules;
pub mod r#trait;

use std::sync::Arc;
use std::time::Duration;

use crate::audit::{AuditAction, AuditEntry, AuditLog, AuditResult};
use crate::config::GateConfig;
use crate::errors::RiskAssessmentError;
use crate::types::{CandidateCommand, RiskLevel};

pub use decision::{ApprovedCommand, GateStage, RejectedCommand, ValidationOutcome};
pub use r#trait::{RiskAssessment, RiskScorer};
pub use rules::GateRules;

#[derive(Clone)]
pub struct SecurityGate {
    cfg: GateConfig,
    rules: Arc<GateRules>,
    scorer: Option<Arc<dyn RiskScorer>>,
    audit: Arc<AuditLog>,
    session_id: String,
}

impl SecurityGate {
    pub fn new(
        cfg: GateConfig,
        audit: Arc<AuditLog>,
        scorer: Option<Arc<dyn RiskScorer>>,
    ) -> Self {
        let rules = Arc::new(GateRules::new(&cfg));
        Self {
            cfg,
            rules,
            scorer,
            audit,
            session_id: String::new(),
        }
    }

    /// Tags audit entries with the given session id.
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn has_scorer(&self) -> bool {
        self.scorer.is_some()
    }

    /// Runs every stage in order; the first rejecting stage wins. The verdict
    /// is audited whether or not it approves.
    pub async fn validate(&self, candidate: &CandidateCommand) -> ValidationOutcome {
        let outcome = self.evaluate(candidate).await;
        self.audit_outcome(candidate, &outcome);
        outcome
    }

    /// Validates and, on approval, wraps the candidate for the executor.
    pub async fn approve(
        &self,
        candidate: CandidateCommand,
    ) -> Result<ApprovedCommand, RejectedCommand> {
        let outcome = self.validate(&candidate).await;
        if outcome.approved {
            Ok(ApprovedCommand::new(candidate, outcome.reason))
        } else {
            Err(RejectedCommand { candidate, outcome })
        }
    }

    /// Splits candidates into approved and rejected, preserving order.
    pub async fn approve_all(
        &self,
        candidates: Vec<CandidateCommand>,
    ) -> (Vec<ApprovedCommand>, Vec<RejectedCommand>) {
        let mut approved = Vec::new();
        let mut rejected = Vec::new();
        for candidate in candidates {
            match self.approve(candidate).await {
                Ok(a) => approved.push(a),
                Err(r) => rejected.push(r),
            }
        }
        (approved, rejected)
    }

    async fn evaluate(&self, candidate: &CandidateCommand) -> ValidationOutcome {
        let command = candidate.command.as_str();

        if let Some(hit) = self.rules.blacklist_hit(command) {
            return ValidationOutcome::reject(
                GateStage::Blacklist,
                format!("blacklisted fragment '{}'", hit.fragment.trim()),
            )
            .suggest(hit.alternative);
        }

        if let Some(label) = self.rules.dangerous_pattern_hit(command) {
            return ValidationOutcome::reject(
                GateStage::Pattern,
                format!("dangerous pattern: {label}"),
            );
        }

        if let Some(token) = self.rules.whitelisted(command) {
            return ValidationOutcome::approve(
                GateStage::Whitelist,
                format!("whitelisted read-only utility '{token}'"),
            );
        }

        let trimmed = command.trim();
        if trimmed.is_empty() {
            return ValidationOutcome::reject(GateStage::Structural, "empty command");
        }
        let len = command.chars().count();
        if len > self.cfg.max_command_length {
            return ValidationOutcome::reject(
                GateStage::Structural,
                format!(
                    "command length {len} exceeds limit of {}",
                    self.cfg.max_command_length
                ),
            );
        }
        if let Some(label) = self.rules.residual_pattern_hit(command) {
            return ValidationOutcome::reject(
                GateStage::Structural,
                format!("residual substitution: {label}"),
            );
        }

        if candidate.risk_level == RiskLevel::Safe {
            return ValidationOutcome::approve(
                GateStage::Declared,
                "declared safe and passed structural checks",
            );
        }

        self.score(candidate).await
    }

    async fn score(&self, candidate: &CandidateCommand) -> ValidationOutcome {
        let Some(scorer) = self.scorer.as_ref() else {
            return ValidationOutcome::reject(
                GateStage::RiskScore,
                format!(
                    "risk assessment unavailable for {} risk command",
                    candidate.risk_level
                ),
            );
        };

        let timeout_ms = self.cfg.scorer_timeout_ms;
        let result = match tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            scorer.assess(candidate),
        )
        .await
        {
            Ok(r) => r,
            Err(_) => Err(RiskAssessmentError::Timeout(timeout_ms)),
        };

        match result {
            Ok(assessment) if !(0.0..=1.0).contains(&assessment.score) => {
                tracing::warn!(
                    target: "sshprobe.gate",
                    scorer = %scorer.name(),
                    score = assessment.score,
                    "risk score out of range"
                );
                ValidationOutcome::reject(
                    GateStage::RiskScore,
                    format!(
                        "risk assessment failed: score {} out of range",
                        assessment.score
                    ),
                )
            }
            Ok(assessment) if assessment.score > self.cfg.risk_reject_threshold => {
                let mut reason = format!(
                    "risk score {:.2} exceeds threshold {:.2}",
                    assessment.score, self.cfg.risk_reject_threshold
                );
                if !assessment.reasoning.is_empty() {
                    reason.push_str(": ");
                    reason.push_str(&assessment.reasoning);
                }
                ValidationOutcome::reject(GateStage::RiskScore, reason)
            }
            Ok(assessment) => ValidationOutcome::approve(
                GateStage::RiskScore,
                format!("risk score {:.2} within threshold", assessment.score),
            ),
            Err(e) => {
                tracing::warn!(
                    target: "sshprobe.gate",
                    scorer = %scorer.name(),
                    error = %e,
                    "risk scorer failed; rejecting"
                );
                ValidationOutcome::reject(
                    GateStage::RiskScore,
                    format!("risk assessment failed: {e}"),
                )
            }
        }
    }

    fn audit_outcome(&self, candidate: &CandidateCommand, outcome: &ValidationOutcome) {
        let (action, result) = if outcome.approved {
            (AuditAction::Validate, AuditResult::Success)
        } else {
            (AuditAction::Block, AuditResult::Blocked)
        };
        tracing::debug!(
            target: "sshprobe.gate",
            command = %candidate.command,
            approved = outcome.approved,
            stage = ?outcome.stage,
            reason = %outcome.reason,
            "gate verdict"
        );
        self.audit.record(
            AuditEntry::new(
                &self.session_id,
                &candidate.command,
                action,
                result,
                candidate.risk_level,
            )
            .reason(outcome.reason.clone()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedScorer {
        score: f32,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RiskScorer for FixedScorer {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn assess(
            &self,
            _candidate: &CandidateCommand,
        ) -> Result<RiskAssessment, RiskAssessmentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(RiskAssessment {
                score: self.score,
                reasoning: "fixed".into(),
                concerns: vec![],
            })
        }
    }

    struct FailingScorer;

    #[async_trait]
    impl RiskScorer for FailingScorer {
        fn name(&self) -> &str {
            "failing"
        }

        async fn assess(
            &self,
            _candidate: &CandidateCommand,
        ) -> Result<RiskAssessment, RiskAssessmentError> {
            Err(RiskAssessmentError::Unavailable("boom".into()))
        }
    }

    fn gate_with(scorer: Option<Arc<dyn RiskScorer>>) -> (SecurityGate, Arc<AuditLog>) {
        let audit = Arc::new(AuditLog::new(100));
        let gate = SecurityGate::new(GateConfig::default(), audit.clone(), scorer)
            .with_session("s-1");
        (gate, audit)
    }

    fn cand(cmd: &str, risk: RiskLevel) -> CandidateCommand {
        CandidateCommand::new(cmd, "test", Category::SystemInfo, risk)
    }

    #[tokio::test]
    async fn blacklist_rejects_with_alternative() {
        let (gate, audit) = gate_with(None);
        let out = gate.validate(&cand("rm -rf /tmp/x; echo done", RiskLevel::Safe)).await;
        assert!(!out.approved);
        assert_eq!(out.stage, GateStage::Blacklist);
        assert!(out.suggested_alternative.as_deref().is_some_and(|s| !s.is_empty()));

        let entries = audit.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::Block);
        assert_eq!(entries[0].result, AuditResult::Blocked);
        assert_eq!(entries[0].session_id, "s-1");
    }

    #[tokio::test]
    async fn whitelist_skips_scorer() {
        let scorer = Arc::new(FixedScorer {
            score: 0.99,
            calls: AtomicUsize::new(0),
        });
        let (gate, _) = gate_with(Some(scorer.clone()));
        let out = gate.validate(&cand("df -h", RiskLevel::High)).await;
        assert!(out.approved);
        assert_eq!(out.stage, GateStage::Whitelist);
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn chaining_rejected_even_when_whitelisted_prefix() {
        let (gate, _) = gate_with(None);
        let out = gate.validate(&cand("uptime && id", RiskLevel::Safe)).await;
        assert!(!out.approved);
        assert_eq!(out.stage, GateStage::Pattern);
    }

    #[tokio::test]
    async fn structural_limits() {
        let (gate, _) = gate_with(None);
        let out = gate.validate(&cand("   ", RiskLevel::Safe)).await;
        assert_eq!(out.reason, "empty command");

        let long = format!("echo {}", "a".repeat(600));
        let out = gate.validate(&cand(&long, RiskLevel::Safe)).await;
        assert!(!out.approved);
        assert!(out.reason.contains("exceeds limit"));

        let out = gate.validate(&cand("echo ${HOME}", RiskLevel::Safe)).await;
        assert!(!out.approved);
        assert_eq!(out.stage, GateStage::Structural);
    }

    #[tokio::test]
    async fn scorer_threshold_and_failure() {
        let high = Arc::new(FixedScorer {
            score: 0.8,
            calls: AtomicUsize::new(0),
        });
        let (gate, _) = gate_with(Some(high));
        let out = gate.validate(&cand("systemctl status nginx", RiskLevel::Medium)).await;
        assert!(!out.approved);
        assert!(out.reason.contains("exceeds threshold"));

        let low = Arc::new(FixedScorer {
            score: 0.7,
            calls: AtomicUsize::new(0),
        });
        let (gate, _) = gate_with(Some(low));
        let out = gate.validate(&cand("systemctl status nginx", RiskLevel::Medium)).await;
        assert!(out.approved, "{}", out.reason);

        let (gate, _) = gate_with(Some(Arc::new(FailingScorer)));
        let out = gate.validate(&cand("systemctl status nginx", RiskLevel::Low)).await;
        assert!(!out.approved);
        assert!(out.reason.contains("assessment failed"));

        let out = gate.validate(&cand("systemctl status nginx", RiskLevel::Safe)).await;
        assert!(out.approved);
    }

    #[tokio::test]
    async fn missing_scorer_rejects_non_safe() {
        let (gate, _) = gate_with(None);
        let out = gate.validate(&cand("systemctl status sshd", RiskLevel::Low)).await;
        assert!(!out.approved);
        assert!(out.reason.contains("unavailable"));
    }

    #[tokio::test]
    async fn approve_wraps_candidate() {
        let (gate, audit) = gate_with(None);
        let approved = gate.approve(cand("uptime", RiskLevel::Safe)).await.unwrap();
        assert_eq!(approved.command(), "uptime");
        let rejected = gate.approve(cand("reboot", RiskLevel::Safe)).await.unwrap_err();
        assert_eq!(rejected.outcome.suggested_alternative.as_deref(), Some("uptime"));
        assert_eq!(audit.len(), 2);
    }
}
