//! Offline scorer: declared risk level plus a few lexical nudges.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use sshprobe_core::api::{CandidateCommand, RiskAssessment, RiskAssessmentError, RiskLevel, RiskScorer};

lazy_static! {
    static ref MUTATING_VERB: Regex = Regex::new(
        r"(?i)\b(write|set|install|remove|delete|kill|restart|enable|disable|update|upgrade|mount|umount|flush|reset)\b"
    )
    .unwrap();
    static ref PRIVILEGED_PATH: Regex =
        Regex::new(r"(/etc/shadow|/etc/sudoers|/root/|\.ssh/|id_rsa|\.pem\b)").unwrap();
}

const MUTATING_NUDGE: f32 = 0.3;
const PRIVILEGED_NUDGE: f32 = 0.3;
const PIPE_NUDGE: f32 = 0.1;

#[derive(Debug, Clone, Default)]
pub struct HeuristicScorer;

impl HeuristicScorer {
    pub fn new() -> Self {
        Self
    }

    fn base(level: RiskLevel) -> f32 {
        match level {
            RiskLevel::Safe => 0.0,
            RiskLevel::Low => 0.2,
            RiskLevel::Medium => 0.5,
            RiskLevel::High => 0.9,
        }
    }

    pub fn score(&self, candidate: &CandidateCommand) -> RiskAssessment {
        let mut score = Self::base(candidate.risk_level);
        let mut concerns = Vec::new();
        let cmd = candidate.command.as_str();

        if let Some(m) = MUTATING_VERB.find(cmd) {
            score += MUTATING_NUDGE;
            concerns.push(format!("mutating verb `{}`", m.as_str()));
        }
        if let Some(m) = PRIVILEGED_PATH.find(cmd) {
            score += PRIVILEGED_NUDGE;
            concerns.push(format!("touches sensitive path `{}`", m.as_str()));
        }
        if cmd.contains('|') {
            score += PIPE_NUDGE;
            concerns.push("pipeline".to_string());
        }

        let score = score.min(1.0);
        RiskAssessment {
            score,
            reasoning: format!(
                "declared {} risk, {} concern(s)",
                candidate.risk_level,
                concerns.len()
            ),
            concerns,
        }
    }
}

#[async_trait]
impl RiskScorer for HeuristicScorer {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn assess(
        &self,
        candidate: &CandidateCommand,
    ) -> Result<RiskAssessment, RiskAssessmentError> {
        Ok(self.score(candidate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sshprobe_core::api::Category;

    fn c(cmd: &str, risk: RiskLevel) -> CandidateCommand {
        CandidateCommand::new(cmd, "t", Category::SystemInfo, risk)
    }

    #[test]
    fn plain_low_risk_read_stays_under_default_threshold() {
        let a = HeuristicScorer::new().score(&c("last -n 5", RiskLevel::Low));
        assert!((a.score - 0.2).abs() < f32::EPSILON);
        assert!(a.concerns.is_empty());
    }

    #[test]
    fn mutating_verbs_push_medium_over_threshold() {
        let a = HeuristicScorer::new().score(&c("nmcli connection reset eth0", RiskLevel::Medium));
        assert!(a.score > 0.7, "{}", a.score);
        assert_eq!(a.concerns.len(), 1);
    }

    #[test]
    fn sensitive_paths_are_flagged() {
        let a = HeuristicScorer::new().score(&c("cat /etc/shadow", RiskLevel::Low));
        assert!(a.concerns.iter().any(|s| s.contains("/etc/shadow")));
        assert!(a.score >= 0.5);
    }

    #[test]
    fn score_is_capped() {
        let a = HeuristicScorer::new().score(&c("kill 1 | cat /root/x", RiskLevel::High));
        assert_eq!(a.score, 1.0);
    }
}
