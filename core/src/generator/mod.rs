//! Candidate generation: classify the goal, pull vetted catalog entries and
//! optionally ask a drafter for more. Never fails; drafting problems fall back
//! to the catalog entries.

pub mod classify;
pub mod draft;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::catalog::CommandCatalog;
use crate::errors::GenerationError;
use crate::types::{CandidateCommand, Category, TaskDescription, DEFAULT_COMMAND_TIMEOUT_SECS};

pub use classify::{classify, matched_categories, ClassificationRule, RULES};
pub use draft::{build_prompt, parse_drafted, Drafter};

/// Most drafted candidates accepted per round.
pub const MAX_DRAFTED: usize = 3;

const DEFAULT_DRAFT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct CandidateGenerator {
    catalog: Arc<CommandCatalog>,
    drafter: Option<Arc<dyn Drafter>>,
    default_timeout_secs: u32,
    draft_timeout: Duration,
}

impl CandidateGenerator {
    pub fn new(catalog: Arc<CommandCatalog>, drafter: Option<Arc<dyn Drafter>>) -> Self {
        Self {
            catalog,
            drafter,
            default_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            draft_timeout: DEFAULT_DRAFT_TIMEOUT,
        }
    }

    pub fn with_default_timeout_secs(mut self, secs: u32) -> Self {
        self.default_timeout_secs = secs;
        self
    }

    pub fn with_draft_timeout(mut self, timeout: Duration) -> Self {
        self.draft_timeout = timeout;
        self
    }

    pub fn has_drafter(&self) -> bool {
        self.drafter.is_some()
    }

    /// Candidates for the goal's classified category.
    pub async fn generate(&self, task: &TaskDescription) -> Vec<CandidateCommand> {
        self.generate_in(task, classify(&task.description)).await
    }

    /// Candidates restricted to `category`. Commands already listed in
    /// `task.prior_commands` are skipped; duplicates are removed.
    pub async fn generate_in(
        &self,
        task: &TaskDescription,
        category: Category,
    ) -> Vec<CandidateCommand> {
        let mut seen: HashSet<String> = task.prior_commands.iter().cloned().collect();
        let base: Vec<CandidateCommand> = self
            .catalog
            .catalog(category, task.os_info.os_type)
            .into_iter()
            .filter(|c| seen.insert(c.command.clone()))
            .collect();

        let drafted = match self.draft(task, category, &base).await {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(
                    target: "sshprobe.generator",
                    category = %category,
                    error = %e,
                    "drafting failed; using catalog candidates"
                );
                Vec::new()
            }
        };

        let mut out = base;
        out.extend(
            drafted
                .into_iter()
                .filter(|c| seen.insert(c.command.clone()))
                .take(MAX_DRAFTED),
        );

        tracing::debug!(
            target: "sshprobe.generator",
            category = %category,
            count = out.len(),
            "generated candidates"
        );
        out
    }

    async fn draft(
        &self,
        task: &TaskDescription,
        category: Category,
        base: &[CandidateCommand],
    ) -> Result<Vec<CandidateCommand>, GenerationError> {
        let Some(drafter) = self.drafter.as_ref() else {
            return Ok(Vec::new());
        };
        let prompt = build_prompt(task, category, base);
        let raw = tokio::time::timeout(self.draft_timeout, drafter.draft(&prompt))
            .await
            .map_err(|_| GenerationError::Timeout(self.draft_timeout.as_millis() as u64))??;
        parse_drafted(&raw, category, self.default_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OsInfo, OsType, RiskLevel};
    use async_trait::async_trait;

    struct Canned(Result<String, ()>);

    #[async_trait]
    impl Drafter for Canned {
        fn name(&self) -> &str {
            "canned"
        }

        async fn draft(&self, _prompt: &str) -> Result<String, GenerationError> {
            self.0
                .clone()
                .map_err(|_| GenerationError::Unavailable("offline".into()))
        }
    }

    struct Hanging;

    #[async_trait]
    impl Drafter for Hanging {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn draft(&self, _prompt: &str) -> Result<String, GenerationError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("[]".into())
        }
    }

    fn task(desc: &str) -> TaskDescription {
        TaskDescription::new(desc, OsInfo::default())
    }

    fn generator(drafter: Option<Arc<dyn Drafter>>) -> CandidateGenerator {
        CandidateGenerator::new(Arc::new(CommandCatalog::new()), drafter)
    }

    #[tokio::test]
    async fn without_drafter_returns_catalog_entries() {
        let out = generator(None).generate(&task("check memory usage")).await;
        let cmds: Vec<_> = out.iter().map(|c| c.command.as_str()).collect();
        assert_eq!(cmds, vec!["free -m", "cat /proc/meminfo", "vmstat -s"]);
        assert!(out.iter().all(|c| c.category == Category::Memory));
    }

    #[tokio::test]
    async fn drafted_candidates_are_appended_and_deduped() {
        let raw = r#"[{"command":"free -m"},{"command":"swapon --show","riskLevel":"low"},{"command":"swapon --show"}]"#;
        let drafter: Arc<dyn Drafter> = Arc::new(Canned(Ok(raw.into())));
        let out = generator(Some(drafter)).generate(&task("memory")).await;
        let cmds: Vec<_> = out.iter().map(|c| c.command.as_str()).collect();
        assert_eq!(
            cmds,
            vec!["free -m", "cat /proc/meminfo", "vmstat -s", "swapon --show"]
        );
        assert_eq!(out[3].risk_level, RiskLevel::Low);
    }

    #[tokio::test]
    async fn drafter_failure_falls_back() {
        let drafter: Arc<dyn Drafter> = Arc::new(Canned(Err(())));
        let out = generator(Some(drafter)).generate(&task("disk space")).await;
        assert_eq!(out.len(), 3);

        let drafter: Arc<dyn Drafter> = Arc::new(Canned(Ok("no json here".into())));
        let out = generator(Some(drafter)).generate(&task("disk space")).await;
        assert_eq!(out.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn drafter_timeout_falls_back() {
        let g = generator(Some(Arc::new(Hanging))).with_draft_timeout(Duration::from_secs(5));
        let out = g.generate(&task("network interfaces")).await;
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|c| c.category == Category::Network));
    }

    #[tokio::test]
    async fn prior_commands_are_excluded() {
        let t = task("check uptime").with_prior_commands(vec!["uptime".into(), "hostname".into()]);
        let out = generator(None).generate(&t).await;
        let cmds: Vec<_> = out.iter().map(|c| c.command.as_str()).collect();
        assert_eq!(cmds, vec!["uname -a"]);
    }

    #[tokio::test]
    async fn unknown_os_uses_linux_entries() {
        let mut t = task("processes");
        t.os_info.os_type = OsType::Unknown;
        let out = generator(None).generate(&t).await;
        assert_eq!(out[0].command, "ps aux --sort=-%cpu");
    }
}
