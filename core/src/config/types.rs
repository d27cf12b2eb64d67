use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub gate: GateConfig,

    #[serde(default)]
    pub controller: ControllerConfig,

    #[serde(default)]
    pub audit: AuditConfig,

    #[serde(default)]
    pub events_out: EventsOutConfig,

    #[serde(default)]
    pub drafter: DrafterConfig,

    #[serde(default)]
    pub scorer: ScorerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.executor.max_concurrency == 0 {
            return Err(ConfigError::Validation(
                "executor.max_concurrency must be at least 1".into(),
            ));
        }
        if self.executor.history_capacity == 0 {
            return Err(ConfigError::Validation(
                "executor.history_capacity must be at least 1".into(),
            ));
        }
        if self.controller.max_iterations == 0 {
            return Err(ConfigError::Validation(
                "controller.max_iterations must be at least 1".into(),
            ));
        }
        if self.gate.max_command_length == 0 {
            return Err(ConfigError::Validation(
                "gate.max_command_length must be at least 1".into(),
            ));
        }
        let unit_fields = [
            ("gate.risk_reject_threshold", self.gate.risk_reject_threshold),
            (
                "controller.early_exit_confidence",
                self.controller.early_exit_confidence,
            ),
            (
                "controller.continue_below_confidence",
                self.controller.continue_below_confidence,
            ),
            (
                "controller.synthesize_min_confidence",
                self.controller.synthesize_min_confidence,
            ),
            ("controller.confidence_baseline", self.controller.confidence_baseline),
            ("controller.relevance_base", self.controller.relevance_base),
            (
                "controller.relevance_bonus_threshold",
                self.controller.relevance_bonus_threshold,
            ),
        ];
        for (name, value) in unit_fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Validation(format!(
                    "{name} must be within 0..=1 (got {value})"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    #[serde(default = "default_global_timeout_ms")]
    pub global_timeout_ms: u64,

    /// Used for drafted candidates that omit `timeoutSeconds`.
    #[serde(default = "default_command_timeout_secs")]
    pub default_command_timeout_secs: u32,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_max_concurrency() -> usize {
    3
}

fn default_global_timeout_ms() -> u64 {
    120_000
}

fn default_command_timeout_secs() -> u32 {
    crate::types::DEFAULT_COMMAND_TIMEOUT_SECS
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_history_capacity() -> usize {
    100
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            global_timeout_ms: default_global_timeout_ms(),
            default_command_timeout_secs: default_command_timeout_secs(),
            connect_timeout_ms: default_connect_timeout_ms(),
            history_capacity: default_history_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    #[serde(default = "default_max_command_length")]
    pub max_command_length: usize,

    /// Scores strictly above this value reject.
    #[serde(default = "default_risk_reject_threshold")]
    pub risk_reject_threshold: f32,

    #[serde(default)]
    pub extra_blacklist: Vec<String>,

    #[serde(default)]
    pub extra_whitelist: Vec<String>,

    #[serde(default = "default_scorer_timeout_ms")]
    pub scorer_timeout_ms: u64,
}

fn default_max_command_length() -> usize {
    500
}

fn default_risk_reject_threshold() -> f32 {
    0.7
}

fn default_scorer_timeout_ms() -> u64 {
    15_000
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_command_length: default_max_command_length(),
            risk_reject_threshold: default_risk_reject_threshold(),
            extra_blacklist: Vec::new(),
            extra_whitelist: Vec::new(),
            scorer_timeout_ms: default_scorer_timeout_ms(),
        }
    }
}

/// Think/observe heuristics. The values were tuned by trial; change them here,
/// not in the controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    #[serde(default = "default_early_exit_confidence")]
    pub early_exit_confidence: f32,

    #[serde(default = "default_continue_below_confidence")]
    pub continue_below_confidence: f32,

    #[serde(default = "default_continue_below_evidence")]
    pub continue_below_evidence: usize,

    #[serde(default = "default_synthesize_min_evidence")]
    pub synthesize_min_evidence: usize,

    #[serde(default = "default_synthesize_min_confidence")]
    pub synthesize_min_confidence: f32,

    #[serde(default = "default_confidence_baseline")]
    pub confidence_baseline: f32,

    #[serde(default = "default_confidence_step_three")]
    pub confidence_step_three: f32,

    #[serde(default = "default_confidence_step_five")]
    pub confidence_step_five: f32,

    #[serde(default = "default_confidence_relevance_bonus")]
    pub confidence_relevance_bonus: f32,

    #[serde(default = "default_relevance_bonus_threshold")]
    pub relevance_bonus_threshold: f32,

    #[serde(default = "default_relevance_base")]
    pub relevance_base: f32,

    #[serde(default = "default_relevance_keyword_bonus")]
    pub relevance_keyword_bonus: f32,

    #[serde(default)]
    pub feed_alternatives: bool,
}

fn default_max_iterations() -> u32 {
    5
}
fn default_early_exit_confidence() -> f32 {
    0.9
}
fn default_continue_below_confidence() -> f32 {
    0.8
}
fn default_continue_below_evidence() -> usize {
    5
}
fn default_synthesize_min_evidence() -> usize {
    3
}
fn default_synthesize_min_confidence() -> f32 {
    0.7
}
fn default_confidence_baseline() -> f32 {
    0.3
}
fn default_confidence_step_three() -> f32 {
    0.3
}
fn default_confidence_step_five() -> f32 {
    0.2
}
fn default_confidence_relevance_bonus() -> f32 {
    0.1
}
fn default_relevance_bonus_threshold() -> f32 {
    0.8
}
fn default_relevance_base() -> f32 {
    0.5
}
fn default_relevance_keyword_bonus() -> f32 {
    0.2
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            early_exit_confidence: default_early_exit_confidence(),
            continue_below_confidence: default_continue_below_confidence(),
            continue_below_evidence: default_continue_below_evidence(),
            synthesize_min_evidence: default_synthesize_min_evidence(),
            synthesize_min_confidence: default_synthesize_min_confidence(),
            confidence_baseline: default_confidence_baseline(),
            confidence_step_three: default_confidence_step_three(),
            confidence_step_five: default_confidence_step_five(),
            confidence_relevance_bonus: default_confidence_relevance_bonus(),
            relevance_bonus_threshold: default_relevance_bonus_threshold(),
            relevance_base: default_relevance_base(),
            relevance_keyword_bonus: default_relevance_keyword_bonus(),
            feed_alternatives: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "default_audit_capacity")]
    pub capacity: usize,
}

fn default_audit_capacity() -> usize {
    1000
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            capacity: default_audit_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsOutConfig {
    #[serde(default)]
    pub enabled: bool,

    /// File path, or `stdout:`.
    #[serde(default = "default_events_out_path")]
    pub path: String,

    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    #[serde(default = "default_drop_when_full")]
    pub drop_when_full: bool,
}

fn default_events_out_path() -> String {
    "sshprobe-events.jsonl".to_string()
}

fn default_channel_capacity() -> usize {
    2048
}

fn default_drop_when_full() -> bool {
    true
}

impl Default for EventsOutConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_events_out_path(),
            channel_capacity: default_channel_capacity(),
            drop_when_full: default_drop_when_full(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmEndpointConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default = "default_llm_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_llm_timeout_ms() -> u64 {
    20_000
}

impl Default for LlmEndpointConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            api_key: String::new(),
            model: default_llm_model(),
            timeout_ms: default_llm_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrafterConfig {
    #[serde(default = "default_drafter_provider")]
    #[serde(flatten)]
    pub provider: DrafterProvider,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider")]
pub enum DrafterProvider {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "http")]
    Http(LlmEndpointConfig),
}

fn default_drafter_provider() -> DrafterProvider {
    DrafterProvider::None
}

impl Default for DrafterConfig {
    fn default() -> Self {
        Self {
            provider: default_drafter_provider(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorerConfig {
    #[serde(default = "default_scorer_provider")]
    #[serde(flatten)]
    pub provider: ScorerProvider,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider")]
pub enum ScorerProvider {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "heuristic")]
    Heuristic,
    #[serde(rename = "http")]
    Http(LlmEndpointConfig),
}

fn default_scorer_provider() -> ScorerProvider {
    ScorerProvider::Heuristic
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            provider: default_scorer_provider(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// When set, logs are also written to a daily-rolling file here.
    #[serde(default)]
    pub directory: Option<String>,

    #[serde(default = "default_log_file_prefix")]
    pub file_prefix: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file_prefix() -> String {
    "sshprobe.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
            file_prefix: default_log_file_prefix(),
        }
    }
}
