use serde::{Deserialize, Serialize};

use crate::config::ControllerConfig;
use crate::types::Category;

use super::state::{Evidence, IterationState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    InitialInvestigation,
    GatherSystemInfo,
    AnalyzeSpecificIssue,
    AlternativeApproach,
    SynthesizeAnswer,
}

impl NextAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            NextAction::InitialInvestigation => "initial_investigation",
            NextAction::GatherSystemInfo => "gather_system_info",
            NextAction::AnalyzeSpecificIssue => "analyze_specific_issue",
            NextAction::AlternativeApproach => "alternative_approach",
            NextAction::SynthesizeAnswer => "synthesize_answer",
        }
    }
}

const BASELINE_KEYS: &[&str] = &["hostname", "uptime", "os", "os_name", "kernel_release"];

/// Whether any evidence carries hostname, uptime or OS facts.
pub fn has_baseline_facts(evidence: &[Evidence]) -> bool {
    evidence.iter().any(|e| {
        e.data
            .as_object()
            .is_some_and(|o| BASELINE_KEYS.iter().any(|k| o.contains_key(*k)))
    })
}

/// Picks the next action. Order: first iteration, synthesis threshold, task
/// categories not yet explored, missing baseline facts, anything unexplored.
pub fn think(
    state: &IterationState,
    cfg: &ControllerConfig,
    task_categories: &[Category],
) -> NextAction {
    if state.iteration == 0 {
        return NextAction::InitialInvestigation;
    }
    if state.evidence.len() >= cfg.synthesize_min_evidence
        && state.confidence > cfg.synthesize_min_confidence
    {
        return NextAction::SynthesizeAnswer;
    }
    if task_categories.iter().any(|c| !state.explored.contains(c)) {
        return NextAction::AnalyzeSpecificIssue;
    }
    if !has_baseline_facts(&state.evidence) && !state.explored.contains(&Category::SystemInfo) {
        return NextAction::GatherSystemInfo;
    }
    NextAction::AlternativeApproach
}

/// Category the action should draw candidates from. `None` means there is
/// nothing left to try.
pub fn target_category(
    action: NextAction,
    state: &IterationState,
    task_categories: &[Category],
    classified: Category,
) -> Option<Category> {
    let unexplored = |c: &&Category| !state.explored.contains(c);
    match action {
        NextAction::InitialInvestigation => Some(classified),
        NextAction::GatherSystemInfo => Some(Category::SystemInfo),
        NextAction::AnalyzeSpecificIssue => task_categories.iter().find(unexplored).copied(),
        NextAction::AlternativeApproach => Category::ALL.iter().find(unexplored).copied(),
        NextAction::SynthesizeAnswer => None,
    }
}
