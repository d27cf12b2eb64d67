use std::collections::HashSet;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::config::ControllerConfig;
use crate::executor::{is_parse_failed, ExecutionRecord};

use super::state::Evidence;

const RELIABILITY_PARSED: f32 = 0.9;
const RELIABILITY_RAW: f32 = 0.6;

/// Lowercase description words of at least three characters.
pub fn description_keywords(description: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    description
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() >= 3)
        .filter(|w| seen.insert(w.to_string()))
        .map(str::to_string)
        .collect()
}

fn target_terms(record: &ExecutionRecord) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    if let Some(obj) = record.parsed_result.as_object() {
        for (k, v) in obj {
            terms.push(k.to_lowercase());
            if let Some(inner) = v.as_object() {
                terms.extend(inner.keys().map(|k| k.to_lowercase()));
            }
            if let Some(first) = v.as_array().and_then(|a| a.first()).and_then(Value::as_object) {
                terms.extend(first.keys().map(|k| k.to_lowercase()));
            }
        }
    }
    terms.extend(record.category.as_str().split('_').map(str::to_string));
    terms.extend(
        record
            .command
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_string),
    );
    terms
}

/// `base + bonus × matches`, capped at 1.0. A keyword matches when any key,
/// category word or command token contains it.
pub fn relevance(record: &ExecutionRecord, keywords: &[String], cfg: &ControllerConfig) -> f32 {
    let terms = target_terms(record);
    let matches = keywords
        .iter()
        .filter(|k| terms.iter().any(|t| t.contains(k.as_str())))
        .count();
    (cfg.relevance_base + cfg.relevance_keyword_bonus * matches as f32).min(1.0)
}

/// Evidence for every successful record.
pub fn collect_evidence(
    records: &[ExecutionRecord],
    description: &str,
    cfg: &ControllerConfig,
) -> Vec<Evidence> {
    let keywords = description_keywords(description);
    records
        .iter()
        .filter(|r| r.success)
        .map(|r| Evidence {
            id: Uuid::new_v4().to_string(),
            source: r.command.clone(),
            category: r.category,
            data: r.parsed_result.clone(),
            reliability: if is_parse_failed(&r.parsed_result) {
                RELIABILITY_RAW
            } else {
                RELIABILITY_PARSED
            },
            relevance_score: relevance(r, &keywords, cfg),
            timestamp: Utc::now(),
        })
        .collect()
}

/// Confidence as a step function of evidence volume, plus a relevance bonus.
pub fn confidence(evidence: &[Evidence], cfg: &ControllerConfig) -> f32 {
    if evidence.is_empty() {
        return 0.0;
    }
    let mut c = cfg.confidence_baseline;
    if evidence.len() >= 3 {
        c += cfg.confidence_step_three;
    }
    if evidence.len() >= 5 {
        c += cfg.confidence_step_five;
    }
    if evidence
        .iter()
        .any(|e| e.relevance_score > cfg.relevance_bonus_threshold)
    {
        c += cfg.confidence_relevance_bonus;
    }
    c.min(1.0)
}

pub fn should_continue(confidence: f32, evidence_len: usize, cfg: &ControllerConfig) -> bool {
    confidence < cfg.continue_below_confidence && evidence_len < cfg.continue_below_evidence
}
