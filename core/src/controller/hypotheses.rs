//! Derives hypotheses about the host from parsed evidence.

use serde_json::Value;

use super::state::{Evidence, Hypothesis, HypothesisStatus};

const MEMORY_PRESSURE_RATIO: f64 = 0.9;
const DISK_FULL_PERCENT: f64 = 90.0;
const REJECT_BELOW_CONFIDENCE: f32 = 0.3;

#[derive(Default)]
struct Tally {
    supporting: Vec<String>,
    contradicting: Vec<String>,
}

impl Tally {
    fn add(&mut self, id: &str, supports: bool) {
        let list = if supports {
            &mut self.supporting
        } else {
            &mut self.contradicting
        };
        if !list.iter().any(|x| x == id) {
            list.push(id.to_string());
        }
    }

    fn into_hypothesis(self, id: &str, description: &str) -> Option<Hypothesis> {
        let total = self.supporting.len() + self.contradicting.len();
        if total == 0 {
            return None;
        }
        let confidence = self.supporting.len() as f32 / total as f32;
        let status = if !self.contradicting.is_empty() && confidence < REJECT_BELOW_CONFIDENCE {
            HypothesisStatus::Rejected
        } else {
            HypothesisStatus::Active
        };
        Some(Hypothesis {
            id: id.to_string(),
            description: description.to_string(),
            confidence,
            supporting_evidence_ids: self.supporting,
            contradicting_evidence_ids: self.contradicting,
            status,
        })
    }
}

fn num(v: &Value, key: &str) -> Option<f64> {
    v.get(key).and_then(Value::as_f64)
}

fn memory_ratio(data: &Value) -> Option<f64> {
    num(data, "used_ratio").or_else(|| {
        let total = num(data, "total")?;
        let used = num(data, "used")?;
        (total > 0.0).then(|| used / total)
    })
}

/// Recomputes all hypotheses from the full evidence set. Ids are stable per
/// hypothesis kind.
pub fn derive(evidence: &[Evidence]) -> Vec<Hypothesis> {
    let mut memory = Tally::default();
    let mut disk = Tally::default();
    let mut cpu = Tally::default();

    let cores = evidence
        .iter()
        .filter_map(|e| num(&e.data, "cores"))
        .fold(None, |acc: Option<f64>, c| Some(acc.map_or(c, |a| a.max(c))));
    let core_sources: Vec<&str> = evidence
        .iter()
        .filter(|e| num(&e.data, "cores").is_some())
        .map(|e| e.id.as_str())
        .collect();

    for e in evidence {
        if let Some(ratio) = memory_ratio(&e.data) {
            memory.add(&e.id, ratio >= MEMORY_PRESSURE_RATIO);
        }

        if let Some(rows) = e.data.get("filesystems").and_then(Value::as_array) {
            let percents: Vec<f64> = rows
                .iter()
                .filter_map(|r| num(r, "use_percent").or_else(|| num(r, "inode_use_percent")))
                .collect();
            if !percents.is_empty() {
                disk.add(&e.id, percents.iter().any(|p| *p >= DISK_FULL_PERCENT));
            }
        }

        if let (Some(load), Some(cores)) = (num(&e.data, "load_1"), cores) {
            let saturated = load > cores;
            cpu.add(&e.id, saturated);
            for src in &core_sources {
                cpu.add(src, saturated);
            }
        }
    }

    [
        memory.into_hypothesis("memory_pressure", "Memory pressure: used memory at or above 90% of total"),
        disk.into_hypothesis("filesystem_full", "A filesystem is at or above 90% usage"),
        cpu.into_hypothesis("cpu_saturation", "CPU saturation: 1-minute load exceeds core count"),
    ]
    .into_iter()
    .flatten()
    .collect()
}
