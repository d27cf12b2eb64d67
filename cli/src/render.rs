use std::fmt::Write as _;

use sshprobe_core::api::{CandidateCommand, HypothesisStatus, ProbeOutcome, ValidationOutcome};

pub fn outcome_text(outcome: &ProbeOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "session {}", outcome.session_id);
    let _ = writeln!(out, "{}", outcome.message);
    let _ = writeln!(
        out,
        "iterations: {}  confidence: {:.2}",
        outcome.iterations, outcome.confidence
    );

    if !outcome.records.is_empty() {
        let _ = writeln!(out, "\ncommands:");
        for r in &outcome.records {
            let status = if r.success { "ok" } else { "FAIL" };
            let _ = write!(out, "  [{status:>4}] {} ({} ms)", r.command, r.execution_time_ms);
            if let Some(err) = &r.error {
                let _ = write!(out, ": {err}");
            }
            out.push('\n');
        }
    }

    if !outcome.rejected.is_empty() {
        let _ = writeln!(out, "\nblocked by the security gate:");
        for r in &outcome.rejected {
            let _ = write!(out, "  {}: {}", r.candidate.command, r.outcome.reason);
            if let Some(alt) = &r.outcome.suggested_alternative {
                let _ = write!(out, " (try `{alt}`)");
            }
            out.push('\n');
        }
    }

    let active: Vec<_> = outcome
        .hypotheses
        .iter()
        .filter(|h| h.status == HypothesisStatus::Active)
        .collect();
    if !active.is_empty() {
        let _ = writeln!(out, "\nhypotheses:");
        for h in active {
            let _ = writeln!(out, "  {} ({:.2})", h.description, h.confidence);
        }
    }
    out
}

pub fn validation_text(command: &str, outcome: &ValidationOutcome) -> String {
    let verdict = if outcome.approved { "APPROVED" } else { "REJECTED" };
    let mut out = format!("{verdict}: {command}\n  {}\n", outcome.reason);
    if let Some(alt) = &outcome.suggested_alternative {
        let _ = writeln!(out, "  suggested alternative: {alt}");
    }
    out
}

pub fn catalog_text(rows: &[CandidateCommand]) -> String {
    let mut out = String::new();
    let mut current = None;
    for c in rows {
        if current != Some(c.category) {
            let _ = writeln!(out, "{}:", c.category);
            current = Some(c.category);
        }
        let _ = writeln!(
            out,
            "  {:<40} {} ({}s)",
            c.command, c.purpose, c.timeout_seconds
        );
    }
    out
}
