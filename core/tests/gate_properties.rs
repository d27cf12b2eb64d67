mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use sshprobe_core::api::{AuditLog, Category, CommandCatalog, OsType, RiskLevel, SecurityGate};
use sshprobe_core::config::GateConfig;
use sshprobe_core::gate::rules::GateRules;

use common::{candidate, CountingScorer, ThrowingScorer};

fn gate_with(scorer: Option<Arc<dyn sshprobe_core::api::RiskScorer>>) -> (SecurityGate, Arc<AuditLog>) {
    let audit = Arc::new(AuditLog::new(500));
    let gate = SecurityGate::new(GateConfig::default(), audit.clone(), scorer).with_session("s-gate");
    (gate, audit)
}

#[tokio::test]
async fn destructive_recursive_delete_is_blocked_with_alternative() {
    let rules = GateRules::new(&GateConfig::default());
    let cmd = "rm -rf /tmp/x; echo done";
    assert!(rules.blacklist_hit(cmd).is_some());
    assert!(rules.dangerous_pattern_hit(cmd).is_some());

    let (gate, audit) = gate_with(None);
    let outcome = gate
        .validate(&candidate(cmd, Category::Disk, RiskLevel::High))
        .await;
    assert!(!outcome.approved);
    let alt = outcome.suggested_alternative.unwrap_or_default();
    assert!(!alt.trim().is_empty());
    assert_eq!(audit.blocked().len(), 1);
}

#[tokio::test]
async fn every_catalog_entry_passes_the_gate() {
    let counting = CountingScorer::new(1.0);
    let (gate, _) = gate_with(Some(counting.clone()));
    let catalog = CommandCatalog::new();
    for os in [OsType::Linux, OsType::Windows, OsType::Macos] {
        for category in Category::ALL {
            for c in catalog.catalog(category, os) {
                let outcome = gate.validate(&c).await;
                assert!(
                    outcome.approved,
                    "{os} {category} `{}` rejected: {}",
                    c.command,
                    outcome.reason
                );
            }
        }
    }
    // Catalog entries are safe; the scorer is never consulted.
    assert_eq!(counting.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn verdicts_are_idempotent() {
    let (gate, _) = gate_with(Some(CountingScorer::new(0.4)));
    let inputs = [
        candidate("uptime", Category::SystemInfo, RiskLevel::Safe),
        candidate("rm -rf /", Category::Disk, RiskLevel::High),
        candidate("ls /var/log | xargs cat", Category::Disk, RiskLevel::Low),
        candidate("last -n 5", Category::SystemInfo, RiskLevel::Low),
        candidate("", Category::SystemInfo, RiskLevel::Safe),
    ];
    for c in &inputs {
        let first = gate.validate(c).await;
        let second = gate.validate(c).await;
        assert_eq!(first.approved, second.approved, "{}", c.command);
        assert_eq!(first.reason, second.reason, "{}", c.command);
        assert_eq!(first.stage, second.stage, "{}", c.command);
    }
}

#[tokio::test]
async fn failing_scorer_rejects_only_non_safe_commands() {
    let (gate, audit) = gate_with(Some(Arc::new(ThrowingScorer)));

    let risky = gate
        .validate(&candidate("last -n 5", Category::SystemInfo, RiskLevel::Medium))
        .await;
    assert!(!risky.approved);
    assert!(risky.reason.contains("assessment failed"), "{}", risky.reason);

    let safe = gate
        .validate(&candidate("last -n 5", Category::SystemInfo, RiskLevel::Safe))
        .await;
    assert!(safe.approved, "{}", safe.reason);

    assert_eq!(audit.blocked().len(), 1);
}

#[tokio::test]
async fn scores_above_threshold_reject_and_below_approve() {
    let (strict, _) = gate_with(Some(CountingScorer::new(0.95)));
    let (lenient, _) = gate_with(Some(CountingScorer::new(0.1)));
    let c = candidate("last -n 5", Category::SystemInfo, RiskLevel::Low);

    let rejected = strict.validate(&c).await;
    assert!(!rejected.approved);
    assert!(rejected.reason.contains("exceeds threshold"), "{}", rejected.reason);

    assert!(lenient.validate(&c).await.approved);
}

#[tokio::test]
async fn approve_all_partitions_and_preserves_order() {
    let (gate, _) = gate_with(None);
    let batch = vec![
        candidate("uptime", Category::SystemInfo, RiskLevel::Safe),
        candidate("shutdown -h now", Category::SystemInfo, RiskLevel::High),
        candidate("hostname", Category::SystemInfo, RiskLevel::Safe),
        candidate("last -n 5", Category::SystemInfo, RiskLevel::Low),
    ];
    let (approved, rejected) = gate.approve_all(batch).await;
    let approved: Vec<&str> = approved.iter().map(|a| a.command()).collect();
    assert_eq!(approved, vec!["uptime", "hostname"]);
    let rejected: Vec<&str> = rejected.iter().map(|r| r.candidate.command.as_str()).collect();
    assert_eq!(rejected, vec!["shutdown -h now", "last -n 5"]);
}
