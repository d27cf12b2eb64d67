use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use sshprobe_core::api::{AppConfig, Drafter, DrafterProvider, RemoteTransport, RiskScorer, ScorerProvider};

use crate::drafter::HttpDrafter;
use crate::scorer::{HeuristicScorer, HttpScorer};
use crate::transport::Ssh2Transport;

pub fn build_transport(cfg: &AppConfig) -> Arc<dyn RemoteTransport> {
    Arc::new(Ssh2Transport::new(Duration::from_millis(
        cfg.executor.connect_timeout_ms,
    )))
}

pub fn build_drafter(cfg: &AppConfig) -> Result<Option<Arc<dyn Drafter>>> {
    match &cfg.drafter.provider {
        DrafterProvider::None => Ok(None),
        DrafterProvider::Http(endpoint) => Ok(Some(Arc::new(HttpDrafter::new(endpoint)?))),
    }
}

pub fn build_scorer(cfg: &AppConfig) -> Result<Option<Arc<dyn RiskScorer>>> {
    match &cfg.scorer.provider {
        ScorerProvider::None => Ok(None),
        ScorerProvider::Heuristic => Ok(Some(Arc::new(HeuristicScorer::new()))),
        ScorerProvider::Http(endpoint) => Ok(Some(Arc::new(HttpScorer::new(endpoint)?))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sshprobe_core::api::LlmEndpointConfig;

    #[test]
    fn defaults_build_heuristic_scorer_and_no_drafter() {
        let cfg = AppConfig::default();
        assert!(build_drafter(&cfg).unwrap().is_none());
        assert_eq!(build_scorer(&cfg).unwrap().unwrap().name(), "heuristic");
        assert_eq!(build_transport(&cfg).name(), "ssh2");
    }

    #[test]
    fn http_providers_are_selected_from_config() {
        let mut cfg = AppConfig::default();
        cfg.drafter.provider = DrafterProvider::Http(LlmEndpointConfig::default());
        cfg.scorer.provider = ScorerProvider::Http(LlmEndpointConfig::default());
        assert_eq!(build_drafter(&cfg).unwrap().unwrap().name(), "http");
        assert_eq!(build_scorer(&cfg).unwrap().unwrap().name(), "http");

        cfg.scorer.provider = ScorerProvider::None;
        assert!(build_scorer(&cfg).unwrap().is_none());
    }
}
