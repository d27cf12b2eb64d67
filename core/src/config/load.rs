use std::path::{Path, PathBuf};

use crate::errors::ConfigError;

use super::types::{AppConfig, DrafterProvider, LlmEndpointConfig, ScorerProvider};

const LOCAL_CONFIG: &str = "sshprobe.toml";

/// Loads config from an explicit path, or the first of `./sshprobe.toml` and
/// `<config_dir>/sshprobe/config.toml` that exists, then applies env overrides.
pub fn load(explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut cfg = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.display().to_string()));
            }
            read_file(path)?
        }
        None => match default_candidates().into_iter().find(|p| p.exists()) {
            Some(path) => read_file(&path)?,
            None => AppConfig::default(),
        },
    };
    apply_env_overrides(&mut cfg, |k| std::env::var(k).ok())?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_default() -> Result<AppConfig, ConfigError> {
    load(None)
}

pub fn load_from_path(path: &Path) -> Result<AppConfig, ConfigError> {
    load(Some(path))
}

fn default_candidates() -> Vec<PathBuf> {
    let mut out = vec![PathBuf::from(LOCAL_CONFIG)];
    if let Some(dir) = dirs::config_dir() {
        out.push(dir.join("sshprobe").join("config.toml"));
    }
    out
}

fn read_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    tracing::debug!(target: "sshprobe.config", path = %path.display(), "loaded config file");
    toml::from_str::<AppConfig>(&s).map_err(ConfigError::Parse)
}

pub(crate) fn apply_env_overrides<F>(cfg: &mut AppConfig, get: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |k: &str| get(k).filter(|v| !v.trim().is_empty());

    if let DrafterProvider::Http(c) = &mut cfg.drafter.provider {
        override_endpoint(c, &non_empty);
    }
    if let ScorerProvider::Http(c) = &mut cfg.scorer.provider {
        override_endpoint(c, &non_empty);
    }

    if let Some(v) = non_empty("SSHPROBE_MAX_CONCURRENCY") {
        cfg.executor.max_concurrency = parse_env("SSHPROBE_MAX_CONCURRENCY", &v)?;
    }
    if let Some(v) = non_empty("SSHPROBE_MAX_ITERATIONS") {
        cfg.controller.max_iterations = parse_env("SSHPROBE_MAX_ITERATIONS", &v)?;
    }
    Ok(())
}

fn override_endpoint(c: &mut LlmEndpointConfig, get: &dyn Fn(&str) -> Option<String>) {
    if let Some(v) = get("SSHPROBE_LLM_BASE_URL") {
        c.base_url = v;
    }
    if let Some(v) = get("SSHPROBE_LLM_API_KEY") {
        c.api_key = v;
    }
    if let Some(v) = get("SSHPROBE_LLM_MODEL") {
        c.model = v;
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::EnvInvalid {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.executor.max_concurrency, 3);
        assert_eq!(cfg.executor.history_capacity, 100);
        assert_eq!(cfg.controller.max_iterations, 5);
        assert_eq!(cfg.gate.max_command_length, 500);
        assert!(matches!(cfg.scorer.provider, ScorerProvider::Heuristic));
        assert!(matches!(cfg.drafter.provider, DrafterProvider::None));
    }

    #[test]
    fn loads_partial_toml_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            r#"
[executor]
max_concurrency = 5

[drafter]
provider = "http"
base_url = "http://localhost:9999/v1"
model = "local"

[controller]
feed_alternatives = true
"#
        )
        .unwrap();

        let cfg = load_from_path(f.path()).unwrap();
        assert_eq!(cfg.executor.max_concurrency, 5);
        assert_eq!(cfg.executor.global_timeout_ms, 120_000);
        assert!(cfg.controller.feed_alternatives);
        match cfg.drafter.provider {
            DrafterProvider::Http(c) => {
                assert_eq!(c.base_url, "http://localhost:9999/v1");
                assert_eq!(c.model, "local");
                assert_eq!(c.timeout_ms, 20_000);
            }
            other => panic!("unexpected provider: {:?}", other),
        }
    }

    #[test]
    fn missing_explicit_path_is_not_found() {
        let err = load_from_path(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn env_overrides_apply_and_ignore_empty_values() {
        let mut cfg = AppConfig::default();
        cfg.scorer.provider = ScorerProvider::Http(LlmEndpointConfig::default());
        apply_env_overrides(
            &mut cfg,
            env(&[
                ("SSHPROBE_LLM_API_KEY", "sk-test"),
                ("SSHPROBE_LLM_MODEL", "  "),
                ("SSHPROBE_MAX_CONCURRENCY", "7"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.executor.max_concurrency, 7);
        match &cfg.scorer.provider {
            ScorerProvider::Http(c) => {
                assert_eq!(c.api_key, "sk-test");
                assert_eq!(c.model, "gpt-4o-mini");
            }
            other => panic!("unexpected provider: {:?}", other),
        }
    }

    #[test]
    fn invalid_env_value_is_reported() {
        let mut cfg = AppConfig::default();
        let err = apply_env_overrides(&mut cfg, env(&[("SSHPROBE_MAX_ITERATIONS", "many")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvInvalid { .. }));
    }

    #[test]
    fn validation_rejects_zero_concurrency() {
        let mut cfg = AppConfig::default();
        cfg.executor.max_concurrency = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Validation(_))));
    }
}
