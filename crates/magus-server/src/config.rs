use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};

use magus_api::inference::{DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS, InferenceConfig};

pub const DEV_SECRET: &str = "dev-secret-change-me";

/// Signing secrets that MUST NOT be used in production.
const PLACEHOLDER_SECRETS: &[&str] = &[
    DEV_SECRET,
    "change-me-to-a-random-string",
    "your-secret-key-change-in-production",
];

/// Store path that selects a throwaway in-memory store.
pub const IN_MEMORY_DB: &str = ":memory:";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub auth_secret: String,
    pub production: bool,
    /// `None` selects the stub chat responder.
    pub inference: Option<InferenceConfig>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let production = var("MAGUS_ENV").is_some_and(|v| v.eq_ignore_ascii_case("production"));

        let auth_secret = var("MAGUS_AUTH_SECRET").unwrap_or_else(|| DEV_SECRET.into());
        if production && PLACEHOLDER_SECRETS.contains(&auth_secret.as_str()) {
            bail!("MAGUS_AUTH_SECRET is unset or still a placeholder; refusing to start in production");
        }

        let port = match var("MAGUS_PORT") {
            Some(p) => p.parse().with_context(|| format!("invalid MAGUS_PORT '{}'", p))?,
            None => 3000,
        };

        let inference = match var("MAGUS_INFERENCE_URL") {
            Some(base_url) => {
                let timeout_secs = match var("MAGUS_INFERENCE_TIMEOUT_SECS") {
                    Some(t) => t
                        .parse()
                        .with_context(|| format!("invalid MAGUS_INFERENCE_TIMEOUT_SECS '{}'", t))?,
                    None => DEFAULT_TIMEOUT_SECS,
                };
                Some(InferenceConfig {
                    base_url,
                    api_key: var("MAGUS_INFERENCE_API_KEY"),
                    model: var("MAGUS_INFERENCE_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into()),
                    system_prompt: var("MAGUS_INFERENCE_SYSTEM_PROMPT"),
                    timeout: Duration::from_secs(timeout_secs),
                })
            }
            None => None,
        };

        Ok(Self {
            host: var("MAGUS_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            db_path: var("MAGUS_DB_PATH").unwrap_or_else(|| "magus.db".into()).into(),
            auth_secret,
            production,
            inference,
        })
    }

    pub fn uses_placeholder_secret(&self) -> bool {
        PLACEHOLDER_SECRETS.contains(&self.auth_secret.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.db_path, PathBuf::from("magus.db"));
        assert!(!cfg.production);
        assert!(cfg.uses_placeholder_secret());
        assert!(cfg.inference.is_none());
    }

    #[test]
    fn production_refuses_placeholder_secret() {
        assert!(config(&[("MAGUS_ENV", "production")]).is_err());
        assert!(
            config(&[("MAGUS_ENV", "production"), ("MAGUS_AUTH_SECRET", DEV_SECRET)]).is_err()
        );

        let cfg = config(&[("MAGUS_ENV", "Production"), ("MAGUS_AUTH_SECRET", "s3cr3t-value")])
            .unwrap();
        assert!(cfg.production);
        assert!(!cfg.uses_placeholder_secret());
    }

    #[test]
    fn inference_is_enabled_by_url() {
        let cfg = config(&[
            ("MAGUS_INFERENCE_URL", "https://api.example.com/v1"),
            ("MAGUS_INFERENCE_API_KEY", "sk-test"),
            ("MAGUS_INFERENCE_TIMEOUT_SECS", "5"),
        ])
        .unwrap();

        let inference = cfg.inference.unwrap();
        assert_eq!(inference.base_url, "https://api.example.com/v1");
        assert_eq!(inference.api_key.as_deref(), Some("sk-test"));
        assert_eq!(inference.model, DEFAULT_MODEL);
        assert_eq!(inference.timeout, Duration::from_secs(5));
    }

    #[test]
    fn bad_numbers_are_reported() {
        assert!(config(&[("MAGUS_PORT", "eighty")]).is_err());
        assert!(
            config(&[("MAGUS_INFERENCE_URL", "http://x"), ("MAGUS_INFERENCE_TIMEOUT_SECS", "-1")])
                .is_err()
        );
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let cfg = config(&[("MAGUS_PORT", "  "), ("MAGUS_INFERENCE_URL", "")]).unwrap();
        assert_eq!(cfg.port, 3000);
        assert!(cfg.inference.is_none());
    }
}
