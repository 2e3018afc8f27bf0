use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::pipeline::enricher::BatchPolicy;
use crate::pipeline::PipelineSettings;
use crate::providers::ProviderKind;
use crate::store::ConflictPolicy;

/// Application configuration loaded from environment variables.
/// Fails at startup if a required variable is missing or any value is invalid.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Bound on pool acquisition and on every SQL statement.
    pub store_timeout: Duration,
    pub port: u16,
    pub rust_log: String,

    pub enrichment_providers: Vec<ProviderKind>,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub zai_api_key: Option<String>,
    pub flowith_api_key: Option<String>,
    pub http_timeout: Duration,
    pub provider_max_attempts: u32,

    pub enrich_batch_size: usize,
    pub enrich_batch_delay: Duration,
    /// `None` disables the scheduler.
    pub scrape_interval: Option<Duration>,
    pub site_delay: Duration,
    pub sites_file: Option<PathBuf>,
    pub upsert_on_conflict: ConflictPolicy,
    pub ai_discovery_enabled: bool,

    pub listing_max_age_days: u32,
    pub retention_days: u32,
    pub retention_sweep_enabled: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env = Env { lookup };

        let interval_minutes: u64 = env.parse_or("SCRAPE_INTERVAL_MINUTES", 30)?;

        Ok(Config {
            database_url: env.require("DATABASE_URL")?,
            store_timeout: Duration::from_secs(env.parse_or("STORE_TIMEOUT_SECS", 30)?),
            port: env.parse_or("PORT", 8080)?,
            rust_log: env.optional("RUST_LOG").unwrap_or_else(|| "info".to_string()),

            enrichment_providers: env.list_or("ENRICHMENT_PROVIDERS", "openai,gemini,anthropic")?,
            openai_api_key: env.optional("OPENAI_API_KEY"),
            gemini_api_key: env.optional("GEMINI_API_KEY"),
            anthropic_api_key: env.optional("ANTHROPIC_API_KEY"),
            zai_api_key: env.optional("Z_AI_API_KEY"),
            flowith_api_key: env.optional("FLOWITH_API_KEY"),
            http_timeout: Duration::from_secs(env.parse_or("HTTP_TIMEOUT_SECS", 30)?),
            provider_max_attempts: env.parse_or("PROVIDER_MAX_ATTEMPTS", 2)?,

            enrich_batch_size: env.parse_or("ENRICH_BATCH_SIZE", 3)?,
            enrich_batch_delay: Duration::from_millis(env.parse_or("ENRICH_BATCH_DELAY_MS", 500)?),
            scrape_interval: (interval_minutes > 0)
                .then(|| Duration::from_secs(interval_minutes * 60)),
            site_delay: Duration::from_millis(env.parse_or("SITE_DELAY_MS", 3000)?),
            sites_file: env.optional("SITES_FILE").map(PathBuf::from),
            upsert_on_conflict: env.parse_or("UPSERT_ON_CONFLICT", ConflictPolicy::Ignore)?,
            ai_discovery_enabled: env.parse_or("AI_DISCOVERY_ENABLED", false)?,

            listing_max_age_days: env.parse_or("LISTING_MAX_AGE_DAYS", 7)?,
            retention_days: env.parse_or("RETENTION_DAYS", 10)?,
            retention_sweep_enabled: env.parse_or("RETENTION_SWEEP_ENABLED", true)?,
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self::from_lookup(|key| (key == "DATABASE_URL").then(|| "postgres://localhost/test".to_string()))
            .expect("test config")
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            batch: BatchPolicy {
                size: self.enrich_batch_size.max(1),
                delay: self.enrich_batch_delay,
            },
            conflict: self.upsert_on_conflict,
            site_delay: self.site_delay,
            discovery_enabled: self.ai_discovery_enabled,
        }
    }
}

struct Env<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Set and not blank.
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn require(&self, key: &str) -> Result<String> {
        self.optional(key)
            .with_context(|| format!("Required environment variable '{key}' is not set"))
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(key) {
            Some(raw) => raw
                .parse::<T>()
                .map_err(|e| anyhow::anyhow!("{key} has invalid value '{raw}': {e}")),
            None => Ok(default),
        }
    }

    fn list_or<T>(&self, key: &str, default: &str) -> Result<Vec<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.optional(key).unwrap_or_else(|| default.to_string());
        raw.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| {
                item.parse::<T>()
                    .map_err(|e| anyhow::anyhow!("{key} has invalid entry '{item}': {e}"))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[("DATABASE_URL", "postgres://localhost/jobs")]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.store_timeout, Duration::from_secs(30));
        assert_eq!(
            config.enrichment_providers,
            vec![ProviderKind::OpenAi, ProviderKind::Gemini, ProviderKind::Anthropic]
        );
        assert_eq!(config.scrape_interval, Some(Duration::from_secs(1800)));
        assert_eq!(config.site_delay, Duration::from_secs(3));
        assert_eq!(config.upsert_on_conflict, ConflictPolicy::Ignore);
        assert_eq!(config.listing_max_age_days, 7);
        assert_eq!(config.retention_days, 10);
        assert!(config.retention_sweep_enabled);
        assert!(!config.ai_discovery_enabled);
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn test_missing_database_url() {
        let err = config(&[]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_blank_key_is_unset() {
        let config = config(&[("DATABASE_URL", "postgres://x"), ("OPENAI_API_KEY", "  ")]).unwrap();
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn test_zero_interval_disables_scheduler() {
        let config = config(&[("DATABASE_URL", "postgres://x"), ("SCRAPE_INTERVAL_MINUTES", "0")])
            .unwrap();
        assert!(config.scrape_interval.is_none());
    }

    #[test]
    fn test_provider_order_and_policy() {
        let config = config(&[
            ("DATABASE_URL", "postgres://x"),
            ("ENRICHMENT_PROVIDERS", "gemini, zai ,flowith"),
            ("UPSERT_ON_CONFLICT", "overwrite"),
        ])
        .unwrap();
        assert_eq!(
            config.enrichment_providers,
            vec![ProviderKind::Gemini, ProviderKind::ZAi, ProviderKind::Flowith]
        );
        assert_eq!(config.upsert_on_conflict, ConflictPolicy::Overwrite);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(config(&[("DATABASE_URL", "postgres://x"), ("PORT", "http")]).is_err());
        assert!(config(&[("DATABASE_URL", "postgres://x"), ("ENRICHMENT_PROVIDERS", "mistral")]).is_err());
        assert!(config(&[("DATABASE_URL", "postgres://x"), ("RETENTION_SWEEP_ENABLED", "oui")]).is_err());
    }
}
