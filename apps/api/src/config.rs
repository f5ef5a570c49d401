use anyhow::{bail, Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Analysis cache is disabled when unset.
    pub redis_url: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    /// Backend the router falls back to. Defaults to the first available one.
    pub default_backend: Option<String>,
    pub llm_timeout_secs: u64,
    pub batch_concurrency: usize,
    pub cache_ttl_secs: u64,
    /// Admin delete is disabled when unset.
    pub admin_token: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let config = Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: optional_env("REDIS_URL"),
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            openai_api_key: optional_env("OPENAI_API_KEY"),
            default_backend: optional_env("DEFAULT_MODEL_BACKEND"),
            llm_timeout_secs: parse_env("LLM_TIMEOUT_SECS", 60)?,
            batch_concurrency: parse_env("BATCH_CONCURRENCY", 4)?,
            cache_ttl_secs: parse_env("ANALYSIS_CACHE_TTL_SECS", 86_400)?,
            admin_token: optional_env("ADMIN_TOKEN"),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.anthropic_api_key.is_none() && self.openai_api_key.is_none() {
            bail!("At least one of ANTHROPIC_API_KEY or OPENAI_API_KEY must be set");
        }
        if self.batch_concurrency == 0 {
            bail!("BATCH_CONCURRENCY must be at least 1");
        }
        Ok(())
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank values are both treated as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("{key} has an invalid value: '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            database_url: "postgres://localhost/voc".to_string(),
            redis_url: None,
            anthropic_api_key: Some("key".to_string()),
            openai_api_key: None,
            default_backend: None,
            llm_timeout_secs: 60,
            batch_concurrency: 4,
            cache_ttl_secs: 86_400,
            admin_token: None,
            port: 8080,
            rust_log: "info".to_string(),
        }
    }

    #[test]
    fn test_validate_accepts_single_provider_key() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_provider_keys() {
        let config = Config {
            anthropic_api_key: None,
            ..base_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let config = Config {
            batch_concurrency: 0,
            ..base_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value: u64 = parse_env("VOC_TEST_SURELY_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }
}
