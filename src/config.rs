use std::env;
use std::str::FromStr;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub environment: String,
    pub llm_provider: String,
    pub llm_model: String,
    pub llm_base_url: Option<String>,
    pub llm_max_tokens: u32,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub enable_llm_service: bool,
    pub enable_database: bool,
    pub database_url: Option<String>,
    pub cache_enabled: bool,
    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,
    pub contact_email: String,
    pub otel_service_name: String,
    pub otel_exporter_endpoint: String,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. `from_env` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            port: parse_number("APP_PORT", &var("APP_PORT", "8080"))?,
            environment: var("ENVIRONMENT", "development"),
            llm_provider: var("LLM_PROVIDER", "openai").to_lowercase(),
            llm_model: var("LLM_MODEL", "gpt-4.1-mini"),
            llm_base_url: non_empty("LLM_BASE_URL"),
            llm_max_tokens: parse_number("LLM_MAX_TOKENS", &var("LLM_MAX_TOKENS", "1500"))?,
            openai_api_key: non_empty("OPENAI_API_KEY"),
            anthropic_api_key: non_empty("ANTHROPIC_API_KEY"),
            enable_llm_service: parse_flag(
                "ENABLE_LLM_SERVICE",
                &var("ENABLE_LLM_SERVICE", "true"),
            )?,
            enable_database: parse_flag("ENABLE_DATABASE", &var("ENABLE_DATABASE", "false"))?,
            database_url: non_empty("DATABASE_URL"),
            cache_enabled: parse_flag("LLM_CACHE_ENABLED", &var("LLM_CACHE_ENABLED", "true"))?,
            cache_ttl_secs: parse_number("LLM_CACHE_TTL_SECS", &var("LLM_CACHE_TTL_SECS", "300"))?,
            cache_capacity: parse_number(
                "LLM_CACHE_CAPACITY",
                &var("LLM_CACHE_CAPACITY", "100"),
            )?,
            contact_email: var("CONTACT_EMAIL", "reports@example.com"),
            otel_service_name: var("OTEL_SERVICE_NAME", "ai-insights-report"),
            otel_exporter_endpoint: var(
                "OTEL_EXPORTER_OTLP_ENDPOINT",
                "http://localhost:4317",
            ),
        })
    }

    /// Startup check: every enabled service must have what it needs to run.
    pub fn validate(&self) -> AppResult<()> {
        if self.enable_llm_service {
            match self.llm_provider.as_str() {
                "openai" if self.openai_api_key.is_none() => {
                    return Err(AppError::Config(
                        "OPENAI_API_KEY must be set when ENABLE_LLM_SERVICE is on".into(),
                    ));
                }
                "anthropic" if self.anthropic_api_key.is_none() => {
                    return Err(AppError::Config(
                        "ANTHROPIC_API_KEY must be set when ENABLE_LLM_SERVICE is on".into(),
                    ));
                }
                "openai" | "anthropic" => {}
                other => {
                    return Err(AppError::Config(format!(
                        "unsupported LLM_PROVIDER {other:?}, expected openai or anthropic"
                    )));
                }
            }
        }

        if self.enable_database && self.database_url.is_none() {
            return Err(AppError::Config(
                "DATABASE_URL must be set when ENABLE_DATABASE is on".into(),
            ));
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> AppResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::Config(format!("{key} must be a number, got {value:?}")))
}

/// Accepts the usual truthy and falsy spellings, case-insensitively.
pub fn parse_flag(key: &str, value: &str) -> AppResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "on" | "1" => Ok(true),
        "n" | "no" | "f" | "false" | "off" | "0" => Ok(false),
        _ => Err(AppError::Config(format!(
            "{key} must be a boolean flag, got {value:?}"
        ))),
    }
}
