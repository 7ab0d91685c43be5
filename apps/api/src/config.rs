use anyhow::{bail, Context, Result};

/// Application configuration loaded from environment variables.
///
/// Provider keys are optional: without ANTHROPIC_API_KEY structuring falls
/// back to heuristics, without OPENAI_API_KEY indexing and semantic search
/// are disabled, and without DATABASE_URL profiles live in process memory.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub database_url: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub github_token: Option<String>,
    pub worker_pool_size: usize,
    pub fetch_timeout_secs: u64,
    pub extract_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let config = Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            database_url: optional_env("DATABASE_URL"),
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            openai_api_key: optional_env("OPENAI_API_KEY"),
            github_token: optional_env("GITHUB_TOKEN"),
            worker_pool_size: env_parse("WORKER_POOL_SIZE", 4)?,
            fetch_timeout_secs: env_parse("FETCH_TIMEOUT_SECS", 10)?,
            extract_timeout_secs: env_parse("EXTRACT_TIMEOUT_SECS", 30)?,
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS", 60)?,
        };

        if config.worker_pool_size == 0 {
            bail!("WORKER_POOL_SIZE must be at least 1");
        }

        Ok(config)
    }
}

/// Unset and blank are both treated as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("'{key}' must be a valid number")),
        Err(_) => Ok(default),
    }
}
