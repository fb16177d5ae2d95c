use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub port: u16,
    pub rust_log: String,
    /// Additional attempts the job runner makes after the first failure.
    pub job_retries: u32,
    pub job_backoff: Duration,
    /// How long completed jobs stay in the registry.
    pub job_retention: Duration,
    pub strict_validation: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_model: optional_env("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            gemini_base_url: optional_env("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
            port: parse_env("PORT", 8080)?,
            rust_log: optional_env("RUST_LOG", "info"),
            job_retries: parse_env("JOB_RETRIES", 2)?,
            job_backoff: Duration::from_millis(parse_env("JOB_BACKOFF_MS", 1000)?),
            job_retention: Duration::from_secs(parse_env("JOB_RETENTION_SECS", 3600)?),
            strict_validation: parse_env("ROADMAP_STRICT_VALIDATION", false)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("Environment variable '{key}' has an invalid value: '{raw}'"))
}
