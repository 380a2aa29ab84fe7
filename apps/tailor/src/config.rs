use std::time::Duration;

use anyhow::{Context, Result};

/// Runtime configuration loaded from environment variables (and `.env` if present).
/// Core logic never reads the environment; this value is passed in explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    pub ollama_host: String,
    /// Model override; each backend has its own default when unset.
    pub model: Option<String>,
    pub openai_api_key: Option<String>,
    /// Environment-level default for the fact error-rate tolerance.
    pub fact_tolerance: Option<f64>,
    pub generation_timeout: Duration,
    pub fetch_timeout: Duration,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            ollama_host: std::env::var("OLLAMA_HOST")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            model: optional_env("RESUME_LLM_MODEL"),
            openai_api_key: optional_env("OPENAI_API_KEY"),
            fact_tolerance: optional_env("RESUME_FACT_ERROR_TOLERANCE")
                .map(|v| {
                    v.trim()
                        .parse::<f64>()
                        .context("RESUME_FACT_ERROR_TOLERANCE must be a number")
                })
                .transpose()?,
            generation_timeout: Duration::from_secs(secs_env("RESUME_LLM_TIMEOUT_SECS", 120)?),
            fetch_timeout: Duration::from_secs(secs_env("RESUME_FETCH_TIMEOUT_SECS", 30)?),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn secs_env(key: &str, default: u64) -> Result<u64> {
    match optional_env(key) {
        Some(v) => v
            .trim()
            .parse::<u64>()
            .with_context(|| format!("{key} must be a whole number of seconds")),
        None => Ok(default),
    }
}
