use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::{LlmSettings, DEFAULT_API_URL, DEFAULT_MODEL};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub groq_api_key: String,
    pub llm_api_url: String,
    pub llm_model: String,
    pub llm_timeout_secs: u64,
    pub llm_max_retries: u32,
    pub hr_questions_path: PathBuf,
    pub hr_question_count: usize,
    pub reports_dir: PathBuf,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            groq_api_key: require_env("GROQ_API_KEY")?,
            llm_api_url: env_or("LLM_API_URL", DEFAULT_API_URL),
            llm_model: env_or("LLM_MODEL", DEFAULT_MODEL),
            llm_timeout_secs: env_or("LLM_TIMEOUT_SECS", "60")
                .parse()
                .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            llm_max_retries: env_or("LLM_MAX_RETRIES", "3")
                .parse()
                .context("LLM_MAX_RETRIES must be a non-negative integer")?,
            hr_questions_path: env_or("HR_QUESTIONS_PATH", "data/hr_interview_questions.json")
                .into(),
            hr_question_count: env_or("HR_QUESTION_COUNT", "3")
                .parse()
                .context("HR_QUESTION_COUNT must be a non-negative integer")?,
            reports_dir: env_or("REPORTS_DIR", "candidates").into(),
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }

    /// Inference client settings derived from this configuration.
    pub fn llm_settings(&self) -> LlmSettings {
        LlmSettings {
            api_url: self.llm_api_url.clone(),
            model: self.llm_model.clone(),
            timeout: Duration::from_secs(self.llm_timeout_secs),
            max_attempts: self.llm_max_retries.max(1),
            ..LlmSettings::new(self.groq_api_key.clone())
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
