//! CLI settings
//!
//! Layered with the `config` crate, lowest precedence first: built-in
//! defaults (seeded from the legacy `ARROW_DATABASE_PATH` and
//! `DEEPSEEK_API_KEY` variables), an optional `quiver.toml`, then
//! `QUIVER_*` environment variables.

use config::{Config, ConfigError, Environment, File};
use quiver_scraper::LlmSettings;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Overrides the location of `quiver.toml`
pub const CONFIG_PATH_ENV: &str = "QUIVER_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "quiver.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_path: PathBuf,
    pub manufacturers_config: PathBuf,
    pub data_dir: PathBuf,
    /// `text` or `json`
    pub log_format: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_max_tokens: u32,
    pub llm_temperature: f64,
    #[serde(default)]
    pub llm_api_key: Option<String>,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(&file)
    }

    pub fn load_from(file: &Path) -> Result<Self, ConfigError> {
        let defaults = LlmSettings::new(String::new());
        let database_path = legacy_env("ARROW_DATABASE_PATH")
            .unwrap_or_else(|| "arrow_database.db".to_string());

        let mut builder = Config::builder()
            .set_default("database_path", database_path)?
            .set_default("manufacturers_config", "config/manufacturers.yaml")?
            .set_default("data_dir", "data")?
            .set_default("log_format", "text")?
            .set_default("llm_base_url", defaults.base_url)?
            .set_default("llm_model", defaults.model)?
            .set_default("llm_max_tokens", i64::from(defaults.max_tokens))?
            .set_default("llm_temperature", defaults.temperature)?;
        if let Some(key) = legacy_env("DEEPSEEK_API_KEY") {
            builder = builder.set_default("llm_api_key", key)?;
        }

        builder
            .add_source(File::from(file).required(false))
            .add_source(Environment::with_prefix("QUIVER"))
            .build()?
            .try_deserialize()
    }

    /// LLM connection settings; fails when no API key is configured
    pub fn llm_settings(&self) -> Result<LlmSettings, String> {
        let key = self
            .llm_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or("no LLM API key configured (set DEEPSEEK_API_KEY or QUIVER_LLM_API_KEY)")?;

        let mut llm = LlmSettings::new(key);
        llm.base_url = self.llm_base_url.clone();
        llm.model = self.llm_model.clone();
        llm.max_tokens = self.llm_max_tokens;
        llm.temperature = self.llm_temperature;
        Ok(llm)
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.data_dir.join("processed")
    }
}

fn legacy_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
