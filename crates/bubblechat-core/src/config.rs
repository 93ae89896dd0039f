use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::models::ChatModel;

pub const DEFAULT_CHAT_URL: &str = "http://localhost:8000/chat";
pub const DEFAULT_VOICE_URL: &str = "http://localhost:8001/listen";

pub const CHAT_URL_ENV: &str = "BUBBLECHAT_CHAT_URL";
pub const VOICE_URL_ENV: &str = "BUBBLECHAT_VOICE_URL";
pub const MODEL_ENV: &str = "BUBBLECHAT_MODEL";

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub chat_url: Option<String>,
    pub voice_url: Option<String>,
    pub default_model: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the config file, falling back to defaults when there isn't one.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    /// Overlay `BUBBLECHAT_*` environment variables on top of the file values.
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = lookup(CHAT_URL_ENV) {
            self.chat_url = Some(url);
        }
        if let Some(url) = lookup(VOICE_URL_ENV) {
            self.voice_url = Some(url);
        }
        if let Some(model) = lookup(MODEL_ENV) {
            self.default_model = Some(model);
        }
        self
    }

    pub fn chat_url(&self) -> &str {
        self.chat_url.as_deref().unwrap_or(DEFAULT_CHAT_URL)
    }

    pub fn voice_url(&self) -> &str {
        self.voice_url.as_deref().unwrap_or(DEFAULT_VOICE_URL)
    }

    /// The chat backend serves `/health` next to `/chat`.
    pub fn health_url(&self) -> String {
        let chat_url = self.chat_url().trim_end_matches('/');
        match chat_url.strip_suffix("/chat") {
            Some(base) => format!("{}/health", base),
            None => format!("{}/health", chat_url),
        }
    }

    /// Configured model, or the first bundled one when unset or unknown.
    pub fn initial_model(&self) -> ChatModel {
        match self.default_model.as_deref() {
            Some(name) => ChatModel::lookup(name).unwrap_or_else(|| {
                tracing::warn!(model = name, "unknown model in config, using default");
                ChatModel::default()
            }),
            None => ChatModel::default(),
        }
    }

    pub fn get_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;

        Ok(config_dir.join("bubblechat").join("config.json"))
    }
}
