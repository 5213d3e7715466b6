//! Persisted credentials for the search and AI services

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const APP_DIR: &str = "image-scout";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no config directory available on this platform")]
    NoConfigDir,
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub google_api_key: String,
    pub google_cx_id: String,
    pub gemini_api_key: String,
}

impl AppConfig {
    /// Search needs both the API key and the engine id
    pub fn is_search_configured(&self) -> bool {
        !self.google_api_key.is_empty() && !self.google_cx_id.is_empty()
    }

    pub fn has_ai_key(&self) -> bool {
        !self.gemini_api_key.is_empty()
    }

    /// Set one field by its CLI/JSON name
    pub fn set_field(&mut self, field: &str, value: &str) -> Result<(), String> {
        let slot = match field {
            "googleApiKey" | "google-api-key" | "api-key" => &mut self.google_api_key,
            "googleCxId" | "google-cx-id" | "cx" => &mut self.google_cx_id,
            "geminiApiKey" | "gemini-api-key" | "gemini" => &mut self.gemini_api_key,
            _ => return Err(format!("Unknown config field: {}", field)),
        };
        *slot = value.trim().to_string();
        Ok(())
    }
}

/// `IMAGE_SCOUT_CONFIG`, else `<config_dir>/image-scout/config.json`
pub fn config_path() -> Result<PathBuf, ConfigError> {
    if let Ok(path) = std::env::var("IMAGE_SCOUT_CONFIG") {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
        .ok_or(ConfigError::NoConfigDir)
}

/// Load the config, treating a missing file as all-empty defaults
pub fn load_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(serde_json::from_str(&text)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(e.into()),
    }
}

/// Overwrite the whole config file
pub fn save_to(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Startup load: any failure degrades to defaults
pub fn load() -> AppConfig {
    let path = match config_path() {
        Ok(path) => path,
        Err(e) => {
            tracing::warn!("Using default config: {}", e);
            return AppConfig::default();
        }
    };

    match load_from(&path) {
        Ok(config) => {
            tracing::info!("Loaded config from {:?}", path);
            config
        }
        Err(e) => {
            tracing::warn!("Could not read config {:?}, using defaults: {}", path, e);
            AppConfig::default()
        }
    }
}

pub fn save(config: &AppConfig) -> Result<PathBuf, ConfigError> {
    let path = config_path()?;
    save_to(&path, config)?;
    tracing::info!("Saved config to {:?}", path);
    Ok(path)
}

/// Show only the last four characters of a secret
pub fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.is_empty() {
        return "(not set)".to_string();
    }
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}
