//! Configuration management for Vestry

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VestryConfig {
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Platforms preselected when building a new schedule
    pub platforms: Vec<String>,
    /// IANA timezone applied when a schedule request leaves it unset
    pub timezone: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            platforms: vec!["timeline".to_string()],
            timezone: "UTC".to_string(),
        }
    }
}

impl Default for VestryConfig {
    fn default() -> Self {
        Self {
            defaults: DefaultsConfig::default(),
        }
    }
}

impl VestryConfig {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: VestryConfig = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("VESTRY_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("vestry").join("config.toml"))
}
