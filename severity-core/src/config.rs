use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::{model::Coordinates, provider::openmeteo::DEFAULT_FORECAST_URL};

/// Proxy endpoint used when nothing is configured (local Functions host).
pub const DEFAULT_PROXY_URL: &str = "http://localhost:7071/api/message";

/// Client configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// proxy_url = "https://severity.example.net/api/message"
///
/// [home]
/// latitude = 47.6062
/// longitude = -122.3321
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Inference proxy endpoint (`POST /api/message`).
    pub proxy_url: Option<String>,

    /// Forecast service base URL.
    pub forecast_url: Option<String>,

    /// Location reported when the form initializes.
    pub home: Option<Coordinates>,
}

impl Config {
    pub fn proxy_url(&self) -> &str {
        self.proxy_url.as_deref().unwrap_or(DEFAULT_PROXY_URL)
    }

    pub fn forecast_url(&self) -> &str {
        self.forecast_url.as_deref().unwrap_or(DEFAULT_FORECAST_URL)
    }

    pub fn set_proxy_url(&mut self, url: String) {
        self.proxy_url = non_empty(url);
    }

    pub fn set_forecast_url(&mut self, url: String) {
        self.forecast_url = non_empty(url);
    }

    pub fn set_home(&mut self, home: Option<Coordinates>) {
        self.home = home;
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "severity", "severity-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}
