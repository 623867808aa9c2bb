//! Configuration loading for Vela applications
//!
//! Provides utilities for loading configuration files from the shared
//! Vela config directory (~/.config/vela/).
//!
//! Call [`init`] at application startup to bootstrap the config directory.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Initialize the Vela config directory.
///
/// Creates ~/.config/vela/ if it doesn't exist.
/// Call this once at application startup.
pub fn init() -> Result<PathBuf> {
    ensure_config_dir()
}

/// Get the Vela config directory (~/.config/vela/)
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("vela"))
}

/// Get the path to a config file within the Vela config directory
pub fn config_path(filename: &str) -> Option<PathBuf> {
    config_dir().map(|p| p.join(filename))
}

/// Load and parse a JSON config file from the Vela config directory
pub fn load_json<T: DeserializeOwned>(filename: &str) -> Result<T> {
    let path = config_path(filename).context("Could not determine config directory")?;
    load_json_file(&path)
}

/// Load and parse a JSON file from an arbitrary path
pub fn load_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Check if a config file exists in the Vela config directory
pub fn config_exists(filename: &str) -> bool {
    config_path(filename).is_some_and(|p| p.exists())
}

/// Ensure the Vela config directory exists
pub fn ensure_config_dir() -> Result<PathBuf> {
    let dir = config_dir().context("Could not determine config directory")?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
    Ok(dir)
}

/// Save a value as JSON to a config file in the Vela config directory
pub fn save_json<T: Serialize>(filename: &str, value: &T) -> Result<()> {
    let dir = ensure_config_dir()?;
    let path = dir.join(filename);
    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    Ok(())
}

/// Connection settings for the Vela backend service
///
/// Stored in ~/.config/vela/api.json. The auth token is issued by the
/// backend's login flow; requests without one are rejected upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the backend service (e.g., "http://localhost:8000")
    pub base_url: String,
    /// Bearer token for authenticated requests
    pub auth_token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            auth_token: None,
        }
    }
}

impl ApiConfig {
    /// Filename within the Vela config directory
    pub const FILENAME: &'static str = "api.json";

    /// Load the API config, falling back to defaults if the file is missing
    pub fn load() -> Self {
        if config_exists(Self::FILENAME) {
            load_json(Self::FILENAME).unwrap_or_default()
        } else {
            Self::default()
        }
    }

    /// Save the API config
    pub fn save(&self) -> Result<()> {
        save_json(Self::FILENAME, self)
    }
}
