//! Configuration management for imgdrive.
//!
//! Loads configuration from ${IMGDRIVE_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable that overrides `api_url`.
pub const API_URL_ENV: &str = "IMGDRIVE_API_URL";

/// Returns the default config template with comments.
///
/// This is embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for imgdrive configuration and data directories.
    //!
    //! IMGDRIVE_HOME resolution order:
    //! 1. IMGDRIVE_HOME environment variable (if set)
    //! 2. ~/.config/imgdrive (default)

    use std::path::PathBuf;

    /// Returns the imgdrive home directory.
    ///
    /// Checks IMGDRIVE_HOME env var first, falls back to ~/.config/imgdrive.
    /// When no home directory can be determined, a relative `.imgdrive` is used.
    pub fn imgdrive_home() -> PathBuf {
        if let Ok(home) = std::env::var("IMGDRIVE_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".imgdrive"),
            |h| h.join(".config").join("imgdrive"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        imgdrive_home().join("config.toml")
    }

    /// Returns the directory for rolling log files.
    pub fn logs_dir() -> PathBuf {
        imgdrive_home().join("logs")
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the image management API
    pub api_url: String,
    /// Default log filter when RUST_LOG is not set
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: Self::DEFAULT_API_URL.to_string(),
            log_level: Self::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    pub const DEFAULT_API_URL: &'static str = "https://image-management-backend-green.vercel.app";
    pub const DEFAULT_LOG_LEVEL: &'static str = "info";

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Creates a default config file at the given path.
    ///
    /// # Errors
    /// Fails if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        fs::write(path, default_config_template())
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// Resolves the API base URL with precedence: env > config > default.
    ///
    /// # Errors
    /// Returns an error if the chosen URL is not a valid absolute URL.
    pub fn resolve_api_url(&self) -> Result<String> {
        let env_url = std::env::var(API_URL_ENV).ok();
        resolve_base_url(env_url.as_deref(), Some(&self.api_url))
    }
}

fn resolve_base_url(env_url: Option<&str>, config_url: Option<&str>) -> Result<String> {
    let chosen = [env_url, config_url]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|url| !url.is_empty())
        .unwrap_or(Config::DEFAULT_API_URL);

    url::Url::parse(chosen).with_context(|| format!("Invalid API base URL: {chosen}"))?;
    Ok(chosen.trim_end_matches('/').to_string())
}
