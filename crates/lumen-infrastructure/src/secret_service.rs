//! Secret configuration for the remote image service.
//!
//! Supports reading secrets from `~/.config/lumen/secret.json`.

use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use lumen_core::error::Result;
use lumen_core::LumenError;

/// Root configuration structure for secret.json
#[derive(Debug, Clone, Deserialize)]
pub struct SecretConfig {
    #[serde(default)]
    pub gemini: Option<GeminiConfig>,
}

/// Gemini API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    #[serde(default)]
    pub model_name: Option<String>,
}

/// Loads the secret configuration file.
///
/// The path defaults to `~/.config/lumen/secret.json` and can be overridden
/// with [`with_path`](Self::with_path) (used by tests).
pub struct SecretService {
    config_path: PathBuf,
}

impl SecretService {
    /// Creates a service reading from the default location.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the home directory cannot be
    /// determined.
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| LumenError::config("Could not determine home directory"))?;
        Ok(Self {
            config_path: home.join(".config").join("lumen").join("secret.json"),
        })
    }

    /// Creates a service reading from an explicit path.
    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// Parses the configuration file.
    pub fn load(&self) -> Result<SecretConfig> {
        if !self.config_path.exists() {
            return Err(LumenError::config(format!(
                "Configuration file not found at: {}",
                self.config_path.display()
            )));
        }

        let content = fs::read_to_string(&self.config_path).map_err(|e| {
            LumenError::config(format!(
                "Failed to read configuration file at {}: {}",
                self.config_path.display(),
                e
            ))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            LumenError::config(format!(
                "Failed to parse configuration file at {}: {}",
                self.config_path.display(),
                e
            ))
        })
    }

    /// Loads the Gemini section, failing when it is absent.
    pub fn load_gemini(&self) -> Result<GeminiConfig> {
        self.load()?.gemini.ok_or_else(|| {
            LumenError::config(format!(
                "Gemini configuration not found in {}",
                self.config_path.display()
            ))
        })
    }
}
