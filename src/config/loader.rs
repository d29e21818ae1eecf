//! Configuration Loader
//!
//! Handles loading and merging provider configurations from multiple sources.

use crate::config::provider::ProvidersConfig;
use crate::error::{RelayError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration loader with support for multiple sources
pub struct ConfigLoader {
    config: ProvidersConfig,
}

impl ConfigLoader {
    /// Create a new config loader and load from default locations
    pub fn new() -> Result<Self> {
        let mut loader = Self {
            config: ProvidersConfig::default(),
        };

        // Load built-in defaults first
        loader.load_builtin_defaults()?;

        // Then load from file system (can override built-ins)
        loader.load_from_default_paths()?;

        loader.config.validate()?;
        Ok(loader)
    }

    /// Create a loader with a specific config file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let mut loader = Self {
            config: ProvidersConfig::default(),
        };

        loader.load_builtin_defaults()?;
        loader.load_from_file(path)?;

        loader.config.validate()?;
        Ok(loader)
    }

    /// Load built-in provider defaults
    fn load_builtin_defaults(&mut self) -> Result<()> {
        let defaults = include_str!("../../providers.json");
        let config: ProvidersConfig = serde_json::from_str(defaults).map_err(|e| {
            RelayError::Config(format!("Failed to parse built-in providers.json: {}", e))
        })?;

        self.merge_config(config);
        Ok(())
    }

    /// Load configuration from default paths
    fn load_from_default_paths(&mut self) -> Result<()> {
        for path in Self::get_config_paths() {
            if path.exists() {
                self.load_from_file(&path)?;
            }
        }

        Ok(())
    }

    /// Get list of config paths to check, lowest precedence last
    fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. Environment variable
        if let Ok(custom_path) = std::env::var("CHATRELAY_CONFIG_PATH") {
            paths.push(PathBuf::from(custom_path));
        }

        // 2. Current directory
        paths.push(PathBuf::from("chatrelay.json"));

        // 3. User config directory
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("chatrelay").join("providers.json"));
        }

        // 4. Home directory
        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".chatrelay").join("providers.json"));
        }

        // Apply the least specific file first so the env var path wins
        paths.reverse();
        paths
    }

    /// Load configuration from a specific file
    fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            RelayError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: ProvidersConfig = serde_json::from_str(&content).map_err(|e| {
            RelayError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        debug!(path = %path.display(), providers = config.providers.len(), "Loaded config file");
        self.merge_config(config);
        Ok(())
    }

    /// Merge another config into this one (later configs override earlier)
    fn merge_config(&mut self, other: ProvidersConfig) {
        for (id, provider) in other.providers {
            self.config.providers.insert(id, provider);
        }

        if other.router.is_some() {
            self.config.router = other.router;
        }
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &ProvidersConfig {
        &self.config
    }

    /// Take ownership of the configuration
    pub fn into_config(self) -> ProvidersConfig {
        self.config
    }
}
