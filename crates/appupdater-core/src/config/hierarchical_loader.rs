//! Hierarchical configuration loader with precedence
//!
//! Loads runtime configuration from multiple sources with the following
//! precedence (low to high):
//! 1. Embedded defaults (built into binary)
//! 2. Runtime config (~/.appupdater/appupdater-runtime.yaml)
//! 3. Environment variables (APPUPDATER_* prefix)

use crate::error::{ConfigError, Result};
use crate::types::RuntimeConfig;
use camino::{Utf8Path, Utf8PathBuf};
use rust_embed::RustEmbed;
use serde::de::DeserializeOwned;
use std::env;
use std::fs;
use tracing::debug;

/// Embedded configuration files
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../embedded/config/"]
#[prefix = ""]
struct EmbeddedConfigs;

const RUNTIME_DEFAULTS: &str = "runtime-defaults.yaml";
const RUNTIME_CONFIG_FILE: &str = "appupdater-runtime.yaml";

/// Configuration hierarchy loader
pub struct HierarchicalConfigLoader {
    /// Base directory for configuration files
    config_dir: Utf8PathBuf,
}

impl HierarchicalConfigLoader {
    /// Create a loader rooted at the standard config directory
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;
        Ok(Self { config_dir })
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: Utf8PathBuf) -> Self {
        Self { config_dir }
    }

    /// `$APPUPDATER_CONFIG_DIR`, or `~/.appupdater`
    ///
    /// The directory is not created; a missing directory simply means no
    /// file overlay.
    fn get_config_dir() -> Result<Utf8PathBuf> {
        if let Ok(dir) = env::var("APPUPDATER_CONFIG_DIR") {
            return Ok(Utf8PathBuf::from(dir));
        }

        let home = env::var("HOME")
            .or_else(|_| env::var("USERPROFILE"))
            .map_err(|_| ConfigError::invalid_config("Could not determine home directory"))?;

        Ok(Utf8PathBuf::from(home).join(".appupdater"))
    }

    /// Load runtime configuration with hierarchical precedence
    pub fn load_runtime_config(&self) -> Result<RuntimeConfig> {
        let mut config = Self::load_embedded_config::<RuntimeConfig>(RUNTIME_DEFAULTS)?;

        let runtime_config_path = self.config_dir.join(RUNTIME_CONFIG_FILE);
        if runtime_config_path.exists() {
            debug!("Loading runtime config overlay from {}", runtime_config_path);
            config = self.load_yaml_file::<RuntimeConfig>(&runtime_config_path)?;
        }

        config = self.apply_env_overrides(config)?;
        Self::validate(&config)?;

        Ok(config)
    }

    /// Load an embedded configuration file
    fn load_embedded_config<T: DeserializeOwned>(filename: &str) -> Result<T> {
        let embedded_file = EmbeddedConfigs::get(filename).ok_or_else(|| {
            ConfigError::config_not_found(format!("Embedded config not found: {}", filename))
        })?;

        let content = std::str::from_utf8(&embedded_file.data).map_err(|_| {
            ConfigError::invalid_config(format!("Invalid UTF-8 in embedded config: {}", filename))
        })?;

        serde_yaml_ng::from_str(content).map_err(|e| {
            ConfigError::invalid_config(format!(
                "Failed to parse embedded config {}: {}",
                filename, e
            ))
        })
    }

    /// Load a YAML file and parse it
    fn load_yaml_file<T: DeserializeOwned>(&self, path: &Utf8Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        serde_yaml_ng::from_str(&content)
            .map_err(|e| ConfigError::invalid_config(format!("Failed to parse {}: {}", path, e)))
    }

    /// Apply environment variable overrides to runtime config
    fn apply_env_overrides(&self, mut config: RuntimeConfig) -> Result<RuntimeConfig> {
        if let Some(val) = parse_env("APPUPDATER_HTTP_TIMEOUT_SECS")? {
            config.network.http_timeout_secs = val;
        }

        if let Some(val) = parse_env("APPUPDATER_CONNECT_TIMEOUT_SECS")? {
            config.network.connect_timeout_secs = val;
        }

        if let Some(val) = parse_env("APPUPDATER_DOWNLOAD_TIMEOUT_SECS")? {
            config.network.download_timeout_secs = val;
        }

        if let Some(val) = parse_env("APPUPDATER_DOWNLOAD_CHUNK_SIZE")? {
            config.network.download_chunk_size = val;
        }

        if let Ok(val) = env::var("APPUPDATER_USER_AGENT") {
            config.network.user_agent = val;
        }

        if let Ok(val) = env::var("APPUPDATER_PROTECTED_DIR") {
            config.install.protected_dir = val;
        }

        Ok(config)
    }

    fn validate(config: &RuntimeConfig) -> Result<()> {
        if config.network.download_chunk_size == 0 {
            return Err(ConfigError::invalid_config(
                "download-chunk-size must be greater than zero",
            ));
        }

        let install = &config.install;
        for (field, value) in [
            ("protected-dir", &install.protected_dir),
            ("version-file", &install.version_file),
            ("archive-name", &install.archive_name),
        ] {
            if value.trim().is_empty() || value.contains(['/', '\\']) {
                return Err(ConfigError::invalid_config(format!(
                    "install.{} must be a plain file name, got {:?}",
                    field, value
                )));
            }
        }

        Ok(())
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(val) => val
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::invalid_config(format!("{} must be a valid number", name))),
        Err(_) => Ok(None),
    }
}
