//! Runtime configuration types for operational parameters
//!
//! These types control network bounds and the on-disk layout of an
//! installation. They are independent of any single update run.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuntimeConfig {
    /// Network and HTTP configuration
    #[serde(default)]
    pub network: NetworkConfig,

    /// Installation layout
    #[serde(default)]
    pub install: InstallSettings,
}

/// Network and HTTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkConfig {
    /// Timeout for plain-text resource requests, in seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Connect timeout for every request, in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Maximum idle time between reads of the archive stream, in seconds
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,

    /// Size of each chunk written to disk during a download
    #[serde(default = "default_chunk_size")]
    pub download_chunk_size: usize,

    /// User agent string for HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl NetworkConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: default_http_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            download_timeout_secs: default_download_timeout(),
            download_chunk_size: default_chunk_size(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_http_timeout() -> u64 {
    30
}
fn default_connect_timeout() -> u64 {
    15
}
fn default_download_timeout() -> u64 {
    60
}
fn default_chunk_size() -> usize {
    8 * 1024 // 8 KiB
}
fn default_user_agent() -> String {
    format!(
        "appupdater/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// On-disk layout of an installation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct InstallSettings {
    /// Top-level directory that survives the destination wipe
    #[serde(default = "default_protected_dir")]
    pub protected_dir: String,

    /// Name of the version marker file
    #[serde(default = "default_version_file")]
    pub version_file: String,

    /// Name of the transient archive inside the destination
    #[serde(default = "default_archive_name")]
    pub archive_name: String,
}

impl Default for InstallSettings {
    fn default() -> Self {
        Self {
            protected_dir: default_protected_dir(),
            version_file: default_version_file(),
            archive_name: default_archive_name(),
        }
    }
}

fn default_protected_dir() -> String {
    "save".to_string()
}
fn default_version_file() -> String {
    "version.txt".to_string()
}
fn default_archive_name() -> String {
    "temp.zip".to_string()
}
