//! Per-run update configuration
//!
//! An [`UpdateJob`] is built once by the embedding caller before the update
//! starts and is never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

/// Immutable configuration for a single update run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UpdateJob {
    /// URL of the zip archive holding the new installation
    source_url: String,

    /// Installation directory that gets replaced in place
    destination: PathBuf,

    /// Main executable, relative to the destination
    main_executable: PathBuf,

    /// URL of the plain-text version resource
    version_url: String,

    /// URL of the plain-text shortcut display name resource
    shortcut_name_url: String,
}

impl UpdateJob {
    /// Start building a job
    pub fn builder() -> UpdateJobBuilder {
        UpdateJobBuilder::default()
    }

    /// Parse a job from YAML and validate it
    pub fn from_yaml(content: &str) -> Result<Self> {
        let job: UpdateJob = serde_yaml_ng::from_str(content)?;
        job.validate()?;
        Ok(job)
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn main_executable(&self) -> &Path {
        &self.main_executable
    }

    pub fn version_url(&self) -> &str {
        &self.version_url
    }

    pub fn shortcut_name_url(&self) -> &str {
        &self.shortcut_name_url
    }

    /// Absolute location of the installed main executable
    pub fn executable_path(&self) -> PathBuf {
        self.destination.join(&self.main_executable)
    }

    fn validate(&self) -> Result<()> {
        let required = [
            ("source-url", self.source_url.trim().is_empty()),
            ("destination", self.destination.as_os_str().is_empty()),
            ("main-executable", self.main_executable.as_os_str().is_empty()),
            ("version-url", self.version_url.trim().is_empty()),
            ("shortcut-name-url", self.shortcut_name_url.trim().is_empty()),
        ];

        if let Some((field, _)) = required.iter().find(|(_, missing)| *missing) {
            return Err(ConfigError::missing_field(*field));
        }

        if self.main_executable.is_absolute() {
            return Err(ConfigError::invalid_config(format!(
                "main-executable must be relative to the destination: {}",
                self.main_executable.display()
            )));
        }

        Ok(())
    }
}

/// Builder for [`UpdateJob`]
#[derive(Debug, Clone, Default)]
pub struct UpdateJobBuilder {
    source_url: String,
    destination: PathBuf,
    main_executable: PathBuf,
    version_url: String,
    shortcut_name_url: String,
}

impl UpdateJobBuilder {
    /// Set the archive URL
    pub fn source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = url.into();
        self
    }

    /// Set the installation directory
    pub fn destination(mut self, path: impl Into<PathBuf>) -> Self {
        self.destination = path.into();
        self
    }

    /// Set the main executable (relative to the destination)
    pub fn main_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.main_executable = path.into();
        self
    }

    /// Set the version resource URL
    pub fn version_url(mut self, url: impl Into<String>) -> Self {
        self.version_url = url.into();
        self
    }

    /// Set the shortcut name resource URL
    pub fn shortcut_name_url(mut self, url: impl Into<String>) -> Self {
        self.shortcut_name_url = url.into();
        self
    }

    /// Validate and build the job
    pub fn build(self) -> Result<UpdateJob> {
        let job = UpdateJob {
            source_url: self.source_url,
            destination: self.destination,
            main_executable: self.main_executable,
            version_url: self.version_url,
            shortcut_name_url: self.shortcut_name_url,
        };
        job.validate()?;
        Ok(job)
    }
}
