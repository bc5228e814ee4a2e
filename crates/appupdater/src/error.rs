//! Error types for the update run
//!
//! [`UpdateError`] covers everything that can end a run. Shortcut handling is
//! best-effort and reports through the separate [`ShortcutError`], which the
//! controller logs but never escalates.

use std::path::PathBuf;
use thiserror::Error;

use appupdater_core::ConfigError;

/// Result type alias for update operations
pub type Result<T> = std::result::Result<T, UpdateError>;

/// Result type alias for best-effort shortcut operations
pub type ShortcutResult<T> = std::result::Result<T, ShortcutError>;

/// Failures that end an update run
#[derive(Error, Debug)]
pub enum UpdateError {
    /// Transport-level failure (DNS, connect, TLS, timeout, body read)
    #[error("Request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status
    #[error("Request to {url} returned HTTP {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Downloaded archive is zero bytes long
    #[error("Downloaded archive is empty: {}", path.display())]
    EmptyArchive { path: PathBuf },

    /// Archive is not a readable zip file
    #[error("Invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Main executable is missing after installation
    #[error("Executable not found: {}", path.display())]
    MissingExecutable { path: PathBuf },

    /// Filesystem failure
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Anything else
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl UpdateError {
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Whether this is one of the network failure kinds
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::HttpStatus { .. })
    }

    /// Short text for the status display
    ///
    /// The full error chain belongs in the log, not here.
    pub fn status_message(&self) -> String {
        match self {
            Self::Network { .. } | Self::HttpStatus { .. } => {
                "Update failed: could not reach the update server.".to_string()
            }
            Self::EmptyArchive { .. } => {
                "Update failed: the downloaded archive is empty.".to_string()
            }
            Self::Zip(_) => "Update failed: the downloaded archive is corrupt.".to_string(),
            Self::MissingExecutable { path } => {
                format!("Not found: {}", path.display())
            }
            Self::Io { source, .. } => format!("Unexpected error: {}", source),
            Self::Config(err) => format!("Unexpected error: {}", err),
            Self::Unexpected(detail) => format!("Unexpected error: {}", detail),
        }
    }
}

/// Failures of the best-effort shortcut steps
#[derive(Error, Debug)]
pub enum ShortcutError {
    /// No desktop directory could be resolved for the current user
    #[error("Could not determine the desktop directory")]
    NoDesktop,

    /// Display name would not produce a single file on the desktop
    #[error("Invalid shortcut name: {0:?}")]
    InvalidName(String),

    /// The display name could not be fetched
    #[error("Failed to resolve shortcut name: {0}")]
    Network(#[source] Box<UpdateError>),

    /// Reading, writing, or removing the link file failed
    #[error("Shortcut file operation failed for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
