//! In-place application updater
//!
//! Provides:
//! - Plain-text version and shortcut-name lookups
//! - Streaming archive download with progress and cooperative cancellation
//! - Selective wipe of the installation directory that keeps user data
//! - Zip extraction and version marker persistence
//! - Best-effort desktop shortcut replacement
//! - An update controller that sequences the above on a single worker task
//!   and publishes its progress as events

pub mod controller;
pub mod download;
pub mod error;
pub mod events;
pub mod install;
pub mod launch;
pub mod shortcut;
pub mod telemetry;
pub mod version;

pub use appupdater_core::{RuntimeConfig, UpdateJob};
pub use controller::{UpdateController, UpdateHandle, UpdateReport};
pub use download::{DownloadOutcome, DownloadProgress, Downloader};
pub use error::{Result, ShortcutError, ShortcutResult, UpdateError};
pub use events::{InstallationState, UpdateEvent};
pub use install::InstallationManager;
pub use launch::{finish, launch_application, LaunchChoice};
pub use shortcut::{ShortcutDescriptor, ShortcutManager};
pub use telemetry::init_tracing;
pub use version::VersionClient;

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
