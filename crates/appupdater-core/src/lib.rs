//! # appupdater-core
//!
//! Core library for appupdater providing:
//! - The immutable per-run configuration (`UpdateJob`)
//! - Runtime settings for networking and installation layout
//! - Hierarchical loading of runtime settings (embedded defaults, file, env)
//! - The configuration error type shared by the workspace

pub mod config;
pub mod error;
pub mod types;

pub use config::HierarchicalConfigLoader;
pub use error::{ConfigError, Result};
pub use types::{InstallSettings, NetworkConfig, RuntimeConfig, UpdateJob, UpdateJobBuilder};
