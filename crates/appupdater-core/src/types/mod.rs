//! Type definitions shared across the workspace

mod job;
mod runtime_config;

pub use job::{UpdateJob, UpdateJobBuilder};
pub use runtime_config::{InstallSettings, NetworkConfig, RuntimeConfig};
