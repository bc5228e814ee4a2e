//! Tracing setup for embedding applications

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a global tracing subscriber
///
/// `verbose` 0 logs at info, 1 at debug, 2 or more at trace; `quiet` limits
/// output to errors. Does nothing if a subscriber is already installed.
pub fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .try_init();
}
