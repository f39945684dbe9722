//! Tracing subscriber setup for the `crypt` binary.
//!
//! Library users install their own subscriber; the codec only emits events.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Initialise structured JSON logging on stderr at `log_level`.
///
/// `RUST_LOG` takes precedence over `log_level` when set. Stdout is left for
/// command output.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been set.
pub fn init(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise crypt tracing subscriber: {e}"))
}
