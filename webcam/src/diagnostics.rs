//! Logging setup

use crate::{WebcamError, WebcamResult};
use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Install a `tracing` fmt subscriber filtered by `RUST_LOG`.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging() -> WebcamResult<()> {
    init_logging_with(DEFAULT_LOG_FILTER)
}

/// Like [`init_logging`], falling back to `default_filter` instead of `info`
pub fn init_logging_with(default_filter: &str) -> WebcamResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|e| WebcamError::Initialization {
            reason: format!("Invalid log filter: {}", e),
        })?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| WebcamError::Initialization {
            reason: format!("Failed to install log subscriber: {}", e),
        })
}
