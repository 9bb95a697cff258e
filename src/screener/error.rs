//! Error types for the screener module

use crate::exchange::ProviderError;
use thiserror::Error;

/// Errors that abort a screening run
///
/// Per-target and per-anchor failures never surface here; they are recorded
/// in the `ScreenReport` and the run continues.
#[derive(Error, Debug)]
pub enum ScreenerError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Symbol universe could not be listed
    #[error("Failed to list symbols: {0}")]
    Listing(#[source] ProviderError),

    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
