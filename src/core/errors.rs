//! Shared error types for the application

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors for a layermap run.
///
/// Problems with the scanned tree itself (missing root, unreadable files,
/// syntax errors) are never raised through this type; they are attached to
/// the [`AnalysisResult`](crate::report::AnalysisResult) as diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    /// The caller cancelled the scan; partial results were discarded
    #[error("Analysis cancelled")]
    Cancelled,

    /// The extraction worker pool could not be created
    #[error("Worker pool error: {0}")]
    ThreadPool(String),

    /// Configuration file errors
    #[error("Configuration error in {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl Error {
    /// Create a configuration error with path context
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether the error came from cooperative cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;
