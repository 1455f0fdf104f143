//! Cooperative cancellation for long scans.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::errors::{Error, Result};

/// Shared flag checked between files during a scan.
///
/// Clones share the same flag, so a caller can keep one handle and pass
/// another into [`AnalyzeOptions`](crate::config::AnalyzeOptions).
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Return `Err(Error::Cancelled)` once cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}
