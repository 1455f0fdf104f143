//! Bounded file reads.
//!
//! Every module read goes through [`read_source`], which caps both the size
//! of the file and the time spent waiting on it, so one pathological file
//! cannot stall a whole scan.

use crate::core::{Diagnostic, DiagnosticKind};
use crossbeam::channel::{bounded, RecvTimeoutError};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Decoded contents of one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    pub text: String,
    /// The bytes were not valid UTF-8 and were decoded lossily
    pub lossy: bool,
}

impl SourceText {
    fn decode(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(text) => Self { text, lossy: false },
            Err(e) => Self {
                text: String::from_utf8_lossy(e.as_bytes()).into_owned(),
                lossy: true,
            },
        }
    }
}

/// Read `path`, giving up after `timeout` or if it exceeds `max_bytes`.
///
/// `shown` is the path used in diagnostics (normally root-relative).
pub fn read_source(
    path: &Path,
    shown: &Path,
    timeout: Duration,
    max_bytes: u64,
) -> Result<SourceText, Diagnostic> {
    let metadata = fs::metadata(path)
        .map_err(|e| Diagnostic::with_path(DiagnosticKind::ReadFailed, shown, e.to_string()))?;

    if metadata.len() > max_bytes {
        return Err(Diagnostic::with_path(
            DiagnosticKind::FileTooLarge,
            shown,
            format!(
                "{} bytes exceeds the {} byte limit; imports not read",
                metadata.len(),
                max_bytes
            ),
        ));
    }

    let (tx, rx) = bounded(1);
    let owned = path.to_path_buf();
    std::thread::Builder::new()
        .name("layermap-read".to_string())
        .spawn(move || {
            // The receiver is gone if the read already timed out.
            let _ = tx.send(fs::read(&owned));
        })
        .map_err(|e| Diagnostic::with_path(DiagnosticKind::ReadFailed, shown, e.to_string()))?;

    match rx.recv_timeout(timeout) {
        Ok(Ok(bytes)) => Ok(SourceText::decode(bytes)),
        Ok(Err(e)) => Err(Diagnostic::with_path(
            DiagnosticKind::ReadFailed,
            shown,
            e.to_string(),
        )),
        Err(RecvTimeoutError::Timeout) => Err(Diagnostic::with_path(
            DiagnosticKind::ReadTimeout,
            shown,
            format!("no data after {} ms", timeout.as_millis()),
        )),
        Err(RecvTimeoutError::Disconnected) => Err(Diagnostic::with_path(
            DiagnosticKind::ReadFailed,
            shown,
            "reader thread exited without a result",
        )),
    }
}
