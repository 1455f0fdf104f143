pub mod output;
pub mod reader;
pub mod walker;

pub use output::{create_writer, render, DotWriter, JsonWriter, ReportWriter, TextWriter};
pub use reader::{read_source, SourceText};
pub use walker::{FileWalker, ScanListing};

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Write a rendered report, creating the parent directory if needed.
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory {}", path.display()))?;
    }
    Ok(())
}
