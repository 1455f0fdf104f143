// Shared fixtures for layermap integration tests
#![allow(dead_code)]

use layermap::{analyze, AnalysisResult, AnalyzeOptions};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// A temporary source tree built from `(relative path, contents)` pairs.
pub fn python_tree(files: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    for (relative, contents) in files {
        write_file(temp_dir.path(), relative, contents);
    }
    temp_dir
}

pub fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create fixture directory");
    }
    fs::write(&path, contents).expect("Failed to write fixture file");
}

/// Analyze with default options, single-threaded for stable diagnostics.
pub fn analyze_tree(root: &Path) -> AnalysisResult {
    analyze_with(root, AnalyzeOptions {
        jobs: 1,
        ..Default::default()
    })
}

pub fn analyze_with(root: &Path, options: AnalyzeOptions) -> AnalysisResult {
    analyze(root, &options).expect("analysis should not fail")
}

pub fn cycle_paths(result: &AnalysisResult) -> Vec<Vec<String>> {
    result
        .cycles
        .iter()
        .map(|cycle| cycle.path().to_vec())
        .collect()
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
