//! Configuration for a layermap run.
//!
//! [`LayermapConfig`] mirrors the optional `.layermap.toml` file;
//! [`AnalyzeOptions`] is the resolved set of knobs handed to
//! [`analyze`](crate::analyze). Command-line flags override the file, which
//! overrides the defaults here.

pub mod loader;

pub use loader::{
    directory_ancestors, load_config, load_config_file, parse_config, CONFIG_FILE_NAME,
};

use crate::core::CancellationToken;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Default per-file read timeout
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 5_000;

/// Files larger than this are not read (4 MiB)
pub const DEFAULT_MAX_FILE_BYTES: u64 = 4 * 1024 * 1024;

fn default_extensions() -> Vec<String> {
    vec!["py".to_string()]
}

/// How the report is rendered.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Plain, line-oriented text meant for diffing in CI
    #[default]
    Text,
    /// The full result as JSON
    #[serde(alias = "json")]
    Structured,
    /// Graphviz DOT of the import graph
    Dot,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionKind {
    /// Exact, then suffix matching
    #[default]
    Heuristic,
    /// Explicit prefix rewrites followed by exact matching only
    Namespace,
}

/// Which resolution strategy the graph builder uses.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolutionConfig {
    pub strategy: ResolutionKind,
    /// Import prefix -> canonical prefix, e.g. `"acme" = "src.acme"`
    pub namespaces: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParallelSection {
    /// Worker threads for extraction; 0 or absent means one per CPU
    pub jobs: Option<usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsSection {
    pub read_timeout_ms: Option<u64>,
    pub max_file_bytes: Option<u64>,
}

/// Contents of `.layermap.toml`. Every field is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayermapConfig {
    pub exclude_patterns: Vec<String>,
    pub follow_depth_limit: Option<usize>,
    pub extensions: Option<Vec<String>>,
    pub include_tests: Option<bool>,
    pub respect_gitignore: Option<bool>,
    pub parallel: ParallelSection,
    pub limits: LimitsSection,
    pub resolution: ResolutionConfig,
}

/// Options for a single [`analyze`](crate::analyze) call.
#[derive(Clone, Debug)]
pub struct AnalyzeOptions {
    /// Globs matched against root-relative paths; matches are skipped
    pub exclude_patterns: Vec<String>,
    /// Directory levels below the root to descend into (0 = root files only)
    pub follow_depth_limit: Option<usize>,
    pub report_format: ReportFormat,
    /// Include the per-module import breakdown in text reports
    pub breakdown: bool,
    /// Scan `test_*.py`, `*_test.py` and `conftest.py` too
    pub include_tests: bool,
    pub extensions: Vec<String>,
    pub respect_gitignore: bool,
    /// Extraction workers; 0 means one per CPU
    pub jobs: usize,
    pub read_timeout: Duration,
    pub max_file_bytes: u64,
    pub resolution: ResolutionConfig,
    pub cancel: CancellationToken,
    pub show_progress: bool,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            exclude_patterns: Vec::new(),
            follow_depth_limit: None,
            report_format: ReportFormat::default(),
            breakdown: false,
            include_tests: false,
            extensions: default_extensions(),
            respect_gitignore: true,
            jobs: 0,
            read_timeout: Duration::from_millis(DEFAULT_READ_TIMEOUT_MS),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            resolution: ResolutionConfig::default(),
            cancel: CancellationToken::new(),
            show_progress: false,
        }
    }
}

impl AnalyzeOptions {
    /// Layer a config file over the defaults.
    pub fn from_config(config: &LayermapConfig) -> Self {
        let defaults = Self::default();
        Self {
            exclude_patterns: config.exclude_patterns.clone(),
            follow_depth_limit: config.follow_depth_limit,
            extensions: config
                .extensions
                .clone()
                .filter(|exts| !exts.is_empty())
                .unwrap_or(defaults.extensions),
            include_tests: config.include_tests.unwrap_or(defaults.include_tests),
            respect_gitignore: config
                .respect_gitignore
                .unwrap_or(defaults.respect_gitignore),
            jobs: config.parallel.jobs.unwrap_or(defaults.jobs),
            read_timeout: config
                .limits
                .read_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.read_timeout),
            max_file_bytes: config
                .limits
                .max_file_bytes
                .unwrap_or(defaults.max_file_bytes),
            resolution: config.resolution.clone(),
            ..defaults
        }
    }

    /// Worker count after resolving `0` to the machine's parallelism.
    pub fn effective_jobs(&self) -> usize {
        if self.jobs == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            self.jobs
        }
    }
}
