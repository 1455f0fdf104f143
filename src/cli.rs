use crate::config::{AnalyzeOptions, LayermapConfig, ReportFormat, ResolutionKind};
use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text report, stable across runs
    Text,
    /// The full result as JSON
    #[value(alias = "structured")]
    Json,
    /// Graphviz DOT of the import graph
    Dot,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => ReportFormat::Text,
            OutputFormat::Json => ReportFormat::Structured,
            OutputFormat::Dot => ReportFormat::Dot,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResolutionArg {
    /// Exact, then suffix matching
    Heuristic,
    /// Prefix map from the config file, exact matches only
    Namespace,
}

impl From<ResolutionArg> for ResolutionKind {
    fn from(arg: ResolutionArg) -> Self {
        match arg {
            ResolutionArg::Heuristic => ResolutionKind::Heuristic,
            ResolutionArg::Namespace => ResolutionKind::Namespace,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "layermap")]
#[command(about = "Import cycle and layering analyzer for Python source trees", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Root of the source tree
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Glob of root-relative paths to skip (repeatable)
    #[arg(long = "exclude", value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Directory levels below the root to descend into (0 = root files only)
    #[arg(long = "max-depth", value_name = "N")]
    pub max_depth: Option<usize>,

    /// Extraction worker threads (0 = one per CPU)
    #[arg(short = 'j', long = "jobs", env = "LAYERMAP_JOBS")]
    pub jobs: Option<usize>,

    /// List resolved and unresolved imports per module
    #[arg(long)]
    pub breakdown: bool,

    /// Also scan test_*.py, *_test.py and conftest.py
    #[arg(long = "include-tests")]
    pub include_tests: bool,

    /// Import resolution strategy
    #[arg(long, value_enum)]
    pub resolution: Option<ResolutionArg>,

    /// Configuration file (default: nearest .layermap.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Scan files ignored by .gitignore
    #[arg(long = "no-gitignore")]
    pub no_gitignore: bool,

    /// Never draw the progress bar
    #[arg(long = "no-progress")]
    pub no_progress: bool,

    /// Disable colored status output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Only log errors and skip the status line
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbosity: u8,
}

impl Cli {
    /// Options for this invocation: flags over `config` over defaults.
    pub fn analyze_options(&self, config: &LayermapConfig) -> AnalyzeOptions {
        let mut options = AnalyzeOptions::from_config(config);

        options.exclude_patterns.extend(self.exclude.iter().cloned());
        if self.max_depth.is_some() {
            options.follow_depth_limit = self.max_depth;
        }
        if let Some(jobs) = self.jobs {
            options.jobs = jobs;
        }
        if let Some(resolution) = self.resolution {
            options.resolution.strategy = resolution.into();
        }
        options.include_tests |= self.include_tests;
        options.respect_gitignore &= !self.no_gitignore;
        options.breakdown = self.breakdown;
        options.report_format = self.format.into();
        options
    }
}
