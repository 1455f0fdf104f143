// Export modules for library usage
pub mod analyzers;
pub mod cli;
pub mod config;
pub mod core;
pub mod graph;
pub mod io;
pub mod observability;
pub mod pipeline;
pub mod report;

// Re-export commonly used types
pub use crate::config::{AnalyzeOptions, LayermapConfig, ReportFormat, ResolutionConfig};
pub use crate::core::{
    CancellationToken, Diagnostic, DiagnosticKind, Error, Module, Result, SourceFile,
};
pub use crate::graph::{
    compute_layers, cycle_members, detect_cycles, Cycle, DependencyGraph, LayerAssignment,
    Layering, LayeringError, ResolutionStrategy,
};
pub use crate::io::output::{create_writer, render, ReportWriter};
pub use crate::pipeline::analyze;
pub use crate::report::{AnalysisResult, ModuleReport};
