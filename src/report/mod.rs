//! The terminal aggregate of one scan.

use crate::analyzers::ExtractionStrategy;
use crate::core::{Diagnostic, Module};
use crate::graph::{cycle_members, Cycle, DependencyGraph, Layering, LayeringError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A module with the strategy that produced its import list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedModule {
    pub module: Module,
    pub strategy: ExtractionStrategy,
}

/// Per-module breakdown of resolved and unresolved imports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleReport {
    pub name: String,
    /// Relative to the scan root
    pub path: PathBuf,
    pub is_package: bool,
    pub strategy: ExtractionStrategy,
    /// `None` for cycle members, or when layering failed
    pub layer: Option<usize>,
    pub resolved: Vec<String>,
    pub unresolved: Vec<String>,
    pub self_import: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub root: PathBuf,
    pub total_modules: usize,
    pub edge_count: usize,
    pub unresolved_import_count: usize,
    pub cycles: Vec<Cycle>,
    pub has_cycles: bool,
    pub cycle_count: usize,
    pub layers: Vec<Vec<String>>,
    /// Cycle members, left out of layering
    pub unlayerable: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_error: Option<LayeringError>,
    pub modules: Vec<ModuleReport>,
    /// Problems with the scan input as a whole
    pub warnings: Vec<Diagnostic>,
    /// Per-file extraction findings
    pub diagnostics: Vec<Diagnostic>,
    pub summary: String,
}

impl AnalysisResult {
    pub fn new(
        root: &Path,
        scanned: &[ScannedModule],
        graph: &DependencyGraph,
        cycles: Vec<Cycle>,
        layering: Result<Layering, LayeringError>,
        warnings: Vec<Diagnostic>,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        let (layering, layer_error) = match layering {
            Ok(layering) => (layering, None),
            Err(e) => (Layering::default(), Some(e)),
        };

        let modules = scanned
            .iter()
            .map(|scanned| {
                let name = &scanned.module.canonical_name;
                ModuleReport {
                    name: name.clone(),
                    path: scanned.module.file_path.clone(),
                    is_package: scanned.module.is_package,
                    strategy: scanned.strategy,
                    layer: layering.layer_of(name),
                    resolved: graph.dependencies(name).map(str::to_string).collect(),
                    unresolved: graph.unresolved_for(name).map(str::to_string).collect(),
                    self_import: graph.has_self_import(name),
                }
            })
            .collect();

        let mut result = Self {
            root: root.to_path_buf(),
            total_modules: graph.module_count(),
            edge_count: graph.edge_count(),
            unresolved_import_count: graph.unresolved_count(),
            has_cycles: !cycles.is_empty(),
            cycle_count: cycles.len(),
            unlayerable: cycle_members(&cycles).into_iter().collect(),
            cycles,
            layers: layering.layers,
            layer_error,
            modules,
            warnings,
            diagnostics,
            summary: String::new(),
        };
        result.summary = result.build_summary();
        result
    }

    /// No cycles, no input warnings and a consistent layering.
    pub fn is_clean(&self) -> bool {
        !self.has_cycles && self.warnings.is_empty() && self.layer_error.is_none()
    }

    pub fn module(&self, name: &str) -> Option<&ModuleReport> {
        self.modules.iter().find(|m| m.name == name)
    }

    fn build_summary(&self) -> String {
        let cycles = match self.cycle_count {
            0 => "no cycles".to_string(),
            n => format!("{} {}", n, plural(n, "cycle", "cycles")),
        };
        let layers = if self.layer_error.is_some() {
            "layering failed".to_string()
        } else {
            format!(
                "{} {}",
                self.layers.len(),
                plural(self.layers.len(), "layer", "layers")
            )
        };
        format!(
            "{} {}, {} {}, {} unresolved {}, {}, {}",
            self.total_modules,
            plural(self.total_modules, "module", "modules"),
            self.edge_count,
            plural(self.edge_count, "edge", "edges"),
            self.unresolved_import_count,
            plural(self.unresolved_import_count, "import", "imports"),
            cycles,
            layers
        )
    }
}

fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 {
        one
    } else {
        many
    }
}
