//! One full scan: locate, extract, build, detect, layer.

use crate::analyzers::{extract_imports, Extraction, ModuleContext};
use crate::config::AnalyzeOptions;
use crate::core::{Diagnostic, Error, Module, Result, SourceFile};
use crate::graph::{
    compute_layers, cycle_members, detect_cycles, resolver_for, DependencyGraph, ModuleIndex,
};
use crate::io::reader::read_source;
use crate::io::walker::FileWalker;
use crate::report::{AnalysisResult, ScannedModule};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::Path;
use std::time::Instant;

/// Extraction workers get a larger stack for deeply nested syntax trees.
const WORKER_STACK_SIZE: usize = 8 * 1024 * 1024;

const PROGRESS_TEMPLATE: &str = "{spinner} Extracting imports [{bar:40}] {pos}/{len} {wide_msg}";

/// Analyze the Python tree under `root`.
///
/// Problems with the input never fail the call; they are reported as
/// warnings and diagnostics on the result. The only errors are cancellation
/// through `options.cancel` and failing to start the worker pool.
pub fn analyze(root: &Path, options: &AnalyzeOptions) -> Result<AnalysisResult> {
    let started = Instant::now();
    options.cancel.check()?;
    tracing::info!("Scanning {}", root.display());

    let listing = FileWalker::new(root.to_path_buf())
        .with_extensions(options.extensions.clone())
        .with_exclude_patterns(options.exclude_patterns.clone())
        .with_max_depth(options.follow_depth_limit)
        .with_tests(options.include_tests)
        .with_gitignore(options.respect_gitignore)
        .walk();
    for warning in &listing.warnings {
        tracing::warn!("{}", warning);
    }
    options.cancel.check()?;

    let outcomes = extract_all(&listing.files, options)?;
    options.cancel.check()?;

    let mut scanned = Vec::with_capacity(outcomes.len());
    let mut diagnostics = Vec::new();
    for (module, file_diagnostics) in outcomes {
        scanned.push(module);
        diagnostics.extend(file_diagnostics);
    }

    let modules: Vec<Module> = scanned.iter().map(|s| s.module.clone()).collect();
    let index = ModuleIndex::new(modules.iter().map(|m| m.canonical_name.as_str()));
    let resolver = resolver_for(&options.resolution, index);
    let graph = DependencyGraph::build(&modules, resolver.as_ref());

    let cycles = detect_cycles(&graph);
    let layering = compute_layers(&graph, &cycle_members(&cycles));

    let result = AnalysisResult::new(
        root,
        &scanned,
        &graph,
        cycles,
        layering,
        listing.warnings,
        diagnostics,
    );
    tracing::info!(
        "Finished {} in {:.2?}: {}",
        root.display(),
        started.elapsed(),
        result.summary
    );
    Ok(result)
}

type FileOutcome = (ScannedModule, Vec<Diagnostic>);

/// Extract every file, in locator order.
fn extract_all(files: &[SourceFile], options: &AnalyzeOptions) -> Result<Vec<FileOutcome>> {
    extract_all_with(files, options, |file| extract_file(file, options))
}

fn extract_all_with<F>(
    files: &[SourceFile],
    options: &AnalyzeOptions,
    extract_one: F,
) -> Result<Vec<FileOutcome>>
where
    F: Fn(&SourceFile) -> FileOutcome + Sync,
{
    let progress = progress_bar(files.len(), options.show_progress);
    let extract = |file: &SourceFile| -> Result<FileOutcome> {
        options.cancel.check()?;
        let outcome = extract_one(file);
        progress.inc(1);
        Ok(outcome)
    };

    let jobs = options.effective_jobs();
    let outcomes = if jobs <= 1 || files.len() <= 1 {
        files.iter().map(extract).collect::<Result<Vec<_>>>()
    } else {
        tracing::debug!("Extracting {} files on {} workers", files.len(), jobs);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .stack_size(WORKER_STACK_SIZE)
            .thread_name(|i| format!("layermap-worker-{}", i))
            .build()
            .map_err(|e| Error::ThreadPool(e.to_string()))?;
        pool.install(|| files.par_iter().map(extract).collect::<Result<Vec<_>>>())
    };

    progress.finish_and_clear();
    outcomes
}

fn extract_file(file: &SourceFile, options: &AnalyzeOptions) -> FileOutcome {
    let shown = file.relative_path.as_path();
    let extraction = match read_source(
        &file.path,
        shown,
        options.read_timeout,
        options.max_file_bytes,
    ) {
        Ok(source) => extract_imports(
            &source,
            ModuleContext::new(&file.canonical_name, file.is_package),
            shown,
        ),
        Err(diagnostic) => Extraction::failed(diagnostic),
    };

    for diagnostic in &extraction.diagnostics {
        tracing::debug!("{}", diagnostic);
    }
    tracing::debug!(
        "{} -> {} ({} imports, {:?})",
        shown.display(),
        file.canonical_name,
        extraction.imports.len(),
        extraction.strategy
    );

    let module = ScannedModule {
        module: Module::new(file, extraction.imports, extraction.package_members),
        strategy: extraction.strategy,
    };
    (module, extraction.diagnostics)
}

fn progress_bar(len: usize, show: bool) -> ProgressBar {
    if !show || len == 0 {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar().template(PROGRESS_TEMPLATE) {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}
