//! Module discovery: which files under a root are modules, and their names.

use crate::core::{Diagnostic, DiagnosticKind, SourceFile};
use ignore::{DirEntry, WalkBuilder};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// Build-artifact, cache and environment directories never worth scanning.
const EXCLUDED_DIRS: &[&str] = &[
    "__pycache__",
    ".git",
    ".hg",
    ".svn",
    ".venv",
    "venv",
    "env",
    ".tox",
    ".nox",
    ".mypy_cache",
    ".pytest_cache",
    ".ruff_cache",
    "build",
    "dist",
    "node_modules",
    "target",
    "site-packages",
];

/// Files found under a root, sorted by canonical name.
#[derive(Debug, Default, Clone)]
pub struct ScanListing {
    pub files: Vec<SourceFile>,
    pub warnings: Vec<Diagnostic>,
}

pub struct FileWalker {
    root: PathBuf,
    extensions: Vec<String>,
    exclude_patterns: Vec<String>,
    max_depth: Option<usize>,
    include_tests: bool,
    respect_gitignore: bool,
}

impl FileWalker {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            extensions: vec!["py".to_string()],
            exclude_patterns: vec![],
            max_depth: None,
            include_tests: false,
            respect_gitignore: true,
        }
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    /// Directory levels below the root to descend into (0 = root files only).
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_tests(mut self, include_tests: bool) -> Self {
        self.include_tests = include_tests;
        self
    }

    pub fn with_gitignore(mut self, respect_gitignore: bool) -> Self {
        self.respect_gitignore = respect_gitignore;
        self
    }

    /// Enumerate modules under the root.
    ///
    /// Never fails: a bad root or unreadable entries turn into warnings on
    /// the returned listing.
    pub fn walk(&self) -> ScanListing {
        let mut listing = ScanListing::default();

        if !self.root.exists() {
            listing.warnings.push(Diagnostic::with_path(
                DiagnosticKind::RootMissing,
                &self.root,
                "root path does not exist",
            ));
            return listing;
        }
        if !self.root.is_dir() {
            listing.warnings.push(Diagnostic::with_path(
                DiagnosticKind::RootNotDirectory,
                &self.root,
                "root path is not a directory",
            ));
            return listing;
        }

        let patterns = self.compile_patterns(&mut listing.warnings);
        let mut by_name: BTreeMap<String, SourceFile> = BTreeMap::new();

        for entry in self.build_walker(patterns.clone()) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    listing
                        .warnings
                        .push(Diagnostic::new(DiagnosticKind::WalkError, e.to_string()));
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = entry.path();
            let Ok(relative) = path.strip_prefix(&self.root) else {
                continue;
            };
            if !self.should_process(relative, &patterns) {
                continue;
            }

            let Some((canonical_name, is_package)) = canonical_module_name(relative) else {
                tracing::debug!("Skipping unnamed module file {}", relative.display());
                continue;
            };

            let candidate = SourceFile {
                path: path.to_path_buf(),
                relative_path: relative.to_path_buf(),
                canonical_name: canonical_name.clone(),
                is_package,
            };
            insert_or_shadow(&mut by_name, candidate, &mut listing.warnings);
        }

        listing.files = by_name.into_values().collect();
        tracing::debug!(
            "Located {} modules under {}",
            listing.files.len(),
            self.root.display()
        );
        listing
    }

    fn compile_patterns(&self, warnings: &mut Vec<Diagnostic>) -> Vec<glob::Pattern> {
        self.exclude_patterns
            .iter()
            .filter_map(|raw| match glob::Pattern::new(raw) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    warnings.push(Diagnostic::new(
                        DiagnosticKind::InvalidPattern,
                        format!("ignoring exclude pattern '{}': {}", raw, e),
                    ));
                    None
                }
            })
            .collect()
    }

    fn build_walker(&self, patterns: Vec<glob::Pattern>) -> ignore::Walk {
        let root = self.root.clone();
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(false)
            .git_ignore(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .git_global(false)
            .parents(self.respect_gitignore)
            .ignore(self.respect_gitignore)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .max_depth(self.max_depth.map(|depth| depth + 1))
            .filter_entry(move |entry| keep_directory(entry, &root, &patterns));
        builder.build()
    }

    fn should_process(&self, relative: &Path, patterns: &[glob::Pattern]) -> bool {
        let has_extension = relative
            .extension()
            .map(|ext| ext.to_string_lossy())
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext.as_ref()));
        if !has_extension {
            return false;
        }
        if !self.include_tests && is_test_file(relative) {
            return false;
        }
        !matches_any(patterns, relative)
    }
}

fn keep_directory(entry: &DirEntry, root: &Path, patterns: &[glob::Pattern]) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_some_and(|t| t.is_dir()) {
        return true;
    }
    let name = entry.file_name().to_string_lossy();
    if is_excluded_dir(&name) {
        return false;
    }
    match entry.path().strip_prefix(root) {
        Ok(relative) => !matches_any(patterns, relative),
        Err(_) => true,
    }
}

fn matches_any(patterns: &[glob::Pattern], relative: &Path) -> bool {
    if patterns.is_empty() {
        return false;
    }
    let normalized = to_slash_path(relative);
    patterns.iter().any(|p| p.matches(&normalized))
}

fn to_slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn insert_or_shadow(
    by_name: &mut BTreeMap<String, SourceFile>,
    candidate: SourceFile,
    warnings: &mut Vec<Diagnostic>,
) {
    let Some(existing) = by_name.get(&candidate.canonical_name) else {
        by_name.insert(candidate.canonical_name.clone(), candidate);
        return;
    };

    // A package directory takes precedence over a same-named module file.
    let (winner, loser) = if candidate.is_package && !existing.is_package {
        (candidate, existing.clone())
    } else {
        (existing.clone(), candidate)
    };
    warnings.push(Diagnostic::with_path(
        DiagnosticKind::ShadowedModule,
        &loser.relative_path,
        format!(
            "module '{}' is shadowed by {}",
            loser.canonical_name,
            winner.relative_path.display()
        ),
    ));
    by_name.insert(winner.canonical_name.clone(), winner);
}

/// Whether a directory name is a build artifact or cache directory.
pub fn is_excluded_dir(name: &str) -> bool {
    EXCLUDED_DIRS.contains(&name) || name.ends_with(".egg-info")
}

/// `test_*.py`, `*_test.py` and `conftest.py` are test-only by convention.
pub fn is_test_file(path: &Path) -> bool {
    let Some(stem) = path.file_stem().map(|s| s.to_string_lossy()) else {
        return false;
    };
    stem.starts_with("test_") || stem.ends_with("_test") || stem == "conftest"
}

/// Dotted module name for a root-relative file path, and whether the file is
/// a package `__init__`.
///
/// Returns `None` for a root-level `__init__`, which has no importable name.
pub fn canonical_module_name(relative: &Path) -> Option<(String, bool)> {
    let mut parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    let last = parts.pop()?;
    let stem = Path::new(&last)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())?;

    let is_package = stem == "__init__";
    if !is_package {
        parts.push(stem);
    }

    if parts.is_empty() {
        None
    } else {
        Some((parts.join("."), is_package))
    }
}
