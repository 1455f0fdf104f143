//! Import extraction for a single module.
//!
//! [`extract_imports`] tries the structural extractor first and falls back
//! to line patterns when the file does not parse. Relative imports are
//! rewritten against the importing module's package before they leave this
//! module, so the graph builder only ever sees absolute dotted names.

pub mod patterns;
pub mod python;

use crate::core::{base_package, Diagnostic, DiagnosticKind};
use crate::io::reader::SourceText;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

pub use patterns::PatternImportExtractor;
pub use python::PythonImportExtractor;

/// One import statement clause as written in source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImportRef {
    /// `import a.b`
    Absolute(String),
    /// `from <level dots><module> import <names>`
    From {
        level: usize,
        module: Option<String>,
        names: Vec<String>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    Structural,
    Pattern,
    /// Nothing could be read; the import list is empty
    Failed,
}

pub trait ImportExtractor: Send + Sync {
    fn extract(&self, source: &str) -> Result<Vec<ImportRef>>;
    fn strategy(&self) -> ExtractionStrategy;
}

/// What an importing module needs to know to normalize relative imports.
#[derive(Clone, Copy, Debug)]
pub struct ModuleContext<'a> {
    pub canonical_name: &'a str,
    pub is_package: bool,
}

impl<'a> ModuleContext<'a> {
    pub fn new(canonical_name: &'a str, is_package: bool) -> Self {
        Self {
            canonical_name,
            is_package,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Extraction {
    /// Ordered by first appearance, deduplicated
    pub imports: Vec<String>,
    /// Subset of `imports` expanded from `from <package> import <name>`
    pub package_members: BTreeSet<String>,
    pub strategy: ExtractionStrategy,
    pub diagnostics: Vec<Diagnostic>,
}

impl Extraction {
    pub fn failed(diagnostic: Diagnostic) -> Self {
        Self {
            imports: Vec::new(),
            package_members: BTreeSet::new(),
            strategy: ExtractionStrategy::Failed,
            diagnostics: vec![diagnostic],
        }
    }
}

/// Normalized imports of one module.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizedImports {
    pub imports: Vec<String>,
    pub package_members: BTreeSet<String>,
}

/// Extract the normalized import names of one module's source.
///
/// Never fails: parse problems fall through to the pattern extractor and are
/// recorded as diagnostics.
pub fn extract_imports(
    source: &SourceText,
    context: ModuleContext<'_>,
    shown: &Path,
) -> Extraction {
    let structural = PythonImportExtractor::new();
    let fallback = PatternImportExtractor::new();
    let mut diagnostics = Vec::new();

    let extractors: Vec<&dyn ImportExtractor> = if source.lossy {
        diagnostics.push(Diagnostic::with_path(
            DiagnosticKind::InvalidEncoding,
            shown,
            "file is not valid UTF-8; decoded lossily and matched line by line",
        ));
        vec![&fallback]
    } else {
        vec![&structural, &fallback]
    };

    for extractor in extractors {
        match extractor.extract(&source.text) {
            Ok(refs) => {
                let normalized = normalize_imports(&refs, context, shown, &mut diagnostics);
                tracing::trace!(
                    "{}: {} imports via {:?}",
                    shown.display(),
                    normalized.imports.len(),
                    extractor.strategy()
                );
                return Extraction {
                    imports: normalized.imports,
                    package_members: normalized.package_members,
                    strategy: extractor.strategy(),
                    diagnostics,
                };
            }
            Err(e) => {
                let kind = match extractor.strategy() {
                    ExtractionStrategy::Structural => DiagnosticKind::StructuralParseFailed,
                    _ => DiagnosticKind::ExtractionFailed,
                };
                tracing::debug!(
                    "{}: {:?} extraction failed: {:#}",
                    shown.display(),
                    extractor.strategy(),
                    e
                );
                diagnostics.push(Diagnostic::with_path(kind, shown, format!("{:#}", e)));
            }
        }
    }

    Extraction {
        imports: Vec::new(),
        package_members: BTreeSet::new(),
        strategy: ExtractionStrategy::Failed,
        diagnostics,
    }
}

/// Rewrite references to absolute dotted names, keeping first-seen order.
pub fn normalize_imports(
    refs: &[ImportRef],
    context: ModuleContext<'_>,
    shown: &Path,
    diagnostics: &mut Vec<Diagnostic>,
) -> NormalizedImports {
    let mut seen = HashSet::new();
    let mut normalized = NormalizedImports::default();

    for import in refs {
        for (name, is_member) in normalize_ref(import, context, shown, diagnostics) {
            if is_member {
                normalized.package_members.insert(name.clone());
            }
            if seen.insert(name.clone()) {
                normalized.imports.push(name);
            }
        }
    }
    normalized
}

// Each name is paired with whether it came from `from <package> import <name>`.
fn normalize_ref(
    import: &ImportRef,
    context: ModuleContext<'_>,
    shown: &Path,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<(String, bool)> {
    let (level, module, names) = match import {
        ImportRef::Absolute(module) => return vec![(module.clone(), false)],
        ImportRef::From {
            level: 0,
            module: Some(module),
            ..
        } => return vec![(module.clone(), false)],
        ImportRef::From { level: 0, .. } => return Vec::new(),
        ImportRef::From {
            level,
            module,
            names,
        } => (*level, module.as_deref(), names),
    };

    let Some(prefix) = relative_base(context, level) else {
        let literal = format!("{}{}", ".".repeat(level), module.unwrap_or(""));
        diagnostics.push(Diagnostic::with_path(
            DiagnosticKind::RelativeBeyondTop,
            shown,
            format!(
                "'{}' climbs above the top-level package from '{}'",
                literal, context.canonical_name
            ),
        ));
        return vec![(literal, false)];
    };

    match module {
        Some(module) => vec![(join_dotted(&prefix, module), false)],
        None => names
            .iter()
            .filter_map(|name| {
                if name == "*" {
                    (!prefix.is_empty()).then(|| (prefix.clone(), false))
                } else {
                    Some((join_dotted(&prefix, name), !prefix.is_empty()))
                }
            })
            .collect(),
    }
}

/// Package a relative import of `level` dots starts from, or `None` if it
/// climbs past the top level.
fn relative_base(context: ModuleContext<'_>, level: usize) -> Option<String> {
    let base = base_package(context.canonical_name, context.is_package);
    let parts: Vec<&str> = if base.is_empty() {
        Vec::new()
    } else {
        base.split('.').collect()
    };
    let climb = level.saturating_sub(1);
    if climb > parts.len() {
        return None;
    }
    Some(parts[..parts.len() - climb].join("."))
}

fn join_dotted(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn text(source: &str) -> SourceText {
        SourceText {
            text: source.to_string(),
            lossy: false,
        }
    }

    fn extract(source: &str, name: &str, is_package: bool) -> Extraction {
        extract_imports(
            &text(source),
            ModuleContext::new(name, is_package),
            Path::new("mod.py"),
        )
    }

    #[test]
    fn test_relative_imports_from_module() {
        let extraction = extract(
            indoc! {"
                from . import sibling, other
                from .helpers import fmt
                from ..core import models
                from ... import top
            "},
            "app.web.views",
            false,
        );
        assert_eq!(extraction.strategy, ExtractionStrategy::Structural);
        assert_eq!(
            extraction.imports,
            vec![
                "app.web.sibling",
                "app.web.other",
                "app.web.helpers",
                "app.core",
                "top",
            ]
        );
        assert!(extraction.diagnostics.is_empty());
    }

    #[test]
    fn test_relative_imports_from_package_init() {
        let extraction = extract("from . import views\nfrom .models import User\n", "app", true);
        assert_eq!(extraction.imports, vec!["app.views", "app.models"]);
    }

    #[test]
    fn test_from_package_names_are_package_members() {
        let extraction = extract(
            "from . import helpers\nfrom .models import User\nimport app.api\n",
            "app.views",
            false,
        );
        assert_eq!(
            extraction.imports,
            vec!["app.helpers", "app.models", "app.api"]
        );
        assert_eq!(
            extraction.package_members,
            BTreeSet::from(["app.helpers".to_string()])
        );
    }

    #[test]
    fn test_top_level_from_dot_has_no_package() {
        let extraction = extract("from . import sibling\n", "main", false);
        assert_eq!(extraction.imports, vec!["sibling"]);
        assert!(extraction.package_members.is_empty());
    }

    #[test]
    fn test_relative_import_beyond_top_is_kept_literal() {
        let extraction = extract("from ...outside import thing\n", "app.views", false);
        assert_eq!(extraction.imports, vec!["...outside"]);
        assert_eq!(
            extraction.diagnostics[0].kind,
            DiagnosticKind::RelativeBeyondTop
        );
    }

    #[test]
    fn test_duplicates_are_removed_in_order() {
        let extraction = extract(
            "import b\nimport a\nfrom b import x\nimport a.sub\n",
            "main",
            false,
        );
        assert_eq!(extraction.imports, vec!["b", "a", "a.sub"]);
    }

    #[test]
    fn test_syntax_error_falls_back_to_patterns() {
        let extraction = extract("import app.models\ndef broken(:\n    pass\n", "main", false);
        assert_eq!(extraction.strategy, ExtractionStrategy::Pattern);
        assert_eq!(extraction.imports, vec!["app.models"]);
        assert_eq!(
            extraction.diagnostics[0].kind,
            DiagnosticKind::StructuralParseFailed
        );
    }

    #[test]
    fn test_lossy_source_uses_patterns_only() {
        let source = SourceText {
            text: "import caf\u{FFFD}\nimport app\n".to_string(),
            lossy: true,
        };
        let extraction = extract_imports(
            &source,
            ModuleContext::new("main", false),
            Path::new("main.py"),
        );
        assert_eq!(extraction.strategy, ExtractionStrategy::Pattern);
        assert_eq!(extraction.imports, vec!["app"]);
        assert_eq!(
            extraction.diagnostics[0].kind,
            DiagnosticKind::InvalidEncoding
        );
    }

    #[test]
    fn test_empty_source() {
        let extraction = extract("", "main", false);
        assert_eq!(extraction.strategy, ExtractionStrategy::Structural);
        assert!(extraction.imports.is_empty());
    }
}
