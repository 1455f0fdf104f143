pub mod cancel;
pub mod errors;

pub use cancel::CancellationToken;
pub use errors::{Error, Result};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// A source file found by the locator, before its imports are read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Absolute (or caller-supplied) path used for reading
    pub path: PathBuf,
    /// Path relative to the scan root, used for display
    pub relative_path: PathBuf,
    pub canonical_name: String,
    /// True for a package's `__init__` file
    pub is_package: bool,
}

/// The dotted package that relative imports in a file start from.
///
/// A package's `__init__` resolves `.` to itself; a plain module resolves it
/// to its parent.
pub(crate) fn base_package(canonical_name: &str, is_package: bool) -> &str {
    if is_package {
        canonical_name
    } else {
        canonical_name
            .rsplit_once('.')
            .map(|(parent, _)| parent)
            .unwrap_or("")
    }
}

/// One discovered module with the imports its source references.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub canonical_name: String,
    pub file_path: PathBuf,
    pub is_package: bool,
    /// Ordered, deduplicated import names, relative forms already normalized
    pub raw_imports: Vec<String>,
    /// Imports written as `from <package> import <name>`. Each may name an
    /// attribute of the package instead of a submodule, so the package
    /// itself is an acceptable target.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub package_members: BTreeSet<String>,
}

impl Module {
    pub fn new(
        source: &SourceFile,
        raw_imports: Vec<String>,
        package_members: BTreeSet<String>,
    ) -> Self {
        Self {
            canonical_name: source.canonical_name.clone(),
            file_path: source.relative_path.clone(),
            is_package: source.is_package,
            raw_imports,
            package_members,
        }
    }

    /// Package to fall back to when `raw` names no module.
    pub fn enclosing_package_of<'a>(&self, raw: &'a str) -> Option<&'a str> {
        if !self.package_members.contains(raw) {
            return None;
        }
        raw.rsplit_once('.').map(|(package, _)| package)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    RootMissing,
    RootNotDirectory,
    WalkError,
    InvalidPattern,
    ShadowedModule,
    ReadFailed,
    ReadTimeout,
    FileTooLarge,
    InvalidEncoding,
    StructuralParseFailed,
    ExtractionFailed,
    RelativeBeyondTop,
}

impl DiagnosticKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::RootMissing => "root-missing",
            Self::RootNotDirectory => "root-not-directory",
            Self::WalkError => "walk-error",
            Self::InvalidPattern => "invalid-pattern",
            Self::ShadowedModule => "shadowed-module",
            Self::ReadFailed => "read-failed",
            Self::ReadTimeout => "read-timeout",
            Self::FileTooLarge => "file-too-large",
            Self::InvalidEncoding => "invalid-encoding",
            Self::StructuralParseFailed => "structural-parse-failed",
            Self::ExtractionFailed => "extraction-failed",
            Self::RelativeBeyondTop => "relative-beyond-top",
        }
    }
}

/// A non-fatal finding about the scanned tree or one of its files.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: None,
            message: message.into(),
        }
    }

    pub fn with_path(
        kind: DiagnosticKind,
        path: impl AsRef<Path>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            path: Some(path.as_ref().to_path_buf()),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(
                f,
                "[{}] {}: {}",
                self.kind.label(),
                path.display(),
                self.message
            ),
            None => write!(f, "[{}] {}", self.kind.label(), self.message),
        }
    }
}
