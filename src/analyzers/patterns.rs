//! Line-oriented import matching, used when the structural parse fails.
//!
//! Works on logical lines: bracketed and backslash continuations of import
//! statements are joined first, and lines inside triple-quoted strings are
//! skipped. Malformed input never errors; anything unreadable is simply not
//! reported.

use super::{ExtractionStrategy, ImportExtractor, ImportRef};
use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;

static IMPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*import\s+(.+)$").expect("valid import regex"));

static FROM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*from\s+(\.*)\s*([A-Za-z_][\w.]*)?\s+import\s+(.+)$")
        .expect("valid from-import regex")
});

static DOTTED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_]\w*(\.[A-Za-z_]\w*)*$").expect("valid dotted regex"));

static IDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_]\w*$").expect("valid identifier regex"));

pub struct PatternImportExtractor;

impl PatternImportExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PatternImportExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportExtractor for PatternImportExtractor {
    fn extract(&self, source: &str) -> Result<Vec<ImportRef>> {
        Ok(logical_lines(source)
            .iter()
            .flat_map(|line| line.split(';'))
            .flat_map(match_statement)
            .collect())
    }

    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::Pattern
    }
}

fn match_statement(statement: &str) -> Vec<ImportRef> {
    if let Some(caps) = FROM_RE.captures(statement) {
        let level = caps.get(1).map_or(0, |m| m.as_str().len());
        let module = caps.get(2).map(|m| m.as_str().to_string());
        if module.as_deref() == Some("__future__") || (level == 0 && module.is_none()) {
            return Vec::new();
        }
        let names = split_names(caps.get(3).map_or("", |m| m.as_str()))
            .filter(|name| *name == "*" || IDENT_RE.is_match(name))
            .map(str::to_string)
            .collect();
        return vec![ImportRef::From {
            level,
            module,
            names,
        }];
    }

    match IMPORT_RE.captures(statement) {
        Some(caps) => split_names(caps.get(1).map_or("", |m| m.as_str()))
            .filter(|name| DOTTED_RE.is_match(name))
            .map(|name| ImportRef::Absolute(name.to_string()))
            .collect(),
        None => Vec::new(),
    }
}

/// Comma-separated clause names with parentheses and `as` aliases removed.
fn split_names(list: &str) -> impl Iterator<Item = &str> {
    list.split(',')
        .map(|item| item.trim().trim_matches(|c| c == '(' || c == ')').trim())
        .map(|item| item.split_whitespace().next().unwrap_or(""))
        .filter(|item| !item.is_empty())
}

fn strip_comment(line: &str) -> &str {
    line.split_once('#').map_or(line, |(code, _)| code)
}

fn starts_import_statement(code: &str) -> bool {
    matches!(code.split_whitespace().next(), Some("import" | "from"))
}

/// Join import continuations and drop lines inside triple-quoted strings.
fn logical_lines(source: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut depth: i32 = 0;
    let mut in_docstring: Option<&str> = None;

    for raw in source.lines() {
        if let Some(quote) = in_docstring {
            if raw.contains(quote) {
                in_docstring = None;
            }
            continue;
        }

        let trimmed = raw.trim_start();
        if let Some(quote) = ["\"\"\"", "'''"].into_iter().find(|q| trimmed.starts_with(q)) {
            if !trimmed[quote.len()..].contains(quote) {
                in_docstring = Some(quote);
            }
            continue;
        }

        let code = strip_comment(raw);
        if current.is_empty() && !starts_import_statement(code) {
            lines.push(code.to_string());
            continue;
        }

        depth += code.matches(['(', '[', '{']).count() as i32;
        depth -= code.matches([')', ']', '}']).count() as i32;

        let (code, continued) = match code.trim_end().strip_suffix('\\') {
            Some(stripped) => (stripped, true),
            None => (code, false),
        };
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(code.trim());

        if depth <= 0 && !continued {
            lines.push(std::mem::take(&mut current));
            depth = 0;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
