use super::{ExtractionStrategy, ImportExtractor, ImportRef};
use anyhow::{anyhow, Context, Result};
use tree_sitter::{Node, Parser};

/// Structural import extraction over a tree-sitter-python syntax tree.
///
/// A parser is built per call; tree-sitter parsers carry mutable state and
/// are not shared between worker threads.
pub struct PythonImportExtractor;

impl PythonImportExtractor {
    pub fn new() -> Self {
        Self
    }

    fn parser() -> Result<Parser> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .context("Failed to set Python language")?;
        Ok(parser)
    }
}

impl Default for PythonImportExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportExtractor for PythonImportExtractor {
    fn extract(&self, source: &str) -> Result<Vec<ImportRef>> {
        let tree = Self::parser()?
            .parse(source, None)
            .context("Failed to parse Python code")?;
        let root = tree.root_node();

        if root.has_error() {
            let line = find_error(root)
                .map(|node| node.start_position().row + 1)
                .unwrap_or(1);
            return Err(anyhow!("syntax error near line {}", line));
        }

        let mut imports = Vec::new();
        visit_node_for_imports(root, source.as_bytes(), &mut imports);
        Ok(imports)
    }

    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::Structural
    }
}

fn find_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error())
        .find_map(find_error)
}

fn visit_node_for_imports(node: Node, source: &[u8], imports: &mut Vec<ImportRef>) {
    match node.kind() {
        // import a.b, c as d
        "import_statement" => {
            for name in node.children_by_field_name("name", &mut node.walk()) {
                if let Some(module) = imported_name(name, source) {
                    imports.push(ImportRef::Absolute(module));
                }
            }
            return;
        }
        // from X import y / from . import y
        "import_from_statement" => {
            if let Some(import) = from_import(node, source) {
                imports.push(import);
            }
            return;
        }
        // from __future__ import annotations
        "future_import_statement" => return,
        _ => {}
    }

    for child in node.named_children(&mut node.walk()) {
        visit_node_for_imports(child, source, imports);
    }
}

fn from_import(node: Node, source: &[u8]) -> Option<ImportRef> {
    let module_node = node.child_by_field_name("module_name")?;
    let module_text = compact_text(module_node, source)?;

    let (level, module) = match module_node.kind() {
        "relative_import" => {
            let level = module_text.chars().take_while(|c| *c == '.').count();
            let rest = module_text[level..].to_string();
            (level, (!rest.is_empty()).then_some(rest))
        }
        _ => (0, Some(module_text)),
    };

    let mut names: Vec<String> = node
        .children_by_field_name("name", &mut node.walk())
        .filter_map(|name| imported_name(name, source))
        .collect();

    let mut cursor = node.walk();
    if node
        .named_children(&mut cursor)
        .any(|child| child.kind() == "wildcard_import")
    {
        names.push("*".to_string());
    }

    Some(ImportRef::From {
        level,
        module,
        names,
    })
}

/// Name bound by an import clause: the dotted name, ignoring any `as` alias.
fn imported_name(node: Node, source: &[u8]) -> Option<String> {
    match node.kind() {
        "dotted_name" => compact_text(node, source),
        "aliased_import" => node
            .child_by_field_name("name")
            .and_then(|name| compact_text(name, source)),
        _ => None,
    }
}

/// Node text with interior whitespace removed (`a . b` is legal Python).
fn compact_text(node: Node, source: &[u8]) -> Option<String> {
    let text = node.utf8_text(source).ok()?;
    let compact: String = text.split_whitespace().collect();
    (!compact.is_empty()).then_some(compact)
}
