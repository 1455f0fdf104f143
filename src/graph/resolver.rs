//! Mapping raw import names onto scanned modules.

use crate::config::{ResolutionConfig, ResolutionKind};
use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};

/// Turns an import name into the canonical name of a scanned module.
pub trait ResolutionStrategy: Send + Sync {
    /// `importer` is the canonical name of the module doing the import.
    fn resolve(&self, raw: &str, importer: &str) -> Option<String>;
}

/// The set of canonical names in one scan.
#[derive(Debug, Clone, Default)]
pub struct ModuleIndex {
    names: BTreeSet<String>,
    // last dotted component -> names ending in it
    by_tail: HashMap<String, Vec<String>>,
}

impl ModuleIndex {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        let mut by_tail: HashMap<String, Vec<String>> = HashMap::new();
        for name in &names {
            let tail = name.rsplit('.').next().unwrap_or(name);
            by_tail.entry(tail.to_string()).or_default().push(name.clone());
        }
        Self { names, by_tail }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Known names that end in `.{raw}`, in sorted order.
    pub fn suffix_matches(&self, raw: &str) -> Vec<&str> {
        let tail = raw.rsplit('.').next().unwrap_or(raw);
        let suffix = format!(".{}", raw);
        self.by_tail
            .get(tail)
            .map(|names| {
                names
                    .iter()
                    .filter(|name| name.ends_with(&suffix))
                    .map(String::as_str)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Exact match, then suffix match.
///
/// `import models` from `shop.views` resolves to `shop.models` when no
/// top-level `models` was scanned. When several nested modules share a
/// suffix the one closest to the importer wins.
#[derive(Debug, Clone)]
pub struct HeuristicResolver {
    index: ModuleIndex,
}

impl HeuristicResolver {
    pub fn new(index: ModuleIndex) -> Self {
        Self { index }
    }

    fn exact_or_suffix(&self, raw: &str, importer: &str) -> Option<String> {
        if self.index.contains(raw) {
            return Some(raw.to_string());
        }
        best_candidate(self.index.suffix_matches(raw), importer)
    }
}

impl ResolutionStrategy for HeuristicResolver {
    fn resolve(&self, raw: &str, importer: &str) -> Option<String> {
        if !is_dotted_name(raw) {
            return None;
        }
        self.exact_or_suffix(raw, importer)
    }
}

/// Rank suffix candidates: longest shared package prefix with the importer,
/// then the shortest name, then lexicographic order.
fn best_candidate(candidates: Vec<&str>, importer: &str) -> Option<String> {
    candidates
        .into_iter()
        .min_by_key(|name| (Reverse(shared_prefix_len(name, importer)), name.len(), *name))
        .map(str::to_string)
}

fn shared_prefix_len(a: &str, b: &str) -> usize {
    a.split('.')
        .zip(b.split('.'))
        .take_while(|(x, y)| x == y)
        .count()
}

fn is_dotted_name(raw: &str) -> bool {
    !raw.is_empty() && raw.split('.').all(|part| !part.is_empty())
}

/// Explicit prefix rewrites followed by exact matching.
///
/// With `"acme" = "src.acme"`, `import acme.billing` resolves only if
/// `src.acme.billing` was scanned. Names no prefix covers must match
/// exactly as written.
#[derive(Debug, Clone)]
pub struct NamespaceResolver {
    index: ModuleIndex,
    // longest prefix first
    namespaces: Vec<(String, String)>,
}

impl NamespaceResolver {
    pub fn new<I>(index: ModuleIndex, namespaces: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut namespaces: Vec<(String, String)> = namespaces.into_iter().collect();
        namespaces.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        Self { index, namespaces }
    }

    fn rewrite(&self, raw: &str) -> String {
        for (prefix, target) in &self.namespaces {
            if raw == prefix {
                return target.clone();
            }
            if let Some(rest) = raw.strip_prefix(prefix.as_str()) {
                if rest.starts_with('.') {
                    return format!("{}{}", target, rest);
                }
            }
        }
        raw.to_string()
    }
}

impl ResolutionStrategy for NamespaceResolver {
    fn resolve(&self, raw: &str, _importer: &str) -> Option<String> {
        let rewritten = self.rewrite(raw);
        self.index.contains(&rewritten).then_some(rewritten)
    }
}

/// Build the strategy a configuration asks for.
pub fn resolver_for(
    config: &ResolutionConfig,
    index: ModuleIndex,
) -> Box<dyn ResolutionStrategy> {
    match config.strategy {
        ResolutionKind::Heuristic => Box::new(HeuristicResolver::new(index)),
        ResolutionKind::Namespace => Box::new(NamespaceResolver::new(
            index,
            config
                .namespaces
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(names: &[&str]) -> ModuleIndex {
        ModuleIndex::new(names.iter().copied())
    }

    #[test]
    fn test_exact_match_wins() {
        let resolver = HeuristicResolver::new(index(&["models", "app.models"]));
        assert_eq!(resolver.resolve("models", "app.views"), Some("models".into()));
    }

    #[test]
    fn test_suffix_match_prefers_importer_package() {
        let resolver = HeuristicResolver::new(index(&[
            "billing.models",
            "shop.models",
            "shop.views",
        ]));
        assert_eq!(
            resolver.resolve("models", "shop.views"),
            Some("shop.models".into())
        );
        assert_eq!(
            resolver.resolve("models", "billing.api"),
            Some("billing.models".into())
        );
    }

    #[test]
    fn test_suffix_tie_breaks_on_length_then_name() {
        let resolver = HeuristicResolver::new(index(&["b.util", "a.util", "deep.x.util"]));
        assert_eq!(resolver.resolve("util", "main"), Some("a.util".into()));
    }

    #[test]
    fn test_suffix_needs_whole_components() {
        let resolver = HeuristicResolver::new(index(&["app.mymodels"]));
        assert_eq!(resolver.resolve("models", "main"), None);
    }

    #[test]
    fn test_missing_submodule_is_unresolved() {
        let resolver = HeuristicResolver::new(index(&["app", "app.models"]));
        assert_eq!(resolver.resolve("app.models.User", "main"), None);
        assert_eq!(resolver.resolve("app.missing", "main"), None);
    }

    #[test]
    fn test_external_and_literal_names_are_unresolved() {
        let resolver = HeuristicResolver::new(index(&["app.models"]));
        assert_eq!(resolver.resolve("requests", "app.models"), None);
        assert_eq!(resolver.resolve("...outside", "app.models"), None);
        assert_eq!(resolver.resolve("", "app.models"), None);
    }

    #[test]
    fn test_namespace_rewrites_then_matches_exactly() {
        let resolver = NamespaceResolver::new(
            index(&["src.acme", "src.acme.billing", "acme_tools", "billing"]),
            vec![("acme".to_string(), "src.acme".to_string())],
        );
        assert_eq!(
            resolver.resolve("acme.billing", "main"),
            Some("src.acme.billing".into())
        );
        assert_eq!(resolver.resolve("acme", "main"), Some("src.acme".into()));
        assert_eq!(resolver.resolve("acme_tools", "main"), Some("acme_tools".into()));
        // no suffix guessing
        assert_eq!(resolver.resolve("acme.billing.Invoice", "main"), None);
        assert_eq!(resolver.resolve("src.billing", "main"), None);
    }

    #[test]
    fn test_resolver_for_config() {
        let mut config = ResolutionConfig::default();
        let resolver = resolver_for(&config, index(&["shop.models"]));
        assert_eq!(resolver.resolve("models", "main"), Some("shop.models".into()));

        config.strategy = ResolutionKind::Namespace;
        let resolver = resolver_for(&config, index(&["shop.models"]));
        assert_eq!(resolver.resolve("models", "main"), None);
    }
}
