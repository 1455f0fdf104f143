//! The module import graph and the algorithms that run over it.

pub mod cycles;
pub mod layers;
pub mod resolver;

pub use cycles::{cycle_members, detect_cycles};
pub use layers::{compute_layers, Layering, LayeringError};
pub use resolver::{
    resolver_for, HeuristicResolver, ModuleIndex, NamespaceResolver, ResolutionStrategy,
};

use crate::core::Module;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Module -> assigned layer index
pub type LayerAssignment = BTreeMap<String, usize>;

/// A closed import chain: first and last entries are the same module.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cycle(Vec<String>);

impl Cycle {
    pub fn new(path: Vec<String>) -> Self {
        debug_assert!(path.len() >= 2 && path.first() == path.last());
        Self(path)
    }

    pub fn path(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Distinct modules on the cycle, in path order.
    pub fn members(&self) -> &[String] {
        &self.0[..self.0.len().saturating_sub(1)]
    }

    pub fn is_self_import(&self) -> bool {
        self.0.len() == 2
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" -> "))
    }
}

/// Directed import graph over canonical module names.
///
/// Every scanned module is a node, isolated or not. Edges point from the
/// importer to the imported module, are deduplicated, and never loop back to
/// the same node; a module that imports itself is tracked in `self_imports`
/// instead. Imports that match no scanned module are kept in `unresolved`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    adjacency: BTreeMap<String, BTreeSet<String>>,
    self_imports: BTreeSet<String>,
    unresolved: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// Resolve every module's imports and assemble the graph.
    pub fn build(modules: &[Module], resolver: &dyn ResolutionStrategy) -> Self {
        let mut graph = Self::default();

        for module in modules {
            graph.add_module(&module.canonical_name);
        }

        for module in modules {
            let importer = &module.canonical_name;
            for raw in &module.raw_imports {
                let resolved = match resolver.resolve(raw, importer) {
                    Some(target) => Some(target),
                    None => match module
                        .enclosing_package_of(raw)
                        .and_then(|package| resolver.resolve(package, importer))
                    {
                        // a package `__init__` reading its own attribute
                        Some(target) if &target == importer => continue,
                        fallback => fallback,
                    },
                };
                match resolved {
                    Some(target) if &target == importer => {
                        graph.self_imports.insert(importer.clone());
                    }
                    Some(target) if graph.adjacency.contains_key(&target) => {
                        graph.add_dependency(importer, target);
                    }
                    _ => {
                        graph
                            .unresolved
                            .entry(importer.clone())
                            .or_default()
                            .insert(raw.clone());
                    }
                }
            }
        }

        tracing::debug!(
            "Built dependency graph: {} modules, {} edges, {} self imports, {} unresolved imports",
            graph.module_count(),
            graph.edge_count(),
            graph.self_imports.len(),
            graph.unresolved_count()
        );
        graph
    }

    /// Graph from explicit edges; `(a, a)` records a self import.
    pub fn from_edges<N, S, E>(nodes: N, edges: E) -> Self
    where
        N: IntoIterator<Item = S>,
        S: Into<String>,
        E: IntoIterator<Item = (S, S)>,
    {
        let mut graph = Self::default();
        for node in nodes {
            graph.add_module(&node.into());
        }
        for (from, to) in edges {
            let (from, to) = (from.into(), to.into());
            graph.add_module(&from);
            if from == to {
                graph.self_imports.insert(from);
            } else {
                graph.add_module(&to);
                graph.add_dependency(&from, to);
            }
        }
        graph
    }

    fn add_module(&mut self, name: &str) {
        if !self.adjacency.contains_key(name) {
            self.adjacency.insert(name.to_string(), BTreeSet::new());
        }
    }

    fn add_dependency(&mut self, from: &str, to: String) {
        self.adjacency.entry(from.to_string()).or_default().insert(to);
    }

    /// Canonical names in sorted order.
    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.adjacency.keys().map(String::as_str)
    }

    pub fn module_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.adjacency.contains_key(name)
    }

    /// Modules `name` imports, in sorted order.
    pub fn dependencies(&self, name: &str) -> impl Iterator<Item = &str> {
        self.adjacency
            .get(name)
            .into_iter()
            .flat_map(|deps| deps.iter().map(String::as_str))
    }

    /// Modules that import `name`, in sorted order.
    pub fn dependents(&self, name: &str) -> Vec<&str> {
        self.adjacency
            .iter()
            .filter(|(_, deps)| deps.contains(name))
            .map(|(module, _)| module.as_str())
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum()
    }

    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.adjacency
            .iter()
            .flat_map(|(from, deps)| deps.iter().map(move |to| (from.as_str(), to.as_str())))
    }

    pub fn has_self_import(&self, name: &str) -> bool {
        self.self_imports.contains(name)
    }

    pub fn self_imports(&self) -> &BTreeSet<String> {
        &self.self_imports
    }

    /// Importer -> raw names that matched no scanned module
    pub fn unresolved(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.unresolved
    }

    pub fn unresolved_for(&self, name: &str) -> impl Iterator<Item = &str> {
        self.unresolved
            .get(name)
            .into_iter()
            .flat_map(|raw| raw.iter().map(String::as_str))
    }

    /// Distinct unresolved names summed over importing modules.
    pub fn unresolved_count(&self) -> usize {
        self.unresolved.values().map(BTreeSet::len).sum()
    }

    /// Induced subgraph with `removed` and every edge touching them dropped.
    pub fn without(&self, removed: &BTreeSet<String>) -> Self {
        Self {
            adjacency: self
                .adjacency
                .iter()
                .filter(|(name, _)| !removed.contains(*name))
                .map(|(name, deps)| {
                    let deps = deps.iter().filter(|d| !removed.contains(*d)).cloned();
                    (name.clone(), deps.collect())
                })
                .collect(),
            self_imports: self
                .self_imports
                .iter()
                .filter(|name| !removed.contains(*name))
                .cloned()
                .collect(),
            unresolved: self
                .unresolved
                .iter()
                .filter(|(name, _)| !removed.contains(*name))
                .map(|(name, raw)| (name.clone(), raw.clone()))
                .collect(),
        }
    }

    /// The same graph as a petgraph `DiGraph`, nodes added in sorted order.
    ///
    /// Self imports become self-loop edges here.
    pub fn to_petgraph(&self) -> (DiGraph<String, ()>, HashMap<String, NodeIndex>) {
        let mut graph = DiGraph::with_capacity(self.module_count(), self.edge_count());
        let mut index = HashMap::with_capacity(self.module_count());
        for name in self.modules() {
            index.insert(name.to_string(), graph.add_node(name.to_string()));
        }
        for (from, to) in self.edges() {
            graph.add_edge(index[from], index[to], ());
        }
        for name in &self.self_imports {
            let node = index[name.as_str()];
            graph.add_edge(node, node, ());
        }
        (graph, index)
    }
}
