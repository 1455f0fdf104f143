use super::{DependencyGraph, LayerAssignment};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// The graph and the reported cycles disagree.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayeringError {
    #[error(
        "{count} module(s) could not be layered after removing cycle members: {list}",
        count = .unpeeled.len(),
        list = .unpeeled.join(", ")
    )]
    Inconsistent { unpeeled: Vec<String> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layering {
    pub assignment: LayerAssignment,
    /// Modules grouped by layer index, each group sorted
    pub layers: Vec<Vec<String>>,
}

impl Layering {
    pub fn layer_of(&self, name: &str) -> Option<usize> {
        self.assignment.get(name).copied()
    }
}

/// Peel the graph into dependency layers, leaving out `excluded` modules.
///
/// Layer 0 holds modules with no dependencies left in the graph; layer N+1
/// holds modules whose dependencies all sit in layers 0..=N. For any edge
/// `a -> b` that survives the exclusion, `layer(b) < layer(a)`.
pub fn compute_layers(
    graph: &DependencyGraph,
    excluded: &BTreeSet<String>,
) -> Result<Layering, LayeringError> {
    let graph = graph.without(excluded);

    let mut pending: BTreeMap<&str, usize> = BTreeMap::new();
    let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for module in graph.modules() {
        pending.insert(module, graph.dependencies(module).count());
        for dep in graph.dependencies(module) {
            dependents.entry(dep).or_default().push(module);
        }
    }

    let mut layering = Layering::default();
    let mut current: Vec<&str> = pending
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(module, _)| *module)
        .collect();

    while !current.is_empty() {
        let index = layering.layers.len();
        let mut next = Vec::new();

        for module in &current {
            layering.assignment.insert(module.to_string(), index);
            for dependent in dependents.get(module).into_iter().flatten() {
                if let Some(count) = pending.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        next.push(*dependent);
                    }
                }
            }
        }

        layering
            .layers
            .push(current.iter().map(|m| m.to_string()).collect());
        next.sort_unstable();
        current = next;
    }

    if layering.assignment.len() < graph.module_count() {
        let unpeeled: Vec<String> = graph
            .modules()
            .filter(|m| !layering.assignment.contains_key(*m))
            .map(str::to_string)
            .collect();
        tracing::error!("Layering left {} modules unpeeled", unpeeled.len());
        return Err(LayeringError::Inconsistent { unpeeled });
    }

    tracing::debug!(
        "Assigned {} modules to {} layers",
        layering.assignment.len(),
        layering.layers.len()
    );
    Ok(layering)
}
