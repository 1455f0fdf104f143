use super::{Cycle, DependencyGraph};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    OnPath,
    Explored,
}

/// Find import cycles with a depth-first walk over the graph.
///
/// Modules and their dependencies are walked in sorted order and cycles are
/// returned in the order they are discovered, so an unchanged graph always
/// yields the same list. A module already fully explored is never entered
/// again, which keeps one cycle from being reported once per entry point.
/// Every cycle in the graph shares at least one module with a reported
/// cycle.
pub fn detect_cycles(graph: &DependencyGraph) -> Vec<Cycle> {
    let mut detector = CycleDetector {
        graph,
        state: graph.modules().map(|m| (m, VisitState::Unvisited)).collect(),
        path: Vec::new(),
        cycles: Vec::new(),
    };

    for module in graph.modules() {
        if detector.state(module) == VisitState::Unvisited {
            detector.visit(module);
        }
    }

    tracing::debug!("Detected {} import cycles", detector.cycles.len());
    detector.cycles
}

/// Every module that appears on some cycle.
pub fn cycle_members(cycles: &[Cycle]) -> BTreeSet<String> {
    cycles
        .iter()
        .flat_map(|cycle| cycle.members().iter().cloned())
        .collect()
}

struct CycleDetector<'a> {
    graph: &'a DependencyGraph,
    state: HashMap<&'a str, VisitState>,
    path: Vec<&'a str>,
    cycles: Vec<Cycle>,
}

impl<'a> CycleDetector<'a> {
    fn state(&self, module: &str) -> VisitState {
        self.state
            .get(module)
            .copied()
            .unwrap_or(VisitState::Unvisited)
    }

    fn visit(&mut self, module: &'a str) {
        let graph = self.graph;
        self.state.insert(module, VisitState::OnPath);
        self.path.push(module);

        if graph.has_self_import(module) {
            self.cycles
                .push(Cycle::new(vec![module.to_string(), module.to_string()]));
        }

        for dep in graph.dependencies(module) {
            match self.state(dep) {
                VisitState::Unvisited => self.visit(dep),
                VisitState::OnPath => self.record_cycle(dep),
                VisitState::Explored => {}
            }
        }

        self.path.pop();
        self.state.insert(module, VisitState::Explored);
    }

    fn record_cycle(&mut self, target: &str) {
        if let Some(start) = self.path.iter().position(|m| *m == target) {
            let mut cycle: Vec<String> = self.path[start..].iter().map(|m| m.to_string()).collect();
            cycle.push(target.to_string());
            self.cycles.push(Cycle::new(cycle));
        }
    }
}
