//! Missing-dependency scan

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use super::ConnectionGraph;

/// An unresolved reference and the chain of entities leading to it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Dependency {
    /// Entities walked from the starting entity to the referencing one.
    pub trace: Vec<String>,
    /// The name that does not resolve.
    pub reference: String,
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.trace {
            write!(f, "{step} -> ")?;
        }
        write!(f, "{}", self.reference)
    }
}

/// Every unresolved parent reference reachable from `entity`, plus any of
/// `entity`'s own compatible references that do not resolve.
pub fn missing_dependencies(graph: &ConnectionGraph, entity: &str) -> Vec<Dependency> {
    let mut missing = BTreeSet::new();
    let mut visited = BTreeSet::new();
    let mut trace = Vec::new();
    visit(graph, entity, &mut trace, &mut visited, &mut missing);

    for mate in graph.mates(entity) {
        if !graph.is_declared(mate) {
            missing.insert(Dependency {
                trace: vec![entity.to_string()],
                reference: mate.clone(),
            });
        }
    }
    missing.into_iter().collect()
}

fn visit(
    graph: &ConnectionGraph,
    name: &str,
    trace: &mut Vec<String>,
    visited: &mut BTreeSet<String>,
    missing: &mut BTreeSet<Dependency>,
) {
    if !visited.insert(name.to_string()) {
        return;
    }
    trace.push(name.to_string());
    for parent in graph.parents(name) {
        if graph.is_declared(parent) {
            visit(graph, parent, trace, visited, missing);
        } else {
            missing.insert(Dependency {
                trace: trace.clone(),
                reference: parent.clone(),
            });
        }
    }
    trace.pop();
}
