//! Cycle and diamond detection over parent edges

use std::collections::{BTreeSet, VecDeque};

use super::ConnectionGraph;

/// Whether `entity`'s ancestry, extended with `candidates` as extra
/// parents, reaches any name twice.
///
/// A repeat is either a genuine back edge (cycle) or two parent paths
/// converging on one ancestor (diamond). Both are rejected: an override
/// reduction has no way to pick which path wins. Undeclared names are not
/// followed.
pub fn has_cyclic_dependency(graph: &ConnectionGraph, entity: &str, candidates: &[&str]) -> bool {
    let seed: Vec<&str> = candidates
        .iter()
        .copied()
        .chain(graph.parents(entity).iter().map(String::as_str))
        .collect();
    has_cyclic_parents(graph, entity, &seed)
}

/// Like [`has_cyclic_dependency`], but `entity`'s direct parents are
/// exactly `parents` instead of the ones recorded in `graph`.
///
/// Used before committing a parent list that differs from the selected
/// version the graph was built from.
pub fn has_cyclic_parents(graph: &ConnectionGraph, entity: &str, parents: &[&str]) -> bool {
    let mut open: VecDeque<&str> = parents
        .iter()
        .copied()
        .filter(|name| graph.is_declared(name))
        .collect();
    let mut closed: BTreeSet<&str> = BTreeSet::from([entity]);

    while let Some(current) = open.pop_front() {
        if !closed.insert(current) {
            tracing::debug!(entity, repeated = current, "Ancestry revisits an entity");
            return true;
        }
        // Depth-first: a node's parents are explored before its siblings.
        for parent in graph.parents(current).iter().rev() {
            if graph.is_declared(parent) {
                open.push_front(parent);
            }
        }
    }
    false
}
