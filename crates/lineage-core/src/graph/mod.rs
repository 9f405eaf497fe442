//! Connection graph over every entity's declared references
//!
//! The graph records, per entity name, its direct parents and mates as
//! declared, plus the children implied by everyone else's parent edges.
//! Children are never declared: they only exist here. Names referenced but
//! not registered still get a node with `declared = false`, so that
//! missing dependencies and their would-be children stay visible.
//!
//! ```
//! use std::collections::BTreeMap;
//! use lineage_core::graph::ConnectionGraph;
//! use serde_json::json;
//!
//! let mut fields = BTreeMap::new();
//! fields.insert("base".to_string(), BTreeMap::new());
//! fields.insert(
//!     "leaf".to_string(),
//!     BTreeMap::from([("parent_references".to_string(), json!([{"name": "base"}]))]),
//! );
//!
//! let graph = ConnectionGraph::build(&fields, ["base", "leaf"]);
//! assert!(graph.children("base").contains("leaf"));
//! ```

mod cycle;
mod missing;
mod relations;

pub use cycle::{has_cyclic_dependency, has_cyclic_parents};
pub use missing::{Dependency, missing_dependencies};
pub use relations::{RelationKind, Relationship, relationships_of};

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::entity::{compatible_references, parent_references};
use crate::snapshot::SnapshotSource;

/// Adjacency of one entity name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    /// Whether an entity with this name exists.
    pub declared: bool,
    /// Direct parents in declaration order. Repeats are kept.
    pub parents: Vec<String>,
    /// Direct compatible references.
    pub mates: Vec<String>,
    /// Entities naming this one as a parent.
    pub children: BTreeSet<String>,
}

/// Global adjacency structure derived from declared references.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConnectionGraph {
    nodes: BTreeMap<String, GraphNode>,
}

static NO_CHILDREN: BTreeSet<String> = BTreeSet::new();

impl ConnectionGraph {
    /// Scan every named entity once.
    pub fn build<'a, S>(source: &S, names: impl IntoIterator<Item = &'a str>) -> Self
    where
        S: SnapshotSource + ?Sized,
    {
        let mut nodes: BTreeMap<String, GraphNode> = BTreeMap::new();
        for name in names {
            let Some(fields) = source.declared(name) else {
                continue;
            };
            let parents: Vec<String> = parent_references(name, fields)
                .into_iter()
                .map(|p| p.name)
                .collect();
            let mates: Vec<String> = compatible_references(name, fields)
                .into_iter()
                .map(|c| c.name)
                .collect();

            for parent in &parents {
                nodes
                    .entry(parent.clone())
                    .or_default()
                    .children
                    .insert(name.to_string());
            }
            for mate in &mates {
                nodes.entry(mate.clone()).or_default();
            }

            let node = nodes.entry(name.to_string()).or_default();
            node.declared = true;
            node.parents = parents;
            node.mates = mates;
        }
        tracing::debug!(nodes = nodes.len(), "Built connection graph");
        Self { nodes }
    }

    pub fn node(&self, name: &str) -> Option<&GraphNode> {
        self.nodes.get(name)
    }

    /// Whether `name` is a registered entity.
    pub fn is_declared(&self, name: &str) -> bool {
        self.nodes.get(name).is_some_and(|n| n.declared)
    }

    pub fn parents(&self, name: &str) -> &[String] {
        self.nodes.get(name).map_or(&[], |n| n.parents.as_slice())
    }

    pub fn mates(&self, name: &str) -> &[String] {
        self.nodes.get(name).map_or(&[], |n| n.mates.as_slice())
    }

    pub fn children(&self, name: &str) -> &BTreeSet<String> {
        self.nodes.get(name).map_or(&NO_CHILDREN, |n| &n.children)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every ancestor and descendant of `name`, declared or not.
    pub fn relatives(&self, name: &str) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        self.collect(name, &mut found, |node| node.parents.iter());
        self.collect(name, &mut found, |node| node.children.iter());
        found.remove(name);
        found
    }

    fn collect<'g, I, F>(&'g self, start: &str, found: &mut BTreeSet<String>, next: F)
    where
        F: Fn(&'g GraphNode) -> I,
        I: Iterator<Item = &'g String>,
    {
        let mut seen = BTreeSet::from([start.to_string()]);
        let mut stack = vec![start.to_string()];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(&current) else {
                continue;
            };
            for neighbor in next(node) {
                if seen.insert(neighbor.clone()) {
                    found.insert(neighbor.clone());
                    stack.push(neighbor.clone());
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::BTreeMap;

    use serde_json::json;

    use crate::entity::FieldMap;

    /// Field maps for `(name, parents, mates)` triples.
    pub fn fields_of(edges: &[(&str, &[&str], &[&str])]) -> BTreeMap<String, FieldMap> {
        edges.iter()
            .map(|(name, parents, mates)| {
                let mut fields = FieldMap::new();
                if !parents.is_empty() {
                    let list: Vec<_> = parents.iter().map(|p| json!({ "name": p })).collect();
                    fields.insert("parent_references".into(), json!(list));
                }
                if !mates.is_empty() {
                    let list: Vec<_> = mates.iter().map(|m| json!({ "name": m })).collect();
                    fields.insert("compatible_references".into(), json!(list));
                }
                (name.to_string(), fields)
            })
            .collect()
    }
}
