//! Relationship explorer

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use serde::Serialize;

use super::ConnectionGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    Parent,
    Child,
    Mate,
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parent => write!(f, "parent"),
            Self::Child => write!(f, "child"),
            Self::Mate => write!(f, "mate"),
        }
    }
}

/// How one entity relates to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Relationship {
    pub kind: RelationKind,
    /// Hop count; mates are always at distance 0.
    pub distance: u32,
    /// Whether the related entity has no children.
    pub is_leaf: bool,
}

/// Every declared entity reachable from `name`, with its relationship.
///
/// Mates are direct neighbours only. Parents and children are found by two
/// breadth-first walks, each recording the shortest distance at which a
/// node is discovered. Undeclared names are skipped. An entity reachable
/// both ways is reported by the walk that runs last (children).
pub fn relationships_of(graph: &ConnectionGraph, name: &str) -> BTreeMap<String, Relationship> {
    let mut map = BTreeMap::new();
    let Some(node) = graph.node(name) else {
        return map;
    };

    for mate in &node.mates {
        if mate == name || !graph.is_declared(mate) {
            continue;
        }
        map.entry(mate.clone()).or_insert(Relationship {
            kind: RelationKind::Mate,
            distance: 0,
            is_leaf: graph.children(mate).is_empty(),
        });
    }

    for (parent, distance) in walk(graph, name, |g, n| g.parents(n).iter()) {
        map.insert(
            parent,
            Relationship {
                kind: RelationKind::Parent,
                distance,
                is_leaf: false,
            },
        );
    }

    for (child, distance) in walk(graph, name, |g, n| g.children(n).iter()) {
        let is_leaf = graph.children(&child).is_empty();
        map.insert(
            child,
            Relationship {
                kind: RelationKind::Child,
                distance,
                is_leaf,
            },
        );
    }

    map
}

/// Breadth-first walk from `start`, yielding declared nodes in discovery
/// order with their hop distance.
fn walk<'g, I, F>(graph: &'g ConnectionGraph, start: &str, next: F) -> Vec<(String, u32)>
where
    F: Fn(&'g ConnectionGraph, &str) -> I,
    I: Iterator<Item = &'g String>,
{
    let mut found = Vec::new();
    let mut seen = BTreeSet::from([start.to_string()]);
    let mut open = VecDeque::from([(start.to_string(), 0u32)]);

    while let Some((current, distance)) = open.pop_front() {
        for neighbor in next(graph, &current) {
            if !graph.is_declared(neighbor) || !seen.insert(neighbor.clone()) {
                continue;
            }
            found.push((neighbor.clone(), distance + 1));
            open.push_back((neighbor.clone(), distance + 1));
        }
    }
    found
}
