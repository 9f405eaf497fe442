//! Ordered ancestor scope

use std::collections::BTreeSet;

use crate::entity::parent_references;
use crate::reference::Category;
use crate::snapshot::SnapshotSource;

/// Ancestors of `name` followed or interleaved with `name` itself, most
/// distant first.
///
/// Parents are ordered by their priority for `category` (stable for
/// ties). Parents with priority <= 0 are expanded before the entity, the
/// others after it so they override its own values. Each name appears at
/// most once and undeclared parents are skipped, so the walk terminates on
/// cyclic ancestry too.
pub fn ancestor_sequence<S>(source: &S, name: &str, category: Category) -> Vec<String>
where
    S: SnapshotSource + ?Sized,
{
    let mut visited = BTreeSet::new();
    let mut sequence = Vec::new();
    expand(source, name, category, &mut visited, &mut sequence);
    sequence
}

fn expand<S>(
    source: &S,
    name: &str,
    category: Category,
    visited: &mut BTreeSet<String>,
    sequence: &mut Vec<String>,
) where
    S: SnapshotSource + ?Sized,
{
    if !visited.insert(name.to_string()) {
        return;
    }
    let Some(fields) = source.declared(name) else {
        return;
    };

    let mut parents = parent_references(name, fields);
    parents.sort_by_key(|p| p.priority(category));

    let (before, after): (Vec<_>, Vec<_>) = parents
        .into_iter()
        .partition(|p| p.priority(category) <= 0);

    for parent in &before {
        expand(source, &parent.name, category, visited, sequence);
    }
    sequence.push(name.to_string());
    for parent in &after {
        expand(source, &parent.name, category, visited, sequence);
    }
}
