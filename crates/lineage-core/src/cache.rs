//! Epoch-tagged resolution cache
//!
//! Three invalidation scopes, each a monotonically increasing epoch:
//!
//! - **global**: bumped by any write anywhere,
//! - **self**: per entity, bumped when that entity changes,
//! - **inherited**: per entity, bumped when the entity or any relative changes.
//!
//! Every entry is stored with the epochs read *before* it was computed and
//! is only served while they are unchanged. A write that races with a read
//! therefore leaves behind an entry that is never returned, and nothing has
//! to be cleared imperatively.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde_json::Value;

use crate::governor::InheritanceMode;
use crate::graph::{ConnectionGraph, Relationship};
use crate::params::SanityReport;

/// Epochs of the two entity-keyed scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityEpoch {
    pub own: u64,
    pub inherited: u64,
}

/// Epoch counters for every scope.
#[derive(Debug, Default)]
pub struct Epochs {
    global: AtomicU64,
    own: Mutex<HashMap<String, u64>>,
    inherited: Mutex<HashMap<String, u64>>,
}

impl Epochs {
    pub fn global(&self) -> u64 {
        self.global.load(Ordering::Acquire)
    }

    pub fn entity(&self, name: &str) -> EntityEpoch {
        EntityEpoch {
            own: self.own.lock().get(name).copied().unwrap_or(0),
            inherited: self.inherited.lock().get(name).copied().unwrap_or(0),
        }
    }

    pub fn bump_global(&self) {
        self.global.fetch_add(1, Ordering::AcqRel);
    }

    pub fn bump_self(&self, name: &str) {
        *self.own.lock().entry(name.to_string()).or_default() += 1;
    }

    pub fn bump_inherited(&self, name: &str) {
        *self.inherited.lock().entry(name.to_string()).or_default() += 1;
    }
}

/// A map whose entries are valid only while their tag matches.
#[derive(Debug)]
pub struct ScopedMap<K, T, V> {
    entries: Mutex<HashMap<K, (T, V)>>,
}

impl<K, T, V> Default for ScopedMap<K, T, V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, T, V> ScopedMap<K, T, V>
where
    K: Eq + Hash,
    T: Copy + Eq,
    V: Clone,
{
    /// The cached value for `key`, if it was computed under `tag`.
    pub fn get(&self, key: &K, tag: T) -> Option<V> {
        self.entries
            .lock()
            .get(key)
            .filter(|(stored, _)| *stored == tag)
            .map(|(_, value)| value.clone())
    }

    pub fn insert(&self, key: K, tag: T, value: V) {
        self.entries.lock().insert(key, (tag, value));
    }

    /// Cached value under `tag`, or compute and remember it.
    pub fn get_or_insert_with(&self, key: K, tag: T, compute: impl FnOnce() -> V) -> V {
        if let Some(value) = self.get(&key, tag) {
            return value;
        }
        let value = compute();
        self.insert(key, tag, value.clone());
        value
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

type ResolutionKey = (String, String, InheritanceMode);

/// Everything the engine caches, by scope.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    pub epochs: Epochs,
    graph: Mutex<Option<(u64, Arc<ConnectionGraph>)>>,
    pub relationships: ScopedMap<String, u64, Arc<BTreeMap<String, Relationship>>>,
    pub cycles: ScopedMap<String, EntityEpoch, bool>,
    pub resolved: ScopedMap<ResolutionKey, EntityEpoch, Value>,
    pub sanity: ScopedMap<String, EntityEpoch, SanityReport>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The connection graph for the current global epoch, built on demand.
    pub fn graph(&self, build: impl FnOnce() -> ConnectionGraph) -> Arc<ConnectionGraph> {
        let epoch = self.epochs.global();
        if let Some((built_at, graph)) = self.graph.lock().as_ref() {
            if *built_at == epoch {
                return Arc::clone(graph);
            }
        }
        let graph = Arc::new(build());
        *self.graph.lock() = Some((epoch, Arc::clone(&graph)));
        graph
    }

    /// The most recently built graph, whatever its epoch.
    pub fn last_graph(&self) -> Option<Arc<ConnectionGraph>> {
        self.graph.lock().as_ref().map(|(_, graph)| Arc::clone(graph))
    }
}
