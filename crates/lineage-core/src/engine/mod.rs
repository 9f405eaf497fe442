//! The engine facade
//!
//! [`Engine`] owns the entity store, every version log, the persistence
//! backend and the resolution cache. It is shared between threads by
//! reference (`Engine: Send + Sync`).
//!
//! # Locking
//!
//! Entity state sits behind one `RwLock`. Every write path additionally
//! holds a global reentrant mutex for its whole duration, so graph
//! mutations never interleave and a write may call into another write
//! (a rename cascading into its dependents, a parent edit committing a
//! version). Reads only take the state lock briefly and never wait on the
//! write mutex. The state write guard is always released before caches are
//! invalidated, since invalidation rebuilds the connection graph.

mod queries;
mod versions;

pub use queries::{BlockReason, BuildStatus, InheritedVersion};

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use parking_lot::{ReentrantMutex, RwLock};

use crate::cache::ResolutionCache;
use crate::config::{ConfigResolver, EngineConfig};
use crate::definition::load_definitions;
use crate::entity::{Entity, FieldMap};
use crate::governor::FieldCatalog;
use crate::graph::{ConnectionGraph, has_cyclic_parents};
use crate::reference::ParentReference;
use crate::snapshot::SnapshotSource;
use crate::version::{FileBackend, MemoryBackend, VersionBackend, VersionLog, VersionPins};
use crate::{Error, Result};

#[derive(Debug, Default)]
struct State {
    store: crate::store::EntityStore,
    logs: HashMap<String, VersionLog>,
    /// Transient variant names by the entity they were generated from.
    transients: BTreeMap<String, Vec<String>>,
}

/// Declared fields as selected for resolution: a pinned version when one
/// is given and exists, else the latest stable version, else live state
/// for entities that were never versioned. Transients are always live.
struct Selection<'a> {
    state: &'a State,
    pins: Option<&'a VersionPins>,
}

impl<'a> Selection<'a> {
    fn current(state: &'a State) -> Self {
        Self { state, pins: None }
    }

    fn pinned(state: &'a State, pins: &'a VersionPins) -> Self {
        Self {
            state,
            pins: Some(pins),
        }
    }

    /// Id of the version this selection reads for `name`, if any.
    fn selected_id(&self, name: &str) -> Option<u64> {
        let log = self.state.logs.get(name)?;
        if let Some(id) = self.pins.and_then(|pins| pins.get(name)) {
            if log.get(id).is_some() {
                return Some(id);
            }
            tracing::warn!(entity = name, id, "Pinned version does not exist, using default selection");
        }
        log.latest_stable().map(|v| v.id())
    }
}

impl SnapshotSource for Selection<'_> {
    fn declared(&self, name: &str) -> Option<&FieldMap> {
        let entity = self.state.store.get(name)?;
        if entity.is_transient {
            return Some(entity.fields());
        }
        match self.selected_id(name) {
            Some(id) => self.state.logs.get(name)?.get(id).map(|v| v.fields()),
            None => Some(entity.fields()),
        }
    }
}

/// Configuration-inheritance engine.
pub struct Engine {
    config: EngineConfig,
    catalog: FieldCatalog,
    backend: Box<dyn VersionBackend>,
    state: RwLock<State>,
    write_lock: ReentrantMutex<()>,
    cache: ResolutionCache,
}

impl Engine {
    pub fn new(config: EngineConfig, backend: impl VersionBackend + 'static) -> Self {
        Self {
            config,
            catalog: FieldCatalog::builtin(),
            backend: Box::new(backend),
            state: RwLock::new(State::default()),
            write_lock: ReentrantMutex::new(()),
            cache: ResolutionCache::new(),
        }
    }

    /// An engine with default configuration and no durable storage.
    pub fn in_memory() -> Self {
        Self::new(EngineConfig::default(), MemoryBackend::new())
    }

    /// Open the workspace at `root`: resolve its configuration, load every
    /// entity definition and attach the file-backed version logs.
    pub fn open(root: &Path) -> Result<Self> {
        let config = ConfigResolver::new(root).resolve()?;
        Self::open_with_config(root, config)
    }

    pub fn open_with_config(root: &Path, config: EngineConfig) -> Result<Self> {
        let backend = FileBackend::new(config.versions_dir(root));
        let definitions = load_definitions(&config.definitions_dir(root))?;
        let engine = Self::new(config, backend);
        for definition in definitions {
            engine.upsert_entity(definition.into_entity()?)?;
        }
        tracing::debug!(root = %root.display(), entities = engine.len(), "Opened workspace");
        Ok(engine)
    }

    /// Replace the field catalog.
    pub fn with_catalog(mut self, catalog: FieldCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    pub fn len(&self) -> usize {
        self.state.read().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().store.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.state.read().store.contains(name)
    }

    /// Live state of `name`.
    pub fn entity(&self, name: &str) -> Option<Entity> {
        self.state.read().store.get(name).cloned()
    }

    /// All entity names, sorted.
    pub fn entity_names(&self) -> Vec<String> {
        self.state.read().store.names()
    }

    /// Register an entity or replace its live state.
    ///
    /// The version log of a newly seen entity is loaded from the backend.
    /// Nothing is committed: live edits become visible to resolution once
    /// committed, or immediately for entities without any version.
    pub fn upsert_entity(&self, entity: Entity) -> Result<()> {
        let _guard = self.write_lock.lock();
        let name = entity.name().to_string();
        let log = if entity.is_transient || self.state.read().logs.contains_key(&name) {
            None
        } else {
            Some(self.load_log(&name))
        };
        {
            let mut state = self.state.write();
            if let Some(log) = log {
                state.logs.insert(name.clone(), log);
            }
            state.store.upsert(entity);
        }
        self.invalidate(&[name]);
        Ok(())
    }

    /// Remove an entity, its version log and its transient variants.
    pub fn remove_entity(&self, name: &str) -> Result<Entity> {
        let _guard = self.write_lock.lock();
        let (entity, mut affected) = {
            let mut state = self.state.write();
            let entity = state.store.remove(name).ok_or_else(|| Error::unknown(name))?;
            state.logs.remove(name);
            let variants = state.transients.remove(name).unwrap_or_default();
            for variant in &variants {
                state.store.remove(variant);
            }
            (entity, variants)
        };
        if !entity.is_transient {
            if let Err(e) = self.backend.remove(name) {
                tracing::error!(entity = name, error = %e, "Failed to remove version log");
            }
        }
        affected.push(name.to_string());
        self.invalidate(&affected);
        Ok(entity)
    }

    /// Add a parent reference and commit the change.
    ///
    /// Rejected when the parent is already referenced or when the new edge
    /// would make the ancestry cyclic or diamond-shaped; the edge is then
    /// never stored.
    pub fn add_parent_reference(&self, entity: &str, parent: ParentReference, author: &str) -> Result<()> {
        let _guard = self.write_lock.lock();
        let current = self
            .state
            .read()
            .store
            .require(entity)
            .map(Entity::parents)?;
        if current.iter().any(|p| p.name == parent.name) {
            return Err(Error::DuplicateParent {
                entity: entity.to_string(),
                parent: parent.name,
            });
        }

        // Check the parent list that will actually be committed: live state
        // may be ahead of the version the connection graph was built from.
        let mut parents = current;
        parents.push(parent);
        let seed: Vec<&str> = parents.iter().map(|p| p.name.as_str()).collect();
        if has_cyclic_parents(&self.connection_graph(), entity, &seed) {
            return Err(Error::CyclicDependency {
                entity: entity.to_string(),
                parent: parents.pop().map(|p| p.name).unwrap_or_default(),
            });
        }

        self.edit_parents(entity, &parents, author, "Added parent reference")
    }

    /// Remove every reference to `parent`. Returns whether one existed.
    pub fn remove_parent_reference(&self, entity: &str, parent: &str, author: &str) -> Result<bool> {
        let _guard = self.write_lock.lock();
        let current = self
            .state
            .read()
            .store
            .require(entity)
            .map(Entity::parents)?;
        let parents: Vec<ParentReference> =
            current.iter().filter(|p| p.name != parent).cloned().collect();
        if parents.len() == current.len() {
            return Ok(false);
        }
        self.edit_parents(entity, &parents, author, "Removed parent reference")?;
        Ok(true)
    }

    fn edit_parents(&self, entity: &str, parents: &[ParentReference], author: &str, description: &str) -> Result<()> {
        let fields = {
            let mut state = self.state.write();
            let live = state.store.get_mut(entity).ok_or_else(|| Error::unknown(entity))?;
            live.set_parents(parents);
            (!live.is_transient).then(|| live.fields().clone())
        };
        match fields {
            Some(fields) => {
                self.create_version(entity, fields, author, description)?;
            }
            None => self.invalidate(&[entity.to_string()]),
        }
        Ok(())
    }

    fn load_log(&self, name: &str) -> VersionLog {
        match self.backend.load(name) {
            Ok(versions) => VersionLog::from_versions(versions),
            Err(e) => {
                tracing::warn!(entity = name, error = %e, "Could not load version log, starting empty");
                VersionLog::new()
            }
        }
    }

    /// The connection graph under the default selection.
    pub fn connection_graph(&self) -> Arc<ConnectionGraph> {
        let state = self.state.read();
        self.cache.graph(|| {
            let selection = Selection::current(&state);
            let names = state.store.names();
            ConnectionGraph::build(&selection, names.iter().map(String::as_str))
        })
    }

    /// Expire cached results that may depend on `names`.
    ///
    /// Scopes are bumped global first, then self, then inherited: the
    /// inherited set covers every relative in the graph as it was before
    /// the change and as rebuilt after it.
    fn invalidate(&self, names: &[String]) {
        let previous = self.cache.last_graph();
        self.cache.epochs.bump_global();
        for name in names {
            self.cache.epochs.bump_self(name);
        }

        let fresh = self.connection_graph();
        let mut affected: BTreeSet<String> = names.iter().cloned().collect();
        for name in names {
            if let Some(previous) = &previous {
                affected.extend(previous.relatives(name));
            }
            affected.extend(fresh.relatives(name));
        }
        for name in &affected {
            self.cache.epochs.bump_inherited(name);
        }
        tracing::debug!(changed = ?names, affected = affected.len(), "Invalidated resolution caches");
    }
}
