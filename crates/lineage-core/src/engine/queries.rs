//! Read-side operations: resolution, relationships, structural checks,
//! parameters and transient variants

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::{Engine, Selection};
use crate::governor::{self, InheritanceMode};
use crate::graph::{self, Dependency, Relationship};
use crate::params::{self, ParameterDeclaration, ParameterDerivation, SanityReport};
use crate::reference::Category;
use crate::variants::build_variant;
use crate::version::VersionPins;
use crate::{Error, Result};

/// Why an entity may not be executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum BlockReason {
    Abstract,
    MissingDependencies(Vec<Dependency>),
    CyclicDependency,
    ParameterInconsistency(String),
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abstract => write!(f, "entity is abstract"),
            Self::MissingDependencies(missing) => {
                write!(f, "missing dependencies: ")?;
                let rendered: Vec<String> = missing.iter().map(ToString::to_string).collect();
                write!(f, "{}", rendered.join(", "))
            }
            Self::CyclicDependency => write!(f, "ancestry is cyclic or diamond-shaped"),
            Self::ParameterInconsistency(message) => write!(f, "parameters are inconsistent: {message}"),
        }
    }
}

/// Whether an entity may be executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStatus {
    Buildable,
    Blocked(BlockReason),
}

impl BuildStatus {
    pub fn is_buildable(&self) -> bool {
        matches!(self, Self::Buildable)
    }
}

/// Version selection of one member of an entity's scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InheritedVersion {
    pub entity: String,
    /// Version read by resolution, `None` for unversioned entities.
    pub selected: Option<u64>,
    pub versions: Vec<u64>,
    pub description: String,
}

impl Engine {
    /// Resolve `field` on `entity` under the default version selection.
    pub fn resolve(&self, entity: &str, field: &str, mode: InheritanceMode) -> Result<Value> {
        let key = (entity.to_string(), field.to_string(), mode);
        let epoch = self.cache.epochs.entity(entity);
        if let Some(value) = self.cache.resolved.get(&key, epoch) {
            return Ok(value);
        }

        let descriptor = self.catalog.descriptor(field);
        let value = {
            let state = self.state.read();
            state.store.require(entity)?;
            governor::resolve(&Selection::current(&state), entity, &descriptor, mode)
        };
        self.cache.resolved.insert(key, epoch, value.clone());
        Ok(value)
    }

    /// Resolve with the configured default mode.
    pub fn resolve_default(&self, entity: &str, field: &str) -> Result<Value> {
        self.resolve(entity, field, self.config.resolve.default_mode)
    }

    /// Resolve against pinned versions. Entities without a pin use their
    /// latest stable version. Pinned results are never cached.
    pub fn resolve_pinned(
        &self,
        entity: &str,
        field: &str,
        mode: InheritanceMode,
        pins: &VersionPins,
    ) -> Result<Value> {
        if pins.is_empty() {
            return self.resolve(entity, field, mode);
        }
        let descriptor = self.catalog.descriptor(field);
        let state = self.state.read();
        state.store.require(entity)?;
        Ok(governor::resolve(
            &Selection::pinned(&state, pins),
            entity,
            &descriptor,
            mode,
        ))
    }

    /// Ordered scope of `entity` for fields of `category`, most distant
    /// first.
    pub fn ancestor_sequence(&self, entity: &str, category: Category) -> Result<Vec<String>> {
        let state = self.state.read();
        state.store.require(entity)?;
        Ok(governor::ancestor_sequence(
            &Selection::current(&state),
            entity,
            category,
        ))
    }

    fn require(&self, entity: &str) -> Result<()> {
        if self.contains(entity) {
            Ok(())
        } else {
            Err(Error::unknown(entity))
        }
    }

    /// Every entity related to `entity`, with relationship kind, distance
    /// and leaf status.
    pub fn relationships_of(&self, entity: &str) -> Result<BTreeMap<String, Relationship>> {
        self.require(entity)?;
        let epoch = self.cache.epochs.global();
        let relations = self
            .cache
            .relationships
            .get_or_insert_with(entity.to_string(), epoch, || {
                Arc::new(graph::relationships_of(&self.connection_graph(), entity))
            });
        Ok((*relations).clone())
    }

    /// Whether the ancestry of `entity` is cyclic or diamond-shaped.
    pub fn has_cycle(&self, entity: &str) -> Result<bool> {
        self.require(entity)?;
        let epoch = self.cache.epochs.entity(entity);
        Ok(self
            .cache
            .cycles
            .get_or_insert_with(entity.to_string(), epoch, || {
                graph::has_cyclic_dependency(&self.connection_graph(), entity, &[])
            }))
    }

    /// Whether adding `candidates` as parents of `entity` would make its
    /// ancestry cyclic or diamond-shaped.
    pub fn has_cyclic_dependency(&self, entity: &str, candidates: &[&str]) -> Result<bool> {
        self.require(entity)?;
        Ok(graph::has_cyclic_dependency(
            &self.connection_graph(),
            entity,
            candidates,
        ))
    }

    pub fn missing_dependencies(&self, entity: &str) -> Result<Vec<Dependency>> {
        self.require(entity)?;
        Ok(graph::missing_dependencies(&self.connection_graph(), entity))
    }

    /// Parameter consistency of `entity` along its scope.
    pub fn is_sane(&self, entity: &str) -> Result<SanityReport> {
        let epoch = self.cache.epochs.entity(entity);
        if let Some(report) = self.cache.sanity.get(&entity.to_string(), epoch) {
            return Ok(report);
        }
        let report = {
            let state = self.state.read();
            let is_abstract = state.store.require(entity)?.is_abstract;
            let scope = params::parameter_scope(&Selection::current(&state), entity);
            params::check_sanity(&scope, is_abstract)
        };
        self.cache.sanity.insert(entity.to_string(), epoch, report.clone());
        Ok(report)
    }

    /// Whether `entity` may be executed, and why not.
    pub fn build_status(&self, entity: &str) -> Result<BuildStatus> {
        let is_abstract = self
            .entity(entity)
            .ok_or_else(|| Error::unknown(entity))?
            .is_abstract;
        if is_abstract {
            return Ok(BuildStatus::Blocked(BlockReason::Abstract));
        }
        let missing = self.missing_dependencies(entity)?;
        if !missing.is_empty() {
            return Ok(BuildStatus::Blocked(BlockReason::MissingDependencies(missing)));
        }
        if self.has_cycle(entity)? {
            return Ok(BuildStatus::Blocked(BlockReason::CyclicDependency));
        }
        let sanity = self.is_sane(entity)?;
        if !sanity.sane {
            return Ok(BuildStatus::Blocked(BlockReason::ParameterInconsistency(
                sanity.message,
            )));
        }
        Ok(BuildStatus::Buildable)
    }

    /// Version selection of `entity` and every ancestor in its scope.
    pub fn inherited_versions(&self, entity: &str, pins: &VersionPins) -> Result<Vec<InheritedVersion>> {
        let state = self.state.read();
        state.store.require(entity)?;
        let selection = Selection::pinned(&state, pins);
        let scope = governor::ancestor_sequence(&selection, entity, Category::Misc);

        Ok(scope
            .into_iter()
            .map(|name| {
                let log = state.logs.get(&name);
                let selected = selection.selected_id(&name);
                let description = selected
                    .and_then(|id| log?.get(id))
                    .map(|v| v.description().to_string())
                    .unwrap_or_default();
                InheritedVersion {
                    versions: log.map(|l| l.ids()).unwrap_or_default(),
                    entity: name,
                    selected,
                    description,
                }
            })
            .collect())
    }

    /// Keep only pins that change what resolution would read: the entity
    /// exists and is versioned, the id exists, and it differs from the
    /// default selection.
    pub fn filter_version_pins(&self, pins: &VersionPins) -> VersionPins {
        let state = self.state.read();
        pins.iter()
            .filter(|(name, id)| {
                let Some(log) = state.logs.get(*name) else {
                    return false;
                };
                let versioned = state.store.get(name).is_some_and(|e| !e.is_transient);
                let default = log.latest_stable().map(|v| v.id());
                versioned && *id > 0 && log.get(*id).is_some() && default != Some(*id)
            })
            .map(|(name, id)| (name.to_string(), id))
            .collect()
    }

    /// Regenerate the transient variants of `entity`, one per compatible
    /// reference. Returns their names.
    ///
    /// Variants whose name is taken by another entity are skipped.
    pub fn generate_transients(&self, entity: &str) -> Result<Vec<String>> {
        let _guard = self.write_lock.lock();
        let (generated, previous) = {
            let mut state = self.state.write();
            let compatibles = state.store.require(entity)?.compatibles();
            let previous = state.transients.remove(entity).unwrap_or_default();
            for name in &previous {
                if state.store.get(name).is_some_and(|e| e.is_transient) {
                    state.store.remove(name);
                }
            }

            let mut generated = Vec::new();
            for compatible in &compatibles {
                let variant = build_variant(entity, compatible)?;
                if state.store.contains(variant.name()) {
                    tracing::warn!(
                        entity,
                        variant = variant.name(),
                        "Variant name already taken, skipping"
                    );
                    continue;
                }
                generated.push(variant.name().to_string());
                state.store.upsert(variant);
            }
            state.transients.insert(entity.to_string(), generated.clone());
            (generated, previous)
        };

        tracing::debug!(entity, variants = generated.len(), "Generated transient variants");
        let mut changed: Vec<String> = generated.iter().chain(&previous).cloned().collect();
        changed.push(entity.to_string());
        self.invalidate(&changed);
        Ok(generated)
    }

    /// Names of the transient variants generated from `entity`.
    pub fn transients_of(&self, entity: &str) -> Vec<String> {
        self.state
            .read()
            .transients
            .get(entity)
            .cloned()
            .unwrap_or_default()
    }

    /// Parameters a build of `entity` would see.
    pub fn effective_parameters(&self, entity: &str) -> Result<Vec<ParameterDeclaration>> {
        let state = self.state.read();
        state.store.require(entity)?;
        let scope = params::parameter_scope(&Selection::current(&state), entity);
        Ok(params::effective_parameters(&scope))
    }

    /// Every parameter declaration in the scope of `entity`, with its owner.
    pub fn parameter_derivation(&self, entity: &str) -> Result<Vec<ParameterDerivation>> {
        let state = self.state.read();
        state.store.require(entity)?;
        let scope = params::parameter_scope(&Selection::current(&state), entity);
        Ok(params::parameter_derivation(&scope))
    }
}
