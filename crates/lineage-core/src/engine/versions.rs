//! Versioning surface: snapshots, metadata and rename

use std::collections::BTreeSet;

use super::Engine;
use crate::entity::{FieldMap, validate_name};
use crate::reference::rename_in_list;
use crate::version::{Version, VersionLog};
use crate::{Error, Result};

impl Engine {
    /// Record `fields` as the new declared state of `entity` and snapshot
    /// it.
    ///
    /// Returns `None` when the snapshot equals the latest version; the log
    /// is then left unchanged. A failed write to the backend is logged and
    /// the in-memory log stays authoritative.
    pub fn create_version(
        &self,
        entity: &str,
        fields: FieldMap,
        author: &str,
        description: &str,
    ) -> Result<Option<Version>> {
        let _guard = self.write_lock.lock();
        let created = {
            let mut state = self.state.write();
            let live = state.store.get_mut(entity).ok_or_else(|| Error::unknown(entity))?;
            if live.is_transient {
                return Err(Error::TransientNotVersioned {
                    name: entity.to_string(),
                });
            }
            live.set_fields(fields.clone());
            state
                .logs
                .entry(entity.to_string())
                .or_default()
                .create(fields, author, description)
                .cloned()
        };

        match &created {
            Some(version) => {
                tracing::debug!(entity, id = version.id(), author, "Created version");
                if let Err(e) = self.backend.append(entity, version) {
                    tracing::error!(entity, id = version.id(), error = %e, "Failed to persist version");
                }
            }
            None => tracing::debug!(entity, "Snapshot identical to latest version, not recorded"),
        }
        self.invalidate(&[entity.to_string()]);
        Ok(created)
    }

    /// Snapshot the live declared state of `entity`.
    pub fn commit_version(&self, entity: &str, author: &str, description: &str) -> Result<Option<Version>> {
        let _guard = self.write_lock.lock();
        let fields = self.state.read().store.require(entity)?.fields().clone();
        self.create_version(entity, fields, author, description)
    }

    fn with_log<T>(&self, entity: &str, read: impl FnOnce(Option<&VersionLog>) -> T) -> Result<T> {
        let state = self.state.read();
        state.store.require(entity)?;
        Ok(read(state.logs.get(entity)))
    }

    pub fn get_version(&self, entity: &str, id: u64) -> Result<Option<Version>> {
        self.with_log(entity, |log| log.and_then(|l| l.get(id)).cloned())
    }

    pub fn latest(&self, entity: &str) -> Result<Option<Version>> {
        self.with_log(entity, |log| log.and_then(VersionLog::latest).cloned())
    }

    /// Highest-id stable version, falling back to the latest.
    pub fn latest_stable(&self, entity: &str) -> Result<Option<Version>> {
        self.with_log(entity, |log| log.and_then(VersionLog::latest_stable).cloned())
    }

    /// Every version of `entity`, oldest first.
    pub fn all_versions(&self, entity: &str) -> Result<Vec<Version>> {
        self.with_log(entity, |log| log.map(|l| l.all().to_vec()).unwrap_or_default())
    }

    /// Mark or unmark a version as stable. Changes which version
    /// unpinned resolutions read.
    pub fn set_version_stability(&self, entity: &str, id: u64, stable: bool) -> Result<Version> {
        let _guard = self.write_lock.lock();
        let version = self.update_version(entity, id, |log| log.set_stable(id, stable).cloned())?;
        self.invalidate(&[entity.to_string()]);
        Ok(version)
    }

    pub fn set_version_description(&self, entity: &str, id: u64, description: &str) -> Result<Version> {
        let _guard = self.write_lock.lock();
        self.update_version(entity, id, |log| log.set_description(id, description).cloned())
    }

    fn update_version(
        &self,
        entity: &str,
        id: u64,
        update: impl FnOnce(&mut VersionLog) -> Option<Version>,
    ) -> Result<Version> {
        let version = {
            let mut state = self.state.write();
            state.store.require(entity)?;
            state.logs.get_mut(entity).and_then(update)
        }
        .ok_or_else(|| Error::UnknownVersion {
            entity: entity.to_string(),
            id,
        })?;

        if let Err(e) = self.backend.update_metadata(entity, &version) {
            tracing::error!(entity, id, error = %e, "Failed to persist version metadata");
        }
        Ok(version)
    }

    /// Rename an entity and every reference to it.
    ///
    /// References are rewritten in live state and inside every stored
    /// version of every log. Each log is rewritten on a copy and swapped in
    /// whole, then persisted in one atomic write per entity.
    pub fn rename(&self, old: &str, new: &str) -> Result<()> {
        validate_name(new)?;
        let _guard = self.write_lock.lock();

        let (rewritten, mut touched) = {
            let mut state = self.state.write();
            if !state.store.contains(old) {
                return Err(Error::unknown(old));
            }
            if old == new {
                return Ok(());
            }
            if state.store.contains(new) {
                return Err(Error::EntityExists {
                    name: new.to_string(),
                });
            }

            let mut logs = state.logs.clone();
            let mut rewritten: BTreeSet<String> = BTreeSet::new();
            for (name, log) in logs.iter_mut() {
                if log.rename_references(old, new) {
                    rewritten.insert(if name == old { new.to_string() } else { name.clone() });
                }
            }
            if let Some(log) = logs.remove(old) {
                logs.insert(new.to_string(), log);
            }

            if let Some(mut entity) = state.store.remove(old) {
                entity.set_name(new);
                state.store.upsert(entity);
            }
            let mut touched: Vec<String> = Vec::new();
            for entity in state.store.iter_mut() {
                let mut changed = false;
                for field in crate::fields::REFERENCE_FIELDS {
                    if let Some(list) = entity.fields_mut().get_mut(field) {
                        changed |= rename_in_list(list, old, new);
                    }
                }
                if changed {
                    touched.push(entity.name().to_string());
                }
            }
            if let Some(variants) = state.transients.remove(old) {
                state.transients.insert(new.to_string(), variants);
            }
            state.logs = logs;

            let rewritten: Vec<(String, Vec<Version>)> = rewritten
                .into_iter()
                .filter_map(|name| {
                    let versions = state.logs.get(&name)?.all().to_vec();
                    Some((name, versions))
                })
                .collect();
            (rewritten, touched)
        };

        if let Err(e) = self.backend.rename(old, new) {
            tracing::error!(old, new, error = %e, "Failed to move version log");
        }
        for (name, versions) in &rewritten {
            if let Err(e) = self.backend.replace_all(name, versions) {
                tracing::error!(entity = %name, error = %e, "Failed to persist renamed references");
            }
        }
        tracing::debug!(old, new, logs = rewritten.len(), "Renamed entity");

        touched.extend(rewritten.into_iter().map(|(name, _)| name));
        touched.push(old.to_string());
        touched.push(new.to_string());
        self.invalidate(&touched);
        Ok(())
    }
}
