//! Per-entity append-only version logs
//!
//! Each non-transient entity owns a [`VersionLog`]: an ordered list of
//! immutable snapshots of its locally declared fields. Only the `stable`
//! marker and the description of a version may change after it is written.
//! Renaming an entity is the one operation allowed to rewrite snapshot
//! contents, and only inside reference fields.

mod backend;
mod pins;

pub use backend::{FileBackend, MemoryBackend, VersionBackend};
pub use pins::VersionPins;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::FieldMap;
use crate::reference::rename_in_list;

/// One immutable snapshot of an entity's declared fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    id: u64,
    author: String,
    description: String,
    stable: bool,
    created_at: DateTime<Utc>,
    checksum: String,
    fields: FieldMap,
}

impl Version {
    fn new(id: u64, fields: FieldMap, author: &str, description: &str) -> Self {
        Self {
            id,
            author: author.to_string(),
            description: description.to_string(),
            stable: false,
            created_at: Utc::now(),
            checksum: fields_checksum(&fields),
            fields,
        }
    }

    /// Rebuild a version read back from a persistence backend.
    pub(crate) fn restore(
        id: u64,
        author: String,
        description: String,
        stable: bool,
        created_at: DateTime<Utc>,
        fields: FieldMap,
    ) -> Self {
        Self {
            id,
            author,
            description,
            stable,
            created_at,
            checksum: fields_checksum(&fields),
            fields,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_stable(&self) -> bool {
        self.stable
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// `sha256:<hex>` of the canonical JSON field map.
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }
}

/// Checksum of a field map. `FieldMap` is ordered, so the JSON encoding is
/// canonical.
pub fn fields_checksum(fields: &FieldMap) -> String {
    let canonical = serde_json::to_string(fields).unwrap_or_default();
    lineage_fs::compute_content_checksum(&canonical)
}

/// Ordered version history of one entity, oldest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VersionLog {
    versions: Vec<Version>,
}

impl VersionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a log from versions loaded by a backend.
    ///
    /// Versions are ordered by id and repeated ids keep their first entry.
    pub fn from_versions(mut versions: Vec<Version>) -> Self {
        versions.sort_by_key(|v| v.id);
        versions.dedup_by_key(|v| v.id);
        Self { versions }
    }

    /// Append a snapshot of `fields`.
    ///
    /// Returns `None` and leaves the log untouched when `fields` equals the
    /// latest snapshot.
    pub fn create(&mut self, fields: FieldMap, author: &str, description: &str) -> Option<&Version> {
        if self.latest().is_some_and(|latest| latest.fields == fields) {
            return None;
        }
        let id = self.latest().map_or(1, |latest| latest.id + 1);
        self.versions.push(Version::new(id, fields, author, description));
        self.versions.last()
    }

    pub fn get(&self, id: u64) -> Option<&Version> {
        self.versions
            .binary_search_by_key(&id, |v| v.id)
            .ok()
            .map(|index| &self.versions[index])
    }

    fn get_mut(&mut self, id: u64) -> Option<&mut Version> {
        self.versions
            .binary_search_by_key(&id, |v| v.id)
            .ok()
            .map(|index| &mut self.versions[index])
    }

    pub fn latest(&self) -> Option<&Version> {
        self.versions.last()
    }

    /// Highest-id stable version, or the latest one if none is stable.
    pub fn latest_stable(&self) -> Option<&Version> {
        self.versions
            .iter()
            .rev()
            .find(|v| v.stable)
            .or_else(|| self.latest())
    }

    pub fn all(&self) -> &[Version] {
        &self.versions
    }

    pub fn ids(&self) -> Vec<u64> {
        self.versions.iter().map(|v| v.id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn set_stable(&mut self, id: u64, stable: bool) -> Option<&Version> {
        let version = self.get_mut(id)?;
        version.stable = stable;
        Some(version)
    }

    pub fn set_description(&mut self, id: u64, description: &str) -> Option<&Version> {
        let version = self.get_mut(id)?;
        version.description = description.to_string();
        Some(version)
    }

    /// Rewrite references to `old` in every snapshot. Returns whether any
    /// version changed.
    pub fn rename_references(&mut self, old: &str, new: &str) -> bool {
        let mut changed = false;
        for version in &mut self.versions {
            let mut touched = false;
            for field in crate::fields::REFERENCE_FIELDS {
                if let Some(list) = version.fields.get_mut(field) {
                    touched |= rename_in_list(list, old, new);
                }
            }
            if touched {
                version.checksum = fields_checksum(&version.fields);
                changed = true;
            }
        }
        changed
    }
}
