//! Version log persistence
//!
//! The engine keeps every log in memory and mirrors changes to a
//! [`VersionBackend`]. Backends only need to append immutable records,
//! update the two mutable metadata fields, and replace a whole log
//! atomically (used by rename).

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::Version;
use crate::entity::FieldMap;
use crate::{Error, Result};

/// Durable storage for version logs.
pub trait VersionBackend: Send + Sync {
    /// Every version stored for `entity`, in any order.
    fn load(&self, entity: &str) -> Result<Vec<Version>>;

    fn append(&self, entity: &str, version: &Version) -> Result<()>;

    /// Persist the `stable` and `description` metadata of `version`.
    fn update_metadata(&self, entity: &str, version: &Version) -> Result<()>;

    /// Replace the stored log of `entity` in one step.
    fn replace_all(&self, entity: &str, versions: &[Version]) -> Result<()>;

    /// Move the log of `old` to `new`.
    fn rename(&self, old: &str, new: &str) -> Result<()>;

    fn remove(&self, entity: &str) -> Result<()>;
}

/// Process-local backend, for tests and ephemeral hosts.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    logs: Mutex<HashMap<String, Vec<Version>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VersionBackend for MemoryBackend {
    fn load(&self, entity: &str) -> Result<Vec<Version>> {
        Ok(self.logs.lock().get(entity).cloned().unwrap_or_default())
    }

    fn append(&self, entity: &str, version: &Version) -> Result<()> {
        self.logs
            .lock()
            .entry(entity.to_string())
            .or_default()
            .push(version.clone());
        Ok(())
    }

    fn update_metadata(&self, entity: &str, version: &Version) -> Result<()> {
        let mut logs = self.logs.lock();
        let stored = logs
            .get_mut(entity)
            .and_then(|log| log.iter_mut().find(|v| v.id == version.id))
            .ok_or_else(|| Error::UnknownVersion {
                entity: entity.to_string(),
                id: version.id,
            })?;
        stored.stable = version.stable;
        stored.description = version.description.clone();
        Ok(())
    }

    fn replace_all(&self, entity: &str, versions: &[Version]) -> Result<()> {
        self.logs.lock().insert(entity.to_string(), versions.to_vec());
        Ok(())
    }

    fn rename(&self, old: &str, new: &str) -> Result<()> {
        let mut logs = self.logs.lock();
        if let Some(log) = logs.remove(old) {
            logs.insert(new.to_string(), log);
        }
        Ok(())
    }

    fn remove(&self, entity: &str) -> Result<()> {
        self.logs.lock().remove(entity);
        Ok(())
    }
}

/// One TOML document per entity under a versions directory.
///
/// Field values are stored as JSON strings so that nulls and mixed-type
/// arrays survive TOML.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct LogFile {
    entity: String,
    #[serde(default)]
    versions: Vec<VersionRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct VersionRecord {
    id: u64,
    author: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    stable: bool,
    created_at: DateTime<Utc>,
    /// Empty in logs written before checksums were stored.
    #[serde(default)]
    checksum: String,
    #[serde(default)]
    fields: BTreeMap<String, String>,
}

impl VersionRecord {
    fn from_version(version: &Version) -> Result<Self> {
        let fields = version
            .fields
            .iter()
            .map(|(name, value)| Ok((name.clone(), serde_json::to_string(value)?)))
            .collect::<Result<_>>()?;
        Ok(Self {
            id: version.id,
            author: version.author.clone(),
            description: version.description.clone(),
            stable: version.stable,
            created_at: version.created_at,
            checksum: version.checksum.clone(),
            fields,
        })
    }

    /// Decode the record. A stored checksum that disagrees with the fields
    /// is logged and replaced by the recomputed one.
    fn into_version(self, entity: &str) -> Result<Version> {
        let fields = self
            .fields
            .into_iter()
            .map(|(name, raw)| Ok((name, serde_json::from_str(&raw)?)))
            .collect::<Result<FieldMap>>()?;
        let version = Version::restore(
            self.id,
            self.author,
            self.description,
            self.stable,
            self.created_at,
            fields,
        );
        if !checksum_matches(&self.checksum, &version) {
            tracing::warn!(
                entity,
                id = version.id,
                stored = %self.checksum,
                computed = %version.checksum,
                "Version checksum mismatch, the log was modified outside lineage"
            );
        }
        Ok(version)
    }
}

fn checksum_matches(stored: &str, version: &Version) -> bool {
    stored.is_empty() || stored == version.checksum
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the log file for `entity`.
    pub fn log_path(&self, entity: &str) -> PathBuf {
        self.dir.join(format!("{}.toml", file_stem(entity)))
    }

    fn read(&self, entity: &str) -> Result<Option<LogFile>> {
        let path = self.log_path(entity);
        if !path.exists() {
            return Ok(None);
        }
        let content = lineage_fs::io::read_locked(&path)?;
        Ok(Some(toml::from_str(&content)?))
    }

    fn write(&self, file: &LogFile) -> Result<()> {
        let content = toml::to_string_pretty(file)?;
        lineage_fs::io::write_atomic(&self.log_path(&file.entity), content.as_bytes())?;
        Ok(())
    }

    fn read_or_empty(&self, entity: &str) -> Result<LogFile> {
        Ok(self.read(entity)?.unwrap_or_else(|| LogFile {
            entity: entity.to_string(),
            versions: Vec::new(),
        }))
    }
}

impl VersionBackend for FileBackend {
    fn load(&self, entity: &str) -> Result<Vec<Version>> {
        match self.read(entity)? {
            Some(file) => file
                .versions
                .into_iter()
                .map(|record| record.into_version(entity))
                .collect(),
            None => Ok(Vec::new()),
        }
    }

    fn append(&self, entity: &str, version: &Version) -> Result<()> {
        let mut file = self.read_or_empty(entity)?;
        file.versions.push(VersionRecord::from_version(version)?);
        self.write(&file)
    }

    fn update_metadata(&self, entity: &str, version: &Version) -> Result<()> {
        let mut file = self.read_or_empty(entity)?;
        let record = file
            .versions
            .iter_mut()
            .find(|r| r.id == version.id)
            .ok_or_else(|| Error::UnknownVersion {
                entity: entity.to_string(),
                id: version.id,
            })?;
        record.stable = version.stable;
        record.description = version.description.clone();
        self.write(&file)
    }

    fn replace_all(&self, entity: &str, versions: &[Version]) -> Result<()> {
        let file = LogFile {
            entity: entity.to_string(),
            versions: versions
                .iter()
                .map(VersionRecord::from_version)
                .collect::<Result<_>>()?,
        };
        self.write(&file)
    }

    fn rename(&self, old: &str, new: &str) -> Result<()> {
        let Some(mut file) = self.read(old)? else {
            return Ok(());
        };
        file.entity = new.to_string();
        self.write(&file)?;
        lineage_fs::io::remove_if_exists(&self.log_path(old))?;
        Ok(())
    }

    fn remove(&self, entity: &str) -> Result<()> {
        lineage_fs::io::remove_if_exists(&self.log_path(entity))?;
        Ok(())
    }
}

/// Map an entity name onto a single path component.
fn file_stem(entity: &str) -> String {
    let mut stem = String::with_capacity(entity.len());
    for c in entity.chars() {
        match c {
            '%' => stem.push_str("%25"),
            '/' => stem.push_str("%2F"),
            '\\' => stem.push_str("%5C"),
            ':' => stem.push_str("%3A"),
            _ => stem.push(c),
        }
    }
    stem
}
