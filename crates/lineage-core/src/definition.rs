//! Entity definitions on disk
//!
//! A definitions directory holds one document per entity in TOML, JSON or
//! YAML. Subdirectories are walked and files with unsupported extensions
//! are ignored.
//!
//! ```toml
//! name = "team/build"
//! abstract = false
//!
//! [[parents]]
//! name = "base"
//! priorities = { steps = 1 }
//!
//! [[compatibles]]
//! name = "linux"
//! variance = "x64"
//! parameters = { ARCH = "x64" }
//!
//! [fields]
//! steps = ["make"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use lineage_fs::{DocumentFormat, DocumentStore};
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, FieldMap};
use crate::reference::{CompatibleReference, ParentReference};
use crate::{Error, Result};

/// Serialized form of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDefinition {
    pub name: String,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default, rename = "transient")]
    pub is_transient: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<ParentReference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compatibles: Vec<CompatibleReference>,
    #[serde(default)]
    pub fields: FieldMap,
}

impl EntityDefinition {
    /// Build the entity this definition describes.
    ///
    /// `parents` and `compatibles` win over reference fields spelled out
    /// in `fields`.
    pub fn into_entity(self) -> Result<Entity> {
        let mut entity = Entity::new(self.name)?;
        entity.is_abstract = self.is_abstract;
        entity.is_transient = self.is_transient;
        entity.set_fields(self.fields);
        if !self.parents.is_empty() {
            entity.set_parents(&self.parents);
        }
        if !self.compatibles.is_empty() {
            entity.set_compatibles(&self.compatibles);
        }
        Ok(entity)
    }
}

impl From<&Entity> for EntityDefinition {
    fn from(entity: &Entity) -> Self {
        let mut fields = entity.fields().clone();
        for field in crate::fields::REFERENCE_FIELDS {
            fields.remove(field);
        }
        Self {
            name: entity.name().to_string(),
            is_abstract: entity.is_abstract,
            is_transient: entity.is_transient,
            parents: entity.parents(),
            compatibles: entity.compatibles(),
            fields,
        }
    }
}

/// Load every definition below `dir`, sorted by entity name.
///
/// A missing directory yields no definitions.
pub fn load_definitions(dir: &Path) -> Result<Vec<EntityDefinition>> {
    Ok(load_definition_files(dir)?
        .into_iter()
        .map(|(_, definition)| definition)
        .collect())
}

/// Like [`load_definitions`], keeping the file each definition came from.
pub fn load_definition_files(dir: &Path) -> Result<Vec<(PathBuf, EntityDefinition)>> {
    let mut definitions = Vec::new();
    if dir.is_dir() {
        collect(&DocumentStore::new(), dir, &mut definitions)?;
    } else {
        tracing::debug!(dir = %dir.display(), "Definitions directory not found");
    }
    definitions.sort_by(|(_, a), (_, b)| a.name.cmp(&b.name));
    Ok(definitions)
}

fn collect(
    store: &DocumentStore,
    dir: &Path,
    out: &mut Vec<(PathBuf, EntityDefinition)>,
) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| lineage_fs::Error::io(dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| lineage_fs::Error::io(dir, e))?.path();
        if path.is_dir() {
            collect(store, &path, out)?;
        } else if DocumentFormat::is_supported(&path) {
            tracing::debug!(path = %path.display(), "Loading entity definition");
            let definition = store.load(&path)?;
            out.push((path, definition));
        }
    }
    Ok(())
}

/// Where a new definition of `name` is written: `<dir>/<name>.toml`, with
/// folder-qualified names mapped to subdirectories.
pub fn definition_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.toml"))
}

/// Write a definition to `path`, choosing the format from its extension.
pub fn save_definition(path: &Path, definition: &EntityDefinition) -> Result<()> {
    DocumentStore::new().save(path, definition).map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn loads_mixed_formats_recursively() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("base.toml"),
            "name = \"base\"\nabstract = true\n[fields]\nsteps = [\"s1\"]\n",
        )
        .unwrap();
        fs::create_dir(dir.path().join("team")).unwrap();
        fs::write(
            dir.path().join("team/leaf.json"),
            r#"{"name": "team/leaf", "parents": [{"name": "base"}]}"#,
        )
        .unwrap();
        fs::write(dir.path().join("README.md"), "ignored").unwrap();

        let definitions = load_definitions(dir.path()).unwrap();
        let names: Vec<_> = definitions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["base", "team/leaf"]);
        assert!(definitions[0].is_abstract);
        assert_eq!(definitions[0].fields.get("steps"), Some(&json!(["s1"])));
    }

    #[test]
    fn missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let definitions = load_definitions(&dir.path().join("absent")).unwrap();
        assert!(definitions.is_empty());
    }

    #[test]
    fn definition_files_keep_their_source() {
        let dir = TempDir::new().unwrap();
        let path = definition_path(dir.path(), "team/job");
        let definition = EntityDefinition::from(&Entity::new("team/job").unwrap());
        save_definition(&path, &definition).unwrap();

        let files = load_definition_files(dir.path()).unwrap();
        assert_eq!(files, vec![(dir.path().join("team/job.toml"), definition)]);
    }

    #[test]
    fn definition_moves_references_into_fields() {
        let definition = EntityDefinition {
            name: "leaf".into(),
            is_abstract: false,
            is_transient: false,
            parents: vec![ParentReference::new("base")],
            compatibles: vec![CompatibleReference::new("linux")],
            fields: FieldMap::from([("steps".to_string(), json!(["s"]))]),
        };
        let entity = definition.clone().into_entity().unwrap();
        assert_eq!(entity.parents(), vec![ParentReference::new("base")]);
        assert_eq!(entity.compatibles().len(), 1);
        assert_eq!(EntityDefinition::from(&entity), definition);
    }
}
