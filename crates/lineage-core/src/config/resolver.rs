//! Layered configuration loading

use std::fs;
use std::path::{Path, PathBuf};

use toml::{Table, Value};

use super::EngineConfig;
use crate::Result;

const WORKSPACE_CONFIG: &str = "lineage.toml";
const LOCAL_CONFIG: &str = "lineage.local.toml";

/// Resolves [`EngineConfig`] for a workspace root.
pub struct ConfigResolver {
    root: PathBuf,

    /// Override for the global config directory (used for testing).
    /// When `None`, `dirs::config_dir()` is used.
    global_config_dir_override: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            global_config_dir_override: None,
        }
    }

    /// Create a resolver with a custom global config directory.
    pub fn with_global_config_dir(root: impl Into<PathBuf>, global_config_dir: PathBuf) -> Self {
        Self {
            root: root.into(),
            global_config_dir_override: Some(global_config_dir),
        }
    }

    fn global_config_dir(&self) -> Option<PathBuf> {
        if let Some(ref override_dir) = self.global_config_dir_override {
            return Some(override_dir.clone());
        }
        dirs::config_dir().map(|d| d.join("lineage"))
    }

    /// Merge every present layer over the defaults.
    ///
    /// Missing layers are skipped. Invalid TOML in any layer is an error.
    pub fn resolve(&self) -> Result<EngineConfig> {
        let mut merged = Table::new();

        let layers = [
            ("global", self.global_config_dir().map(|d| d.join("config.toml"))),
            ("workspace", Some(self.root.join(WORKSPACE_CONFIG))),
            ("local", Some(self.root.join(LOCAL_CONFIG))),
        ];
        for (layer, path) in layers {
            let Some(path) = path else {
                continue;
            };
            if path.is_file() {
                tracing::debug!(layer, ?path, "Loading config layer");
                let table = load_table(&path)?;
                deep_merge(&mut merged, table);
            } else {
                tracing::debug!(layer, ?path, "No config found, skipping");
            }
        }

        Ok(Value::Table(merged).try_into()?)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn has_config(&self) -> bool {
        self.root.join(WORKSPACE_CONFIG).is_file()
    }

    pub fn has_local_overrides(&self) -> bool {
        self.root.join(LOCAL_CONFIG).is_file()
    }
}

fn load_table(path: &Path) -> Result<Table> {
    let content = fs::read_to_string(path)?;
    Ok(content.parse::<Table>()?)
}

fn deep_merge(base: &mut Table, other: Table) {
    for (key, other_val) in other {
        match (base.get_mut(&key), other_val) {
            (Some(Value::Table(base_table)), Value::Table(other_table)) => {
                deep_merge(base_table, other_table);
            }
            (_, other_val) => {
                base.insert(key, other_val);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::governor::InheritanceMode;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn resolver(root: &TempDir, global: &TempDir) -> ConfigResolver {
        ConfigResolver::with_global_config_dir(root.path(), global.path().to_path_buf())
    }

    #[test]
    fn defaults_without_any_config() {
        let root = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();
        let resolver = resolver(&root, &global);

        assert!(!resolver.has_config());
        assert_eq!(resolver.resolve().unwrap(), EngineConfig::default());
    }

    #[test]
    fn later_layers_override_earlier_ones() {
        let root = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();
        fs::write(
            global.path().join("config.toml"),
            "[versions]\ndefault_author = \"global\"\n[resolve]\ndefault_mode = \"local-only\"\n",
        )
        .unwrap();
        fs::write(
            root.path().join("lineage.toml"),
            "[store]\ndefinitions = \"defs\"\n[resolve]\ndefault_mode = \"inherit-forced\"\n",
        )
        .unwrap();
        fs::write(
            root.path().join("lineage.local.toml"),
            "[versions]\ndefault_author = \"me\"\n",
        )
        .unwrap();

        let config = resolver(&root, &global).resolve().unwrap();
        assert_eq!(config.store.definitions, PathBuf::from("defs"));
        assert_eq!(config.store.versions, PathBuf::from(".lineage/versions"));
        assert_eq!(config.resolve.default_mode, InheritanceMode::InheritForced);
        assert_eq!(config.versions.default_author, "me");
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let root = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();
        fs::write(root.path().join("lineage.toml"), "[store\n").unwrap();
        assert!(resolver(&root, &global).resolve().is_err());
    }
}
