//! Engine configuration
//!
//! Configuration is merged from these TOML sources, later ones overriding
//! earlier ones key by key:
//!
//! 1. **Global defaults** - `<config_dir>/lineage/config.toml`
//! 2. **Workspace config** - `<root>/lineage.toml`
//! 3. **Local overrides** - `<root>/lineage.local.toml`
//!
//! ```toml
//! [store]
//! definitions = "jobs"
//! versions = ".lineage/versions"
//!
//! [resolve]
//! default_mode = "inherit-forced"
//!
//! [versions]
//! default_author = "ci"
//! ```

mod resolver;

pub use resolver::ConfigResolver;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::governor::InheritanceMode;

/// Effective engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub store: StoreConfig,
    pub resolve: ResolveConfig,
    pub versions: VersionsConfig,
}

/// Where definitions and version logs live, relative to the workspace root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub definitions: PathBuf,
    pub versions: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            definitions: PathBuf::from("jobs"),
            versions: PathBuf::from(".lineage/versions"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    pub default_mode: InheritanceMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionsConfig {
    pub default_author: String,
}

impl Default for VersionsConfig {
    fn default() -> Self {
        Self {
            default_author: "lineage".to_string(),
        }
    }
}

impl EngineConfig {
    /// Definitions directory under `root`.
    pub fn definitions_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.store.definitions)
    }

    /// Version log directory under `root`.
    pub fn versions_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.store.versions)
    }
}
