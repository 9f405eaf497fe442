//! [`TestWorkspace`] builder for on-disk scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary workspace root with a definitions directory.
///
/// # Example
///
/// ```rust,no_run
/// use lineage_test_utils::TestWorkspace;
///
/// let ws = TestWorkspace::new();
/// ws.write_definition("base.toml", "name = \"base\"\n");
/// ws.assert_file_exists("jobs/base.toml");
/// ```
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorkspace {
    pub fn new() -> Self {
        let workspace = Self {
            temp_dir: TempDir::new().unwrap(),
        };
        fs::create_dir_all(workspace.definitions_dir()).unwrap();
        workspace
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Default definitions directory (`jobs/`).
    pub fn definitions_dir(&self) -> PathBuf {
        self.root().join("jobs")
    }

    /// Default version log directory.
    pub fn versions_dir(&self) -> PathBuf {
        self.root().join(".lineage/versions")
    }

    /// Write a definition file below `jobs/`.
    pub fn write_definition(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.definitions_dir().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// Write `lineage.toml` at the root.
    pub fn write_config(&self, content: &str) {
        fs::write(self.root().join("lineage.toml"), content).unwrap();
    }

    /// The standard three-level chain as TOML definitions.
    pub fn with_chain(self) -> Self {
        self.write_definition("base.toml", "name = \"base\"\n\n[fields]\nsteps = [\"s1\"]\n");
        self.write_definition(
            "mid.toml",
            "name = \"mid\"\n\n[[parents]]\nname = \"base\"\n\n[fields]\nsteps = [\"s2\"]\n",
        );
        self.write_definition("leaf.toml", "name = \"leaf\"\n\n[[parents]]\nname = \"mid\"\n");
        self
    }

    pub fn read(&self, relative: &str) -> String {
        let path = self.root().join(relative);
        fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", path.display()))
    }

    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, relative: &str) {
        let path = self.root().join(relative);
        assert!(path.exists(), "Expected file to exist: {}", path.display());
    }

    pub fn assert_file_not_exists(&self, relative: &str) {
        let path = self.root().join(relative);
        assert!(!path.exists(), "Expected file NOT to exist: {}", path.display());
    }
}
