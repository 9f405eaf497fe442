//! Command implementations for lineage-cli

pub mod check;
pub mod rename;
pub mod resolve;
pub mod variants;
pub mod versions;

pub use check::run_check;
pub use rename::run_rename;
pub use resolve::{run_relations, run_resolve};
pub use variants::run_variants;
pub use versions::{run_commit, run_stable, run_versions};

use std::path::Path;

use lineage_core::Engine;

use crate::error::{CliError, Result};

/// Open the workspace at `root`, failing early for unknown entities.
fn open(root: &Path, entity: &str) -> Result<Engine> {
    let engine = Engine::open(root)?;
    if !engine.contains(entity) {
        return Err(CliError::user(format!(
            "Unknown entity '{entity}' (no definition under {})",
            engine.config().definitions_dir(root).display()
        )));
    }
    Ok(engine)
}
