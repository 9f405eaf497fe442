//! Entity renaming

use std::path::Path;

use colored::Colorize;
use lineage_core::{EntityDefinition, definition_path, load_definition_files, save_definition};

use crate::error::{CliError, Result};

/// Rename `old` to `new` in the engine and rewrite every definition file
/// whose content changed. The renamed entity moves to `<new>.toml`.
pub fn run_rename(root: &Path, old: &str, new: &str) -> Result<()> {
    let engine = super::open(root, old)?;
    let dir = engine.config().definitions_dir(root);
    let files = load_definition_files(&dir)?;

    engine.rename(old, new)?;

    let mut rewritten = 0;
    for (path, before) in files {
        let renamed = before.name == old;
        let name = if renamed { new } else { before.name.as_str() };
        let Some(entity) = engine.entity(name) else {
            return Err(CliError::user(format!("'{name}' vanished during rename")));
        };
        let after = EntityDefinition::from(&entity);

        if renamed {
            lineage_fs::io::remove_if_exists(&path)?;
            save_definition(&definition_path(&dir, new), &after)?;
            rewritten += 1;
        } else if after != before {
            save_definition(&path, &after)?;
            rewritten += 1;
        }
    }

    println!(
        "{} {} to {} ({} definition(s) updated)",
        "Renamed".green().bold(),
        old.cyan(),
        new.cyan(),
        rewritten
    );
    Ok(())
}
