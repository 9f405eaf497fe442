//! Build readiness check

use std::path::Path;

use colored::Colorize;
use lineage_core::{BlockReason, BuildStatus};

use crate::error::{CliError, Result};

/// Print whether `entity` is buildable. A blocked entity is an error so
/// scripts can rely on the exit code.
pub fn run_check(root: &Path, entity: &str) -> Result<()> {
    let engine = super::open(root, entity)?;

    match engine.build_status(entity)? {
        BuildStatus::Buildable => {
            println!("{} {}", entity.cyan(), "is buildable".green());
            Ok(())
        }
        BuildStatus::Blocked(reason) => {
            println!("{} {}", entity.cyan(), "is blocked".red().bold());
            if let BlockReason::MissingDependencies(missing) = &reason {
                for dependency in missing {
                    println!("  {} {}", "-".red(), dependency);
                }
            }
            Err(CliError::user(format!("'{entity}' is not buildable: {reason}")))
        }
    }
}
