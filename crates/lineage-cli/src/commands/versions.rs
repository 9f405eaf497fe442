//! Version listing, committing and stability flags

use std::path::Path;

use colored::Colorize;

use crate::error::{CliError, Result};

/// List every version of `entity`, oldest first.
pub fn run_versions(root: &Path, entity: &str) -> Result<()> {
    let engine = super::open(root, entity)?;
    let versions = engine.all_versions(entity)?;
    let selected = engine.latest_stable(entity)?.map(|v| v.id());

    println!("{} {}", "Versions of".bold(), entity.cyan());
    if versions.is_empty() {
        println!(
            "  {} (use {} to create one)",
            "None".dimmed(),
            "lineage commit".cyan()
        );
        return Ok(());
    }
    for version in &versions {
        let marker = if Some(version.id()) == selected { "*".green() } else { " ".normal() };
        let stability = if version.is_stable() { "stable".green() } else { "unstable".yellow() };
        println!(
            "{} {:>3}  {:<8}  {}  {}  {}",
            marker,
            version.id(),
            stability,
            version.created_at().format("%Y-%m-%d %H:%M"),
            version.author().dimmed(),
            version.description()
        );
    }
    Ok(())
}

/// Commit the current definition of `entity`.
pub fn run_commit(root: &Path, entity: &str, message: &str, author: Option<&str>) -> Result<()> {
    let engine = super::open(root, entity)?;
    let author = author.unwrap_or(engine.config().versions.default_author.as_str());

    match engine.commit_version(entity, author, message)? {
        Some(version) => println!(
            "{} version {} of {}",
            "Committed".green().bold(),
            version.id(),
            entity.cyan()
        ),
        None => println!("{} {}", "No changes to commit for".yellow(), entity.cyan()),
    }
    Ok(())
}

/// Set or clear the stable flag of one version.
pub fn run_stable(root: &Path, entity: &str, id: u64, stable: bool) -> Result<()> {
    let engine = super::open(root, entity)?;
    if engine.get_version(entity, id)?.is_none() {
        return Err(CliError::user(format!("'{entity}' has no version {id}")));
    }

    let version = engine.set_version_stability(entity, id, stable)?;
    let state = if version.is_stable() { "stable".green() } else { "unstable".yellow() };
    println!("Version {} of {} is now {}", id, entity.cyan(), state);
    Ok(())
}
