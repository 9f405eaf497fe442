//! Field resolution and relationship listing

use std::path::Path;

use colored::Colorize;
use lineage_core::{InheritanceMode, RelationKind, VersionPins};
use serde_json::Value;

use crate::error::Result;

/// Print the value `field` takes on `entity`.
pub fn run_resolve(
    root: &Path,
    entity: &str,
    field: &str,
    mode: Option<InheritanceMode>,
    pins: &[String],
    json: bool,
) -> Result<()> {
    let engine = super::open(root, entity)?;
    let mode = mode.unwrap_or(engine.config().resolve.default_mode);

    let mut requested = VersionPins::new();
    requested.extend_parsed(pins.iter().map(String::as_str))?;
    let pins = engine.filter_version_pins(&requested);
    if pins.len() < requested.len() {
        tracing::warn!(
            ignored = requested.len() - pins.len(),
            "Ignoring pins that match the default selection or no known version"
        );
    }

    let value = engine.resolve_pinned(entity, field, mode, &pins)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{}", render(&value)?);
    }
    Ok(())
}

fn render(value: &Value) -> Result<String> {
    Ok(match value {
        Value::Null => "(unset)".dimmed().to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| format!("- {s}"))
            .collect::<Vec<_>>()
            .join("\n"),
        other => serde_json::to_string_pretty(other)?,
    })
}

/// Print every entity related to `entity`.
pub fn run_relations(root: &Path, entity: &str, json: bool) -> Result<()> {
    let engine = super::open(root, entity)?;
    let relations = engine.relationships_of(entity)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&relations)?);
        return Ok(());
    }

    println!("{} {}", "Relations of".bold(), entity.cyan());
    if relations.is_empty() {
        println!("  {}", "None".dimmed());
        return Ok(());
    }
    for (name, relation) in &relations {
        let kind = match relation.kind {
            RelationKind::Parent => "parent".blue(),
            RelationKind::Child => "child".green(),
            RelationKind::Mate => "mate".magenta(),
        };
        let leaf = if relation.is_leaf { " (leaf)".dimmed().to_string() } else { String::new() };
        println!("  {:<7} {:>2}  {}{}", kind, relation.distance, name, leaf);
    }
    Ok(())
}
