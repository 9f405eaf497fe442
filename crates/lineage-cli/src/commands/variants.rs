//! Transient variant generation

use std::path::Path;

use colored::Colorize;

use crate::error::Result;

/// Show the variants generated from the compatible references of `entity`
/// together with the parameters each one would build with.
///
/// Variants live only in memory; nothing is written.
pub fn run_variants(root: &Path, entity: &str) -> Result<()> {
    let engine = super::open(root, entity)?;
    let variants = engine.generate_transients(entity)?;

    if variants.is_empty() {
        println!("{} has no compatible entities", entity.cyan());
        return Ok(());
    }
    for variant in &variants {
        println!("{} {}", "+".green(), variant.cyan());
        for parameter in engine.effective_parameters(variant)? {
            let default = parameter.default.as_deref().unwrap_or("");
            println!("    {} = {}", parameter.name, default);
        }
        let sanity = engine.is_sane(variant)?;
        if !sanity.sane {
            println!("    {} {}", "inconsistent:".red(), sanity.message);
        }
    }
    Ok(())
}
