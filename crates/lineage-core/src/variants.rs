//! Transient variants generated from compatible references

use serde_json::Value;

use crate::Result;
use crate::entity::Entity;
use crate::fields;
use crate::params::ParameterDeclaration;
use crate::reference::{CompatibleReference, ParentReference};

/// Name of the variant of `base` built with `compatible`.
pub fn variant_name(base: &str, compatible: &CompatibleReference) -> String {
    match compatible.variance.as_deref().filter(|v| !v.is_empty()) {
        Some(variance) => format!("{base}_{}_{variance}", compatible.name),
        None => format!("{base}_{}", compatible.name),
    }
}

/// Build the transient entity combining `base` with one compatible entity.
///
/// The variant inherits from both, base first, and declares the
/// compatible reference's parameter overrides as defaults.
pub fn build_variant(base: &str, compatible: &CompatibleReference) -> Result<Entity> {
    let mut entity = Entity::new(variant_name(base, compatible))?
        .transient()
        .with_parent(ParentReference::new(base))
        .with_parent(ParentReference::new(&compatible.name));

    if !compatible.parameters.is_empty() {
        let declarations: Vec<ParameterDeclaration> = compatible
            .parameters
            .iter()
            .map(|(name, value)| ParameterDeclaration::new(name).with_default(value))
            .collect();
        entity.set_field(fields::PARAMETERS, serde_json::to_value(declarations)?);
    }
    if let Some(variance) = &compatible.variance {
        entity.set_field("variance", Value::String(variance.clone()));
    }
    Ok(entity)
}
