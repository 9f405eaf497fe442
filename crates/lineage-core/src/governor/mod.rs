//! Inheritance governor
//!
//! Resolves one field on one entity: build the ordered ancestor scope,
//! read each member's declared value under the current version selection,
//! drop absent or mis-shaped values, and reduce what remains with the
//! field's [`MergeStrategy`].
//!
//! A value whose shape does not match its descriptor is treated as if the
//! ancestor declared nothing; one broken ancestor never blocks the rest of
//! the chain.

mod field;
mod merge;
mod scope;

pub use field::{FieldCatalog, FieldDescriptor, Identity, MergeStrategy, Shape};
pub use merge::reduce;
pub use scope::ancestor_sequence;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Error;
use crate::entity::parent_references;
use crate::snapshot::SnapshotSource;

/// How far up the ancestry a resolution looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum InheritanceMode {
    /// Only the entity's own declared value.
    LocalOnly,
    /// Always walk the full ancestor scope.
    InheritForced,
    /// Local-only when the entity has no parents, inherited otherwise.
    #[default]
    Auto,
}

impl fmt::Display for InheritanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalOnly => write!(f, "local-only"),
            Self::InheritForced => write!(f, "inherit-forced"),
            Self::Auto => write!(f, "auto"),
        }
    }
}

impl FromStr for InheritanceMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "local-only" | "local" => Ok(Self::LocalOnly),
            "inherit-forced" | "inherit" => Ok(Self::InheritForced),
            "auto" => Ok(Self::Auto),
            _ => Err(Error::InvalidMode { mode: s.to_string() }),
        }
    }
}

/// Collapse [`InheritanceMode::Auto`] into one of the two concrete modes.
pub fn effective_mode<S>(source: &S, name: &str, mode: InheritanceMode) -> InheritanceMode
where
    S: SnapshotSource + ?Sized,
{
    match mode {
        InheritanceMode::Auto => {
            let has_parents = source
                .declared(name)
                .is_some_and(|fields| !parent_references(name, fields).is_empty());
            if has_parents {
                InheritanceMode::InheritForced
            } else {
                InheritanceMode::LocalOnly
            }
        }
        concrete => concrete,
    }
}

/// Resolve `descriptor` on `name`.
pub fn resolve<S>(source: &S, name: &str, descriptor: &FieldDescriptor, mode: InheritanceMode) -> Value
where
    S: SnapshotSource + ?Sized,
{
    let sequence = match effective_mode(source, name, mode) {
        InheritanceMode::LocalOnly => vec![name.to_string()],
        _ => ancestor_sequence(source, name, descriptor.category),
    };
    tracing::trace!(entity = name, field = %descriptor.name, ?sequence, "Resolving field");
    reduce(descriptor, scope_values(source, &sequence, descriptor))
}

/// Present, well-shaped values of `descriptor` along `sequence`.
pub fn scope_values<S>(source: &S, sequence: &[String], descriptor: &FieldDescriptor) -> Vec<Value>
where
    S: SnapshotSource + ?Sized,
{
    sequence
        .iter()
        .filter_map(|member| {
            let value = source.declared(member)?.get(&descriptor.name)?;
            if value.is_null() {
                return None;
            }
            if !descriptor.shape.matches(value) {
                tracing::warn!(
                    entity = %member,
                    field = %descriptor.name,
                    expected = ?descriptor.shape,
                    "Ignoring value with unexpected shape"
                );
                return None;
            }
            Some(value.clone())
        })
        .collect()
}
