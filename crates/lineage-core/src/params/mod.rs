//! Parameter declarations along the ancestor scope
//!
//! Entities declare parameters in the `parameters` field as a list of
//! [`ParameterDeclaration`]s. Declarations from every ancestor are folded
//! by name, most distant first: [`effective_parameters`] computes what a
//! build would see, [`check_sanity`] verifies the chain is consistent.

mod sanity;

pub use sanity::{SanityReport, check_sanity};

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fields;
use crate::governor::ancestor_sequence;
use crate::reference::Category;
use crate::snapshot::SnapshotSource;

/// Kind of value a parameter carries.
///
/// `password` and `text` specialise `string`; the rest stand alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParameterShape {
    #[default]
    String,
    Password,
    Text,
    Boolean,
    Choice,
    File,
}

impl ParameterShape {
    fn generalisation(self) -> Option<Self> {
        match self {
            Self::Password | Self::Text => Some(Self::String),
            Self::String | Self::Boolean | Self::Choice | Self::File => None,
        }
    }

    fn specialises(self, other: Self) -> bool {
        let mut current = Some(self);
        while let Some(shape) = current {
            if shape == other {
                return true;
            }
            current = shape.generalisation();
        }
        false
    }

    /// Whether a value of one shape can stand in for the other in at least
    /// one direction.
    pub fn is_assignable_with(self, other: Self) -> bool {
        self.specialises(other) || other.specialises(self)
    }
}

/// How later declarations of the same parameter may redefine it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RedefinitionMode {
    /// A redeclaration replaces the default, even with none.
    #[default]
    Overwritable,
    /// A redeclaration without a default keeps the earlier one.
    Extensible,
    /// No redeclaration allowed.
    Fixed,
}

impl fmt::Display for RedefinitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overwritable => write!(f, "overwritable"),
            Self::Extensible => write!(f, "extensible"),
            Self::Fixed => write!(f, "fixed"),
        }
    }
}

/// One declaration of a build parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDeclaration {
    pub name: String,
    #[serde(default)]
    pub shape: ParameterShape,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default)]
    pub must_have_default: bool,
    #[serde(default)]
    pub must_be_assigned: bool,
    #[serde(default)]
    pub mode: RedefinitionMode,
    /// Refers to a parameter declared elsewhere without redefining it.
    #[serde(default)]
    pub reference: bool,
}

impl ParameterDeclaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shape: ParameterShape::String,
            default: None,
            must_have_default: false,
            must_be_assigned: false,
            mode: RedefinitionMode::Overwritable,
            reference: false,
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_shape(mut self, shape: ParameterShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_mode(mut self, mode: RedefinitionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn requiring_default(mut self) -> Self {
        self.must_have_default = true;
        self
    }

    pub fn requiring_assignment(mut self) -> Self {
        self.must_be_assigned = true;
        self
    }

    pub fn as_reference(mut self) -> Self {
        self.reference = true;
        self
    }

    /// Whether a non-empty default is supplied.
    pub fn has_default(&self) -> bool {
        self.default.as_deref().is_some_and(|d| !d.is_empty())
    }

    fn flags(&self) -> String {
        let mut flags = vec![self.mode.to_string()];
        if self.must_have_default {
            flags.push("must have default".to_string());
        }
        if self.must_be_assigned {
            flags.push("must be assigned".to_string());
        }
        if self.reference {
            flags.push("reference".to_string());
        }
        flags.join(", ")
    }
}

/// A declaration together with the entity that made it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopedDeclaration {
    pub owner: String,
    pub declaration: ParameterDeclaration,
}

/// One row of a parameter derivation table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterDerivation {
    pub parameter: String,
    pub owner: String,
    pub detail: String,
    pub default: Option<String>,
}

/// Decode the parameter declarations in `value`, skipping bad entries.
pub fn decode_declarations(owner: &str, value: &Value) -> Vec<ParameterDeclaration> {
    let Value::Array(items) = value else {
        tracing::warn!(entity = owner, "Parameters field is not a list");
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match serde_json::from_value(item.clone()) {
            Ok(declaration) => Some(declaration),
            Err(e) => {
                tracing::warn!(entity = owner, error = %e, "Skipping undecodable parameter declaration");
                None
            }
        })
        .collect()
}

/// Every parameter declaration along the scope of `name`, most distant
/// first.
pub fn parameter_scope<S>(source: &S, name: &str) -> Vec<ScopedDeclaration>
where
    S: SnapshotSource + ?Sized,
{
    ancestor_sequence(source, name, Category::Parameters)
        .into_iter()
        .flat_map(|owner| {
            let declarations = source
                .declared(&owner)
                .and_then(|fields| fields.get(fields::PARAMETERS))
                .filter(|value| !value.is_null())
                .map(|value| decode_declarations(&owner, value))
                .unwrap_or_default();
            declarations.into_iter().map(move |declaration| ScopedDeclaration {
                owner: owner.clone(),
                declaration,
            })
        })
        .collect()
}

/// The declarations a build of `name` sees, in first-declaration order.
///
/// Later declarations replace earlier ones, except that an extensible
/// parameter keeps its earlier default when redeclared without one.
pub fn effective_parameters(scope: &[ScopedDeclaration]) -> Vec<ParameterDeclaration> {
    let mut order: Vec<String> = Vec::new();
    let mut folded: BTreeMap<String, ParameterDeclaration> = BTreeMap::new();

    for ScopedDeclaration { declaration, .. } in scope {
        match folded.get_mut(&declaration.name) {
            None => {
                order.push(declaration.name.clone());
                folded.insert(declaration.name.clone(), declaration.clone());
            }
            Some(current) => {
                let kept_default = (current.mode == RedefinitionMode::Extensible
                    && !declaration.has_default())
                .then(|| current.default.clone())
                .flatten();
                *current = declaration.clone();
                if kept_default.is_some() {
                    current.default = kept_default;
                }
            }
        }
    }

    order
        .into_iter()
        .filter_map(|name| folded.remove(&name))
        .collect()
}

/// Where each parameter declaration along the scope comes from.
pub fn parameter_derivation(scope: &[ScopedDeclaration]) -> Vec<ParameterDerivation> {
    scope
        .iter()
        .map(|entry| ParameterDerivation {
            parameter: entry.declaration.name.clone(),
            owner: entry.owner.clone(),
            detail: entry.declaration.flags(),
            default: entry.declaration.default.clone(),
        })
        .collect()
}
