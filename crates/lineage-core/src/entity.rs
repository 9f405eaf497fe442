//! Entities and their locally declared fields

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::reference::{CompatibleReference, ParentReference};
use crate::{Error, Result};

/// Locally declared field values, keyed by field name.
pub type FieldMap = BTreeMap<String, Value>;

/// Well-known field names.
pub mod fields {
    pub const PARENT_REFERENCES: &str = "parent_references";
    pub const COMPATIBLE_REFERENCES: &str = "compatible_references";
    pub const PARAMETERS: &str = "parameters";
    pub const STEPS: &str = "steps";
    pub const WRAPPERS: &str = "wrappers";
    pub const PUBLISHERS: &str = "publishers";
    pub const ACTIONS: &str = "actions";
    pub const TRIGGERS: &str = "triggers";
    pub const PROPERTIES: &str = "properties";
    pub const SCM: &str = "scm";
    pub const ASSIGNED_LABEL: &str = "assigned_label";
    pub const CONCURRENT_BUILD: &str = "concurrent_build";
    pub const BLOCK_WHEN_UPSTREAM_BUILDING: &str = "block_when_upstream_building";
    pub const BLOCK_WHEN_DOWNSTREAM_BUILDING: &str = "block_when_downstream_building";
    pub const QUIET_PERIOD: &str = "quiet_period";
    pub const SCM_CHECKOUT_RETRY_COUNT: &str = "scm_checkout_retry_count";
    pub const CUSTOM_WORKSPACE: &str = "custom_workspace";
    pub const PARAMETERIZED_WORKSPACE: &str = "parameterized_workspace";
    pub const SCM_CHECKOUT_STRATEGY: &str = "scm_checkout_strategy";

    /// Fields holding references to other entities by name.
    pub const REFERENCE_FIELDS: [&str; 2] = [PARENT_REFERENCES, COMPATIBLE_REFERENCES];
}

/// Check that `name` can identify an entity.
///
/// Folder-qualified names (`team/build`) are allowed.
pub fn validate_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name.trim() != name {
        Some("name has leading or trailing whitespace")
    } else if name.chars().any(char::is_control) {
        Some("name contains control characters")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(Error::InvalidName {
            name: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// A configurable job definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    name: String,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default, rename = "transient")]
    pub is_transient: bool,
    #[serde(default)]
    fields: FieldMap,
}

impl Entity {
    /// Create an empty, concrete entity.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            is_abstract: false,
            is_transient: false,
            fields: FieldMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Replace the whole declared field map.
    pub fn set_fields(&mut self, fields: FieldMap) {
        self.fields = fields;
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    pub fn remove_field(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    pub(crate) fn fields_mut(&mut self) -> &mut FieldMap {
        &mut self.fields
    }

    /// Declared parent references, in declaration order.
    pub fn parents(&self) -> Vec<ParentReference> {
        parent_references(&self.name, &self.fields)
    }

    /// Declared compatible references, in declaration order.
    pub fn compatibles(&self) -> Vec<CompatibleReference> {
        compatible_references(&self.name, &self.fields)
    }

    pub fn set_parents(&mut self, parents: &[ParentReference]) {
        set_list(&mut self.fields, crate::fields::PARENT_REFERENCES, parents);
    }

    pub fn set_compatibles(&mut self, compatibles: &[CompatibleReference]) {
        set_list(&mut self.fields, crate::fields::COMPATIBLE_REFERENCES, compatibles);
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.set_field(name, value);
        self
    }

    pub fn with_parent(mut self, parent: ParentReference) -> Self {
        let mut parents = self.parents();
        parents.push(parent);
        self.set_parents(&parents);
        self
    }

    pub fn with_compatible(mut self, compatible: CompatibleReference) -> Self {
        let mut compatibles = self.compatibles();
        compatibles.push(compatible);
        self.set_compatibles(&compatibles);
        self
    }

    pub fn abstract_template(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub(crate) fn transient(mut self) -> Self {
        self.is_transient = true;
        self
    }
}

/// Decode the parent references held in a field map.
///
/// An undecodable list is treated as empty.
pub fn parent_references(owner: &str, fields: &FieldMap) -> Vec<ParentReference> {
    decode_list(owner, fields, crate::fields::PARENT_REFERENCES)
}

/// Decode the compatible references held in a field map.
pub fn compatible_references(owner: &str, fields: &FieldMap) -> Vec<CompatibleReference> {
    decode_list(owner, fields, crate::fields::COMPATIBLE_REFERENCES)
}

fn decode_list<T: DeserializeOwned>(owner: &str, fields: &FieldMap, field: &str) -> Vec<T> {
    match fields.get(field) {
        None | Some(Value::Null) => Vec::new(),
        Some(value) => match serde_json::from_value(value.clone()) {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!(entity = owner, field, error = %e, "Ignoring undecodable reference list");
                Vec::new()
            }
        },
    }
}

fn set_list<T: Serialize>(fields: &mut FieldMap, field: &str, items: &[T]) {
    if items.is_empty() {
        fields.remove(field);
        return;
    }
    match serde_json::to_value(items) {
        Ok(value) => {
            fields.insert(field.to_string(), value);
        }
        Err(e) => tracing::error!(field, error = %e, "Failed to encode reference list"),
    }
}
