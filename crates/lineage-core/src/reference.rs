//! Parent and compatible references
//!
//! References point at other entities by name. A reference whose target is
//! not registered is a missing dependency: it is skipped during resolution
//! and reported by [`crate::graph::missing_dependencies`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordering category a field belongs to.
///
/// Parent references may carry a different priority per category, so the
/// ancestor order used for build steps can differ from the one used for
/// parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Misc,
    Steps,
    Parameters,
    Properties,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Misc => write!(f, "misc"),
            Self::Steps => write!(f, "steps"),
            Self::Parameters => write!(f, "parameters"),
            Self::Properties => write!(f, "properties"),
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "misc" => Ok(Self::Misc),
            "steps" => Ok(Self::Steps),
            "parameters" => Ok(Self::Parameters),
            "properties" => Ok(Self::Properties),
            other => Err(format!("unknown category '{other}'")),
        }
    }
}

/// A reference to a parent entity.
///
/// Priorities order siblings per [`Category`]: lower values are applied
/// first. Parents with a priority above zero are applied after the
/// referencing entity itself and therefore override its local values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentReference {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub priorities: BTreeMap<Category, i32>,
}

impl ParentReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priorities: BTreeMap::new(),
        }
    }

    /// Set the priority for one category.
    pub fn with_priority(mut self, category: Category, priority: i32) -> Self {
        self.priorities.insert(category, priority);
        self
    }

    /// Priority for `category`, zero when unset.
    pub fn priority(&self, category: Category) -> i32 {
        self.priorities.get(&category).copied().unwrap_or(0)
    }
}

/// A compatible ("mate") reference used to generate transient variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibleReference {
    pub name: String,
    /// Distinguishes several variants generated from the same pair.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variance: Option<String>,
    /// Parameter defaults the generated variant overrides.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
}

impl CompatibleReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variance: None,
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_variance(mut self, variance: impl Into<String>) -> Self {
        self.variance = Some(variance.into());
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }
}

/// Rewrite every `{"name": old}` element of a reference list in place.
///
/// Works on the raw stored value so that references can be renamed even in
/// snapshots whose other members no longer decode. Returns whether anything
/// changed.
pub(crate) fn rename_in_list(list: &mut Value, old: &str, new: &str) -> bool {
    let Value::Array(items) = list else {
        return false;
    };
    let mut changed = false;
    for item in items.iter_mut() {
        if let Some(name) = item.get_mut("name") {
            if name.as_str() == Some(old) {
                *name = Value::String(new.to_string());
                changed = true;
            }
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn priority_defaults_to_zero() {
        let reference = ParentReference::new("base").with_priority(Category::Steps, 3);
        assert_eq!(reference.priority(Category::Steps), 3);
        assert_eq!(reference.priority(Category::Parameters), 0);
    }

    #[test]
    fn parent_reference_serializes_compactly() {
        let value = serde_json::to_value(ParentReference::new("base")).unwrap();
        assert_eq!(value, json!({"name": "base"}));
    }

    #[test]
    fn rename_in_list_only_touches_matching_names() {
        let mut list = json!([{"name": "x"}, {"name": "y", "priorities": {"steps": 1}}, "garbage"]);
        assert!(rename_in_list(&mut list, "y", "z"));
        assert_eq!(
            list,
            json!([{"name": "x"}, {"name": "z", "priorities": {"steps": 1}}, "garbage"])
        );
        assert!(!rename_in_list(&mut list, "absent", "q"));
    }
}
