//! Field descriptors and the field catalog

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::fields;
use crate::reference::Category;

/// Expected JSON shape of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Any,
    Bool,
    Integer,
    String,
    List,
    Object,
}

impl Shape {
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::Any => true,
            Self::Bool => value.is_boolean(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::String => value.is_string(),
            Self::List => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

/// What makes two list elements duplicates under [`MergeStrategy::ConcatDedup`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Identity {
    /// Elements are equal as values.
    Whole,
    /// Elements are equal when this member is; elements lacking it compare whole.
    Key(String),
}

/// How the ordered values of one field along the ancestor scope combine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Last value wins.
    Override,
    /// Concatenate, dropping later duplicates.
    ConcatDedup { identity: Identity },
    /// Concatenate as-is.
    ConcatAll,
    /// True if any value is true.
    BoolOr,
    /// Join label expressions with `&&`.
    LabelAnd,
    /// Most specific value that differs from the sentinel.
    FirstNonDefault { sentinel: Value },
}

/// Everything the governor needs to know about one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    /// Category whose parent priorities order the scope.
    pub category: Category,
    pub strategy: MergeStrategy,
    pub shape: Shape,
    /// Result when no ancestor declares a usable value.
    pub default: Option<Value>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, strategy: MergeStrategy) -> Self {
        let shape = match &strategy {
            MergeStrategy::ConcatDedup { .. } | MergeStrategy::ConcatAll => Shape::List,
            MergeStrategy::BoolOr => Shape::Bool,
            MergeStrategy::LabelAnd => Shape::String,
            MergeStrategy::Override | MergeStrategy::FirstNonDefault { .. } => Shape::Any,
        };
        Self {
            name: name.into(),
            category: Category::Misc,
            strategy,
            shape,
            default: None,
        }
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// Field name to descriptor lookup.
#[derive(Debug, Clone, Default)]
pub struct FieldCatalog {
    descriptors: BTreeMap<String, FieldDescriptor>,
}

impl FieldCatalog {
    /// An empty catalog: every field resolves as an untyped override.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Catalog of the built-in job fields.
    pub fn builtin() -> Self {
        use MergeStrategy::*;

        let dedup = || ConcatDedup {
            identity: Identity::Whole,
        };
        let mut catalog = Self::empty();
        catalog
            .register(FieldDescriptor::new(fields::PARENT_REFERENCES, ConcatAll))
            .register(FieldDescriptor::new(fields::COMPATIBLE_REFERENCES, Override).shape(Shape::List))
            .register(FieldDescriptor::new(fields::STEPS, dedup()).category(Category::Steps))
            .register(FieldDescriptor::new(fields::WRAPPERS, dedup()).category(Category::Steps))
            .register(FieldDescriptor::new(fields::PUBLISHERS, dedup()).category(Category::Steps))
            .register(FieldDescriptor::new(fields::ACTIONS, dedup()))
            .register(FieldDescriptor::new(fields::TRIGGERS, ConcatAll))
            .register(
                FieldDescriptor::new(
                    fields::PROPERTIES,
                    ConcatDedup {
                        identity: Identity::Key("kind".to_string()),
                    },
                )
                .category(Category::Properties),
            )
            .register(FieldDescriptor::new(fields::PARAMETERS, ConcatAll).category(Category::Parameters))
            .register(FieldDescriptor::new(
                fields::SCM,
                FirstNonDefault {
                    sentinel: Value::String("none".to_string()),
                },
            ))
            .register(FieldDescriptor::new(fields::ASSIGNED_LABEL, LabelAnd))
            .register(FieldDescriptor::new(fields::CONCURRENT_BUILD, BoolOr).default_value(Value::Bool(false)))
            .register(
                FieldDescriptor::new(fields::BLOCK_WHEN_UPSTREAM_BUILDING, Override)
                    .shape(Shape::Bool)
                    .default_value(Value::Bool(false)),
            )
            .register(
                FieldDescriptor::new(fields::BLOCK_WHEN_DOWNSTREAM_BUILDING, Override)
                    .shape(Shape::Bool)
                    .default_value(Value::Bool(false)),
            )
            .register(FieldDescriptor::new(fields::QUIET_PERIOD, Override).shape(Shape::Integer))
            .register(FieldDescriptor::new(fields::SCM_CHECKOUT_RETRY_COUNT, Override).shape(Shape::Integer))
            .register(FieldDescriptor::new(fields::CUSTOM_WORKSPACE, Override).shape(Shape::String))
            .register(FieldDescriptor::new(fields::PARAMETERIZED_WORKSPACE, Override).shape(Shape::String))
            .register(FieldDescriptor::new(fields::SCM_CHECKOUT_STRATEGY, Override));
        catalog
    }

    /// Add or replace a descriptor.
    pub fn register(&mut self, descriptor: FieldDescriptor) -> &mut Self {
        self.descriptors.insert(descriptor.name.clone(), descriptor);
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldDescriptor> {
        self.descriptors.get(field)
    }

    /// Descriptor for `field`, or an untyped override for unknown names.
    pub fn descriptor(&self, field: &str) -> FieldDescriptor {
        self.get(field)
            .cloned()
            .unwrap_or_else(|| FieldDescriptor::new(field, MergeStrategy::Override))
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.descriptors.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(Shape::Any, json!(null), true)]
    #[case(Shape::Bool, json!(true), true)]
    #[case(Shape::Bool, json!("true"), false)]
    #[case(Shape::Integer, json!(5), true)]
    #[case(Shape::Integer, json!(5.5), false)]
    #[case(Shape::String, json!("x"), true)]
    #[case(Shape::List, json!({"a": 1}), false)]
    #[case(Shape::Object, json!({"a": 1}), true)]
    fn shape_matching(#[case] shape: Shape, #[case] value: Value, #[case] expected: bool) {
        assert_eq!(shape.matches(&value), expected);
    }

    #[test]
    fn unknown_fields_fall_back_to_override() {
        let catalog = FieldCatalog::builtin();
        let descriptor = catalog.descriptor("custom_thing");
        assert_eq!(descriptor.strategy, MergeStrategy::Override);
        assert_eq!(descriptor.shape, Shape::Any);
    }

    #[test]
    fn builtin_steps_use_the_steps_category() {
        let catalog = FieldCatalog::builtin();
        let steps = catalog.get("steps").unwrap();
        assert_eq!(steps.category, Category::Steps);
        assert_eq!(steps.shape, Shape::List);
        assert!(matches!(steps.strategy, MergeStrategy::ConcatDedup { .. }));
    }
}
