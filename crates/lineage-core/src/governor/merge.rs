//! Reduction of ordered field values

use serde_json::Value;

use super::field::{FieldDescriptor, Identity, MergeStrategy};

/// Combine the values declared along a scope, most distant first.
///
/// `values` must already be filtered to present, well-shaped entries.
pub fn reduce(descriptor: &FieldDescriptor, values: Vec<Value>) -> Value {
    if values.is_empty() {
        return empty_result(descriptor);
    }

    match &descriptor.strategy {
        MergeStrategy::Override => values.into_iter().last().unwrap_or(Value::Null),
        MergeStrategy::ConcatAll => Value::Array(values.into_iter().flat_map(into_items).collect()),
        MergeStrategy::ConcatDedup { identity } => {
            let mut merged: Vec<Value> = Vec::new();
            for item in values.into_iter().flat_map(into_items) {
                if !merged.iter().any(|kept| same_identity(identity, kept, &item)) {
                    merged.push(item);
                }
            }
            Value::Array(merged)
        }
        MergeStrategy::BoolOr => Value::Bool(values.iter().any(|v| v.as_bool() == Some(true))),
        MergeStrategy::LabelAnd => label_and(&values),
        MergeStrategy::FirstNonDefault { sentinel } => values
            .into_iter()
            .rev()
            .find(|v| v != sentinel)
            .unwrap_or_else(|| sentinel.clone()),
    }
}

/// Result of a reduction over nothing.
fn empty_result(descriptor: &FieldDescriptor) -> Value {
    if let Some(default) = &descriptor.default {
        return default.clone();
    }
    match &descriptor.strategy {
        MergeStrategy::ConcatAll | MergeStrategy::ConcatDedup { .. } => Value::Array(Vec::new()),
        MergeStrategy::BoolOr => Value::Bool(false),
        MergeStrategy::FirstNonDefault { sentinel } => sentinel.clone(),
        MergeStrategy::Override | MergeStrategy::LabelAnd => Value::Null,
    }
}

fn into_items(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}

fn same_identity(identity: &Identity, a: &Value, b: &Value) -> bool {
    match identity {
        Identity::Whole => a == b,
        Identity::Key(key) => match (a.get(key), b.get(key)) {
            (Some(ka), Some(kb)) => ka == kb,
            _ => a == b,
        },
    }
}

fn label_and(values: &[Value]) -> Value {
    let terms: Vec<&str> = values
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .collect();

    match terms.as_slice() {
        [] => Value::Null,
        [single] => Value::String((*single).to_string()),
        many => {
            let joined: Vec<String> = many
                .iter()
                .map(|term| {
                    if is_simple_label(term) {
                        (*term).to_string()
                    } else {
                        format!("({term})")
                    }
                })
                .collect();
            Value::String(joined.join("&&"))
        }
    }
}

/// A bare label atom needs no parentheses inside a conjunction.
fn is_simple_label(term: &str) -> bool {
    !term
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '&' | '|' | '!' | '(' | ')' | '-' | '<' | '>'))
}
