//! Parameter sanity checking

use std::collections::BTreeMap;

use serde::Serialize;

use super::{ParameterShape, RedefinitionMode, ScopedDeclaration};

/// Outcome of a sanity check. An insane entity is not executable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SanityReport {
    pub sane: bool,
    pub message: String,
}

impl SanityReport {
    pub fn ok() -> Self {
        Self {
            sane: true,
            message: String::new(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            sane: false,
            message: message.into(),
        }
    }
}

struct Restrictions {
    shape: ParameterShape,
    must_have_default: bool,
    must_be_assigned: bool,
    had_default: bool,
    mode: RedefinitionMode,
}

/// Fold the parameter scope of an entity and verify that every
/// redeclaration respects what came before it.
///
/// Stops at the first illegal redeclaration. For concrete entities,
/// every parameter that must have a default but never received one is
/// reported together.
pub fn check_sanity(scope: &[ScopedDeclaration], is_abstract: bool) -> SanityReport {
    let mut restrictions: BTreeMap<&str, Restrictions> = BTreeMap::new();

    for ScopedDeclaration { owner, declaration } in scope {
        let name = declaration.name.as_str();
        let Some(tracked) = restrictions.get_mut(name) else {
            restrictions.insert(
                name,
                Restrictions {
                    shape: declaration.shape,
                    must_have_default: declaration.must_have_default,
                    must_be_assigned: declaration.must_be_assigned,
                    had_default: declaration.has_default(),
                    mode: declaration.mode,
                },
            );
            continue;
        };

        if !tracked.shape.is_assignable_with(declaration.shape) {
            return SanityReport::fail(format!(
                "Parameter '{name}' redefined in '{owner}' with incompatible type"
            ));
        }
        if tracked.mode == RedefinitionMode::Fixed {
            return SanityReport::fail(format!(
                "Fixed parameter '{name}' may not be redefined (in '{owner}')"
            ));
        }

        match tracked.mode {
            RedefinitionMode::Overwritable => tracked.had_default = declaration.has_default(),
            RedefinitionMode::Extensible => tracked.had_default |= declaration.has_default(),
            RedefinitionMode::Fixed => {}
        }

        // References never change or violate flags.
        if declaration.reference {
            continue;
        }
        if tracked.must_have_default && !declaration.must_have_default {
            return SanityReport::fail(format!(
                "Parameter '{name}' may not unset the flag that ensures a default value is set (in '{owner}')"
            ));
        }
        if tracked.must_be_assigned && !declaration.must_be_assigned {
            return SanityReport::fail(format!(
                "Parameter '{name}' may not unset the flag that ensures a final value is assigned before execution (in '{owner}')"
            ));
        }
        tracked.mode = declaration.mode;
        tracked.must_have_default = declaration.must_have_default;
        tracked.must_be_assigned = declaration.must_be_assigned;
    }

    if !is_abstract {
        let lacking: Vec<&str> = restrictions
            .iter()
            .filter(|(_, r)| r.must_have_default && !r.had_default)
            .map(|(name, _)| *name)
            .collect();
        if !lacking.is_empty() {
            return SanityReport::fail(format!(
                "Parameters must have a default value: '{}'",
                lacking.join("', '")
            ));
        }
    }

    SanityReport::ok()
}
