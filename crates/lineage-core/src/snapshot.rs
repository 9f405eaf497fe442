//! Read access to declared fields under a version selection

use std::collections::{BTreeMap, HashMap};

use crate::entity::FieldMap;

/// Supplies each entity's locally declared fields as currently selected
/// (live state, latest stable version, or a pinned version).
pub trait SnapshotSource {
    /// Declared fields of `name`, or `None` when no such entity exists.
    fn declared(&self, name: &str) -> Option<&FieldMap>;

    fn exists(&self, name: &str) -> bool {
        self.declared(name).is_some()
    }
}

impl SnapshotSource for BTreeMap<String, FieldMap> {
    fn declared(&self, name: &str) -> Option<&FieldMap> {
        self.get(name)
    }
}

impl SnapshotSource for HashMap<String, FieldMap> {
    fn declared(&self, name: &str) -> Option<&FieldMap> {
        self.get(name)
    }
}
