//! Entity store: every known entity by unique name

use std::collections::HashMap;

use crate::entity::Entity;
use crate::{Error, Result};

/// Holds all registered entities, looked up by name.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    entities: HashMap<String, Entity>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Entity> {
        self.entities.get_mut(name)
    }

    /// Like [`EntityStore::get`], but an absent entity is an error.
    pub fn require(&self, name: &str) -> Result<&Entity> {
        self.get(name).ok_or_else(|| Error::unknown(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    /// Insert or replace an entity, returning the previous one.
    pub fn upsert(&mut self, entity: Entity) -> Option<Entity> {
        self.entities.insert(entity.name().to_string(), entity)
    }

    pub fn remove(&mut self, name: &str) -> Option<Entity> {
        self.entities.remove(name)
    }

    /// All entity names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entities.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
