//! Canned parent graphs.
//!
//! Each fixture returns an in-memory [`Engine`] with the entities
//! registered but nothing committed.

use lineage_core::{Engine, Entity, ParentReference};
use serde_json::json;

/// Register `name` with the given parents.
pub fn add(engine: &Engine, name: &str, parents: &[&str]) {
    let mut entity = Entity::new(name).unwrap();
    for parent in parents {
        entity = entity.with_parent(ParentReference::new(*parent));
    }
    engine.upsert_entity(entity).unwrap();
}

/// Engine built from `(name, parents)` pairs.
pub fn engine_from(edges: &[(&str, &[&str])]) -> Engine {
    let engine = Engine::in_memory();
    for (name, parents) in edges {
        add(&engine, name, parents);
    }
    engine
}

/// `base <- mid <- leaf` with `steps` declared on base (`s1`) and mid (`s2`).
pub fn chain() -> Engine {
    let engine = Engine::in_memory();
    engine
        .upsert_entity(Entity::new("base").unwrap().with_field("steps", json!(["s1"])))
        .unwrap();
    engine
        .upsert_entity(
            Entity::new("mid")
                .unwrap()
                .with_parent(ParentReference::new("base"))
                .with_field("steps", json!(["s2"])),
        )
        .unwrap();
    engine
        .upsert_entity(Entity::new("leaf").unwrap().with_parent(ParentReference::new("mid")))
        .unwrap();
    engine
}

/// `a -> b -> d` and `a -> c -> d`.
pub fn diamond() -> Engine {
    engine_from(&[("a", &["b", "c"]), ("b", &["d"]), ("c", &["d"]), ("d", &[])])
}

/// `a -> b -> a`.
pub fn cycle() -> Engine {
    engine_from(&[("a", &["b"]), ("b", &["a"])])
}

/// `a -> b -> c`.
pub fn tree() -> Engine {
    engine_from(&[("a", &["b"]), ("b", &["c"]), ("c", &[])])
}
