//! Multi-parent configuration inheritance for job definitions
//!
//! This crate resolves the effective value of any field on any entity by
//! walking the entity's ordered ancestor scope and reducing the declared
//! values with a per-field merge strategy:
//!
//! - **Entity model**: entities with ordered parent references, compatible
//!   ("mate") references and free-form declared fields
//! - **Version logs**: append-only per-entity snapshots, optionally pinned
//!   per resolution, persisted through a [`VersionBackend`]
//! - **Connection graph**: parent, child and mate adjacency with a
//!   relationship explorer, cycle/diamond detection and missing-dependency
//!   reporting
//! - **Inheritance governor**: `LOCAL_ONLY` / `INHERIT_FORCED` / `AUTO`
//!   resolution driven by a [`FieldCatalog`]
//! - **Parameter sanity**: consistency of parameter declarations along the
//!   scope
//!
//! # Architecture
//!
//! ```text
//!                lineage-cli
//!                     |
//!                  Engine  (global reentrant write lock, epoch cache)
//!                     |
//!   +--------+--------+---------+--------+---------+
//!   |        |        |         |        |         |
//! store  version   graph   governor   params   variants
//!                     |
//!                 lineage-fs
//! ```
//!
//! # Example
//!
//! ```
//! use lineage_core::{Engine, Entity, InheritanceMode, ParentReference};
//! use serde_json::json;
//!
//! let engine = Engine::in_memory();
//! engine.upsert_entity(Entity::new("base")?.with_field("steps", json!(["checkout"])))?;
//! engine.upsert_entity(
//!     Entity::new("leaf")?
//!         .with_parent(ParentReference::new("base"))
//!         .with_field("steps", json!(["test"])),
//! )?;
//!
//! let steps = engine.resolve("leaf", "steps", InheritanceMode::InheritForced)?;
//! assert_eq!(steps, json!(["checkout", "test"]));
//! # Ok::<(), lineage_core::Error>(())
//! ```

pub mod cache;
pub mod config;
pub mod definition;
pub mod engine;
pub mod entity;
pub mod error;
pub mod governor;
pub mod graph;
pub mod params;
pub mod reference;
pub mod snapshot;
pub mod store;
pub mod variants;
pub mod version;

pub use config::{ConfigResolver, EngineConfig};
pub use definition::{
    EntityDefinition, definition_path, load_definition_files, load_definitions, save_definition,
};
pub use engine::{BlockReason, BuildStatus, Engine, InheritedVersion};
pub use entity::{Entity, FieldMap, fields, validate_name};
pub use error::{Error, Result};
pub use governor::{FieldCatalog, FieldDescriptor, Identity, InheritanceMode, MergeStrategy, Shape};
pub use graph::{ConnectionGraph, Dependency, GraphNode, RelationKind, Relationship};
pub use params::{
    ParameterDeclaration, ParameterDerivation, ParameterShape, RedefinitionMode, SanityReport,
};
pub use reference::{Category, CompatibleReference, ParentReference};
pub use snapshot::SnapshotSource;
pub use store::EntityStore;
pub use version::{FileBackend, MemoryBackend, Version, VersionBackend, VersionLog, VersionPins};
