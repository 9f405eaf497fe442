//! Version logs, persistence and rename

use lineage_core::{
    CompatibleReference, Engine, EngineConfig, Entity, FieldMap, FileBackend, InheritanceMode,
    MemoryBackend, ParentReference, VersionBackend, VersionPins,
};
use lineage_test_utils::TestWorkspace;
use pretty_assertions::assert_eq;
use serde_json::json;

fn file_engine(ws: &TestWorkspace) -> Engine {
    Engine::new(EngineConfig::default(), FileBackend::new(ws.versions_dir()))
}

#[test]
fn identical_version_leaves_the_log_unchanged() {
    let engine = Engine::in_memory();
    engine
        .upsert_entity(Entity::new("job").unwrap().with_field("steps", json!(["a"])))
        .unwrap();
    engine.commit_version("job", "ann", "first").unwrap();
    let before = engine.all_versions("job").unwrap();

    assert!(engine.commit_version("job", "bob", "again").unwrap().is_none());
    assert_eq!(engine.all_versions("job").unwrap(), before);
}

#[test]
fn versions_survive_reopening() {
    let ws = TestWorkspace::new();
    {
        let engine = file_engine(&ws);
        engine
            .upsert_entity(Entity::new("team/job").unwrap().with_field("steps", json!(["a", null])))
            .unwrap();
        engine.commit_version("team/job", "ann", "first").unwrap();
        let mut job = engine.entity("team/job").unwrap();
        job.set_field("steps", json!(["b"]));
        engine.upsert_entity(job).unwrap();
        engine.commit_version("team/job", "ann", "second").unwrap();
        engine.set_version_stability("team/job", 1, true).unwrap();
    }
    ws.assert_file_exists(".lineage/versions/team%2Fjob.toml");

    let engine = file_engine(&ws);
    engine.upsert_entity(Entity::new("team/job").unwrap()).unwrap();
    let versions = engine.all_versions("team/job").unwrap();
    assert_eq!(versions.len(), 2);
    assert!(versions[0].is_stable());
    assert_eq!(versions[1].description(), "second");
    assert_eq!(
        engine
            .resolve("team/job", "steps", InheritanceMode::LocalOnly)
            .unwrap(),
        json!(["a", null])
    );
}

#[test]
fn rename_rewrites_every_stored_reference() {
    let ws = TestWorkspace::new();
    let engine = file_engine(&ws);
    engine
        .upsert_entity(Entity::new("x").unwrap().with_field("steps", json!(["x"])))
        .unwrap();
    engine.commit_version("x", "ann", "").unwrap();

    engine
        .upsert_entity(
            Entity::new("child")
                .unwrap()
                .with_parent(ParentReference::new("x"))
                .with_field("description", json!("inherits from x")),
        )
        .unwrap();
    engine.commit_version("child", "ann", "v1").unwrap();
    engine
        .add_parent_reference("child", ParentReference::new("other_parent"), "ann")
        .unwrap();

    engine
        .upsert_entity(
            Entity::new("peer")
                .unwrap()
                .with_compatible(CompatibleReference::new("x").with_variance("v")),
        )
        .unwrap();
    engine.commit_version("peer", "ann", "").unwrap();

    let child_before = engine.all_versions("child").unwrap();
    engine.rename("x", "y").unwrap();
    let child_after = engine.all_versions("child").unwrap();

    assert_eq!(child_after.len(), child_before.len());
    for (before, after) in child_before.iter().zip(&child_after) {
        let mut expected: FieldMap = before.fields().clone();
        let refs = expected.get_mut("parent_references").unwrap();
        for reference in refs.as_array_mut().unwrap() {
            if reference["name"] == json!("x") {
                reference["name"] = json!("y");
            }
        }
        assert_eq!(after.fields(), &expected);
        assert_eq!(after.fields()["description"], json!("inherits from x"));
        assert_eq!(after.id(), before.id());
    }
    assert_eq!(
        engine.latest("peer").unwrap().unwrap().fields()["compatible_references"],
        json!([{"name": "y", "variance": "v"}])
    );
    assert_eq!(engine.all_versions("y").unwrap().len(), 1);

    // Persisted logs carry the rewrite as well.
    let backend = FileBackend::new(ws.versions_dir());
    assert!(backend.load("x").unwrap().is_empty());
    assert_eq!(backend.load("y").unwrap().len(), 1);
    let stored_child = backend.load("child").unwrap();
    assert!(
        stored_child
            .iter()
            .all(|v| !v.fields()["parent_references"].to_string().contains("\"x\""))
    );

    assert_eq!(
        engine
            .resolve("child", "steps", InheritanceMode::Auto)
            .unwrap(),
        json!(["x"])
    );
}

#[test]
fn pins_are_threaded_per_resolution() {
    let engine = Engine::new(EngineConfig::default(), MemoryBackend::new());
    engine
        .upsert_entity(Entity::new("base").unwrap().with_field("quiet_period", json!(1)))
        .unwrap();
    engine.commit_version("base", "ann", "").unwrap();
    let mut base = engine.entity("base").unwrap();
    base.set_field("quiet_period", json!(2));
    engine.upsert_entity(base).unwrap();
    engine.commit_version("base", "ann", "").unwrap();
    engine
        .upsert_entity(Entity::new("job").unwrap().with_parent(ParentReference::new("base")))
        .unwrap();

    let pins: VersionPins = "base=1".parse().unwrap();
    let mode = InheritanceMode::Auto;
    assert_eq!(engine.resolve_pinned("job", "quiet_period", mode, &pins).unwrap(), json!(1));
    assert_eq!(engine.resolve("job", "quiet_period", mode).unwrap(), json!(2));

    let inherited = engine.inherited_versions("job", &pins).unwrap();
    assert_eq!(inherited[0].entity, "base");
    assert_eq!(inherited[0].selected, Some(1));
    assert_eq!(inherited[0].versions, vec![1, 2]);
}

#[test]
fn persistence_failure_keeps_memory_authoritative() {
    struct Failing;
    impl VersionBackend for Failing {
        fn load(&self, _: &str) -> lineage_core::Result<Vec<lineage_core::Version>> {
            Ok(Vec::new())
        }
        fn append(&self, entity: &str, _: &lineage_core::Version) -> lineage_core::Result<()> {
            Err(lineage_core::Error::Persistence {
                entity: entity.to_string(),
                message: "disk full".into(),
            })
        }
        fn update_metadata(&self, _: &str, _: &lineage_core::Version) -> lineage_core::Result<()> {
            Ok(())
        }
        fn replace_all(&self, _: &str, _: &[lineage_core::Version]) -> lineage_core::Result<()> {
            Ok(())
        }
        fn rename(&self, _: &str, _: &str) -> lineage_core::Result<()> {
            Ok(())
        }
        fn remove(&self, _: &str) -> lineage_core::Result<()> {
            Ok(())
        }
    }

    let engine = Engine::new(EngineConfig::default(), Failing);
    engine
        .upsert_entity(Entity::new("job").unwrap().with_field("a", json!(1)))
        .unwrap();
    let created = engine.commit_version("job", "ann", "").unwrap();
    assert!(created.is_some());
    assert_eq!(engine.all_versions("job").unwrap().len(), 1);
}
