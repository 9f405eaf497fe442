//! Field resolution across the ancestor scope

use lineage_core::{
    Category, Engine, Entity, FieldCatalog, FieldDescriptor, InheritanceMode, MergeStrategy,
    ParentReference, Shape,
};
use lineage_test_utils::graphs;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

#[test]
fn steps_are_concatenated_down_the_chain() {
    let engine = graphs::chain();
    assert_eq!(
        engine
            .resolve("leaf", "steps", InheritanceMode::InheritForced)
            .unwrap(),
        json!(["s1", "s2"])
    );
}

#[rstest]
#[case(InheritanceMode::LocalOnly, json!([]))]
#[case(InheritanceMode::InheritForced, json!(["s1", "s2"]))]
#[case(InheritanceMode::Auto, json!(["s1", "s2"]))]
fn mode_controls_the_scope(#[case] mode: InheritanceMode, #[case] expected: serde_json::Value) {
    let engine = graphs::chain();
    assert_eq!(engine.resolve("leaf", "steps", mode).unwrap(), expected);
}

#[test]
fn duplicate_steps_are_dropped_after_first_occurrence() {
    let engine = graphs::chain();
    let mut leaf = engine.entity("leaf").unwrap();
    leaf.set_field("steps", json!(["s2", "s3", "s1"]));
    engine.upsert_entity(leaf).unwrap();

    assert_eq!(
        engine.resolve("leaf", "steps", InheritanceMode::Auto).unwrap(),
        json!(["s1", "s2", "s3"])
    );
}

#[test]
fn scm_takes_the_most_specific_non_default() {
    let engine = graphs::chain();
    let mut base = engine.entity("base").unwrap();
    base.set_field("scm", json!({"git": "https://example.com/base.git"}));
    engine.upsert_entity(base).unwrap();
    let mut mid = engine.entity("mid").unwrap();
    mid.set_field("scm", json!("none"));
    engine.upsert_entity(mid).unwrap();

    assert_eq!(
        engine.resolve("leaf", "scm", InheritanceMode::Auto).unwrap(),
        json!({"git": "https://example.com/base.git"})
    );
    assert_eq!(
        engine.resolve("mid", "scm", InheritanceMode::LocalOnly).unwrap(),
        json!("none")
    );
}

#[test]
fn labels_combine_with_and() {
    let engine = graphs::chain();
    for (name, label) in [("base", "linux"), ("leaf", "x64 || arm64")] {
        let mut entity = engine.entity(name).unwrap();
        entity.set_field("assigned_label", json!(label));
        engine.upsert_entity(entity).unwrap();
    }
    assert_eq!(
        engine
            .resolve("leaf", "assigned_label", InheritanceMode::Auto)
            .unwrap(),
        json!("linux&&(x64 || arm64)")
    );
}

#[test]
fn concurrent_build_is_or_of_the_chain() {
    let engine = graphs::chain();
    assert_eq!(
        engine
            .resolve("leaf", "concurrent_build", InheritanceMode::Auto)
            .unwrap(),
        json!(false)
    );

    let mut base = engine.entity("base").unwrap();
    base.set_field("concurrent_build", json!(true));
    engine.upsert_entity(base).unwrap();
    assert_eq!(
        engine
            .resolve("leaf", "concurrent_build", InheritanceMode::Auto)
            .unwrap(),
        json!(true)
    );
}

#[test]
fn broken_ancestor_value_does_not_block_resolution() {
    let engine = graphs::chain();
    let mut mid = engine.entity("mid").unwrap();
    mid.set_field("quiet_period", json!("soon"));
    engine.upsert_entity(mid).unwrap();
    let mut base = engine.entity("base").unwrap();
    base.set_field("quiet_period", json!(30));
    engine.upsert_entity(base).unwrap();

    assert_eq!(
        engine
            .resolve("leaf", "quiet_period", InheritanceMode::Auto)
            .unwrap(),
        json!(30)
    );
}

#[test]
fn high_priority_parent_overrides_the_child() {
    let engine = Engine::in_memory();
    engine
        .upsert_entity(Entity::new("policy").unwrap().with_field("quiet_period", json!(60)))
        .unwrap();
    engine
        .upsert_entity(
            Entity::new("job")
                .unwrap()
                .with_parent(ParentReference::new("policy").with_priority(Category::Misc, 1))
                .with_field("quiet_period", json!(5)),
        )
        .unwrap();

    assert_eq!(
        engine.ancestor_sequence("job", Category::Misc).unwrap(),
        vec!["job", "policy"]
    );
    assert_eq!(
        engine.resolve("job", "quiet_period", InheritanceMode::Auto).unwrap(),
        json!(60)
    );
}

#[test]
fn cyclic_ancestry_still_resolves() {
    let engine = graphs::cycle();
    let mut a = engine.entity("a").unwrap();
    a.set_field("steps", json!(["a"]));
    engine.upsert_entity(a).unwrap();
    let mut b = engine.entity("b").unwrap();
    b.set_field("steps", json!(["b"]));
    engine.upsert_entity(b).unwrap();

    assert_eq!(
        engine.resolve("a", "steps", InheritanceMode::InheritForced).unwrap(),
        json!(["b", "a"])
    );
}

#[test]
fn custom_catalog_changes_strategies() {
    let mut catalog = FieldCatalog::builtin();
    catalog.register(
        FieldDescriptor::new(
            "env",
            MergeStrategy::ConcatDedup {
                identity: lineage_core::Identity::Key("name".into()),
            },
        )
        .shape(Shape::List),
    );
    let engine = Engine::in_memory().with_catalog(catalog);
    engine
        .upsert_entity(
            Entity::new("base")
                .unwrap()
                .with_field("env", json!([{"name": "A", "value": "1"}])),
        )
        .unwrap();
    engine
        .upsert_entity(
            Entity::new("job")
                .unwrap()
                .with_parent(ParentReference::new("base"))
                .with_field("env", json!([{"name": "A", "value": "2"}, {"name": "B"}])),
        )
        .unwrap();

    assert_eq!(
        engine.resolve("job", "env", InheritanceMode::Auto).unwrap(),
        json!([{"name": "A", "value": "1"}, {"name": "B"}])
    );
}

#[test]
fn unknown_entity_is_an_error() {
    let engine = graphs::chain();
    assert!(engine.resolve("ghost", "steps", InheritanceMode::Auto).is_err());
}

#[test]
fn cached_results_follow_ancestor_changes() {
    let engine = graphs::chain();
    let mode = InheritanceMode::Auto;
    assert_eq!(engine.resolve("leaf", "steps", mode).unwrap(), json!(["s1", "s2"]));

    let mut base = engine.entity("base").unwrap();
    base.set_field("steps", json!(["s0"]));
    engine.upsert_entity(base).unwrap();
    assert_eq!(engine.resolve("leaf", "steps", mode).unwrap(), json!(["s0", "s2"]));

    // Cutting the edge must expire the leaf's cached value too.
    assert!(engine.remove_parent_reference("mid", "base", "ann").unwrap());
    assert_eq!(engine.resolve("leaf", "steps", mode).unwrap(), json!(["s2"]));
}
