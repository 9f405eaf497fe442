use lineage_core::{
    BlockReason, BuildStatus, CompatibleReference, Engine, Entity, ParameterDeclaration,
    ParentReference, RedefinitionMode,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn with_parameters(entity: Entity, declarations: Vec<ParameterDeclaration>) -> Entity {
    entity.with_field("parameters", serde_json::to_value(declarations).unwrap())
}

fn engine_with(entities: Vec<Entity>) -> Engine {
    let engine = Engine::in_memory();
    for entity in entities {
        engine.upsert_entity(entity).unwrap();
    }
    engine
}

#[test]
fn redeclaring_with_a_default_satisfies_the_requirement() {
    let engine = engine_with(vec![
        with_parameters(
            Entity::new("base").unwrap(),
            vec![ParameterDeclaration::new("P").requiring_default()],
        ),
        with_parameters(
            Entity::new("mid").unwrap().with_parent(ParentReference::new("base")),
            vec![ParameterDeclaration::new("P").requiring_default().with_default("1")],
        ),
    ]);

    assert!(engine.is_sane("mid").unwrap().sane);

    let base = engine.is_sane("base").unwrap();
    assert!(!base.sane);
    assert_eq!(base.message, "Parameters must have a default value: 'P'");
    assert_eq!(
        engine.build_status("base").unwrap(),
        BuildStatus::Blocked(BlockReason::ParameterInconsistency(base.message))
    );
}

#[test]
fn abstract_entities_may_lack_defaults() {
    let engine = engine_with(vec![with_parameters(
        Entity::new("template").unwrap().abstract_template(),
        vec![
            ParameterDeclaration::new("B").requiring_default(),
            ParameterDeclaration::new("A").requiring_default(),
        ],
    )]);

    assert!(engine.is_sane("template").unwrap().sane);
}

#[test]
fn every_lacking_parameter_is_listed() {
    let engine = engine_with(vec![with_parameters(
        Entity::new("job").unwrap(),
        vec![
            ParameterDeclaration::new("B").requiring_default(),
            ParameterDeclaration::new("A").requiring_default(),
            ParameterDeclaration::new("C").with_default("x"),
        ],
    )]);

    assert_eq!(
        engine.is_sane("job").unwrap().message,
        "Parameters must have a default value: 'A', 'B'"
    );
}

#[test]
fn fixed_parameters_cannot_be_redeclared() {
    let engine = engine_with(vec![
        with_parameters(
            Entity::new("base").unwrap(),
            vec![ParameterDeclaration::new("P").with_default("1").with_mode(RedefinitionMode::Fixed)],
        ),
        with_parameters(
            Entity::new("leaf").unwrap().with_parent(ParentReference::new("base")),
            vec![ParameterDeclaration::new("P").with_default("2")],
        ),
    ]);

    let report = engine.is_sane("leaf").unwrap();
    assert!(!report.sane);
    assert!(report.message.contains("'P'"));
    assert!(engine.is_sane("base").unwrap().sane);
}

#[test]
fn sanity_follows_parent_edits() {
    let engine = engine_with(vec![
        with_parameters(
            Entity::new("strict").unwrap().abstract_template(),
            vec![ParameterDeclaration::new("P").requiring_default()],
        ),
        Entity::new("job").unwrap(),
    ]);
    assert!(engine.is_sane("job").unwrap().sane);

    engine
        .add_parent_reference("job", ParentReference::new("strict"), "ann")
        .unwrap();

    assert!(!engine.is_sane("job").unwrap().sane);
}

#[test]
fn effective_parameters_fold_the_scope() {
    let engine = engine_with(vec![
        with_parameters(
            Entity::new("base").unwrap(),
            vec![
                ParameterDeclaration::new("ARCH")
                    .with_default("x86")
                    .with_mode(RedefinitionMode::Extensible),
                ParameterDeclaration::new("MODE").with_default("debug"),
            ],
        ),
        with_parameters(
            Entity::new("leaf").unwrap().with_parent(ParentReference::new("base")),
            vec![
                ParameterDeclaration::new("ARCH"),
                ParameterDeclaration::new("MODE").with_default("release"),
            ],
        ),
    ]);

    let effective: Vec<(String, Option<String>)> = engine
        .effective_parameters("leaf")
        .unwrap()
        .into_iter()
        .map(|p| (p.name, p.default))
        .collect();
    assert_eq!(
        effective,
        vec![
            ("ARCH".to_string(), Some("x86".to_string())),
            ("MODE".to_string(), Some("release".to_string())),
        ]
    );

    let owners: Vec<(String, String)> = engine
        .parameter_derivation("leaf")
        .unwrap()
        .into_iter()
        .map(|row| (row.parameter, row.owner))
        .collect();
    assert_eq!(
        owners,
        vec![
            ("ARCH".to_string(), "base".to_string()),
            ("MODE".to_string(), "base".to_string()),
            ("ARCH".to_string(), "leaf".to_string()),
            ("MODE".to_string(), "leaf".to_string()),
        ]
    );
}

#[test]
fn variants_override_parameter_defaults() {
    let engine = engine_with(vec![
        with_parameters(
            Entity::new("build").unwrap(),
            vec![ParameterDeclaration::new("ARCH").with_default("x86")],
        )
        .with_compatible(CompatibleReference::new("linux").with_parameter("ARCH", "arm64")),
        Entity::new("linux")
            .unwrap()
            .with_field("assigned_label", json!("linux")),
    ]);

    let variants = engine.generate_transients("build").unwrap();
    assert_eq!(variants, vec!["build_linux".to_string()]);

    let effective = engine.effective_parameters("build_linux").unwrap();
    assert_eq!(effective.len(), 1);
    assert_eq!(effective[0].default.as_deref(), Some("arm64"));
    assert_eq!(
        engine.resolve_default("build_linux", "assigned_label").unwrap(),
        json!("linux")
    );
    assert!(engine.is_sane("build_linux").unwrap().sane);
}
