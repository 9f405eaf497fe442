use lineage_core::{Engine, InheritanceMode};
use lineage_test_utils::TestWorkspace;
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn open_loads_definitions_and_config() {
    let ws = TestWorkspace::new().with_chain();
    ws.write_config("[resolve]\ndefault_mode = \"local-only\"\n");

    let engine = Engine::open(ws.root()).unwrap();

    assert_eq!(engine.entity_names(), vec!["base", "leaf", "mid"]);
    assert_eq!(engine.config().resolve.default_mode, InheritanceMode::LocalOnly);
    assert_eq!(engine.resolve_default("mid", "steps").unwrap(), json!(["s2"]));
    assert_eq!(
        engine.resolve("leaf", "steps", InheritanceMode::Auto).unwrap(),
        json!(["s1", "s2"])
    );
}

#[test]
fn committed_versions_are_picked_up_on_reopen() {
    let ws = TestWorkspace::new().with_chain();
    {
        let engine = Engine::open(ws.root()).unwrap();
        engine.commit_version("base", "ann", "first").unwrap();
    }
    ws.assert_file_exists(".lineage/versions/base.toml");

    // The definition changes on disk but the committed version still wins.
    ws.write_definition("base.toml", "name = \"base\"\n\n[fields]\nsteps = [\"edited\"]\n");
    let engine = Engine::open(ws.root()).unwrap();

    assert_eq!(engine.latest("base").unwrap().unwrap().description(), "first");
    assert_eq!(
        engine.resolve("leaf", "steps", InheritanceMode::Auto).unwrap(),
        json!(["s1", "s2"])
    );
    assert_eq!(engine.entity("base").unwrap().field("steps"), Some(&json!(["edited"])));
}

#[test]
fn invalid_config_is_an_error() {
    let ws = TestWorkspace::new();
    ws.write_config("[resolve\n");
    assert!(Engine::open(ws.root()).is_err());
}
