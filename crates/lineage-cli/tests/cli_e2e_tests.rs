//! End-to-end tests that run the compiled `lineage` binary against
//! temporary workspaces.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use lineage_test_utils::TestWorkspace;

fn lineage_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_lineage"))
}

fn run(root: &Path, args: &[&str]) -> Output {
    Command::new(lineage_bin())
        .arg("--root")
        .arg(root)
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("LINEAGE_ROOT")
        .env("NO_COLOR", "1")
        .output()
        .expect("failed to execute lineage binary")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn help_lists_commands() {
    let out = Command::new(lineage_bin()).arg("--help").output().unwrap();
    assert!(out.status.success());
    let help = stdout(&out);
    for command in ["resolve", "relations", "check", "versions", "commit", "rename"] {
        assert!(help.contains(command), "help should mention {command}:\n{help}");
    }
}

#[test]
fn resolve_concatenates_inherited_steps() {
    let ws = TestWorkspace::new().with_chain();
    let out = run(ws.root(), &["resolve", "leaf", "steps", "--json"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let value: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(value, serde_json::json!(["s1", "s2"]));
}

#[test]
fn resolve_local_only_ignores_parents() {
    let ws = TestWorkspace::new().with_chain();
    let out = run(ws.root(), &["resolve", "mid", "steps", "--mode", "local-only"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out).trim(), "- s2");
}

#[test]
fn unknown_entity_fails() {
    let ws = TestWorkspace::new().with_chain();
    let out = run(ws.root(), &["resolve", "ghost", "steps"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("ghost"));
}

#[test]
fn relations_as_json() {
    let ws = TestWorkspace::new().with_chain();
    let out = run(ws.root(), &["relations", "mid", "--json"]);
    assert!(out.status.success());

    let value: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(value["base"]["kind"], "parent");
    assert_eq!(value["leaf"]["kind"], "child");
    assert_eq!(value["leaf"]["is_leaf"], true);
}

#[test]
fn check_reports_missing_parents() {
    let ws = TestWorkspace::new();
    ws.write_definition("job.toml", "name = \"job\"\n\n[[parents]]\nname = \"ghost\"\n");

    let out = run(ws.root(), &["check", "job"]);
    assert!(!out.status.success());
    assert!(stdout(&out).contains("job -> ghost"));
    assert!(stderr(&out).contains("not buildable"));
}

#[test]
fn commit_then_list_versions() {
    let ws = TestWorkspace::new().with_chain();

    let out = run(ws.root(), &["commit", "base", "-m", "first", "--author", "ann"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).contains("version 1"));

    let again = run(ws.root(), &["commit", "base"]);
    assert!(stdout(&again).contains("No changes"));

    let out = run(ws.root(), &["versions", "base"]);
    let listing = stdout(&out);
    assert!(listing.contains("first"));
    assert!(listing.contains("ann"));
    ws.assert_file_exists(".lineage/versions/base.toml");
}

#[test]
fn stable_flag_round_trip() {
    let ws = TestWorkspace::new().with_chain();
    assert!(run(ws.root(), &["commit", "base"]).status.success());

    let out = run(ws.root(), &["stable", "base", "1"]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("now stable"));

    let out = run(ws.root(), &["stable", "base", "1", "--unset"]);
    assert!(stdout(&out).contains("now unstable"));

    let out = run(ws.root(), &["stable", "base", "9"]);
    assert!(!out.status.success());
}

#[test]
fn rename_moves_definition_and_rewrites_children() {
    let ws = TestWorkspace::new().with_chain();
    assert!(run(ws.root(), &["commit", "base"]).status.success());

    let out = run(ws.root(), &["rename", "base", "root"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    ws.assert_file_not_exists("jobs/base.toml");
    ws.assert_file_exists("jobs/root.toml");
    ws.assert_file_exists(".lineage/versions/root.toml");
    assert!(ws.read("jobs/mid.toml").contains("\"root\""));

    let out = run(ws.root(), &["resolve", "leaf", "steps", "--json"]);
    let value: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(value, serde_json::json!(["s1", "s2"]));
}

#[test]
fn variants_show_parameter_overrides() {
    let ws = TestWorkspace::new();
    ws.write_definition(
        "build.toml",
        "name = \"build\"\n\n[[compatibles]]\nname = \"linux\"\nparameters = { ARCH = \"arm64\" }\n",
    );
    ws.write_definition("linux.toml", "name = \"linux\"\n");

    let out = run(ws.root(), &["variants", "build"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let listing = stdout(&out);
    assert!(listing.contains("build_linux"));
    assert!(listing.contains("ARCH = arm64"));
}

#[test]
fn configured_definitions_directory() {
    let ws = TestWorkspace::new();
    ws.write_config("[store]\ndefinitions = \"defs\"\n");
    std::fs::create_dir_all(ws.root().join("defs")).unwrap();
    std::fs::write(ws.root().join("defs/solo.toml"), "name = \"solo\"\n").unwrap();

    let out = run(ws.root(), &["check", "solo"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
}
