// CLI integration tests for the resolve/modules/probe flows.
use std::fs;
use std::process::Command;

use serde_json::Value;

fn cmd() -> Command {
    let exe = env!("CARGO_BIN_EXE_gamelink");
    Command::new(exe)
}

// Tracing lines share stderr with the error document, so pick the first
// line that is a JSON object.
fn parse_json(output: &[u8]) -> Value {
    let text = String::from_utf8_lossy(output);
    let line = text
        .lines()
        .find(|line| line.starts_with('{'))
        .expect("json line");
    serde_json::from_str(line).expect("valid json")
}

#[test]
fn modules_lists_the_builtin_catalogue() {
    let output = cmd().arg("modules").output().expect("modules");
    assert!(output.status.success());
    let json = parse_json(&output.stdout);
    let modules = json.get("modules").and_then(Value::as_array).expect("array");
    assert!(modules.len() > 50);
    assert!(modules.iter().any(|entry| {
        entry.get("identifier").and_then(Value::as_str) == Some("cstrike")
            && entry.get("linux").and_then(Value::as_str) == Some("cs.so")
    }));
}

#[test]
fn modules_filters_by_identifier() {
    let output = cmd()
        .args(["modules", "wormshl"])
        .output()
        .expect("modules");
    assert!(output.status.success());
    let json = parse_json(&output.stdout);
    let modules = json.get("modules").and_then(Value::as_array).expect("array");
    assert_eq!(modules.len(), 2);
    for entry in modules {
        assert_eq!(
            entry.get("identifier").and_then(Value::as_str),
            Some("wormshl")
        );
    }
}

#[test]
fn resolve_reports_the_artifact_as_json() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::create_dir(temp.path().join("artifacts")).expect("mkdir");
    fs::write(temp.path().join("artifacts/hl.so"), b"lib").expect("seed");

    let output = cmd()
        .args(["--workdir", temp.path().to_str().unwrap(), "resolve", "valve"])
        .output()
        .expect("resolve");
    assert!(output.status.success());
    let json = parse_json(&output.stdout);
    let module = json.get("module").expect("module");
    assert_eq!(
        module.get("identifier").and_then(Value::as_str),
        Some("valve")
    );
    assert_eq!(
        module.get("description").and_then(Value::as_str),
        Some("Half-Life Deathmatch")
    );
    assert!(
        module
            .get("artifact")
            .and_then(Value::as_str)
            .unwrap()
            .ends_with("hl.so")
    );
}

#[test]
fn resolve_honors_the_config_override() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::create_dir(temp.path().join("artifacts")).expect("mkdir");
    fs::write(temp.path().join("artifacts/hl.so"), b"lib").expect("seed");
    fs::write(temp.path().join("artifacts/custom.so"), b"custom").expect("seed");
    fs::write(
        temp.path().join("gamelink.json"),
        r#"{"override": "artifacts/custom.so"}"#,
    )
    .expect("config");

    let output = cmd()
        .args(["--workdir", temp.path().to_str().unwrap(), "resolve", "valve"])
        .output()
        .expect("resolve");
    assert!(output.status.success());
    let json = parse_json(&output.stdout);
    let module = json.get("module").expect("module");
    assert_eq!(
        module.get("source").and_then(Value::as_str),
        Some("override")
    );
    assert!(
        module
            .get("canonical")
            .and_then(Value::as_str)
            .unwrap()
            .ends_with("hl.so")
    );
}

#[test]
fn resolve_override_flag_beats_the_config_document() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::create_dir(temp.path().join("artifacts")).expect("mkdir");
    fs::write(temp.path().join("artifacts/hl.so"), b"lib").expect("seed");
    fs::write(temp.path().join("artifacts/from-config.so"), b"a").expect("seed");
    fs::write(temp.path().join("artifacts/from-flag.so"), b"b").expect("seed");
    fs::write(
        temp.path().join("gamelink.json"),
        r#"{"override": "artifacts/from-config.so"}"#,
    )
    .expect("config");

    let output = cmd()
        .args([
            "--workdir",
            temp.path().to_str().unwrap(),
            "resolve",
            "valve",
            "--override",
            "artifacts/from-flag.so",
        ])
        .output()
        .expect("resolve");
    assert!(output.status.success());
    let json = parse_json(&output.stdout);
    let module = json.get("module").expect("module");
    assert!(
        module
            .get("artifact")
            .and_then(Value::as_str)
            .unwrap()
            .ends_with("from-flag.so")
    );
}

#[test]
fn resolve_failure_is_json_on_stderr_with_a_stable_exit_code() {
    let temp = tempfile::tempdir().expect("tempdir");

    let output = cmd()
        .args([
            "--workdir",
            temp.path().to_str().unwrap(),
            "resolve",
            "no-such-module",
        ])
        .output()
        .expect("resolve");
    assert_eq!(output.status.code(), Some(3));
    let json = parse_json(&output.stderr);
    let error = json.get("error").expect("error");
    assert_eq!(error.get("kind").and_then(Value::as_str), Some("NotFound"));
}

#[test]
fn probe_of_an_unloadable_artifact_fails_with_load_kind() {
    let temp = tempfile::tempdir().expect("tempdir");
    let bogus = temp.path().join("not-a-library.so");
    fs::write(&bogus, b"plain bytes").expect("seed");

    let output = cmd()
        .args(["probe", bogus.to_str().unwrap()])
        .output()
        .expect("probe");
    assert_eq!(output.status.code(), Some(6));
    let json = parse_json(&output.stderr);
    let error = json.get("error").expect("error");
    assert_eq!(error.get("kind").and_then(Value::as_str), Some("Load"));
}

#[test]
fn malformed_config_is_a_usage_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("gamelink.json"), "{not json").expect("config");

    let output = cmd()
        .args(["--workdir", temp.path().to_str().unwrap(), "resolve", "valve"])
        .output()
        .expect("resolve");
    assert_eq!(output.status.code(), Some(2));
    let json = parse_json(&output.stderr);
    let error = json.get("error").expect("error");
    assert_eq!(error.get("kind").and_then(Value::as_str), Some("Usage"));
}
