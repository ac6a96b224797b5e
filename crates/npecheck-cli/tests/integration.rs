#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../tests/fixtures")
        .join(name)
}

/// Run from an empty directory so no stray npecheck.toml is picked up.
fn npecheck(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("npecheck").unwrap();
    cmd.current_dir(dir.path());
    cmd
}

#[test]
fn test_version() {
    Command::cargo_bin("npecheck")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"npecheck \d+\.\d+\.\d+").unwrap());
}

#[test]
fn test_no_subcommand_shows_help() {
    Command::cargo_bin("npecheck")
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_check_reports_unguarded_parameter() {
    let dir = tempfile::tempdir().unwrap();
    npecheck(&dir)
        .args(["check", "--no-color"])
        .arg(fixture("param_deref.json"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "a/param_deref.go:6:14: warning [NPE001] potential nil pointer reference",
        ))
        .stdout(predicate::str::contains("Found 1 issue(s)"))
        .stdout(predicate::str::contains("param_deref.go:11:").not());
}

#[test]
fn test_check_human_with_source_root() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("a")).unwrap();
    std::fs::copy(
        fixture("param_deref.go"),
        dir.path().join("a").join("param_deref.go"),
    )
    .unwrap();
    npecheck(&dir)
        .args(["check", "--no-color", "--source-root"])
        .arg(dir.path())
        .arg(fixture("param_deref.json"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("NPE001"))
        .stdout(predicate::str::contains("in function `PrintField`"))
        .stdout(predicate::str::contains("fmt.Println(p.Field)"));
}

#[test]
fn test_check_json_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = npecheck(&dir)
        .args(["check", "--format", "json"])
        .arg(fixture("param_deref.json"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let diags: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let diags = diags.as_array().unwrap();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0]["rule"], "NPE001");
    assert_eq!(diags[0]["message"], "potential nil pointer reference");
    assert_eq!(diags[0]["location"]["file"], "a/param_deref.go");
    assert_eq!(diags[0]["location"]["line"], 6);
    assert_eq!(diags[0]["location"]["column"], 14);
    assert_eq!(diags[0]["function"], "PrintField");
}

#[test]
fn test_check_sarif_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = npecheck(&dir)
        .args(["check", "--format", "sarif"])
        .arg(fixture("param_deref.json"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let sarif: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(sarif["version"], "2.1.0");
    assert_eq!(sarif["runs"][0]["tool"]["driver"]["name"], "npecheck");
    assert_eq!(sarif["runs"][0]["results"][0]["ruleId"], "NPE001");
}

#[test]
fn test_check_clean_with_ignored_function() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("npecheck.toml"),
        "[rules.npe]\nignore_functions = [\"Print*\"]\n",
    )
    .unwrap();
    npecheck(&dir)
        .args(["check", "--no-color"])
        .arg(fixture("param_deref.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("No issues found"));
}

#[test]
fn test_check_explicit_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("custom.toml");
    std::fs::write(&config, "[rules.npe]\nenabled = false\n").unwrap();
    npecheck(&dir)
        .args(["check", "--config"])
        .arg(&config)
        .arg(fixture("param_deref.json"))
        .assert()
        .success();
}

#[test]
fn test_check_invalid_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("npecheck.toml"), "[npecheck\n").unwrap();
    npecheck(&dir)
        .arg("check")
        .arg(fixture("param_deref.json"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid config"));
}

#[test]
fn test_check_missing_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    npecheck(&dir)
        .args(["check", "does-not-exist.json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("does-not-exist.json"));
}

#[test]
fn test_check_invalid_json_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bridge.json");
    std::fs::write(&input, "{ not json").unwrap();
    npecheck(&dir)
        .arg("check")
        .arg(&input)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid bridge JSON"));
}

#[test]
fn test_check_unknown_format_fails() {
    let dir = tempfile::tempdir().unwrap();
    npecheck(&dir)
        .args(["check", "--format", "markdown"])
        .arg(fixture("param_deref.json"))
        .assert()
        .code(2);
}

#[test]
fn test_explain_npe001() {
    Command::cargo_bin("npecheck")
        .unwrap()
        .args(["explain", "npe001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("NPE001: Potential nil pointer reference"))
        .stdout(predicate::str::contains("if u == nil"));
}

#[test]
fn test_explain_unknown_rule() {
    Command::cargo_bin("npecheck")
        .unwrap()
        .args(["explain", "FAKE999"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("NPE001"));
}

#[test]
fn test_init_creates_config() {
    let dir = tempfile::tempdir().unwrap();
    npecheck(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created npecheck.toml"));
    let content = std::fs::read_to_string(dir.path().join("npecheck.toml")).unwrap();
    assert!(content.contains("[rules.npe]"));
}

#[test]
fn test_init_fails_if_exists() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("npecheck.toml"), "").unwrap();
    npecheck(&dir).arg("init").assert().failure().code(2);
}
