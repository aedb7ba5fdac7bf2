use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join(path)
}

fn openapi2kong() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("openapi2kong"));
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn converts_to_stdout_and_reports_summary() {
    openapi2kong()
        .args(["convert", "--spec"])
        .arg(fixture("fixtures/petstore.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("_format_version:"))
        .stdout(predicate::str::contains("name: swagger-petstore_listpets"))
        .stderr(predicate::str::contains(
            "convert_summary services=1 routes=3 plugins=2 upstreams=1",
        ));
}

#[test]
fn writes_json_file_with_flags_applied() {
    let dir = tempdir().expect("tempdir");
    let out = dir.path().join("kong.json");

    openapi2kong()
        .args(["convert", "--spec"])
        .arg(fixture("fixtures/petstore.yaml"))
        .arg("--output-file")
        .arg(&out)
        .args(["--format", "json", "--select-tag", "a", "--select-tag", "b"])
        .arg("--validator")
        .assert()
        .success()
        .stderr(predicate::str::contains("plugins=5"));

    let written: serde_json::Value =
        serde_json::from_slice(&fs::read(&out).expect("read output")).expect("json output");
    assert_eq!(written["services"][0]["tags"], serde_json::json!(["a", "b"]));
    assert_eq!(written["plugins"][1]["name"], "request-validator");
}

#[test]
fn options_file_tags_come_before_flag_tags() {
    let dir = tempdir().expect("tempdir");
    let options = dir.path().join("options.toml");
    let out = dir.path().join("kong.yaml");
    fs::write(&options, "tags = [\"from-file\"]\ngenerate_validator = true\n")
        .expect("write options");

    openapi2kong()
        .args(["convert", "--quiet", "--spec"])
        .arg(fixture("fixtures/items.yaml"))
        .arg("--output-file")
        .arg(&out)
        .arg("--options-file")
        .arg(&options)
        .args(["--select-tag", "from-flag", "--format", "json"])
        .assert()
        .success()
        .stderr(predicate::str::contains("convert_summary").not());

    let written: serde_json::Value =
        serde_json::from_slice(&fs::read(&out).expect("read output")).expect("json output");
    assert_eq!(
        written["routes"][0]["tags"],
        serde_json::json!(["from-file", "from-flag"])
    );
}

#[test]
fn reads_spec_from_stdin() {
    openapi2kong()
        .args(["convert", "--spec", "-", "--format", "json"])
        .write_stdin(fs::read(fixture("fixtures/items.yaml")).expect("fixture"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"host\": \"api.example.com\""));
}

#[test]
fn refuses_to_overwrite_spec() {
    let dir = tempdir().expect("tempdir");
    let spec = dir.path().join("spec.yaml");
    fs::copy(fixture("fixtures/items.yaml"), &spec).expect("copy fixture");

    openapi2kong()
        .args(["convert", "--spec"])
        .arg(&spec)
        .arg("--output-file")
        .arg(&spec)
        .assert()
        .failure()
        .stderr(predicate::str::contains("refusing to overwrite"));

    assert_eq!(
        fs::read(&spec).expect("spec still there"),
        fs::read(fixture("fixtures/items.yaml")).expect("fixture")
    );
}

#[test]
fn unresolved_path_parameter_fails_without_output() {
    let dir = tempdir().expect("tempdir");
    let spec = dir.path().join("spec.yaml");
    let out = dir.path().join("kong.yaml");
    fs::write(&spec, "openapi: 3.0.0\npaths:\n  /pets/{id}:\n    get: {}\n").expect("write spec");

    openapi2kong()
        .args(["convert", "--spec"])
        .arg(&spec)
        .arg("--output-file")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("path parameter 'id' is not declared"));

    assert!(!out.exists());
}

#[test]
fn verbose_logging_goes_to_stderr() {
    openapi2kong()
        .args(["--verbose", "1", "convert", "--spec"])
        .arg(fixture("fixtures/items.yaml"))
        .assert()
        .success()
        .stderr(predicate::str::contains("converted"))
        .stdout(predicate::str::contains("converted").not());
}
