//! End-to-end tests for the `openapi-to-rego` binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const PETSTORE: &str = r#"{
  "openapi": "3.0.0",
  "paths": {
    "/pets/{petId}": {
      "get": {
        "security": [{"petstore_auth": ["read:pets"]}],
        "x-security-rego-field-filter": [{"petstore_auth": ["owner"]}]
      }
    }
  }
}"#;

const UNSECURED_FIELD_FILTER: &str = r#"
openapi: "3.0.0"
paths:
  /pets/{petId}:
    get:
      x-security-rego-field-filter:
        - petstore_auth: [owner]
"#;

fn run_in(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_openapi-to-rego"))
        .args(args)
        .current_dir(dir)
        .env_remove("OPENAPI_TO_REGO_PACKAGE")
        .env_remove("OPENAPI_TO_REGO_OUTPUT")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run openapi-to-rego")
}

#[test]
fn test_writes_default_output_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("petstore.json"), PETSTORE).unwrap();

    let output = run_in(dir.path(), &["petstore.json"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let policy = fs::read_to_string(dir.path().join("policy.rego")).unwrap();
    assert!(policy.starts_with("package httpapi.authz\n"));
    assert!(policy.contains("filter = [\"owner\"] if {"));
    assert!(policy.contains("\ttoken.payload.scopes[\"read:pets\"]\n"));
}

#[test]
fn test_custom_package_and_output() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("petstore.json"), PETSTORE).unwrap();

    let output = run_in(
        dir.path(),
        &["petstore.json", "-p", "petstore.authz", "-o", "petstore.rego"],
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let policy = fs::read_to_string(dir.path().join("petstore.rego")).unwrap();
    assert!(policy.starts_with("package petstore.authz\n"));
    assert!(!dir.path().join("policy.rego").exists());
}

#[test]
fn test_package_from_environment() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("petstore.json"), PETSTORE).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_openapi-to-rego"))
        .arg("petstore.json")
        .current_dir(dir.path())
        .env("OPENAPI_TO_REGO_PACKAGE", "env.authz")
        .env_remove("OPENAPI_TO_REGO_OUTPUT")
        .output()
        .unwrap();
    assert!(output.status.success());

    let policy = fs::read_to_string(dir.path().join("policy.rego")).unwrap();
    assert!(policy.starts_with("package env.authz\n"));
}

#[test]
fn test_missing_spec_argument_fails() {
    let dir = TempDir::new().unwrap();

    let output = run_in(dir.path(), &[]);
    assert!(!output.status.success());
}

#[test]
fn test_missing_spec_file_fails() {
    let dir = TempDir::new().unwrap();

    let output = run_in(dir.path(), &["nope.yaml"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("nope.yaml"));
    assert!(!dir.path().join("policy.rego").exists());
}

#[test]
fn test_generation_error_writes_nothing() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("api.yaml"), UNSECURED_FIELD_FILTER).unwrap();

    let output = run_in(dir.path(), &["api.yaml"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing Security Requirement Object"), "stderr: {stderr}");
    assert!(!dir.path().join("policy.rego").exists());
}

#[test]
fn test_verify_flag() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("petstore.json"), PETSTORE).unwrap();

    let output = run_in(dir.path(), &["petstore.json", "--verify"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(dir.path().join("policy.rego").exists());
}
