use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;

#[test]
fn test_help_lists_options() {
    Command::cargo_bin("sdk-codegen")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--versions"))
        .stdout(predicate::str::contains("--no-streams"))
        .stdout(predicate::str::contains("[LANGUAGES]"));
}

#[test]
fn test_missing_versions_file_fails() {
    let dir = TempDir::new().unwrap();
    Command::cargo_bin("sdk-codegen")
        .unwrap()
        .current_dir(dir.path())
        .args(["typescript", "-v", "missing.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read versions file"));
}

#[test]
fn test_generates_typescript_from_local_schema() {
    let dir = TempDir::new().unwrap();
    let schema = dir.path().join("api.json");
    std::fs::write(
        &schema,
        json!({
            "openapi": "3.0.0",
            "info": {"title": "Test API", "version": "4.0"},
            "paths": {"/user": {"get": {"tags": ["User"], "operationId": "me", "responses": {}}}},
            "components": {"schemas": {"User": {"properties": {"id": {"type": "integer"}}}}}
        })
        .to_string(),
    )
    .unwrap();
    std::fs::write(
        dir.path().join("versions.json"),
        json!({
            "looker_release_version": "21.18.0",
            "supported_versions": [{"version": "4.0", "swagger_url": format!("file://{}", schema.display())}]
        })
        .to_string(),
    )
    .unwrap();

    Command::cargo_bin("sdk-codegen")
        .unwrap()
        .current_dir(dir.path())
        .env_remove("LOOKERSDK_API_VERSIONS")
        .env_remove("LOOKERSDK_API_VERSION")
        .args(["typescript", "-v", "versions.json", "-o", "out", "--no-streams"])
        .assert()
        .success();

    assert!(dir.path().join("spec/Looker.4.0.oas.json").exists());
    assert!(dir.path().join("out/typescript/sdk/src/40/methods.ts").exists());
    assert!(!dir.path().join("out/typescript/sdk/src/40/streams.ts").exists());
}
