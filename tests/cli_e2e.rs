//! End-to-end CLI tests for the patchget binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Without parameters the binary prints usage and exits with code 0.
#[test]
fn test_binary_without_parameters_prints_usage() {
    let mut cmd = Command::cargo_bin("patchget").unwrap();
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("At least one parameter"))
        .stdout(predicate::str::contains("USAGE: patchget patch="));
}

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    let mut cmd = Command::cargo_bin("patchget").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Download patch archives"))
        .stdout(predicate::str::contains("download=all"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    let mut cmd = Command::cargo_bin("patchget").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("patchget"));
}

/// Test that invalid flags cause non-zero exit.
#[test]
fn test_binary_invalid_flag_returns_error() {
    let mut cmd = Command::cargo_bin("patchget").unwrap();
    cmd.arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

/// Parameters without a patch or reset need no portal at all.
#[test]
fn test_binary_without_patch_reports_and_succeeds() {
    let mut cmd = Command::cargo_bin("patchget").unwrap();
    cmd.args(["-q", "regexp=.*", "bogus"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No patch numbers are specified."));
}

/// An invalid filename pattern is fatal before any request is made.
#[test]
fn test_binary_invalid_regexp_fails() {
    let mut cmd = Command::cargo_bin("patchget").unwrap();
    cmd.args(["--portal-url", "http://127.0.0.1:9", "patch=1", "regexp=(open"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid filename pattern"));
}

async fn mount_portal(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/Orion/SimpleSearch/switch_to_saved_searches"))
        .and(header("authorization", "Basic ZGJhOnB3"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>home</html>"))
        .with_priority(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Orion/SimpleSearch/switch_to_saved_searches"))
        .respond_with(ResponseTemplate::new(401))
        .with_priority(2)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Orion/SavedSearches/switch_to_simple"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<select name=plat_lang>\n<option value=\"226P\">Linux x86-64\n<option value=\"46P\">Linux x86\n</select>",
        ))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Orion/SimpleSearch/process_form"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>none</html>"))
        .mount(server)
        .await;
}

/// Full run against a mock portal: platform prompt answered on stdin, catalog
/// cached, nothing to download.
#[tokio::test(flavor = "multi_thread")]
async fn test_binary_run_against_mock_portal() {
    let server = MockServer::start().await;
    mount_portal(&server).await;
    let temp_dir = TempDir::new().unwrap();
    let catalog_file = temp_dir.path().join("platforms.cfg");

    let mut cmd = Command::cargo_bin("patchget").unwrap();
    cmd.arg("--portal-url")
        .arg(server.uri())
        .arg("--catalog-file")
        .arg(&catalog_file)
        .args(["patch=6880880", "MOSUser=dba", "MOSPass=pw", "silent=yes"])
        .write_stdin("999X\n46P\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Platforms and languages need to be reset."))
        .stdout(predicate::str::contains("ERROR: unknown platform code"))
        .stdout(predicate::str::contains(
            "Processing patch 6880880 for Linux x86 and applying regexp .* to the filenames:",
        ))
        .stdout(predicate::str::contains("There's nothing to download!"));

    assert_eq!(
        std::fs::read_to_string(&catalog_file).unwrap(),
        "46P;Linux x86\n"
    );
}

/// Rejected credentials end the run with a non-zero exit code.
#[tokio::test(flavor = "multi_thread")]
async fn test_binary_rejected_credentials_fail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let mut cmd = Command::cargo_bin("patchget").unwrap();
    cmd.arg("--portal-url")
        .arg(server.uri())
        .args(["patch=1", "platform=226P", "MOSUser=dba", "MOSPass=wrong"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("rejected"));
}
