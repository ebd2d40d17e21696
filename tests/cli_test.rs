//! Integration tests for the `chatdeck` binary

use assert_cmd::Command;
use predicates::prelude::*;

mod common;

#[test]
fn test_version_flag() {
    let mut cmd = Command::cargo_bin("chatdeck").unwrap();
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("chatdeck"));
}

#[test]
fn test_help_lists_commands() {
    let mut cmd = Command::cargo_bin("chatdeck").unwrap();
    cmd.arg("--help");
    cmd.assert().success().stdout(
        predicate::str::contains("serve")
            .and(predicate::str::contains("chat"))
            .and(predicate::str::contains("sessions"))
            .and(predicate::str::contains("health")),
    );
}

#[test]
fn test_invalid_port_fails_validation() {
    let config = r#"
server:
  port: 0
"#;
    let (_temp_dir, config_path) = common::temp_config_file(config);

    let mut cmd = Command::cargo_bin("chatdeck").unwrap();
    cmd.arg("--config").arg(config_path).arg("health");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("server.port must be greater than 0"));
}

#[test]
fn test_invalid_api_url_fails_validation() {
    let config = r#"
client:
  api_url: "ftp://example.com"
"#;
    let (_temp_dir, config_path) = common::temp_config_file(config);

    let mut cmd = Command::cargo_bin("chatdeck").unwrap();
    cmd.arg("--config").arg(config_path).arg("sessions");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("client.api_url must use http or https"));
}

#[test]
fn test_malformed_config_fails() {
    let (_temp_dir, config_path) = common::temp_config_file("server: [not, a, map");

    let mut cmd = Command::cargo_bin("chatdeck").unwrap();
    cmd.arg("--config").arg(config_path).arg("health");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config"));
}

#[test]
fn test_health_against_unreachable_service_fails() {
    let config = r#"
client:
  api_url: "http://127.0.0.1:9"
  timeout_seconds: 2
"#;
    let (_temp_dir, config_path) = common::temp_config_file(config);

    let mut cmd = Command::cargo_bin("chatdeck").unwrap();
    cmd.env_remove("CHATDECK_API_URL")
        .arg("--config")
        .arg(config_path)
        .arg("health");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("health check failed"));
}
