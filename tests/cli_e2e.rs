//! End-to-end CLI tests for the protopred binary.

// `Command::cargo_bin` is deprecated in assert_cmd >=2.0.17 in favor of
// `cargo::cargo_bin_cmd!` macro. Suppressed until migration to the new API.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Binary command isolated from the caller's config and credentials.
fn protopred(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("protopred").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env_remove("PROTOPRED_ACCOUNT_TOKEN")
        .env_remove("PROTOPRED_SECRET_KEY")
        .env_remove("PROTOPRED_ACCOUNT_USER")
        .env_remove("PROTOPRED_LOG_FILE")
        .env_remove("RUST_LOG");
    cmd
}

fn write_config(config_home: &TempDir, contents: &str) {
    let config_dir = config_home.path().join("protopred");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), contents).unwrap();
}

#[test]
fn test_binary_help_displays_usage() {
    let home = TempDir::new().unwrap();
    protopred(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("single"))
        .stdout(predicate::str::contains("models"));
}

#[test]
fn test_models_command_lists_catalog_without_credentials() {
    let home = TempDir::new().unwrap();
    protopred(&home)
        .args(["models", "-m", "adme"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ProtoADME"))
        .stdout(predicate::str::contains("model_met:CYP450_1A2_inhibitor"))
        .stdout(predicate::str::contains("ProtoPHYSCHEM").not());
}

#[test]
fn test_prediction_without_credentials_fails() {
    let home = TempDir::new().unwrap();
    protopred(&home)
        .args([
            "single",
            "CCCCC",
            "-m",
            "physchem",
            "--models",
            "model_phys:water_solubility",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing ProtoPRED credentials"));
}

#[test]
fn test_invalid_config_file_fails() {
    let home = TempDir::new().unwrap();
    write_config(&home, "max_retries = lots\n");
    protopred(&home)
        .arg("models")
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_retries"));
}

#[tokio::test]
async fn test_single_prediction_prints_table() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/API/v2/"))
        .and(body_string_contains("account_user=cfg-user"))
        .and(body_string_contains("account_token=env-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Water solubility": [{
                "ID": "ID_2",
                "SMILES": "CCCCC",
                "Predicted value": "0.066 g/L",
                "Predicted numerical": 0.066,
                "Applicability domain**": "Inside (T/L/E/R)"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    write_config(
        &home,
        "account_token = \"cfg-token\"\naccount_secret_key = \"cfg-secret\"\naccount_user = \"cfg-user\"\n",
    );
    let base_url = format!("{}/API/v2/", server.uri());

    tokio::task::spawn_blocking(move || {
        protopred(&home)
            .env("PROTOPRED_ACCOUNT_TOKEN", "env-token")
            .args([
                "single",
                "CCCCC",
                "-m",
                "physchem",
                "--models",
                "model_phys:water_solubility",
                "--base-url",
                base_url.as_str(),
                "-q",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("ID_2  CCCCC"))
            .stdout(predicate::str::contains("0.066 g/L"))
            .stdout(predicate::str::contains("[Inside (T/L/E/R)]"));
    })
    .await
    .unwrap();
}
