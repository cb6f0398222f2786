use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const VALID_CONFIG: &str = r#"
{
    "project": "proj-",
    "state_bucket": "proj-terraform-state",
    "lock_table": "proj-terraform-locks",
    "state_region": "eu-west-1",
    "state_account": "111111111111",
    "environments": {
        "dev": {
            "region": "eu-west-1",
            "permissions_mode": "broad",
            "principal_patterns": [
                "arn:aws:iam::111111111111:role/aws-reserved/sso.amazonaws.com/*"
            ]
        },
        "prod": {
            "region": "eu-west-1",
            "permissions_mode": "hardened",
            "require_mfa": true,
            "principal_patterns": [
                "arn:aws:iam::222222222222:role/aws-reserved/sso.amazonaws.com/*"
            ]
        }
    }
}
"#;

const ACCOUNTS: &str = r#"
[
    {"name": "proj-dev", "id": "111111111111"},
    {"name": "proj-prod", "id": "222222222222"},
    {"name": "dev", "id": "999999999999"}
]
"#;

struct Fixture {
    _dir: TempDir,
    config: PathBuf,
    accounts: PathBuf,
    output: PathBuf,
}

fn fixture(config_json: &str) -> Fixture {
    let dir = TempDir::new().expect("tempdir");
    let config = dir.path().join("config.json");
    let accounts = dir.path().join("accounts.json");
    let output = dir.path().join("out");
    fs::write(&config, config_json).expect("write config");
    fs::write(&accounts, ACCOUNTS).expect("write accounts");
    Fixture {
        _dir: dir,
        config,
        accounts,
        output,
    }
}

fn statesmith() -> Command {
    Command::cargo_bin("statesmith").expect("binary builds")
}

#[test]
fn help_lists_subcommands() {
    statesmith()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("resolve-accounts"));
}

#[test]
fn validate_accepts_valid_config() {
    let fx = fixture(VALID_CONFIG);
    statesmith()
        .args(["validate", "--config"])
        .arg(&fx.config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration valid"));
}

#[test]
fn validate_rejects_unknown_mode_with_exit_code_2() {
    let fx = fixture(&VALID_CONFIG.replace("\"broad\"", "\"open\""));
    statesmith()
        .args(["validate", "--config"])
        .arg(&fx.config)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("permissions_mode"))
        .stderr(predicate::str::contains("hardened"));
}

#[test]
fn validate_rejects_out_of_range_session_duration() {
    let fx = fixture(&VALID_CONFIG.replace(
        "\"permissions_mode\": \"broad\",",
        "\"permissions_mode\": \"broad\", \"max_session_duration\": 43201,",
    ));
    statesmith()
        .args(["validate", "--config"])
        .arg(&fx.config)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("max_session_duration"))
        .stderr(predicate::str::contains("43200"));
}

#[test]
fn resolve_accounts_excludes_foreign_accounts() {
    let fx = fixture(VALID_CONFIG);
    statesmith()
        .args(["resolve-accounts", "--config"])
        .arg(&fx.config)
        .arg("--accounts")
        .arg(&fx.accounts)
        .assert()
        .success()
        .stdout(predicate::str::contains("111111111111"))
        .stdout(predicate::str::contains("999999999999").not());
}

#[test]
fn generate_writes_documents_per_environment() {
    let fx = fixture(VALID_CONFIG);
    statesmith()
        .args(["generate", "--config"])
        .arg(&fx.config)
        .arg("--accounts")
        .arg(&fx.accounts)
        .arg("--output")
        .arg(&fx.output)
        .assert()
        .success();

    let trust = fs::read_to_string(fx.output.join("dev/trust-policy.json")).expect("trust written");
    assert!(trust.contains("sts:AssumeRole"), "was: {}", trust);

    let bucket = fs::read_to_string(fx.output.join("shared/state-bucket-policy.json"))
        .expect("bucket policy written");
    assert!(bucket.contains("aws:SecureTransport"), "was: {}", bucket);

    for name in [
        "dev/permissions-policy.json",
        "dev/backend-access-policy.json",
        "prod/trust-policy.json",
        "shared/lock-table-policy.json",
    ] {
        assert!(fx.output.join(name).is_file(), "missing {}", name);
    }
}

#[test]
fn generate_without_output_prints_combined_json() {
    let fx = fixture(VALID_CONFIG);
    let assert = statesmith()
        .args(["generate", "--config"])
        .arg(&fx.config)
        .arg("--accounts")
        .arg(&fx.accounts)
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    let combined: serde_json::Value = serde_json::from_str(&stdout).expect("stdout is JSON");
    assert!(combined["environments"]["dev"]["trust_policy"].is_object());
    assert!(combined["shared"]["lock_table_policy"].is_object());
}

#[test]
fn match_principal_accepts_generated_sso_name() {
    statesmith()
        .args([
            "match-principal",
            "--pattern",
            "arn:aws:iam::123:role/aws-reserved/sso.amazonaws.com/*",
            "--principal",
            "arn:aws:iam::123:role/aws-reserved/sso.amazonaws.com/AWSReservedSSO_Admin_abc123",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("match"));
}

#[test]
fn match_principal_rejects_other_account() {
    statesmith()
        .args([
            "match-principal",
            "--pattern",
            "arn:aws:iam::123:role/aws-reserved/sso.amazonaws.com/*",
            "--principal",
            "arn:aws:iam::999:role/aws-reserved/sso.amazonaws.com/x",
        ])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("no match"));
}

#[test]
fn schema_prints_config_schema() {
    statesmith()
        .arg("schema")
        .assert()
        .success()
        .stdout(predicate::str::contains("permissions_mode"))
        .stdout(predicate::str::contains("principal_patterns"));
}
