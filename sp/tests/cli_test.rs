//! CLI smoke tests for the `sp` binary

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

/// `sp` confined to a scratch home so logs and config lookups stay inside it
fn sp(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("sp").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_DATA_HOME", home.path().join("data"))
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let home = TempDir::new().unwrap();
    sp(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("ask").and(contains("plan")).and(contains("skills")).and(contains("demo")));
}

#[test]
fn test_skills_lists_builtin_functions() {
    let home = TempDir::new().unwrap();
    sp(&home).arg("skills").assert().success().stdout(
        contains("servicedesk.get_incidences")
            .and(contains("rag.ask_rag"))
            .and(contains("cities_db.get_cities"))
            .and(contains("invoices.update_invoice")),
    );
}

#[test]
fn test_ask_without_api_key_fails_fast() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("skillplan.yml");
    std::fs::write(&config, "llm:\n  api-key-env: SKILLPLAN_CLI_TEST_KEY_NEVER_SET\n").unwrap();

    sp(&home)
        .args(["ask", "Which is the biggest city?", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(contains("SKILLPLAN_CLI_TEST_KEY_NEVER_SET"));
}

#[test]
fn test_malformed_header_is_rejected() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("skillplan.yml");
    std::fs::write(&config, "llm:\n  api-key-env: SKILLPLAN_CLI_TEST_KEY_NEVER_SET\n").unwrap();

    sp(&home)
        .args(["ask", "q", "-H", "no-separator", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(contains("Name: value"));
}
