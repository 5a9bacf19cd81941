use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn bin(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("locker"));
    cmd.env("LOCKER_PASSPHRASE", "pw")
        .env_remove("LOCKER_LOG_FILE")
        .env_remove("RUST_LOG")
        .arg("--dir")
        .arg(dir);
    cmd
}

fn create(dir: &Path, name: &str) {
    bin(dir).arg("create").arg(name).assert().success();
}

#[test]
fn create_writes_locker_file() {
    let dir = tempdir().unwrap();

    bin(dir.path())
        .arg("create")
        .arg("My Work")
        .assert()
        .success()
        .stdout(predicate::str::contains("locker 'My Work' created"));

    assert!(dir.path().join("lockers").join("my_work.locker").exists());
}

#[test]
fn create_twice_fails_with_usage_code() {
    let dir = tempdir().unwrap();
    create(dir.path(), "Work");

    bin(dir.path())
        .arg("create")
        .arg("work")
        .assert()
        .code(64)
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn create_rejects_forbidden_name() {
    let dir = tempdir().unwrap();

    bin(dir.path())
        .arg("create")
        .arg("../evil")
        .assert()
        .code(64)
        .stderr(predicate::str::contains("alphanumeric"));
}

#[test]
fn lockers_lists_display_names() {
    let dir = tempdir().unwrap();
    create(dir.path(), "Work");
    create(dir.path(), "Home Stuff");

    bin(dir.path())
        .arg("lockers")
        .assert()
        .success()
        .stdout(predicate::str::diff("Home Stuff\nWork\n"));
}

#[test]
fn lockers_on_empty_directory() {
    let dir = tempdir().unwrap();

    bin(dir.path())
        .arg("lockers")
        .assert()
        .success()
        .stdout(predicate::str::contains("No lockers found."));
}

#[test]
fn add_and_show_apikey() {
    let dir = tempdir().unwrap();
    create(dir.path(), "Work");

    bin(dir.path())
        .args(["add-apikey", "Work", "github", "-d", "ci token", "--value", "ghp_abc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stored api key 'github'"));

    bin(dir.path())
        .args(["show", "Work", "github"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ghp_abc"))
        .stdout(predicate::str::contains("ci token"));
}

#[test]
fn secret_is_read_from_stdin_when_not_given() {
    let dir = tempdir().unwrap();
    create(dir.path(), "Work");

    bin(dir.path())
        .args(["add-note", "Work", "todo"])
        .write_stdin("buy milk\n")
        .assert()
        .success();

    bin(dir.path())
        .args(["show", "Work", "todo", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"text\": \"buy milk\""));
}

#[test]
fn add_existing_key_fails() {
    let dir = tempdir().unwrap();
    create(dir.path(), "Work");

    bin(dir.path())
        .args(["add-apikey", "Work", "github", "--value", "a"])
        .assert()
        .success();

    bin(dir.path())
        .args(["add-apikey", "Work", "github", "--value", "b"])
        .assert()
        .code(64)
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn wrong_passphrase_fails_with_auth_code() {
    let dir = tempdir().unwrap();
    create(dir.path(), "Work");

    bin(dir.path())
        .env("LOCKER_PASSPHRASE", "wrong")
        .args(["items", "Work"])
        .assert()
        .code(65)
        .stderr(predicate::str::contains("invalid passphrase"));
}

#[test]
fn items_json_is_sorted_and_filtered() {
    let dir = tempdir().unwrap();
    create(dir.path(), "Work");

    for key in ["github", "aws-prod", "aws-dev"] {
        bin(dir.path())
            .args(["add-apikey", "Work", key, "--value", "v"])
            .assert()
            .success();
    }

    let out = bin(dir.path())
        .args(["items", "Work", "--query", "aws", "--json"])
        .output()
        .unwrap();
    assert!(out.status.success());

    let items: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let keys: Vec<&str> = items
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, ["aws-dev", "aws-prod"]);
    assert_eq!(items[0]["type"], "apikey");
}

#[test]
fn update_account_keeps_omitted_fields() {
    let dir = tempdir().unwrap();
    create(dir.path(), "Work");

    bin(dir.path())
        .args([
            "add-account",
            "Work",
            "bank",
            "-u",
            "alice",
            "--password",
            "hunter2",
            "--url",
            "https://bank.example",
        ])
        .assert()
        .success();

    bin(dir.path())
        .args(["update-account", "Work", "bank", "--password", "s3cret"])
        .assert()
        .success()
        .stdout(predicate::str::contains("account 'bank' updated"));

    let out = bin(dir.path())
        .args(["show", "Work", "bank", "--json"])
        .output()
        .unwrap();
    let item: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(item["username"], "alice");
    assert_eq!(item["password"], "s3cret");
    assert_eq!(item["url"], "https://bank.example");
}

#[test]
fn delete_removes_item() {
    let dir = tempdir().unwrap();
    create(dir.path(), "Work");

    bin(dir.path())
        .args(["add-apikey", "Work", "github", "--value", "v"])
        .assert()
        .success();

    bin(dir.path())
        .args(["delete", "Work", "github"])
        .assert()
        .success();

    bin(dir.path())
        .args(["show", "Work", "github"])
        .assert()
        .code(66)
        .stderr(predicate::str::contains("no item with key 'github'"));
}

#[test]
fn missing_locker_fails_with_io_code() {
    let dir = tempdir().unwrap();

    bin(dir.path())
        .args(["items", "Nope"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cannot read locker file"));
}

#[test]
fn log_file_receives_lifecycle_lines() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("locker.log");

    bin(dir.path())
        .arg("--log-file")
        .arg(&log)
        .args(["create", "Work"])
        .assert()
        .success();

    let contents = std::fs::read_to_string(&log).unwrap();
    assert!(contents.contains("locker created"));
    assert!(contents.contains(" UTC "));
}
