//! Binary-level tests against a throwaway data directory.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn wellkeep(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("wellkeep").unwrap();
    cmd.arg("--home")
        .arg(home.path())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("WELLKEEP_TOKEN");
    cmd
}

fn json_output(home: &TempDir, args: &[&str]) -> serde_json::Value {
    let output = wellkeep(home)
        .args(args)
        .args(["-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_set_then_get_survives_restart() {
    let home = TempDir::new().unwrap();

    assert_eq!(json_output(&home, &["get", "sleep-time"]), "");
    assert_eq!(json_output(&home, &["get", "sleep-mode"]), "wake");

    wellkeep(&home)
        .args(["set", "sleep-time", "07:30"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved sleep-time"));

    assert_eq!(json_output(&home, &["get", "sleep-time"]), "07:30");
    assert!(home.path().join("wellkeep.db").exists());

    wellkeep(&home).args(["set", "sleep-time", "5"]).assert().failure();
    assert_eq!(json_output(&home, &["get", "sleep-time"]), "07:30");
}

#[test]
fn test_unknown_key_fails() {
    let home = TempDir::new().unwrap();

    wellkeep(&home)
        .args(["get", "bogus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not found"));
}

#[test]
fn test_invalid_structured_value_is_rejected() {
    let home = TempDir::new().unwrap();

    wellkeep(&home)
        .args(["set", "sleep-state", r#"{"mode":"wake","time":"99:99"}"#])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid time"));

    let state = json_output(&home, &["get", "sleep-state"]);
    assert_eq!(state["time"], "");
}

#[test]
fn test_sleep_suggestions() {
    let home = TempDir::new().unwrap();

    let state = json_output(&home, &["sleep", "set", "--mode", "wake", "--time", "06:00"]);
    assert_eq!(state["calculated_times"][0], "20:46");

    let state = json_output(&home, &["sleep", "set", "--selected", "22:16"]);
    assert_eq!(state["selected_time"], "22:16");
    assert_eq!(state["time"], "06:00");

    wellkeep(&home)
        .args(["sleep", "set", "--selected", "12:00"])
        .assert()
        .failure();
}

#[test]
fn test_todo_flow() {
    let home = TempDir::new().unwrap();

    wellkeep(&home)
        .args(["todo", "add", "Stretch", "--priority", "high"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stretch"));

    let list = json_output(&home, &["todo", "list"]);
    assert_eq!(list["count"], 1);
    let id = list["items"][0]["id"].as_str().unwrap().to_string();

    wellkeep(&home)
        .args(["todo", "done", &id[..8]])
        .assert()
        .success();

    assert_eq!(json_output(&home, &["todo", "list"])["count"], 0);
    assert_eq!(json_output(&home, &["todo", "list", "--all"])["count"], 1);

    wellkeep(&home)
        .args(["todo", "add", "Plan", "--priority", "must"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("priority"));
}

#[test]
fn test_field_update_on_fasting() {
    let home = TempDir::new().unwrap();

    wellkeep(&home)
        .args(["field", "fasting-state", "goal_hours", "18"])
        .assert()
        .success();

    let state = json_output(&home, &["get", "fasting-state"]);
    assert_eq!(state["goal_hours"], 18);
    assert_eq!(state["protocol"], "16:8");

    wellkeep(&home)
        .args(["field", "fasting-state", "goal_hours", "100"])
        .assert()
        .failure();

    wellkeep(&home)
        .args(["field", "fasting-state", "snacks", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown field"));
}

#[test]
fn test_fasting_start_and_stop() {
    let home = TempDir::new().unwrap();

    let started = json_output(&home, &["fasting", "start", "--protocol", "18:6"]);
    assert_eq!(started["active"], true);
    assert_eq!(started["goal_hours"], 18);

    let stopped = json_output(&home, &["fasting", "stop"]);
    assert_eq!(stopped["active"], false);

    wellkeep(&home).args(["fasting", "stop"]).assert().failure();
}

#[test]
fn test_sync_without_backend() {
    let home = TempDir::new().unwrap();

    wellkeep(&home)
        .args(["sync", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("local only"));

    wellkeep(&home)
        .args(["sync", "run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("remote.url is not set"));
}

#[test]
fn test_login_and_logout() {
    let home = TempDir::new().unwrap();

    wellkeep(&home)
        .args(["login", "--account", "acct-1", "--token", "secret"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed in as acct-1"));

    let status = json_output(&home, &["sync", "status"]);
    assert_eq!(status["account"], "acct-1");
    assert!(status["backend"].is_null());

    wellkeep(&home)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed out"));

    assert!(json_output(&home, &["sync", "status"])["account"].is_null());
}

#[test]
fn test_broken_config_is_reported() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join("config.yaml"), "sync: [not, a, map]").unwrap();

    wellkeep(&home)
        .args(["get", "sleep-time"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config file"));
}

#[test]
fn test_completions() {
    let home = TempDir::new().unwrap();

    wellkeep(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("wellkeep"));
}
