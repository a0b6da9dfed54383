//! End-to-end tests through the `flagstone` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn flagstone(db: &Path) -> Command {
    let mut cmd = Command::cargo_bin("flagstone").unwrap();
    cmd.arg("--db").arg(db);
    cmd
}

#[test]
fn auth_rollout_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("flags.db");

    flagstone(&db)
        .args(["add-feature", "auth"])
        .assert()
        .success();
    flagstone(&db)
        .args(["resolve", "auth", "--customer-id", "1"])
        .assert()
        .success()
        .stdout("false\n");

    flagstone(&db)
        .args(["set-global-flag", "auth", "--enabled"])
        .assert()
        .success();
    flagstone(&db)
        .args(["resolve", "auth", "--customer-id", "1"])
        .assert()
        .success()
        .stdout("true\n");

    flagstone(&db)
        .args(["set-flag", "auth", "--customer-id", "1", "--disabled"])
        .assert()
        .success();
    flagstone(&db)
        .args(["resolve", "auth", "--customer-id", "1"])
        .assert()
        .success()
        .stdout("false\n");
    flagstone(&db)
        .args(["resolve", "auth", "--customer-id", "2"])
        .assert()
        .success()
        .stdout("true\n");
}

#[test]
fn set_flag_without_scope_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("flags.db");

    flagstone(&db)
        .args(["add-feature", "f", "--default-enabled"])
        .assert()
        .success();
    flagstone(&db)
        .args(["set-flag", "f", "--enabled"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("scope"));
}

#[test]
fn set_flag_requires_a_state() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("flags.db");

    // clap rejects the missing --enabled/--disabled group before we run
    flagstone(&db)
        .args(["set-flag", "f", "--customer-id", "1"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn resolve_unknown_feature_fails() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("flags.db");

    flagstone(&db)
        .args(["resolve", "ghost"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn describe_all_features_emits_json() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("flags.db");

    flagstone(&db)
        .args(["add-feature", "search", "--default-enabled"])
        .assert()
        .success();
    flagstone(&db)
        .args(["set-flag", "search", "--customer-id", "7", "--disabled"])
        .assert()
        .success();

    let output = flagstone(&db)
        .args(["describe-all-features", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let reports: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(reports[0]["feature_name"], "search");
    assert_eq!(reports[0]["global_enabled"], true);
    assert_eq!(reports[0]["explicitly_disabled_customers"][0], 7);
}

#[test]
fn rename_and_listings() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("flags.db");

    flagstone(&db).args(["add-customer", "1"]).assert().success();
    flagstone(&db).args(["add-customer", "2"]).assert().success();
    flagstone(&db)
        .args(["add-feature", "old", "--default-enabled"])
        .assert()
        .success();
    flagstone(&db)
        .args(["set-flag", "old", "--customer-id", "2", "--disabled"])
        .assert()
        .success();

    flagstone(&db)
        .args(["rename-feature", "old", "new"])
        .assert()
        .success();

    flagstone(&db)
        .args(["list-all-features"])
        .assert()
        .success()
        .stdout("new\n");
    flagstone(&db)
        .args(["list-customers", "new"])
        .assert()
        .success()
        .stdout("1\n");
    flagstone(&db)
        .args(["list-customers-disabled", "new"])
        .assert()
        .success()
        .stdout("2\n");
}
