//! Binary-level tests for the commands that need no external tools

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const CONF: &str = "\
[options]
db_host = localhost
db_port = 5432
db_name = acme
db_user = odoo
db_password = secret
db_template = template0
data_dir = data
addons_path = addons
";

/// Lay out a minimal project: conf/odoo.conf plus a backups directory
/// holding the given artifact files.
fn project_with_backups(artifacts: &[&str]) -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("conf")).unwrap();
    fs::write(temp.path().join("conf").join("odoo.conf"), CONF).unwrap();
    fs::create_dir(temp.path().join("backups")).unwrap();
    for name in artifacts {
        fs::write(temp.path().join("backups").join(name), b"").unwrap();
    }
    temp
}

fn tenback(project: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tenback").unwrap();
    cmd.current_dir(project).arg("--config").arg("conf/odoo.conf");
    cmd
}

#[test]
fn trim_deletes_only_the_oldest_beyond_keep() {
    let project = project_with_backups(&[
        "20240101_000000__acme.tar.zst",
        "20240601_000000__acme.tar.zst",
        "20241201_000000__acme.tar.zst",
    ]);

    tenback(project.path())
        .args(["trim", "--keep", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rm -f"))
        .stdout(predicate::str::contains("20240101_000000__acme.tar.zst"))
        .stdout(predicate::str::contains("Deleted 1 backup(s)."));

    let backups = project.path().join("backups");
    assert!(!backups.join("20240101_000000__acme.tar.zst").exists());
    assert!(backups.join("20240601_000000__acme.tar.zst").exists());
    assert!(backups.join("20241201_000000__acme.tar.zst").exists());
}

#[test]
fn trim_leaves_small_groups_alone() {
    let project = project_with_backups(&["20240101_000000__acme__addons.tar.zst"]);

    tenback(project.path())
        .args(["trim", "--keep", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to trim"));

    assert!(project
        .path()
        .join("backups")
        .join("20240101_000000__acme__addons.tar.zst")
        .exists());
}

#[test]
fn trim_skips_other_tenants_but_trimall_does_not() {
    let project = project_with_backups(&[
        "20240101_000000__beta.tar.zst",
        "20240201_000000__beta.tar.zst",
    ]);

    tenback(project.path())
        .args(["trim", "--keep", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to trim"));
    assert!(project
        .path()
        .join("backups")
        .join("20240101_000000__beta.tar.zst")
        .exists());

    tenback(project.path())
        .args(["trimall", "--keep", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted 1 backup(s)."));
    assert!(!project
        .path()
        .join("backups")
        .join("20240101_000000__beta.tar.zst")
        .exists());
}

#[test]
fn trim_ignores_unrelated_files() {
    let project = project_with_backups(&["notes.txt", "20240101_000000__acme.tar.zst"]);

    tenback(project.path())
        .args(["trim", "--keep", "0"])
        .assert()
        .success();

    let backups = project.path().join("backups");
    assert!(backups.join("notes.txt").exists());
    assert!(!backups.join("20240101_000000__acme.tar.zst").exists());
}

#[test]
fn list_groups_database_and_addon_backups() {
    let project = project_with_backups(&[
        "20240101_000000__acme.tar.zst",
        "20240101_000000__acme_addons__addons.tar.zst",
    ]);

    tenback(project.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Database backups:"))
        .stdout(predicate::str::contains("20240101_000000__acme.tar.zst"))
        .stdout(predicate::str::contains("Addon backups:"))
        .stdout(predicate::str::contains(
            "20240101_000000__acme_addons__addons.tar.zst",
        ));
}

#[test]
fn missing_config_file_fails_with_config_error() {
    let temp = TempDir::new().unwrap();

    Command::cargo_bin("tenback")
        .unwrap()
        .current_dir(temp.path())
        .args(["--config", "conf/odoo.conf", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn restore_of_unknown_artifact_fails_before_touching_anything() {
    let project = project_with_backups(&[]);

    tenback(project.path())
        .args(["restore", "20240101_000000__acme.tar.zst"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Backup artifact not found"));
}

#[test]
fn config_command_masks_the_password() {
    let project = project_with_backups(&[]);

    tenback(project.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("acme"))
        .stdout(predicate::str::contains("********"))
        .stdout(predicate::str::contains("secret").not());
}
