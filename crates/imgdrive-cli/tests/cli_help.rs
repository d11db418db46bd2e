use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_shows_all_commands() {
    cargo_bin_cmd!("imgdrive")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("browse"))
        .stdout(predicate::str::contains("upload"))
        .stdout(predicate::str::contains("search"));
}

#[test]
fn test_upload_help_shows_target_flag() {
    cargo_bin_cmd!("imgdrive")
        .args(["upload", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--to"))
        .stdout(predicate::str::contains("--name"));
}

#[test]
fn test_version_flag() {
    cargo_bin_cmd!("imgdrive")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
