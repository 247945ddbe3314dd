use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_shows_all_commands() {
    cargo_bin_cmd!("imgcluster")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("intake"))
        .stdout(predicate::str::contains("cluster"))
        .stdout(predicate::str::contains("preview"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_help_shows_policy_flags() {
    cargo_bin_cmd!("imgcluster")
        .args(["intake", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--max-files"))
        .stdout(predicate::str::contains("--max-dimension"))
        .stdout(predicate::str::contains("--max-size"))
        .stdout(predicate::str::contains("--quality"))
        .stdout(predicate::str::contains("--json"));
}

#[test]
fn test_intake_requires_paths() {
    cargo_bin_cmd!("imgcluster")
        .arg("intake")
        .assert()
        .failure()
        .stderr(predicate::str::contains("PATH"));
}

#[test]
fn test_version_flag() {
    cargo_bin_cmd!("imgcluster")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1"));
}
