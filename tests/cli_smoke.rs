use assert_cmd::Command;
use tempfile::TempDir;

#[test]
fn help_exits_cleanly() {
    Command::cargo_bin("codegate")
        .unwrap()
        .arg("--help")
        .assert()
        .success();
}

#[test]
fn init_writes_starter_config() {
    let dir = TempDir::new().unwrap();
    Command::cargo_bin("codegate")
        .unwrap()
        .args(["init", dir.path().to_str().unwrap()])
        .assert()
        .success();

    let config = dir.path().join("codegate.toml");
    assert!(config.exists());

    // a second init without --force refuses to clobber
    Command::cargo_bin("codegate")
        .unwrap()
        .args(["init", dir.path().to_str().unwrap()])
        .assert()
        .failure();

    Command::cargo_bin("codegate")
        .unwrap()
        .args(["init", "--force", dir.path().to_str().unwrap()])
        .assert()
        .success();
}

#[test]
fn missing_project_root_exits_with_infrastructure_code() {
    Command::cargo_bin("codegate")
        .unwrap()
        .args(["check", "/definitely/not/a/project"])
        .assert()
        .code(2);
}
