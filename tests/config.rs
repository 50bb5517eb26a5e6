mod common;

use assert_fs::TempDir;
use common::{grove_commit, repository_dir, run_grove_command, write_file};
use predicates::prelude::*;
use rstest::{fixture, rstest};

#[fixture]
fn initialized(repository_dir: TempDir) -> TempDir {
    run_grove_command(repository_dir.path(), &["init"])
        .assert()
        .success();
    repository_dir
}

#[rstest]
fn init_records_hash_algorithm(initialized: TempDir) {
    run_grove_command(initialized.path(), &["config", "get", "core.hash"])
        .assert()
        .success()
        .stdout("sha1\n");
}

#[rstest]
#[case(&["config", "set", "core.hash", "sha256"])]
#[case(&["config", "unset", "core.hash"])]
fn hash_algorithm_is_fixed_after_init(initialized: TempDir, #[case] args: &[&str]) {
    let dir = initialized.path();

    run_grove_command(dir, args)
        .assert()
        .failure()
        .stderr(predicate::str::contains("read-only after init"));
    run_grove_command(dir, &["config", "get", "core.hash"])
        .assert()
        .success()
        .stdout("sha1\n");
}

#[rstest]
fn set_get_and_unset(initialized: TempDir) {
    let dir = initialized.path();

    run_grove_command(dir, &["config", "set", "user.name", "Jane Doe"])
        .assert()
        .success();
    run_grove_command(dir, &["config", "get", "user.name"])
        .assert()
        .success()
        .stdout("Jane Doe\n");

    run_grove_command(dir, &["config", "unset", "user.name"])
        .assert()
        .success();
    run_grove_command(dir, &["config", "get", "user.name"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("key not set: user.name"));
    run_grove_command(dir, &["config", "unset", "user.name"])
        .assert()
        .failure();
}

#[rstest]
fn list_is_sorted_by_key(initialized: TempDir) {
    let dir = initialized.path();
    run_grove_command(dir, &["config", "set", "user.email", "jane@example.com"])
        .assert()
        .success();
    run_grove_command(dir, &["config", "set", "branch.main.remote", "origin"])
        .assert()
        .success();

    run_grove_command(dir, &["config", "list"])
        .assert()
        .success()
        .stdout("branch.main.remote=origin\ncore.hash=sha1\nuser.email=jane@example.com\n");
}

#[rstest]
fn global_config_is_read_and_overridden(initialized: TempDir) {
    let dir = initialized.path();
    let global = dir.join("global.toml");
    std::fs::write(&global, "[user]\nname = \"Global\"\nemail = \"global@example.com\"\n").unwrap();
    run_grove_command(dir, &["config", "set", "user.name", "Local"])
        .assert()
        .success();

    let mut get_name = run_grove_command(dir, &["config", "get", "user.name"]);
    get_name.env("GROVE_CONFIG_GLOBAL", &global);
    get_name.assert().success().stdout("Local\n");

    let mut get_email = run_grove_command(dir, &["config", "get", "user.email"]);
    get_email.env("GROVE_CONFIG_GLOBAL", &global);
    get_email.assert().success().stdout("global@example.com\n");
}

#[rstest]
#[case("nodot")]
#[case("section.")]
#[case("sec tion.key")]
fn malformed_keys_are_rejected(initialized: TempDir, #[case] key: &str) {
    run_grove_command(initialized.path(), &["config", "set", key, "value"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid argument"));
}

#[rstest]
fn configured_user_signs_commits(initialized: TempDir) {
    let dir = initialized.path();
    write_file(dir, "a.txt", "a");
    run_grove_command(dir, &["add", "a.txt"]).assert().success();
    run_grove_command(dir, &["config", "set", "user.name", "Jane Doe"])
        .assert()
        .success();
    run_grove_command(dir, &["config", "set", "user.email", "jane@example.com"])
        .assert()
        .success();

    run_grove_command(dir, &["commit", "-m", "configured"])
        .assert()
        .success();

    run_grove_command(dir, &["log", "-n", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Author: Jane Doe <jane@example.com>"));
}

#[rstest]
fn environment_overrides_configured_user(initialized: TempDir) {
    let dir = initialized.path();
    write_file(dir, "a.txt", "a");
    run_grove_command(dir, &["add", "a.txt"]).assert().success();
    run_grove_command(dir, &["config", "set", "user.name", "Jane Doe"])
        .assert()
        .success();

    grove_commit(dir, "from env").assert().success();

    run_grove_command(dir, &["log", "-n", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Author: fake_user <fake_email@email.com>"));
}
