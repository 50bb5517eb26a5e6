#![allow(dead_code)]

use assert_cmd::Command;
use assert_fs::TempDir;
use fake::Fake;
use fake::faker::lorem::en::Words;
use rstest::fixture;
use std::path::Path;

pub const AUTHOR_NAME: &str = "fake_user";
pub const AUTHOR_EMAIL: &str = "fake_email@email.com";
pub const DEFAULT_DATE: &str = "2023-01-01 12:00:00 +0000";

#[fixture]
pub fn repository_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

/// Repository with `1.txt`, `a/2.txt` and `a/b/3.txt` committed once
#[fixture]
pub fn init_repository_dir(repository_dir: TempDir) -> TempDir {
    run_grove_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    write_file(repository_dir.path(), "1.txt", "one");
    write_file(repository_dir.path(), "a/2.txt", "two");
    write_file(repository_dir.path(), "a/b/3.txt", "three");

    run_grove_command(repository_dir.path(), &["add", "."])
        .assert()
        .success();
    grove_commit(repository_dir.path(), "Initial commit")
        .assert()
        .success();

    repository_dir
}

/// Repository with three commits, each adding one file, one minute apart
#[fixture]
pub fn repository_with_multiple_commits(repository_dir: TempDir) -> TempDir {
    run_grove_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    for (index, message) in ["First commit", "Second commit", "Third commit"]
        .into_iter()
        .enumerate()
    {
        write_file(
            repository_dir.path(),
            &format!("file{}.txt", index + 1),
            &random_content(),
        );
        run_grove_command(repository_dir.path(), &["add", "."])
            .assert()
            .success();
        grove_commit_at(
            repository_dir.path(),
            message,
            &format!("2023-01-01 12:0{index}:00 +0000"),
        )
        .assert()
        .success();
    }

    repository_dir
}

pub fn run_grove_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("grove").expect("Failed to find grove binary");
    cmd.current_dir(dir);
    cmd.env("NO_COLOR", "1");
    cmd.env(
        "GROVE_CONFIG_GLOBAL",
        dir.join(".grove").join("missing-global.toml"),
    );
    cmd.env_remove("GROVE_AUTHOR_NAME");
    cmd.env_remove("GROVE_AUTHOR_EMAIL");
    cmd.env_remove("GROVE_AUTHOR_DATE");
    cmd.args(args);
    cmd
}

pub fn grove_commit(dir: &Path, message: &str) -> Command {
    grove_commit_at(dir, message, DEFAULT_DATE)
}

pub fn grove_commit_at(dir: &Path, message: &str, date: &str) -> Command {
    let mut cmd = run_grove_command(dir, &["commit", "-m", message]);
    cmd.envs([
        ("GROVE_AUTHOR_NAME", AUTHOR_NAME),
        ("GROVE_AUTHOR_EMAIL", AUTHOR_EMAIL),
        ("GROVE_AUTHOR_DATE", date), // %Y-%m-%d %H:%M:%S %z
    ]);
    cmd
}

pub fn write_file(dir: &Path, relative: &str, content: &str) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent directories");
    }
    std::fs::write(path, content).expect("Failed to write file");
}

pub fn random_content() -> String {
    Words(5..10).fake::<Vec<String>>().join(" ")
}

pub fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.assert().success();
    String::from_utf8(output.get_output().stdout.clone()).expect("stdout is not UTF-8")
}

/// Commit id HEAD resolves to, read straight from the reference files
pub fn get_head_commit_sha(dir: &Path) -> String {
    let git_dir = dir.join(".grove");
    let head_content = std::fs::read_to_string(git_dir.join("HEAD")).expect("Failed to read HEAD");

    match head_content.trim().strip_prefix("ref: ") {
        Some(ref_path) => std::fs::read_to_string(git_dir.join(ref_path))
            .expect("Failed to read branch")
            .trim()
            .to_string(),
        None => head_content.trim().to_string(),
    }
}
