mod common;

use assert_fs::TempDir;
use common::{get_head_commit_sha, init_repository_dir, repository_dir, repository_with_multiple_commits, run_grove_command, stdout_of};
use predicates::prelude::*;
use rstest::rstest;

#[rstest]
fn create_branch_at_head(init_repository_dir: TempDir) {
    let head = get_head_commit_sha(init_repository_dir.path());

    run_grove_command(init_repository_dir.path(), &["branch", "create", "feature"])
        .assert()
        .success();

    let branch = std::fs::read_to_string(init_repository_dir.path().join(".grove/refs/heads/feature")).unwrap();
    assert_eq!(branch.trim(), head);
}

#[rstest]
fn create_duplicate_branch(repository_with_multiple_commits: TempDir) {
    let dir = repository_with_multiple_commits.path();
    let head = get_head_commit_sha(dir);

    run_grove_command(dir, &["branch", "create", "feature", "main"])
        .assert()
        .success();
    run_grove_command(dir, &["branch", "create", "feature", &head[..7]])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    let parent = stdout_of(&mut run_grove_command(dir, &["cat-file", "-p", "HEAD"]))
        .lines()
        .find_map(|line| line.strip_prefix("parent ").map(str::to_string))
        .unwrap();
    run_grove_command(dir, &["branch", "create", "--force", "feature", &parent])
        .assert()
        .success();

    let branch = std::fs::read_to_string(dir.join(".grove/refs/heads/feature")).unwrap();
    assert_eq!(branch.trim(), parent);
}

#[rstest]
fn create_branch_without_commits_fails(repository_dir: TempDir) {
    run_grove_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    run_grove_command(repository_dir.path(), &["branch", "create", "feature"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no commits yet"));
}

#[rstest]
#[case("..")]
#[case("bad..name")]
#[case("ends.lock")]
#[case("has space")]
#[case("HEAD")]
#[case("-leading/")]
fn create_branch_with_invalid_name(init_repository_dir: TempDir, #[case] name: &str) {
    run_grove_command(init_repository_dir.path(), &["branch", "create", "--", name])
        .assert()
        .failure();
}

#[rstest]
fn create_branch_with_hierarchical_name(init_repository_dir: TempDir) {
    run_grove_command(init_repository_dir.path(), &["branch", "create", "feature/deep/name"])
        .assert()
        .success();

    assert!(init_repository_dir.path().join(".grove/refs/heads/feature/deep/name").is_file());
}

#[rstest]
fn list_branches_marks_head(init_repository_dir: TempDir) {
    run_grove_command(init_repository_dir.path(), &["branch", "create", "develop"])
        .assert()
        .success();

    run_grove_command(init_repository_dir.path(), &["branch", "list"])
        .assert()
        .success()
        .stdout("  develop\n* main\n");
}

#[rstest]
fn list_remote_branches(init_repository_dir: TempDir) {
    let head = get_head_commit_sha(init_repository_dir.path());
    let remote = init_repository_dir.path().join(".grove/refs/remotes/origin/main");
    std::fs::create_dir_all(remote.parent().unwrap()).unwrap();
    std::fs::write(&remote, format!("{head}\n")).unwrap();

    run_grove_command(init_repository_dir.path(), &["branch", "list", "-r"])
        .assert()
        .success()
        .stdout("  remotes/origin/main\n");
    run_grove_command(init_repository_dir.path(), &["branch", "list", "--all"])
        .assert()
        .success()
        .stdout("* main\n  remotes/origin/main\n");
}

#[rstest]
fn delete_branch(init_repository_dir: TempDir) {
    run_grove_command(init_repository_dir.path(), &["branch", "create", "feature/x"])
        .assert()
        .success();

    run_grove_command(init_repository_dir.path(), &["branch", "delete", "feature/x"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Deleted branch feature/x (was "));

    assert!(!init_repository_dir.path().join(".grove/refs/heads/feature").exists());
    run_grove_command(init_repository_dir.path(), &["branch", "delete", "feature/x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[rstest]
fn delete_current_branch_fails(init_repository_dir: TempDir) {
    run_grove_command(init_repository_dir.path(), &["branch", "delete", "main"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("current HEAD branch"));
}

#[rstest]
fn rename_current_branch_moves_head(init_repository_dir: TempDir) {
    let head = get_head_commit_sha(init_repository_dir.path());

    run_grove_command(init_repository_dir.path(), &["branch", "rename", "main", "trunk"])
        .assert()
        .success();

    assert_eq!(
        std::fs::read_to_string(init_repository_dir.path().join(".grove/HEAD")).unwrap(),
        "ref: refs/heads/trunk\n"
    );
    assert_eq!(get_head_commit_sha(init_repository_dir.path()), head);
    assert!(!init_repository_dir.path().join(".grove/refs/heads/main").exists());
}

#[rstest]
fn rename_onto_existing_branch_needs_force(init_repository_dir: TempDir) {
    run_grove_command(init_repository_dir.path(), &["branch", "create", "other"])
        .assert()
        .success();

    run_grove_command(init_repository_dir.path(), &["branch", "rename", "other", "main"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    run_grove_command(init_repository_dir.path(), &["branch", "rename", "-f", "other", "main"])
        .assert()
        .success();
}

#[rstest]
fn set_upstream_writes_branch_config(init_repository_dir: TempDir) {
    let head = get_head_commit_sha(init_repository_dir.path());
    let remote = init_repository_dir.path().join(".grove/refs/remotes/origin/main");
    std::fs::create_dir_all(remote.parent().unwrap()).unwrap();
    std::fs::write(&remote, format!("{head}\n")).unwrap();

    run_grove_command(init_repository_dir.path(), &["branch", "set-upstream", "main", "origin/main"])
        .assert()
        .success();

    run_grove_command(init_repository_dir.path(), &["config", "get", "branch.main.merge"])
        .assert()
        .success()
        .stdout("refs/heads/main\n");
    run_grove_command(init_repository_dir.path(), &["config", "get", "branch.main.remote"])
        .assert()
        .success()
        .stdout("origin\n");
}
