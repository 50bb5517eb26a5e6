mod common;

use assert_fs::TempDir;
use common::{AUTHOR_EMAIL, AUTHOR_NAME, DEFAULT_DATE, get_head_commit_sha, init_repository_dir, run_grove_command, stdout_of};
use predicates::prelude::*;
use rstest::rstest;
use std::path::Path;

fn grove_tag(dir: &Path, args: &[&str]) -> assert_cmd::Command {
    let mut full = vec!["tag", "create"];
    full.extend_from_slice(args);

    let mut cmd = run_grove_command(dir, &full);
    cmd.envs([
        ("GROVE_AUTHOR_NAME", AUTHOR_NAME),
        ("GROVE_AUTHOR_EMAIL", AUTHOR_EMAIL),
        ("GROVE_AUTHOR_DATE", DEFAULT_DATE),
    ]);
    cmd
}

#[rstest]
fn create_annotated_tag(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();
    let head = get_head_commit_sha(dir);

    grove_tag(dir, &["v1.0", "-m", "first release"]).assert().success();

    let tag_id = std::fs::read_to_string(dir.join(".grove/refs/tags/v1.0")).unwrap();
    let tag_id = tag_id.trim();
    assert_ne!(tag_id, head);

    run_grove_command(dir, &["cat-file", "-t", tag_id])
        .assert()
        .success()
        .stdout("tag\n");
    run_grove_command(dir, &["cat-file", "-p", "v1.0"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(format!("object {head}\ntype commit\ntag v1.0\n")))
        .stdout(predicate::str::contains("first release"));
}

#[rstest]
fn tags_peel_to_commits_in_revisions(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();
    grove_tag(dir, &["v1.0", "-m", "release"]).assert().success();

    let oneline = stdout_of(&mut run_grove_command(dir, &["log", "--oneline", "v1.0"]));

    assert_eq!(oneline, format!("{} Initial commit\n", get_head_commit_sha(dir)));
}

#[rstest]
fn duplicate_tags_need_force(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();
    grove_tag(dir, &["v1.0", "-m", "release"]).assert().success();

    grove_tag(dir, &["v1.0", "-m", "again"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    grove_tag(dir, &["v1.0", "-m", "again", "--force"]).assert().success();
}

#[rstest]
fn tag_requires_tagger(init_repository_dir: TempDir) {
    run_grove_command(init_repository_dir.path(), &["tag", "create", "v1.0", "-m", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no tagger configured"));
}

#[rstest]
fn list_tags(init_repository_dir: TempDir) {
    let dir = init_repository_dir.path();
    grove_tag(dir, &["v2", "-m", "two"]).assert().success();
    grove_tag(dir, &["v1", "-m", "one"]).assert().success();
    grove_tag(dir, &["release/candidate", "-m", "rc"]).assert().success();

    run_grove_command(dir, &["tag", "list"])
        .assert()
        .success()
        .stdout("release/candidate\nv1\nv2\n");
}
