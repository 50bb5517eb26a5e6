use crate::areas::repository::Repository;
use anyhow::Context;
use std::io::Write;

pub fn commit(repository: &Repository, message: &str, writer: &mut impl Write) -> anyhow::Result<()> {
    let message = message.trim();
    let is_root = repository.refs().read_head()?.is_none();

    let author = repository
        .signature()
        .context("no author configured; set user.name and user.email or GROVE_AUTHOR_NAME and GROVE_AUTHOR_EMAIL")?;
    let commit_id = repository.commit(&format!("{message}\n"), author.clone(), author)?;

    let branch = if repository.is_head_detached()? {
        "detached HEAD".to_string()
    } else {
        repository.refs().current_ref()?.short_name().to_string()
    };
    let root = if is_root { " (root-commit)" } else { "" };
    let summary = message.lines().next().unwrap_or_default();

    writeln!(writer, "[{branch}{root} {}] {summary}", commit_id.to_short_oid())?;

    Ok(())
}
