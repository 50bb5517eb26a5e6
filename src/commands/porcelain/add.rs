use crate::areas::repository::Repository;
use anyhow::Context;

pub fn add(repository: &Repository, patterns: &[String]) -> anyhow::Result<()> {
    repository
        .add_all(patterns)
        .context("failed to stage files")?;

    Ok(())
}
