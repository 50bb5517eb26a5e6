use crate::areas::repository::Repository;
use anyhow::Context;

/// Unstage `paths`, also deleting them from the working tree unless `cached`
pub fn rm(repository: &Repository, paths: &[String], cached: bool) -> anyhow::Result<()> {
    repository
        .remove_by_path(paths)
        .context("failed to unstage files")?;

    if cached {
        return Ok(());
    }

    for path in paths {
        let path = repository.workspace().normalize(path)?;
        let absolute = repository.workspace().absolute(&path);
        if absolute.is_file() || absolute.is_symlink() {
            std::fs::remove_file(&absolute)
                .with_context(|| format!("failed to delete {}", absolute.display()))?;
        }
    }

    Ok(())
}
