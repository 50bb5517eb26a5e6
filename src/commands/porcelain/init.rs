use crate::areas::repository::Repository;
use crate::artifacts::objects::object_id::HashAlgorithm;
use anyhow::Context;
use std::io::Write;
use std::path::Path;

pub fn init(path: &Path, algorithm: HashAlgorithm, writer: &mut impl Write) -> anyhow::Result<()> {
    let repository = Repository::init(path, algorithm)
        .with_context(|| format!("failed to initialize a repository in {}", path.display()))?;

    writeln!(
        writer,
        "Initialized empty grove repository in {}",
        repository.git_dir().display()
    )?;

    Ok(())
}
