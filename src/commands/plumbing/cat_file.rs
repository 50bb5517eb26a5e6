use crate::areas::repository::Repository;
use crate::artifacts::objects::object::ObjectBox;
use clap::Args;
use std::io::Write;

/// What `cat-file` prints; exactly one is set
#[derive(Debug, Clone, Copy, Args)]
#[group(required = true, multiple = false)]
pub struct CatFileMode {
    #[arg(short = 'p', help = "Pretty-print the object's content")]
    pub pretty: bool,
    #[arg(short = 't', help = "Show the object's type")]
    pub kind: bool,
    #[arg(short = 's', help = "Show the object's size")]
    pub size: bool,
}

pub fn cat_file(
    repository: &Repository,
    mode: CatFileMode,
    object: &str,
    writer: &mut impl Write,
) -> anyhow::Result<()> {
    let object_id = repository.resolve_revision(object)?;

    if mode.kind {
        writeln!(writer, "{}", repository.database().read_type(&object_id)?)?;
        return Ok(());
    }

    if mode.size {
        let (_, body) = repository.database().read_raw(&object_id)?;
        writeln!(writer, "{}", body.len())?;
        return Ok(());
    }

    match repository.database().read(&object_id)? {
        // blobs are printed byte for byte
        ObjectBox::Blob(blob) => writer.write_all(blob.content())?,
        other => writeln!(writer, "{}", other.display().trim_end())?,
    }

    Ok(())
}
