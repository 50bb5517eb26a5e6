use crate::areas::repository::Repository;
use crate::artifacts::refs::ref_name::RefName;
use std::io::Write;

/// Print `<id> <name>` for every reference, symbolic ones resolved
pub fn show_ref(repository: &Repository, head: bool, writer: &mut impl Write) -> anyhow::Result<()> {
    if head && let Some(oid) = repository.refs().read_head()? {
        writeln!(writer, "{oid} {}", RefName::head())?;
    }

    for reference in repository.refs().list_all()? {
        let oid = repository.refs().resolve(reference.name())?;
        writeln!(writer, "{oid} {}", reference.name())?;
    }

    Ok(())
}
