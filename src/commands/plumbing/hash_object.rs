use crate::areas::repository::Repository;
use crate::artifacts::objects::object;
use crate::artifacts::objects::object_id::HashAlgorithm;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use std::io::Write;
use std::path::Path;

/// Print the blob id of `file`, storing the blob when a repository is given
///
/// Outside a repository the id is computed with the default algorithm.
pub fn hash_object(
    repository: Option<&Repository>,
    file: &Path,
    write: bool,
    writer: &mut impl Write,
) -> anyhow::Result<()> {
    let object_id = match repository {
        Some(repository) if write => repository.blob_create_from_disk(file)?,
        Some(repository) => repository.database().hash_file(file)?,
        None => {
            let content = std::fs::read(file)
                .with_context(|| format!("could not read {}", file.display()))?;
            HashAlgorithm::default().digest(&object::encode(ObjectType::Blob, &content))
        }
    };

    writeln!(writer, "{object_id}")?;

    Ok(())
}
