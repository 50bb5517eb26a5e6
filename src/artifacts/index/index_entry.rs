//! Index entry representation
//!
//! Each entry in the index represents a staged file with:
//! - File path, relative to the working tree root and `/`-separated
//! - Content hash (object ID)
//! - Mode and size
//!
//! ## Entry Format
//!
//! ```text
//! mode      u32 (big endian)
//! size      u64
//! id length u8, followed by the raw id bytes
//! path len  u16, followed by the UTF-8 path bytes
//! ```

use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::objects::object::MalformedObject;
use crate::artifacts::objects::object_id::ObjectId;
use byteorder::{NetworkEndian, ReadBytesExt, WriteBytesExt};
use derive_new::new;
use std::io::{Read, Write};

/// Maximum path length supported in index entries
pub const MAX_PATH_SIZE: usize = u16::MAX as usize;

/// Staged file
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct IndexEntry {
    path: String,
    oid: ObjectId,
    mode: EntryMode,
    size: u64,
}

impl IndexEntry {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn oid(&self) -> &ObjectId {
        &self.oid
    }

    pub fn mode(&self) -> EntryMode {
        self.mode
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn basename(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Every directory containing the entry, outermost first
    ///
    /// `a/b/c` yields `["a", "a/b"]`.
    pub fn parent_dirs(&self) -> Vec<&str> {
        self.path
            .match_indices('/')
            .map(|(position, _)| &self.path[..position])
            .collect()
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let id = self.oid.as_bytes();

        writer.write_u32::<NetworkEndian>(self.mode.as_u32())?;
        writer.write_u64::<NetworkEndian>(self.size)?;
        writer.write_u8(id.len() as u8)?;
        writer.write_all(id)?;
        let path_len = u16::try_from(self.path.len()).map_err(std::io::Error::other)?;
        writer.write_u16::<NetworkEndian>(path_len)?;
        writer.write_all(self.path.as_bytes())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, MalformedObject> {
        let mode = reader.read_u32::<NetworkEndian>()?;
        let mode = EntryMode::from_u32(mode)
            .ok_or_else(|| MalformedObject::new(format!("invalid entry mode {mode:o}")))?;
        let size = reader.read_u64::<NetworkEndian>()?;

        let mut id = vec![0; reader.read_u8()? as usize];
        reader.read_exact(&mut id)?;
        let oid = ObjectId::from_bytes(&id).map_err(|e| MalformedObject::new(e.to_string()))?;

        let mut path = vec![0; reader.read_u16::<NetworkEndian>()? as usize];
        reader.read_exact(&mut path)?;
        let path = String::from_utf8(path)?;

        Ok(IndexEntry {
            path,
            oid,
            mode,
            size,
        })
    }
}

impl PartialOrd for IndexEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.path
            .cmp(&other.path)
            .then_with(|| self.oid.cmp(&other.oid))
            .then_with(|| self.mode.cmp(&other.mode))
            .then_with(|| self.size.cmp(&other.size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::index::entry_mode::FileMode;
    use crate::artifacts::objects::object_id::HashAlgorithm;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn oid() -> ObjectId {
        HashAlgorithm::Sha1.digest(b"test data")
    }

    #[rstest]
    fn parent_dirs_are_listed_outermost_first(oid: ObjectId) {
        let entry = IndexEntry::new("a/b/c".into(), oid, FileMode::Regular.into(), 0);

        assert_eq!(entry.parent_dirs(), vec!["a", "a/b"]);
        assert_eq!(entry.basename(), "c");
    }

    #[rstest]
    fn top_level_entries_have_no_parents(oid: ObjectId) {
        let entry = IndexEntry::new("a".into(), oid, FileMode::Regular.into(), 0);

        assert_eq!(entry.parent_dirs(), Vec::<&str>::new());
        assert_eq!(entry.basename(), "a");
    }

    #[rstest]
    fn binary_form_reads_back(oid: ObjectId) {
        let entry = IndexEntry::new("src/main.rs".into(), oid, FileMode::Executable.into(), 42);
        let mut bytes = Vec::new();
        entry.write_to(&mut bytes).unwrap();

        let read = IndexEntry::read_from(&mut bytes.as_slice()).unwrap();

        assert_eq!(read, entry);
    }

    #[test]
    fn truncated_entries_are_malformed() {
        let bytes = [0u8, 0, 0x81];

        assert!(IndexEntry::read_from(&mut &bytes[..]).is_err());
    }
}
