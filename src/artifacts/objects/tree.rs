//! Tree object
//!
//! Trees represent directory snapshots. They contain entries for files (blobs),
//! subdirectories (other trees) and submodule commits, along with their names
//! and modes. Children are referenced by id only.
//!
//! ## Format
//!
//! On disk: `tree <size>\0<entries>`
//! Each entry: `<mode> <name>\0<binary object id>`
//!
//! Entries are kept in canonical order: byte order of the name, where a
//! directory compares as if its name ended in `/`.
//!
//! ## Tree Building
//!
//! Trees are built from the flat list of index entries. Nested trees are
//! written children first, since a parent needs its children's ids.

use crate::artifacts::core::error::{Error, Result};
use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::object::{MalformedObject, Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::{HashAlgorithm, ObjectId};
use crate::artifacts::objects::object_type::ObjectType;
use bytes::Bytes;
use derive_new::new;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};

/// Named entry of a tree
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct TreeEntry {
    name: String,
    mode: EntryMode,
    oid: ObjectId,
}

impl TreeEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> EntryMode {
        self.mode
    }

    pub fn oid(&self) -> &ObjectId {
        &self.oid
    }

    /// Kind of the object the entry points to
    pub fn kind(&self) -> ObjectType {
        self.mode.object_type()
    }

    pub fn is_tree(&self) -> bool {
        self.mode == EntryMode::Directory
    }

    /// Canonical ordering between entries of the same tree
    fn canonical_cmp(&self, other: &Self) -> Ordering {
        let suffix = |entry: &TreeEntry| if entry.is_tree() { &b"/"[..] } else { &b""[..] };

        self.name
            .as_bytes()
            .iter()
            .chain(suffix(self))
            .cmp(other.name.as_bytes().iter().chain(suffix(other)))
    }
}

/// Directory snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// Create a tree, putting the entries into canonical order
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort_by(TreeEntry::canonical_cmp);
        Tree { entries }
    }

    /// Build and store the nested trees described by a flat list of index entries
    ///
    /// `store` is called once per tree, children before parents, and must return
    /// the id the tree was stored under.
    ///
    /// # Returns
    ///
    /// The id of the root tree
    pub fn build<'e, F>(entries: impl IntoIterator<Item = &'e IndexEntry>, store: &mut F) -> Result<ObjectId>
    where
        F: FnMut(&Tree) -> Result<ObjectId>,
    {
        let mut root = TreeNode::default();
        for entry in entries {
            root.insert(entry.path(), entry)?;
        }

        root.write(store)
    }

    pub fn entries(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.iter()
    }

    pub fn entry(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Directory under construction
#[derive(Debug, Default)]
struct TreeNode {
    files: BTreeMap<String, (EntryMode, ObjectId)>,
    directories: BTreeMap<String, TreeNode>,
}

impl TreeNode {
    fn insert(&mut self, path: &str, entry: &IndexEntry) -> Result<()> {
        match path.split_once('/') {
            Some((directory, rest)) if !directory.is_empty() => self
                .directories
                .entry(directory.to_string())
                .or_default()
                .insert(rest, entry),
            None if !path.is_empty() => {
                self.files
                    .insert(path.to_string(), (entry.mode(), *entry.oid()));
                Ok(())
            }
            _ => Err(Error::invalid_argument(
                "tree_build",
                entry.path(),
                "empty path component",
            )),
        }
    }

    fn write<F>(&self, store: &mut F) -> Result<ObjectId>
    where
        F: FnMut(&Tree) -> Result<ObjectId>,
    {
        let mut entries = Vec::with_capacity(self.files.len() + self.directories.len());

        for (name, directory) in &self.directories {
            let oid = directory.write(store)?;
            entries.push(TreeEntry::new(name.clone(), EntryMode::Directory, oid));
        }
        for (name, (mode, oid)) in &self.files {
            entries.push(TreeEntry::new(name.clone(), *mode, *oid));
        }

        store(&Tree::new(entries))
    }
}

impl Packable for Tree {
    fn serialize(&self) -> Bytes {
        let mut content = Vec::new();

        for entry in &self.entries {
            // writing into a Vec cannot fail
            let _ = write!(content, "{:o} {}", entry.mode.as_u32(), entry.name);
            content.push(0);
            content.extend_from_slice(entry.oid.as_bytes());
        }

        Bytes::from(content)
    }
}

impl Unpackable for Tree {
    fn deserialize(mut reader: impl BufRead, algorithm: HashAlgorithm) -> std::result::Result<Self, MalformedObject> {
        let mut entries = Vec::new();

        // Reuse scratch buffers to reduce allocs
        let mut mode_bytes = Vec::new();
        let mut name_bytes = Vec::new();

        loop {
            mode_bytes.clear();
            // Read "mode " (space-delimited)
            let n = reader.read_until(b' ', &mut mode_bytes)?;
            if n == 0 {
                break; // clean EOF: no more entries
            }
            if mode_bytes.pop() != Some(b' ') {
                return Err(MalformedObject::new("unexpected EOF in mode".into()));
            }

            let mode_str = std::str::from_utf8(&mode_bytes)
                .map_err(|_| MalformedObject::new("non-UTF-8 tree entry mode".into()))?;
            let mode = EntryMode::from_octal_str(mode_str)
                .ok_or_else(|| MalformedObject::new(format!("invalid entry mode '{mode_str}'")))?;

            // Read "name\0"
            name_bytes.clear();
            reader.read_until(b'\0', &mut name_bytes)?;
            if name_bytes.pop() != Some(b'\0') {
                return Err(MalformedObject::new("unexpected EOF in name".into()));
            }
            let name = String::from_utf8(name_bytes.clone())?;
            if name.is_empty() || name.contains('/') {
                return Err(MalformedObject::new(format!("invalid entry name '{name}'")));
            }

            let oid = ObjectId::read_from(&mut reader, algorithm)
                .map_err(|_| MalformedObject::new("unexpected EOF in object id".into()))?;

            entries.push(TreeEntry::new(name, mode, oid));
        }

        Ok(Tree::new(entries))
    }
}

impl Object for Tree {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }

    fn display(&self) -> String {
        self.entries
            .iter()
            .map(|entry| {
                format!(
                    "{:0>6} {} {}\t{}",
                    entry.mode.as_str(),
                    entry.kind(),
                    entry.oid,
                    entry.name
                )
            })
            .collect::<Vec<String>>()
            .join("\n")
    }
}
