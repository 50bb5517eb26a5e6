//! Index (staging area)
//!
//! The index tracks which paths, with which content and mode, are included in
//! the next commit.
//!
//! ## Index File Format
//!
//! - Header: signature, version and entry count
//! - Entries: sorted by path
//! - Checksum: SHA-1 of everything before it
//!
//! ## Data Structures
//!
//! - `entries`: maps paths to their index entries
//! - `children`: maps directory paths to the entries below them, so a file
//!   replacing a directory (or the reverse) drops the conflicting entries
//!
//! ## Locking
//!
//! Reads take a shared lock and updates an exclusive lock on `index.guard`.
//! An update works on a copy of the entries, which replaces the index file and
//! the in-memory state only if every step succeeded.

use crate::artifacts::core::error::{Error, Result};
use crate::artifacts::core::fsutil;
use crate::artifacts::index::checksum::Checksum;
use crate::artifacts::index::index_entry::{IndexEntry, MAX_PATH_SIZE};
use crate::artifacts::index::{SIGNATURE, VERSION};
use byteorder::{NetworkEndian, ReadBytesExt, WriteBytesExt};
use file_guard::Lock;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Name of the lock file guarding index updates
pub const INDEX_GUARD: &str = "index.guard";

#[derive(Debug, Clone)]
pub struct Index {
    /// Path to the index file (typically `.grove/index`)
    path: Box<Path>,
    /// Staged files by path
    entries: BTreeMap<String, IndexEntry>,
    /// Directory hierarchy for parent-child lookups
    children: BTreeMap<String, BTreeSet<String>>,
    /// Whether the entries differ from the file on disk
    changed: bool,
}

impl Index {
    /// Create an empty index backed by `path`; call [`Index::load`] to read it
    pub fn new(path: Box<Path>) -> Self {
        Index {
            path,
            entries: BTreeMap::new(),
            children: BTreeMap::new(),
            changed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard_path(&self) -> PathBuf {
        self.path.with_file_name(INDEX_GUARD)
    }

    pub fn entry_by_path(&self, path: &str) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Whether `path` is a staged file or a directory containing staged files
    pub fn is_tracked(&self, path: &str) -> bool {
        self.entries.contains_key(path) || self.children.contains_key(path)
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.children.clear();
        self.changed = false;
    }

    /// Reload the index from disk
    ///
    /// A missing or empty file is an empty index. A checksum mismatch or a
    /// malformed entry is reported as a corrupt index.
    pub fn load(&mut self) -> Result<()> {
        fsutil::with_guard("load_index", &self.guard_path(), Lock::Shared, || {
            self.load_unlocked()
        })
    }

    fn load_unlocked(&mut self) -> Result<()> {
        self.clear();

        let data = match std::fs::read(&self.path) {
            Ok(data) => data,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(error) => return Err(Error::io("load_index", self.path.display())(error)),
        };
        if data.is_empty() {
            return Ok(());
        }

        let mut reader = Checksum::new(data.as_slice());
        let entries = Self::parse(&mut reader)
            .map_err(|e| Error::corrupt("load_index", self.path.display(), e))?;
        let valid = reader
            .verify()
            .map_err(|e| Error::corrupt("load_index", self.path.display(), e))?;
        if !valid {
            return Err(Error::corrupt(
                "load_index",
                self.path.display(),
                "checksum does not match value stored on disk",
            ));
        }

        for entry in entries {
            self.store_entry(entry);
        }
        self.changed = false;
        tracing::trace!(entries = self.entries.len(), "loaded index");

        Ok(())
    }

    fn parse<R: Read>(reader: &mut R) -> std::result::Result<Vec<IndexEntry>, String> {
        let mut signature = [0u8; 4];
        reader
            .read_exact(&mut signature)
            .map_err(|e| e.to_string())?;
        if &signature != SIGNATURE {
            return Err("invalid index file signature".to_string());
        }

        let version = reader
            .read_u32::<NetworkEndian>()
            .map_err(|e| e.to_string())?;
        if version != VERSION {
            return Err(format!("unsupported index file version: {version}"));
        }

        let count = reader
            .read_u32::<NetworkEndian>()
            .map_err(|e| e.to_string())?;
        (0..count)
            .map(|_| IndexEntry::read_from(reader).map_err(|e| e.to_string()))
            .collect()
    }

    /// Encode the whole index file, checksum included
    pub fn serialize(&self) -> std::io::Result<Vec<u8>> {
        let mut writer = Checksum::new(Vec::new());

        writer.write_all(SIGNATURE)?;
        writer.write_u32::<NetworkEndian>(VERSION)?;
        writer.write_u32::<NetworkEndian>(self.entries.len() as u32)?;
        for entry in self.entries.values() {
            entry.write_to(&mut writer)?;
        }
        writer.write_checksum()?;

        Ok(writer.into_inner())
    }

    fn write_unlocked(&mut self) -> Result<()> {
        let data = self
            .serialize()
            .map_err(Error::io("write_index", self.path.display()))?;
        fsutil::write_atomically("write_index", &self.path, &data)?;
        self.changed = false;
        tracing::debug!(entries = self.entries.len(), "wrote index");

        Ok(())
    }

    /// Apply `f` to a fresh copy of the index and persist it
    ///
    /// The file and `self` are left untouched when `f` or the write fails.
    pub fn update<T>(&mut self, f: impl FnOnce(&mut Index) -> Result<T>) -> Result<T> {
        let guard = self.guard_path();
        fsutil::with_guard("update_index", &guard, Lock::Exclusive, || {
            let mut shadow = Index::new(self.path.clone());
            shadow.load_unlocked()?;

            let value = f(&mut shadow)?;
            if shadow.changed {
                shadow.write_unlocked()?;
            }

            *self = shadow;
            Ok(value)
        })
    }

    fn store_entry(&mut self, entry: IndexEntry) {
        for parent in entry.parent_dirs() {
            self.children
                .entry(parent.to_string())
                .or_default()
                .insert(entry.path().to_string());
        }
        self.entries.insert(entry.path().to_string(), entry);
    }

    fn remove_entry(&mut self, path: &str) -> bool {
        let Some(entry) = self.entries.remove(path) else {
            return false;
        };

        for parent in entry.parent_dirs() {
            if let Some(children) = self.children.get_mut(parent) {
                children.remove(path);
                if children.is_empty() {
                    self.children.remove(parent);
                }
            }
        }

        true
    }

    fn remove_children(&mut self, path: &str) -> bool {
        match self.children.remove(path) {
            Some(children) => {
                for child in children {
                    self.remove_entry(&child);
                }
                true
            }
            None => false,
        }
    }

    /// Stage an entry, replacing any entry at the same path
    ///
    /// Files at the entry's parent directories and entries below its path are
    /// dropped, since a path cannot be both a file and a directory.
    /// Stage an entry, replacing any file or directory in its way
    ///
    /// Fails with `InvalidArgument` when the path does not fit the index format.
    pub fn add(&mut self, entry: IndexEntry) -> Result<()> {
        if entry.path().len() > MAX_PATH_SIZE {
            return Err(Error::invalid_argument(
                "add_to_index",
                format!("{}...", entry.path().chars().take(32).collect::<String>()),
                format!("path is longer than {MAX_PATH_SIZE} bytes"),
            ));
        }
        if self.entries.get(entry.path()) == Some(&entry) {
            return Ok(());
        }

        for parent in entry.parent_dirs() {
            self.remove_entry(parent);
        }
        self.remove_children(entry.path());
        self.store_entry(entry);
        self.changed = true;
        Ok(())
    }

    /// Unstage a path, or everything below it when it names a directory
    ///
    /// # Returns
    ///
    /// Whether anything was removed
    pub fn remove(&mut self, path: &str) -> bool {
        let removed = self.remove_entry(path) | self.remove_children(path);
        self.changed |= removed;
        removed
    }
}
