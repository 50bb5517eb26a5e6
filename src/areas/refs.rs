//! References (branches, HEAD, tags)
//!
//! This module manages references, the human-readable names pointing into the
//! object graph. References can be:
//! - Direct: containing an object id
//! - Symbolic: pointing to another reference (e.g., HEAD -> refs/heads/main)
//!
//! ## Storage
//!
//! Every reference is a loose file under the repository directory, named after
//! the reference (`HEAD`, `refs/heads/main`, ...). Files are replaced through a
//! temp file and a rename.
//!
//! ## Locking
//!
//! Readers take a shared lock and writers an exclusive lock on `refs.guard`, so
//! a multi-file change such as a rename is never observed half-done through
//! this API. Public methods lock; the `*_unlocked` helpers assume the caller
//! holds the guard.

use crate::artifacts::core::error::{Error, ErrorKind, Result};
use crate::artifacts::core::fsutil;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::refs::ref_name::RefName;
use crate::artifacts::refs::reference::{RefTarget, Reference};
use crate::artifacts::refs::{BranchFilter, BranchKind};
use file_guard::Lock;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Name of the lock file guarding every reference update
pub const REFS_GUARD: &str = "refs.guard";

/// Where a symbolic chain ends
#[derive(Debug, Clone, PartialEq, Eq)]
enum ChainEnd {
    /// Last name in the chain and the id it holds
    Resolved(RefName, ObjectId),
    /// The chain reached a name with no file (an unborn branch)
    Missing(RefName),
}

#[derive(Debug)]
pub struct Refs {
    /// Repository directory (typically `.grove`)
    path: Box<Path>,
}

impl Refs {
    pub fn new(path: Box<Path>) -> Self {
        Refs { path }
    }

    pub fn head_path(&self) -> PathBuf {
        self.path.join(RefName::head().as_str())
    }

    pub fn refs_path(&self) -> PathBuf {
        self.path.join("refs")
    }

    fn guard_path(&self) -> PathBuf {
        self.path.join(REFS_GUARD)
    }

    fn ref_path(&self, name: &RefName) -> PathBuf {
        self.path.join(name.as_str())
    }

    fn shared<T>(&self, operation: &'static str, f: impl FnOnce() -> Result<T>) -> Result<T> {
        fsutil::with_guard(operation, &self.guard_path(), Lock::Shared, f)
    }

    fn exclusive<T>(&self, operation: &'static str, f: impl FnOnce() -> Result<T>) -> Result<T> {
        fsutil::with_guard(operation, &self.guard_path(), Lock::Exclusive, f)
    }

    fn read_unlocked(&self, name: &RefName) -> Result<Option<RefTarget>> {
        let path = self.ref_path(name);
        if !path.is_file() {
            return Ok(None);
        }

        let content =
            std::fs::read_to_string(&path).map_err(Error::io("read_ref", path.display()))?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        RefTarget::parse(name, &content).map(Some)
    }

    fn write_unlocked(&self, name: &RefName, target: &RefTarget) -> Result<()> {
        let path = self.ref_path(name);
        fsutil::write_atomically("write_ref", &path, target.to_content().as_bytes())?;
        tracing::debug!(name = %name, target = %target, "updated reference");

        Ok(())
    }

    fn remove_unlocked(&self, name: &RefName) -> Result<()> {
        let path = self.ref_path(name);
        std::fs::remove_file(&path).map_err(Error::io_or_not_found("delete_ref", name))?;
        self.prune_empty_parent_dirs(&path)
    }

    /// Follow a symbolic chain from `name` until a direct reference or a missing name
    fn follow_unlocked(&self, operation: &'static str, name: &RefName) -> Result<ChainEnd> {
        let mut visited = HashSet::new();
        let mut current = name.clone();

        loop {
            if !visited.insert(current.clone()) {
                return Err(Error::ReferenceCycle {
                    operation,
                    name: current.to_string(),
                });
            }

            match self.read_unlocked(&current)? {
                Some(RefTarget::Direct(oid)) => return Ok(ChainEnd::Resolved(current, oid)),
                Some(RefTarget::Symbolic(next)) => current = next,
                None => return Ok(ChainEnd::Missing(current)),
            }
        }
    }

    fn resolve_unlocked(&self, operation: &'static str, name: &RefName) -> Result<ObjectId> {
        match self.follow_unlocked(operation, name)? {
            ChainEnd::Resolved(_, oid) => Ok(oid),
            ChainEnd::Missing(missing) if missing == *name => {
                Err(Error::not_found(operation, name))
            }
            ChainEnd::Missing(missing) => Err(Error::DanglingReference {
                operation,
                name: name.to_string(),
                target: missing.to_string(),
            }),
        }
    }

    pub fn exists(&self, name: &RefName) -> Result<bool> {
        self.shared("ref_exists", || Ok(self.read_unlocked(name)?.is_some()))
    }

    /// Read a reference without following it
    pub fn lookup(&self, name: &RefName) -> Result<Reference> {
        self.shared("lookup_ref", || {
            self.read_unlocked(name)?
                .map(|target| Reference::new(name.clone(), target))
                .ok_or_else(|| Error::not_found("lookup_ref", name))
        })
    }

    /// Follow a reference to the object it ultimately names
    ///
    /// `NotFound` when `name` itself is absent, `DanglingReference` when a later
    /// link is absent and `ReferenceCycle` when the chain revisits a name.
    pub fn resolve(&self, name: &RefName) -> Result<ObjectId> {
        self.shared("resolve_ref", || self.resolve_unlocked("resolve_ref", name))
    }

    /// Create or, with `force`, overwrite a reference
    #[tracing::instrument(level = "debug", skip(self, target))]
    pub fn create(&self, name: &RefName, target: RefTarget, force: bool) -> Result<Reference> {
        self.exclusive("create_ref", || {
            if !force && self.read_unlocked(name)?.is_some() {
                return Err(Error::already_exists("create_ref", name));
            }
            if RefTarget::Symbolic(name.clone()) == target {
                return Err(Error::ReferenceCycle {
                    operation: "create_ref",
                    name: name.to_string(),
                });
            }

            self.write_unlocked(name, &target)?;
            Ok(Reference::new(name.clone(), target))
        })
    }

    /// Delete a reference, returning what it pointed to
    pub fn delete(&self, name: &RefName) -> Result<Reference> {
        self.exclusive("delete_ref", || {
            let target = self
                .read_unlocked(name)?
                .ok_or_else(|| Error::not_found("delete_ref", name))?;
            self.remove_unlocked(name)?;
            tracing::debug!(name = %name, "deleted reference");

            Ok(Reference::new(name.clone(), target))
        })
    }

    /// Move a reference to a new name, keeping its target
    ///
    /// A symbolic HEAD pointing at `old` follows the rename.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn rename(&self, old: &RefName, new: &RefName, force: bool) -> Result<Reference> {
        self.exclusive("rename_ref", || {
            let target = self
                .read_unlocked(old)?
                .ok_or_else(|| Error::not_found("rename_ref", old))?;
            if old == new {
                return Ok(Reference::new(new.clone(), target));
            }
            if !force && self.read_unlocked(new)?.is_some() {
                return Err(Error::already_exists("rename_ref", new));
            }

            // the old file goes first so `a` can become `a/b`
            self.remove_unlocked(old)?;
            if let Err(error) = self.write_unlocked(new, &target) {
                self.write_unlocked(old, &target)?;
                return Err(error);
            }

            let head = RefName::head();
            if let Some(RefTarget::Symbolic(head_target)) = self.read_unlocked(&head)?
                && head_target == *old
            {
                self.write_unlocked(&head, &RefTarget::Symbolic(new.clone()))?;
            }

            Ok(Reference::new(new.clone(), target))
        })
    }

    /// Branches of the selected kinds, sorted by name
    pub fn list(&self, filter: BranchFilter) -> Result<Vec<Reference>> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|reference| {
                reference
                    .name()
                    .branch_kind()
                    .is_some_and(|kind: BranchKind| filter.includes(kind))
            })
            .collect())
    }

    /// Every reference under `refs/`, sorted by name
    pub fn list_all(&self) -> Result<Vec<Reference>> {
        self.shared("list_refs", || {
            let mut references = Vec::new();
            if !self.refs_path().is_dir() {
                return Ok(references);
            }

            for entry in WalkDir::new(self.refs_path()).sort_by_file_name() {
                let entry = entry.map_err(|e| {
                    let target = e
                        .path()
                        .map(|path| path.display().to_string())
                        .unwrap_or_default();
                    Error::io("list_refs", target)(std::io::Error::other(e))
                })?;
                if !entry.file_type().is_file() {
                    continue;
                }

                let Ok(relative) = entry.path().strip_prefix(self.path.as_ref()) else {
                    continue;
                };
                let name = relative
                    .components()
                    .map(|component| component.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                // temp files of in-flight writes are not valid names
                let Ok(name) = RefName::try_parse(name) else {
                    continue;
                };

                if let Some(target) = self.read_unlocked(&name)? {
                    references.push(Reference::new(name, target));
                }
            }
            references.sort_by(|a, b| a.name().cmp(b.name()));

            Ok(references)
        })
    }

    pub fn head(&self) -> Result<Reference> {
        self.lookup(&RefName::head())
    }

    /// Object HEAD resolves to; `None` when HEAD points at an unborn branch
    pub fn read_head(&self) -> Result<Option<ObjectId>> {
        self.shared("read_head", || {
            match self.follow_unlocked("read_head", &RefName::head())? {
                ChainEnd::Resolved(_, oid) => Ok(Some(oid)),
                ChainEnd::Missing(_) => Ok(None),
            }
        })
    }

    /// Final name in HEAD's symbolic chain (`HEAD` itself when detached)
    pub fn current_ref(&self) -> Result<RefName> {
        self.shared("current_ref", || {
            match self.follow_unlocked("current_ref", &RefName::head())? {
                ChainEnd::Resolved(name, _) | ChainEnd::Missing(name) => Ok(name),
            }
        })
    }

    pub fn is_head_detached(&self) -> Result<bool> {
        Ok(matches!(self.head()?.target(), RefTarget::Direct(_)))
    }

    /// Whether `name` is what HEAD refers to
    ///
    /// With a symbolic HEAD the final name reached from HEAD is compared; with a
    /// detached HEAD the resolved ids are.
    pub fn is_head(&self, name: &RefName) -> Result<bool> {
        self.shared("is_head", || {
            let head = RefName::head();
            match self.read_unlocked(&head)? {
                Some(RefTarget::Symbolic(_)) => match self.follow_unlocked("is_head", &head)? {
                    ChainEnd::Resolved(current, _) | ChainEnd::Missing(current) => {
                        Ok(current == *name)
                    }
                },
                Some(RefTarget::Direct(head_oid)) => {
                    match self.resolve_unlocked("is_head", name) {
                        Ok(oid) => Ok(oid == head_oid),
                        Err(error) if error.kind() == ErrorKind::NotFound => Ok(false),
                        Err(error) => Err(error),
                    }
                }
                None => Err(Error::not_found("is_head", head)),
            }
        })
    }

    /// Point HEAD at a reference
    pub fn set_head(&self, name: &RefName) -> Result<()> {
        if name.is_head() {
            return Err(Error::invalid_argument(
                "set_head",
                name,
                "HEAD cannot point to itself",
            ));
        }

        self.exclusive("set_head", || {
            self.write_unlocked(&RefName::head(), &RefTarget::Symbolic(name.clone()))
        })
    }

    /// Detach HEAD at an object
    pub fn set_head_detached(&self, oid: ObjectId) -> Result<()> {
        self.exclusive("set_head_detached", || {
            self.write_unlocked(&RefName::head(), &RefTarget::Direct(oid))
        })
    }

    /// Advance whatever HEAD points at, creating an unborn branch
    pub fn update_head(&self, oid: ObjectId) -> Result<()> {
        self.exclusive("update_head", || {
            let name = match self.follow_unlocked("update_head", &RefName::head())? {
                ChainEnd::Resolved(name, _) | ChainEnd::Missing(name) => name,
            };
            self.write_unlocked(&name, &RefTarget::Direct(oid))
        })
    }

    /// Remove directories left empty by a deletion, stopping at the namespace roots
    fn prune_empty_parent_dirs(&self, path: &Path) -> Result<()> {
        let refs_path = self.refs_path();

        let mut current = path.parent();
        while let Some(parent) = current {
            let is_namespace_root = parent
                .strip_prefix(&refs_path)
                .map(|relative| relative.components().count() <= 1)
                .unwrap_or(true);
            if is_namespace_root {
                break;
            }

            let is_empty = parent
                .read_dir()
                .map_err(Error::io("delete_ref", parent.display()))?
                .next()
                .is_none();
            if !is_empty {
                break;
            }

            std::fs::remove_dir(parent).map_err(Error::io("delete_ref", parent.display()))?;
            current = parent.parent();
        }

        Ok(())
    }
}
