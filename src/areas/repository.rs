//! Repository handle
//!
//! A [`Repository`] owns one object database, one reference store, one index
//! and one configuration, and coordinates every operation that touches more
//! than one of them (staging, committing, branching, tagging).
//!
//! ## Layout
//!
//! ```text
//! <workdir>/
//!   .grove/
//!     HEAD            ref: refs/heads/main
//!     config.toml     local configuration
//!     index           staging area
//!     objects/        compressed objects, fanned out by the first id byte
//!     refs/heads/     local branches
//!     refs/remotes/   remote-tracking branches
//!     refs/tags/      tags
//! ```

use crate::areas::config::{Config, CoreSection};
use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::refs::Refs;
use crate::areas::workspace::Workspace;
use crate::artifacts::core::error::{Error, ErrorKind, Result};
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::index::pathspec::PathspecSet;
use crate::artifacts::log::rev_walk::{RevWalk, SortMode, WalkEntry};
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::ObjectBox;
use crate::artifacts::objects::object_id::{HashAlgorithm, ObjectId};
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::signature::Signature;
use crate::artifacts::objects::tag::Tag;
use crate::artifacts::objects::tree::Tree;
use crate::artifacts::refs::branch::{Branch, Upstream};
use crate::artifacts::refs::ref_name::{BranchName, RefName};
use crate::artifacts::refs::reference::{RefTarget, Reference};
use crate::artifacts::refs::{BranchFilter, BranchKind, DEFAULT_BRANCH, HEADS_PREFIX};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Name of the repository directory inside the working tree
pub const REPOSITORY_DIR: &str = ".grove";

/// Shortest abbreviated id accepted by [`Repository::lookup`]
pub const MIN_PREFIX_LENGTH: usize = 4;

pub const AUTHOR_NAME_ENV: &str = "GROVE_AUTHOR_NAME";
pub const AUTHOR_EMAIL_ENV: &str = "GROVE_AUTHOR_EMAIL";
pub const AUTHOR_DATE_ENV: &str = "GROVE_AUTHOR_DATE";

/// Author of one commit in a walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contribution {
    pub when: i64,
    pub name: String,
    pub email: String,
}

/// A blob as seen from one commit's tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReachableBlob {
    pub oid: ObjectId,
    /// Directory of the blob inside the tree, `""` at the root, else ending in `/`
    pub path: String,
    pub name: String,
    pub size: usize,
    pub commit: ObjectId,
    pub author: String,
    /// Author time in seconds since the epoch
    pub when: i64,
}

pub struct Repository {
    workdir: Box<Path>,
    git_dir: Box<Path>,
    database: Database,
    refs: Refs,
    workspace: Workspace,
    index: RefCell<Index>,
    config: RefCell<Config>,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("workdir", &self.workdir)
            .field("algorithm", &self.database.algorithm())
            .finish()
    }
}

impl Repository {
    /// Create an empty repository in `path`, creating the directory if needed
    ///
    /// HEAD points at the unborn `main` branch and `core.hash` records the
    /// algorithm every object id of the repository uses.
    #[tracing::instrument]
    pub fn init(path: &Path, algorithm: HashAlgorithm) -> Result<Self> {
        std::fs::create_dir_all(path).map_err(Error::io("init", path.display()))?;
        let workdir = path
            .canonicalize()
            .map_err(Error::io("init", path.display()))?;
        let git_dir = workdir.join(REPOSITORY_DIR);

        if git_dir.join("HEAD").exists() {
            return Err(Error::already_exists("init", git_dir.display()));
        }

        for dir in ["objects", "refs/heads", "refs/tags", "refs/remotes"] {
            let dir = git_dir.join(dir);
            std::fs::create_dir_all(&dir).map_err(Error::io("init", dir.display()))?;
        }

        let mut config = Config::load(&git_dir)?;
        config.init_core(CoreSection { hash: algorithm })?;

        let refs = Refs::new(git_dir.clone().into_boxed_path());
        refs.set_head(&BranchName::try_parse(DEFAULT_BRANCH)?.to_ref_name(BranchKind::Local))?;
        tracing::info!(path = %git_dir.display(), %algorithm, "initialized repository");

        Self::open(&workdir)
    }

    /// Open the repository whose working tree is `path`
    pub fn open(path: &Path) -> Result<Self> {
        let workdir = path
            .canonicalize()
            .map_err(Error::io_or_not_found("open", path.display()))?;
        let git_dir = workdir.join(REPOSITORY_DIR);
        if !git_dir.join("HEAD").is_file() {
            return Err(Error::not_found("open", git_dir.display()));
        }

        let config = Config::load(&git_dir)?;
        let algorithm = config.core()?.hash;

        Ok(Repository {
            database: Database::new(git_dir.join("objects").into_boxed_path(), algorithm),
            refs: Refs::new(git_dir.clone().into_boxed_path()),
            workspace: Workspace::new(workdir.clone().into_boxed_path()),
            index: RefCell::new(Index::new(git_dir.join("index").into_boxed_path())),
            config: RefCell::new(config),
            workdir: workdir.into_boxed_path(),
            git_dir: git_dir.into_boxed_path(),
        })
    }

    /// Open the repository containing `path`, looking through its ancestors
    pub fn discover(path: &Path) -> Result<Self> {
        let start = path
            .canonicalize()
            .map_err(Error::io_or_not_found("discover", path.display()))?;

        start
            .ancestors()
            .find(|dir| Self::can_open(dir))
            .ok_or_else(|| Error::not_found("discover", path.display()))
            .and_then(Self::open)
    }

    pub fn can_open(path: &Path) -> bool {
        path.join(REPOSITORY_DIR).join("HEAD").is_file()
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn index(&self) -> Ref<'_, Index> {
        self.index.borrow()
    }

    pub fn config(&self) -> Ref<'_, Config> {
        self.config.borrow()
    }

    pub fn config_mut(&self) -> RefMut<'_, Config> {
        self.config.borrow_mut()
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.database.algorithm()
    }

    /// No commit on HEAD and no references at all
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.refs.read_head()?.is_none() && self.refs.list_all()?.is_empty())
    }

    pub fn head(&self) -> Result<Reference> {
        self.refs.head()
    }

    pub fn is_head_detached(&self) -> Result<bool> {
        self.refs.is_head_detached()
    }

    /// Point HEAD at a reference, e.g. `refs/heads/topic`
    pub fn set_head(&self, name: &str) -> Result<()> {
        let name = RefName::try_parse(name)?;
        if name.branch_kind() == Some(BranchKind::Local) || self.refs.exists(&name)? {
            self.refs.set_head(&name)
        } else {
            Err(Error::not_found("set_head", name))
        }
    }

    /// Detach HEAD at a commit
    pub fn set_head_detached(&self, oid: ObjectId) -> Result<()> {
        self.database.read_commit(&oid)?;
        self.refs.set_head_detached(oid)
    }

    /// Reload the index from disk
    pub fn load_index(&self) -> Result<()> {
        self.index.borrow_mut().load()
    }

    /// Stage every working-tree file matching any of `patterns`
    ///
    /// Tracked paths that match but no longer exist on disk are unstaged. The
    /// index file is only replaced when every file was staged.
    #[tracing::instrument(skip(self))]
    pub fn add_all<S: AsRef<str> + std::fmt::Debug>(&self, patterns: &[S]) -> Result<()> {
        let pathspecs = PathspecSet::parse(patterns)?;
        let files = self.workspace.list_files()?;

        self.index.borrow_mut().update(|index| {
            for path in files.iter().filter(|path| pathspecs.matches(path)) {
                let data = self.workspace.read_file(path)?;
                let stat = self.workspace.stat_file(path)?;
                let oid = self.database.write(ObjectType::Blob, &data)?;

                index.add(IndexEntry::new(path.clone(), oid, stat.mode, stat.size))?;
            }

            let on_disk = |path: &str| files.binary_search_by(|file| file.as_str().cmp(path)).is_ok();
            let deleted = index
                .entries()
                .map(IndexEntry::path)
                .filter(|path| pathspecs.matches(path) && !on_disk(path))
                .map(str::to_string)
                .collect::<Vec<_>>();
            for path in deleted {
                index.remove(&path);
            }

            tracing::debug!(entries = index.len(), "staged files");
            Ok(())
        })
    }

    /// Unstage exact paths; absent paths are ignored
    pub fn remove_by_path<S: AsRef<str>>(&self, paths: &[S]) -> Result<()> {
        let paths = paths
            .iter()
            .map(|path| self.workspace.normalize(path.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        self.index.borrow_mut().update(|index| {
            for path in &paths {
                if !index.remove(path) {
                    tracing::debug!(path, "path not staged");
                }
            }
            Ok(())
        })
    }

    /// Store the staged entries as trees; returns the root tree id
    pub fn write_tree(&self) -> Result<ObjectId> {
        let mut index = self.index.borrow_mut();
        index.load()?;

        Tree::build(index.entries(), &mut |tree: &Tree| self.database.store(tree))
    }

    /// Default signature from `GROVE_AUTHOR_*` or the `user` config section
    pub fn signature(&self) -> Result<Signature> {
        let config = self.config.borrow();
        let name = match std::env::var(AUTHOR_NAME_ENV) {
            Ok(name) => name,
            Err(_) => config
                .user_name()?
                .ok_or_else(|| Error::not_found("signature", "user.name"))?,
        };
        let email = match std::env::var(AUTHOR_EMAIL_ENV) {
            Ok(email) => email,
            Err(_) => config
                .user_email()?
                .ok_or_else(|| Error::not_found("signature", "user.email"))?,
        };

        match std::env::var(AUTHOR_DATE_ENV) {
            Ok(date) => {
                let when = chrono::DateTime::parse_from_rfc2822(&date)
                    .or_else(|_| chrono::DateTime::parse_from_str(&date, "%Y-%m-%d %H:%M:%S %z"))
                    .map_err(|e| Error::invalid_argument("signature", &date, e))?;
                Ok(Signature::from_datetime(name, email, when))
            }
            Err(_) => Ok(Signature::now(name, email)),
        }
    }

    /// Store a commit object without moving any reference
    pub fn create_commit(
        &self,
        tree: ObjectId,
        parents: Vec<ObjectId>,
        author: Signature,
        committer: Signature,
        message: &str,
    ) -> Result<ObjectId> {
        author.validate()?;
        committer.validate()?;
        self.database.read_tree(&tree)?;
        for parent in &parents {
            self.database.read_commit(parent)?;
        }

        let commit = Commit::new(tree, parents, author, committer, message.to_string());
        self.database.store(&commit)
    }

    /// Commit the index on top of HEAD and advance the current branch
    ///
    /// Fails with `InvalidArgument` when the staged tree equals the parent's
    /// tree (or the index is empty on an unborn branch).
    #[tracing::instrument(skip(self, author, committer))]
    pub fn commit(
        &self,
        message: &str,
        author: Signature,
        committer: Signature,
    ) -> Result<ObjectId> {
        let tree = self.write_tree()?;
        let parent = self.refs.read_head()?;

        let unchanged = match &parent {
            Some(parent) => self.database.read_commit(parent)?.tree_oid() == &tree,
            None => self.index.borrow().is_empty(),
        };
        if unchanged {
            return Err(Error::invalid_argument(
                "commit",
                message.lines().next().unwrap_or_default(),
                "nothing added to commit",
            ));
        }

        let oid = self.create_commit(tree, parent.into_iter().collect(), author, committer, message)?;
        self.refs.update_head(oid)?;
        tracing::debug!(%oid, "created commit");

        Ok(oid)
    }

    /// Resolve a full or abbreviated hex id and read the object
    ///
    /// An abbreviation matching several objects is an `InvalidArgument`.
    pub fn lookup(&self, id: &str) -> Result<(ObjectId, ObjectBox)> {
        if id.len() == self.algorithm().hex_len() {
            let oid = ObjectId::try_parse(id)?;
            return Ok((oid, self.database.read(&oid)?));
        }
        if id.len() < MIN_PREFIX_LENGTH {
            return Err(Error::invalid_argument(
                "lookup",
                id,
                format!("abbreviated ids need at least {MIN_PREFIX_LENGTH} characters"),
            ));
        }

        match self.database.find_by_prefix(id)?.as_slice() {
            [] => Err(Error::not_found("lookup", id)),
            [oid] => Ok((*oid, self.database.read(oid)?)),
            candidates => Err(Error::invalid_argument(
                "lookup",
                id,
                format!("ambiguous, matches {} objects", candidates.len()),
            )),
        }
    }

    /// Resolve a revision: a reference name, a branch or tag short name, or an id
    ///
    /// Annotated tags are peeled to their target.
    pub fn rev_parse(&self, revision: &str) -> Result<ObjectId> {
        self.peel(self.resolve_revision(revision)?)
    }

    /// Like [`Repository::rev_parse`], without peeling tags
    pub fn resolve_revision(&self, revision: &str) -> Result<ObjectId> {
        let candidates = [
            revision.to_string(),
            format!("refs/{revision}"),
            format!("{HEADS_PREFIX}{revision}"),
            format!("refs/tags/{revision}"),
            format!("refs/remotes/{revision}"),
        ];
        for candidate in candidates {
            let Ok(name) = RefName::try_parse(candidate) else {
                continue;
            };
            match self.refs.resolve(&name) {
                Ok(oid) => return Ok(oid),
                Err(error) if error.kind() == ErrorKind::NotFound => continue,
                Err(error) => return Err(error),
            }
        }

        match self.lookup(revision) {
            Ok((oid, _)) => Ok(oid),
            Err(error) if error.kind() == ErrorKind::InvalidArgument => {
                Err(Error::not_found("rev_parse", revision))
            }
            Err(error) => Err(error),
        }
    }

    fn peel(&self, mut oid: ObjectId) -> Result<ObjectId> {
        while self.database.read_type(&oid)? == ObjectType::Tag {
            oid = *self.database.read_tag(&oid)?.target();
        }
        Ok(oid)
    }

    /// Store a working-tree file as a blob
    pub fn blob_create_from_workdir(&self, relative: &str) -> Result<ObjectId> {
        let relative = self.workspace.normalize(relative)?;
        let data = self.workspace.read_file(&relative)?;

        self.database.write(ObjectType::Blob, &data)
    }

    /// Store any file on disk as a blob
    pub fn blob_create_from_disk(&self, path: &Path) -> Result<ObjectId> {
        let data =
            std::fs::read(path).map_err(Error::io_or_not_found("blob_create", path.display()))?;

        self.database.write(ObjectType::Blob, &data)
    }

    pub fn rev_walk(&self) -> RevWalk<'_> {
        RevWalk::new(&self.database)
    }

    /// Commits reachable from `from`, itself included
    fn reachable(&self, from: &ObjectId) -> Result<HashSet<ObjectId>> {
        let mut walk = self.rev_walk();
        walk.push(*from)?;

        walk.map(|entry| entry.map(|entry| entry.oid)).collect()
    }

    /// Commits unique to `local` and to `upstream`, as `(ahead, behind)`
    pub fn ahead_behind(&self, local: &ObjectId, upstream: &ObjectId) -> Result<(usize, usize)> {
        let local = self.reachable(local)?;
        let upstream = self.reachable(upstream)?;

        Ok((
            local.difference(&upstream).count(),
            upstream.difference(&local).count(),
        ))
    }

    /// Whether `ancestor` is reachable from `commit`; a commit does not
    /// descend from itself
    pub fn descendant_of(&self, commit: &ObjectId, ancestor: &ObjectId) -> Result<bool> {
        self.database.read_commit(ancestor)?;
        if commit == ancestor {
            return Ok(false);
        }

        let mut walk = self.rev_walk();
        walk.push(*commit)?;
        for entry in walk {
            if entry?.oid == *ancestor {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Every blob in the tree of every stored commit, one row per
    /// (commit, path), in commit id order
    pub fn blobs(&self) -> Result<Vec<ReachableBlob>> {
        let objects = self.database.list()?;
        let sizes = objects
            .iter()
            .map(|info| (info.oid, info.size))
            .collect::<HashMap<_, _>>();

        let mut blobs = Vec::new();
        for info in objects.iter().filter(|info| info.object_type == ObjectType::Commit) {
            let commit = self.database.read_commit(&info.oid)?;
            let mut pending = vec![(String::new(), *commit.tree_oid())];

            while let Some((path, tree_oid)) = pending.pop() {
                let tree = self.database.read_tree(&tree_oid)?;
                for entry in tree.entries() {
                    match entry.kind() {
                        ObjectType::Tree => {
                            pending.push((format!("{path}{}/", entry.name()), *entry.oid()))
                        }
                        ObjectType::Blob => blobs.push(ReachableBlob {
                            oid: *entry.oid(),
                            path: path.clone(),
                            name: entry.name().to_string(),
                            size: sizes.get(entry.oid()).copied().unwrap_or_default(),
                            commit: info.oid,
                            author: commit.author().name().to_string(),
                            when: commit.author().time(),
                        }),
                        _ => {}
                    }
                }
            }
        }

        Ok(blobs)
    }

    /// Commits reachable from HEAD; `max_count < 0` means all
    pub fn log(&self, sorting: SortMode, max_count: i64) -> Result<Vec<WalkEntry>> {
        let mut walk = self.rev_walk();
        walk.set_sorting(sorting)?;
        walk.set_max_count(max_count);
        walk.push_head(&self.refs)?;

        walk.collect()
    }

    /// Author time, name and email of every commit reachable from HEAD
    pub fn contributions(&self, sorting: SortMode) -> Result<Vec<Contribution>> {
        Ok(self
            .log(sorting, -1)?
            .into_iter()
            .map(|entry| {
                let author = entry.commit.author();
                Contribution {
                    when: author.time(),
                    name: author.name().to_string(),
                    email: author.email().to_string(),
                }
            })
            .collect())
    }

    fn branch(&self, name: RefName) -> Result<Branch> {
        let kind = name
            .branch_kind()
            .ok_or_else(|| Error::invalid_argument("branch", &name, "not a branch"))?;
        let target = self.refs.resolve(&name)?;
        let is_head = self.refs.is_head(&name)?;

        Ok(Branch::new(name, kind, target, is_head))
    }

    /// Create a local branch at a commit
    ///
    /// Forcing over the branch HEAD is attached to is refused.
    pub fn branch_create(&self, name: &str, target: &ObjectId, force: bool) -> Result<Branch> {
        let name = BranchName::try_parse(name)?.to_ref_name(BranchKind::Local);
        self.database.read_commit(target)?;

        if force
            && self.refs.exists(&name)?
            && self.refs.is_head(&name)?
            && !self.refs.is_head_detached()?
        {
            return Err(Error::invalid_argument(
                "branch_create",
                &name,
                "cannot force update the current HEAD branch",
            ));
        }

        self.refs.create(&name, RefTarget::Direct(*target), force)?;
        tracing::debug!(%name, %target, "created branch");

        self.branch(name)
    }

    /// Delete a branch; the branch HEAD is on cannot be deleted
    pub fn branch_delete(&self, name: &str, kind: BranchKind) -> Result<Reference> {
        let branch = BranchName::try_parse(name)?;
        let ref_name = branch.to_ref_name(kind);

        if !self.refs.exists(&ref_name)? {
            return Err(Error::not_found("branch_delete", ref_name));
        }
        if self.refs.is_head(&ref_name)? && !self.refs.is_head_detached()? {
            return Err(Error::invalid_argument(
                "branch_delete",
                ref_name,
                "cannot delete the current HEAD branch",
            ));
        }

        let deleted = self.refs.delete(&ref_name)?;
        if kind == BranchKind::Local {
            self.config.borrow_mut().unset_branch_upstream(branch.as_ref())?;
        }

        Ok(deleted)
    }

    /// Rename a local branch, carrying HEAD and upstream configuration along
    pub fn branch_rename(&self, old: &str, new: &str, force: bool) -> Result<Branch> {
        let old_branch = BranchName::try_parse(old)?;
        let new_branch = BranchName::try_parse(new)?;
        let old_name = old_branch.to_ref_name(BranchKind::Local);
        let new_name = new_branch.to_ref_name(BranchKind::Local);

        self.refs.rename(&old_name, &new_name, force)?;

        let upstream = self.config.borrow().branch_upstream(old_branch.as_ref())?;
        if let Some((remote, merge)) = upstream {
            let mut config = self.config.borrow_mut();
            config.unset_branch_upstream(old_branch.as_ref())?;
            config.set_branch_upstream(new_branch.as_ref(), &remote, &merge)?;
        }

        self.branch(new_name)
    }

    /// Branches matching `filter`, sorted by full name
    ///
    /// Symbolic branches whose chain is dangling or cyclic, such as a stale
    /// `refs/remotes/origin/HEAD`, are skipped.
    pub fn branch_list(&self, filter: BranchFilter) -> Result<Vec<Branch>> {
        let mut branches = Vec::new();
        for reference in self.refs.list(filter)? {
            match self.branch(reference.name().clone()) {
                Ok(branch) => branches.push(branch),
                Err(error)
                    if matches!(
                        error.kind(),
                        ErrorKind::DanglingReference | ErrorKind::ReferenceCycle
                    ) =>
                {
                    tracing::warn!(name = %reference.name(), %error, "skipping unresolvable branch");
                }
                Err(error) => return Err(error),
            }
        }

        Ok(branches)
    }

    pub fn branch_is_head(&self, name: &str, kind: BranchKind) -> Result<bool> {
        let name = BranchName::try_parse(name)?.to_ref_name(kind);
        if !self.refs.exists(&name)? {
            return Err(Error::not_found("branch_is_head", name));
        }

        self.refs.is_head(&name)
    }

    pub fn branch_target(&self, name: &str, kind: BranchKind) -> Result<ObjectId> {
        self.refs
            .resolve(&BranchName::try_parse(name)?.to_ref_name(kind))
    }

    /// Configured upstream of a local branch, if any
    pub fn branch_upstream(&self, name: &str) -> Result<Option<Upstream>> {
        let branch = BranchName::try_parse(name)?;

        self.config
            .borrow()
            .branch_upstream(branch.as_ref())?
            .map(|(remote, merge)| Ok(Upstream::new(remote, RefName::try_parse(merge)?)))
            .transpose()
    }

    /// Track `upstream` from a local branch, or stop tracking with `None`
    ///
    /// `upstream` is a remote-tracking branch (`origin/main`) or another local
    /// branch (`main`), and must exist.
    pub fn set_branch_upstream(&self, name: &str, upstream: Option<&str>) -> Result<()> {
        let branch = BranchName::try_parse(name)?;
        let local = branch.to_ref_name(BranchKind::Local);
        if !self.refs.exists(&local)? {
            return Err(Error::not_found("set_branch_upstream", local));
        }

        let Some(upstream) = upstream else {
            return self.config.borrow_mut().unset_branch_upstream(branch.as_ref());
        };

        let upstream_branch = BranchName::try_parse(upstream)?;
        let remote_ref = upstream_branch.to_ref_name(BranchKind::Remote);
        let local_ref = upstream_branch.to_ref_name(BranchKind::Local);

        let (remote, merge) = if self.refs.exists(&remote_ref)? {
            let (remote, merged) = upstream.split_once('/').ok_or_else(|| {
                Error::invalid_argument("set_branch_upstream", upstream, "expected <remote>/<branch>")
            })?;
            (remote.to_string(), format!("{HEADS_PREFIX}{merged}"))
        } else if self.refs.exists(&local_ref)? {
            (".".to_string(), local_ref.to_string())
        } else {
            return Err(Error::not_found("set_branch_upstream", upstream));
        };

        self.config
            .borrow_mut()
            .set_branch_upstream(branch.as_ref(), &remote, &merge)
    }

    /// Create an annotated tag object and `refs/tags/<name>` pointing at it
    pub fn tag_create(
        &self,
        name: &str,
        target: &ObjectId,
        message: &str,
        tagger: Signature,
        force: bool,
    ) -> Result<ObjectId> {
        tagger.validate()?;
        let tag_name = BranchName::try_parse(name)?;
        let ref_name = tag_name.to_tag_ref_name();
        if !force && self.refs.exists(&ref_name)? {
            return Err(Error::already_exists("tag_create", ref_name));
        }

        let target_type = self.database.read_type(target)?;
        let tag = Tag::new(
            *target,
            target_type,
            tag_name.to_string(),
            tagger,
            message.to_string(),
        );
        let oid = self.database.store(&tag)?;
        self.refs.create(&ref_name, RefTarget::Direct(oid), force)?;
        tracing::debug!(%ref_name, %oid, "created tag");

        Ok(oid)
    }

    /// Every reference under `refs/tags/`, sorted
    pub fn tag_list(&self) -> Result<Vec<Reference>> {
        Ok(self
            .refs
            .list_all()?
            .into_iter()
            .filter(|reference| reference.name().is_tag())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    struct Fixture {
        dir: TempDir,
        repository: Repository,
    }

    #[fixture]
    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let repository = Repository::init(dir.path(), HashAlgorithm::Sha1).unwrap();
        Fixture { dir, repository }
    }

    fn signature(time: i64) -> Signature {
        Signature::new("Ada".into(), "ada@example.com".into(), time, 0)
    }

    fn commit_file(fixture: &Fixture, path: &str, content: &str, time: i64) -> ObjectId {
        fixture.dir.child(path).write_str(content).unwrap();
        fixture.repository.add_all(&["."]).unwrap();
        fixture
            .repository
            .commit(&format!("write {path}"), signature(time), signature(time))
            .unwrap()
    }

    #[rstest]
    fn init_creates_an_empty_repository(fixture: Fixture) {
        assert!(fixture.repository.is_empty().unwrap());
        assert!(Repository::can_open(fixture.dir.path()));
        assert_eq!(
            fixture.repository.refs().current_ref().unwrap().as_str(),
            "refs/heads/main"
        );

        let error = Repository::init(fixture.dir.path(), HashAlgorithm::Sha1).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::AlreadyExists);
    }

    #[test]
    fn sha256_repositories_use_long_ids() {
        let dir = TempDir::new().unwrap();
        Repository::init(dir.path(), HashAlgorithm::Sha256).unwrap();
        let repository = Repository::open(dir.path()).unwrap();

        let oid = repository
            .database()
            .write(ObjectType::Blob, b"hello")
            .unwrap();

        assert_eq!(oid.to_hex().len(), 64);
    }

    #[rstest]
    fn discover_walks_up_to_the_repository(fixture: Fixture) {
        fixture.dir.child("a/b").create_dir_all().unwrap();

        let repository = Repository::discover(&fixture.dir.path().join("a/b")).unwrap();

        assert_eq!(repository.workdir(), fixture.repository.workdir());
    }

    #[rstest]
    fn commits_advance_the_current_branch(fixture: Fixture) {
        let first = commit_file(&fixture, "a.txt", "one", 1);
        let second = commit_file(&fixture, "a.txt", "two", 2);

        let commit = fixture.repository.database().read_commit(&second).unwrap();
        assert_eq!(commit.parents(), &[first]);
        assert_eq!(fixture.repository.refs().read_head().unwrap(), Some(second));
        assert!(!fixture.repository.is_empty().unwrap());
    }

    #[rstest]
    fn committing_an_unchanged_tree_is_refused(fixture: Fixture) {
        commit_file(&fixture, "a.txt", "one", 1);

        let error = fixture
            .repository
            .commit("again", signature(2), signature(2))
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::InvalidArgument);
    }

    #[rstest]
    fn add_all_with_an_invalid_pattern_leaves_the_index_unchanged(fixture: Fixture) {
        fixture.dir.child("a.txt").write_str("a").unwrap();
        fixture.repository.add_all(&["a.txt"]).unwrap();
        let before = std::fs::read(fixture.repository.index().path()).unwrap();
        fixture.dir.child("b.txt").write_str("b").unwrap();

        let error = fixture.repository.add_all(&["b.txt", "[unclosed"]).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::InvalidArgument);
        assert_eq!(std::fs::read(fixture.repository.index().path()).unwrap(), before);
    }

    #[rstest]
    fn add_all_unstages_deleted_files(fixture: Fixture) {
        fixture.dir.child("a.txt").write_str("a").unwrap();
        fixture.dir.child("b.txt").write_str("b").unwrap();
        fixture.repository.add_all(&["."]).unwrap();
        std::fs::remove_file(fixture.dir.path().join("a.txt")).unwrap();

        fixture.repository.add_all(&["*.txt"]).unwrap();

        let paths = fixture
            .repository
            .index()
            .entries()
            .map(|entry| entry.path().to_string())
            .collect::<Vec<_>>();
        assert_eq!(paths, vec!["b.txt"]);
    }

    #[rstest]
    fn removing_a_missing_path_is_a_no_op(fixture: Fixture) {
        fixture.dir.child("a.txt").write_str("a").unwrap();
        fixture.repository.add_all(&["."]).unwrap();

        fixture.repository.remove_by_path(&["missing.txt"]).unwrap();
        assert_eq!(fixture.repository.index().len(), 1);

        fixture.repository.remove_by_path(&["a.txt"]).unwrap();
        assert!(fixture.repository.index().is_empty());
    }

    #[rstest]
    fn branch_create_respects_force(fixture: Fixture) {
        let first = commit_file(&fixture, "a.txt", "one", 1);
        let second = commit_file(&fixture, "a.txt", "two", 2);
        fixture.repository.branch_create("topic", &first, false).unwrap();

        let error = fixture
            .repository
            .branch_create("topic", &second, false)
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::AlreadyExists);

        let branch = fixture.repository.branch_create("topic", &second, true).unwrap();
        assert_eq!(branch.target(), &second);
        assert_eq!(
            fixture
                .repository
                .branch_target("topic", BranchKind::Local)
                .unwrap(),
            second
        );
    }

    #[rstest]
    fn renaming_the_head_branch_keeps_head_on_it(fixture: Fixture) {
        let oid = commit_file(&fixture, "a.txt", "one", 1);

        let branch = fixture.repository.branch_rename("main", "trunk", false).unwrap();

        assert!(branch.is_head());
        assert_eq!(
            fixture.repository.refs().current_ref().unwrap().as_str(),
            "refs/heads/trunk"
        );
        assert_eq!(fixture.repository.refs().read_head().unwrap(), Some(oid));
    }

    #[rstest]
    fn the_head_branch_cannot_be_deleted(fixture: Fixture) {
        commit_file(&fixture, "a.txt", "one", 1);

        let error = fixture
            .repository
            .branch_delete("main", BranchKind::Local)
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::InvalidArgument);
    }

    #[rstest]
    fn upstream_follows_renames_and_deletes(fixture: Fixture) {
        let oid = commit_file(&fixture, "a.txt", "one", 1);
        fixture
            .repository
            .refs()
            .create(
                &RefName::try_parse("refs/remotes/origin/main").unwrap(),
                RefTarget::Direct(oid),
                false,
            )
            .unwrap();
        fixture.repository.branch_create("topic", &oid, false).unwrap();

        fixture
            .repository
            .set_branch_upstream("topic", Some("origin/main"))
            .unwrap();
        fixture.repository.branch_rename("topic", "feature", false).unwrap();

        let upstream = fixture.repository.branch_upstream("feature").unwrap().unwrap();
        assert_eq!(upstream.remote(), "origin");
        assert_eq!(upstream.merge().as_str(), "refs/heads/main");
        assert_eq!(fixture.repository.branch_upstream("topic").unwrap(), None);

        fixture
            .repository
            .branch_delete("feature", BranchKind::Local)
            .unwrap();
        assert_eq!(fixture.repository.config().get("branch.feature.remote").unwrap(), None);
    }

    #[rstest]
    fn annotated_tags_peel_to_their_commit(fixture: Fixture) {
        let oid = commit_file(&fixture, "a.txt", "one", 1);

        let tag = fixture
            .repository
            .tag_create("v1", &oid, "first release", signature(3), false)
            .unwrap();

        assert_ne!(tag, oid);
        assert_eq!(fixture.repository.rev_parse("v1").unwrap(), oid);
        assert_eq!(fixture.repository.tag_list().unwrap().len(), 1);
        let error = fixture
            .repository
            .tag_create("v1", &oid, "again", signature(4), false)
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::AlreadyExists);
    }

    #[rstest]
    fn lookup_accepts_unique_abbreviations(fixture: Fixture) {
        let oid = commit_file(&fixture, "a.txt", "one", 1);

        let (found, object) = fixture.repository.lookup(&oid.to_hex()[..8]).unwrap();

        assert_eq!(found, oid);
        assert_eq!(object.object_type(), ObjectType::Commit);
        let error = fixture.repository.lookup("ab").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidArgument);
    }

    #[rstest]
    fn contributions_list_authors_newest_first(fixture: Fixture) {
        commit_file(&fixture, "a.txt", "one", 10);
        commit_file(&fixture, "a.txt", "two", 20);

        let contributions = fixture.repository.contributions(SortMode::TIME).unwrap();

        assert_eq!(
            contributions.iter().map(|c| c.when).collect::<Vec<_>>(),
            vec![20, 10]
        );
        assert!(contributions.iter().all(|c| c.name == "Ada"));
    }

    #[rstest]
    fn blobs_from_disk_and_workdir_share_ids(fixture: Fixture) {
        fixture.dir.child("a.txt").write_str("same").unwrap();

        let from_workdir = fixture.repository.blob_create_from_workdir("a.txt").unwrap();
        let from_disk = fixture
            .repository
            .blob_create_from_disk(&fixture.dir.path().join("a.txt"))
            .unwrap();

        assert_eq!(from_workdir, from_disk);
        assert!(!fixture.repository.database().read_blob(&from_disk).unwrap().is_binary());
    }

    #[rstest]
    #[case(Signature::new("Ada\nLovelace".into(), "ada@example.com".into(), 2, 0))]
    #[case(Signature::new("Ada".into(), "<ada@example.com>".into(), 2, 0))]
    #[case(Signature::new("Ada".into(), "ada@example.com".into(), 2, 6000))]
    fn unreadable_signatures_are_refused_before_storing(fixture: Fixture, #[case] author: Signature) {
        let first = commit_file(&fixture, "a.txt", "one", 1);
        fixture.dir.child("a.txt").write_str("two").unwrap();
        fixture.repository.add_all(&["."]).unwrap();

        let error = fixture
            .repository
            .commit("second", author.clone(), signature(2))
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidArgument);

        let tag_error = fixture
            .repository
            .tag_create("v1", &first, "release\n", author, false)
            .unwrap_err();
        assert_eq!(tag_error.kind(), ErrorKind::InvalidArgument);

        assert_eq!(fixture.repository.refs().read_head().unwrap(), Some(first));
        assert_eq!(fixture.repository.log(SortMode::TIME, -1).unwrap().len(), 1);
    }

    #[rstest]
    fn force_create_is_allowed_on_a_branch_matching_a_detached_head(fixture: Fixture) {
        let first = commit_file(&fixture, "a.txt", "one", 1);
        let second = commit_file(&fixture, "a.txt", "two", 2);
        fixture.repository.branch_create("feature", &first, false).unwrap();
        fixture.repository.set_head_detached(first).unwrap();

        let branch = fixture.repository.branch_create("feature", &second, true).unwrap();

        assert_eq!(branch.target(), &second);
        assert!(fixture.repository.is_head_detached().unwrap());
    }

    #[rstest]
    fn branch_list_skips_dangling_symbolic_branches(fixture: Fixture) {
        commit_file(&fixture, "a.txt", "one", 1);
        let origin_head = RefName::try_parse("refs/remotes/origin/HEAD").unwrap();
        let gone = RefName::try_parse("refs/remotes/origin/gone").unwrap();
        fixture
            .repository
            .refs()
            .create(&origin_head, RefTarget::Symbolic(gone), false)
            .unwrap();

        let all = fixture.repository.branch_list(BranchFilter::ALL).unwrap();

        assert_eq!(
            all.iter().map(|branch| branch.short_name()).collect::<Vec<_>>(),
            vec!["main"]
        );
    }

    #[rstest]
    fn ahead_behind_counts_unique_commits(fixture: Fixture) {
        let base = commit_file(&fixture, "a.txt", "base", 1);
        let main = commit_file(&fixture, "a.txt", "main", 2);
        fixture.repository.branch_create("topic", &base, false).unwrap();
        fixture.repository.set_head("refs/heads/topic").unwrap();
        let topic_1 = commit_file(&fixture, "b.txt", "topic 1", 3);
        let topic_2 = commit_file(&fixture, "b.txt", "topic 2", 4);

        assert_eq!(fixture.repository.ahead_behind(&topic_2, &main).unwrap(), (2, 1));
        assert_eq!(fixture.repository.ahead_behind(&main, &topic_2).unwrap(), (1, 2));
        assert_eq!(fixture.repository.ahead_behind(&topic_1, &topic_1).unwrap(), (0, 0));
        assert_eq!(fixture.repository.ahead_behind(&topic_2, &base).unwrap(), (2, 0));
    }

    #[rstest]
    fn descendant_of_follows_parents_only(fixture: Fixture) {
        let base = commit_file(&fixture, "a.txt", "base", 1);
        let main = commit_file(&fixture, "a.txt", "main", 2);
        fixture.repository.branch_create("topic", &base, false).unwrap();
        fixture.repository.set_head("refs/heads/topic").unwrap();
        let topic = commit_file(&fixture, "b.txt", "topic", 3);

        assert!(fixture.repository.descendant_of(&main, &base).unwrap());
        assert!(fixture.repository.descendant_of(&topic, &base).unwrap());
        assert!(!fixture.repository.descendant_of(&base, &main).unwrap());
        assert!(!fixture.repository.descendant_of(&topic, &main).unwrap());
        assert!(!fixture.repository.descendant_of(&main, &main).unwrap());
    }

    #[rstest]
    fn blobs_lists_every_file_of_every_commit(fixture: Fixture) {
        fixture.dir.child("dir/b.txt").write_str("bee").unwrap();
        let first = commit_file(&fixture, "a.txt", "one", 10);
        let second = commit_file(&fixture, "a.txt", "three", 20);

        let blobs = fixture.repository.blobs().unwrap();

        let mut rows = blobs
            .iter()
            .map(|blob| (blob.commit, format!("{}{}", blob.path, blob.name), blob.size, blob.when))
            .collect::<Vec<_>>();
        rows.sort();
        let mut expected = vec![
            (first, "a.txt".to_string(), 3, 10),
            (first, "dir/b.txt".to_string(), 3, 10),
            (second, "a.txt".to_string(), 5, 20),
            (second, "dir/b.txt".to_string(), 3, 20),
        ];
        expected.sort();
        assert_eq!(rows, expected);
        assert!(blobs.iter().all(|blob| blob.author == "Ada"));
    }
}
