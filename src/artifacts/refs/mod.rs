//! Reference names, values and branch classification
//!
//! References are human-readable names pointing either at an object (direct)
//! or at another reference (symbolic):
//!
//! - `HEAD`: the current branch, or a commit when detached
//! - `refs/heads/*`: local branches
//! - `refs/remotes/*`: remote-tracking branches
//! - `refs/tags/*`: tags

use bitflags::bitflags;

pub mod branch;
pub mod ref_name;
pub mod reference;

/// Names matching this pattern are rejected
pub const INVALID_REF_NAME_REGEX: &str =
    r"^\.|\/\.|\.\.|^\/|\/$|\.lock$|@\{|[\x00-\x20\*:\?\[\\~\^\x7f]";

/// Pattern of the content of a symbolic reference file
pub const SYMREF_REGEX: &str = r"^ref: (.+)$";

pub const HEAD_REF_NAME: &str = "HEAD";
pub const REFS_PREFIX: &str = "refs/";
pub const HEADS_PREFIX: &str = "refs/heads/";
pub const REMOTES_PREFIX: &str = "refs/remotes/";
pub const TAGS_PREFIX: &str = "refs/tags/";

/// Branch a freshly initialized repository's HEAD points to
pub const DEFAULT_BRANCH: &str = "main";

/// Where a branch lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum BranchKind {
    Local = 1,
    Remote = 2,
}

impl BranchKind {
    /// Namespace the branch's reference lives under
    pub fn prefix(&self) -> &'static str {
        match self {
            BranchKind::Local => HEADS_PREFIX,
            BranchKind::Remote => REMOTES_PREFIX,
        }
    }

    /// Kind of a fully-qualified reference name, if it names a branch
    pub fn of(name: &str) -> Option<Self> {
        if name.starts_with(HEADS_PREFIX) {
            Some(BranchKind::Local)
        } else if name.starts_with(REMOTES_PREFIX) {
            Some(BranchKind::Remote)
        } else {
            None
        }
    }

    pub fn filter(&self) -> BranchFilter {
        match self {
            BranchKind::Local => BranchFilter::LOCAL,
            BranchKind::Remote => BranchFilter::REMOTE,
        }
    }
}

bitflags! {
    /// Which branch kinds a listing includes
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BranchFilter: u32 {
        const LOCAL = 1;
        const REMOTE = 2;
        const ALL = Self::LOCAL.bits() | Self::REMOTE.bits();
    }
}

impl BranchFilter {
    pub fn includes(&self, kind: BranchKind) -> bool {
        self.contains(kind.filter())
    }
}
