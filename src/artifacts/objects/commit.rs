//! Commit object
//!
//! Commits represent snapshots of the repository at specific points in time.
//! They contain:
//! - A tree object ID (directory snapshot)
//! - Parent commit ID(s) (none for a root commit, several for a merge)
//! - Author and committer information
//! - Commit message
//!
//! ## Format
//!
//! On disk:
//! ```text
//! commit <size>\0
//! tree <tree-id>
//! parent <parent-id>
//! author <name> <email> <timestamp> <timezone>
//! committer <name> <email> <timestamp> <timezone>
//!
//! <commit message>
//! ```
//!
//! The message is stored verbatim after the first blank line.

use crate::artifacts::objects::object::{MalformedObject, Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::{HashAlgorithm, ObjectId};
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::signature::Signature;
use bytes::Bytes;
use std::io::BufRead;

/// Commit object
///
/// Represents a snapshot of the repository with metadata.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    /// Tree object ID representing the directory snapshot
    tree_oid: ObjectId,
    /// Parent commit IDs in recorded order
    parents: Vec<ObjectId>,
    /// Author who wrote the changes
    author: Signature,
    /// Committer who recorded the commit
    committer: Signature,
    message: String,
}

impl Commit {
    pub fn new(
        tree_oid: ObjectId,
        parents: Vec<ObjectId>,
        author: Signature,
        committer: Signature,
        message: String,
    ) -> Self {
        Commit {
            tree_oid,
            parents,
            author,
            committer,
            message,
        }
    }

    /// Get the first line of the commit message
    ///
    /// Useful for short-form display (e.g., `log --oneline`)
    pub fn short_message(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn tree_oid(&self) -> &ObjectId {
        &self.tree_oid
    }

    pub fn parents(&self) -> &[ObjectId] {
        &self.parents
    }

    pub fn parent(&self) -> Option<&ObjectId> {
        self.parents.first()
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    pub fn author(&self) -> &Signature {
        &self.author
    }

    pub fn committer(&self) -> &Signature {
        &self.committer
    }

    /// Committer time in epoch seconds, the key for time-ordered walks
    pub fn time(&self) -> i64 {
        self.committer.time()
    }

    fn header_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("tree {}", self.tree_oid)];
        for parent in &self.parents {
            lines.push(format!("parent {parent}"));
        }
        lines.push(format!("author {}", self.author.display()));
        lines.push(format!("committer {}", self.committer.display()));

        lines
    }
}

impl Packable for Commit {
    fn serialize(&self) -> Bytes {
        let mut content = self.header_lines().join("\n");
        content.push_str("\n\n");
        content.push_str(&self.message);

        Bytes::from(content)
    }
}

fn parse_oid(line: &str, value: &str, algorithm: HashAlgorithm) -> Result<ObjectId, MalformedObject> {
    let oid = ObjectId::try_parse(value)
        .map_err(|_| MalformedObject::new(format!("invalid object id in '{line}'")))?;
    if oid.algorithm() != algorithm {
        return Err(MalformedObject::new(format!(
            "expected a {algorithm} id in '{line}'"
        )));
    }

    Ok(oid)
}

impl Unpackable for Commit {
    fn deserialize(mut reader: impl BufRead, algorithm: HashAlgorithm) -> Result<Self, MalformedObject> {
        let mut content = Vec::new();
        reader.read_to_end(&mut content)?;
        let content = String::from_utf8(content)?;

        let (headers, message) = content
            .split_once("\n\n")
            .ok_or_else(|| MalformedObject::new("commit without message separator".into()))?;

        let mut tree_oid = None;
        let mut parents = Vec::new();
        let mut author = None;
        let mut committer = None;

        for line in headers.lines() {
            let (key, value) = line
                .split_once(' ')
                .ok_or_else(|| MalformedObject::new(format!("invalid commit header '{line}'")))?;

            match key {
                "tree" if tree_oid.is_none() => tree_oid = Some(parse_oid(line, value, algorithm)?),
                "parent" => parents.push(parse_oid(line, value, algorithm)?),
                "author" if author.is_none() => author = Some(Signature::try_from(value)?),
                "committer" if committer.is_none() => {
                    committer = Some(Signature::try_from(value)?)
                }
                // unknown headers (e.g. encoding) are tolerated
                "tree" | "author" | "committer" => {
                    return Err(MalformedObject::new(format!("duplicate commit header '{key}'")));
                }
                _ => {}
            }
        }

        Ok(Commit {
            tree_oid: tree_oid.ok_or_else(|| MalformedObject::new("commit without tree".into()))?,
            parents,
            author: author.ok_or_else(|| MalformedObject::new("commit without author".into()))?,
            committer: committer
                .ok_or_else(|| MalformedObject::new("commit without committer".into()))?,
            message: message.to_string(),
        })
    }
}

impl Object for Commit {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }

    fn display(&self) -> String {
        let mut lines = self.header_lines();
        lines.push(String::new());
        lines.push(self.message.clone());

        lines.join("\n")
    }
}
