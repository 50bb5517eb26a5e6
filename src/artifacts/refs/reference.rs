//! Reference values
//!
//! ## File Format
//!
//! References are stored as text files containing either:
//! - a hex object id (direct reference)
//! - `ref: <name>` (symbolic reference)

use crate::artifacts::core::error::{Error, Result};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::refs::SYMREF_REGEX;
use crate::artifacts::refs::ref_name::RefName;
use derive_new::new;
use regex::Regex;
use std::sync::LazyLock;

static SYMREF: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(SYMREF_REGEX));

/// What a reference points to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RefTarget {
    Direct(ObjectId),
    Symbolic(RefName),
}

impl RefTarget {
    /// Parse the content of a reference file
    pub fn parse(name: &RefName, content: &str) -> Result<Self> {
        let content = content.trim();

        let symref = SYMREF
            .as_ref()
            .map_err(|e| Error::invalid_argument("read_ref", SYMREF_REGEX, e))?;
        if let Some(captures) = symref.captures(content) {
            let target = RefName::try_parse(&captures[1])
                .map_err(|e| Error::corrupt("read_ref", name, e))?;
            return Ok(RefTarget::Symbolic(target));
        }

        ObjectId::try_parse(content)
            .map(RefTarget::Direct)
            .map_err(|e| Error::corrupt("read_ref", name, e))
    }

    /// Content written to the reference file
    pub fn to_content(&self) -> String {
        match self {
            RefTarget::Direct(oid) => format!("{oid}\n"),
            RefTarget::Symbolic(name) => format!("ref: {name}\n"),
        }
    }
}

impl From<ObjectId> for RefTarget {
    fn from(oid: ObjectId) -> Self {
        RefTarget::Direct(oid)
    }
}

impl From<RefName> for RefTarget {
    fn from(name: RefName) -> Self {
        RefTarget::Symbolic(name)
    }
}

impl std::fmt::Display for RefTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefTarget::Direct(oid) => write!(f, "{oid}"),
            RefTarget::Symbolic(name) => write!(f, "{name}"),
        }
    }
}

/// Named pointer into the object graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, new)]
pub struct Reference {
    name: RefName,
    target: RefTarget,
}

impl Reference {
    pub fn name(&self) -> &RefName {
        &self.name
    }

    pub fn target(&self) -> &RefTarget {
        &self.target
    }

    pub fn is_symbolic(&self) -> bool {
        matches!(self.target, RefTarget::Symbolic(_))
    }

    /// Object id of a direct reference
    pub fn oid(&self) -> Option<&ObjectId> {
        match &self.target {
            RefTarget::Direct(oid) => Some(oid),
            RefTarget::Symbolic(_) => None,
        }
    }

    /// Name a symbolic reference points to
    pub fn symbolic_target(&self) -> Option<&RefName> {
        match &self.target {
            RefTarget::Direct(_) => None,
            RefTarget::Symbolic(name) => Some(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::core::error::ErrorKind;
    use crate::artifacts::objects::object_id::HashAlgorithm;
    use pretty_assertions::assert_eq;

    #[test]
    fn symbolic_content_parses_to_a_name() {
        let head = RefName::head();

        let target = RefTarget::parse(&head, "ref: refs/heads/main\n").unwrap();

        assert_eq!(
            target,
            RefTarget::Symbolic(RefName::try_parse("refs/heads/main").unwrap())
        );
        assert_eq!(target.to_content(), "ref: refs/heads/main\n");
    }

    #[test]
    fn hex_content_parses_to_an_id() {
        let oid = HashAlgorithm::Sha1.digest(b"commit");
        let name = RefName::try_parse("refs/heads/main").unwrap();

        let target = RefTarget::parse(&name, &RefTarget::Direct(oid).to_content()).unwrap();

        assert_eq!(target, RefTarget::Direct(oid));
    }

    #[test]
    fn garbage_content_is_corrupt() {
        let name = RefName::try_parse("refs/heads/main").unwrap();

        let error = RefTarget::parse(&name, "not a reference").unwrap_err();

        assert_eq!(error.kind(), ErrorKind::CorruptObject);
    }
}
