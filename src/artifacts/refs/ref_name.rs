use crate::artifacts::core::error::{Error, Result};
use crate::artifacts::refs::{
    BranchKind, HEAD_REF_NAME, INVALID_REF_NAME_REGEX, REFS_PREFIX, TAGS_PREFIX,
};
use regex::Regex;
use std::sync::LazyLock;

static INVALID_REF_NAME: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(INVALID_REF_NAME_REGEX));

fn validate(operation: &'static str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_argument(
            operation,
            name,
            "reference name cannot be empty",
        ));
    }

    let re = INVALID_REF_NAME
        .as_ref()
        .map_err(|e| Error::invalid_argument(operation, INVALID_REF_NAME_REGEX, e))?;

    if re.is_match(name) {
        Err(Error::invalid_argument(
            operation,
            name,
            "not a valid reference name",
        ))
    } else {
        Ok(())
    }
}

/// Fully-qualified reference name: `HEAD` or `refs/...`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefName(String);

impl RefName {
    pub fn try_parse(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate("parse_ref_name", &name)?;

        if name != HEAD_REF_NAME && !name.starts_with(REFS_PREFIX) {
            return Err(Error::invalid_argument(
                "parse_ref_name",
                name,
                format!("expected '{HEAD_REF_NAME}' or a name under '{REFS_PREFIX}'"),
            ));
        }

        Ok(Self(name))
    }

    pub fn head() -> Self {
        Self(HEAD_REF_NAME.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_head(&self) -> bool {
        self.0 == HEAD_REF_NAME
    }

    pub fn is_tag(&self) -> bool {
        self.0.starts_with(TAGS_PREFIX)
    }

    pub fn branch_kind(&self) -> Option<BranchKind> {
        BranchKind::of(&self.0)
    }

    /// Name without its namespace: `refs/heads/topic` becomes `topic`
    pub fn short_name(&self) -> &str {
        match self.branch_kind() {
            Some(kind) => &self.0[kind.prefix().len()..],
            None => self.0.strip_prefix(TAGS_PREFIX).unwrap_or(&self.0),
        }
    }
}

impl AsRef<str> for RefName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Short branch name as typed by a user, e.g. `topic` or `origin/main`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchName(String);

impl BranchName {
    pub fn try_parse(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate("parse_branch_name", &name)?;

        if name == HEAD_REF_NAME {
            return Err(Error::invalid_argument(
                "parse_branch_name",
                name,
                "HEAD is not a valid branch name",
            ));
        }

        Ok(Self(name))
    }

    /// Qualified reference name of the branch of the given kind
    pub fn to_ref_name(&self, kind: BranchKind) -> RefName {
        RefName(format!("{}{}", kind.prefix(), self.0))
    }

    /// Qualified reference name of a tag with this name
    pub fn to_tag_ref_name(&self) -> RefName {
        RefName(format!("{TAGS_PREFIX}{}", self.0))
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
