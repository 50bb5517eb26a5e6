use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::refs::BranchKind;
use crate::artifacts::refs::ref_name::RefName;
use colored::Colorize;
use derive_new::new;

/// Branch as reported by listings
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Branch {
    name: RefName,
    kind: BranchKind,
    target: ObjectId,
    is_head: bool,
}

impl Branch {
    pub fn name(&self) -> &RefName {
        &self.name
    }

    pub fn short_name(&self) -> &str {
        self.name.short_name()
    }

    pub fn kind(&self) -> BranchKind {
        self.kind
    }

    pub fn target(&self) -> &ObjectId {
        &self.target
    }

    pub fn is_head(&self) -> bool {
        self.is_head
    }

    /// One line of `branch list` output
    pub fn display(&self, verbose: bool) -> String {
        let marker = if self.is_head { "* " } else { "  " };
        let name = match (self.is_head, self.kind) {
            (true, _) => self.short_name().green(),
            (false, BranchKind::Remote) => format!("remotes/{}", self.short_name()).red(),
            (false, BranchKind::Local) => self.short_name().normal(),
        };

        if verbose {
            format!("{marker}{name} {}", self.target.to_short_oid())
        } else {
            format!("{marker}{name}")
        }
    }
}

/// Remote branch a local branch tracks, from `branch.<name>.remote` and `.merge`
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Upstream {
    remote: String,
    merge: RefName,
}

impl Upstream {
    pub fn remote(&self) -> &str {
        &self.remote
    }

    /// Reference on the remote that is merged, e.g. `refs/heads/main`
    pub fn merge(&self) -> &RefName {
        &self.merge
    }

    /// Local remote-tracking reference, e.g. `refs/remotes/origin/main`
    pub fn tracking_ref(&self) -> Option<RefName> {
        let branch = self.merge.as_str().strip_prefix(BranchKind::Local.prefix())?;
        RefName::try_parse(format!(
            "{}{}/{}",
            BranchKind::Remote.prefix(),
            self.remote,
            branch
        ))
        .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::object_id::HashAlgorithm;

    #[test]
    fn upstream_maps_to_the_remote_tracking_reference() {
        let upstream = Upstream::new(
            "origin".into(),
            RefName::try_parse("refs/heads/main").unwrap(),
        );

        assert_eq!(
            upstream.tracking_ref().unwrap().as_str(),
            "refs/remotes/origin/main"
        );
    }

    #[test]
    fn head_branch_is_marked_in_listings() {
        colored::control::set_override(false);
        let branch = Branch::new(
            RefName::try_parse("refs/heads/main").unwrap(),
            BranchKind::Local,
            HashAlgorithm::Sha1.digest(b"commit"),
            true,
        );

        assert_eq!(branch.display(false), "* main");
    }
}
