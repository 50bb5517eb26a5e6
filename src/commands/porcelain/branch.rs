use crate::areas::repository::Repository;
use crate::artifacts::refs::{BranchFilter, BranchKind};
use clap::Subcommand;
use std::io::Write;

#[derive(Debug, Clone, Subcommand)]
pub enum BranchCommand {
    #[command(about = "Create a branch at a commit")]
    Create {
        name: String,
        #[arg(help = "Revision to start from (default: HEAD)")]
        start: Option<String>,
        #[arg(short, long, help = "Move the branch if it already exists")]
        force: bool,
    },
    #[command(about = "Delete a branch")]
    Delete {
        name: String,
        #[arg(short, long, help = "Delete a remote-tracking branch")]
        remote: bool,
    },
    #[command(about = "Rename a local branch")]
    Rename {
        old: String,
        new: String,
        #[arg(short, long, help = "Overwrite an existing branch")]
        force: bool,
    },
    #[command(about = "List branches")]
    List {
        #[arg(short, long, conflicts_with = "all", help = "List remote-tracking branches")]
        remotes: bool,
        #[arg(short, long, help = "List local and remote-tracking branches")]
        all: bool,
        #[arg(short, long, help = "Show the commit each branch points to")]
        verbose: bool,
    },
    #[command(name = "set-upstream", about = "Set or remove the upstream of a local branch")]
    SetUpstream {
        name: String,
        #[arg(help = "Remote-tracking or local branch to track; omit to stop tracking")]
        upstream: Option<String>,
    },
}

pub fn branch(
    repository: &Repository,
    command: BranchCommand,
    writer: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        BranchCommand::Create { name, start, force } => {
            let target = match start {
                Some(start) => repository.rev_parse(&start)?,
                None => repository
                    .refs()
                    .read_head()?
                    .ok_or_else(|| anyhow::anyhow!("no commits yet; cannot branch from HEAD"))?,
            };
            repository.branch_create(&name, &target, force)?;
        }
        BranchCommand::Delete { name, remote } => {
            let kind = if remote {
                BranchKind::Remote
            } else {
                BranchKind::Local
            };
            let deleted = repository.branch_delete(&name, kind)?;
            let was = deleted
                .oid()
                .map(|oid| oid.to_short_oid())
                .unwrap_or_else(|| deleted.target().to_string());
            writeln!(writer, "Deleted branch {name} (was {was}).")?;
        }
        BranchCommand::Rename { old, new, force } => {
            repository.branch_rename(&old, &new, force)?;
        }
        BranchCommand::List {
            remotes,
            all,
            verbose,
        } => {
            let filter = match (remotes, all) {
                (_, true) => BranchFilter::ALL,
                (true, false) => BranchFilter::REMOTE,
                (false, false) => BranchFilter::LOCAL,
            };
            for branch in repository.branch_list(filter)? {
                writeln!(writer, "{}", branch.display(verbose))?;
            }
        }
        BranchCommand::SetUpstream { name, upstream } => {
            repository.set_branch_upstream(&name, upstream.as_deref())?;
            match upstream {
                Some(upstream) => {
                    writeln!(writer, "branch '{name}' set up to track '{upstream}'.")?
                }
                None => writeln!(writer, "branch '{name}' no longer tracks an upstream.")?,
            }
        }
    }

    Ok(())
}
