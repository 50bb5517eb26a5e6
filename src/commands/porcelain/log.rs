use crate::areas::repository::Repository;
use crate::artifacts::log::rev_walk::{SortMode, WalkEntry};
use clap::Args;
use colored::Colorize;
use std::io::Write;

#[derive(Debug, Clone, Default, Args)]
pub struct LogOptions {
    #[arg(long = "topo-order", help = "Show no parent before all of its children")]
    pub topo_order: bool,
    #[arg(long = "date-order", help = "Like --topo-order, newest commits first among ready ones")]
    pub date_order: bool,
    #[arg(long, help = "Output commits in reverse order")]
    pub reverse: bool,
    #[arg(
        short = 'n',
        long = "max-count",
        default_value_t = -1,
        allow_negative_numbers = true,
        help = "Limit the number of commits shown"
    )]
    pub max_count: i64,
    #[arg(long, help = "One line per commit")]
    pub oneline: bool,
    #[arg(long = "abbrev-commit", help = "Show abbreviated commit ids")]
    pub abbrev_commit: bool,
}

impl LogOptions {
    pub fn sorting(&self) -> SortMode {
        let mut sorting = match (self.topo_order, self.date_order) {
            (_, true) => SortMode::TOPOLOGICAL | SortMode::TIME,
            (true, false) => SortMode::TOPOLOGICAL,
            (false, false) => SortMode::TIME,
        };
        sorting.set(SortMode::REVERSE, self.reverse);
        sorting
    }
}

/// Show the commits reachable from `revisions`, or from HEAD when none are given
pub fn log(
    repository: &Repository,
    opts: &LogOptions,
    revisions: &[String],
    writer: &mut impl Write,
) -> anyhow::Result<()> {
    let mut walk = repository.rev_walk();
    walk.set_sorting(opts.sorting())?;
    walk.set_max_count(opts.max_count);

    if revisions.is_empty() {
        walk.push_head(repository.refs())?;
    }
    for revision in revisions {
        walk.push(repository.rev_parse(revision)?)?;
    }

    for (position, entry) in walk.enumerate() {
        let entry = entry?;
        if opts.oneline {
            show_commit_oneline(&entry, opts.abbrev_commit, writer)?;
        } else {
            if position > 0 {
                writeln!(writer)?;
            }
            show_commit_medium(&entry, opts.abbrev_commit, writer)?;
        }
    }

    Ok(())
}

fn commit_id(entry: &WalkEntry, abbrev_commit: bool) -> String {
    if abbrev_commit {
        entry.oid.to_short_oid()
    } else {
        entry.oid.to_hex()
    }
}

fn show_commit_medium(
    entry: &WalkEntry,
    abbrev_commit: bool,
    writer: &mut impl Write,
) -> anyhow::Result<()> {
    let commit = &entry.commit;

    writeln!(
        writer,
        "{}",
        format!("commit {}", commit_id(entry, abbrev_commit)).yellow()
    )?;
    if commit.is_merge() {
        let parents = commit
            .parents()
            .iter()
            .map(|parent| parent.to_short_oid())
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(writer, "Merge: {parents}")?;
    }
    writeln!(writer, "Author: {}", commit.author().display_name())?;
    writeln!(writer, "Date:   {}", commit.author().readable_timestamp())?;
    writeln!(writer)?;
    for message_line in commit.message().lines() {
        writeln!(writer, "    {message_line}")?;
    }

    Ok(())
}

fn show_commit_oneline(
    entry: &WalkEntry,
    abbrev_commit: bool,
    writer: &mut impl Write,
) -> anyhow::Result<()> {
    writeln!(
        writer,
        "{} {}",
        commit_id(entry, abbrev_commit).yellow(),
        entry.commit.short_message()
    )?;

    Ok(())
}
