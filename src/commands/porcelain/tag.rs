use crate::areas::repository::Repository;
use anyhow::Context;
use clap::Subcommand;
use std::io::Write;

#[derive(Debug, Clone, Subcommand)]
pub enum TagCommand {
    #[command(about = "Create an annotated tag")]
    Create {
        name: String,
        #[arg(help = "Object to tag (default: HEAD)")]
        target: Option<String>,
        #[arg(short, long, help = "The tag message")]
        message: String,
        #[arg(short, long, help = "Replace an existing tag")]
        force: bool,
    },
    #[command(about = "List tags")]
    List,
}

pub fn tag(repository: &Repository, command: TagCommand, writer: &mut impl Write) -> anyhow::Result<()> {
    match command {
        TagCommand::Create {
            name,
            target,
            message,
            force,
        } => {
            let target = match target {
                Some(target) => repository.resolve_revision(&target)?,
                None => repository
                    .refs()
                    .read_head()?
                    .ok_or_else(|| anyhow::anyhow!("no commits yet; nothing to tag"))?,
            };
            let tagger = repository
                .signature()
                .context("no tagger configured; set user.name and user.email")?;

            repository.tag_create(&name, &target, &format!("{}\n", message.trim()), tagger, force)?;
        }
        TagCommand::List => {
            for reference in repository.tag_list()? {
                writeln!(writer, "{}", reference.name().short_name())?;
            }
        }
    }

    Ok(())
}
