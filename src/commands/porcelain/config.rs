use crate::areas::repository::Repository;
use clap::Subcommand;
use std::io::Write;

#[derive(Debug, Clone, Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Print the value of a key")]
    Get { key: String },
    #[command(about = "Set a key in the repository configuration")]
    Set { key: String, value: String },
    #[command(about = "Remove a key from the repository configuration")]
    Unset { key: String },
    #[command(about = "List every key with its effective value")]
    List,
}

pub fn config(
    repository: &Repository,
    command: ConfigCommand,
    writer: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        ConfigCommand::Get { key } => match repository.config().get(&key)? {
            Some(value) => writeln!(writer, "{value}")?,
            None => anyhow::bail!("key not set: {key}"),
        },
        ConfigCommand::Set { key, value } => repository.config_mut().set(&key, &value)?,
        ConfigCommand::Unset { key } => {
            if !repository.config_mut().unset(&key)? {
                anyhow::bail!("key not set: {key}");
            }
        }
        ConfigCommand::List => {
            for (key, value) in repository.config().list() {
                writeln!(writer, "{key}={value}")?;
            }
        }
    }

    Ok(())
}
