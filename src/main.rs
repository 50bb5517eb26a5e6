use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use grove::commands::plumbing::{cat_file, hash_object, show_ref};
use grove::commands::porcelain::{add, branch, commit, config, init, log, rm, tag};
use grove::{HashAlgorithm, Repository};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `GROVE_LOG=grove=debug`
const LOG_ENV: &str = "GROVE_LOG";

#[derive(Parser)]
#[command(
    name = "grove",
    version,
    author = "Sami Barbut-Dica",
    about = "A small content-addressed object store with commit history",
    long_about = "grove stores blobs, trees, commits and tags by content hash, \
    names them with branches and tags, and walks the resulting commit graph.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "init",
        about = "Initialize a new repository",
        long_about = "This command initializes a new repository in the current directory or at the specified path."
    )]
    Init {
        #[arg(index = 1, help = "The path to the repository")]
        path: Option<PathBuf>,
        #[arg(long = "object-format", default_value = "sha1", help = "Hash algorithm for object ids (sha1 or sha256)")]
        object_format: HashAlgorithm,
    },
    #[command(
        name = "hash-object",
        about = "Compute the id of a file and optionally store it as a blob"
    )]
    HashObject {
        #[arg(short, long, help = "Write the object to the object database")]
        write: bool,
        #[arg(index = 1)]
        file: PathBuf,
    },
    #[command(
        name = "cat-file",
        about = "Print the content, type or size of an object",
        long_about = "This command prints an object of the repository. The object is given by a full or \
        abbreviated id, or by a reference name."
    )]
    CatFile {
        #[command(flatten)]
        mode: cat_file::CatFileMode,
        #[arg(index = 1, help = "The object to print")]
        object: String,
    },
    #[command(name = "add", about = "Stage files matching the given patterns")]
    Add {
        #[arg(required = true, help = "Paths or glob patterns, e.g. '.', 'src', '*.rs'")]
        patterns: Vec<String>,
    },
    #[command(name = "rm", about = "Remove files from the index")]
    Rm {
        #[arg(long, help = "Only unstage, keeping the working-tree files")]
        cached: bool,
        #[arg(required = true)]
        paths: Vec<String>,
    },
    #[command(
        name = "commit",
        about = "Create a new commit with the specified message",
        long_about = "This command records the staged files as a new commit on the current branch. \
        The author is read from GROVE_AUTHOR_NAME, GROVE_AUTHOR_EMAIL and GROVE_AUTHOR_DATE, \
        falling back to user.name and user.email."
    )]
    Commit {
        #[arg(short, long, help = "The commit message")]
        message: String,
    },
    #[command(name = "log", about = "Show commit history")]
    Log {
        #[command(flatten)]
        options: log::LogOptions,
        #[arg(help = "Revisions to start from (default: HEAD)")]
        revisions: Vec<String>,
    },
    #[command(name = "branch", about = "Create, delete, rename or list branches")]
    Branch {
        #[command(subcommand)]
        command: branch::BranchCommand,
    },
    #[command(name = "tag", about = "Create or list tags")]
    Tag {
        #[command(subcommand)]
        command: tag::TagCommand,
    },
    #[command(name = "show-ref", about = "List references with the objects they point to")]
    ShowRef {
        #[arg(long, help = "Include HEAD")]
        head: bool,
    },
    #[command(name = "config", about = "Read and write repository configuration")]
    Config {
        #[command(subcommand)]
        command: config::ConfigCommand,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn open_repository(pwd: &Path) -> Result<Repository> {
    Repository::discover(pwd).with_context(|| format!("not a grove repository: {}", pwd.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let pwd = std::env::current_dir()?;
    let stdout = std::io::stdout();
    let mut writer = stdout.lock();

    match cli.command {
        Commands::Init {
            path,
            object_format,
        } => {
            let path = path.map_or_else(|| pwd.clone(), |path| pwd.join(path));
            init::init(&path, object_format, &mut writer)?
        }
        Commands::HashObject { write, file } => {
            let repository = if write {
                Some(open_repository(&pwd)?)
            } else {
                Repository::discover(&pwd).ok()
            };
            hash_object::hash_object(repository.as_ref(), &pwd.join(file), write, &mut writer)?
        }
        Commands::CatFile { mode, object } => {
            cat_file::cat_file(&open_repository(&pwd)?, mode, &object, &mut writer)?
        }
        Commands::Add { patterns } => add::add(&open_repository(&pwd)?, &patterns)?,
        Commands::Rm { cached, paths } => rm::rm(&open_repository(&pwd)?, &paths, cached)?,
        Commands::Commit { message } => {
            commit::commit(&open_repository(&pwd)?, &message, &mut writer)?
        }
        Commands::Log { options, revisions } => {
            log::log(&open_repository(&pwd)?, &options, &revisions, &mut writer)?
        }
        Commands::Branch { command } => {
            branch::branch(&open_repository(&pwd)?, command, &mut writer)?
        }
        Commands::Tag { command } => tag::tag(&open_repository(&pwd)?, command, &mut writer)?,
        Commands::ShowRef { head } => {
            show_ref::show_ref(&open_repository(&pwd)?, head, &mut writer)?
        }
        Commands::Config { command } => {
            config::config(&open_repository(&pwd)?, command, &mut writer)?
        }
    }

    writer.flush()?;
    Ok(())
}
