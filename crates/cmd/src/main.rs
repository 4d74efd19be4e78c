use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use cmd::StoreArgs;
use cmd::commands::{
    cat_command, get_command, list_command, mkdir_command, mv_command, put_command,
    rm_command, rmdir_command, stat_command,
};

/// Browse and edit an object store as a directory tree
#[derive(Parser)]
#[command(author, version, long_about = None)]
#[command(name = "s3fs")]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,

    /// Print listings and metadata as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List a directory
    Ls {
        #[arg(default_value = "/")]
        path: String,
    },
    /// Show one file or directory
    Stat { path: String },
    /// Write a file to stdout
    Cat { path: String },
    /// Upload a local file
    Put {
        /// Local source file
        local: PathBuf,
        /// Destination path in the store
        remote: String,
    },
    /// Download a file
    Get {
        /// Source path in the store
        remote: String,
        /// Local destination file
        local: PathBuf,
    },
    /// Create a directory (succeeds if it already exists)
    Mkdir { path: String },
    /// Remove a file (succeeds if it does not exist)
    Rm { path: String },
    /// Remove an empty directory
    Rmdir { path: String },
    /// Rename a file
    Mv { from: String, to: String },
}

#[allow(clippy::print_stdout)]
#[tokio::main]
async fn main() -> Result<()> {
    diagnostics::init_diagnostics();

    let cli = Cli::parse();
    let fs = cli.store.open()?;

    match &cli.command {
        Commands::Ls { path } => print!("{}", list_command(&fs, path, cli.json).await?),
        Commands::Stat { path } => print!("{}", stat_command(&fs, path, cli.json).await?),
        Commands::Cat { path } => cat_command(&fs, path).await?,
        Commands::Put { local, remote } => {
            let info = put_command(&fs, local, remote).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            }
        }
        Commands::Get { remote, local } => {
            _ = get_command(&fs, remote, local).await?;
        }
        Commands::Mkdir { path } => mkdir_command(&fs, path).await?,
        Commands::Rm { path } => rm_command(&fs, path).await?,
        Commands::Rmdir { path } => rmdir_command(&fs, path).await?,
        Commands::Mv { from, to } => mv_command(&fs, from, to).await?,
    }
    Ok(())
}
