use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod api;
mod cli;
mod config;
mod daemon;
mod error;
mod playlist;
mod store;

use crate::cli::ApiClient;
use crate::config::{Config, DEFAULT_ADDR, DEFAULT_MAX_UPLOAD_MB};

#[derive(Parser)]
#[command(name = "songlist")]
#[command(about = "Ordered playlist of uploaded audio files, served over HTTP", long_about = None)]
#[command(version)]
struct Cli {
    /// Server URL used by the client commands
    #[arg(long, global = true, env = "SONGLIST_SERVER", default_value = cli::DEFAULT_SERVER)]
    server: String,

    #[command(flatten)]
    serve: ServeArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server in the foreground (the default)
    Serve,

    /// Show the playlist in order
    List,
    /// Show the current song
    Current,
    /// Advance to the next song
    Next,
    /// Go back to the previous song
    Prev,
    /// Upload audio files and append them
    Add { paths: Vec<PathBuf> },
    /// Delete a song and its file
    Remove { filename: String },
    /// Move a song to a zero-based position
    Move { filename: String, position: usize },
}

/// Server options, accepted before or after `serve`.
#[derive(Args)]
struct ServeArgs {
    /// Address to listen on
    #[arg(long, global = true, env = "SONGLIST_ADDR", default_value = DEFAULT_ADDR)]
    addr: String,

    /// Directory holding uploaded files
    #[arg(long, global = true, env = "SONGLIST_UPLOADS_DIR")]
    uploads_dir: Option<PathBuf>,

    /// Allowed file extensions (defaults to mp3)
    #[arg(long = "extension", global = true, value_delimiter = ',')]
    extensions: Vec<String>,

    /// Largest accepted upload, in MiB
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_UPLOAD_MB)]
    max_upload_mb: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let rt = tokio::runtime::Runtime::new()?;
    let client = ApiClient::new(&cli.server);

    match cli.command {
        Some(Commands::Serve) | None => serve(&rt, cli.serve)?,
        Some(Commands::List) => rt.block_on(cli::show_playlist(&client))?,
        Some(Commands::Current) => rt.block_on(cli::show_current(&client))?,
        Some(Commands::Next) => rt.block_on(cli::next(&client))?,
        Some(Commands::Prev) => rt.block_on(cli::prev(&client))?,
        Some(Commands::Add { paths }) => rt.block_on(cli::add(&client, &paths))?,
        Some(Commands::Remove { filename }) => rt.block_on(cli::remove(&client, &filename))?,
        Some(Commands::Move { filename, position }) => {
            rt.block_on(cli::move_song(&client, &filename, position))?
        }
    }

    Ok(())
}

fn serve(rt: &tokio::runtime::Runtime, args: ServeArgs) -> Result<()> {
    let config = Config::new(
        &args.addr,
        args.uploads_dir,
        &args.extensions,
        args.max_upload_mb,
    )?;
    rt.block_on(daemon::start(config))
}
