//! Thumbing CLI - event-driven avatar thumbnailing.
//!
//! Originals uploaded under the input prefix are resized by the worker and
//! written under the output prefix; each derivative is announced to the
//! notification topic's subscribers.
//!
//! # Usage
//!
//! ```bash
//! # Upload one avatar
//! thumbing upload user-1.png
//!
//! # Upload a directory, keeping relative names
//! thumbing upload ./avatars/
//!
//! # Read a processed object (local store backend)
//! thumbing get avatar/processed/user-1.png -o user-1.png
//!
//! # Show the worker's access policy
//! thumbing policy
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Thumbing - resize uploaded images and notify subscribers.
#[derive(Parser, Debug)]
#[command(name = "thumbing")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "THUMBING_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload originals and wait for their thumbnails
    Upload(cli::upload::UploadArgs),

    /// Read an object from the bucket
    Get(cli::get::GetArgs),

    /// Print the resize worker's access policy
    Policy,

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // THUMBING_* overrides may live in a .env file.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let loaded = cli::load_config(cli.config.as_deref());
    let log_config = match &loaded {
        Ok(config) => config.clone(),
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Check your config file with `thumbing config path`."
            );
            thumbing_core::Config::default()
        }
    };
    logging::init_from_config(&log_config, cli.verbose, cli.json_logs);

    tracing::debug!("Thumbing v{}", thumbing_core::VERSION);

    match cli.command {
        Commands::Upload(args) => cli::upload::execute(loaded?, args).await,
        Commands::Get(args) => cli::get::execute(loaded?, args).await,
        Commands::Policy => cli::policy::execute(loaded?).await,
        Commands::Config(args) => cli::config::execute(cli.config.as_deref(), args).await,
    }
}
