//! The `thumbing get` command.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use thumbing_core::{Config, ObjectStore};

/// Arguments for the `get` command.
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Object key, e.g. avatar/processed/user-1.png
    pub key: String,

    /// Write the object to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Execute the get command.
///
/// Reads straight from the configured store without wiring routes, so
/// nothing is triggered.
pub async fn execute(config: Config, args: GetArgs) -> anyhow::Result<()> {
    let store = thumbing_core::store::from_config(&config).await?;
    let bytes = store.get(&args.key).await?;
    tracing::debug!(key = %args.key, bytes = bytes.len(), "Object read");

    match args.output {
        Some(path) => {
            tokio::fs::write(&path, &bytes).await?;
            println!("Wrote {} bytes to {}", bytes.len(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
