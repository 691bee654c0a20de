//! The `thumbing upload` command.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use thumbing_core::store::keys::identifier;
use thumbing_core::{Config, DiscoveredFile, FileDiscovery, Pipeline, StoreError};

/// Arguments for the `upload` command.
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Image file or directory of images
    pub path: PathBuf,

    /// Identifier to upload a single file as (defaults to its file name)
    #[arg(long)]
    pub id: Option<String>,
}

/// Result line printed for each upload.
#[derive(Debug, serde::Serialize)]
struct UploadReport {
    source: String,
    output: Option<String>,
    url: Option<String>,
}

/// Execute the upload command.
pub async fn execute(config: Config, args: UploadArgs) -> anyhow::Result<()> {
    let mut files = FileDiscovery::new().discover(&args.path);
    if files.is_empty() {
        anyhow::bail!("No supported images found at {:?}", args.path);
    }

    if let Some(id) = args.id {
        if files.len() != 1 {
            anyhow::bail!("--id applies to a single file, found {}", files.len());
        }
        files[0].name = id;
    }

    let pipeline = Pipeline::wire(config).await?;
    tracing::info!(
        "Uploading {} file(s), {} bytes",
        files.len(),
        FileDiscovery::total_size(&files)
    );

    let progress = create_progress_bar(files.len() as u64);
    let start_time = Instant::now();
    let mut uploaded: Vec<(&DiscoveredFile, String)> = Vec::new();

    for file in &files {
        let bytes = tokio::fs::read(&file.path).await?;
        match pipeline.upload(&file.name, bytes).await {
            Ok(object) => uploaded.push((file, object.key)),
            Err(e) => tracing::error!("Failed: {:?} - {}", file.path, e),
        }
        progress.inc(1);
    }

    progress.set_message("resizing...");
    pipeline.wait_idle().await;
    progress.finish_with_message(format!("done in {:.1}s", start_time.elapsed().as_secs_f64()));

    let failed = files.len() - uploaded.len();
    for (file, source) in uploaded {
        let output_key = pipeline.output_key(&file.name);
        let output = match pipeline.store().head(&output_key).await {
            Ok(object) => Some(object.key),
            Err(StoreError::NotFound { .. }) => None,
            Err(e) => return Err(e.into()),
        };
        let url = output
            .as_deref()
            .and_then(|key| identifier(key, &pipeline.config().bucket.output_prefix))
            .and_then(|id| id.strip_suffix(".png"))
            .map(|id| pipeline.public_url(id));
        let report = UploadReport {
            source,
            output,
            url,
        };
        println!("{}", serde_json::to_string(&report)?);
    }

    if failed > 0 {
        anyhow::bail!("{failed} upload(s) failed");
    }
    Ok(())
}

/// Create a progress bar for uploads.
fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb.set_message("uploading...");
    pb
}
