//! Status command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use crate::source::watch_url;
use anyhow::Result;

/// Run the status command.
pub async fn run_status(settings: Settings) -> Result<()> {
    let pipeline = Pipeline::new(&settings)?;
    pipeline.restore().await?;
    let status = pipeline.status()?;

    Output::header("Svar Status");
    Output::kv("State", &status.state.to_string());
    Output::kv("Index", &status.location);

    match status.metadata {
        Some(metadata) => {
            if let Some(video_id) = &metadata.source_id {
                Output::kv("Video", &watch_url(video_id));
            }
            Output::kv("Chunks", &status.chunks.to_string());
            Output::kv(
                "Embedding",
                &format!("{} ({} dims)", metadata.embedding_model, metadata.dimensions),
            );
            Output::kv("Built", &metadata.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string());
            Output::kv("Index ID", &metadata.id.to_string());
        }
        None => {
            println!();
            Output::info("No video loaded yet. Use 'svar ingest <url>' to load one.");
        }
    }

    Ok(())
}
