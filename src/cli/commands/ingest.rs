//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use anyhow::Result;

/// Run the ingest command.
pub async fn run_ingest(url: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ingest, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let pipeline = Pipeline::new(&settings)?;

    Output::info(&format!("Loading: {}", url));
    let spinner = Output::spinner("Fetching transcript and building index...");

    match pipeline.ingest(url).await {
        Ok(chunks) => {
            spinner.finish_and_clear();
            Output::success(&format!("Indexed {} chunks", chunks));
            Output::kv("Index", &settings.index_path().display().to_string());
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to load video: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
