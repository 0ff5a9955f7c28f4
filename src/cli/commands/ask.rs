//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::SvarError;
use crate::pipeline::Pipeline;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    show_sources: bool,
    top_k: Option<usize>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let mut pipeline = Pipeline::new(&settings)?;
    if let Some(k) = top_k {
        pipeline = pipeline.with_top_k(k);
    }
    pipeline.restore().await?;

    let spinner = Output::spinner("Thinking...");

    match pipeline.ask_with_sources(question).await {
        Ok(response) => {
            spinner.finish_and_clear();

            println!("\n{}\n", response.answer);

            if show_sources && !response.sources.is_empty() {
                Output::header("Sources");
                for (i, source) in response.sources.iter().enumerate() {
                    Output::source(i + 1, source);
                }
            }
        }
        Err(SvarError::NoIndex) => {
            spinner.finish_and_clear();
            Output::warning(&SvarError::NoIndex.to_string());
            Output::info("Run 'svar ingest <url>' first.");
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
