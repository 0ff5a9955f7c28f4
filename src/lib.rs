//! Svar - ask questions about a video
//!
//! Loads the transcript of a YouTube video, splits it into overlapping chunks,
//! embeds them into a local vector index and answers questions with a language
//! model that is told to use only the retrieved transcript text.
//!
//! The name "Svar" is Norwegian for "answer."
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Settings and prompt templates
//! - `source` - Video identifier parsing
//! - `transcript` - Transcript acquisition (YouTube captions via yt-dlp)
//! - `chunking` - Text splitting strategies
//! - `embedding` - Embedding generation
//! - `vector_index` - In-memory index with SQLite persistence
//! - `rag` - Retrieval and grounding prompt assembly
//! - `generation` - Answer generation
//! - `retry` - Bounded retry for external services
//! - `pipeline` - Ingestion and question answering over the active index
//!
//! # Example
//!
//! ```rust,no_run
//! use svar::config::Settings;
//! use svar::pipeline::Pipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = Pipeline::new(&settings)?;
//!
//!     let chunks = pipeline.ingest("https://www.youtube.com/watch?v=dQw4w9WgXcQ").await?;
//!     println!("Indexed {} chunks", chunks);
//!
//!     let answer = pipeline.ask("What is the song about?").await?;
//!     println!("{}", answer);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod openai;
pub mod pipeline;
pub mod rag;
pub mod retry;
pub mod source;
pub mod transcript;
pub mod vector_index;

pub use error::{Result, SvarError};
