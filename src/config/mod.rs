//! Configuration module for Svar.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts, FALLBACK_ANSWER};
pub use settings::{
    ChunkingSettings, EmbeddingSettings, GeneralSettings, IndexSettings, PromptSettings,
    RagSettings, RetrySettings, ServerSettings, Settings, TranscriptSettings,
};
