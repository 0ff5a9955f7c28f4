//! Answer generation from a fully rendered prompt.

mod openai;

pub use openai::OpenAIGenerator;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for text generation services.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce an answer for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
