//! Grounding prompt assembly.
//!
//! The retrieved chunks are concatenated in rank order into a single context
//! block and substituted, together with the question, into the grounding
//! template. The template tells the model to answer only from the context and
//! to reply with the fallback phrase otherwise.

use crate::config::Prompts;
use crate::vector_index::RetrievalResult;
use std::collections::HashMap;

/// Separator placed between retrieved chunks unless configured otherwise.
pub const DEFAULT_CONTEXT_SEPARATOR: &str = "\n\n";

/// Context and question ready to be rendered into the grounding template.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundingPrompt {
    pub context: String,
    pub question: String,
}

impl GroundingPrompt {
    /// Concatenate the retrieved chunks, best first, into one context block.
    ///
    /// The question is kept verbatim.
    pub fn assemble(results: &RetrievalResult, question: &str, separator: &str) -> Self {
        let context = results
            .iter()
            .map(|r| r.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join(separator);

        Self {
            context,
            question: question.to_string(),
        }
    }

    /// Render into the configured grounding template.
    pub fn render(&self, prompts: &Prompts) -> String {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), self.context.clone());
        vars.insert("question".to_string(), self.question.clone());
        prompts.render_with_custom(&prompts.rag.grounding, &vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::TranscriptChunk;
    use crate::config::FALLBACK_ANSWER;
    use crate::vector_index::SearchResult;

    fn hit(text: &str, score: f32, position: usize) -> SearchResult {
        SearchResult {
            chunk: TranscriptChunk::new(text),
            score,
            position,
        }
    }

    #[test]
    fn test_context_follows_rank_order() {
        let results = vec![hit("second chunk", 0.9, 1), hit("first chunk", 0.4, 0)];
        let prompt = GroundingPrompt::assemble(&results, "What?", DEFAULT_CONTEXT_SEPARATOR);
        assert_eq!(prompt.context, "second chunk\n\nfirst chunk");
    }

    #[test]
    fn test_custom_separator() {
        let results = vec![hit("a", 0.9, 0), hit("b", 0.8, 1)];
        let prompt = GroundingPrompt::assemble(&results, "q", "\n---\n");
        assert_eq!(prompt.context, "a\n---\nb");
    }

    #[test]
    fn test_rendered_prompt_contains_fallback_and_question() {
        let question = "What does {{context}} mean in a template? \"quotes\" & newlines\nok";
        let results = vec![hit("Templates use placeholders.", 0.7, 0)];
        let rendered =
            GroundingPrompt::assemble(&results, question, DEFAULT_CONTEXT_SEPARATOR)
                .render(&Prompts::default());

        assert!(rendered.contains(FALLBACK_ANSWER));
        assert!(rendered.contains("ONLY based on the context"));
        assert!(rendered.contains(question));
        assert!(rendered.contains("Context -> Templates use placeholders."));
    }

    #[test]
    fn test_empty_retrieval_renders_empty_context() {
        let rendered = GroundingPrompt::assemble(&Vec::new(), "Anything?", DEFAULT_CONTEXT_SEPARATOR)
            .render(&Prompts::default());
        assert!(rendered.contains("Context -> \n"));
        assert!(rendered.ends_with("Question -> Anything?"));
    }
}
