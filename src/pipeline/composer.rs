//! Answer composition: prompt rendering and grounded generation.

use crate::generation::{Generator, SamplingParams};
use crate::pipeline::types::{PipelineError, ScoredChunk};
use std::sync::Arc;

/// Assembles retrieved context and the question into a fixed prompt and
/// invokes the generation capability.
pub struct AnswerComposer {
    generator: Arc<dyn Generator>,
    sampling: SamplingParams,
}

impl AnswerComposer {
    /// Bind the generation capability and its sampling parameters.
    pub fn new(generator: Arc<dyn Generator>, sampling: SamplingParams) -> Self {
        Self {
            generator,
            sampling,
        }
    }

    /// Generate an answer grounded in the retrieved context.
    ///
    /// Returns the raw generated text unmodified; greeting prefixes and
    /// other presentation belong to the serving layer.
    pub async fn answer(
        &self,
        question: &str,
        context: &[ScoredChunk],
    ) -> Result<String, PipelineError> {
        let prompt = render_prompt(question, context);
        tracing::debug!(
            context_chunks = context.len(),
            prompt_chars = prompt.len(),
            "Composing answer"
        );
        let answer = self.generator.generate(&prompt, self.sampling).await?;
        Ok(answer)
    }
}

/// Render the fixed answer-synthesis template.
///
/// Context texts are concatenated in rank order with no re-summarization.
pub fn render_prompt(question: &str, context: &[ScoredChunk]) -> String {
    let context_text = context
        .iter()
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are a helpful assistant answering questions about a document \
collection. Your goal is to provide clear, informative responses grounded in \
the material below.\n\n\
Use the following context to answer the question. If the context contains \
relevant information, explain it clearly and provide helpful details. If you \
can only find partial information, explain what you know and suggest what \
additional information might be helpful.\n\n\
If the context doesn't contain enough information to answer the question, \
politely explain what you cannot answer and suggest related topics you might \
be able to help with instead.\n\n\
Context:\n{context_text}\n\n\
Question:\n{question}\n\n\
Please provide a helpful, informative response:"
    )
}

/// Weave an optional user identity into the question before retrieval.
///
/// Mirrors the serving boundary's contract: identity affects presentation
/// only, never the retrieval or generation configuration.
pub fn personalize_question(question: &str, user_name: Option<&str>) -> String {
    match user_name {
        Some(name) if !name.trim().is_empty() => {
            format!(
                "The user's name is {}. Address them personally. Question: {question}",
                name.trim()
            )
        }
        _ => question.to_string(),
    }
}
