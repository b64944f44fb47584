//! Answer assembly: prompt construction, the LLM call, and the
//! context-only fallback.

use rig::completion::Prompt;

use crate::types::{RagError, RetrievedContext};

/// Instruction constraining the model to the retrieved context.
pub const SYSTEM_PROMPT: &str = "You are an engineering analytics assistant for semiconductor workflows. \
     Answer using ONLY the provided context. \
     If the context is insufficient, say what is missing. \
     Include citations like [1], [2] tied to the sources.";

const FALLBACK_NOTICE: &str =
    "OPENAI_API_KEY not set. Showing retrieved context only (no LLM response).";

const FALLBACK_PREVIEW_CHARS: usize = 240;

/// Outcome of answer composition: LLM-backed or local-only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Answer {
    /// Raw completion text returned by the model.
    Generated(String),
    /// Deterministic listing of the retrieved contexts.
    ContextOnly(String),
}

impl Answer {
    pub fn text(&self) -> &str {
        match self {
            Self::Generated(text) | Self::ContextOnly(text) => text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::ContextOnly(_))
    }
}

/// Deterministic fallback: a notice line plus one numbered line per context,
/// each preview capped at 240 characters.
pub fn fallback_answer(contexts: &[RetrievedContext]) -> String {
    let mut lines = vec![FALLBACK_NOTICE.to_string()];
    for (i, ctx) in contexts.iter().enumerate() {
        lines.push(format!(
            "[{}] {}: {}",
            i + 1,
            ctx.source,
            truncate_chars(&ctx.text, FALLBACK_PREVIEW_CHARS)
        ));
    }
    lines.join("\n")
}

/// User message: the question, an enumerated source list, and the full
/// numbered context blocks.
pub fn build_user_prompt(query: &str, contexts: &[RetrievedContext]) -> String {
    let citation_block = contexts
        .iter()
        .enumerate()
        .map(|(i, ctx)| format!("[{}] {}", i + 1, ctx.source))
        .collect::<Vec<_>>()
        .join("\n");
    let context_text = contexts
        .iter()
        .enumerate()
        .map(|(i, ctx)| format!("Source [{}] ({}):\n{}", i + 1, ctx.source, ctx.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Question: {query}\n\n\
         Available sources:\n{citation_block}\n\n\
         Context:\n{context_text}\n\n\
         Respond with a concise answer and citations."
    )
}

/// Asks the model to answer `query` from the retrieved contexts.
///
/// The caller configures the agent (preamble, temperature); failures from
/// the provider propagate wrapped in [`RagError::Completion`], with no retry.
pub async fn generate_answer(
    llm: &impl Prompt,
    query: &str,
    contexts: &[RetrievedContext],
) -> Result<String, RagError> {
    llm.prompt(build_user_prompt(query, contexts))
        .await
        .map_err(|err| RagError::Completion(err.to_string()))
}

/// Truncates to at most `max` characters, appending `...` when text was
/// dropped. Counts characters, not bytes.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut truncated: String = text.chars().take(max).collect();
        truncated.push_str("...");
        truncated
    }
}
