//! LLM-backed query rephraser boundary (QueryExpander's collaborator)

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait LLMRephraser: Send + Sync {
    /// Produce rephrases of `query` covering the languages named in
    /// `languages_spec` (a free-form spec such as `"en,es"`, opaque to the
    /// core beyond being threaded through verbatim).
    async fn rephrase(&self, query: &str, languages_spec: &str) -> Result<Vec<String>>;
}
