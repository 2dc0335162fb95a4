//! LLM relevance judge boundary (RelevanceFilter's collaborator)

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait LLMChunkJudge: Send + Sync {
    /// Evaluate each of `contents` against `query`, returning one boolean
    /// per input content in the same order.
    async fn batch_eval(&self, query: &str, contents: &[String]) -> Result<Vec<bool>>;
}
