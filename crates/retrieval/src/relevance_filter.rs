//! LLM yes/no relevance judging (SPEC_FULL §4.7).

use std::sync::Arc;

use search_core::{Error, InferenceChunk, LLMChunkJudge, Result};

pub struct RelevanceFilter {
    judge: Arc<dyn LLMChunkJudge>,
}

impl RelevanceFilter {
    pub fn new(judge: Arc<dyn LLMChunkJudge>) -> Self {
        Self { judge }
    }

    /// Truncates to `max_llm_filter_chunks`, batches the remainder through
    /// the judge, and returns the `unique_id` of every chunk the judge
    /// marked relevant. A judge failure surfaces as `Error::Judge`; the
    /// caller (`Pipeline`) is responsible for the fail-open, all-true
    /// recovery — this type reports the failure rather than swallowing it.
    pub async fn filter(
        &self,
        query: &str,
        chunks: &[InferenceChunk],
        max_llm_filter_chunks: usize,
    ) -> Result<Vec<String>> {
        let cutoff = chunks.len().min(max_llm_filter_chunks);
        let truncated = &chunks[..cutoff];
        let contents: Vec<String> = truncated.iter().map(|c| c.content.clone()).collect();

        let mask = self
            .judge
            .batch_eval(query, &contents)
            .await
            .map_err(|e| Error::Judge(e.to_string()))?;

        Ok(truncated
            .iter()
            .zip(mask.iter())
            .filter(|(_, &keep)| keep)
            .map(|(chunk, _)| chunk.unique_id())
            .collect())
    }
}
