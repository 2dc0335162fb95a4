//! Embedding model boundary
//!
//! Only used when the pipeline needs to embed a query directly; the rerank
//! path does not call through this trait.
//!
//! Query embedding itself (and the `PipelineConfig::asym_query_prefix` it
//! would consume) sits upstream of `search-retrieval`'s `DocumentIndex`
//! boundary — the index is handed already-embedded queries. Nothing in this
//! pipeline constructs an `EmbeddingModel` or calls `encode`; the trait is
//! kept as the mandated seam a caller's `DocumentIndex` implementation can
//! build on, not because this crate is inert by omission.

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
