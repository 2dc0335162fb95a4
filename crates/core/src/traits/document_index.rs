//! The document index capability boundary
//!
//! The original system modelled this as a mixin hierarchy
//! (`KeywordCapable` / `VectorCapable` / `HybridCapable` composed into a
//! `DocumentIndex`). Here it is a single trait with a fixed method set;
//! an implementation that cannot support a given modality should reject at
//! dispatch with `Error::InvalidSearchFlow` rather than refusing to implement
//! the trait. Index lifecycle concerns (creating/updating/deleting documents,
//! admin search) are out of scope for this crate and are not part of the
//! trait.
//!
//! Implementations: supplied by the caller; this crate ships none.

use async_trait::async_trait;

use crate::chunk::InferenceChunk;
use crate::error::Result;
use crate::query::IndexFilters;

#[async_trait]
pub trait DocumentIndex: Send + Sync {
    async fn keyword_retrieval(
        &self,
        query: &str,
        filters: &IndexFilters,
        favor_recent: bool,
        num_to_retrieve: usize,
    ) -> Result<Vec<InferenceChunk>>;

    async fn semantic_retrieval(
        &self,
        query: &str,
        filters: &IndexFilters,
        favor_recent: bool,
        num_to_retrieve: usize,
    ) -> Result<Vec<InferenceChunk>>;

    async fn hybrid_retrieval(
        &self,
        query: &str,
        filters: &IndexFilters,
        favor_recent: bool,
        num_to_retrieve: usize,
        hybrid_alpha: Option<f32>,
    ) -> Result<Vec<InferenceChunk>>;
}
