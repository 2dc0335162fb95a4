//! Cross-encoder ensemble boundary
//!
//! `predict` returns a matrix with outer dimension = models, inner dimension
//! = passages, matching the reranker's expectation that every model scores
//! every passage for the same query.

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait CrossEncoderEnsemble: Send + Sync {
    /// Number of models in the ensemble. Used by `Reranker::new` to reject
    /// construction over an empty ensemble.
    fn model_count(&self) -> usize;

    async fn predict(&self, query: &str, passages: &[String]) -> Result<Vec<Vec<f32>>>;
}
