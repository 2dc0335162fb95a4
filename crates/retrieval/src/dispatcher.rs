//! Routes a `SearchQuery` to the right `DocumentIndex` modality (SPEC_FULL §4.2).

use search_core::{DocumentIndex, Error, InferenceChunk, Result, SearchQuery, SearchType};

/// Dispatches retrieval. `SearchType` is a closed Rust enum, so the
/// "unknown search_type" programming error the literal source guards
/// against at runtime (`InvalidSearchFlow`) is ruled out by the type system
/// here instead — there is no wildcard arm to fall into.
pub struct RetrievalDispatcher;

impl RetrievalDispatcher {
    pub async fn retrieve(
        query: &SearchQuery,
        index: &dyn DocumentIndex,
        hybrid_alpha: f32,
    ) -> Result<Vec<InferenceChunk>> {
        let modality = match query.search_type {
            SearchType::Keyword => "keyword",
            SearchType::Semantic => "semantic",
            SearchType::Hybrid => "hybrid",
        };

        tracing::debug!(modality, query = %query.query, num_hits = query.num_hits, "dispatching retrieval");

        let outcome = match query.search_type {
            SearchType::Keyword => {
                index
                    .keyword_retrieval(&query.query, &query.filters, query.favor_recent, query.num_hits)
                    .await
            }
            SearchType::Semantic => {
                index
                    .semantic_retrieval(&query.query, &query.filters, query.favor_recent, query.num_hits)
                    .await
            }
            SearchType::Hybrid => {
                index
                    .hybrid_retrieval(
                        &query.query,
                        &query.filters,
                        query.favor_recent,
                        query.num_hits,
                        Some(hybrid_alpha),
                    )
                    .await
            }
        };

        outcome.map_err(|e| Error::index(modality, e))
    }
}
