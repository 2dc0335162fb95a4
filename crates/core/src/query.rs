//! Query-side data model: `SearchQuery`, `SearchType`, `IndexFilters`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which DocumentIndex modality a query should be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchType {
    Keyword,
    Semantic,
    Hybrid,
}

/// Predicates passed through to the DocumentIndex verbatim; the core never
/// inspects these fields itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexFilters {
    pub source_types: Vec<String>,
    pub document_sets: Vec<String>,
    pub tags: Vec<String>,
    pub time_cutoff: Option<DateTime<Utc>>,
}

/// A retrieval request as it enters the pipeline.
///
/// Immutable across the pipeline's lifetime: a per-rephrase clone only ever
/// substitutes the `query` field (see `SearchQuery::with_query`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    #[serde(default)]
    pub filters: IndexFilters,
    pub search_type: SearchType,
    #[serde(default)]
    pub favor_recent: bool,
    pub num_hits: usize,
    pub num_rerank: usize,
    pub max_llm_filter_chunks: usize,
    #[serde(default)]
    pub skip_rerank: bool,
    #[serde(default)]
    pub skip_llm_chunk_filter: bool,
}

impl SearchQuery {
    /// Clone this query substituting only the query text — used to fan out
    /// one retrieval per expanded rephrase without touching any other field.
    pub fn with_query(&self, query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_query() -> SearchQuery {
        SearchQuery {
            query: "gold price".to_string(),
            filters: IndexFilters::default(),
            search_type: SearchType::Hybrid,
            favor_recent: false,
            num_hits: 10,
            num_rerank: 5,
            max_llm_filter_chunks: 5,
            skip_rerank: false,
            skip_llm_chunk_filter: false,
        }
    }

    #[test]
    fn with_query_only_substitutes_query_field() {
        let original = base_query();
        let rephrased = original.with_query("precio del oro");

        assert_eq!(rephrased.query, "precio del oro");
        assert_eq!(rephrased.num_hits, original.num_hits);
        assert_eq!(rephrased.num_rerank, original.num_rerank);
        assert_eq!(original.query, "gold price");
    }
}
