//! Retrieval dispatch, fusion, reranking and relevance filtering pipeline
//!
//! Leaf-first module layout, mirroring `SPEC_FULL.md` §2:
//! - [`text_normalizer`] — lemmatization, stopword elision, dedup canonicalization
//! - [`dispatcher`] — routes a query to the right `DocumentIndex` modality
//! - [`merger`] — unions and deduplicates chunk lists from parallel retrievals
//! - [`score_math`] — boost/recency normalization shared by the no-rerank path
//! - [`reranker`] — cross-encoder ensemble fusion and final ordering
//! - [`query_expander`] — LLM-delegated multilingual rephrasing
//! - [`relevance_filter`] — LLM yes/no relevance judging
//! - [`pipeline`] — orchestrates all of the above behind a two-yield streaming API

pub mod dispatcher;
pub mod merger;
pub mod pipeline;
pub mod query_expander;
pub mod relevance_filter;
pub mod reranker;
pub mod score_math;
pub mod text_normalizer;

pub use dispatcher::RetrievalDispatcher;
pub use merger::ResultMerger;
pub use pipeline::{Pipeline, SearchStream};
pub use query_expander::QueryExpander;
pub use relevance_filter::RelevanceFilter;
pub use reranker::Reranker;
pub use score_math::{apply_boost, translate_boost_count_to_multiplier};
