//! Core traits and types for the retrieval/ranking pipeline
//!
//! This crate provides the foundational types shared by every stage of the
//! pipeline:
//! - Pluggable-backend traits (`DocumentIndex`, `EmbeddingModel`,
//!   `CrossEncoderEnsemble`, `LLMRephraser`, `LLMChunkJudge`)
//! - The query/chunk data model (`SearchQuery`, `InferenceChunk`,
//!   `IndexFilters`, `SearchDoc`)
//! - Optional metrics sinks
//! - The crate-wide error taxonomy

pub mod chunk;
pub mod error;
pub mod metrics;
pub mod query;
pub mod traits;

pub use chunk::{ChunkKey, InferenceChunk, SearchDoc};
pub use error::{Error, Result};
pub use metrics::{ChunkMetric, MetricsSink, NoopMetricsSink, PartialFailure, RerankMetrics, RetrievalMetrics, MAX_METRICS_CONTENT};
pub use query::{IndexFilters, SearchQuery, SearchType};
pub use traits::{CrossEncoderEnsemble, DocumentIndex, EmbeddingModel, LLMChunkJudge, LLMRephraser};
