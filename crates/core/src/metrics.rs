//! Optional metrics sinks (SPEC_FULL §6).
//!
//! Implementations:
//! - a no-op sink for callers who don't care
//! - an in-memory sink used by pipeline tests to assert on emitted records

use crate::query::SearchType;

/// Upper bound on the content prefix carried by a `ChunkMetric`.
pub const MAX_METRICS_CONTENT: usize = 256;

#[derive(Debug, Clone)]
pub struct ChunkMetric {
    pub document_id: String,
    pub content_prefix: String,
    pub first_link: Option<String>,
    pub score: f32,
}

#[derive(Debug, Clone)]
pub struct RetrievalMetrics {
    pub search_type: SearchType,
    pub chunks: Vec<ChunkMetric>,
}

#[derive(Debug, Clone)]
pub struct RerankMetrics {
    pub chunks: Vec<ChunkMetric>,
    pub raw_similarity_scores: Vec<f32>,
}

/// Degraded-mode indicator: the pipeline still returned valid data but one
/// component failed and fell back to its documented recovery behavior.
#[derive(Debug, Clone)]
pub struct PartialFailure {
    pub component: String,
    pub reason: String,
}

/// Sink for the optional observability events the pipeline can emit.
///
/// All methods have no-op defaults so a caller only needs to implement the
/// events it cares about.
pub trait MetricsSink: Send + Sync {
    fn retrieval(&self, _metrics: RetrievalMetrics) {}
    fn rerank(&self, _metrics: RerankMetrics) {}
    fn partial_failure(&self, _failure: PartialFailure) {}
}

/// A sink that discards every event.
pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {}
