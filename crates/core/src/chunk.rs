//! `InferenceChunk`, its dedup key, and the display-facing `SearchDoc` projection.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique key for a chunk: `(document_id, chunk_id)`.
pub type ChunkKey = (String, i64);

/// A unit of retrieved content.
///
/// Created by the DocumentIndex at retrieval time, mutated only by the
/// reranker/score-math stages (`score` assignment), and discarded once the
/// pipeline returns. No persistent state lives here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceChunk {
    pub document_id: String,
    /// Non-negative, unique per document.
    pub chunk_id: i64,
    pub content: String,
    /// Human title; may be empty for very old records.
    pub semantic_identifier: String,
    pub source_type: String,
    /// Ordered mapping from offset to URL; position 0 is the primary link.
    pub source_links: BTreeMap<usize, String>,
    pub blurb: String,
    /// Inline-markup highlighted fragments, in order.
    pub match_highlights: Vec<String>,
    /// Signed integer feedback count.
    pub boost: i32,
    /// Non-negative multiplier precomputed by the index.
    pub recency_bias: f32,
    pub updated_at: Option<DateTime<Utc>>,
    pub hidden: bool,
    /// Mutated in place by Reranker/ScoreMath; absent means "not yet scored".
    pub score: Option<f32>,
}

impl InferenceChunk {
    pub fn key(&self) -> ChunkKey {
        (self.document_id.clone(), self.chunk_id)
    }

    /// Stable per-chunk identifier used by RelevanceFilter to report its mask.
    pub fn unique_id(&self) -> String {
        format!("{}__{}", self.document_id, self.chunk_id)
    }

    /// `score`, with `None` treated as 0 — the convention used throughout
    /// ResultMerger and ScoreMath.
    pub fn score_or_zero(&self) -> f32 {
        self.score.unwrap_or(0.0)
    }

    pub fn primary_link(&self) -> Option<&str> {
        self.source_links.get(&0).map(String::as_str)
    }
}

/// Display-facing, per-document projection of a ranked chunk list.
///
/// Distinct from `InferenceChunk`: this is what a caller renders, not what the
/// pipeline ranks. Chunks with an empty `semantic_identifier` are dropped from
/// this projection but remain inside the pipeline's own chunk list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchDoc {
    pub document_id: String,
    pub semantic_identifier: String,
    pub link: Option<String>,
    pub blurb: String,
    pub source_type: String,
    pub boost: i32,
    pub hidden: bool,
    pub score: Option<f32>,
    pub match_highlights: Vec<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl SearchDoc {
    /// Build the `SearchDoc` list for a ranked chunk list: one entry per
    /// distinct `document_id` (first chunk wins), dropping chunks whose
    /// `semantic_identifier` is empty.
    pub fn project(chunks: &[InferenceChunk]) -> Vec<SearchDoc> {
        let mut seen = std::collections::HashSet::new();
        let mut docs = Vec::new();

        for chunk in chunks {
            if chunk.semantic_identifier.is_empty() {
                continue;
            }
            if !seen.insert(chunk.document_id.clone()) {
                continue;
            }
            docs.push(SearchDoc {
                document_id: chunk.document_id.clone(),
                semantic_identifier: chunk.semantic_identifier.clone(),
                link: chunk.primary_link().map(str::to_string),
                blurb: chunk.blurb.clone(),
                source_type: chunk.source_type.clone(),
                boost: chunk.boost,
                hidden: chunk.hidden,
                score: chunk.score,
                match_highlights: chunk.match_highlights.clone(),
                updated_at: chunk.updated_at,
            });
        }

        docs
    }
}
