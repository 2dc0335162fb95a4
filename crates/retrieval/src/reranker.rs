//! Cross-encoder ensemble fusion and final ordering (SPEC_FULL §4.5).

use std::sync::Arc;

use search_config::PipelineConfig;
use search_core::{CrossEncoderEnsemble, Error, InferenceChunk, Result};

use crate::score_math::translate_boost_count_to_multiplier;

/// Owns an injected cross-encoder ensemble and the config that supplies its
/// normalization range and boost curve.
pub struct Reranker {
    ensemble: Arc<dyn CrossEncoderEnsemble>,
    config: PipelineConfig,
}

impl Reranker {
    /// Behaviour when the ensemble is empty is unspecified upstream; this
    /// implementation rejects it at construction rather than dividing by
    /// zero models deep inside `rerank`.
    pub fn new(ensemble: Arc<dyn CrossEncoderEnsemble>, config: PipelineConfig) -> Result<Self> {
        if ensemble.model_count() == 0 {
            return Err(Error::Init("cross-encoder ensemble must contain at least one model".to_string()));
        }
        Ok(Self { ensemble, config })
    }

    /// Returns `(ranked_chunks, original_indices, raw_similarity_scores)`,
    /// each aligned to the reranked order. `raw_similarity_scores` is the
    /// unshifted per-model average — exposed only for an optional metrics
    /// sink, never used to influence ordering.
    pub async fn rerank(
        &self,
        query: &str,
        chunks: &[InferenceChunk],
    ) -> Result<(Vec<InferenceChunk>, Vec<usize>, Vec<f32>)> {
        if chunks.is_empty() {
            return Ok((Vec::new(), Vec::new(), Vec::new()));
        }

        let passages: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let matrix = self
            .ensemble
            .predict(query, &passages)
            .await
            .map_err(|e| Error::Rerank(e.to_string()))?;

        let n = chunks.len();
        let n_models = matrix.len().max(1) as f32;

        let mut cross_min = f32::INFINITY;
        for row in &matrix {
            for &v in row {
                cross_min = cross_min.min(v);
            }
        }
        if !cross_min.is_finite() {
            cross_min = 0.0;
        }

        let mut raw = vec![0.0f32; n];
        let mut shifted = vec![0.0f32; n];
        for row in &matrix {
            for (i, &v) in row.iter().enumerate().take(n) {
                raw[i] += v;
                shifted[i] += v - cross_min;
            }
        }
        for v in raw.iter_mut().chain(shifted.iter_mut()) {
            *v /= n_models;
        }

        let model_min = self.config.cross_encoder_range_min;
        let model_max = self.config.cross_encoder_range_max;
        let range = model_max - model_min;

        let normalized: Vec<f32> = (0..n)
            .map(|i| {
                let boost = translate_boost_count_to_multiplier(chunks[i].boost, &self.config);
                let recency = chunks[i].recency_bias;
                let boosted = shifted[i] * boost * recency;
                (boosted + cross_min - model_min) / range
            })
            .collect();

        let mut indices: Vec<usize> = (0..n).collect();
        indices.sort_by(|&a, &b| {
            normalized[b].partial_cmp(&normalized[a]).unwrap_or(std::cmp::Ordering::Equal)
        });

        let ranked_chunks: Vec<InferenceChunk> = indices
            .iter()
            .map(|&i| {
                let mut c = chunks[i].clone();
                c.score = Some(normalized[i]);
                c
            })
            .collect();
        let raw_sorted: Vec<f32> = indices.iter().map(|&i| raw[i]).collect();

        Ok((ranked_chunks, indices, raw_sorted))
    }
}
