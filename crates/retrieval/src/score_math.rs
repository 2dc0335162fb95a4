//! Boost/recency normalization shared by the no-rerank path (SPEC_FULL §4.6).

use search_config::PipelineConfig;
use search_core::InferenceChunk;

/// Maps a signed feedback count to a positive multiplier.
///
/// Resolves the SPEC_FULL Open Question on the exact curve shape: a bounded
/// logarithmic curve, symmetric around `b = 0`, clamped to
/// `[min_boost_multiplier, max_boost_multiplier]`. Monotonically
/// non-decreasing in `b`, and `translate_boost_count_to_multiplier(0, _) ==
/// 1.0` exactly (not merely "near 1.0").
pub fn translate_boost_count_to_multiplier(boost: i32, config: &PipelineConfig) -> f32 {
    let b = boost as f32;
    let raw = if b >= 0.0 {
        1.0 + config.boost_slope * (1.0 + b).ln()
    } else {
        1.0 / (1.0 + config.boost_slope * (1.0 - b).ln())
    };
    raw.clamp(config.min_boost_multiplier, config.max_boost_multiplier)
}

/// Boosts and recency-weights `chunks` when reranking is skipped, then
/// stable-sorts descending and writes the result back into `chunk.score`.
///
/// Only the top `norm_cutoff` chunks define the normalization window
/// (`nmin`/`nmax`), so a long tail of low-scoring chunks can't compress the
/// visible range for the results a user actually sees. When the window
/// collapses to a point (`nmax == nmin`) the division is skipped and the
/// formula falls back to a raw multiplicative boost; the `max(0.0)` clamp is
/// applied in both branches so every returned chunk satisfies the crate-wide
/// `score >= 0` invariant, not just the literal source's primary branch.
pub fn apply_boost(
    chunks: Vec<InferenceChunk>,
    norm_cutoff: usize,
    norm_min: f32,
    norm_max: f32,
    config: &PipelineConfig,
) -> Vec<InferenceChunk> {
    if chunks.is_empty() {
        return chunks;
    }

    let scores: Vec<f32> = chunks.iter().map(InferenceChunk::score_or_zero).collect();
    let cutoff = norm_cutoff.min(scores.len()).max(1);
    let top = &scores[..cutoff];

    let nmin = top.iter().copied().fold(f32::INFINITY, f32::min).min(norm_min);
    let nmax = top.iter().copied().fold(f32::NEG_INFINITY, f32::max).max(norm_max);
    let range = nmax - nmin;

    let boosted: Vec<f32> = chunks
        .iter()
        .zip(scores.iter())
        .map(|(chunk, &score)| {
            let boost = translate_boost_count_to_multiplier(chunk.boost, config);
            let recency = chunk.recency_bias;
            if range != 0.0 {
                ((score - nmin) * boost * recency / range).max(0.0)
            } else {
                (score * boost * recency).max(0.0)
            }
        })
        .collect();

    let mut scored: Vec<(f32, InferenceChunk)> = boosted.into_iter().zip(chunks).collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    scored
        .into_iter()
        .map(|(score, mut chunk)| {
            chunk.score = Some(score);
            chunk
        })
        .collect()
}
