//! Unions and deduplicates chunk lists from parallel retrievals (SPEC_FULL §4.3).

use std::collections::HashMap;

use search_core::{ChunkKey, InferenceChunk};

pub struct ResultMerger;

impl ResultMerger {
    /// Flattens `chunk_sets`, keeps the highest-scoring chunk per
    /// `(document_id, chunk_id)`, and returns them sorted by score
    /// descending (`None` treated as 0).
    ///
    /// First-seen order is tracked separately from the score-keeping map so
    /// that ties after the stable sort retain the order chunks first
    /// appeared in across the flattened input — this is what keeps merge
    /// output reproducible when the same chunk comes back from more than one
    /// rephrase's retrieval.
    pub fn merge(chunk_sets: Vec<Vec<InferenceChunk>>) -> Vec<InferenceChunk> {
        let mut order: Vec<ChunkKey> = Vec::new();
        let mut by_key: HashMap<ChunkKey, InferenceChunk> = HashMap::new();

        for chunk in chunk_sets.into_iter().flatten() {
            let key = chunk.key();
            match by_key.get(&key) {
                Some(existing) if existing.score_or_zero() >= chunk.score_or_zero() => {}
                Some(_) => {
                    by_key.insert(key, chunk);
                }
                None => {
                    order.push(key.clone());
                    by_key.insert(key, chunk);
                }
            }
        }

        let mut merged: Vec<InferenceChunk> =
            order.into_iter().filter_map(|key| by_key.remove(&key)).collect();
        merged.sort_by(|a, b| {
            b.score_or_zero()
                .partial_cmp(&a.score_or_zero())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(document_id: &str, chunk_id: i64, score: Option<f32>) -> InferenceChunk {
        InferenceChunk {
            document_id: document_id.to_string(),
            chunk_id,
            content: "content".to_string(),
            semantic_identifier: "Title".to_string(),
            source_type: "web".to_string(),
            source_links: Default::default(),
            blurb: "blurb".to_string(),
            match_highlights: Vec::new(),
            boost: 0,
            recency_bias: 1.0,
            updated_at: None,
            hidden: false,
            score,
        }
    }

    #[test]
    fn dedup_keeps_the_higher_score() {
        let merged = ResultMerger::merge(vec![
            vec![chunk("doc-1", 0, Some(0.2))],
            vec![chunk("doc-1", 0, Some(0.9))],
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].score, Some(0.9));
    }

    #[test]
    fn sorts_descending_treating_none_as_zero() {
        let merged = ResultMerger::merge(vec![vec![
            chunk("doc-1", 0, None),
            chunk("doc-2", 0, Some(0.5)),
            chunk("doc-3", 0, Some(-0.1)),
        ]]);
        let scores: Vec<f32> = merged.iter().map(InferenceChunk::score_or_zero).collect();
        assert_eq!(scores, vec![0.5, 0.0, -0.1]);
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let merged = ResultMerger::merge(vec![vec![
            chunk("doc-a", 0, Some(0.5)),
            chunk("doc-b", 0, Some(0.5)),
            chunk("doc-c", 0, Some(0.5)),
        ]]);
        let ids: Vec<&str> = merged.iter().map(|c| c.document_id.as_str()).collect();
        assert_eq!(ids, vec!["doc-a", "doc-b", "doc-c"]);
    }

    #[test]
    fn merge_is_idempotent_on_an_already_merged_list() {
        let once = ResultMerger::merge(vec![vec![
            chunk("doc-1", 0, Some(0.9)),
            chunk("doc-2", 0, Some(0.4)),
        ]]);
        let twice = ResultMerger::merge(vec![once.clone()]);
        let once_keys: Vec<_> = once.iter().map(InferenceChunk::key).collect();
        let twice_keys: Vec<_> = twice.iter().map(InferenceChunk::key).collect();
        assert_eq!(once_keys, twice_keys);
    }

    #[test]
    fn merge_is_commutative_modulo_tie_order() {
        let a = ResultMerger::merge(vec![
            vec![chunk("doc-1", 0, Some(0.9))],
            vec![chunk("doc-2", 0, Some(0.4))],
        ]);
        let b = ResultMerger::merge(vec![
            vec![chunk("doc-2", 0, Some(0.4))],
            vec![chunk("doc-1", 0, Some(0.9))],
        ]);
        let a_keys: Vec<_> = a.iter().map(InferenceChunk::key).collect();
        let b_keys: Vec<_> = b.iter().map(InferenceChunk::key).collect();
        assert_eq!(a_keys, b_keys);
    }
}
