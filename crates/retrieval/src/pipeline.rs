//! Orchestrates retrieval, expansion, reranking, and relevance filtering
//! behind a two-yield streaming API (SPEC_FULL §4.8, §5, §9).

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use search_config::PipelineConfig;
use search_core::{
    ChunkMetric, CrossEncoderEnsemble, DocumentIndex, InferenceChunk, LLMChunkJudge, LLMRephraser,
    MetricsSink, NoopMetricsSink, PartialFailure, Result, RetrievalMetrics, SearchQuery, SearchType,
    MAX_METRICS_CONTENT,
};
use tokio::sync::oneshot;

use crate::dispatcher::RetrievalDispatcher;
use crate::merger::ResultMerger;
use crate::query_expander::QueryExpander;
use crate::relevance_filter::RelevanceFilter;
use crate::reranker::Reranker;
use crate::score_math;

/// Outcome of the (possibly backgrounded) relevance-filter stage: either it
/// never ran / failed open, or it ran and produced the set of relevant
/// `unique_id`s. Keeping identity (`unique_id`) rather than a position-keyed
/// `Vec<bool>` is what lets the mask be built against whatever order the
/// chunks end up displayed in — filtering and reranking can disagree on
/// order without the mask misaligning.
enum FilterOutcome {
    AllTrue,
    Relevant(HashSet<String>),
}

/// Maps a `FilterOutcome` onto `displayed`'s actual order, by chunk identity.
fn build_mask(displayed: &[InferenceChunk], outcome: &FilterOutcome) -> Vec<bool> {
    match outcome {
        FilterOutcome::AllTrue => vec![true; displayed.len()],
        FilterOutcome::Relevant(ids) => displayed.iter().map(|c| ids.contains(&c.unique_id())).collect(),
    }
}

/// Runs the relevance filter (if configured and enabled) as a free function
/// so it can be driven from inside a `tokio::spawn`ed task that outlives the
/// borrow of `&Pipeline` — this is what lets the filter keep running after
/// `search_stream` has already returned the first yield to the caller.
async fn run_filter_task(
    relevance_filter: Option<Arc<RelevanceFilter>>,
    metrics: Arc<dyn MetricsSink>,
    query_text: String,
    max_llm_filter_chunks: usize,
    chunks: Vec<InferenceChunk>,
) -> FilterOutcome {
    let Some(filter) = relevance_filter else {
        return FilterOutcome::AllTrue;
    };
    match filter.filter(&query_text, &chunks, max_llm_filter_chunks).await {
        Ok(relevant_ids) => FilterOutcome::Relevant(relevant_ids.into_iter().collect()),
        Err(e) => {
            tracing::warn!(error = %e, "relevance filter failed, degrading to an all-true mask");
            metrics.partial_failure(PartialFailure {
                component: "relevance_filter".to_string(),
                reason: e.to_string(),
            });
            FilterOutcome::AllTrue
        }
    }
}

/// The two-yield handle returned by [`Pipeline::search_stream`].
///
/// Re-expresses the literal source's "generator that yields exactly twice"
/// as a pair of single-message channels per SPEC_FULL §9: the chunk list is
/// always observable before the relevance mask, regardless of which
/// background stage finishes first.
pub struct SearchStream {
    pub chunks: oneshot::Receiver<Vec<InferenceChunk>>,
    pub mask: oneshot::Receiver<Vec<bool>>,
}

/// Orchestrates ResultMerger, QueryExpander, Reranker, and RelevanceFilter
/// over an injected `DocumentIndex`. Built with the teacher's
/// `with_*`-builder style (see `search-rag`'s `HybridRetriever`): collaborators
/// are optional, and a stage that was never configured behaves as if the
/// caller had asked to skip it.
pub struct Pipeline {
    config: PipelineConfig,
    reranker: Option<Arc<Reranker>>,
    relevance_filter: Option<Arc<RelevanceFilter>>,
    query_expander: Option<Arc<QueryExpander>>,
    metrics: Arc<dyn MetricsSink>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            reranker: None,
            relevance_filter: None,
            query_expander: None,
            metrics: Arc::new(NoopMetricsSink),
        }
    }

    /// Fails if the ensemble is empty — see `Reranker::new`.
    pub fn with_reranker(mut self, ensemble: Arc<dyn CrossEncoderEnsemble>) -> Result<Self> {
        self.reranker = Some(Arc::new(Reranker::new(ensemble, self.config.clone())?));
        Ok(self)
    }

    pub fn with_relevance_filter(mut self, judge: Arc<dyn LLMChunkJudge>) -> Self {
        self.relevance_filter = Some(Arc::new(RelevanceFilter::new(judge)));
        self
    }

    pub fn with_query_expander(mut self, rephraser: Arc<dyn LLMRephraser>) -> Self {
        self.query_expander = Some(Arc::new(QueryExpander::new(rephraser)));
        self
    }

    pub fn with_metrics_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.metrics = sink;
        self
    }

    /// Thin collector over `search_stream`: awaits both yields and returns
    /// them together.
    pub async fn search(&self, query: SearchQuery, index: Arc<dyn DocumentIndex>) -> (Vec<InferenceChunk>, Vec<bool>) {
        let stream = self.search_stream(query, index).await;
        let chunks = stream.chunks.await.unwrap_or_default();
        let mask = stream.mask.await.unwrap_or_default();
        (chunks, mask)
    }

    /// Yields exactly twice: once the chunks are retrieved (or, when rerank
    /// runs, once reranking completes) and once the relevance mask is ready.
    /// Never panics and never returns an error to the caller — every
    /// recoverable failure named in SPEC_FULL §7 degrades locally.
    ///
    /// Crucially, this function *returns* as soon as the first yield is
    /// ready — it never awaits the filter stage itself. The filter (when it
    /// runs) is driven by a detached `tokio::spawn`ed task that fills
    /// `mask_tx` whenever it finishes, so a caller can act on the chunk list
    /// while the filter is still in flight, per §1's "streaming its two
    /// output stages" contract.
    pub async fn search_stream(&self, query: SearchQuery, index: Arc<dyn DocumentIndex>) -> SearchStream {
        let (chunks_tx, chunks_rx) = oneshot::channel();
        let (mask_tx, mask_rx) = oneshot::channel();

        let retrieved = self.retrieve_all(&query, index.as_ref()).await;

        self.metrics.retrieval(RetrievalMetrics {
            search_type: query.search_type,
            chunks: retrieved.iter().map(chunk_metric).collect(),
        });

        if retrieved.is_empty() {
            let _ = chunks_tx.send(Vec::new());
            let _ = mask_tx.send(Vec::new());
            return SearchStream { chunks: chunks_rx, mask: mask_rx };
        }

        let should_rerank =
            query.search_type != SearchType::Keyword && !query.skip_rerank && self.reranker.is_some();
        let should_filter = !query.skip_llm_chunk_filter && self.relevance_filter.is_some();

        if !should_rerank {
            // Early-yield optimization: retrieval order is already final, so
            // apply the no-rerank boost path and send immediately instead of
            // waiting on the filter stage at all.
            let displayed = score_math::apply_boost(
                retrieved,
                self.config.num_reranked_results,
                self.config.sim_score_range_low,
                self.config.sim_score_range_high,
                &self.config,
            );
            let snapshot = displayed.clone();
            let _ = chunks_tx.send(displayed.clone());

            let relevance_filter = self.relevance_filter.clone();
            let metrics = self.metrics.clone();
            let query_text = query.query.clone();
            let max_llm_filter_chunks = query.max_llm_filter_chunks;
            tokio::spawn(async move {
                let outcome = if should_filter {
                    run_filter_task(relevance_filter, metrics, query_text, max_llm_filter_chunks, snapshot).await
                } else {
                    FilterOutcome::AllTrue
                };
                let _ = mask_tx.send(build_mask(&displayed, &outcome));
            });

            return SearchStream { chunks: chunks_rx, mask: mask_rx };
        }

        // Rerank and filter run concurrently over the same retrieved list:
        // the filter is spawned immediately, before rerank is even awaited,
        // and reads only a pre-extracted content snapshot taken before
        // dispatch, so it never races the reranker's in-place `score`
        // mutation (SPEC_FULL §5). The filter's outcome is keyed by
        // `unique_id`, not position, so it stays correctly aligned once
        // mapped onto the post-rerank order below, regardless of how the
        // reranker reordered the head.
        let num_rerank = query.num_rerank.min(retrieved.len());
        let (head, tail) = retrieved.split_at(num_rerank);
        let head = head.to_vec();
        let mut tail = tail.to_vec();
        let snapshot = retrieved_content_snapshot(&head, &tail);

        let filter_handle = should_filter.then(|| {
            tokio::spawn(run_filter_task(
                self.relevance_filter.clone(),
                self.metrics.clone(),
                query.query.clone(),
                query.max_llm_filter_chunks,
                snapshot,
            ))
        });

        let reranker = self.reranker.clone().expect("should_rerank implies a reranker is configured");
        let query_text = query.query.clone();
        let rerank_result = reranker.rerank(&query_text, &head).await;

        let displayed = match rerank_result {
            Ok((mut ranked, _indices, raw_scores)) => {
                self.metrics.rerank(search_core::RerankMetrics {
                    chunks: ranked.iter().map(chunk_metric).collect(),
                    raw_similarity_scores: raw_scores,
                });
                for chunk in &mut tail {
                    chunk.score = None;
                }
                ranked.append(&mut tail);
                ranked
            }
            Err(e) => {
                tracing::warn!(error = %e, "rerank failed, degrading to retrieval order");
                self.metrics.partial_failure(PartialFailure {
                    component: "rerank".to_string(),
                    reason: e.to_string(),
                });
                for chunk in &mut tail {
                    chunk.score = None;
                }
                let mut degraded = head;
                degraded.append(&mut tail);
                degraded
            }
        };

        let _ = chunks_tx.send(displayed.clone());

        // The mask is assembled only after `displayed`'s final order is
        // known, but assembly itself just waits on the already-running (or
        // already-finished) filter task — it does not delay the yield above.
        tokio::spawn(async move {
            let outcome = match filter_handle {
                Some(handle) => handle.await.unwrap_or(FilterOutcome::AllTrue),
                None => FilterOutcome::AllTrue,
            };
            let _ = mask_tx.send(build_mask(&displayed, &outcome));
        });

        SearchStream { chunks: chunks_rx, mask: mask_rx }
    }

    /// Fan-out retrieval across expanded rephrases (SPEC_FULL §4.4, §5).
    /// Never returns an error: total retrieval failure degrades to an empty
    /// chunk list plus a `PartialFailure` metric, matching the "always
    /// yields twice" contract.
    async fn retrieve_all(&self, query: &SearchQuery, index: &dyn DocumentIndex) -> Vec<InferenceChunk> {
        let rephrases = match (&self.query_expander, &self.config.multilingual_query_expansion) {
            (Some(expander), Some(languages_spec)) => expander.expand(&query.query, languages_spec).await,
            _ => vec![query.query.clone()],
        };

        let hybrid_alpha = self.config.hybrid_alpha;
        let futures = rephrases.into_iter().map(|rephrase| {
            let q = query.with_query(rephrase);
            async move { RetrievalDispatcher::retrieve(&q, index, hybrid_alpha).await }
        });
        let results = join_all(futures).await;

        let mut chunk_sets = Vec::with_capacity(results.len());
        let mut last_error = None;
        for result in results {
            match result {
                Ok(chunks) => chunk_sets.push(chunks),
                Err(e) => last_error = Some(e),
            }
        }

        if chunk_sets.is_empty() {
            if let Some(e) = last_error {
                tracing::warn!(error = %e, "all retrieval sub-tasks failed");
                self.metrics.partial_failure(PartialFailure {
                    component: "retrieval".to_string(),
                    reason: e.to_string(),
                });
            }
            return Vec::new();
        }
        if let Some(e) = last_error {
            tracing::warn!(error = %e, "a retrieval sub-task failed; continuing with the remaining results");
            self.metrics.partial_failure(PartialFailure {
                component: "retrieval".to_string(),
                reason: e.to_string(),
            });
        }

        ResultMerger::merge(chunk_sets)
    }
}

fn retrieved_content_snapshot(head: &[InferenceChunk], tail: &[InferenceChunk]) -> Vec<InferenceChunk> {
    head.iter().chain(tail.iter()).cloned().collect()
}

fn chunk_metric(chunk: &InferenceChunk) -> ChunkMetric {
    let content_prefix: String = chunk.content.chars().take(MAX_METRICS_CONTENT).collect();
    ChunkMetric {
        document_id: chunk.document_id.clone(),
        content_prefix,
        first_link: chunk.primary_link().map(str::to_string),
        score: chunk.score_or_zero(),
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use search_core::{Error, IndexFilters};

    use super::*;

    fn chunk(id: i64, content: &str, score: Option<f32>, boost: i32) -> InferenceChunk {
        InferenceChunk {
            document_id: "doc".to_string(),
            chunk_id: id,
            content: content.to_string(),
            semantic_identifier: "Title".to_string(),
            source_type: "web".to_string(),
            source_links: Default::default(),
            blurb: String::new(),
            match_highlights: Vec::new(),
            boost,
            recency_bias: 1.0,
            updated_at: None,
            hidden: false,
            score,
        }
    }

    fn base_query(search_type: SearchType) -> SearchQuery {
        SearchQuery {
            query: "gold price".to_string(),
            filters: IndexFilters::default(),
            search_type,
            favor_recent: false,
            num_hits: 10,
            num_rerank: 2,
            max_llm_filter_chunks: 10,
            skip_rerank: false,
            skip_llm_chunk_filter: false,
        }
    }

    struct FixedIndex {
        chunks: Vec<InferenceChunk>,
    }

    #[async_trait]
    impl DocumentIndex for FixedIndex {
        async fn keyword_retrieval(
            &self,
            _query: &str,
            _filters: &IndexFilters,
            _favor_recent: bool,
            _num_to_retrieve: usize,
        ) -> Result<Vec<InferenceChunk>> {
            Ok(self.chunks.clone())
        }

        async fn semantic_retrieval(
            &self,
            _query: &str,
            _filters: &IndexFilters,
            _favor_recent: bool,
            _num_to_retrieve: usize,
        ) -> Result<Vec<InferenceChunk>> {
            Ok(self.chunks.clone())
        }

        async fn hybrid_retrieval(
            &self,
            _query: &str,
            _filters: &IndexFilters,
            _favor_recent: bool,
            _num_to_retrieve: usize,
            _hybrid_alpha: Option<f32>,
        ) -> Result<Vec<InferenceChunk>> {
            Ok(self.chunks.clone())
        }
    }

    /// Counts retrieval calls so multi-rephrase fan-out can be told apart
    /// from the single-retrieval fallback.
    struct CountingIndex {
        chunks: Vec<InferenceChunk>,
        calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl DocumentIndex for CountingIndex {
        async fn keyword_retrieval(
            &self,
            _query: &str,
            _filters: &IndexFilters,
            _favor_recent: bool,
            _num_to_retrieve: usize,
        ) -> Result<Vec<InferenceChunk>> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(self.chunks.clone())
        }

        async fn semantic_retrieval(
            &self,
            _query: &str,
            _filters: &IndexFilters,
            _favor_recent: bool,
            _num_to_retrieve: usize,
        ) -> Result<Vec<InferenceChunk>> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(self.chunks.clone())
        }

        async fn hybrid_retrieval(
            &self,
            _query: &str,
            _filters: &IndexFilters,
            _favor_recent: bool,
            _num_to_retrieve: usize,
            _hybrid_alpha: Option<f32>,
        ) -> Result<Vec<InferenceChunk>> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(self.chunks.clone())
        }
    }

    /// Would split a query into multiple rephrases if ever asked to — used to
    /// prove the newline-skip path never calls it.
    struct MockRephraser {
        rephrases: Vec<String>,
    }

    #[async_trait]
    impl LLMRephraser for MockRephraser {
        async fn rephrase(&self, _query: &str, _languages_spec: &str) -> Result<Vec<String>> {
            Ok(self.rephrases.clone())
        }
    }

    struct EmptyIndex;

    #[async_trait]
    impl DocumentIndex for EmptyIndex {
        async fn keyword_retrieval(
            &self,
            _query: &str,
            _filters: &IndexFilters,
            _favor_recent: bool,
            _num_to_retrieve: usize,
        ) -> Result<Vec<InferenceChunk>> {
            Ok(Vec::new())
        }

        async fn semantic_retrieval(
            &self,
            _query: &str,
            _filters: &IndexFilters,
            _favor_recent: bool,
            _num_to_retrieve: usize,
        ) -> Result<Vec<InferenceChunk>> {
            Ok(Vec::new())
        }

        async fn hybrid_retrieval(
            &self,
            _query: &str,
            _filters: &IndexFilters,
            _favor_recent: bool,
            _num_to_retrieve: usize,
            _hybrid_alpha: Option<f32>,
        ) -> Result<Vec<InferenceChunk>> {
            Ok(Vec::new())
        }
    }

    struct AllRelevantJudge;

    #[async_trait]
    impl LLMChunkJudge for AllRelevantJudge {
        async fn batch_eval(&self, _query: &str, contents: &[String]) -> Result<Vec<bool>> {
            Ok(vec![true; contents.len()])
        }
    }

    struct FailingJudge;

    #[async_trait]
    impl LLMChunkJudge for FailingJudge {
        async fn batch_eval(&self, _query: &str, _contents: &[String]) -> Result<Vec<bool>> {
            Err(Error::Judge("down".to_string()))
        }
    }

    /// Marks relevant by content rather than position, so a test can prove
    /// the mask tracks chunk identity through a reorder rather than staying
    /// pinned to retrieval-order indices.
    struct ContentJudge {
        relevant_contents: Vec<String>,
    }

    #[async_trait]
    impl LLMChunkJudge for ContentJudge {
        async fn batch_eval(&self, _query: &str, contents: &[String]) -> Result<Vec<bool>> {
            Ok(contents.iter().map(|c| self.relevant_contents.contains(c)).collect())
        }
    }

    struct MockEnsemble {
        scores: Vec<Vec<f32>>,
    }

    #[async_trait]
    impl CrossEncoderEnsemble for MockEnsemble {
        fn model_count(&self) -> usize {
            self.scores.len()
        }

        async fn predict(&self, _query: &str, _passages: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(self.scores.clone())
        }
    }

    struct FailingEnsemble;

    #[async_trait]
    impl CrossEncoderEnsemble for FailingEnsemble {
        fn model_count(&self) -> usize {
            1
        }

        async fn predict(&self, _query: &str, _passages: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(Error::Rerank("cross-encoder service unreachable".to_string()))
        }
    }

    /// Records every event a `MetricsSink` receives so tests can assert on
    /// what the pipeline actually emitted, not just the chunks/mask it
    /// returned to the caller.
    #[derive(Default)]
    struct RecordingMetricsSink {
        retrievals: std::sync::Mutex<Vec<RetrievalMetrics>>,
        partial_failures: std::sync::Mutex<Vec<PartialFailure>>,
    }

    impl MetricsSink for RecordingMetricsSink {
        fn retrieval(&self, metrics: RetrievalMetrics) {
            self.retrievals.lock().unwrap().push(metrics);
        }

        fn partial_failure(&self, failure: PartialFailure) {
            self.partial_failures.lock().unwrap().push(failure);
        }
    }

    // Scenario 1: KEYWORD, two chunks tied at 0.5, boosts 0 and +3.
    #[tokio::test]
    async fn keyword_search_applies_boost_without_reranking() {
        let chunks = vec![chunk(0, "a", Some(0.5), 0), chunk(1, "b", Some(0.5), 3)];
        let index = Arc::new(FixedIndex { chunks });
        let pipeline = Pipeline::new(PipelineConfig::default());
        let query = base_query(SearchType::Keyword);

        let (results, mask) = pipeline.search(query, index).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].boost, 3);
        assert!(results.iter().all(|c| c.score.unwrap() >= 0.0));
        assert_eq!(mask, vec![true, true]);
    }

    // Scenario 2: SEMANTIC, num_rerank=2 of 3 chunks; third keeps retrieval
    // position with its score cleared.
    #[tokio::test]
    async fn semantic_search_reranks_only_the_top_slice() {
        let chunks = vec![
            chunk(0, "a", Some(0.9), 0),
            chunk(1, "b", Some(0.6), 0),
            chunk(2, "c", Some(0.3), 0),
        ];
        let index = Arc::new(FixedIndex { chunks });
        // Only the top `num_rerank` (2) chunks are ever sent to the
        // ensemble — the third stays untouched and has its score cleared.
        let ensemble = Arc::new(MockEnsemble { scores: vec![vec![0.1, 0.7]] });
        let pipeline = Pipeline::new(PipelineConfig::default()).with_reranker(ensemble).unwrap();
        let query = base_query(SearchType::Semantic);

        let (results, _mask) = pipeline.search(query, index).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].chunk_id, 1);
        assert_eq!(results[1].chunk_id, 0);
        assert_eq!(results[2].chunk_id, 2);
        assert_eq!(results[2].score, None);
    }

    // Scenario 4: a multi-line query skips expansion and retrieves once;
    // mask length matches the chunk count. A query expander is configured so
    // this actually exercises the newline-skip branch rather than the
    // "no expander configured" fallback, which would pass trivially.
    #[tokio::test]
    async fn multiline_query_retrieves_once_and_mask_matches_chunk_count() {
        let chunks = vec![chunk(0, "a", Some(0.5), 0)];
        let index = Arc::new(CountingIndex { chunks, calls: std::sync::atomic::AtomicUsize::new(0) });
        let rephraser = Arc::new(MockRephraser { rephrases: vec!["oro precio".to_string()] });
        let pipeline = Pipeline::new(PipelineConfig {
            multilingual_query_expansion: Some("en,es".to_string()),
            ..PipelineConfig::default()
        })
        .with_query_expander(rephraser);
        let mut query = base_query(SearchType::Hybrid);
        query.query = "line one\nline two".to_string();

        let (results, mask) = pipeline.search(query, index.clone()).await;
        assert_eq!(mask.len(), results.len());
        assert_eq!(index.calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    // A single-line query with the same expander configured does fan out
    // across the rephrase plus the original, proving the previous test's
    // single call is actually caused by the newline, not by some other
    // config difference.
    #[tokio::test]
    async fn single_line_query_with_expander_retrieves_once_per_rephrase() {
        let chunks = vec![chunk(0, "a", Some(0.5), 0)];
        let index = Arc::new(CountingIndex { chunks, calls: std::sync::atomic::AtomicUsize::new(0) });
        let rephraser = Arc::new(MockRephraser { rephrases: vec!["oro precio".to_string()] });
        let pipeline = Pipeline::new(PipelineConfig {
            multilingual_query_expansion: Some("en,es".to_string()),
            ..PipelineConfig::default()
        })
        .with_query_expander(rephraser);
        let query = base_query(SearchType::Hybrid);

        let _ = pipeline.search(query, index.clone()).await;
        assert_eq!(index.calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    // Scenario 5: empty retrieval yields two empty lists.
    #[tokio::test]
    async fn empty_retrieval_yields_two_empty_lists() {
        let index = Arc::new(EmptyIndex);
        let pipeline = Pipeline::new(PipelineConfig::default());
        let query = base_query(SearchType::Hybrid);

        let (results, mask) = pipeline.search(query, index).await;
        assert!(results.is_empty());
        assert!(mask.is_empty());
    }

    // Scenario 6: judge failure degrades to an all-true mask, chunks
    // unaffected.
    #[tokio::test]
    async fn judge_failure_degrades_to_all_true_mask() {
        let chunks = vec![chunk(0, "a", Some(0.5), 0), chunk(1, "b", Some(0.4), 0)];
        let index = Arc::new(FixedIndex { chunks });
        let pipeline =
            Pipeline::new(PipelineConfig::default()).with_relevance_filter(Arc::new(FailingJudge));
        let query = base_query(SearchType::Keyword);

        let (results, mask) = pipeline.search(query, index).await;
        assert_eq!(results.len(), 2);
        assert!(mask.iter().all(|&b| b));
    }

    #[tokio::test]
    async fn keyword_search_never_reranks_even_with_a_reranker_configured() {
        let chunks = vec![chunk(0, "a", Some(0.2), 0), chunk(1, "b", Some(0.9), 0)];
        let index = Arc::new(FixedIndex { chunks });
        let ensemble = Arc::new(MockEnsemble { scores: vec![vec![0.9, 0.1]] });
        let pipeline = Pipeline::new(PipelineConfig::default())
            .with_reranker(ensemble)
            .unwrap()
            .with_relevance_filter(Arc::new(AllRelevantJudge));
        let mut query = base_query(SearchType::Keyword);
        query.skip_rerank = false;

        let (results, _mask) = pipeline.search(query, index).await;
        // retrieval order preserved by score (0.9 already first), not by a
        // cross-encoder inversion the mock ensemble would have produced.
        assert_eq!(results[0].chunk_id, 1);
    }

    #[tokio::test]
    async fn streaming_interface_yields_exactly_twice_with_equal_lengths() {
        let chunks = vec![chunk(0, "a", Some(0.5), 0), chunk(1, "b", Some(0.4), 0)];
        let index = Arc::new(FixedIndex { chunks });
        let pipeline = Pipeline::new(PipelineConfig::default());
        let query = base_query(SearchType::Keyword);

        let stream = pipeline.search_stream(query, index).await;
        let chunks_out = stream.chunks.await.unwrap();
        let mask_out = stream.mask.await.unwrap();
        assert_eq!(chunks_out.len(), mask_out.len());
    }

    // Scenario 5 (metrics half): even on empty retrieval the sink still gets
    // a `RetrievalMetrics` record, just with an empty chunk list.
    #[tokio::test]
    async fn empty_retrieval_still_emits_retrieval_metrics() {
        let index = Arc::new(EmptyIndex);
        let sink = Arc::new(RecordingMetricsSink::default());
        let pipeline = Pipeline::new(PipelineConfig::default()).with_metrics_sink(sink.clone());
        let query = base_query(SearchType::Hybrid);

        let (results, mask) = pipeline.search(query, index).await;
        assert!(results.is_empty());
        assert!(mask.is_empty());

        let retrievals = sink.retrievals.lock().unwrap();
        assert_eq!(retrievals.len(), 1);
        assert!(retrievals[0].chunks.is_empty());
    }

    // Scenario 6 (metrics half): judge failure both degrades to an all-true
    // mask and reports a `PartialFailure` through the sink.
    #[tokio::test]
    async fn judge_failure_emits_a_partial_failure_metric() {
        let chunks = vec![chunk(0, "a", Some(0.5), 0), chunk(1, "b", Some(0.4), 0)];
        let index = Arc::new(FixedIndex { chunks });
        let sink = Arc::new(RecordingMetricsSink::default());
        let pipeline = Pipeline::new(PipelineConfig::default())
            .with_relevance_filter(Arc::new(FailingJudge))
            .with_metrics_sink(sink.clone());
        let query = base_query(SearchType::Keyword);

        let (_results, mask) = pipeline.search(query, index).await;
        assert!(mask.iter().all(|&b| b));

        let failures = sink.partial_failures.lock().unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].component, "relevance_filter");
    }

    // The reranker inverts the head's order (chunk 1 ends up first); the
    // judge marks only chunk 0's content as relevant. If the mask were still
    // built positionally over the pre-rerank order, `mask[0]` would
    // describe chunk 0 (true) — but the caller pairs it with `results[0]`,
    // which is now chunk 1. Only identity-based alignment gets this right.
    #[tokio::test]
    async fn relevance_mask_tracks_chunk_identity_through_a_rerank_reorder() {
        let chunks = vec![chunk(0, "keep me", Some(0.4), 0), chunk(1, "drop me", Some(0.6), 0)];
        let index = Arc::new(FixedIndex { chunks });
        let ensemble = Arc::new(MockEnsemble { scores: vec![vec![0.1, 0.9]] });
        let judge = Arc::new(ContentJudge { relevant_contents: vec!["keep me".to_string()] });
        let pipeline = Pipeline::new(PipelineConfig::default())
            .with_reranker(ensemble)
            .unwrap()
            .with_relevance_filter(judge);
        let query = base_query(SearchType::Semantic);

        let (results, mask) = pipeline.search(query, index).await;

        assert_eq!(results.iter().map(|c| c.chunk_id).collect::<Vec<_>>(), vec![1, 0]);
        assert_eq!(mask, vec![false, true], "mask must follow reranked order, not retrieval order");
    }

    // Rerank failure degrades to retrieval order with the untouched tail's
    // score cleared, and reports a `PartialFailure`.
    #[tokio::test]
    async fn rerank_failure_degrades_to_retrieval_order_with_a_partial_failure_metric() {
        let chunks = vec![
            chunk(0, "a", Some(0.9), 0),
            chunk(1, "b", Some(0.6), 0),
            chunk(2, "c", Some(0.3), 0),
        ];
        let index = Arc::new(FixedIndex { chunks });
        let sink = Arc::new(RecordingMetricsSink::default());
        let pipeline = Pipeline::new(PipelineConfig::default())
            .with_reranker(Arc::new(FailingEnsemble))
            .unwrap()
            .with_metrics_sink(sink.clone());
        let query = base_query(SearchType::Semantic);

        let (results, _mask) = pipeline.search(query, index).await;

        assert_eq!(results.iter().map(|c| c.chunk_id).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(results[2].score, None, "untouched tail score must be cleared");

        let failures = sink.partial_failures.lock().unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].component, "rerank");
    }
}
