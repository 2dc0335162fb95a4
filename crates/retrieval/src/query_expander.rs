//! LLM-delegated multilingual rephrasing (SPEC_FULL §4.4).

use std::collections::HashSet;
use std::sync::Arc;

use search_core::LLMRephraser;

use crate::text_normalizer::canonicalize;

pub struct QueryExpander {
    rephraser: Arc<dyn LLMRephraser>,
}

impl QueryExpander {
    pub fn new(rephraser: Arc<dyn LLMRephraser>) -> Self {
        Self { rephraser }
    }

    /// Expands `query` into a deduplicated rephrase set. Never fails: a
    /// rephraser error is logged and swallowed, falling back to
    /// `[original_query]`, since multilingual coverage is a nice-to-have and
    /// should never block retrieval.
    ///
    /// A query containing a line break is assumed to be a prompt complex
    /// enough that rephrasing would corrupt it, so expansion is skipped
    /// entirely in that case.
    pub async fn expand(&self, query: &str, languages_spec: &str) -> Vec<String> {
        if query.contains('\n') || query.contains('\r') {
            return vec![query.to_string()];
        }

        let mut rephrases = match self.rephraser.rephrase(query, languages_spec).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "query expansion failed, falling back to the original query");
                return vec![query.to_string()];
            }
        };
        rephrases.push(query.to_string());

        let mut seen: HashSet<String> = HashSet::new();
        let mut unique = Vec::new();
        for rephrase in rephrases {
            if seen.insert(canonicalize(&rephrase)) {
                unique.push(rephrase);
            }
        }
        unique
    }
}
