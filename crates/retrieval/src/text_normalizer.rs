//! Language-aware normalization for keyword search and rephrase dedup.
//!
//! Two operations (SPEC_FULL §4.1): `canonicalize`, used exclusively as a
//! dedup key for rephrased queries, and `lemmatize_for_keyword`, used to turn
//! free text into a stemmed, stopword-free token list for keyword search.
//!
//! Unlike the NLTK corpora this mirrors, `stop-words`/`rust-stemmers`
//! construction can't fail at runtime, so there is no `InitError` path here —
//! the stopword set and stemmer are simple in-memory tables, not a download.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use rust_stemmers::{Algorithm, Stemmer};
use stop_words::{get, LANGUAGE};
use unicode_segmentation::UnicodeSegmentation;

static STOPWORDS: Lazy<HashSet<String>> =
    Lazy::new(|| get(LANGUAGE::English).into_iter().map(|w| w.to_lowercase()).collect());

static STEMMER: Lazy<Stemmer> = Lazy::new(|| Stemmer::create(Algorithm::English));

/// Lowercase and strip whitespace/punctuation. Used solely to detect
/// near-duplicate rephrases — `canonicalize("Q") == canonicalize("q")`.
pub fn canonicalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace() && !c.is_ascii_punctuation())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Tokenize, strip English stopwords, and stem for keyword search.
///
/// `unicode_words` already splits on punctuation, so punctuation removal
/// falls out of tokenization rather than a separate filter pass. If removing
/// stopwords would leave nothing, the raw (unstemmed) tokens are returned
/// instead — keyword search on an all-stopword query should still retrieve
/// something rather than nothing.
pub fn lemmatize_for_keyword(text: &str) -> Vec<String> {
    let tokens: Vec<String> = text.unicode_words().map(str::to_string).collect();

    let filtered: Vec<&str> = tokens
        .iter()
        .map(String::as_str)
        .filter(|w| !STOPWORDS.contains(&w.to_lowercase()))
        .collect();

    if filtered.is_empty() {
        return tokens;
    }

    filtered.iter().map(|w| STEMMER.stem(w).to_string()).collect()
}
