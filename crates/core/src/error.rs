//! Error taxonomy for the retrieval/ranking core
//!
//! One `thiserror` enum covering every failure kind that can cross a crate
//! boundary. Most variants are recovered locally by the component that raises
//! them (see the doc comment on each variant); only `InvalidSearchFlow` and
//! `InitError` are expected to propagate as `Err` all the way to the caller.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Unknown or unsupported `search_type`. Programming error, fatal to the call.
    #[error("invalid search flow: {0}")]
    InvalidSearchFlow(String),

    /// DocumentIndex failure for a given modality.
    #[error("index error ({modality}): {message}")]
    Index { modality: String, message: String },

    /// LLM rephraser failure. Callers recover locally to `[original_query]`.
    #[error("query expansion failed: {0}")]
    Expansion(String),

    /// Cross-encoder ensemble failure. Callers recover locally by skipping rerank.
    #[error("rerank failed: {0}")]
    Rerank(String),

    /// LLM relevance judge failure. Callers recover locally to an all-true mask.
    #[error("relevance judge failed: {0}")]
    Judge(String),

    /// Model or resource initialization failure. Fatal at first use.
    #[error("initialization failed: {0}")]
    Init(String),
}

impl Error {
    pub fn index(modality: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Error::Index {
            modality: modality.into(),
            message: message.to_string(),
        }
    }
}
