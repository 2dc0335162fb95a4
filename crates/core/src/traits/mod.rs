//! Pluggable-backend traits for the retrieval/ranking core
//!
//! # Trait Hierarchy
//!
//! ```text
//! Document retrieval:
//!   - DocumentIndex: keyword / semantic / hybrid retrieval
//!
//! Ranking collaborators:
//!   - EmbeddingModel: text -> vector
//!   - CrossEncoderEnsemble: (query, passages) -> per-model score matrix
//!
//! LLM collaborators:
//!   - LLMRephraser: query -> multilingual rephrases
//!   - LLMChunkJudge: (query, contents) -> relevance mask
//! ```

mod cross_encoder;
mod document_index;
mod embedding;
mod judge;
mod rephraser;

pub use cross_encoder::CrossEncoderEnsemble;
pub use document_index::DocumentIndex;
pub use embedding::EmbeddingModel;
pub use judge::LLMChunkJudge;
pub use rephraser::LLMRephraser;
