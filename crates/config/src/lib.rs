//! Configuration for the retrieval/ranking pipeline
//!
//! A single typed `PipelineConfig`, assembled once at pipeline construction
//! and never re-read per call. Every field here corresponds to one of the
//! configuration items enumerated by the core crate's external-interface
//! contract. Defaults are documented tuning choices, not guesses; tests pin
//! them so an accidental change is visible in a diff.

use std::env;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::InvalidValue {
            field: "<config file>".to_string(),
            message: err.to_string(),
        }
    }
}

/// Weight of semantic vs. lexical scoring in hybrid retrieval.
pub const DEFAULT_HYBRID_ALPHA: f32 = 0.5;
/// `norm_cutoff` passed to `ScoreMath::apply_boost`.
pub const DEFAULT_NUM_RERANKED_RESULTS: usize = 50;
pub const DEFAULT_SIM_SCORE_RANGE_LOW: f32 = 0.0;
pub const DEFAULT_SIM_SCORE_RANGE_HIGH: f32 = 1.0;
pub const DEFAULT_CROSS_ENCODER_RANGE_MIN: f32 = 0.0;
pub const DEFAULT_CROSS_ENCODER_RANGE_MAX: f32 = 1.0;
pub const DEFAULT_ASYM_QUERY_PREFIX: &str = "search_query: ";
pub const DEFAULT_MAX_LLM_FILTER_CHUNKS: usize = 20;

/// Slope of the boost curve used by `translate_boost_count_to_multiplier`.
pub const DEFAULT_BOOST_SLOPE: f32 = 0.15;
pub const DEFAULT_MIN_BOOST_MULTIPLIER: f32 = 0.3;
pub const DEFAULT_MAX_BOOST_MULTIPLIER: f32 = 3.0;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PipelineConfig {
    pub hybrid_alpha: f32,
    /// Language spec (e.g. `"en,es"`); expansion is disabled when absent.
    pub multilingual_query_expansion: Option<String>,
    pub num_reranked_results: usize,
    pub sim_score_range_low: f32,
    pub sim_score_range_high: f32,
    pub cross_encoder_range_min: f32,
    pub cross_encoder_range_max: f32,
    /// Prefix prepended to a query before asymmetric embedding models encode
    /// it. Mandated config surface per the embedding boundary this pipeline
    /// exposes (`search_core::traits::EmbeddingModel`), but nothing in this
    /// crate currently calls an embedding model directly, so it is read from
    /// config and validated, never applied.
    pub asym_query_prefix: String,
    pub max_llm_filter_chunks: usize,
    pub boost_slope: f32,
    pub min_boost_multiplier: f32,
    pub max_boost_multiplier: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            hybrid_alpha: DEFAULT_HYBRID_ALPHA,
            multilingual_query_expansion: None,
            num_reranked_results: DEFAULT_NUM_RERANKED_RESULTS,
            sim_score_range_low: DEFAULT_SIM_SCORE_RANGE_LOW,
            sim_score_range_high: DEFAULT_SIM_SCORE_RANGE_HIGH,
            cross_encoder_range_min: DEFAULT_CROSS_ENCODER_RANGE_MIN,
            cross_encoder_range_max: DEFAULT_CROSS_ENCODER_RANGE_MAX,
            asym_query_prefix: DEFAULT_ASYM_QUERY_PREFIX.to_string(),
            max_llm_filter_chunks: DEFAULT_MAX_LLM_FILTER_CHUNKS,
            boost_slope: DEFAULT_BOOST_SLOPE,
            min_boost_multiplier: DEFAULT_MIN_BOOST_MULTIPLIER,
            max_boost_multiplier: DEFAULT_MAX_BOOST_MULTIPLIER,
        }
    }
}

impl PipelineConfig {
    /// Overlay environment-variable overrides onto the defaults.
    ///
    /// Follows the `SEARCH_PIPELINE_<FIELD>` naming convention; any variable
    /// that fails to parse is logged and ignored rather than treated as
    /// fatal, since a malformed override should not prevent startup.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(v) = env_f32("SEARCH_PIPELINE_HYBRID_ALPHA") {
            config.hybrid_alpha = v;
        }
        if let Ok(v) = env::var("SEARCH_PIPELINE_MULTILINGUAL_QUERY_EXPANSION") {
            config.multilingual_query_expansion = if v.is_empty() { None } else { Some(v) };
        }
        if let Some(v) = env_usize("SEARCH_PIPELINE_NUM_RERANKED_RESULTS") {
            config.num_reranked_results = v;
        }
        if let Some(v) = env_f32("SEARCH_PIPELINE_SIM_SCORE_RANGE_LOW") {
            config.sim_score_range_low = v;
        }
        if let Some(v) = env_f32("SEARCH_PIPELINE_SIM_SCORE_RANGE_HIGH") {
            config.sim_score_range_high = v;
        }
        if let Some(v) = env_f32("SEARCH_PIPELINE_CROSS_ENCODER_RANGE_MIN") {
            config.cross_encoder_range_min = v;
        }
        if let Some(v) = env_f32("SEARCH_PIPELINE_CROSS_ENCODER_RANGE_MAX") {
            config.cross_encoder_range_max = v;
        }
        if let Ok(v) = env::var("SEARCH_PIPELINE_ASYM_QUERY_PREFIX") {
            config.asym_query_prefix = v;
        }
        if let Some(v) = env_usize("SEARCH_PIPELINE_MAX_LLM_FILTER_CHUNKS") {
            config.max_llm_filter_chunks = v;
        }

        config
    }

    /// Validate cross-field invariants the `Default`/`from_env` constructors
    /// don't enforce on their own (e.g. a hand-edited override file).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cross_encoder_range_max <= self.cross_encoder_range_min {
            return Err(ConfigError::InvalidValue {
                field: "cross_encoder_range_max".to_string(),
                message: "must be greater than cross_encoder_range_min".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.hybrid_alpha) {
            return Err(ConfigError::InvalidValue {
                field: "hybrid_alpha".to_string(),
                message: "must be in [0.0, 1.0]".to_string(),
            });
        }
        Ok(())
    }
}

fn env_f32(key: &str) -> Option<f32> {
    match env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(key, raw, "ignoring unparsable f32 override");
                None
            }
        },
        Err(_) => None,
    }
}

fn env_usize(key: &str) -> Option<usize> {
    match env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(key, raw, "ignoring unparsable usize override");
                None
            }
        },
        Err(_) => None,
    }
}
