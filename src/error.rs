//! Error types for the near-duplicate engine.

use thiserror::Error;

use crate::algo::RowId;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, DedupError>;

/// Errors that abort a whole run. Per-document anomalies (null text, empty
/// token sets) are never reported here.
#[derive(Error, Debug)]
pub enum DedupError {
    /// `num_perm` was zero
    #[error("num_perm must be at least 1")]
    ZeroPermutations,

    /// Threshold outside (0, 1]
    #[error("similarity threshold must be in (0, 1], got {0}")]
    InvalidThreshold(f64),

    /// Explicit band count does not divide the signature length
    #[error("num_perm {num_perm} cannot be split into {bands} bands of equal width")]
    IndivisibleBands { num_perm: usize, bands: usize },

    /// Nothing to deduplicate
    #[error("corpus is empty")]
    EmptyCorpus,

    /// Same row id used by two records
    #[error("row_id {0} appears more than once in the corpus")]
    DuplicateRowId(RowId),

    /// Unrecognized stopword policy name
    #[error("unknown stopword policy '{0}'. Use: none, default, custom")]
    UnknownStopwordPolicy(String),

    /// Malformed table input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(feature = "plugin")]
impl From<DedupError> for nu_protocol::LabeledError {
    fn from(err: DedupError) -> Self {
        nu_protocol::LabeledError::new(err.to_string())
    }
}
