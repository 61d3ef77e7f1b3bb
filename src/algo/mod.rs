pub mod classify;
pub mod document;
pub mod lsh;
pub mod minhash;
pub mod quality;
pub mod summary;
pub mod tokenizer;

/// Canonical row identity used by the index and the classifier.
pub type RowId = i64;
