use std::collections::HashSet;

use super::tokenizer::{self, Stopwords};
use super::RowId;

/// One input row handed to the engine. `text` is `None` for null or
/// non-string cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub row_id: RowId,
    pub text: Option<String>,
}

impl Record {
    pub fn new(row_id: RowId, text: impl Into<String>) -> Self {
        Self {
            row_id,
            text: Some(text.into()),
        }
    }

    pub fn null(row_id: RowId) -> Self {
        Self { row_id, text: None }
    }
}

/// A normalized document. Immutable for the duration of a run.
#[derive(Debug, Clone)]
pub struct Document {
    pub row_id: RowId,
    pub raw_text: String,
    pub clean_text: String,
    pub token_set: HashSet<String>,
}

impl Document {
    /// Normalize `raw_text`; `None` is treated as empty text.
    pub fn new(row_id: RowId, raw_text: Option<&str>, stopwords: &Stopwords) -> Self {
        let raw_text = raw_text.unwrap_or_default().to_string();
        let clean_text = tokenizer::normalize(&raw_text, stopwords);
        let token_set = tokenizer::token_set(&clean_text);
        Self {
            row_id,
            raw_text,
            clean_text,
            token_set,
        }
    }

    pub fn from_record(record: &Record, stopwords: &Stopwords) -> Self {
        Self::new(record.row_id, record.text.as_deref(), stopwords)
    }
}
