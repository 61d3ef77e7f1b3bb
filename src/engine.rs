//! Per-invocation near-duplicate engine.
//!
//! A [`DedupEngine`] owns only its validated configuration and the hasher
//! and stopword set derived from it. The LSH index lives inside a single
//! [`DedupEngine::run`] call and is dropped when the call returns.

use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;

use crate::algo::classify::{self, DupType};
use crate::algo::document::{Document, Record};
use crate::algo::minhash::MinHasher;
use crate::algo::quality;
use crate::algo::summary::SummaryRow;
use crate::algo::tokenizer::Stopwords;
use crate::algo::RowId;
use crate::config::DedupConfig;
use crate::error::{DedupError, Result};

/// One output row, aligned with the input record at the same position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotated {
    pub row_id: RowId,
    pub clean_text: String,
    pub dup_type: DupType,
    pub similarity: f64,
    pub best_match: Option<RowId>,
    pub entropy: f64,
    pub word_count: usize,
    pub char_count: usize,
}

impl Annotated {
    pub fn summary_row(&self, group: Option<String>) -> SummaryRow {
        SummaryRow {
            dup_type: self.dup_type,
            entropy: self.entropy,
            word_count: self.word_count,
            group,
        }
    }
}

pub struct DedupEngine {
    config: DedupConfig,
    hasher: MinHasher,
    stopwords: Stopwords,
    bands: usize,
    rows: usize,
}

impl DedupEngine {
    /// Validate `config` and prepare the hasher. Fails before any work on a
    /// bad configuration.
    pub fn new(config: DedupConfig) -> Result<Self> {
        let (bands, rows) = config.validate()?;
        tracing::debug!(
            num_perm = config.num_perm,
            threshold = config.threshold,
            bands,
            rows,
            "band split selected"
        );
        Ok(Self {
            hasher: MinHasher::with_seed(config.num_perm, config.seed),
            stopwords: config.stopwords.resolve(),
            config,
            bands,
            rows,
        })
    }

    pub fn config(&self) -> &DedupConfig {
        &self.config
    }

    pub fn hasher(&self) -> &MinHasher {
        &self.hasher
    }

    pub fn stopwords(&self) -> &Stopwords {
        &self.stopwords
    }

    /// `(bands, rows)` used by the index.
    pub fn split(&self) -> (usize, usize) {
        (self.bands, self.rows)
    }

    /// Normalize records into documents, in parallel.
    pub fn normalize(&self, records: &[Record]) -> Vec<Document> {
        records
            .par_iter()
            .map(|r| Document::from_record(r, &self.stopwords))
            .collect()
    }

    /// Annotate every record. Returns all rows or an error, never a
    /// partial table.
    #[tracing::instrument(skip_all, fields(records = records.len()))]
    pub fn run(&self, records: &[Record]) -> Result<Vec<Annotated>> {
        if records.is_empty() {
            return Err(DedupError::EmptyCorpus);
        }
        let mut seen: HashSet<RowId> = HashSet::with_capacity(records.len());
        for record in records {
            if !seen.insert(record.row_id) {
                return Err(DedupError::DuplicateRowId(record.row_id));
            }
        }

        let documents = self.normalize(records);
        if documents.iter().all(|d| d.token_set.is_empty()) {
            tracing::warn!("every document is empty after normalization");
        }

        let classes = classify::classify(&documents, &self.hasher, self.bands, self.rows);
        let annotated: Vec<Annotated> = documents
            .into_par_iter()
            .zip(classes.into_par_iter())
            .map(|(doc, class)| {
                let score = quality::score(&doc.clean_text);
                Annotated {
                    row_id: doc.row_id,
                    clean_text: doc.clean_text,
                    dup_type: class.dup_type,
                    similarity: class.similarity,
                    best_match: class.best_match,
                    entropy: score.entropy,
                    word_count: score.word_count,
                    char_count: score.char_count,
                }
            })
            .collect();

        let count = |t: DupType| annotated.iter().filter(|a| a.dup_type == t).count();
        tracing::info!(
            total = annotated.len(),
            unique = count(DupType::Unique),
            near_duplicate = count(DupType::NearDuplicate),
            exact_duplicate = count(DupType::ExactDuplicate),
            "deduplication finished"
        );

        Ok(annotated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_corpus_is_an_error() {
        let engine = DedupEngine::new(DedupConfig::default()).unwrap();
        assert!(matches!(engine.run(&[]), Err(DedupError::EmptyCorpus)));
    }

    #[test]
    fn duplicate_row_id_is_an_error() {
        let engine = DedupEngine::new(DedupConfig::default()).unwrap();
        let records = vec![Record::new(1, "a"), Record::new(2, "b"), Record::new(1, "c")];
        assert!(matches!(
            engine.run(&records),
            Err(DedupError::DuplicateRowId(1))
        ));
    }

    #[test]
    fn bad_config_fails_before_run() {
        let config = DedupConfig {
            bands: Some(5),
            ..Default::default()
        };
        assert!(DedupEngine::new(config).is_err());
    }

    #[test]
    fn preserves_order_and_count() {
        let engine = DedupEngine::new(DedupConfig::default()).unwrap();
        let records: Vec<Record> = (0..25)
            .rev()
            .map(|i| Record::new(i, format!("row number {i}")))
            .collect();
        let out = engine.run(&records).unwrap();
        assert_eq!(out.len(), 25);
        for (rec, ann) in records.iter().zip(&out) {
            assert_eq!(rec.row_id, ann.row_id);
        }
    }

    #[test]
    fn null_text_row() {
        let engine = DedupEngine::new(DedupConfig::default()).unwrap();
        let out = engine
            .run(&[Record::null(1), Record::new(2, "some words")])
            .unwrap();
        assert_eq!(out[0].clean_text, "");
        assert_eq!(out[0].entropy, 0.0);
        assert_eq!(out[0].word_count, 0);
        assert_eq!(out[0].dup_type, DupType::Unique);
    }

    #[test]
    fn summary_row_carries_group() {
        let engine = DedupEngine::new(DedupConfig::default()).unwrap();
        let out = engine.run(&[Record::new(1, "x y")]).unwrap();
        let row = out[0].summary_row(Some("g".into()));
        assert_eq!(row.group.as_deref(), Some("g"));
        assert_eq!(row.word_count, 2);
    }
}
