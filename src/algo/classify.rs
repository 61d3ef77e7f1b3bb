use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

use super::document::Document;
use super::lsh::LshIndex;
use super::minhash::{jaccard, MinHasher, Signature};
use super::RowId;

/// Duplicate category assigned to each document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DupType {
    /// No other document shares a band slice.
    Unique,
    /// At least one candidate, none with an identical signature.
    NearDuplicate,
    /// Some candidate has an identical signature.
    ExactDuplicate,
}

impl DupType {
    pub const ALL: [DupType; 3] = [Self::Unique, Self::NearDuplicate, Self::ExactDuplicate];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unique => "unique",
            Self::NearDuplicate => "near_duplicate",
            Self::ExactDuplicate => "exact_duplicate",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "unique" => Some(Self::Unique),
            "near_duplicate" => Some(Self::NearDuplicate),
            "exact_duplicate" => Some(Self::ExactDuplicate),
            _ => None,
        }
    }
}

impl fmt::Display for DupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub row_id: RowId,
    pub dup_type: DupType,
    /// Highest estimated Jaccard similarity among candidates; 0 when unique.
    pub similarity: f64,
    /// Candidate that produced `similarity` (lowest row id on ties).
    pub best_match: Option<RowId>,
}

/// Two-phase batch classification.
///
/// 1. Build: every document's signature goes into one shared index.
/// 2. Classify: every document queries the complete index, so a document is
///    compared against rows inserted after it as well.
///
/// Entry `i` of the result belongs to `documents[i]`. Row ids must be
/// unique; the caller checks that before hashing.
pub fn classify(
    documents: &[Document],
    hasher: &MinHasher,
    bands: usize,
    rows: usize,
) -> Vec<Classification> {
    let started = Instant::now();
    let entries: Vec<(RowId, Signature)> = documents
        .par_iter()
        .map(|doc| (doc.row_id, hasher.signature(&doc.token_set)))
        .collect();

    let mut index = LshIndex::new(bands, rows);
    index.extend(entries);
    tracing::debug!(
        documents = documents.len(),
        bands,
        rows,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "LSH index built"
    );

    let started = Instant::now();
    let results: Vec<Classification> = documents
        .par_iter()
        .map(|doc| {
            let signature = index
                .signature(doc.row_id)
                .expect("every document is indexed during the build phase");
            classify_one(&index, doc.row_id, signature)
        })
        .collect();
    tracing::debug!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        "candidates classified"
    );

    results
}

/// Classify one signature against a fully built index, excluding `row_id`.
pub fn classify_one(index: &LshIndex, row_id: RowId, signature: &[u64]) -> Classification {
    let mut candidates = index.query(signature);
    candidates.remove(&row_id);

    let mut best: Option<(f64, RowId)> = None;
    let mut exact = false;
    for &candidate in &candidates {
        let Some(other) = index.signature(candidate) else {
            continue;
        };
        let (sim, same) = if other == signature {
            (1.0, true)
        } else {
            (jaccard(signature, other), false)
        };
        exact |= same;
        best = match best {
            Some((best_sim, best_id))
                if best_sim > sim || (best_sim == sim && best_id < candidate) =>
            {
                Some((best_sim, best_id))
            }
            _ => Some((sim, candidate)),
        };
    }

    let dup_type = match best {
        None => DupType::Unique,
        Some(_) if exact => DupType::ExactDuplicate,
        Some(_) => DupType::NearDuplicate,
    };

    Classification {
        row_id,
        dup_type,
        similarity: best.map_or(0.0, |(sim, _)| sim),
        best_match: best.map(|(_, id)| id),
    }
}
