//! Shared operation wrappers for the CLI and MCP interfaces.
//!
//! Each `op_*` function is a pure, synchronous wrapper around the engine and
//! the `algo` modules. Input and output are `serde_json::Value`, with no
//! dependency on rmcp or clap.

use rayon::prelude::*;
use serde_json::{json, Map, Value};

use crate::algo::document::{Document, Record};
use crate::algo::lsh::{candidate_probability, LshIndex};
use crate::algo::minhash::{jaccard, true_jaccard};
use crate::algo::summary::{self, SummaryRow};
use crate::algo::tokenizer::StopwordPolicy;
use crate::algo::{classify::DupType, quality};
use crate::config::DedupConfig;
use crate::engine::{Annotated, DedupEngine};
use crate::error::{DedupError, Result};

pub const DEFAULT_TEXT_FIELD: &str = "text";
pub const DEFAULT_ID_FIELD: &str = "row_id";

/// Which columns of the input table hold the text and the row id.
#[derive(Debug, Clone)]
pub struct TableOptions {
    pub text_field: String,
    pub id_field: String,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            text_field: DEFAULT_TEXT_FIELD.into(),
            id_field: DEFAULT_ID_FIELD.into(),
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Extract a string field from a JSON object. Missing, null and non-string
/// values yield `None`.
pub fn get_text(row: &Value, field: &str) -> Option<String> {
    row.get(field).and_then(|v| v.as_str()).map(str::to_string)
}

/// Wrap bare strings as `{<text_field>: s}` so a list of strings reads as a
/// one-column table. Other rows pass through unchanged.
pub fn wrap_rows(rows: &[Value], text_field: &str) -> Vec<Value> {
    rows.iter()
        .map(|row| match row {
            Value::String(_) => {
                let mut map = Map::new();
                map.insert(text_field.to_string(), row.clone());
                Value::Object(map)
            }
            other => other.clone(),
        })
        .collect()
}

/// Turn JSON rows into engine records. A table without the id field uses
/// row positions as ids. A non-integer id, or a table where only some rows
/// carry an id, is an input error.
pub fn records_from_rows(rows: &[Value], opts: &TableOptions) -> Result<Vec<Record>> {
    let with_id = rows
        .iter()
        .filter(|row| !matches!(row.get(&opts.id_field), None | Some(Value::Null)))
        .count();
    if with_id > 0 && with_id < rows.len() {
        return Err(DedupError::InvalidInput(format!(
            "{with_id} of {} rows have field '{}'; give every row an id or none",
            rows.len(),
            opts.id_field
        )));
    }

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let row_id = match row.get(&opts.id_field) {
                None | Some(Value::Null) => i as i64,
                Some(v) => v.as_i64().ok_or_else(|| {
                    DedupError::InvalidInput(format!(
                        "row {i}: field '{}' is not an integer: {v}",
                        opts.id_field
                    ))
                })?,
            };
            Ok(Record {
                row_id,
                text: get_text(row, &opts.text_field),
            })
        })
        .collect()
}

/// Append columns to a row. Non-object rows are wrapped as `{value: row}`.
fn append_columns(row: &Value, cols: Vec<(&str, Value)>) -> Value {
    let mut obj = match row {
        Value::Object(map) => map.clone(),
        other => {
            let mut map = Map::new();
            map.insert("value".into(), other.clone());
            map
        }
    };
    for (name, value) in cols {
        obj.insert(name.into(), value);
    }
    Value::Object(obj)
}

fn annotation_columns(a: &Annotated) -> Vec<(&'static str, Value)> {
    vec![
        ("clean_text", json!(a.clean_text)),
        ("dup_type", json!(a.dup_type.as_str())),
        ("dup_similarity", json!(a.similarity)),
        ("dup_match", json!(a.best_match)),
        ("entropy", json!(a.entropy)),
        ("word_count", json!(a.word_count)),
        ("char_count", json!(a.char_count)),
    ]
}

// ── Operations ───────────────────────────────────────────────────────────────

/// Classify every row and return the table with annotation columns added.
pub fn op_dedup(rows: &[Value], opts: &TableOptions, config: &DedupConfig) -> Result<Value> {
    let engine = DedupEngine::new(config.clone())?;
    let rows = wrap_rows(rows, &opts.text_field);
    let records = records_from_rows(&rows, opts)?;
    let annotated = engine.run(&records)?;

    let output: Vec<Value> = rows
        .iter()
        .zip(&annotated)
        .map(|(row, a)| append_columns(row, annotation_columns(a)))
        .collect();

    Ok(Value::Array(output))
}

/// Quality scores only: `clean_text`, `entropy`, `word_count`, `char_count`.
pub fn op_score(rows: &[Value], field: &str, stopwords: &StopwordPolicy) -> Value {
    let stopwords = stopwords.resolve();
    let output: Vec<Value> = wrap_rows(rows, field)
        .par_iter()
        .enumerate()
        .map(|(i, row)| {
            let text = get_text(row, field);
            let doc = Document::new(i as i64, text.as_deref(), &stopwords);
            let score = quality::score(&doc.clean_text);
            append_columns(
                row,
                vec![
                    ("clean_text", json!(doc.clean_text)),
                    ("entropy", json!(score.entropy)),
                    ("word_count", json!(score.word_count)),
                    ("char_count", json!(score.char_count)),
                ],
            )
        })
        .collect();

    Value::Array(output)
}

/// Compare two strings: MinHash estimate, exact Jaccard of the token sets,
/// and whether the configured band split makes them LSH candidates.
pub fn op_similarity(a: &str, b: &str, config: &DedupConfig) -> Result<Value> {
    let engine = DedupEngine::new(config.clone())?;
    let doc_a = Document::new(0, Some(a), engine.stopwords());
    let doc_b = Document::new(1, Some(b), engine.stopwords());
    let sig_a = engine.hasher().signature(&doc_a.token_set);
    let sig_b = engine.hasher().signature(&doc_b.token_set);

    let (bands, rows) = engine.split();
    let estimated = jaccard(&sig_a, &sig_b);
    let exact = true_jaccard(&doc_a.token_set, &doc_b.token_set);

    let mut index = LshIndex::new(bands, rows);
    index.insert(doc_a.row_id, sig_a.clone());
    let candidate = index.query(&sig_b).contains(&doc_a.row_id);

    Ok(json!({
        "a": doc_a.clean_text,
        "b": doc_b.clean_text,
        "estimated_jaccard": estimated,
        "true_jaccard": exact,
        "identical_signatures": sig_a == sig_b,
        "candidate": candidate,
        "candidate_probability": candidate_probability(exact, bands, rows),
        "bands": bands,
        "rows": rows,
    }))
}

/// Summarize an annotated table (output of `op_dedup`).
pub fn op_summary(rows: &[Value], group_by: Option<&str>, bins: usize) -> Result<Value> {
    let summary_rows = rows
        .iter()
        .enumerate()
        .map(|(i, row)| summary_row(i, row, group_by))
        .collect::<Result<Vec<_>>>()?;

    Ok(serde_json::to_value(summary::summarize(&summary_rows, bins))?)
}

fn summary_row(i: usize, row: &Value, group_by: Option<&str>) -> Result<SummaryRow> {
    let dup_type = row
        .get("dup_type")
        .and_then(|v| v.as_str())
        .and_then(DupType::from_str)
        .ok_or_else(|| {
            DedupError::InvalidInput(format!("row {i}: missing or unknown 'dup_type'"))
        })?;

    let group = group_by.map(|field| match row.get(field) {
        None | Some(Value::Null) => "unknown".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    });

    Ok(SummaryRow {
        dup_type,
        entropy: row.get("entropy").and_then(|v| v.as_f64()).unwrap_or(0.0),
        word_count: row
            .get("word_count")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as usize,
        group,
    })
}
