use nu_plugin::EvaluatedCall;
use nu_protocol::{LabeledError, PipelineData, Record as NuRecord, Signature, Span, SyntaxShape, Value};

use crate::algo::document::Record;
use crate::algo::tokenizer::StopwordPolicy;
use crate::config::DedupConfig;
use crate::error::{DedupError, Result};

/// Normalize any PipelineData into a Vec<Value> of records.
///
/// Handles:
///   - Table (list of records) → pass through
///   - Single record → [record]
///   - List of strings → [{<text_field>: s1}, {<text_field>: s2}, ...]
///   - Single string → [{<text_field>: s}]
///   - List of non-records → [{value: v1}, {value: v2}, ...]
///   - Empty/Nothing → []
pub fn normalize_input(input: PipelineData, text_field: &str, span: Span) -> Vec<Value> {
    match input {
        PipelineData::Value(value, _) => normalize_value(value, text_field, span),
        other => {
            let values: Vec<Value> = other.into_iter().collect();
            if matches!(values.first(), Some(Value::Record { .. })) {
                values
            } else {
                values
                    .into_iter()
                    .map(|v| wrap_value(v, text_field, span))
                    .collect()
            }
        }
    }
}

fn normalize_value(value: Value, text_field: &str, span: Span) -> Vec<Value> {
    match value {
        Value::List { vals, .. } => {
            if matches!(vals.first(), Some(Value::Record { .. })) {
                vals
            } else {
                vals.into_iter()
                    .map(|v| wrap_value(v, text_field, span))
                    .collect()
            }
        }
        Value::Record { .. } => vec![value],
        Value::Nothing { .. } => vec![],
        other => vec![wrap_value(other, text_field, span)],
    }
}

fn wrap_value(v: Value, text_field: &str, span: Span) -> Value {
    let mut record = NuRecord::new();
    match &v {
        Value::String { .. } => record.push(text_field, v),
        _ => record.push("value", v),
    }
    Value::record(record, span)
}

/// Set columns on a record Value, replacing existing columns of the same
/// name. Non-records get wrapped first.
pub fn append_columns(row: Value, cols: Vec<(&str, Value)>, span: Span) -> Value {
    let mut record = match row {
        Value::Record { val, .. } => val.into_owned(),
        other => {
            let mut record = NuRecord::new();
            record.push("value", other);
            record
        }
    };
    for (name, value) in cols {
        record.insert(name, value);
    }
    Value::record(record, span)
}

/// Pull `(row_id, text)` out of each row. A table without ids falls back to
/// row positions; a table where only some rows have an id is rejected.
/// Non-string text is treated as missing.
pub fn records_from_values(rows: &[Value], text_field: &str, id_field: &str) -> Result<Vec<Record>> {
    let with_id = rows
        .iter()
        .filter(|row| {
            !matches!(
                row.get_data_by_key(id_field),
                None | Some(Value::Nothing { .. })
            )
        })
        .count();
    if with_id > 0 && with_id < rows.len() {
        return Err(DedupError::InvalidInput(format!(
            "{with_id} of {} rows have field '{id_field}'; give every row an id or none",
            rows.len()
        )));
    }

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let row_id = match row.get_data_by_key(id_field) {
                None | Some(Value::Nothing { .. }) => i as i64,
                Some(Value::Int { val, .. }) => val,
                Some(other) => {
                    return Err(DedupError::InvalidInput(format!(
                        "row {i}: field '{id_field}' is not an integer (got {})",
                        other.get_type()
                    )))
                }
            };
            let text = match row.get_data_by_key(text_field) {
                Some(Value::String { val, .. }) => Some(val),
                _ => None,
            };
            Ok(Record { row_id, text })
        })
        .collect()
}

/// Add the engine flags shared by `dedup` and `similarity`.
pub fn engine_flags(signature: Signature) -> Signature {
    stopword_flags(signature)
        .named(
            "config",
            SyntaxShape::Filepath,
            "JSON config file; flags override its values",
            Some('c'),
        )
        .named(
            "num-perm",
            SyntaxShape::Int,
            "Number of MinHash permutations (default: 128)",
            Some('n'),
        )
        .named(
            "threshold",
            SyntaxShape::Number,
            "Jaccard similarity the band split targets (default: 0.8)",
            Some('t'),
        )
        .named(
            "bands",
            SyntaxShape::Int,
            "Explicit LSH band count; must divide num-perm",
            Some('b'),
        )
        .named(
            "seed",
            SyntaxShape::Int,
            "Seed of the permutation family (default: 1)",
            None,
        )
}

pub fn stopword_flags(signature: Signature) -> Signature {
    signature
        .named(
            "stopwords",
            SyntaxShape::String,
            "Stopword policy: none, default, custom (default: none)",
            Some('s'),
        )
        .named(
            "custom-stopwords",
            SyntaxShape::List(Box::new(SyntaxShape::String)),
            "Words to strip with --stopwords custom",
            None,
        )
}

pub fn stopword_policy(call: &EvaluatedCall) -> std::result::Result<Option<StopwordPolicy>, LabeledError> {
    let name: Option<String> = call.get_flag("stopwords")?;
    let words: Option<Vec<String>> = call.get_flag("custom-stopwords")?;
    Ok(match (name, words) {
        (None, None) => None,
        (None, Some(words)) => Some(StopwordPolicy::Custom(words)),
        (Some(name), words) => Some(StopwordPolicy::from_name(&name, words.unwrap_or_default())?),
    })
}

/// Build the engine config from `--config` and the individual flags.
pub fn dedup_config(call: &EvaluatedCall) -> std::result::Result<DedupConfig, LabeledError> {
    let mut config = match call.get_flag::<String>("config")? {
        Some(path) => DedupConfig::from_file(path)?,
        None => DedupConfig::default(),
    };
    if let Some(n) = call.get_flag::<i64>("num-perm")? {
        config.num_perm = non_negative(n, "num-perm")?;
    }
    if let Some(t) = call.get_flag::<f64>("threshold")? {
        config.threshold = t;
    }
    if let Some(b) = call.get_flag::<i64>("bands")? {
        config.bands = Some(non_negative(b, "bands")?);
    }
    if let Some(seed) = call.get_flag::<i64>("seed")? {
        config.seed = seed as u64;
    }
    if let Some(policy) = stopword_policy(call)? {
        config.stopwords = policy;
    }
    Ok(config)
}

fn non_negative(n: i64, flag: &str) -> std::result::Result<usize, LabeledError> {
    usize::try_from(n).map_err(|_| LabeledError::new(format!("--{flag} must not be negative, got {n}")))
}

/// Convert a JSON value into a Nushell value.
pub fn json_to_value(json: &serde_json::Value, span: Span) -> Value {
    match json {
        serde_json::Value::Null => Value::nothing(span),
        serde_json::Value::Bool(b) => Value::bool(*b, span),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::int(i, span),
            None => Value::float(n.as_f64().unwrap_or(f64::NAN), span),
        },
        serde_json::Value::String(s) => Value::string(s, span),
        serde_json::Value::Array(items) => {
            Value::list(items.iter().map(|v| json_to_value(v, span)).collect(), span)
        }
        serde_json::Value::Object(map) => {
            let mut record = NuRecord::new();
            for (key, value) in map {
                record.push(key, json_to_value(value, span));
            }
            Value::record(record, span)
        }
    }
}
