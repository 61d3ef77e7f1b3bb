use nu_plugin_neardup::algo::tokenizer::StopwordPolicy;
use nu_plugin_neardup::config::DedupConfig;
use nu_plugin_neardup::error::DedupError;
use nu_plugin_neardup::ops::{self, TableOptions};
use serde_json::{json, Value};

fn sample_records() -> Vec<Value> {
    vec![
        json!({"row_id": 1, "text": "the cat sat", "source": "news"}),
        json!({"row_id": 2, "text": "the cat sat", "source": "blog"}),
        json!({"row_id": 3, "text": "a dog ran", "source": "news"}),
    ]
}

fn dedup(rows: &[Value]) -> Vec<Value> {
    ops::op_dedup(rows, &TableOptions::default(), &DedupConfig::default())
        .unwrap()
        .as_array()
        .unwrap()
        .clone()
}

fn labels(rows: &[Value]) -> Vec<&str> {
    rows.iter().map(|r| r["dup_type"].as_str().unwrap()).collect()
}

#[test]
fn ops_dedup_exact_pair() {
    let out = dedup(&sample_records());
    assert_eq!(
        labels(&out),
        vec!["exact_duplicate", "exact_duplicate", "unique"]
    );
    assert_eq!(out[0]["dup_similarity"], 1.0);
    assert_eq!(out[0]["dup_match"], 2);
    assert_eq!(out[1]["dup_match"], 1);
    assert_eq!(out[2]["dup_similarity"], 0.0);
    assert!(out[2]["dup_match"].is_null());
}

#[test]
fn ops_dedup_keeps_input_columns() {
    let out = dedup(&sample_records());
    assert_eq!(out[0]["source"], "news");
    assert_eq!(out[0]["text"], "the cat sat");
    for col in [
        "clean_text",
        "dup_type",
        "dup_similarity",
        "entropy",
        "word_count",
        "char_count",
    ] {
        assert!(out[0].get(col).is_some(), "missing column {col}");
    }
}

#[test]
fn ops_dedup_near_pair() {
    let rows = vec![
        json!({"row_id": 1, "text": "the quick brown fox"}),
        json!({"row_id": 2, "text": "the quick brown fox jumps"}),
    ];
    let out = dedup(&rows);
    assert_eq!(labels(&out), vec!["near_duplicate", "near_duplicate"]);
    let sim = out[0]["dup_similarity"].as_f64().unwrap();
    assert!(sim > 0.5 && sim < 1.0, "similarity {sim}");
}

#[test]
fn ops_dedup_missing_ids_use_position() {
    let rows = vec![json!({"text": "same words"}), json!({"text": "same words"})];
    let out = dedup(&rows);
    assert_eq!(out[0]["dup_match"], 1);
    assert_eq!(out[1]["dup_match"], 0);
}

#[test]
fn ops_dedup_rejects_mixed_ids() {
    let rows = vec![json!({"text": "alpha"}), json!({"row_id": 0, "text": "beta"})];
    let result = ops::op_dedup(&rows, &TableOptions::default(), &DedupConfig::default());
    assert!(matches!(result, Err(DedupError::InvalidInput(_))));

    let with_null = vec![json!({"row_id": null, "text": "alpha"}), json!({"text": "beta"})];
    assert_eq!(labels(&dedup(&with_null)), vec!["unique", "unique"]);
}

#[test]
fn ops_dedup_plain_strings() {
    let rows = vec![json!("the quick brown fox"), json!("a dog ran far away")];
    let out = dedup(&rows);
    assert_eq!(out[0]["text"], "the quick brown fox");
    assert_eq!(out[0]["clean_text"], "the quick brown fox");
    assert_eq!(out[1]["clean_text"], "a dog ran far away");
    assert_eq!(labels(&out), vec!["unique", "unique"]);

    let same = vec![json!("same words"), json!("same words")];
    let out = dedup(&same);
    assert_eq!(labels(&out), vec!["exact_duplicate", "exact_duplicate"]);
    assert_eq!(out[0]["dup_match"], 1);
}

#[test]
fn ops_dedup_custom_fields() {
    let rows = vec![
        json!({"key": 10, "body": "hello there"}),
        json!({"key": 20, "body": "hello there"}),
    ];
    let opts = TableOptions {
        text_field: "body".into(),
        id_field: "key".into(),
    };
    let out = ops::op_dedup(&rows, &opts, &DedupConfig::default()).unwrap();
    assert_eq!(out[0]["dup_match"], 20);
    assert_eq!(out[0]["clean_text"], "hello there");
}

#[test]
fn ops_dedup_null_text() {
    let rows = vec![
        json!({"row_id": 1, "text": null}),
        json!({"row_id": 2, "text": "some words"}),
    ];
    let out = dedup(&rows);
    assert_eq!(out[0]["clean_text"], "");
    assert_eq!(out[0]["entropy"], 0.0);
    assert_eq!(out[0]["word_count"], 0);
    assert_eq!(out[0]["dup_type"], "unique");
}

#[test]
fn ops_dedup_errors() {
    let cfg = DedupConfig::default();
    let opts = TableOptions::default();
    assert!(matches!(
        ops::op_dedup(&[], &opts, &cfg),
        Err(DedupError::EmptyCorpus)
    ));

    let dup_ids = vec![json!({"row_id": 1, "text": "a"}), json!({"row_id": 1, "text": "b"})];
    assert!(matches!(
        ops::op_dedup(&dup_ids, &opts, &cfg),
        Err(DedupError::DuplicateRowId(1))
    ));

    let bad_id = vec![json!({"row_id": "x", "text": "a"})];
    assert!(matches!(
        ops::op_dedup(&bad_id, &opts, &cfg),
        Err(DedupError::InvalidInput(_))
    ));

    let bad_bands = DedupConfig {
        bands: Some(3),
        ..Default::default()
    };
    assert!(matches!(
        ops::op_dedup(&sample_records(), &opts, &bad_bands),
        Err(DedupError::IndivisibleBands { .. })
    ));
}

#[test]
fn ops_score_adds_columns() {
    let rows = vec![json!({"text": "Hello, World!"}), json!({"text": "aaaa"})];
    let out = ops::op_score(&rows, "text", &StopwordPolicy::None);
    let arr = out.as_array().unwrap();
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[0]["clean_text"], "Hello , World !");
    assert_eq!(arr[0]["word_count"], 4);
    assert_eq!(arr[1]["entropy"], 0.0);
    assert_eq!(arr[1]["char_count"], 4);
}

#[test]
fn ops_score_plain_strings() {
    let rows = vec![json!("aaaa"), json!("Hello, World!")];
    let out = ops::op_score(&rows, "body", &StopwordPolicy::None);
    assert_eq!(out[0]["body"], "aaaa");
    assert_eq!(out[0]["char_count"], 4);
    assert_eq!(out[0]["word_count"], 1);
    assert_eq!(out[1]["clean_text"], "Hello , World !");
}

#[test]
fn ops_score_with_stopwords() {
    let rows = vec![json!({"text": "the cat and the dog"})];
    let out = ops::op_score(&rows, "text", &StopwordPolicy::Default);
    assert_eq!(out[0]["clean_text"], "cat dog");
    assert_eq!(out[0]["word_count"], 2);
}

#[test]
fn ops_similarity_identical() {
    let out = ops::op_similarity("the cat sat", "the cat sat", &DedupConfig::default()).unwrap();
    assert_eq!(out["estimated_jaccard"], 1.0);
    assert_eq!(out["true_jaccard"], 1.0);
    assert_eq!(out["identical_signatures"], true);
    assert_eq!(out["candidate"], true);
    assert_eq!(out["bands"], 16);
    assert_eq!(out["rows"], 8);
}

#[test]
fn ops_similarity_disjoint() {
    let out = ops::op_similarity("alpha beta", "gamma delta", &DedupConfig::default()).unwrap();
    assert_eq!(out["true_jaccard"], 0.0);
    assert_eq!(out["candidate"], false);
    assert!(out["estimated_jaccard"].as_f64().unwrap() < 0.1);
}

#[test]
fn ops_summary_counts_and_groups() {
    let annotated = dedup(&sample_records());
    let out = ops::op_summary(&annotated, Some("source"), 5).unwrap();
    assert_eq!(out["total"], 3);
    assert_eq!(out["exact_duplicate"], 2);
    assert_eq!(out["unique"], 1);
    assert_eq!(out["near_duplicate"], 0);
    assert_eq!(out["groups"]["news"]["exact_duplicate"], 1);
    assert_eq!(out["groups"]["news"]["unique"], 1);
    assert_eq!(out["groups"]["blog"]["exact_duplicate"], 1);
    let ratio = out["duplicate_ratio"].as_f64().unwrap();
    assert!((ratio - 2.0 / 3.0).abs() < 1e-12);
}

#[test]
fn ops_summary_requires_dup_type() {
    let result = ops::op_summary(&[json!({"text": "not annotated"})], None, 5);
    assert!(matches!(result, Err(DedupError::InvalidInput(_))));
}
