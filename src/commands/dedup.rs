use nu_plugin::{EngineInterface, EvaluatedCall, PluginCommand};
use nu_protocol::{
    Category, Example, LabeledError, ListStream, PipelineData, Signature, Signals, SyntaxShape,
    Type, Value,
};

use crate::engine::DedupEngine;
use crate::ops::{DEFAULT_ID_FIELD, DEFAULT_TEXT_FIELD};
use crate::NearDupPlugin;

use super::util;

pub struct Dedup;

impl PluginCommand for Dedup {
    type Plugin = NearDupPlugin;

    fn name(&self) -> &str {
        "neardup dedup"
    }

    fn description(&self) -> &str {
        "Label every row unique, near_duplicate or exact_duplicate using MinHash + LSH, and add quality scores"
    }

    fn signature(&self) -> Signature {
        let signature = Signature::build(self.name())
            .input_output_types(vec![
                (Type::table(), Type::table()),
                (Type::list(Type::Any), Type::list(Type::Any)),
                (Type::Any, Type::Any),
            ])
            .named(
                "field",
                SyntaxShape::String,
                "Field containing the text (default: text)",
                Some('f'),
            )
            .named(
                "id-field",
                SyntaxShape::String,
                "Field containing the integer row id (default: row_id, falls back to position)",
                None,
            );
        util::engine_flags(signature).category(Category::Experimental)
    }

    fn search_terms(&self) -> Vec<&str> {
        vec![
            "dedup", "duplicate", "deduplicate", "near-duplicate", "minhash", "lsh", "jaccard",
        ]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![
            Example {
                example: r#"[[row_id text]; [1 "the cat sat"] [2 "the cat sat"] [3 "a dog ran"]] | neardup dedup"#,
                description: "Find exact and near duplicates in a table",
                result: None,
            },
            Example {
                example: r#"["the quick brown fox" "the quick brown fox jumps"] | neardup dedup --threshold 0.5"#,
                description: "Deduplicate a list of strings with a looser band split",
                result: None,
            },
            Example {
                example: r#"open posts.json | neardup dedup --field body --stopwords default"#,
                description: "Strip English stopwords before hashing",
                result: None,
            },
        ]
    }

    fn run(
        &self,
        _plugin: &NearDupPlugin,
        _engine: &EngineInterface,
        call: &EvaluatedCall,
        input: PipelineData,
    ) -> Result<PipelineData, LabeledError> {
        let field: String = call
            .get_flag::<String>("field")?
            .unwrap_or_else(|| DEFAULT_TEXT_FIELD.into());
        let id_field: String = call
            .get_flag::<String>("id-field")?
            .unwrap_or_else(|| DEFAULT_ID_FIELD.into());
        let config = util::dedup_config(call)?;
        let head = call.head;

        let engine = DedupEngine::new(config)?;
        let rows = util::normalize_input(input, &field, head);
        let records = util::records_from_values(&rows, &field, &id_field)?;
        let annotated = engine.run(&records)?;

        let results: Vec<Value> = rows
            .into_iter()
            .zip(annotated)
            .map(|(row, a)| {
                let best_match = match a.best_match {
                    Some(id) => Value::int(id, head),
                    None => Value::nothing(head),
                };
                util::append_columns(
                    row,
                    vec![
                        ("clean_text", Value::string(a.clean_text, head)),
                        ("dup_type", Value::string(a.dup_type.as_str(), head)),
                        ("dup_similarity", Value::float(a.similarity, head)),
                        ("dup_match", best_match),
                        ("entropy", Value::float(a.entropy, head)),
                        ("word_count", Value::int(a.word_count as i64, head)),
                        ("char_count", Value::int(a.char_count as i64, head)),
                    ],
                    head,
                )
            })
            .collect();

        Ok(ListStream::new(results.into_iter(), head, Signals::empty()).into())
    }
}
