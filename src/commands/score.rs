use nu_plugin::{EngineInterface, EvaluatedCall, PluginCommand};
use nu_protocol::{
    Category, Example, LabeledError, ListStream, PipelineData, Signature, Signals, SyntaxShape,
    Type, Value,
};
use rayon::prelude::*;

use crate::algo::document::Document;
use crate::algo::quality;
use crate::ops::DEFAULT_TEXT_FIELD;
use crate::NearDupPlugin;

use super::util;

pub struct Score;

impl PluginCommand for Score {
    type Plugin = NearDupPlugin;

    fn name(&self) -> &str {
        "neardup score"
    }

    fn description(&self) -> &str {
        "Normalize text and add character entropy, word count and character count"
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
            );
        util::stopword_flags(signature).category(Category::Experimental)
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["quality", "entropy", "score", "word count", "normalize"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![
            Example {
                example: r#"["Hello, world!" "aaaa"] | neardup score"#,
                description: "Score a list of strings",
                result: None,
            },
            Example {
                example: r#"open posts.json | neardup score --field body | where entropy > 3"#,
                description: "Keep only rows with varied characters",
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
        let stopwords = util::stopword_policy(call)?.unwrap_or_default().resolve();
        let head = call.head;

        let rows = util::normalize_input(input, &field, head);
        let results: Vec<Value> = rows
            .into_par_iter()
            .enumerate()
            .map(|(i, row)| {
                let text = match row.get_data_by_key(&field) {
                    Some(Value::String { val, .. }) => Some(val),
                    _ => None,
                };
                let doc = Document::new(i as i64, text.as_deref(), &stopwords);
                let score = quality::score(&doc.clean_text);
                util::append_columns(
                    row,
                    vec![
                        ("clean_text", Value::string(doc.clean_text, head)),
                        ("entropy", Value::float(score.entropy, head)),
                        ("word_count", Value::int(score.word_count as i64, head)),
                        ("char_count", Value::int(score.char_count as i64, head)),
                    ],
                    head,
                )
            })
            .collect();

        Ok(ListStream::new(results.into_iter(), head, Signals::empty()).into())
    }
}
