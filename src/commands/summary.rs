use nu_plugin::{EngineInterface, EvaluatedCall, PluginCommand};
use nu_protocol::{
    Category, Example, LabeledError, PipelineData, Signature, SyntaxShape, Type, Value,
};

use crate::algo::classify::DupType;
use crate::algo::summary::{self, SummaryRow, DEFAULT_BINS};
use crate::NearDupPlugin;

use super::util;

pub struct Summary;

impl PluginCommand for Summary {
    type Plugin = NearDupPlugin;

    fn name(&self) -> &str {
        "neardup summary"
    }

    fn description(&self) -> &str {
        "Summarize a table annotated by `neardup dedup`: label counts, entropy statistics and histogram"
    }

    fn signature(&self) -> Signature {
        Signature::build(self.name())
            .input_output_types(vec![
                (Type::table(), Type::record()),
                (Type::list(Type::Any), Type::record()),
            ])
            .named(
                "group-by",
                SyntaxShape::String,
                "Also count labels per value of this column",
                Some('g'),
            )
            .named(
                "bins",
                SyntaxShape::Int,
                "Number of entropy histogram bins (default: 30)",
                None,
            )
            .category(Category::Experimental)
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["summary", "report", "histogram", "duplicate ratio", "stats"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![
            Example {
                example: r#"open posts.json | neardup dedup | neardup summary"#,
                description: "Duplicate ratio and entropy distribution of a corpus",
                result: None,
            },
            Example {
                example: r#"open posts.json | neardup dedup | neardup summary --group-by source --bins 10"#,
                description: "Label counts per source",
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
        let group_by: Option<String> = call.get_flag("group-by")?;
        let bins = match call.get_flag::<i64>("bins")? {
            Some(n) if n < 1 => return Err(LabeledError::new("--bins must be at least 1")),
            Some(n) => n as usize,
            None => DEFAULT_BINS,
        };
        let head = call.head;

        let rows: Vec<Value> = input.into_iter().collect();
        let summary_rows = rows
            .iter()
            .enumerate()
            .map(|(i, row)| summary_row(i, row, group_by.as_deref()))
            .collect::<Result<Vec<_>, _>>()?;

        let summary = summary::summarize(&summary_rows, bins);
        let json = serde_json::to_value(&summary)
            .map_err(|e| LabeledError::new(format!("Failed to encode summary: {e}")))?;
        Ok(PipelineData::Value(util::json_to_value(&json, head), None))
    }
}

fn summary_row(i: usize, row: &Value, group_by: Option<&str>) -> Result<SummaryRow, LabeledError> {
    let dup_type = match row.get_data_by_key("dup_type") {
        Some(Value::String { val, .. }) => DupType::from_str(&val),
        _ => None,
    }
    .ok_or_else(|| {
        LabeledError::new(format!(
            "row {i}: missing or unknown 'dup_type'; run `neardup dedup` first"
        ))
    })?;

    let entropy = match row.get_data_by_key("entropy") {
        Some(Value::Float { val, .. }) => val,
        Some(Value::Int { val, .. }) => val as f64,
        _ => 0.0,
    };
    let word_count = match row.get_data_by_key("word_count") {
        Some(Value::Int { val, .. }) => val.max(0) as usize,
        _ => 0,
    };
    let group = group_by.map(|field| match row.get_data_by_key(field) {
        None | Some(Value::Nothing { .. }) => "unknown".to_string(),
        Some(Value::String { val, .. }) => val,
        Some(other) => other.coerce_string().unwrap_or_else(|_| "unknown".into()),
    });

    Ok(SummaryRow {
        dup_type,
        entropy,
        word_count,
        group,
    })
}
