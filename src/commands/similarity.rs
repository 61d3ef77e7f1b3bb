use nu_plugin::{EngineInterface, EvaluatedCall, PluginCommand};
use nu_protocol::{
    Category, Example, LabeledError, PipelineData, Signature, SyntaxShape, Type,
};

use crate::ops;
use crate::NearDupPlugin;

use super::util;

pub struct Similarity;

impl PluginCommand for Similarity {
    type Plugin = NearDupPlugin;

    fn name(&self) -> &str {
        "neardup similarity"
    }

    fn description(&self) -> &str {
        "Compare two strings: MinHash estimate, exact token Jaccard, and LSH candidacy"
    }

    fn signature(&self) -> Signature {
        let signature = Signature::build(self.name())
            .input_output_type(Type::Nothing, Type::record())
            .required("a", SyntaxShape::String, "First string")
            .required("b", SyntaxShape::String, "Second string");
        util::engine_flags(signature).category(Category::Experimental)
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["similarity", "jaccard", "minhash", "compare", "lsh"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![
            Example {
                example: r#"neardup similarity "the quick brown fox" "the quick brown fox jumps""#,
                description: "Estimated and exact Jaccard similarity",
                result: None,
            },
            Example {
                example: r#"neardup similarity "a b c d" "a b c e" --num-perm 256 --bands 64"#,
                description: "Check candidacy under a custom band split",
                result: None,
            },
        ]
    }

    fn run(
        &self,
        _plugin: &NearDupPlugin,
        _engine: &EngineInterface,
        call: &EvaluatedCall,
        _input: PipelineData,
    ) -> Result<PipelineData, LabeledError> {
        let a: String = call.req(0)?;
        let b: String = call.req(1)?;
        let config = util::dedup_config(call)?;
        let head = call.head;

        let result = ops::op_similarity(&a, &b, &config)?;
        Ok(PipelineData::Value(util::json_to_value(&result, head), None))
    }
}
