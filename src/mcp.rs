//! MCP (Model Context Protocol) server for neardup.
//!
//! Exposes the operations in `ops` as MCP tools so that AI assistants
//! (Claude Desktop, Cursor, etc.) can invoke them over stdio JSON-RPC.
//!
//! Start with: `neardup --mcp`

use rmcp::{
    handler::server::tool::{ToolCallContext, ToolRouter},
    handler::server::wrapper::Parameters,
    model::*,
    service::RequestContext,
    tool, tool_router, ErrorData as McpError, RoleServer, ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::Deserialize;

use crate::algo::summary::DEFAULT_BINS;
use crate::algo::tokenizer::StopwordPolicy;
use crate::config::DedupConfig;
use crate::error::DedupError;
use crate::ops::{self, TableOptions, DEFAULT_ID_FIELD, DEFAULT_TEXT_FIELD};

// ── Parameter structs ───────────────────────────────────────────────────────
// Each struct maps 1:1 with a CLI subcommand. `JsonSchema` is required by
// rmcp so that the tool's input schema is auto-generated for the AI client.

/// Engine settings shared by `dedup` and `similarity`. Unset fields use the
/// engine defaults.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct EngineParams {
    /// Number of MinHash permutations (default: 128).
    pub num_perm: Option<usize>,
    /// Jaccard similarity the LSH band split targets (default: 0.8).
    pub threshold: Option<f64>,
    /// Explicit band count; must divide num_perm.
    pub bands: Option<usize>,
    /// Seed of the permutation family (default: 1).
    pub seed: Option<u64>,
    /// Stopword policy: "none", "default", "custom" (default: "none").
    pub stopwords: Option<String>,
    /// Words to strip when stopwords is "custom".
    #[serde(default)]
    pub custom_stopwords: Vec<String>,
}

impl EngineParams {
    fn config(&self) -> Result<DedupConfig, DedupError> {
        let defaults = DedupConfig::default();
        Ok(DedupConfig {
            num_perm: self.num_perm.unwrap_or(defaults.num_perm),
            threshold: self.threshold.unwrap_or(defaults.threshold),
            bands: self.bands,
            seed: self.seed.unwrap_or(defaults.seed),
            stopwords: stopword_policy(self.stopwords.as_deref(), &self.custom_stopwords)?,
        })
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DedupParams {
    /// JSON array of objects to deduplicate.
    pub records: Vec<serde_json::Value>,
    /// Field containing text (default: "text").
    #[serde(default = "default_field")]
    pub field: String,
    /// Field containing the integer row id (default: "row_id"; falls back to position).
    #[serde(default = "default_id_field")]
    pub id_field: String,
    #[serde(flatten)]
    pub engine: EngineParams,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ScoreParams {
    /// JSON array of objects to score.
    pub records: Vec<serde_json::Value>,
    /// Field containing text (default: "text").
    #[serde(default = "default_field")]
    pub field: String,
    /// Stopword policy: "none", "default", "custom" (default: "none").
    pub stopwords: Option<String>,
    /// Words to strip when stopwords is "custom".
    #[serde(default)]
    pub custom_stopwords: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SimilarityParams {
    /// First string.
    pub a: String,
    /// Second string.
    pub b: String,
    #[serde(flatten)]
    pub engine: EngineParams,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SummaryParams {
    /// Records annotated by the `dedup` tool.
    pub records: Vec<serde_json::Value>,
    /// Also count labels per value of this field.
    pub group_by: Option<String>,
    /// Number of entropy histogram bins (default: 30).
    #[serde(default = "default_bins")]
    pub bins: usize,
}

// ── Default helpers ─────────────────────────────────────────────────────────

fn default_field() -> String {
    DEFAULT_TEXT_FIELD.into()
}
fn default_id_field() -> String {
    DEFAULT_ID_FIELD.into()
}
fn default_bins() -> usize {
    DEFAULT_BINS
}

// ── Shared helpers ──────────────────────────────────────────────────────────

fn stopword_policy(name: Option<&str>, words: &[String]) -> Result<StopwordPolicy, DedupError> {
    match name {
        Some(name) => StopwordPolicy::from_name(name, words.to_vec()),
        None if words.is_empty() => Ok(StopwordPolicy::None),
        None => Ok(StopwordPolicy::Custom(words.to_vec())),
    }
}

fn json_text(v: &serde_json::Value) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
}

fn join_error(e: tokio::task::JoinError) -> McpError {
    McpError::internal_error(format!("task join error: {e}"), None)
}

fn invalid(e: DedupError) -> McpError {
    McpError::invalid_params(e.to_string(), None)
}

// ── MCP Server ──────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct NearDupMcp {
    #[allow(dead_code)] // accessed at runtime by the #[tool_router] macro
    tool_router: ToolRouter<Self>,
}

impl Default for NearDupMcp {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_router]
impl NearDupMcp {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }

    // ── dedup ───────────────────────────────────────────────────────────

    #[tool(
        name = "dedup",
        description = "Label JSON records as unique, near_duplicate or exact_duplicate using MinHash signatures and LSH banding. Returns the input records with clean_text, dup_type, dup_similarity, dup_match, entropy, word_count and char_count columns added. Tune with threshold (default 0.8) or an explicit bands count."
    )]
    async fn dedup(&self, params: Parameters<DedupParams>) -> Result<CallToolResult, McpError> {
        let p = params.0;
        let result = tokio::task::spawn_blocking(move || {
            let config = p.engine.config()?;
            let opts = TableOptions {
                text_field: p.field,
                id_field: p.id_field,
            };
            ops::op_dedup(&p.records, &opts, &config)
        })
        .await
        .map_err(join_error)?
        .map_err(invalid)?;
        Ok(CallToolResult::success(vec![Content::text(json_text(
            &result,
        ))]))
    }

    // ── score ───────────────────────────────────────────────────────────

    #[tool(
        name = "score",
        description = "Normalize the text of JSON records and add clean_text, entropy (Shannon entropy of the character distribution, in bits), word_count and char_count."
    )]
    async fn score(&self, params: Parameters<ScoreParams>) -> Result<CallToolResult, McpError> {
        let p = params.0;
        let result = tokio::task::spawn_blocking(move || {
            let policy = stopword_policy(p.stopwords.as_deref(), &p.custom_stopwords)?;
            Ok::<_, DedupError>(ops::op_score(&p.records, &p.field, &policy))
        })
        .await
        .map_err(join_error)?
        .map_err(invalid)?;
        Ok(CallToolResult::success(vec![Content::text(json_text(
            &result,
        ))]))
    }

    // ── similarity ──────────────────────────────────────────────────────

    #[tool(
        name = "similarity",
        description = "Compare two strings. Returns the MinHash-estimated Jaccard similarity, the exact Jaccard similarity of the token sets, whether the two would be LSH candidates under the configured band split, and the S-curve candidate probability."
    )]
    async fn similarity(
        &self,
        params: Parameters<SimilarityParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        let result = tokio::task::spawn_blocking(move || {
            let config = p.engine.config()?;
            ops::op_similarity(&p.a, &p.b, &config)
        })
        .await
        .map_err(join_error)?
        .map_err(invalid)?;
        Ok(CallToolResult::success(vec![Content::text(json_text(
            &result,
        ))]))
    }

    // ── summary ─────────────────────────────────────────────────────────

    #[tool(
        name = "summary",
        description = "Summarize records annotated by the dedup tool: counts per dup_type, duplicate ratio, entropy min/mean/max and histogram, mean word count, and optional per-group label counts."
    )]
    async fn summary(&self, params: Parameters<SummaryParams>) -> Result<CallToolResult, McpError> {
        let p = params.0;
        if p.bins == 0 {
            return Err(McpError::invalid_params("bins must be at least 1", None));
        }
        let result = tokio::task::spawn_blocking(move || {
            ops::op_summary(&p.records, p.group_by.as_deref(), p.bins)
        })
        .await
        .map_err(join_error)?
        .map_err(invalid)?;
        Ok(CallToolResult::success(vec![Content::text(json_text(
            &result,
        ))]))
    }
}

// ── ServerHandler ───────────────────────────────────────────────────────────

impl ServerHandler for NearDupMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Near-duplicate detection engine. Tools: dedup, score, similarity, summary. \
                 Pass JSON records with a text field for bulk operations, two strings for \
                 similarity, and dedup output for summary."
                    .into(),
            ),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: None }),
                ..Default::default()
            },
            server_info: Implementation {
                name: "neardup".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: Some("Near-Duplicate Engine".into()),
                description: Some(
                    "MinHash + LSH near-duplicate detection and text quality scoring".into(),
                ),
                icons: None,
                website_url: None,
            },
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult {
            tools: self.tool_router.list_all(),
            next_cursor: None,
            meta: Default::default(),
        }))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        let tool_context = ToolCallContext::new(self, request, context);
        async move { self.tool_router.call(tool_context).await }
    }

    fn get_tool(&self, name: &str) -> Option<Tool> {
        self.tool_router.get(name).cloned()
    }
}

// ── Entry point ─────────────────────────────────────────────────────────────

/// Start the MCP server on stdio. Called from `cli.rs` when `--mcp` is passed.
pub async fn serve_stdio() -> Result<(), Box<dyn std::error::Error>> {
    let server = NearDupMcp::new();
    let transport = rmcp::transport::io::stdio();
    let service = server.serve(transport).await.inspect_err(|e| {
        tracing::error!(error = %e, "MCP serve error");
    })?;
    tracing::info!("MCP server ready on stdio");
    service.waiting().await?;
    Ok(())
}
