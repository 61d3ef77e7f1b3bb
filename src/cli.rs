use clap::{Args, Parser, Subcommand};
use nu_plugin_neardup::algo::summary::DEFAULT_BINS;
use nu_plugin_neardup::algo::tokenizer::StopwordPolicy;
use nu_plugin_neardup::config::DedupConfig;
use nu_plugin_neardup::error::{DedupError, Result};
use nu_plugin_neardup::ops::{self, TableOptions, DEFAULT_ID_FIELD, DEFAULT_TEXT_FIELD};
use serde_json::Value;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "neardup",
    version,
    about = "MinHash + LSH near-duplicate detection and text quality scoring"
)]
struct Cli {
    /// Start as an MCP (Model Context Protocol) server on stdio.
    /// AI assistants (Claude Desktop, Cursor, etc.) connect via JSON-RPC.
    #[cfg(feature = "mcp")]
    #[arg(long, exclusive = true)]
    mcp: bool,

    /// Log verbosity on stderr (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct StopwordArgs {
    /// Stopword policy: none, default, custom
    #[arg(long)]
    stopwords: Option<String>,
    /// Comma-separated words for --stopwords custom
    #[arg(long, value_delimiter = ',')]
    custom_stopwords: Vec<String>,
}

impl StopwordArgs {
    fn policy(&self) -> Result<Option<StopwordPolicy>> {
        match (&self.stopwords, self.custom_stopwords.is_empty()) {
            (None, true) => Ok(None),
            (None, false) => Ok(Some(StopwordPolicy::Custom(self.custom_stopwords.clone()))),
            (Some(name), _) => {
                StopwordPolicy::from_name(name, self.custom_stopwords.clone()).map(Some)
            }
        }
    }
}

#[derive(Args)]
struct EngineArgs {
    /// JSON config file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Number of MinHash permutations
    #[arg(short, long)]
    num_perm: Option<usize>,
    /// Jaccard similarity the band split targets
    #[arg(short, long)]
    threshold: Option<f64>,
    /// Explicit LSH band count (must divide num-perm)
    #[arg(short, long)]
    bands: Option<usize>,
    /// Seed of the permutation family
    #[arg(long)]
    seed: Option<u64>,
    #[command(flatten)]
    stopwords: StopwordArgs,
}

impl EngineArgs {
    fn config(&self) -> Result<DedupConfig> {
        let mut config = match &self.config {
            Some(path) => DedupConfig::from_file(path)?,
            None => DedupConfig::default(),
        };
        if let Some(n) = self.num_perm {
            config.num_perm = n;
        }
        if let Some(t) = self.threshold {
            config.threshold = t;
        }
        if let Some(b) = self.bands {
            config.bands = Some(b);
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(policy) = self.stopwords.policy()? {
            config.stopwords = policy;
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Label JSON records unique / near_duplicate / exact_duplicate and add quality scores
    Dedup {
        /// JSON field containing text
        #[arg(short, long, default_value = DEFAULT_TEXT_FIELD)]
        field: String,
        /// JSON field containing the integer row id (falls back to position)
        #[arg(long, default_value = DEFAULT_ID_FIELD)]
        id_field: String,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Add clean_text, entropy, word_count and char_count to JSON records
    Score {
        /// JSON field containing text
        #[arg(short, long, default_value = DEFAULT_TEXT_FIELD)]
        field: String,
        #[command(flatten)]
        stopwords: StopwordArgs,
    },
    /// Compare two strings with MinHash and exact Jaccard
    Similarity {
        /// First string
        a: String,
        /// Second string
        b: String,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Summarize records annotated by `dedup`
    Summary {
        /// Also count labels per value of this field
        #[arg(short, long)]
        group_by: Option<String>,
        /// Number of entropy histogram bins
        #[arg(long, default_value_t = DEFAULT_BINS)]
        bins: usize,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // ── MCP server mode ─────────────────────────────────────────────────
    #[cfg(feature = "mcp")]
    if cli.mcp {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                eprintln!("failed to create tokio runtime: {e}");
                std::process::exit(1);
            }
        };
        rt.block_on(async {
            if let Err(e) = nu_plugin_neardup::mcp::serve_stdio().await {
                eprintln!("MCP server error: {e}");
                std::process::exit(1);
            }
        });
        return;
    }

    // ── Normal subcommand dispatch ──────────────────────────────────────
    let Some(command) = cli.command else {
        eprintln!("No subcommand provided. Run `neardup --help` for usage.");
        std::process::exit(1);
    };

    if let Err(e) = run(command) {
        tracing::error!(error = %e, "command failed");
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    let output = match command {
        Commands::Dedup {
            field,
            id_field,
            engine,
        } => {
            let config = engine.config()?;
            let opts = TableOptions {
                text_field: field,
                id_field,
            };
            ops::op_dedup(&read_stdin_json()?, &opts, &config)?
        }
        Commands::Score { field, stopwords } => {
            let policy = stopwords.policy()?.unwrap_or_default();
            ops::op_score(&read_stdin_json()?, &field, &policy)
        }
        Commands::Similarity { a, b, engine } => ops::op_similarity(&a, &b, &engine.config()?)?,
        Commands::Summary { group_by, bins } => {
            if bins == 0 {
                return Err(DedupError::InvalidInput("--bins must be at least 1".into()));
            }
            ops::op_summary(&read_stdin_json()?, group_by.as_deref(), bins)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Read a JSON array (or a single JSON value) from stdin.
fn read_stdin_json() -> Result<Vec<Value>> {
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    let parsed: Value = serde_json::from_str(&buf)?;
    Ok(match parsed {
        Value::Array(arr) => arr,
        single => vec![single],
    })
}
