//! CLI command definitions and dispatch for the `strata` binary.
//!
//! Uses clap derive macros for argument parsing. Commands map one-to-one
//! onto memory operations (e.g., `strata add`, `strata query`, `strata trace`).

pub mod embed;
pub mod memory;
pub mod query;
pub mod status;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use serde_json::Value;

use strata_core::memory::timestamp::parse_timestamp_value;
use strata_types::graph::EdgeType;
use strata_types::memory::{ListOptions, Metadata};

/// Time-layered vector memory with a relationship graph.
#[derive(Parser)]
#[command(name = "strata", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Only log errors. Command results are still printed.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Data directory (defaults to ~/.strata).
    #[arg(long, global = true, env = "STRATA_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Skip the local embedding model and use deterministic hash vectors.
    #[arg(long, global = true)]
    pub no_model: bool,

    /// Export tracing spans to stdout via OpenTelemetry.
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Tier and time-window filters shared by listing commands.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Include cold-tier records.
    #[arg(long)]
    pub include_cold: bool,

    /// Only records at or after this time (epoch ms or RFC 3339).
    #[arg(long)]
    pub since: Option<String>,

    /// Only records at or before this time (epoch ms or RFC 3339).
    #[arg(long)]
    pub until: Option<String>,
}

impl FilterArgs {
    pub fn to_list_options(&self) -> Result<ListOptions> {
        Ok(ListOptions {
            include_cold: self.include_cold,
            start_time: self.since.as_deref().map(parse_time).transpose()?,
            end_time: self.until.as_deref().map(parse_time).transpose()?,
        })
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Embed a text and store it.
    Add {
        /// The text to remember.
        text: String,

        /// Record id (defaults to a new UUID).
        #[arg(long)]
        id: Option<String>,

        /// Metadata entry as key=value (repeatable; values may be JSON).
        #[arg(long = "meta", value_name = "KEY=VALUE")]
        meta: Vec<String>,
    },

    /// Store a raw vector.
    #[command(name = "add-vector")]
    AddVector {
        /// Record id.
        id: String,

        /// Comma-separated components, e.g. "0.1,0.2,0.3".
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
        vector: Vec<f32>,

        /// Record time (epoch ms or RFC 3339); defaults to now.
        #[arg(long)]
        timestamp: Option<String>,

        /// Metadata entry as key=value (repeatable; values may be JSON).
        #[arg(long = "meta", value_name = "KEY=VALUE")]
        meta: Vec<String>,
    },

    /// Rank stored records by similarity to a text or vector.
    #[command(alias = "search")]
    Query {
        /// Text to embed and search for.
        #[arg(required_unless_present = "vector")]
        text: Option<String>,

        /// Query with a raw vector instead of text.
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, conflicts_with = "text")]
        vector: Option<Vec<f32>>,

        /// Maximum results.
        #[arg(short = 'k', long, default_value = "5")]
        top_k: usize,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// List stored records without ranking.
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Show one record.
    Get {
        /// Record id.
        id: String,
    },

    /// Print every stored id.
    Ids,

    /// Records within a time window.
    Slice {
        /// Window start (epoch ms or RFC 3339).
        start: String,

        /// Window end (epoch ms or RFC 3339).
        end: String,

        /// Include cold-tier records.
        #[arg(long)]
        include_cold: bool,
    },

    /// Walk the relationship graph from a record.
    Trace {
        /// Root record id.
        id: String,

        /// Maximum hops (defaults to `lineage_depth` from config).
        #[arg(short, long)]
        depth: Option<usize>,
    },

    /// Link two records in both directions.
    Relate {
        /// First record id.
        a: String,

        /// Second record id.
        b: String,

        /// Edge weight.
        #[arg(short, long, default_value = "1.0")]
        weight: f32,

        /// Edge type (manual or similarity).
        #[arg(long = "type", default_value = "manual", value_parser = parse_edge_type)]
        edge_type: EdgeType,
    },

    /// Store status dashboard.
    Status,

    /// Run a retention sweep now.
    Sweep,

    /// Print embedding vectors for one or more texts.
    Embed {
        /// Texts to embed.
        #[arg(required = true)]
        texts: Vec<String>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn parse_edge_type(s: &str) -> Result<EdgeType, String> {
    s.parse()
}

/// Parse a user-supplied time as epoch ms or an RFC 3339 / ISO-8601 string.
pub fn parse_time(input: &str) -> Result<i64> {
    parse_timestamp_value(&Value::String(input.to_string()))
        .with_context(|| format!("Invalid time '{input}' (expected epoch ms or RFC 3339)"))
}

/// Parse repeated `key=value` flags into metadata.
///
/// Values that parse as JSON keep their type; anything else is a string.
pub fn parse_metadata(entries: &[String]) -> Result<Metadata> {
    let mut metadata = Metadata::new();
    for entry in entries {
        let Some((key, raw)) = entry.split_once('=') else {
            bail!("Invalid metadata '{entry}' (expected KEY=VALUE)");
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("Invalid metadata '{entry}' (empty key)");
        }
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        metadata.insert(key.to_string(), value);
    }
    Ok(metadata)
}

/// Shorten `text` to at most `max` characters, marking the cut with "...".
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
