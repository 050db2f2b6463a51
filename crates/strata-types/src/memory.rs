//! Vector record types for Strata.
//!
//! A `VectorRecord` is the unit of storage: an embedding vector plus an open
//! metadata map, stamped with a timestamp that decides which partition it
//! lives in and which retention tier it currently belongs to.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::graph::GraphEdge;

/// Open key/value metadata attached to a record.
///
/// Values are JSON-like so arbitrary caller payloads round-trip losslessly.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Metadata field consulted for (and normalized into) a record timestamp.
pub const METADATA_TIMESTAMP_KEY: &str = "timestamp";

/// Retention tier of a record.
///
/// Hot records are returned by default; cold records only when a query
/// explicitly asks for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Hot,
    Cold,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Hot => write!(f, "hot"),
            Tier::Cold => write!(f, "cold"),
        }
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hot" => Ok(Tier::Hot),
            "cold" => Ok(Tier::Cold),
            other => Err(format!("invalid tier: '{other}'")),
        }
    }
}

/// A stored embedding with its metadata and placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Unique across the whole store.
    pub id: String,
    pub vector: Vec<f32>,
    #[serde(default)]
    pub metadata: Metadata,
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub tier: Tier,
    /// Partition key derived once at write time, never recomputed.
    pub partition: String,
}

/// A query hit: the record plus its similarity to the query vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredRecord {
    #[serde(flatten)]
    pub record: VectorRecord,
    pub similarity: f32,
}

/// A query hit joined with the record's current graph neighbors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryHit {
    #[serde(flatten)]
    pub scored: ScoredRecord,
    pub neighbors: Vec<GraphEdge>,
}

/// Filters shared by listing and querying.
///
/// Time bounds are inclusive epoch milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOptions {
    #[serde(default)]
    pub include_cold: bool,
    #[serde(default)]
    pub start_time: Option<i64>,
    #[serde(default)]
    pub end_time: Option<i64>,
}

impl ListOptions {
    /// Whether a record passes the tier and time-window filters.
    pub fn matches(&self, record: &VectorRecord) -> bool {
        if !self.include_cold && record.tier == Tier::Cold {
            return false;
        }
        if let Some(start) = self.start_time {
            if record.timestamp < start {
                return false;
            }
        }
        if let Some(end) = self.end_time {
            if record.timestamp > end {
                return false;
            }
        }
        true
    }
}

/// Nearest-neighbor query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(flatten)]
    pub filter: ListOptions,
}

fn default_top_k() -> usize {
    5
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            filter: ListOptions::default(),
        }
    }
}

impl QueryOptions {
    pub fn top_k(top_k: usize) -> Self {
        Self {
            top_k,
            ..Self::default()
        }
    }

    pub fn with_cold(mut self) -> Self {
        self.filter.include_cold = true;
        self
    }
}

/// The raw contents of one partition file, before normalization.
///
/// Entries are kept as JSON values so a single malformed record can be
/// dropped without discarding its siblings.
#[derive(Debug, Clone)]
pub struct RawPartition {
    pub key: String,
    pub entries: Vec<serde_json::Value>,
}

/// Aggregate counts over the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub total: usize,
    pub hot: usize,
    pub cold: usize,
    pub partitions: usize,
}

/// Store counts plus graph shape and the active embedding model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStats {
    #[serde(flatten)]
    pub store: StoreStats,
    pub graph_nodes: usize,
    pub graph_edges: usize,
    pub embedding_model: String,
}

/// Outcome of a retention sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionReport {
    /// Partition keys deleted for cold-retention expiry.
    pub deleted_partitions: Vec<String>,
    /// Ids of records removed along with those partitions.
    pub removed_ids: Vec<String>,
    /// Number of records whose tier flipped.
    pub tier_changes: usize,
}

impl RetentionReport {
    pub fn is_empty(&self) -> bool {
        self.deleted_partitions.is_empty() && self.tier_changes == 0
    }
}
