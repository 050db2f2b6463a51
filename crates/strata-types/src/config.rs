//! Configuration types for Strata.
//!
//! `MemoryConfig` represents the `config.toml` that controls retention,
//! partitioning, graph shape, and embedding behavior.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Time bucket size for partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionGranularity {
    /// One partition per UTC day, keyed `YYYY-MM-DD`.
    #[default]
    Day,
    /// One partition per UTC hour, keyed `YYYY-MM-DD-HH`.
    Hour,
}

impl fmt::Display for PartitionGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionGranularity::Day => write!(f, "day"),
            PartitionGranularity::Hour => write!(f, "hour"),
        }
    }
}

impl FromStr for PartitionGranularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "day" => Ok(PartitionGranularity::Day),
            "hour" => Ok(PartitionGranularity::Hour),
            other => Err(format!("invalid partition granularity: '{other}'")),
        }
    }
}

/// Validated retention horizons.
///
/// Invariant: `hot_retention_ms <= cold_retention_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    hot_retention_ms: i64,
    cold_retention_ms: i64,
    granularity: PartitionGranularity,
}

impl RetentionPolicy {
    pub fn new(
        hot_retention_ms: i64,
        cold_retention_ms: i64,
        granularity: PartitionGranularity,
    ) -> Result<Self, ConfigError> {
        if hot_retention_ms < 0 || hot_retention_ms > cold_retention_ms {
            return Err(ConfigError::InvalidRetention {
                hot_ms: hot_retention_ms,
                cold_ms: cold_retention_ms,
            });
        }
        Ok(Self {
            hot_retention_ms,
            cold_retention_ms,
            granularity,
        })
    }

    pub fn from_days(
        hot_days: u32,
        cold_days: u32,
        granularity: PartitionGranularity,
    ) -> Result<Self, ConfigError> {
        Self::new(
            i64::from(hot_days) * MS_PER_DAY,
            i64::from(cold_days) * MS_PER_DAY,
            granularity,
        )
    }

    pub fn hot_retention_ms(&self) -> i64 {
        self.hot_retention_ms
    }

    pub fn cold_retention_ms(&self) -> i64 {
        self.cold_retention_ms
    }

    pub fn granularity(&self) -> PartitionGranularity {
        self.granularity
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            hot_retention_ms: i64::from(default_hot_retention_days()) * MS_PER_DAY,
            cold_retention_ms: i64::from(default_cold_retention_days()) * MS_PER_DAY,
            granularity: PartitionGranularity::Day,
        }
    }
}

/// Top-level configuration for a memory instance.
///
/// Loaded from `{data_dir}/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Records newer than this many days are hot.
    #[serde(default = "default_hot_retention_days")]
    pub hot_retention_days: u32,

    /// Partitions starting earlier than this many days ago are deleted.
    #[serde(default = "default_cold_retention_days")]
    pub cold_retention_days: u32,

    #[serde(default)]
    pub partition_granularity: PartitionGranularity,

    /// Similarity edges kept per node.
    #[serde(default = "default_graph_degree")]
    pub graph_degree: usize,

    /// Default hop limit for lineage traces.
    #[serde(default = "default_lineage_depth")]
    pub lineage_depth: usize,

    /// Length of fallback vectors.
    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: usize,

    /// Model used by the local embedder.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Per-call timeout for the embedding provider.
    #[serde(default = "default_embedding_timeout_ms")]
    pub embedding_timeout_ms: u64,

    /// Concurrent provider requests per batch.
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,

    /// Pause between batches.
    #[serde(default = "default_batch_pause_ms")]
    pub batch_pause_ms: u64,
}

fn default_hot_retention_days() -> u32 {
    7
}

fn default_cold_retention_days() -> u32 {
    90
}

fn default_graph_degree() -> usize {
    5
}

fn default_lineage_depth() -> usize {
    3
}

fn default_embedding_dimension() -> usize {
    384
}

fn default_embedding_model() -> String {
    "bge-small-en-v1.5".to_string()
}

fn default_embedding_timeout_ms() -> u64 {
    10_000
}

fn default_batch_concurrency() -> usize {
    5
}

fn default_batch_pause_ms() -> u64 {
    100
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            hot_retention_days: default_hot_retention_days(),
            cold_retention_days: default_cold_retention_days(),
            partition_granularity: PartitionGranularity::default(),
            graph_degree: default_graph_degree(),
            lineage_depth: default_lineage_depth(),
            embedding_dimension: default_embedding_dimension(),
            embedding_model: default_embedding_model(),
            embedding_timeout_ms: default_embedding_timeout_ms(),
            batch_concurrency: default_batch_concurrency(),
            batch_pause_ms: default_batch_pause_ms(),
        }
    }
}

impl MemoryConfig {
    /// Build the retention policy, rejecting `hot > cold`.
    pub fn retention_policy(&self) -> Result<RetentionPolicy, ConfigError> {
        RetentionPolicy::from_days(
            self.hot_retention_days,
            self.cold_retention_days,
            self.partition_granularity,
        )
    }

    /// Check every field that has a constraint beyond its type.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.retention_policy()?;
        if self.embedding_dimension == 0 {
            return Err(ConfigError::InvalidValue(
                "embedding_dimension must be at least 1".to_string(),
            ));
        }
        if self.batch_concurrency == 0 {
            return Err(ConfigError::InvalidValue(
                "batch_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_config_default_values() {
        let config = MemoryConfig::default();
        assert_eq!(config.hot_retention_days, 7);
        assert_eq!(config.cold_retention_days, 90);
        assert_eq!(config.partition_granularity, PartitionGranularity::Day);
        assert_eq!(config.graph_degree, 5);
        assert_eq!(config.lineage_depth, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_memory_config_deserialize_with_defaults() {
        let config: MemoryConfig = toml::from_str("").unwrap();
        assert_eq!(config, MemoryConfig::default());
    }

    #[test]
    fn test_memory_config_deserialize_with_values() {
        let toml_str = r#"
hot_retention_days = 30
cold_retention_days = 365
partition_granularity = "hour"
graph_degree = 8
lineage_depth = 2
batch_pause_ms = 0
"#;
        let config: MemoryConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.hot_retention_days, 30);
        assert_eq!(config.cold_retention_days, 365);
        assert_eq!(config.partition_granularity, PartitionGranularity::Hour);
        assert_eq!(config.graph_degree, 8);
        assert_eq!(config.lineage_depth, 2);
        assert_eq!(config.batch_pause_ms, 0);
        assert_eq!(config.embedding_dimension, 384);
    }

    #[test]
    fn test_retention_policy_rejects_hot_beyond_cold() {
        let config = MemoryConfig {
            hot_retention_days: 100,
            cold_retention_days: 90,
            ..MemoryConfig::default()
        };
        assert!(matches!(
            config.retention_policy(),
            Err(ConfigError::InvalidRetention { .. })
        ));
    }

    #[test]
    fn test_retention_policy_from_days() {
        let policy = RetentionPolicy::from_days(1, 2, PartitionGranularity::Hour).unwrap();
        assert_eq!(policy.hot_retention_ms(), MS_PER_DAY);
        assert_eq!(policy.cold_retention_ms(), 2 * MS_PER_DAY);
        assert_eq!(policy.granularity(), PartitionGranularity::Hour);
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let config = MemoryConfig {
            batch_concurrency: 0,
            ..MemoryConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_granularity_roundtrip() {
        for g in [PartitionGranularity::Day, PartitionGranularity::Hour] {
            let parsed: PartitionGranularity = g.to_string().parse().unwrap();
            assert_eq!(g, parsed);
        }
    }
}
