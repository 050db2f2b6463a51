//! Storage port traits for partitions and the relationship graph.
//!
//! The engine never touches the filesystem directly. Implementations
//! (e.g., JSON files on disk) live in strata-infra.

use strata_types::error::StoreError;
use strata_types::graph::GraphSnapshot;
use strata_types::memory::{RawPartition, VectorRecord};

/// Durable storage for time partitions.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait PartitionStorage: Send + Sync {
    /// Load every readable partition.
    ///
    /// Units that fail to parse are skipped (and logged) by the
    /// implementation; only I/O failures on the storage root are errors.
    fn load_partitions(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<RawPartition>, StoreError>> + Send;

    /// Replace the full contents of one partition.
    fn write_partition(
        &self,
        key: &str,
        records: &[VectorRecord],
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Remove a partition. Removing a missing partition is not an error.
    fn delete_partition(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Read the legacy unpartitioned store, if one exists.
    fn read_legacy(
        &self,
    ) -> impl std::future::Future<Output = Result<Option<Vec<serde_json::Value>>, StoreError>> + Send;

    /// Remove the legacy store after migration.
    fn remove_legacy(&self) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}

/// Durable storage for the adjacency map.
pub trait GraphStorage: Send + Sync {
    /// Load the graph. A missing or corrupt graph loads as empty.
    fn load_graph(
        &self,
    ) -> impl std::future::Future<Output = Result<GraphSnapshot, StoreError>> + Send;

    /// Replace the persisted graph.
    fn save_graph(
        &self,
        graph: &GraphSnapshot,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}
