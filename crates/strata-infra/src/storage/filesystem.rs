//! JSON-file storage for partitions and the relationship graph.
//!
//! Implements both `PartitionStorage` and `GraphStorage` from `strata-core`.
//! Layout under the data directory:
//!
//! ```text
//! {data_dir}/
//!   partitions/
//!     2026-03-01.json      JSON array of records
//!     2026-03-02.json
//!   graph.json             id -> [edge]
//!   vectors.json           legacy single-file store, migrated on open
//! ```
//!
//! Every write goes to a `.tmp` sibling first and is then renamed over the
//! target after an fsync, so a crash mid-write never leaves a half-written
//! file behind.
//! Files that fail to parse are skipped with a warning.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::io::AsyncWriteExt;

use strata_core::memory::storage::{GraphStorage, PartitionStorage};
use strata_types::error::StoreError;
use strata_types::graph::GraphSnapshot;
use strata_types::memory::{RawPartition, VectorRecord};

const PARTITIONS_DIR: &str = "partitions";
const GRAPH_FILE: &str = "graph.json";
const LEGACY_FILE: &str = "vectors.json";
const PARTITION_EXT: &str = "json";

/// File-backed storage rooted at a data directory.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    root: PathBuf,
}

impl JsonFileStorage {
    /// Create a storage rooted at `root`. Directories are created lazily on
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn partitions_dir(&self) -> PathBuf {
        self.root.join(PARTITIONS_DIR)
    }

    pub fn partition_path(&self, key: &str) -> PathBuf {
        self.partitions_dir()
            .join(format!("{key}.{PARTITION_EXT}"))
    }

    pub fn graph_path(&self) -> PathBuf {
        self.root.join(GRAPH_FILE)
    }

    pub fn legacy_path(&self) -> PathBuf {
        self.root.join(LEGACY_FILE)
    }

    /// Serialize `value` and atomically replace `path` with it.
    ///
    /// The temp file is synced before the rename, so a returned `Ok` means the
    /// new contents are on disk.
    async fn write_json_atomic<T: serde::Serialize + ?Sized>(
        path: &Path,
        value: &T,
    ) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(value)?;
        let tmp = path.with_extension("json.tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Read a JSON file, returning `None` when it does not exist.
    async fn read_json(path: &Path) -> Result<Option<Value>, StoreError> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Remove a file, treating "already gone" as success.
    async fn remove_if_exists(path: &Path) -> Result<(), StoreError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

impl PartitionStorage for JsonFileStorage {
    async fn load_partitions(&self) -> Result<Vec<RawPartition>, StoreError> {
        let dir = self.partitions_dir();
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut partitions = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(PARTITION_EXT) {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            match Self::read_json(&path).await {
                Ok(Some(Value::Array(records))) => partitions.push(RawPartition {
                    key: key.to_string(),
                    entries: records,
                }),
                Ok(Some(_)) => {
                    tracing::warn!(
                        partition = %key,
                        "Partition file is not a JSON array; skipping"
                    );
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(
                        partition = %key,
                        error = %err,
                        "Failed to read partition file; skipping"
                    );
                }
            }
        }

        partitions.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(partitions)
    }

    async fn write_partition(&self, key: &str, records: &[VectorRecord]) -> Result<(), StoreError> {
        Self::write_json_atomic(&self.partition_path(key), records).await
    }

    async fn delete_partition(&self, key: &str) -> Result<(), StoreError> {
        Self::remove_if_exists(&self.partition_path(key)).await
    }

    async fn read_legacy(&self) -> Result<Option<Vec<Value>>, StoreError> {
        let path = self.legacy_path();
        match Self::read_json(&path).await {
            Ok(Some(Value::Array(records))) => Ok(Some(records)),
            Ok(Some(_)) => {
                tracing::warn!(path = %path.display(), "Legacy store is not a JSON array; ignoring");
                Ok(None)
            }
            Ok(None) => Ok(None),
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "Failed to read legacy store; ignoring"
                );
                Ok(None)
            }
        }
    }

    async fn remove_legacy(&self) -> Result<(), StoreError> {
        Self::remove_if_exists(&self.legacy_path()).await
    }
}

impl GraphStorage for JsonFileStorage {
    async fn load_graph(&self) -> Result<GraphSnapshot, StoreError> {
        let path = self.graph_path();
        let value = match Self::read_json(&path).await {
            Ok(Some(value)) => value,
            Ok(None) => return Ok(GraphSnapshot::new()),
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "Failed to read graph file; starting with an empty graph"
                );
                return Ok(GraphSnapshot::new());
            }
        };

        match serde_json::from_value::<GraphSnapshot>(value) {
            Ok(graph) => Ok(graph),
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "Graph file has an unexpected shape; starting with an empty graph"
                );
                Ok(GraphSnapshot::new())
            }
        }
    }

    async fn save_graph(&self, graph: &GraphSnapshot) -> Result<(), StoreError> {
        Self::write_json_atomic(&self.graph_path(), graph).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use serde_json::json;
    use strata_core::memory::orchestrator::MemoryOrchestrator;
    use strata_core::memory::vector_store::VectorStore;
    use strata_types::config::{MemoryConfig, PartitionGranularity, RetentionPolicy};
    use strata_types::graph::{EdgeType, GraphEdge};
    use strata_types::memory::{Metadata, Tier};
    use tempfile::TempDir;

    fn policy() -> RetentionPolicy {
        RetentionPolicy::from_days(7, 90, PartitionGranularity::Day).unwrap()
    }

    fn days_ago(days: i64) -> i64 {
        (Utc::now() - Duration::days(days)).timestamp_millis()
    }

    fn metadata(pairs: &[(&str, Value)]) -> Metadata {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_paths() {
        let storage = JsonFileStorage::new("/data/strata");
        assert_eq!(
            storage.partition_path("2026-03-01"),
            PathBuf::from("/data/strata/partitions/2026-03-01.json")
        );
        assert_eq!(storage.graph_path(), PathBuf::from("/data/strata/graph.json"));
        assert_eq!(storage.legacy_path(), PathBuf::from("/data/strata/vectors.json"));
    }

    #[tokio::test]
    async fn test_load_from_missing_dir_is_empty() {
        let tmp = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(tmp.path().join("nothing-here"));
        assert!(storage.load_partitions().await.unwrap().is_empty());
        assert!(storage.load_graph().await.unwrap().is_empty());
        assert!(storage.read_legacy().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_round_trip_through_fresh_store() {
        let tmp = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(tmp.path());

        let mut store = VectorStore::open(storage.clone(), policy()).await.unwrap();
        store
            .add_embedding("a", vec![1.0, 0.0], metadata(&[("topic", json!("rust"))]), None)
            .await
            .unwrap();
        store
            .add_embedding("b", vec![0.5, 0.5], Metadata::new(), Some(days_ago(10)))
            .await
            .unwrap();
        drop(store);

        let reopened = VectorStore::open(storage, policy()).await.unwrap();
        let mut ids = reopened.get_all_ids();
        ids.sort();
        assert_eq!(ids, vec!["a", "b"]);

        let a = reopened.get_item("a").unwrap();
        assert_eq!(a.vector, vec![1.0, 0.0]);
        assert_eq!(a.metadata["topic"], "rust");
        assert!(a.metadata["timestamp"].as_str().unwrap().ends_with('Z'));
        assert_eq!(reopened.get_item("b").unwrap().tier, Tier::Cold);
    }

    #[tokio::test]
    async fn test_write_leaves_no_tmp_files() {
        let tmp = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(tmp.path());
        let mut store = VectorStore::open(storage.clone(), policy()).await.unwrap();
        store
            .add_embedding("a", vec![1.0], Metadata::new(), None)
            .await
            .unwrap();

        let mut dir = tokio::fs::read_dir(storage.partitions_dir()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        assert_eq!(names.len(), 1);
        assert!(names[0].ends_with(".json"));
    }

    #[tokio::test]
    async fn test_shrinking_rewrite_replaces_whole_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("partitions").join("2026-01-01.json");

        let long: Vec<u32> = (0..500).collect();
        JsonFileStorage::write_json_atomic(&path, &long).await.unwrap();
        JsonFileStorage::write_json_atomic(&path, &[1u32]).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let parsed: Vec<u32> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, vec![1]);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_non_finite_vector_never_reaches_disk() {
        let tmp = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(tmp.path());
        let mut store = VectorStore::open(storage.clone(), policy()).await.unwrap();

        assert!(store
            .add_embedding("n", vec![f32::NAN, 1.0], Metadata::new(), None)
            .await
            .is_err());
        store
            .add_embedding("a", vec![1.0, 1.0], Metadata::new(), None)
            .await
            .unwrap();
        drop(store);

        let reopened = VectorStore::open(storage, policy()).await.unwrap();
        assert_eq!(reopened.get_all_ids(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_corrupt_partition_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(tmp.path());

        let mut store = VectorStore::open(storage.clone(), policy()).await.unwrap();
        store
            .add_embedding("good", vec![1.0], Metadata::new(), None)
            .await
            .unwrap();
        drop(store);

        tokio::fs::write(storage.partition_path("2020-01-01"), "{ not json")
            .await
            .unwrap();
        tokio::fs::write(storage.partition_path("2020-01-02"), r#"{"id": "x"}"#)
            .await
            .unwrap();

        let partitions = storage.load_partitions().await.unwrap();
        assert_eq!(partitions.len(), 1);

        let reopened = VectorStore::open(storage, policy()).await.unwrap();
        assert_eq!(reopened.get_all_ids(), vec!["good".to_string()]);
    }

    #[tokio::test]
    async fn test_malformed_records_dropped_individually() {
        let tmp = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(tmp.path());
        let key = Utc::now().format("%Y-%m-%d").to_string();

        tokio::fs::create_dir_all(storage.partitions_dir()).await.unwrap();
        let content = json!([
            {"id": "ok", "vector": [1.0, 0.0], "metadata": {}, "timestamp": Utc::now().timestamp_millis()},
            {"id": "", "vector": [1.0]},
            {"id": "no-vector"},
            {"id": "bad-vector", "vector": "nope"}
        ]);
        tokio::fs::write(storage.partition_path(&key), content.to_string())
            .await
            .unwrap();

        let store = VectorStore::open(storage, policy()).await.unwrap();
        assert_eq!(store.get_all_ids(), vec!["ok".to_string()]);
    }

    #[tokio::test]
    async fn test_corrupt_graph_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(tmp.path());
        tokio::fs::write(storage.graph_path(), "[1, 2, 3]").await.unwrap();
        assert!(storage.load_graph().await.unwrap().is_empty());

        tokio::fs::write(storage.graph_path(), "garbage").await.unwrap();
        assert!(storage.load_graph().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_graph_round_trip() {
        let tmp = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(tmp.path());
        let mut graph = GraphSnapshot::new();
        graph.insert(
            "a".to_string(),
            vec![GraphEdge {
                target: "b".to_string(),
                weight: 0.75,
                edge_type: EdgeType::Manual,
                timestamp: 1_700_000_000_000,
            }],
        );

        storage.save_graph(&graph).await.unwrap();
        let raw = tokio::fs::read_to_string(storage.graph_path()).await.unwrap();
        assert!(raw.contains("\"type\": \"manual\""));
        assert_eq!(storage.load_graph().await.unwrap(), graph);
    }

    #[tokio::test]
    async fn test_legacy_store_is_migrated_and_removed() {
        let tmp = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(tmp.path());
        let recent = Utc::now().to_rfc3339();
        let legacy = json!([
            {"id": "l1", "vector": [1.0, 0.0], "metadata": {"timestamp": recent}},
            {"id": "l2", "vector": [0.0, 1.0], "timestamp": days_ago(3)},
            {"vector": [0.0, 1.0]}
        ]);
        tokio::fs::write(storage.legacy_path(), legacy.to_string())
            .await
            .unwrap();

        let store = VectorStore::open(storage.clone(), policy()).await.unwrap();
        let mut ids = store.get_all_ids();
        ids.sort();
        assert_eq!(ids, vec!["l1", "l2"]);
        assert!(!storage.legacy_path().exists());
        assert!(!storage.load_partitions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_retention_deletes_expired_partition_file() {
        let tmp = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(tmp.path());

        let mut store = VectorStore::open(storage.clone(), policy()).await.unwrap();
        store
            .add_embedding("kept", vec![1.0], Metadata::new(), Some(days_ago(88)))
            .await
            .unwrap();
        let kept_key = store.get_item("kept").unwrap().partition.clone();
        drop(store);

        // Plant a partition well past the cold horizon.
        let old_ts = days_ago(100);
        let old_key = Utc::now()
            .checked_sub_signed(Duration::days(100))
            .unwrap()
            .format("%Y-%m-%d")
            .to_string();
        tokio::fs::write(
            storage.partition_path(&old_key),
            json!([{"id": "expired", "vector": [1.0], "timestamp": old_ts}]).to_string(),
        )
        .await
        .unwrap();

        let store = VectorStore::open(storage.clone(), policy()).await.unwrap();
        assert_eq!(store.get_all_ids(), vec!["kept".to_string()]);
        assert!(!storage.partition_path(&old_key).exists());
        assert!(storage.partition_path(&kept_key).exists());
    }

    #[tokio::test]
    async fn test_orchestrator_persists_graph() {
        let tmp = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(tmp.path());
        let config = MemoryConfig {
            embedding_dimension: 16,
            ..MemoryConfig::default()
        };

        let mut memory = MemoryOrchestrator::open(&config, storage.clone(), storage.clone(), None)
            .await
            .unwrap();
        memory.add_document("one", "alpha", None).await.unwrap();
        memory.add_document("two", "beta", None).await.unwrap();
        memory.close().await.unwrap();

        let graph = storage.load_graph().await.unwrap();
        assert!(graph["two"].iter().any(|e| e.target == "one"));
        assert!(graph["one"].iter().any(|e| e.target == "two"));

        let memory = MemoryOrchestrator::open(&config, storage.clone(), storage, None)
            .await
            .unwrap();
        assert_eq!(memory.stats().store.total, 2);
        assert_eq!(memory.stats().graph_edges, 2);
    }
}
