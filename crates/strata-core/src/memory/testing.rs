//! In-memory storage doubles shared by the engine's unit tests.
//!
//! Clones share state, so dropping a store and reopening it over a clone
//! behaves like reopening the same directory.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use strata_types::error::StoreError;
use strata_types::graph::GraphSnapshot;
use strata_types::memory::{RawPartition, VectorRecord};

use super::storage::{GraphStorage, PartitionStorage};

#[derive(Default)]
struct PartitionState {
    partitions: BTreeMap<String, Vec<Value>>,
    legacy: Option<Vec<Value>>,
}

#[derive(Clone, Default)]
pub struct InMemoryPartitionStorage {
    state: Arc<Mutex<PartitionState>>,
}

impl InMemoryPartitionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_raw(&self, key: &str, entries: Vec<Value>) {
        self.state
            .lock()
            .unwrap()
            .partitions
            .insert(key.to_string(), entries);
    }

    pub fn set_legacy(&self, entries: Vec<Value>) {
        self.state.lock().unwrap().legacy = Some(entries);
    }

    pub fn has_legacy(&self) -> bool {
        self.state.lock().unwrap().legacy.is_some()
    }

    pub fn has_partition(&self, key: &str) -> bool {
        self.state.lock().unwrap().partitions.contains_key(key)
    }

    pub fn partition_count(&self) -> usize {
        self.state.lock().unwrap().partitions.len()
    }

    pub fn partition_len(&self, key: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .partitions
            .get(key)
            .map_or(0, Vec::len)
    }

    pub fn record_field(&self, key: &str, id: &str, field: &str) -> Option<Value> {
        let state = self.state.lock().unwrap();
        state
            .partitions
            .get(key)?
            .iter()
            .find(|entry| entry["id"] == id)
            .and_then(|entry| entry.get(field).cloned())
    }
}

impl PartitionStorage for InMemoryPartitionStorage {
    async fn load_partitions(&self) -> Result<Vec<RawPartition>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .partitions
            .iter()
            .map(|(key, entries)| RawPartition {
                key: key.clone(),
                entries: entries.clone(),
            })
            .collect())
    }

    async fn write_partition(&self, key: &str, records: &[VectorRecord]) -> Result<(), StoreError> {
        let entries = records
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        self.insert_raw(key, entries);
        Ok(())
    }

    async fn delete_partition(&self, key: &str) -> Result<(), StoreError> {
        self.state.lock().unwrap().partitions.remove(key);
        Ok(())
    }

    async fn read_legacy(&self) -> Result<Option<Vec<Value>>, StoreError> {
        Ok(self.state.lock().unwrap().legacy.clone())
    }

    async fn remove_legacy(&self) -> Result<(), StoreError> {
        self.state.lock().unwrap().legacy = None;
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryGraphStorage {
    graph: Arc<Mutex<GraphSnapshot>>,
    saves: Arc<Mutex<usize>>,
}

impl InMemoryGraphStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        self.graph.lock().unwrap().clone()
    }

    pub fn set_snapshot(&self, graph: GraphSnapshot) {
        *self.graph.lock().unwrap() = graph;
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

impl GraphStorage for InMemoryGraphStorage {
    async fn load_graph(&self) -> Result<GraphSnapshot, StoreError> {
        Ok(self.snapshot())
    }

    async fn save_graph(&self, graph: &GraphSnapshot) -> Result<(), StoreError> {
        self.set_snapshot(graph.clone());
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}
