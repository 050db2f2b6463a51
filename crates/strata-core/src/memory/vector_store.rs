//! Partitioned vector store with hot/cold retention.
//!
//! Records live in time partitions (one durable unit per partition key) and
//! in an in-memory index for O(1) point lookup. Every write rewrites the
//! owning partition and then sweeps retention store-wide:
//!
//! - a partition whose *start* is older than `now - cold_retention` is
//!   deleted whole, regardless of the ages of the records inside it;
//! - otherwise each record's tier is recomputed against
//!   `now - hot_retention` and the partition is rewritten if any flipped.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use strata_types::config::RetentionPolicy;
use strata_types::error::StoreError;
use strata_types::memory::{
    ListOptions, METADATA_TIMESTAMP_KEY, Metadata, QueryOptions, RawPartition, RetentionReport,
    ScoredRecord, StoreStats, Tier, VectorRecord,
};

use super::retention::{partition_expired, partition_key, partition_start, tier_for};
use super::similarity::cosine_similarity;
use super::storage::PartitionStorage;
use super::timestamp::{
    normalize_metadata_timestamp, now_ms, parse_timestamp_value, resolve_timestamp,
};

/// The fields every stored entry must carry to be usable.
struct EntryParts {
    id: String,
    vector: Vec<f32>,
    metadata: Metadata,
    timestamp: Option<i64>,
    tier: Option<Tier>,
}

/// Pull id, vector, metadata, and timestamp out of a raw JSON entry.
///
/// Returns `None` when the id is missing/empty or the vector is not a
/// non-empty array of finite numbers.
fn entry_parts(value: &Value) -> Option<EntryParts> {
    let obj = value.as_object()?;
    let id = obj.get("id")?.as_str().filter(|id| !id.is_empty())?;
    let vector = obj
        .get("vector")?
        .as_array()?
        .iter()
        .map(|v| v.as_f64().map(|f| f as f32).filter(|f| f.is_finite()))
        .collect::<Option<Vec<f32>>>()
        .filter(|v| !v.is_empty())?;
    let metadata = obj
        .get("metadata")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    let timestamp = obj
        .get("timestamp")
        .and_then(parse_timestamp_value)
        .or_else(|| {
            metadata
                .get(METADATA_TIMESTAMP_KEY)
                .and_then(parse_timestamp_value)
        });
    let tier = obj
        .get("tier")
        .and_then(Value::as_str)
        .and_then(|t| t.parse().ok());

    Some(EntryParts {
        id: id.to_string(),
        vector,
        metadata,
        timestamp,
        tier,
    })
}

pub struct VectorStore<S: PartitionStorage> {
    storage: S,
    policy: RetentionPolicy,
    records: HashMap<String, VectorRecord>,
    /// Partition key to ids in insertion order.
    partitions: BTreeMap<String, Vec<String>>,
}

impl<S: PartitionStorage> VectorStore<S> {
    /// Open a store: load partitions, migrate any legacy file, sweep retention.
    pub async fn open(storage: S, policy: RetentionPolicy) -> Result<Self, StoreError> {
        let mut store = Self {
            storage,
            policy,
            records: HashMap::new(),
            partitions: BTreeMap::new(),
        };

        store.load_partitions().await?;
        store.migrate_legacy().await?;
        store.apply_retention().await?;

        tracing::debug!(
            records = store.records.len(),
            partitions = store.partitions.len(),
            "Vector store opened"
        );
        Ok(store)
    }

    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Load partitions from storage and normalize their entries.
    ///
    /// The file's key is trusted as the partition; malformed entries are
    /// dropped individually. When an id appears in more than one partition,
    /// the later key wins and the earlier partition is rewritten without it.
    async fn load_partitions(&mut self) -> Result<(), StoreError> {
        let mut raw = self.storage.load_partitions().await?;
        raw.sort_by(|a, b| a.key.cmp(&b.key));

        let mut dirty: Vec<String> = Vec::new();
        for RawPartition { key, entries } in raw {
            let fallback_ts = partition_start(&key).unwrap_or_else(now_ms);
            let mut ids = Vec::with_capacity(entries.len());

            for entry in &entries {
                let Some(parts) = entry_parts(entry) else {
                    tracing::warn!(partition = %key, "Dropping malformed record");
                    continue;
                };

                let timestamp = parts.timestamp.unwrap_or(fallback_ts);
                let record = VectorRecord {
                    tier: parts
                        .tier
                        .unwrap_or_else(|| tier_for(timestamp, now_ms(), &self.policy)),
                    id: parts.id,
                    vector: parts.vector,
                    metadata: parts.metadata,
                    timestamp,
                    partition: key.clone(),
                };

                if let Some(previous) = self.records.get(&record.id) {
                    let previous_key = previous.partition.clone();
                    if let Some(prev_ids) = self.partitions.get_mut(&previous_key) {
                        prev_ids.retain(|id| id != &record.id);
                    }
                    ids.retain(|id| id != &record.id);
                    tracing::warn!(
                        id = %record.id,
                        kept = %key,
                        dropped = %previous_key,
                        "Duplicate record id across partitions"
                    );
                    if previous_key != key && !dirty.contains(&previous_key) {
                        dirty.push(previous_key);
                    }
                }

                ids.push(record.id.clone());
                self.records.insert(record.id.clone(), record);
            }

            if ids.len() != entries.len() && !dirty.contains(&key) {
                dirty.push(key.clone());
            }
            self.partitions.insert(key, ids);
        }

        for key in dirty {
            self.persist_partition(&key).await?;
        }
        Ok(())
    }

    /// Re-insert every record of a legacy single-file store, then remove it.
    async fn migrate_legacy(&mut self) -> Result<(), StoreError> {
        let Some(entries) = self.storage.read_legacy().await? else {
            return Ok(());
        };

        let mut migrated = 0usize;
        for entry in &entries {
            let Some(parts) = entry_parts(entry) else {
                tracing::warn!("Dropping malformed legacy record");
                continue;
            };
            match self
                .add_embedding(parts.id, parts.vector, parts.metadata, parts.timestamp)
                .await
            {
                Ok(()) => migrated += 1,
                Err(StoreError::InvalidInput(reason)) => {
                    tracing::warn!(%reason, "Dropping invalid legacy record");
                }
                Err(e) => return Err(e),
            }
        }

        self.storage.remove_legacy().await?;
        tracing::info!(
            migrated,
            dropped = entries.len() - migrated,
            "Migrated legacy store into partitions"
        );
        Ok(())
    }

    /// Persist or overwrite the record `id`. Last write wins.
    pub async fn add_embedding(
        &mut self,
        id: impl Into<String>,
        vector: Vec<f32>,
        mut metadata: Metadata,
        timestamp: Option<i64>,
    ) -> Result<(), StoreError> {
        let id = id.into();
        if id.is_empty() {
            return Err(StoreError::InvalidInput("record id must not be empty".to_string()));
        }
        if vector.is_empty() {
            return Err(StoreError::InvalidInput(format!(
                "record '{id}' has an empty vector"
            )));
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(StoreError::InvalidInput(format!(
                "record '{id}' has non-finite vector components"
            )));
        }

        let now = now_ms();
        let timestamp = resolve_timestamp(timestamp, &metadata, now);
        normalize_metadata_timestamp(&mut metadata, timestamp);
        let key = partition_key(timestamp, self.policy.granularity());

        let record = VectorRecord {
            id: id.clone(),
            vector,
            metadata,
            timestamp,
            tier: tier_for(timestamp, now, &self.policy),
            partition: key.clone(),
        };

        let moved_from = match self.records.insert(id.clone(), record) {
            Some(previous) if previous.partition != key => Some(previous.partition),
            Some(_) => None,
            None => {
                self.partitions.entry(key.clone()).or_default().push(id.clone());
                None
            }
        };

        if let Some(old_key) = moved_from {
            if let Some(ids) = self.partitions.get_mut(&old_key) {
                ids.retain(|existing| existing != &id);
            }
            self.partitions.entry(key.clone()).or_default().push(id.clone());
            self.persist_partition(&old_key).await?;
        }

        self.persist_partition(&key).await?;
        self.apply_retention().await?;
        Ok(())
    }

    /// Write a partition's current contents, or delete it once empty.
    async fn persist_partition(&mut self, key: &str) -> Result<(), StoreError> {
        let records: Vec<VectorRecord> = match self.partitions.get(key) {
            Some(ids) if !ids.is_empty() => ids
                .iter()
                .filter_map(|id| self.records.get(id).cloned())
                .collect(),
            _ => {
                self.partitions.remove(key);
                self.storage.delete_partition(key).await?;
                tracing::debug!(partition = %key, "Removed empty partition");
                return Ok(());
            }
        };

        self.storage.write_partition(key, &records).await?;
        tracing::debug!(partition = %key, records = records.len(), "Partition written");
        Ok(())
    }

    /// Sweep retention against the current time.
    pub async fn apply_retention(&mut self) -> Result<RetentionReport, StoreError> {
        self.apply_retention_at(now_ms()).await
    }

    /// Sweep retention as of `now_ms`.
    pub async fn apply_retention_at(&mut self, now_ms: i64) -> Result<RetentionReport, StoreError> {
        let mut report = RetentionReport::default();
        let keys: Vec<String> = self.partitions.keys().cloned().collect();

        for key in keys {
            if partition_expired(&key, now_ms, &self.policy) {
                let ids = self.partitions.remove(&key).unwrap_or_default();
                for id in &ids {
                    self.records.remove(id);
                }
                self.storage.delete_partition(&key).await?;
                tracing::info!(
                    partition = %key,
                    records = ids.len(),
                    "Deleted partition past cold retention"
                );
                report.removed_ids.extend(ids);
                report.deleted_partitions.push(key);
                continue;
            }

            let mut changed = 0usize;
            if let Some(ids) = self.partitions.get(&key) {
                for id in ids {
                    if let Some(record) = self.records.get_mut(id) {
                        let tier = tier_for(record.timestamp, now_ms, &self.policy);
                        if record.tier != tier {
                            record.tier = tier;
                            changed += 1;
                        }
                    }
                }
            }
            if changed > 0 {
                report.tier_changes += changed;
                self.persist_partition(&key).await?;
            }
        }

        Ok(report)
    }

    fn iter_records(&self) -> impl Iterator<Item = &VectorRecord> {
        self.partitions
            .values()
            .flat_map(|ids| ids.iter().filter_map(|id| self.records.get(id)))
    }

    /// Rank candidates by cosine similarity to `vector`, best first.
    ///
    /// Equal scores keep their store order. Non-finite scores are excluded.
    pub fn query_embedding(&self, vector: &[f32], options: &QueryOptions) -> Vec<ScoredRecord> {
        if options.top_k == 0 {
            return Vec::new();
        }

        let mut scored: Vec<ScoredRecord> = self
            .iter_records()
            .filter(|record| options.filter.matches(record))
            .filter_map(|record| {
                let similarity = cosine_similarity(vector, &record.vector);
                similarity.is_finite().then(|| ScoredRecord {
                    record: record.clone(),
                    similarity,
                })
            })
            .collect();

        scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        scored.truncate(options.top_k);
        scored
    }

    /// All records passing the filters, unranked, in store order.
    pub fn list_items(&self, options: &ListOptions) -> Vec<VectorRecord> {
        self.iter_records()
            .filter(|record| options.matches(record))
            .cloned()
            .collect()
    }

    pub fn get_item(&self, id: &str) -> Option<&VectorRecord> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn get_all_ids(&self) -> Vec<String> {
        self.iter_records().map(|record| record.id.clone()).collect()
    }

    pub fn partition_keys(&self) -> Vec<String> {
        self.partitions.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn stats(&self) -> StoreStats {
        let hot = self
            .records
            .values()
            .filter(|record| record.tier == Tier::Hot)
            .count();
        StoreStats {
            total: self.records.len(),
            hot,
            cold: self.records.len() - hot,
            partitions: self.partitions.len(),
        }
    }
}
