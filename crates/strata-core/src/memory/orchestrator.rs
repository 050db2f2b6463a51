//! Memory facade composing the vector store, the relationship graph, and
//! the embedding service.
//!
//! Writes go to the store first, then the graph is pruned against the
//! store's surviving ids, then the new record's similarity edges are
//! recomputed. Query results carry each hit's current neighbor list.

use strata_types::config::MemoryConfig;
use strata_types::error::MemoryError;
use strata_types::graph::{EdgeType, LineageTrace};
use strata_types::memory::{
    ListOptions, MemoryHit, MemoryStats, Metadata, QueryOptions, RetentionReport, ScoredRecord,
    VectorRecord,
};

use super::box_embedder::BoxEmbedder;
use super::embedding::EmbeddingService;
use super::graph::MemoryGraph;
use super::storage::{GraphStorage, PartitionStorage};
use super::vector_store::VectorStore;

/// Metadata field that `add_document` fills with the source text.
pub const METADATA_TEXT_KEY: &str = "text";

pub struct MemoryOrchestrator<S: PartitionStorage, G: GraphStorage> {
    store: VectorStore<S>,
    graph: MemoryGraph<G>,
    embeddings: EmbeddingService,
}

impl<S: PartitionStorage, G: GraphStorage> MemoryOrchestrator<S, G> {
    /// Open the store (migration and startup sweep included), load the
    /// graph, and prune edges to ids the store no longer holds.
    pub async fn open(
        config: &MemoryConfig,
        partitions: S,
        graph: G,
        embedder: Option<BoxEmbedder>,
    ) -> Result<Self, MemoryError> {
        config.validate()?;
        let policy = config.retention_policy()?;

        let store = VectorStore::open(partitions, policy).await?;
        let mut graph = MemoryGraph::open(graph, config.graph_degree, config.lineage_depth).await?;
        graph.prune(|id| store.contains(id)).await?;

        let embeddings = EmbeddingService::new(embedder, config);
        tracing::info!(
            records = store.len(),
            graph_nodes = graph.node_count(),
            model = embeddings.model_name(),
            "Memory opened"
        );

        Ok(Self {
            store,
            graph,
            embeddings,
        })
    }

    pub fn store(&self) -> &VectorStore<S> {
        &self.store
    }

    pub fn graph(&self) -> &MemoryGraph<G> {
        &self.graph
    }

    pub fn embeddings(&self) -> &EmbeddingService {
        &self.embeddings
    }

    /// Store a vector, then refresh the graph around it.
    pub async fn add_embedding(
        &mut self,
        id: impl Into<String>,
        vector: Vec<f32>,
        metadata: Metadata,
        timestamp: Option<i64>,
    ) -> Result<(), MemoryError> {
        let id = id.into();
        self.store
            .add_embedding(id.clone(), vector, metadata, timestamp)
            .await?;

        let store = &self.store;
        self.graph.prune(|existing| store.contains(existing)).await?;

        // A record stamped beyond the cold horizon is swept by the same write.
        let Some(record) = self.store.get_item(&id) else {
            tracing::debug!(id = %id, "Record expired on write; graph left untouched");
            return Ok(());
        };
        let vector = record.vector.clone();
        self.graph
            .update_similarity_edges(&self.store, &id, &vector)
            .await?;
        Ok(())
    }

    /// Embed `text` and store it. The text is kept in metadata under
    /// `"text"` unless the caller already set that field.
    pub async fn add_document(
        &mut self,
        id: impl Into<String>,
        text: &str,
        metadata: Option<Metadata>,
    ) -> Result<(), MemoryError> {
        let mut metadata = metadata.unwrap_or_default();
        metadata
            .entry(METADATA_TEXT_KEY)
            .or_insert_with(|| serde_json::Value::String(text.to_string()));

        let vector = self.embeddings.get_embedding(text).await;
        self.add_embedding(id, vector, metadata, None).await
    }

    pub async fn get_embedding(&self, text: &str) -> Vec<f32> {
        self.embeddings.get_embedding(text).await
    }

    pub async fn get_batch_embeddings(&self, texts: &[String]) -> Vec<Vec<f32>> {
        self.embeddings.get_batch_embeddings(texts).await
    }

    /// Rank stored records against `vector` and attach their neighbors.
    pub fn query_embedding(&self, vector: &[f32], options: &QueryOptions) -> Vec<MemoryHit> {
        self.store
            .query_embedding(vector, options)
            .into_iter()
            .map(|scored| self.attach_neighbors(scored))
            .collect()
    }

    /// Embed `text`, then behave like [`Self::query_embedding`].
    pub async fn query_by_text(&self, text: &str, options: &QueryOptions) -> Vec<MemoryHit> {
        let vector = self.embeddings.get_embedding(text).await;
        self.query_embedding(&vector, options)
    }

    fn attach_neighbors(&self, scored: ScoredRecord) -> MemoryHit {
        let neighbors = self.graph.neighbors(&scored.record.id).to_vec();
        MemoryHit { scored, neighbors }
    }

    pub fn list_items(&self, options: &ListOptions) -> Vec<VectorRecord> {
        self.store.list_items(options)
    }

    pub fn get_item(&self, id: &str) -> Option<&VectorRecord> {
        self.store.get_item(id)
    }

    pub fn get_all_ids(&self) -> Vec<String> {
        self.store.get_all_ids()
    }

    /// Records with `start <= timestamp <= end`, honoring the tier filter
    /// in `options`. The window in `options` is replaced.
    pub fn get_temporal_slice(
        &self,
        start: i64,
        end: i64,
        options: &ListOptions,
    ) -> Vec<VectorRecord> {
        let options = ListOptions {
            start_time: Some(start),
            end_time: Some(end),
            ..options.clone()
        };
        self.store.list_items(&options)
    }

    pub fn trace_lineage(&self, id: &str, depth: Option<usize>) -> LineageTrace {
        self.graph.trace_lineage(&self.store, id, depth)
    }

    /// Link two stored records in both directions.
    ///
    /// Returns `false` without writing when either id is unknown.
    pub async fn register_relationship(
        &mut self,
        a: &str,
        b: &str,
        weight: f32,
        edge_type: Option<EdgeType>,
    ) -> Result<bool, MemoryError> {
        for id in [a, b] {
            if !self.store.contains(id) {
                tracing::warn!(id = %id, "Relationship references an unknown record; skipped");
                return Ok(false);
            }
        }
        self.graph
            .register_relationship(a, b, weight, edge_type.unwrap_or(EdgeType::Manual))
            .await?;
        Ok(true)
    }

    /// Sweep retention now, pruning the graph if records were deleted.
    pub async fn apply_retention(&mut self) -> Result<RetentionReport, MemoryError> {
        let report = self.store.apply_retention().await?;
        if !report.removed_ids.is_empty() {
            let store = &self.store;
            self.graph.prune(|id| store.contains(id)).await?;
        }
        Ok(report)
    }

    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            store: self.store.stats(),
            graph_nodes: self.graph.node_count(),
            graph_edges: self.graph.edge_count(),
            embedding_model: self.embeddings.model_name().to_string(),
        }
    }

    /// Flush the graph and release both stores.
    pub async fn close(self) -> Result<(), MemoryError> {
        self.graph.flush().await?;
        tracing::debug!("Memory closed");
        Ok(())
    }
}
