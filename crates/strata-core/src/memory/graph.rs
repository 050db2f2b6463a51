//! Relationship graph over record ids.
//!
//! Similarity edges are derived from nearest-neighbor queries against the
//! vector store and written in both directions. Manual edges are upserted
//! by callers and survive similarity recomputation. Edges pointing at ids
//! the store no longer holds are pruned before every update.
//!
//! A neighbor's reciprocal list is overwritten whenever another node lists
//! it as a neighbor, so a node's similarity edges reflect whichever
//! recomputation touched it last. The graph is eventually consistent, not
//! transactional.

use std::collections::{HashSet, VecDeque};

use strata_types::error::StoreError;
use strata_types::graph::{EdgeType, GraphEdge, GraphSnapshot, LineageEdge, LineageTrace};
use strata_types::memory::QueryOptions;

use super::storage::{GraphStorage, PartitionStorage};
use super::timestamp::now_ms;
use super::vector_store::VectorStore;

pub struct MemoryGraph<G: GraphStorage> {
    storage: G,
    adjacency: GraphSnapshot,
    degree: usize,
    default_depth: usize,
}

/// Drop the similarity edges in `edges` and append `replacements`, keeping
/// manual edges in place.
fn replace_similarity_edges(edges: &mut Vec<GraphEdge>, replacements: Vec<GraphEdge>) {
    edges.retain(|edge| edge.edge_type != EdgeType::Similarity);
    edges.extend(replacements);
}

/// Insert or replace the edge keyed on `(target, type)`.
fn upsert_edge(edges: &mut Vec<GraphEdge>, edge: GraphEdge) {
    match edges
        .iter_mut()
        .find(|e| e.target == edge.target && e.edge_type == edge.edge_type)
    {
        Some(existing) => *existing = edge,
        None => edges.push(edge),
    }
}

impl<G: GraphStorage> MemoryGraph<G> {
    /// Load the graph from storage.
    pub async fn open(storage: G, degree: usize, default_depth: usize) -> Result<Self, StoreError> {
        let adjacency = storage.load_graph().await?;
        tracing::debug!(nodes = adjacency.len(), "Memory graph loaded");
        Ok(Self {
            storage,
            adjacency,
            degree,
            default_depth,
        })
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn default_depth(&self) -> usize {
        self.default_depth
    }

    /// Outgoing edges of `id` (empty for unknown ids).
    pub fn neighbors(&self, id: &str) -> &[GraphEdge] {
        self.adjacency.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    pub fn snapshot(&self) -> &GraphSnapshot {
        &self.adjacency
    }

    /// Write the graph to durable storage.
    pub async fn flush(&self) -> Result<(), StoreError> {
        self.storage.save_graph(&self.adjacency).await?;
        tracing::debug!(
            nodes = self.adjacency.len(),
            edges = self.edge_count(),
            "Graph saved"
        );
        Ok(())
    }

    /// Recompute `id`'s similarity edges from its nearest neighbors.
    ///
    /// Queries `degree + 1` neighbors (cold tier included), drops `id`
    /// itself, and keeps the best `degree`. Each neighbor's similarity edges
    /// are replaced by a single reciprocal edge back to `id`. Returns the
    /// number of similarity edges written for `id`.
    pub async fn update_similarity_edges<S: PartitionStorage>(
        &mut self,
        store: &VectorStore<S>,
        id: &str,
        vector: &[f32],
    ) -> Result<usize, StoreError> {
        let options = QueryOptions::top_k(self.degree + 1).with_cold();
        let now = now_ms();

        let outgoing: Vec<GraphEdge> = store
            .query_embedding(vector, &options)
            .into_iter()
            .filter(|hit| hit.record.id != id)
            .take(self.degree)
            .map(|hit| GraphEdge {
                target: hit.record.id,
                weight: hit.similarity,
                edge_type: EdgeType::Similarity,
                timestamp: now,
            })
            .collect();

        for edge in &outgoing {
            let reciprocal = GraphEdge {
                target: id.to_string(),
                weight: edge.weight,
                edge_type: EdgeType::Similarity,
                timestamp: now,
            };
            let edges = self.adjacency.entry(edge.target.clone()).or_default();
            replace_similarity_edges(edges, vec![reciprocal]);
        }

        let written = outgoing.len();
        let edges = self.adjacency.entry(id.to_string()).or_default();
        replace_similarity_edges(edges, outgoing);

        self.flush().await?;
        Ok(written)
    }

    /// Upsert a `(a -> b)` and `(b -> a)` edge of `edge_type` with one weight.
    pub async fn register_relationship(
        &mut self,
        a: &str,
        b: &str,
        weight: f32,
        edge_type: EdgeType,
    ) -> Result<(), StoreError> {
        let now = now_ms();
        for (source, target) in [(a, b), (b, a)] {
            let edges = self.adjacency.entry(source.to_string()).or_default();
            upsert_edge(
                edges,
                GraphEdge {
                    target: target.to_string(),
                    weight,
                    edge_type,
                    timestamp: now,
                },
            );
        }
        self.flush().await
    }

    /// Remove nodes and edges referring to ids for which `exists` is false.
    ///
    /// Persists only when something changed. Returns the number of nodes
    /// plus edges removed.
    pub async fn prune(&mut self, exists: impl Fn(&str) -> bool) -> Result<usize, StoreError> {
        let before_nodes = self.adjacency.len();
        self.adjacency.retain(|id, _| exists(id));
        let mut removed = before_nodes - self.adjacency.len();

        for edges in self.adjacency.values_mut() {
            let before = edges.len();
            edges.retain(|edge| exists(&edge.target));
            removed += before - edges.len();
        }

        if removed > 0 {
            tracing::debug!(removed, "Pruned stale graph entries");
            self.flush().await?;
        }
        Ok(removed)
    }

    /// Breadth-first traversal from `id`, at most `depth` hops.
    ///
    /// Visited nodes are never re-enqueued, so cycles terminate. Edges to
    /// already-visited nodes still appear in the edge list. An unknown root
    /// yields an empty trace.
    pub fn trace_lineage<S: PartitionStorage>(
        &self,
        store: &VectorStore<S>,
        id: &str,
        depth: Option<usize>,
    ) -> LineageTrace {
        let Some(root) = store.get_item(id) else {
            return LineageTrace::default();
        };
        let depth = depth.unwrap_or(self.default_depth);

        let mut trace = LineageTrace {
            root: Some(root.clone()),
            nodes: vec![root.clone()],
            edges: Vec::new(),
        };
        let mut visited: HashSet<&str> = HashSet::from([id]);
        let mut queue: VecDeque<(&str, usize)> = VecDeque::from([(id, 0)]);

        while let Some((node, hops)) = queue.pop_front() {
            if hops >= depth {
                continue;
            }
            for edge in self.neighbors(node) {
                let Some(target) = store.get_item(&edge.target) else {
                    continue;
                };
                trace.edges.push(LineageEdge {
                    source: node.to_string(),
                    edge: edge.clone(),
                });
                if visited.insert(edge.target.as_str()) {
                    trace.nodes.push(target.clone());
                    queue.push_back((edge.target.as_str(), hops + 1));
                }
            }
        }

        trace
    }
}
