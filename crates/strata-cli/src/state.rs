//! Application state wiring the memory engine to its adapters.
//!
//! The orchestrator is generic over its storage ports; AppState pins it to
//! the JSON-file storage in the data directory and, unless disabled, the
//! local fastembed model.

use std::path::PathBuf;

use anyhow::Context;

use strata_core::memory::box_embedder::BoxEmbedder;
use strata_core::memory::orchestrator::MemoryOrchestrator;
use strata_infra::config::load_memory_config;
use strata_infra::storage::{JsonFileStorage, resolve_data_dir};
use strata_infra::vector::FastEmbedEmbedder;
use strata_types::config::MemoryConfig;

/// The orchestrator pinned to file-backed partitions and graph.
pub type ConcreteMemory = MemoryOrchestrator<JsonFileStorage, JsonFileStorage>;

pub struct AppState {
    pub memory: ConcreteMemory,
    pub config: MemoryConfig,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Resolve the data directory, load config, and open the memory.
    pub async fn init(data_dir: Option<PathBuf>, use_model: bool) -> anyhow::Result<Self> {
        let data_dir = data_dir.unwrap_or_else(resolve_data_dir);
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        let config = load_memory_config(&data_dir).await;

        let embedder = if use_model {
            match FastEmbedEmbedder::new(&config.embedding_model) {
                Ok(embedder) => Some(BoxEmbedder::new(embedder)),
                Err(e) => {
                    tracing::warn!(
                        model = %config.embedding_model,
                        error = %e,
                        "Embedding model unavailable; using hash vectors"
                    );
                    None
                }
            }
        } else {
            None
        };

        let storage = JsonFileStorage::new(&data_dir);
        let memory = MemoryOrchestrator::open(&config, storage.clone(), storage, embedder)
            .await
            .with_context(|| format!("Failed to open memory at {}", data_dir.display()))?;

        Ok(Self {
            memory,
            config,
            data_dir,
        })
    }

    /// Flush the graph and release the memory.
    pub async fn close(self) -> anyhow::Result<()> {
        self.memory
            .close()
            .await
            .context("Failed to flush memory graph")
    }
}
