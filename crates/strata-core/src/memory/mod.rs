//! The temporal memory engine.
//!
//! `VectorStore` keeps records in time partitions with hot/cold tiering,
//! `MemoryGraph` links them by similarity and manual relationships, and
//! `MemoryOrchestrator` composes both behind one facade. Storage and
//! embedding are ports; adapters live in strata-infra.

pub mod box_embedder;
pub mod embedder;
pub mod embedding;
pub mod fallback;
pub mod graph;
pub mod orchestrator;
pub mod retention;
pub mod similarity;
pub mod storage;
pub mod timestamp;
pub mod vector_store;

#[cfg(test)]
pub(crate) mod testing;
