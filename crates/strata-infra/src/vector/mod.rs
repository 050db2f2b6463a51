//! Embedding providers.
//!
//! Provides fastembed-based local embedding generation behind the
//! `Embedder` port.

pub mod embedder;

pub use embedder::FastEmbedEmbedder;
