//! Port for the external embedding provider.
//!
//! The provider is optional: `EmbeddingService` wraps it with a timeout and
//! substitutes hash vectors for any text it fails on. The fastembed adapter
//! lives in strata-infra.

use std::future::Future;

use strata_types::error::EmbeddingError;

pub trait Embedder: Send + Sync {
    /// Embed a batch of texts.
    ///
    /// Must return exactly one vector per input, in input order, each of
    /// length [`dimension`](Self::dimension). A short or mis-sized batch is
    /// treated by the service as a provider failure.
    fn embed(
        &self,
        texts: &[String],
    ) -> impl Future<Output = Result<Vec<Vec<f32>>, EmbeddingError>> + Send;

    /// Identifier reported in stats, e.g. `"bge-small-en-v1.5"`.
    fn model_name(&self) -> &str;

    fn dimension(&self) -> usize;
}
