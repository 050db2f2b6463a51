//! Type-erased [`Embedder`] for picking a provider at runtime.
//!
//! `Embedder` returns `impl Future`, so it is not object safe. `ErasedEmbedder`
//! re-exposes it with boxed futures and is implemented for every `Embedder`;
//! `BoxEmbedder` holds one behind an `Arc` so the service and its callers can
//! share a single loaded model.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use strata_types::error::EmbeddingError;

use super::embedder::Embedder;

type EmbedFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<Vec<f32>>, EmbeddingError>> + Send + 'a>>;

trait ErasedEmbedder: Send + Sync {
    fn embed_erased<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a>;
    fn erased_model_name(&self) -> &str;
    fn erased_dimension(&self) -> usize;
}

impl<T: Embedder> ErasedEmbedder for T {
    fn embed_erased<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a> {
        Box::pin(self.embed(texts))
    }

    fn erased_model_name(&self) -> &str {
        self.model_name()
    }

    fn erased_dimension(&self) -> usize {
        self.dimension()
    }
}

#[derive(Clone)]
pub struct BoxEmbedder {
    inner: Arc<dyn ErasedEmbedder>,
}

impl BoxEmbedder {
    pub fn new<T: Embedder + 'static>(embedder: T) -> Self {
        Self {
            inner: Arc::new(embedder),
        }
    }

    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.inner.embed_erased(texts).await
    }

    pub fn model_name(&self) -> &str {
        self.inner.erased_model_name()
    }

    pub fn dimension(&self) -> usize {
        self.inner.erased_dimension()
    }
}

impl fmt::Debug for BoxEmbedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxEmbedder")
            .field("model", &self.model_name())
            .field("dimension", &self.dimension())
            .finish()
    }
}
