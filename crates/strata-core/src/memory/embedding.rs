//! Embedding service with deterministic fallback.
//!
//! Wraps an optional provider behind a timeout. Any provider failure
//! (error, timeout, empty or malformed output) is logged and replaced with
//! the fallback vector for that text; nothing propagates to the caller.

use std::time::Duration;

use futures_util::future::join_all;

use strata_types::config::MemoryConfig;
use strata_types::error::EmbeddingError;

use super::box_embedder::BoxEmbedder;
use super::fallback::fallback_embedding;

/// Model name reported when no provider is configured.
pub const FALLBACK_MODEL_NAME: &str = "sha256-fallback";

pub struct EmbeddingService {
    provider: Option<BoxEmbedder>,
    dimension: usize,
    timeout: Duration,
    batch_concurrency: usize,
    batch_pause: Duration,
}

impl EmbeddingService {
    /// Create a service around `provider`.
    ///
    /// When a provider is present its dimension wins over the configured
    /// fallback dimension, so fallback vectors stay comparable with real ones.
    pub fn new(provider: Option<BoxEmbedder>, config: &MemoryConfig) -> Self {
        let dimension = provider
            .as_ref()
            .map(BoxEmbedder::dimension)
            .unwrap_or(config.embedding_dimension);
        Self {
            provider,
            dimension,
            timeout: Duration::from_millis(config.embedding_timeout_ms),
            batch_concurrency: config.batch_concurrency.max(1),
            batch_pause: Duration::from_millis(config.batch_pause_ms),
        }
    }

    /// A service that only ever produces fallback vectors.
    pub fn fallback_only(config: &MemoryConfig) -> Self {
        Self::new(None, config)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn model_name(&self) -> &str {
        self.provider
            .as_ref()
            .map(BoxEmbedder::model_name)
            .unwrap_or(FALLBACK_MODEL_NAME)
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    async fn try_provider(
        &self,
        provider: &BoxEmbedder,
        text: &str,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let input = [text.to_string()];
        let result = tokio::time::timeout(self.timeout, provider.embed(&input))
            .await
            .map_err(|_| EmbeddingError::Timeout(self.timeout.as_millis() as u64))??;

        let vector = result.into_iter().next().ok_or(EmbeddingError::EmptyResult)?;
        if vector.is_empty() {
            return Err(EmbeddingError::EmptyResult);
        }
        if vector.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(EmbeddingError::Provider(
                "embedding contains non-finite values".to_string(),
            ));
        }
        Ok(vector)
    }

    /// Embed one text, falling back to the deterministic vector on failure.
    pub async fn get_embedding(&self, text: &str) -> Vec<f32> {
        let Some(provider) = &self.provider else {
            return fallback_embedding(text, self.dimension);
        };

        match self.try_provider(provider, text).await {
            Ok(vector) => vector,
            Err(e) => {
                tracing::warn!(
                    model = provider.model_name(),
                    error = %e,
                    "Embedding provider failed, using fallback vector"
                );
                fallback_embedding(text, self.dimension)
            }
        }
    }

    /// Embed many texts with bounded concurrency and a pause between batches.
    ///
    /// Output order matches input order; each item falls back independently.
    pub async fn get_batch_embeddings(&self, texts: &[String]) -> Vec<Vec<f32>> {
        let mut vectors = Vec::with_capacity(texts.len());
        let batches: Vec<&[String]> = texts.chunks(self.batch_concurrency).collect();
        let batch_count = batches.len();

        for (i, batch) in batches.into_iter().enumerate() {
            let results = join_all(batch.iter().map(|text| self.get_embedding(text))).await;
            vectors.extend(results);

            if i + 1 < batch_count && self.provider.is_some() && !self.batch_pause.is_zero() {
                tokio::time::sleep(self.batch_pause).await;
            }
        }

        vectors
    }
}
