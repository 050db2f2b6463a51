//! FastEmbed-based local embedding generator.
//!
//! Implements the `Embedder` trait from `strata-core` using a fastembed
//! ONNX model. The model is downloaded and loaded on first use, and
//! inference runs on the blocking thread pool.

use std::sync::{Arc, Mutex};

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tokio::sync::OnceCell;

use strata_core::memory::embedder::Embedder;
use strata_types::error::EmbeddingError;

/// Resolve a model name to a fastembed model and its output dimension.
///
/// Accepts the hub-style names used in `config.toml`.
pub fn resolve_model(name: &str) -> Option<(EmbeddingModel, usize)> {
    let resolved = match name {
        "bge-small-en-v1.5" => (EmbeddingModel::BGESmallENV15, 384),
        "bge-base-en-v1.5" => (EmbeddingModel::BGEBaseENV15, 768),
        "bge-large-en-v1.5" => (EmbeddingModel::BGELargeENV15, 1024),
        "all-MiniLM-L6-v2" => (EmbeddingModel::AllMiniLML6V2, 384),
        "all-MiniLM-L12-v2" => (EmbeddingModel::AllMiniLML12V2, 384),
        "nomic-embed-text-v1.5" => (EmbeddingModel::NomicEmbedTextV15, 768),
        "multilingual-e5-small" => (EmbeddingModel::MultilingualE5Small, 384),
        "multilingual-e5-base" => (EmbeddingModel::MultilingualE5Base, 768),
        _ => return None,
    };
    Some(resolved)
}

/// Local embedder backed by fastembed.
pub struct FastEmbedEmbedder {
    model: EmbeddingModel,
    model_name: String,
    dimension: usize,
    engine: OnceCell<Arc<Mutex<TextEmbedding>>>,
}

impl FastEmbedEmbedder {
    /// Create an embedder for `model_name`. Nothing is downloaded until the
    /// first `embed` call.
    pub fn new(model_name: &str) -> Result<Self, EmbeddingError> {
        let (model, dimension) = resolve_model(model_name).ok_or_else(|| {
            EmbeddingError::Provider(format!("unknown embedding model: '{model_name}'"))
        })?;
        Ok(Self {
            model,
            model_name: model_name.to_string(),
            dimension,
            engine: OnceCell::new(),
        })
    }

    async fn engine(&self) -> Result<Arc<Mutex<TextEmbedding>>, EmbeddingError> {
        self.engine
            .get_or_try_init(|| async {
                tracing::info!(model = %self.model_name, "Initializing embedding model");
                let options = InitOptions::new(self.model.clone());
                let engine = tokio::task::spawn_blocking(move || TextEmbedding::try_new(options))
                    .await
                    .map_err(|e| EmbeddingError::Provider(e.to_string()))?
                    .map_err(|e| EmbeddingError::Provider(e.to_string()))?;
                tracing::info!(
                    model = %self.model_name,
                    dimension = self.dimension,
                    "Embedding model initialized"
                );
                Ok(Arc::new(Mutex::new(engine)))
            })
            .await
            .cloned()
    }
}

impl Embedder for FastEmbedEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let engine = self.engine().await?;
        let texts = texts.to_vec();
        let embeddings = tokio::task::spawn_blocking(move || {
            let mut engine = engine
                .lock()
                .map_err(|_| EmbeddingError::Provider("embedding model lock poisoned".to_string()))?;
            engine
                .embed(texts, None)
                .map_err(|e| EmbeddingError::Provider(e.to_string()))
        })
        .await
        .map_err(|e| EmbeddingError::Provider(e.to_string()))??;

        tracing::debug!(
            batch_size = embeddings.len(),
            dimension = embeddings.first().map(Vec::len).unwrap_or(0),
            "Generated embeddings"
        );
        Ok(embeddings)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
