use thiserror::Error;

/// Errors from the storage ports (partition and graph persistence).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Errors from an embedding provider.
///
/// These never escape the embedding service; they trigger the fallback.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding provider error: {0}")]
    Provider(String),

    #[error("embedding provider timed out after {0} ms")]
    Timeout(u64),

    #[error("embedding provider returned no vectors")]
    EmptyResult,

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Errors from configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("hot retention ({hot_ms} ms) must not exceed cold retention ({cold_ms} ms)")]
    InvalidRetention { hot_ms: i64, cold_ms: i64 },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Errors surfaced by the memory facade.
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Io("disk full".to_string());
        assert_eq!(err.to_string(), "io error: disk full");
    }

    #[test]
    fn test_embedding_error_display() {
        let err = EmbeddingError::DimensionMismatch {
            expected: 384,
            actual: 3,
        };
        assert!(err.to_string().contains("384"));
        assert!(err.to_string().contains('3'));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidRetention {
            hot_ms: 10,
            cold_ms: 5,
        };
        assert!(err.to_string().contains("must not exceed"));
    }

    #[test]
    fn test_memory_error_is_transparent() {
        let err: MemoryError = StoreError::InvalidInput("empty id".to_string()).into();
        assert_eq!(err.to_string(), "invalid input: empty id");
    }

    #[test]
    fn test_store_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: StoreError = io.into();
        assert!(matches!(err, StoreError::Io(_)));
    }
}
