//! Deterministic fallback embeddings.
//!
//! Used whenever the embedding provider is unavailable. The vector is a
//! SHA-256 counter-mode expansion of the text, so the same text always maps
//! to the same (bit-identical) unit vector.

use sha2::{Digest, Sha256};

/// Generate a fallback embedding of `dimension` components for `text`.
pub fn fallback_embedding(text: &str, dimension: usize) -> Vec<f32> {
    let seed = Sha256::digest(text.as_bytes());

    let mut values = Vec::with_capacity(dimension);
    let mut counter: u64 = 0;
    while values.len() < dimension {
        let mut hasher = Sha256::new();
        hasher.update(seed);
        hasher.update(counter.to_le_bytes());
        let block = hasher.finalize();

        for chunk in block.chunks_exact(4) {
            if values.len() == dimension {
                break;
            }
            let raw = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            // Map to [-1, 1].
            values.push((f64::from(raw) / f64::from(u32::MAX) * 2.0 - 1.0) as f32);
        }
        counter += 1;
    }

    let norm = values
        .iter()
        .map(|v| f64::from(*v) * f64::from(*v))
        .sum::<f64>()
        .sqrt();
    if norm > 0.0 {
        for v in &mut values {
            *v = (f64::from(*v) / norm) as f32;
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::similarity::cosine_similarity;

    #[test]
    fn test_fallback_is_bit_identical() {
        let a = fallback_embedding("the quick brown fox", 384);
        let b = fallback_embedding("the quick brown fox", 384);
        let a_bits: Vec<u32> = a.iter().map(|v| v.to_bits()).collect();
        let b_bits: Vec<u32> = b.iter().map(|v| v.to_bits()).collect();
        assert_eq!(a_bits, b_bits);
    }

    #[test]
    fn test_fallback_dimension_and_norm() {
        let v = fallback_embedding("hello", 37);
        assert_eq!(v.len(), 37);
        let norm: f64 = v.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
        assert!(v.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_fallback_differs_by_text() {
        let a = fallback_embedding("alpha", 64);
        let b = fallback_embedding("beta", 64);
        assert_ne!(a, b);
        assert!(cosine_similarity(&a, &b) < 0.99);
    }

    #[test]
    fn test_fallback_zero_dimension() {
        assert!(fallback_embedding("anything", 0).is_empty());
    }
}
