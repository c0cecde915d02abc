//! Raw provider-output embedding vector (384-d for the reference
//! sentence-transformers model, but dimension is carried, not assumed).
//! Distinct from `gateway_core`'s fixed 32-d/128-d slot and intent
//! vectors, which are the *projected* output C2 builds from these.

use serde::{Deserialize, Serialize};

use crate::error::EmbedError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingVector {
    pub data: Vec<f32>,
    pub model_id: String,
    pub dimensions: i32,
}

impl EmbeddingVector {
    pub fn new(data: Vec<f32>, model_id: String) -> Self {
        let dimensions = data.len() as i32;
        Self { data, model_id, dimensions }
    }

    pub fn cosine_similarity(&self, other: &EmbeddingVector) -> Result<f32, EmbedError> {
        if self.dimensions != other.dimensions {
            return Err(EmbedError::DimensionMismatch { expected: self.dimensions, got: other.dimensions });
        }

        let mut dot_product = 0.0f32;
        let mut norm_a = 0.0f32;
        let mut norm_b = 0.0f32;

        for (a, b) in self.data.iter().zip(other.data.iter()) {
            dot_product += a * b;
            norm_a += a * a;
            norm_b += b * b;
        }

        let norm_a = norm_a.sqrt();
        let norm_b = norm_b.sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return Ok(0.0);
        }

        Ok(dot_product / (norm_a * norm_b))
    }

    pub fn is_valid(&self) -> bool {
        self.dimensions > 0 && self.data.len() == self.dimensions as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_have_similarity_one() {
        let v = EmbeddingVector::new(vec![1.0, 2.0, 3.0], "test".to_string());
        assert!((v.cosine_similarity(&v).unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn mismatched_dimensions_is_an_error() {
        let a = EmbeddingVector::new(vec![1.0, 2.0], "test".to_string());
        let b = EmbeddingVector::new(vec![1.0, 2.0, 3.0], "test".to_string());
        assert!(matches!(a.cosine_similarity(&b), Err(EmbedError::DimensionMismatch { .. })));
    }

    #[test]
    fn zero_vector_has_zero_similarity() {
        let a = EmbeddingVector::new(vec![0.0, 0.0], "test".to_string());
        let b = EmbeddingVector::new(vec![1.0, 1.0], "test".to_string());
        assert_eq!(a.cosine_similarity(&b).unwrap(), 0.0);
    }
}
