//! Content-addressed cache for provider-output embedding vectors, keyed by
//! the caller's hash of the source text. Saturating: once full, further
//! inserts are silently dropped rather than evicting (the bounded,
//! eviction-aware cache lives in `gateway-encoder`, which wraps this one).

use std::collections::HashMap;
use std::sync::RwLock;

use crate::vector::EmbeddingVector;

pub struct EmbeddingCache {
    cache: RwLock<HashMap<[u8; 32], EmbeddingVector>>,
    max_size: usize,
}

impl EmbeddingCache {
    pub fn new(max_size: usize) -> Self {
        Self { cache: RwLock::new(HashMap::new()), max_size }
    }

    pub fn get(&self, hash: &[u8; 32]) -> Option<EmbeddingVector> {
        self.cache.read().ok()?.get(hash).cloned()
    }

    pub fn insert(&self, hash: [u8; 32], embedding: EmbeddingVector) {
        if let Ok(mut cache) = self.cache.write() {
            if cache.len() < self.max_size {
                cache.insert(hash, embedding);
            }
        }
    }

    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for EmbeddingCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingCache").field("max_size", &self.max_size).field("current_size", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get_round_trips() {
        let cache = EmbeddingCache::new(100);
        let hash = [0u8; 32];
        let embedding = EmbeddingVector::new(vec![1.0, 2.0, 3.0], "test".to_string());
        cache.insert(hash, embedding.clone());
        assert_eq!(cache.get(&hash).unwrap().data, embedding.data);
    }

    #[test]
    fn insert_past_capacity_is_dropped() {
        let cache = EmbeddingCache::new(1);
        cache.insert([0u8; 32], EmbeddingVector::new(vec![1.0], "test".to_string()));
        cache.insert([1u8; 32], EmbeddingVector::new(vec![2.0], "test".to_string()));
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&[1u8; 32]).is_none());
    }
}
