//! Bounded, content-addressed LRU cache for projected slot vectors, keyed
//! by a hash of the anchor text that produced them. One instance per slot
//! so action/resource/data/risk entries never evict each other.

use std::collections::HashMap;
use std::collections::VecDeque;

use gateway_core::SlotVector;
use sha2::{Digest, Sha256};

pub fn content_key(slot_label: &str, text: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(slot_label.as_bytes());
    hasher.update([0u8]);
    hasher.update(text.as_bytes());
    hasher.finalize().into()
}

pub struct SlotCache {
    capacity: usize,
    entries: HashMap<[u8; 32], SlotVector>,
    recency: VecDeque<[u8; 32]>,
}

impl SlotCache {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, entries: HashMap::new(), recency: VecDeque::new() }
    }

    pub fn get(&mut self, key: &[u8; 32]) -> Option<SlotVector> {
        let value = self.entries.get(key).copied();
        if value.is_some() {
            self.touch(key);
        }
        value
    }

    pub fn insert(&mut self, key: [u8; 32], value: SlotVector) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            if let Some(oldest) = self.recency.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.entries.insert(key, value);
        self.touch(&key);
    }

    fn touch(&mut self, key: &[u8; 32]) {
        self.recency.retain(|k| k != key);
        self.recency.push_back(*key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_least_recently_used_on_overflow() {
        let mut cache = SlotCache::new(2);
        cache.insert([1u8; 32], SlotVector::ZERO);
        cache.insert([2u8; 32], SlotVector::ZERO);
        cache.get(&[1u8; 32]);
        cache.insert([3u8; 32], SlotVector::ZERO);
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&[2u8; 32]).is_none());
        assert!(cache.get(&[1u8; 32]).is_some());
        assert!(cache.get(&[3u8; 32]).is_some());
    }

    #[test]
    fn content_key_is_stable_and_slot_scoped() {
        let a = content_key("action", "foo");
        let b = content_key("resource", "foo");
        assert_ne!(a, b);
        assert_eq!(a, content_key("action", "foo"));
    }
}
