//! Derivation result memoization
//!
//! Provides:
//! - Content-addressed cache keys (dataset fingerprint + operation + params)
//! - Bounded in-process storage of derived frames
//! - Hit/miss metrics
//!
//! Every derivation is a pure function of its input frame and parameters, so
//! the cache key is a hash of exactly those. The cache is owned by the caller
//! (one per dataset session), never process-wide.

use crate::frame::Frame;
use crate::metrics::record_cache;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Bounded memoization cache for derived frames
pub struct MemoCache {
    entries: RwLock<Inner>,
    capacity: usize,
}

struct Inner {
    map: HashMap<String, Arc<Frame>>,
    order: VecDeque<String>,
}

impl MemoCache {
    /// Create a cache holding at most `capacity` derived frames
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(Inner {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity: capacity.max(1),
        }
    }

    /// Build a cache key from the input frame and derivation parameters
    pub fn key<P: Serialize>(frame: &Frame, operation: &str, params: &P) -> String {
        let mut hasher = Sha256::new();
        hasher.update(frame.fingerprint().as_bytes());
        hasher.update(operation.as_bytes());
        hasher.update([0xff]);
        // Serialization of the params struct is deterministic for the plain
        // field types used by derivation requests
        if let Ok(json) = serde_json::to_vec(params) {
            hasher.update(&json);
        }
        hex::encode(hasher.finalize())
    }

    /// Get a memoized frame
    pub async fn get(&self, key: &str) -> Option<Arc<Frame>> {
        let inner = self.entries.read().await;
        let hit = inner.map.get(key).cloned();
        record_cache(hit.is_some(), "derivation");
        if hit.is_some() {
            debug!(key = %key, "Derivation cache hit");
        }
        hit
    }

    /// Store a derived frame, evicting the oldest entry when full
    pub async fn insert(&self, key: String, frame: Arc<Frame>) {
        let mut inner = self.entries.write().await;
        if inner.map.len() >= self.capacity && !inner.map.contains_key(&key) {
            if let Some(oldest) = inner.order.pop_front() {
                inner.map.remove(&oldest);
            }
        }
        if inner.map.insert(key.clone(), frame).is_none() {
            inner.order.push_back(key);
        }
    }

    /// Number of cached frames
    pub async fn len(&self) -> usize {
        self.entries.read().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Value;

    fn frame(v: i64) -> Frame {
        Frame::from_columns(vec![("PaperId".into(), vec![Value::Int(v)])]).unwrap()
    }

    #[derive(Serialize)]
    struct Params {
        threshold: i64,
    }

    #[test]
    fn test_key_depends_on_params() {
        let f = frame(1);
        let a = MemoCache::key(&f, "author_prominence", &Params { threshold: 50 });
        let b = MemoCache::key(&f, "author_prominence", &Params { threshold: 0 });
        assert_ne!(a, b);

        let same = MemoCache::key(&f, "author_prominence", &Params { threshold: 50 });
        assert_eq!(a, same);
    }

    #[test]
    fn test_key_depends_on_frame_content() {
        let params = Params { threshold: 50 };
        let a = MemoCache::key(&frame(1), "author_prominence", &params);
        let b = MemoCache::key(&frame(2), "author_prominence", &params);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_get_and_insert() {
        let cache = MemoCache::new(4);
        let key = "abc".to_string();
        assert!(cache.get(&key).await.is_none());

        cache.insert(key.clone(), Arc::new(frame(1))).await;
        let hit = cache.get(&key).await.unwrap();
        assert_eq!(hit.len(), 1);
    }

    #[tokio::test]
    async fn test_eviction_at_capacity() {
        let cache = MemoCache::new(2);
        cache.insert("a".into(), Arc::new(frame(1))).await;
        cache.insert("b".into(), Arc::new(frame(2))).await;
        cache.insert("c".into(), Arc::new(frame(3))).await;

        assert_eq!(cache.len().await, 2);
        assert!(cache.get("a").await.is_none());
        assert!(cache.get("c").await.is_some());
    }
}
