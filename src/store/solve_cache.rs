use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::CacheConfig;

/// Cache key: a definition's identity and content plus the canonical inputs
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SolveCacheKey {
    pub definition_id: String,
    pub content_hash: String,
    pub inputs: String,
}

/// Cache entry for a solve result
#[derive(Debug)]
struct CacheEntry {
    result: Arc<Value>,
    inserted: Instant,
    last_used: u64,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<SolveCacheKey, CacheEntry>,
    clock: u64,
}

/// In-memory solve result cache bounded by entry count (LRU) and age (TTL)
#[derive(Debug)]
pub struct SolveCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
    ttl: Duration,
}

impl SolveCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            capacity,
            ttl,
        }
    }

    /// Build from configuration; `None` when caching is disabled
    pub fn from_config(config: &CacheConfig) -> Option<Self> {
        if !config.enabled || config.capacity == 0 {
            return None;
        }
        Some(Self::new(config.capacity, config.ttl()))
    }

    /// Get a result if present and not expired
    pub fn get(&self, key: &SolveCacheKey) -> Option<Arc<Value>> {
        let mut inner = self.inner.lock();
        inner.clock += 1;
        let now = inner.clock;

        let expired = match inner.entries.get_mut(key) {
            Some(entry) if entry.inserted.elapsed() <= self.ttl => {
                entry.last_used = now;
                return Some(Arc::clone(&entry.result));
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            inner.entries.remove(key);
        }
        None
    }

    /// Insert or replace a result (last write wins), evicting the least
    /// recently used entry when full
    pub fn put(&self, key: SolveCacheKey, result: Arc<Value>) {
        let mut inner = self.inner.lock();
        inner.clock += 1;
        let now = inner.clock;

        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.capacity {
            self.evict(&mut inner);
        }
        inner.entries.insert(
            key,
            CacheEntry {
                result,
                inserted: Instant::now(),
                last_used: now,
            },
        );
    }

    fn evict(&self, inner: &mut CacheInner) {
        let ttl = self.ttl;
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| entry.inserted.elapsed() <= ttl);
        if inner.entries.len() < before {
            return;
        }

        let oldest = inner
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            log::debug!("Evicting cached solve for {}", key.definition_id);
            inner.entries.remove(&key);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(definition_id: &str, inputs: &str) -> SolveCacheKey {
        SolveCacheKey {
            definition_id: definition_id.to_string(),
            content_hash: "abc123".to_string(),
            inputs: inputs.to_string(),
        }
    }

    #[test]
    fn test_cache_basic_operations() {
        let cache = SolveCache::new(4, Duration::from_secs(60));
        cache.put(key("truss.gh", "{}"), Arc::new(json!({"values": []})));

        let cached = cache.get(&key("truss.gh", "{}"));
        assert_eq!(cached.unwrap().as_ref(), &json!({"values": []}));
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&key("truss.gh", r#"{"a":1}"#)).is_none());
    }

    #[test]
    fn test_entries_do_not_leak_across_definitions() {
        let cache = SolveCache::new(4, Duration::from_secs(60));
        cache.put(key("truss.gh", r#"{"Count":3}"#), Arc::new(json!(1)));
        assert!(cache.get(&key("panel.gh", r#"{"Count":3}"#)).is_none());

        let mut changed = key("truss.gh", r#"{"Count":3}"#);
        changed.content_hash = "def456".to_string();
        assert!(cache.get(&changed).is_none());
    }

    #[test]
    fn test_last_write_wins() {
        let cache = SolveCache::new(4, Duration::from_secs(60));
        cache.put(key("truss.gh", "{}"), Arc::new(json!(1)));
        cache.put(key("truss.gh", "{}"), Arc::new(json!(2)));
        assert_eq!(cache.get(&key("truss.gh", "{}")).unwrap().as_ref(), &json!(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_lru_eviction() {
        let cache = SolveCache::new(2, Duration::from_secs(60));
        cache.put(key("a.gh", "{}"), Arc::new(json!("a")));
        cache.put(key("b.gh", "{}"), Arc::new(json!("b")));

        // Touch a so b becomes least recently used
        assert!(cache.get(&key("a.gh", "{}")).is_some());
        cache.put(key("c.gh", "{}"), Arc::new(json!("c")));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key("a.gh", "{}")).is_some());
        assert!(cache.get(&key("b.gh", "{}")).is_none());
        assert!(cache.get(&key("c.gh", "{}")).is_some());
    }

    #[test]
    fn test_expired_entries_are_dropped() {
        let cache = SolveCache::new(2, Duration::from_millis(0));
        cache.put(key("a.gh", "{}"), Arc::new(json!("a")));
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get(&key("a.gh", "{}")).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_disabled_config_builds_no_cache() {
        let config = CacheConfig {
            enabled: false,
            ..CacheConfig::default()
        };
        assert!(SolveCache::from_config(&config).is_none());
        assert!(SolveCache::from_config(&CacheConfig::default()).is_some());
    }

    #[test]
    fn test_concurrent_writers() {
        let cache = Arc::new(SolveCache::new(64, Duration::from_secs(60)));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for j in 0..16 {
                        cache.put(key("shared.gh", &j.to_string()), Arc::new(json!(i)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 16);
    }
}
