//! Time-bounded cache
//!
//! Small injected TTL cache used for the GitHub branch list. Entries carry
//! an explicit expiry and are evicted lazily on access.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// String-keyed cache with per-entry expiry.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, Entry<V>>>,
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch a live entry; expired entries are removed on the way.
    pub async fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store a value that expires after `ttl`.
    pub async fn set(&self, key: &str, value: V, ttl: Duration) {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_entry_visible_before_expiry() {
        let cache = TtlCache::new();
        cache.set("branches", vec![1, 2, 3], Duration::from_secs(60)).await;
        assert_eq!(cache.get("branches").await, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_entry_absent_after_expiry() {
        let cache = TtlCache::new();
        cache.set("branches", "main".to_string(), Duration::from_millis(5)).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.get("branches").await, None);
    }

    #[tokio::test]
    async fn test_missing_key() {
        let cache: TtlCache<String> = TtlCache::new();
        assert_eq!(cache.get("nope").await, None);
    }

    #[tokio::test]
    async fn test_overwrite_refreshes_value() {
        let cache = TtlCache::new();
        cache.set("k", 1u32, Duration::from_secs(60)).await;
        cache.set("k", 2u32, Duration::from_secs(60)).await;
        assert_eq!(cache.get("k").await, Some(2));
    }
}
