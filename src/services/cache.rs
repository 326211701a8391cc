//! Small in-memory cache with per-entry TTL.
//!
//! Owned by whoever needs it and passed in explicitly, so tests can
//! control and inspect it. Expired entries are evicted on read.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// String-keyed cache where every entry expires `ttl` after insert.
#[derive(Debug)]
pub struct TtlCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<String, (V, Instant)>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Get a live entry. An expired entry is removed and reported as
    /// a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some((value, inserted_at)) if inserted_at.elapsed() < self.ttl => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(key.into(), (value, Instant::now()));
    }

    /// Drop one entry, e.g. after the underlying record changes.
    pub fn invalidate(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap();
        entries.remove(key);
    }

    /// Drop every expired entry.
    pub fn purge_expired(&self) {
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|_, (_, inserted_at)| inserted_at.elapsed() < self.ttl);
    }

    /// Number of entries currently held, expired or not.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let cache: TtlCache<String> = TtlCache::new(Duration::from_secs(60));
        cache.insert("a", "alpha".to_string());

        assert_eq!(cache.get("a"), Some("alpha".to_string()));
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expired_entries_are_misses() {
        let cache: TtlCache<i64> = TtlCache::new(Duration::from_millis(10));
        cache.insert("a", 1);

        std::thread::sleep(Duration::from_millis(20));

        assert_eq!(cache.get("a"), None);
        // The expired entry was evicted by the read
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate() {
        let cache: TtlCache<i64> = TtlCache::new(Duration::from_secs(60));
        cache.insert("a", 1);
        cache.invalidate("a");
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_purge_expired() {
        let cache: TtlCache<i64> = TtlCache::new(Duration::from_millis(10));
        cache.insert("old", 1);

        std::thread::sleep(Duration::from_millis(20));
        cache.insert("fresh", 2);

        cache.purge_expired();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("fresh"), Some(2));
    }

    #[test]
    fn test_insert_refreshes_ttl() {
        let cache: TtlCache<i64> = TtlCache::new(Duration::from_millis(30));
        cache.insert("a", 1);

        std::thread::sleep(Duration::from_millis(20));
        cache.insert("a", 2);

        std::thread::sleep(Duration::from_millis(20));
        // 40ms after the first insert but only 20ms after the second
        assert_eq!(cache.get("a"), Some(2));
    }
}
