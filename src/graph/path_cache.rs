// Cached shortest-path lookups keyed by (wall, from, to). The cache is
// explicitly owned and invalidated by its caller; nothing here is
// process-wide state.

use lru::LruCache;
use std::num::NonZeroUsize;

/// (wall_id, from_item_id, to_item_id)
pub type PathKey = (String, String, String);

/// A cached result: the edge-id sequence of the path, or None for
/// "no path exists" (negative results are worth caching too).
pub type CachedPath = Option<Vec<String>>;

pub struct PathCache {
    inner: LruCache<PathKey, CachedPath>,
}

impl PathCache {
    pub fn new(capacity: usize) -> Self {
        PathCache {
            inner: LruCache::new(NonZeroUsize::new(capacity.max(1)).unwrap()),
        }
    }

    pub fn get(&mut self, key: &PathKey) -> Option<&CachedPath> {
        self.inner.get(key)
    }

    pub fn insert(&mut self, key: PathKey, path: CachedPath) {
        self.inner.put(key, path);
    }

    /// Drop every cached path for a wall; called after any edge or item
    /// write on that wall.
    pub fn invalidate_wall(&mut self, wall_id: &str) {
        let stale: Vec<PathKey> = self
            .inner
            .iter()
            .filter(|(key, _)| key.0 == wall_id)
            .map(|(key, _)| key.clone())
            .collect();
        for key in stale {
            self.inner.pop(&key);
        }
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(wall: &str, from: &str, to: &str) -> PathKey {
        (wall.to_string(), from.to_string(), to.to_string())
    }

    #[test]
    fn stores_both_hits_and_misses() {
        let mut cache = PathCache::new(8);
        cache.insert(key("w1", "a", "b"), Some(vec!["e1".to_string()]));
        cache.insert(key("w1", "b", "a"), None);
        assert_eq!(
            cache.get(&key("w1", "a", "b")),
            Some(&Some(vec!["e1".to_string()]))
        );
        assert_eq!(cache.get(&key("w1", "b", "a")), Some(&None));
        assert_eq!(cache.get(&key("w1", "a", "c")), None);
    }

    #[test]
    fn invalidation_is_scoped_to_the_wall() {
        let mut cache = PathCache::new(8);
        cache.insert(key("w1", "a", "b"), None);
        cache.insert(key("w2", "a", "b"), None);
        cache.invalidate_wall("w1");
        assert!(cache.get(&key("w1", "a", "b")).is_none());
        assert!(cache.get(&key("w2", "a", "b")).is_some());
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn capacity_evicts_least_recently_used() {
        let mut cache = PathCache::new(2);
        cache.insert(key("w1", "a", "b"), None);
        cache.insert(key("w1", "b", "c"), None);
        cache.insert(key("w1", "c", "d"), None);
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key("w1", "a", "b")).is_none());
    }
}
