//! Bounded thumbnail cache with FIFO eviction
//!
//! Records are kept in insertion order. Whenever the cache grows past its
//! capacity the oldest records are evicted and their textures released.
//! The cache lives on the render thread; records own GPU textures and are
//! therefore not `Send`, so no locking is involved.

use crate::record::ThumbnailRecord;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

/// Default maximum number of cached records
pub const DEFAULT_CAPACITY: usize = 600;

/// Statistics about thumbnail cache usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of records currently cached
    pub entries: usize,

    /// Maximum number of records
    pub capacity: usize,

    /// Number of lookups that found a record
    pub hits: u64,

    /// Number of lookups that had to create a record
    pub misses: u64,

    /// Number of records evicted past capacity
    pub evictions: u64,

    /// Number of textures released by eviction or clearing
    pub textures_released: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Insertion-ordered collection of thumbnail records, unique by source path
///
/// # Example
///
/// ```
/// use filechooser_cache::ThumbnailCache;
/// use std::path::Path;
///
/// let mut cache = ThumbnailCache::new(2);
/// cache.insert_or_get(Path::new("a.jpg"));
/// cache.insert_or_get(Path::new("b.jpg"));
/// cache.insert_or_get(Path::new("c.jpg"));
///
/// // The oldest record was evicted
/// assert!(!cache.contains(Path::new("a.jpg")));
/// assert_eq!(cache.len(), 2);
/// ```
#[derive(Debug)]
pub struct ThumbnailCache {
    records: HashMap<PathBuf, ThumbnailRecord>,

    /// Insertion order, oldest at the front
    order: VecDeque<PathBuf>,

    capacity: usize,

    stats: CacheStats,
}

impl ThumbnailCache {
    /// Create a cache holding at most `capacity` records (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: HashMap::new(),
            order: VecDeque::new(),
            capacity,
            stats: CacheStats {
                capacity,
                ..Default::default()
            },
        }
    }

    /// Find the record for `source` without creating one
    pub fn lookup(&self, source: &Path) -> Option<&ThumbnailRecord> {
        self.records.get(source)
    }

    /// Mutable variant of [`lookup`](Self::lookup)
    pub fn lookup_mut(&mut self, source: &Path) -> Option<&mut ThumbnailRecord> {
        self.records.get_mut(source)
    }

    /// Return the record for `source`, creating and appending it on a miss
    ///
    /// The same record is returned for a source until it is evicted.
    /// Inserting may evict the oldest records, never the one just inserted.
    pub fn insert_or_get(&mut self, source: &Path) -> &mut ThumbnailRecord {
        if self.records.contains_key(source) {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
            self.order.push_back(source.to_path_buf());
            self.records
                .insert(source.to_path_buf(), ThumbnailRecord::new(source));
            self.enforce_capacity();
        }

        self.records
            .entry(source.to_path_buf())
            .or_insert_with(|| ThumbnailRecord::new(source))
    }

    /// Evict the oldest records until the cache fits its capacity
    ///
    /// Evicted records are disposed synchronously. Returns the number of
    /// records evicted.
    pub fn enforce_capacity(&mut self) -> usize {
        let mut evicted = 0;
        while self.order.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if let Some(mut record) = self.records.remove(&oldest) {
                let released = record.dispose();
                self.stats.textures_released += released as u64;
                log::debug!(
                    "evicted thumbnail record {} ({} textures)",
                    oldest.display(),
                    released
                );
            }
            evicted += 1;
        }

        self.stats.evictions += evicted as u64;
        self.stats.entries = self.records.len();
        evicted
    }

    /// Change the capacity, evicting immediately if the cache is now too large
    pub fn set_capacity(&mut self, capacity: usize) -> usize {
        self.capacity = capacity.max(1);
        self.stats.capacity = self.capacity;
        self.enforce_capacity()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the number of records currently in the cache
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Check if a record exists without touching statistics
    pub fn contains(&self, source: &Path) -> bool {
        self.records.contains_key(source)
    }

    /// Iterate over records, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &ThumbnailRecord> + '_ {
        self.order.iter().filter_map(|source| self.records.get(source))
    }

    /// Dispose and remove every record
    ///
    /// Returns the number of textures released.
    pub fn clear(&mut self) -> usize {
        let mut released = 0;
        for source in self.order.drain(..) {
            if let Some(mut record) = self.records.remove(&source) {
                released += record.dispose();
            }
        }
        self.records.clear();

        self.stats.textures_released += released as u64;
        self.stats.entries = 0;
        released
    }

    /// Get current cache statistics
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

impl Default for ThumbnailCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Tier;
    use crate::texture::GpuTexture;
    use rand::Rng;
    use std::cell::Cell;
    use std::rc::Rc;

    struct DropCounter(Rc<Cell<usize>>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    fn path(name: &str) -> PathBuf {
        PathBuf::from(format!("/pictures/{}", name))
    }

    fn sources(cache: &ThumbnailCache) -> Vec<PathBuf> {
        cache.iter().map(|r| r.source().to_path_buf()).collect()
    }

    #[test]
    fn test_insert_or_get_is_idempotent() {
        let mut cache = ThumbnailCache::new(10);

        let first = cache.insert_or_get(&path("a.jpg")).id();
        let second = cache.insert_or_get(&path("a.jpg")).id();

        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn test_lookup_returns_same_instance() {
        let mut cache = ThumbnailCache::new(10);
        let id = cache.insert_or_get(&path("a.jpg")).id();

        assert_eq!(cache.lookup(&path("a.jpg")).map(|r| r.id()), Some(id));
        assert_eq!(cache.lookup(&path("a.jpg")).map(|r| r.id()), Some(id));
        assert!(cache.lookup(&path("missing.jpg")).is_none());
    }

    #[test]
    fn test_fifo_eviction() {
        let released = Rc::new(Cell::new(0));
        let mut cache = ThumbnailCache::new(2);

        cache
            .insert_or_get(&path("a.jpg"))
            .add_tier(Tier::Large, GpuTexture::new(DropCounter(released.clone()), 8, 8, 256));
        cache.insert_or_get(&path("b.jpg"));
        cache.insert_or_get(&path("c.jpg"));

        assert_eq!(sources(&cache), vec![path("b.jpg"), path("c.jpg")]);
        assert_eq!(released.get(), 1, "evicted record must release its textures");

        let stats = cache.stats();
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.textures_released, 1);
    }

    #[test]
    fn test_capacity_plus_one_evicts_first_inserted() {
        let mut cache = ThumbnailCache::new(5);
        for i in 0..6 {
            cache.insert_or_get(&path(&format!("{}.png", i)));
        }

        assert!(!cache.contains(&path("0.png")));
        for i in 1..6 {
            assert!(cache.contains(&path(&format!("{}.png", i))));
        }
    }

    #[test]
    fn test_hits_do_not_reorder() {
        let mut cache = ThumbnailCache::new(2);
        cache.insert_or_get(&path("a.jpg"));
        cache.insert_or_get(&path("b.jpg"));

        // Eviction is by insertion order, not by use
        cache.insert_or_get(&path("a.jpg"));
        cache.insert_or_get(&path("c.jpg"));

        assert_eq!(sources(&cache), vec![path("b.jpg"), path("c.jpg")]);
    }

    #[test]
    fn test_set_capacity_shrinks() {
        let mut cache = ThumbnailCache::new(10);
        for i in 0..8 {
            cache.insert_or_get(&path(&format!("{}.png", i)));
        }

        let evicted = cache.set_capacity(3);

        assert_eq!(evicted, 5);
        assert_eq!(cache.len(), 3);
        assert_eq!(
            sources(&cache),
            vec![path("5.png"), path("6.png"), path("7.png")]
        );
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut cache = ThumbnailCache::new(0);
        assert_eq!(cache.capacity(), 1);

        let id = cache.insert_or_get(&path("a.jpg")).id();
        assert_eq!(cache.lookup(&path("a.jpg")).map(|r| r.id()), Some(id));
    }

    #[test]
    fn test_clear_releases_everything() {
        let released = Rc::new(Cell::new(0));
        let mut cache = ThumbnailCache::new(10);
        for name in ["a.jpg", "b.jpg"] {
            let record = cache.insert_or_get(&path(name));
            for tier in [Tier::Small, Tier::Large] {
                record.add_tier(tier, GpuTexture::new(DropCounter(released.clone()), 4, 4, 64));
            }
        }

        assert_eq!(cache.clear(), 4);
        assert_eq!(released.get(), 4);
        assert!(cache.is_empty());
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_enforce_capacity_noop_when_within_bounds() {
        let mut cache = ThumbnailCache::new(3);
        cache.insert_or_get(&path("a.jpg"));
        assert_eq!(cache.enforce_capacity(), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_random_sequences_respect_capacity() {
        let mut rng = rand::thread_rng();

        for _ in 0..20 {
            let capacity = rng.gen_range(1..16);
            let mut cache = ThumbnailCache::new(capacity);
            let mut last_inserted = None;

            for _ in 0..200 {
                let name = format!("{}.jpg", rng.gen_range(0..40));
                let source = path(&name);
                let was_cached = cache.contains(&source);
                cache.insert_or_get(&source);

                assert!(cache.len() <= capacity);
                assert_eq!(cache.len(), cache.iter().count());
                if !was_cached {
                    last_inserted = Some(source);
                }
                // The newest record is never the one evicted
                if let Some(newest) = &last_inserted {
                    assert!(cache.contains(newest));
                }
            }
        }
    }

    #[test]
    fn test_default_capacity() {
        let cache = ThumbnailCache::default();
        assert_eq!(cache.capacity(), DEFAULT_CAPACITY);
        assert_eq!(cache.stats().capacity, 600);
    }
}
