//! Bounded least-recently-used cache for normal quantiles.

use std::fmt;
use std::num::NonZeroUsize;

use lru::LruCache;

/// Number of decimal digits a probability is rounded to before it is used as a key.
pub const KEY_DIGITS: i32 = 10;

/// Default number of quantiles kept by a cache.
pub const DEFAULT_CAPACITY: usize = 256;

fn cache_key(p: f64) -> i64 {
    (p * 10f64.powi(KEY_DIGITS)).round() as i64
}

/// An LRU map from rounded probabilities to quantile values.
///
/// A capacity of zero disables caching: `insert` is a no-op and `get` always misses.
pub struct QuantileCache {
    entries: Option<LruCache<i64, f64>>,
}

impl Default for QuantileCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl fmt::Debug for QuantileCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuantileCache")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}

impl QuantileCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(LruCache::new),
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.as_ref().map_or(0, |entries| entries.cap().get())
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, LruCache::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up the quantile for `p`, marking the entry as most recently used.
    pub fn get(&mut self, p: f64) -> Option<f64> {
        self.entries.as_mut()?.get(&cache_key(p)).copied()
    }

    /// Store `value` for `p`, evicting the least recently used entry when full.
    pub fn insert(&mut self, p: f64, value: f64) {
        if let Some(entries) = self.entries.as_mut() {
            entries.put(cache_key(p), value);
        }
    }

    pub fn clear(&mut self) {
        if let Some(entries) = self.entries.as_mut() {
            entries.clear();
        }
    }
}
