//! Result cache for resolved bitmaps.
//!
//! The cache maps a [`CacheKey`] to the [`Bitmap`] a previous resolution
//! produced. By default it is unbounded and append-only for the lifetime of
//! the loader, matching the historical behavior of the shell; bounding it
//! with LRU eviction is an explicit configuration choice, never a silent
//! one.

use std::collections::HashMap;

use crate::bitmap::Bitmap;
use crate::reference::{CacheKey, IconReference};

/// Configuration for the result cache.
#[derive(Debug, Clone, Default)]
pub struct IconCacheConfig {
    /// Maximum number of entries. `None` (the default) keeps the cache
    /// unbounded; setting a limit switches on LRU eviction.
    pub max_entries: Option<usize>,
}

impl IconCacheConfig {
    /// Bound the cache to `limit` entries with LRU eviction.
    #[must_use]
    pub fn with_max_entries(mut self, limit: usize) -> Self {
        self.max_entries = Some(limit);
        self
    }
}

/// Node in the LRU linked list. Tracked only when the cache is bounded.
struct LruNode {
    prev: Option<CacheKey>,
    next: Option<CacheKey>,
}

/// Cache of decoded bitmaps keyed by derived request identity.
///
/// A miss is a normal outcome, not a failure. Storing under an existing key
/// overwrites it: if two tasks for the same key both complete, the last
/// writer wins, which is consistent either way since both resolved the same
/// reference.
pub struct IconCache {
    config: IconCacheConfig,
    entries: HashMap<CacheKey, Bitmap>,
    lru_nodes: HashMap<CacheKey, LruNode>,
    lru_head: Option<CacheKey>,
    lru_tail: Option<CacheKey>,
    hits: u64,
    misses: u64,
}

impl IconCache {
    /// Create a cache with the given configuration.
    pub fn new(config: IconCacheConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
            lru_nodes: HashMap::new(),
            lru_head: None,
            lru_tail: None,
            hits: 0,
            misses: 0,
        }
    }

    /// Create an unbounded cache.
    pub fn unbounded() -> Self {
        Self::new(IconCacheConfig::default())
    }

    /// Derive the key for `(reference, size)` and look it up.
    pub fn lookup(&mut self, reference: &IconReference, size: u32) -> Option<Bitmap> {
        let key = CacheKey::derive(reference, size);
        self.get(&key)
    }

    /// Look up a previously stored bitmap.
    ///
    /// When the cache is bounded, a hit refreshes the entry's LRU position.
    pub fn get(&mut self, key: &CacheKey) -> Option<Bitmap> {
        match self.entries.get(key).cloned() {
            Some(bitmap) => {
                self.hits += 1;
                if self.bounded() {
                    self.lru_move_to_front(key.clone());
                }
                Some(bitmap)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Insert or overwrite the bitmap for a key.
    pub fn store(&mut self, key: CacheKey, bitmap: Bitmap) {
        let existed = self.entries.insert(key.clone(), bitmap).is_some();
        if !self.bounded() {
            return;
        }

        if existed {
            self.lru_move_to_front(key);
        } else {
            self.lru_push_front(key);
        }

        let limit = self.config.max_entries.unwrap_or(usize::MAX);
        while self.entries.len() > limit {
            let Some(tail) = self.lru_tail.clone() else {
                break;
            };
            self.entries.remove(&tail);
            self.lru_remove(&tail);
        }
    }

    /// Check whether a key is present without touching LRU order or stats.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of cached entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of lookups that found an entry.
    #[inline]
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Number of lookups that found nothing.
    #[inline]
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Discard every entry. Stats are preserved.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru_nodes.clear();
        self.lru_head = None;
        self.lru_tail = None;
    }

    fn bounded(&self) -> bool {
        self.config.max_entries.is_some()
    }

    fn lru_push_front(&mut self, key: CacheKey) {
        let node = LruNode {
            prev: None,
            next: self.lru_head.clone(),
        };

        if let Some(old_head) = &self.lru_head
            && let Some(old_node) = self.lru_nodes.get_mut(old_head)
        {
            old_node.prev = Some(key.clone());
        }

        if self.lru_tail.is_none() {
            self.lru_tail = Some(key.clone());
        }

        self.lru_head = Some(key.clone());
        self.lru_nodes.insert(key, node);
    }

    fn lru_move_to_front(&mut self, key: CacheKey) {
        if self.lru_head.as_ref() == Some(&key) {
            return;
        }
        self.lru_remove(&key);
        self.lru_push_front(key);
    }

    fn lru_remove(&mut self, key: &CacheKey) {
        let Some(node) = self.lru_nodes.remove(key) else {
            return;
        };

        match &node.prev {
            Some(prev_key) => {
                if let Some(prev_node) = self.lru_nodes.get_mut(prev_key) {
                    prev_node.next = node.next.clone();
                }
            }
            None => self.lru_head = node.next.clone(),
        }

        match &node.next {
            Some(next_key) => {
                if let Some(next_node) = self.lru_nodes.get_mut(next_key) {
                    next_node.prev = node.prev.clone();
                }
            }
            None => self.lru_tail = node.prev.clone(),
        }
    }
}

impl std::fmt::Debug for IconCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IconCache")
            .field("entries", &self.entries.len())
            .field("max_entries", &self.config.max_entries)
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish()
    }
}
