//! Predicate result caching.
//!
//! Entries are keyed by the [`DocumentQuery`] that produced them and grouped
//! by collection, so a reload of one collection can drop exactly its
//! entries with [`PredicateCache::invalidate_collection`]. Only successful
//! query results are stored.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use clinical_filter::IdentifierSet;
use lru::LruCache;

use crate::config::CacheConfig;
use crate::traits::DocumentQuery;

/// Cache key: the collection plus everything else that shapes the hits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct QueryKey {
    collection: String,
    id_field: String,
    predicate: String,
    max_hits: Option<usize>,
}

impl From<&DocumentQuery> for QueryKey {
    fn from(query: &DocumentQuery) -> Self {
        Self {
            collection: query.collection.clone(),
            id_field: query.id_field.clone(),
            predicate: query.predicate.to_string(),
            max_hits: query.max_hits,
        }
    }
}

#[derive(Debug, Clone)]
struct CachedIds {
    ids: IdentifierSet,
    stored_at: Instant,
}

/// Thread-safe LRU cache with TTL expiration for predicate results.
///
/// The lock is held only for the map operation itself, never across an
/// index call.
pub struct PredicateCache {
    entries: Mutex<LruCache<QueryKey, CachedIds>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl PredicateCache {
    /// Creates a cache from configuration. A capacity of 0 is treated as 1.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_capacity(config.max_entries, config.ttl)
    }

    /// Creates a cache with custom capacity and TTL.
    pub fn with_capacity(max_entries: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the cached identifiers for `query` if they are still fresh.
    ///
    /// A stale entry is dropped on lookup and counts as a miss.
    pub fn get(&self, query: &DocumentQuery) -> Option<IdentifierSet> {
        let key = QueryKey::from(query);
        let found = self.entries.lock().ok().and_then(|mut entries| {
            let fresh = entries
                .get(&key)
                .map(|cached| (cached.stored_at.elapsed() <= self.ttl, cached.ids.clone()));
            match fresh {
                Some((true, ids)) => Some(ids),
                Some((false, _)) => {
                    entries.pop(&key);
                    None
                }
                None => None,
            }
        });

        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Stores the identifiers a successful query produced.
    pub fn insert(&self, query: &DocumentQuery, ids: IdentifierSet) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.put(
                QueryKey::from(query),
                CachedIds {
                    ids,
                    stored_at: Instant::now(),
                },
            );
        }
    }

    /// Drops every entry for `collection`, returning how many were removed.
    ///
    /// Call this after the collection has been reloaded.
    pub fn invalidate_collection(&self, collection: &str) -> usize {
        self.remove_where(|key, _| key.collection == collection)
    }

    /// Drops expired entries, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let ttl = self.ttl;
        self.remove_where(|_, cached| cached.stored_at.elapsed() > ttl)
    }

    /// Drops every entry. Hit and miss counters are kept.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |entries| entries.len())
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the cache contents and lookup counters.
    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            ..CacheStats::default()
        };
        if let Ok(entries) = self.entries.lock() {
            for (key, cached) in entries.iter() {
                if cached.stored_at.elapsed() > self.ttl {
                    stats.expired_entries += 1;
                } else {
                    *stats
                        .entries_per_collection
                        .entry(key.collection.clone())
                        .or_default() += 1;
                }
            }
        }
        stats
    }

    fn remove_where<F>(&self, doomed: F) -> usize
    where
        F: Fn(&QueryKey, &CachedIds) -> bool,
    {
        let Ok(mut entries) = self.entries.lock() else {
            return 0;
        };
        let keys: Vec<QueryKey> = entries
            .iter()
            .filter(|(key, cached)| doomed(key, cached))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &keys {
            entries.pop(key);
        }
        keys.len()
    }
}

impl std::fmt::Debug for PredicateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredicateCache")
            .field("entries", &self.len())
            .field("ttl", &self.ttl)
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish()
    }
}

/// Cache contents and lookup counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Fresh entries per collection.
    pub entries_per_collection: BTreeMap<String, usize>,
    /// Entries past their TTL that are not purged yet.
    pub expired_entries: usize,
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that had to go to the index.
    pub misses: u64,
}

impl CacheStats {
    /// Fresh entries across all collections.
    pub fn fresh_entries(&self) -> usize {
        self.entries_per_collection.values().sum()
    }

    /// Share of lookups served from the cache, 0.0 when nothing was looked up.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
