//! Search Query Cache
//!
//! Process-lifetime memoization of search queries, keyed by the
//! normalized query string. A best-effort speed (and quota) optimization,
//! not a correctness mechanism: entries never persist across runs, and
//! failures are never cached. DashMap keeps it safe for a future
//! concurrent caller without an external mutex.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::constants::search;
use crate::types::SearchHit;

/// Cached results for one normalized query
#[derive(Debug, Clone)]
struct CacheEntry {
    results: Vec<SearchHit>,
    fetched_at: DateTime<Utc>,
}

/// In-memory query cache with TTL-as-miss semantics
pub struct QueryCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::with_ttl_secs(search::CACHE_TTL_SECS)
    }

    pub fn with_ttl_secs(ttl_secs: i64) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// Fetch cached results; entries older than the TTL count as misses.
    /// Stale entries are left in place and overwritten on the next insert.
    pub fn get(&self, key: &str) -> Option<Vec<SearchHit>> {
        let entry = self.entries.get(key)?;
        if Utc::now() - entry.fetched_at < self.ttl {
            Some(entry.results.clone())
        } else {
            None
        }
    }

    pub fn insert(&self, key: impl Into<String>, results: Vec<SearchHit>) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                results,
                fetched_at: Utc::now(),
            },
        );
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(title: &str) -> SearchHit {
        SearchHit {
            title: title.to_string(),
            url: "https://example.com".to_string(),
            snippet: String::new(),
        }
    }

    #[test]
    fn test_insert_and_get() {
        let cache = QueryCache::new();
        assert!(cache.get("q").is_none());

        cache.insert("q", vec![hit("a"), hit("b")]);
        let results = cache.get("q").expect("cache hit");
        assert_eq!(results.len(), 2);
        assert!(cache.get("other").is_none());
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache = QueryCache::with_ttl_secs(0);
        cache.insert("q", vec![hit("a")]);
        assert!(cache.get("q").is_none());
    }

    #[test]
    fn test_insert_overwrites() {
        let cache = QueryCache::new();
        cache.insert("q", vec![hit("old")]);
        cache.insert("q", vec![hit("new")]);
        let results = cache.get("q").expect("cache hit");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "new");
    }
}
