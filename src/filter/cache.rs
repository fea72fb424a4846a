//! Bounded cache of parsed filters.
//!
//! Entries are single-flight: concurrent requests for the same filter text
//! block on one parse. Reads take the read lock plus an atomic recency bump;
//! the write lock is only held to insert or evict. Failed parses are kept
//! for a short window so hot invalid input does not re-parse on every call.

use crate::error::SiftError;
use crate::parser::ast::Filter;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

const FAILURE_TTL: Duration = Duration::from_secs(5);

#[derive(Clone)]
struct CachedParse {
    result: Result<Arc<Filter>, SiftError>,
    at: Instant,
}

struct CacheEntry {
    cell: OnceLock<CachedParse>,
    last_used: AtomicU64,
}

pub(crate) struct ParseCache {
    max_entries: usize,
    entries: RwLock<HashMap<String, Arc<CacheEntry>>>,
    clock: AtomicU64,
}

impl ParseCache {
    pub(crate) fn new(max_entries: usize) -> Self {
        Self {
            max_entries,
            entries: RwLock::new(HashMap::new()),
            clock: AtomicU64::new(0),
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.read().expect("parse cache poisoned").len()
    }

    /// Returns the cached parse for `key`, running `parse` at most once per
    /// key across all threads. Cached failures are re-thrown until their
    /// window expires, after which the entry is evicted and re-parsed.
    pub(crate) fn get_or_parse<F>(&self, key: &str, parse: F) -> Result<Arc<Filter>, SiftError>
    where
        F: Fn() -> Result<Filter, SiftError>,
    {
        if self.max_entries == 0 {
            return parse().map(Arc::new);
        }

        loop {
            let entry = self.entry_for(key);
            entry
                .last_used
                .store(self.clock.fetch_add(1, Ordering::Relaxed), Ordering::Relaxed);

            let cached = entry.cell.get_or_init(|| CachedParse {
                result: parse().map(Arc::new),
                at: Instant::now(),
            });

            if cached.result.is_err() && cached.at.elapsed() >= FAILURE_TTL {
                let mut entries = self.entries.write().expect("parse cache poisoned");
                if let Some(current) = entries.get(key) {
                    if Arc::ptr_eq(current, &entry) {
                        entries.remove(key);
                    }
                }
                continue;
            }

            return cached.result.clone();
        }
    }

    fn entry_for(&self, key: &str) -> Arc<CacheEntry> {
        {
            let entries = self.entries.read().expect("parse cache poisoned");
            if let Some(entry) = entries.get(key) {
                return entry.clone();
            }
        }

        let mut entries = self.entries.write().expect("parse cache poisoned");
        if let Some(entry) = entries.get(key) {
            return entry.clone();
        }
        if entries.len() >= self.max_entries {
            evict_least_recent(&mut entries);
        }
        let entry = Arc::new(CacheEntry {
            cell: OnceLock::new(),
            last_used: AtomicU64::new(0),
        });
        entries.insert(key.to_string(), entry.clone());
        entry
    }
}

/// Drops the least-recently-used completed entry, falling back to an
/// arbitrary one if every entry is still mid-parse.
fn evict_least_recent(entries: &mut HashMap<String, Arc<CacheEntry>>) {
    let victim = entries
        .iter()
        .filter(|(_, entry)| entry.cell.get().is_some())
        .min_by_key(|(_, entry)| entry.last_used.load(Ordering::Relaxed))
        .map(|(key, _)| key.clone())
        .or_else(|| entries.keys().next().cloned());
    if let Some(key) = victim {
        entries.remove(&key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::parser::parse_filter;
    use crate::views::ViewRegistry;
    use std::sync::atomic::AtomicUsize;

    fn parse(text: &str) -> Result<Filter, SiftError> {
        parse_filter(text, &ViewRegistry::new(), &EngineConfig::default())
    }

    #[test]
    fn test_hit_returns_shared_filter() {
        let cache = ParseCache::new(16);
        let first = cache.get_or_parse("id", || parse("id")).unwrap();
        let second = cache.get_or_parse("id", || parse("id")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_parse_runs_once_per_key() {
        let cache = ParseCache::new(16);
        let count = AtomicUsize::new(0);
        for _ in 0..5 {
            cache
                .get_or_parse("id,name", || {
                    count.fetch_add(1, Ordering::SeqCst);
                    parse("id,name")
                })
                .unwrap();
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failures_are_cached() {
        let cache = ParseCache::new(16);
        let count = AtomicUsize::new(0);
        for _ in 0..3 {
            let result = cache.get_or_parse("a{b", || {
                count.fetch_add(1, Ordering::SeqCst);
                parse("a{b")
            });
            assert!(result.is_err());
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_eviction_at_capacity() {
        let cache = ParseCache::new(2);
        cache.get_or_parse("a", || parse("a")).unwrap();
        cache.get_or_parse("b", || parse("b")).unwrap();
        // Touch "a" so "b" is the least recently used.
        cache.get_or_parse("a", || parse("a")).unwrap();
        cache.get_or_parse("c", || parse("c")).unwrap();
        assert_eq!(cache.len(), 2);

        let count = AtomicUsize::new(0);
        cache
            .get_or_parse("a", || {
                count.fetch_add(1, Ordering::SeqCst);
                parse("a")
            })
            .unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0, "'a' should have survived");
    }

    #[test]
    fn test_zero_capacity_disables_caching() {
        let cache = ParseCache::new(0);
        let count = AtomicUsize::new(0);
        for _ in 0..3 {
            cache
                .get_or_parse("id", || {
                    count.fetch_add(1, Ordering::SeqCst);
                    parse("id")
                })
                .unwrap();
        }
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_concurrent_requests_coalesce() {
        let cache = Arc::new(ParseCache::new(16));
        let count = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let count = Arc::clone(&count);
                std::thread::spawn(move || {
                    cache
                        .get_or_parse("assignee[firstName]", move || {
                            count.fetch_add(1, Ordering::SeqCst);
                            // Hold the in-flight window open long enough for
                            // the other threads to pile up on this key.
                            std::thread::sleep(Duration::from_millis(50));
                            parse("assignee[firstName]")
                        })
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
