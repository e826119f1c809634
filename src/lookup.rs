use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;

use crate::document::MatchDocument;
use crate::error::StoreError;
use crate::store::MatchStore;

#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Found(Arc<MatchDocument>),
    NotFound,
}

impl LookupOutcome {
    pub fn document(&self) -> Option<&MatchDocument> {
        match self {
            LookupOutcome::Found(doc) => Some(doc),
            LookupOutcome::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, LookupOutcome::Found(_))
    }
}

pub type LookupKey = (String, String);

/// Backing store for memoized lookups. Entries are never evicted.
pub trait LookupCache: Send + Sync {
    fn get(&self, key: &LookupKey) -> Option<LookupOutcome>;
    fn insert(&self, key: LookupKey, outcome: LookupOutcome);
}

#[derive(Debug, Default)]
pub struct MemoryLookupCache {
    entries: Mutex<HashMap<LookupKey, LookupOutcome>>,
}

impl MemoryLookupCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LookupCache for MemoryLookupCache {
    fn get(&self, key: &LookupKey) -> Option<LookupOutcome> {
        let guard = self.entries.lock().ok()?;
        guard.get(key).cloned()
    }

    fn insert(&self, key: LookupKey, outcome: LookupOutcome) {
        // A poisoned cache only costs a re-query.
        if let Ok(mut guard) = self.entries.lock() {
            guard.insert(key, outcome);
        }
    }
}

static SHARED_CACHE: Lazy<Arc<MemoryLookupCache>> = Lazy::new(|| Arc::new(MemoryLookupCache::new()));

/// Process-wide cache shared by every session of this process.
pub fn shared_cache() -> Arc<MemoryLookupCache> {
    Arc::clone(&SHARED_CACHE)
}

pub struct MatchLookup {
    store: Arc<dyn MatchStore>,
    cache: Arc<dyn LookupCache>,
}

impl MatchLookup {
    pub fn new(store: Arc<dyn MatchStore>, cache: Arc<dyn LookupCache>) -> Self {
        Self { store, cache }
    }

    pub fn with_shared_cache(store: Arc<dyn MatchStore>) -> Self {
        Self::new(store, shared_cache())
    }

    pub fn store(&self) -> &dyn MatchStore {
        self.store.as_ref()
    }

    /// Finds the stored match for an ordered (home, away) pair. Both found and
    /// not-found outcomes are memoized; store failures are returned and never
    /// cached.
    pub fn find(&self, home: &str, away: &str) -> Result<LookupOutcome, StoreError> {
        let key = (home.to_string(), away.to_string());
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(home, away, found = hit.is_found(), "match lookup cache hit");
            return Ok(hit);
        }

        let outcome = match self.store.find_match(home, away)? {
            Some(doc) => LookupOutcome::Found(Arc::new(doc)),
            None => LookupOutcome::NotFound,
        };
        tracing::info!(home, away, found = outcome.is_found(), "match lookup");
        self.cache.insert(key, outcome.clone());
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::document::Venue;
    use crate::store::TeamRow;

    struct CountingStore {
        calls: AtomicUsize,
        fail: bool,
    }

    impl MatchStore for CountingStore {
        fn find_match(&self, home: &str, away: &str) -> Result<Option<MatchDocument>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(StoreError::Connectivity("connection refused".to_string()));
            }
            if home == "Alpha FC" && away == "Beta United" {
                let doc = serde_json::from_value(serde_json::json!({
                    "teams": {"home": {"name": home}, "away": {"name": away}}
                }))
                .expect("valid document");
                return Ok(Some(doc));
            }
            Ok(None)
        }

        fn team_rows(&self, _: Venue, _: &[String]) -> Result<Vec<TeamRow>, StoreError> {
            Ok(Vec::new())
        }

        fn distinct_team_names(&self, _: Venue) -> Result<Vec<String>, StoreError> {
            Ok(Vec::new())
        }

        fn distinct_leagues(&self, _: &[String]) -> Result<Vec<String>, StoreError> {
            Ok(Vec::new())
        }
    }

    fn lookup(fail: bool) -> (Arc<CountingStore>, Arc<MemoryLookupCache>, MatchLookup) {
        let store = Arc::new(CountingStore {
            calls: AtomicUsize::new(0),
            fail,
        });
        let cache = Arc::new(MemoryLookupCache::new());
        let lookup = MatchLookup::new(store.clone(), cache.clone());
        (store, cache, lookup)
    }

    #[test]
    fn repeated_lookups_hit_the_store_once() {
        let (store, cache, lookup) = lookup(false);
        let first = lookup.find("Alpha FC", "Beta United").expect("lookup");
        let second = lookup.find("Alpha FC", "Beta United").expect("lookup");
        assert!(first.is_found());
        assert_eq!(first, second);
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn not_found_is_a_value_and_is_memoized() {
        let (store, _, lookup) = lookup(false);
        let outcome = lookup.find("Beta United", "Alpha FC").expect("lookup");
        assert_eq!(outcome, LookupOutcome::NotFound);
        assert!(outcome.document().is_none());
        lookup.find("Beta United", "Alpha FC").expect("lookup");
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn store_failures_propagate_and_are_not_cached() {
        let (store, cache, lookup) = lookup(true);
        let err = lookup.find("Alpha FC", "Beta United").unwrap_err();
        assert!(matches!(err, StoreError::Connectivity(_)));
        assert!(lookup.find("Alpha FC", "Beta United").is_err());
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }
}
