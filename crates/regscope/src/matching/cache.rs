use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::catalog::Rule;

/// Default lifetime of a cached candidate list.
pub const DEFAULT_CANDIDATE_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct CacheEntry {
    candidates: Arc<Vec<Rule>>,
    /// `None` when the TTL reaches past the clock's range; the entry never expires.
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |expires_at| now < expires_at)
    }
}

/// Whether a lookup was served from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

/// Time-bounded memo of candidate rules keyed by jurisdiction footprint.
///
/// Entries are immutable snapshots. A miss replaces the entry wholesale, so two
/// requests racing on the same key both write an equivalent value. Expired entries
/// are dropped lazily when next looked up.
#[derive(Debug)]
pub struct CandidateCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl Default for CandidateCache {
    fn default() -> Self {
        Self::new(DEFAULT_CANDIDATE_TTL)
    }
}

impl CandidateCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the unexpired candidates for `key`, if any.
    pub fn get(&self, key: &str) -> Option<Arc<Vec<Rule>>> {
        let now = Instant::now();
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.is_fresh(now) => Some(Arc::clone(&entry.candidates)),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store a fresh snapshot for `key`, replacing any previous entry.
    pub fn insert(&self, key: String, candidates: Vec<Rule>) -> Arc<Vec<Rule>> {
        let candidates = Arc::new(candidates);
        let entry = CacheEntry {
            candidates: Arc::clone(&candidates),
            expires_at: Instant::now().checked_add(self.ttl),
        };
        self.lock().insert(key, entry);
        candidates
    }

    /// Serve `key` from the cache, or run `fetch` and cache its result.
    ///
    /// The lock is not held while `fetch` runs. Failed fetches are not cached.
    pub fn get_or_fetch<F, E>(&self, key: &str, fetch: F) -> Result<(Arc<Vec<Rule>>, CacheStatus), E>
    where
        F: FnOnce() -> Result<Vec<Rule>, E>,
    {
        if let Some(candidates) = self.get(key) {
            return Ok((candidates, CacheStatus::Hit));
        }

        let candidates = fetch()?;
        Ok((self.insert(key.to_string(), candidates), CacheStatus::Miss))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        // Entries are replaced whole, so a poisoned map is still consistent.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
