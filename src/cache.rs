//! Content-addressed response cache in front of the model calls.
//!
//! Maps a deterministic fingerprint of (dimension, normalized input) to a
//! previously computed agent result. Entries expire lazily: a read past the
//! expiration timestamp is a miss, never a stale hit. Failed or timed-out
//! results are never stored, so failures are retried on the next run.

use crate::models::AgentResult;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;
use tracing::debug;

/// Compute the cache fingerprint for one agent input.
///
/// Pure function of the dimension identifier and the normalized input
/// bytes; identical input always maps to the same fingerprint across runs.
pub fn fingerprint(dimension: &str, input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(dimension.as_bytes());
    hasher.update([0u8]);
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// A stored result with its expiration timestamp.
#[derive(Debug, Clone)]
struct CacheEntry {
    result: AgentResult,
    #[allow(dead_code)] // Diagnostic field, surfaced when dumping the cache
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// Hit/miss counters, snapshot via [`ResponseCache::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// In-memory response cache, safe for concurrent use across agent tasks.
///
/// Shared via `Arc`; reads and writes on distinct fingerprints are
/// independent, concurrent writes to the same fingerprint are
/// last-write-wins.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a fingerprint. Expired or missing entries are misses.
    ///
    /// Returns a copy of the stored result; the cache never hands out
    /// shared mutable state.
    pub fn get(&self, fingerprint: &str) -> Option<AgentResult> {
        let entries = self.entries.read().expect("cache lock poisoned");
        match entries.get(fingerprint) {
            Some(entry) if Utc::now() < entry.expires_at => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(fingerprint = %&fingerprint[..12.min(fingerprint.len())], "cache hit");
                Some(entry.result.clone())
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a successful result under a fingerprint.
    ///
    /// Idempotent: writing the same fingerprint again overwrites the entry
    /// and resets its expiration. Non-Success results are silently ignored
    /// so a transient failure cannot poison the cache.
    pub fn put(&self, fingerprint: &str, result: &AgentResult, ttl: Duration) {
        if !result.status.is_success() {
            debug!(
                dimension = %result.dimension,
                status = %result.status,
                "not caching non-success result"
            );
            return;
        }

        let now = Utc::now();
        let ttl = ChronoDuration::from_std(ttl).unwrap_or_else(|_| ChronoDuration::zero());
        let entry = CacheEntry {
            result: result.clone(),
            created_at: now,
            expires_at: now + ttl,
        };

        let mut entries = self.entries.write().expect("cache lock poisoned");
        entries.insert(fingerprint.to_string(), entry);
    }

    /// Drop every entry, expired or not.
    pub fn purge(&self) {
        self.entries.write().expect("cache lock poisoned").clear();
    }

    /// Snapshot of the hit/miss counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Number of stored entries, including not-yet-evicted expired ones.
    pub fn len(&self) -> usize {
        self.entries.read().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgentResult, Dimension, Finding};

    fn sample_result() -> AgentResult {
        AgentResult::success(
            Dimension::Text,
            72.5,
            vec![Finding::info("Good content volume")],
            "Solid copy.".to_string(),
        )
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let a = fingerprint("text", "hello world");
        let b = fingerprint("text", "hello world");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_fingerprint_sensitive_to_input_and_dimension() {
        let base = fingerprint("text", "hello world");
        assert_ne!(base, fingerprint("text", "hello world!"));
        assert_ne!(base, fingerprint("ux", "hello world"));
    }

    #[test]
    fn test_put_then_get_round_trip() {
        let cache = ResponseCache::new();
        let result = sample_result();
        let f = fingerprint("text", "input");

        cache.put(&f, &result, Duration::from_secs(60));
        let got = cache.get(&f).expect("entry should be present");

        assert_eq!(got.score, result.score);
        assert_eq!(got.findings.len(), result.findings.len());
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 0 });
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache = ResponseCache::new();
        let f = fingerprint("text", "input");
        cache.put(&f, &sample_result(), Duration::ZERO);

        assert!(cache.get(&f).is_none());
        assert_eq!(cache.stats().misses, 1);
        // Lazy eviction: the entry may still be stored.
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_put_is_idempotent_and_overwrites() {
        let cache = ResponseCache::new();
        let f = fingerprint("text", "input");

        let mut first = sample_result();
        first.score = 10.0;
        cache.put(&f, &first, Duration::from_secs(60));

        let mut second = sample_result();
        second.score = 90.0;
        cache.put(&f, &second, Duration::from_secs(60));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&f).unwrap().score, 90.0);
    }

    #[test]
    fn test_failures_are_never_cached() {
        let cache = ResponseCache::new();
        let f = fingerprint("tech", "input");

        cache.put(
            &f,
            &AgentResult::failed(Dimension::Tech, "provider error"),
            Duration::from_secs(60),
        );
        cache.put(
            &f,
            &AgentResult::timed_out(Dimension::Tech),
            Duration::from_secs(60),
        );

        assert!(cache.is_empty());
        assert!(cache.get(&f).is_none());
    }

    #[test]
    fn test_purge() {
        let cache = ResponseCache::new();
        let f = fingerprint("trust", "input");
        cache.put(&f, &sample_result(), Duration::from_secs(60));
        assert_eq!(cache.len(), 1);

        cache.purge();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_access() {
        use std::sync::Arc;

        let cache = Arc::new(ResponseCache::new());
        let mut handles = Vec::new();

        for i in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(std::thread::spawn(move || {
                let f = fingerprint("text", &format!("input-{}", i % 4));
                cache.put(&f, &sample_result(), Duration::from_secs(60));
                cache.get(&f);
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(cache.len(), 4);
        let stats = cache.stats();
        assert_eq!(stats.hits + stats.misses, 8);
    }
}
