//! Bounded, time-expiring translation cache.
//!
//! Keys are `"{from}:{to}:{len}:{hash}"` over the UTF-16 form of the text,
//! with a 32-bit rolling hash. Two different texts of equal length can share
//! a key; the resulting stale hit is accepted, not treated as an error.
//!
//! Expiry is checked lazily on read. When full, inserting a new key evicts
//! the single oldest entry.

use bazaar_core::config::TranslationConfig;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};

pub const DEFAULT_MAX_ENTRIES: usize = 1000;
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

struct CacheEntry {
    result: String,
    inserted_at: Instant,
    // tie-break for entries inserted within the same clock tick
    seq: u64,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, CacheEntry>,
    next_seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_entries: usize,
    pub ttl_secs: u64,
}

/// Thread-safe translation cache with TTL expiry and oldest-first eviction.
pub struct TranslationCache {
    inner: Mutex<Inner>,
    max_entries: usize,
    ttl: Duration,
}

impl TranslationCache {
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        TranslationCache {
            inner: Mutex::new(Inner::default()),
            max_entries,
            ttl,
        }
    }

    pub fn from_config(config: &TranslationConfig) -> Self {
        Self::new(
            config.cache_max_entries,
            Duration::from_secs(config.cache_ttl_secs),
        )
    }

    /// Cached translation of `text` from `from` to `to`, if present and fresh.
    pub fn get(&self, text: &str, from: &str, to: &str) -> Option<String> {
        let key = cache_key(text, from, to);
        let mut inner = self.inner.lock();
        let expired = match inner.entries.get(&key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                return Some(entry.result.clone())
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            inner.entries.remove(&key);
        }
        None
    }

    /// Store a translation, evicting the oldest entry if the cache is full.
    pub fn set(&self, text: &str, from: &str, to: &str, result: &str) {
        if self.max_entries == 0 {
            return;
        }
        let key = cache_key(text, from, to);
        let mut inner = self.inner.lock();

        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.max_entries {
            let oldest = inner
                .entries
                .iter()
                .min_by_key(|(_, e)| (e.inserted_at, e.seq))
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                inner.entries.remove(&oldest);
            }
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(
            key,
            CacheEntry {
                result: result.to_string(),
                inserted_at: Instant::now(),
                seq,
            },
        );
    }

    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    /// Drop every expired entry.
    pub fn purge_expired(&self) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner
            .entries
            .retain(|_, e| e.inserted_at.elapsed() < self.ttl);
        before - inner.entries.len()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.len(),
            max_entries: self.max_entries,
            ttl_secs: self.ttl.as_secs(),
        }
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES, DEFAULT_TTL)
    }
}

/// Composite cache key: languages, UTF-16 length, rolling hash.
pub fn cache_key(text: &str, from: &str, to: &str) -> String {
    let len = text.encode_utf16().count();
    format!("{from}:{to}:{len}:{}", rolling_hash(text))
}

/// 32-bit `h = h * 31 + unit` over UTF-16 code units, wrapping.
pub fn rolling_hash(text: &str) -> i32 {
    text.encode_utf16().fold(0i32, |h, unit| {
        h.wrapping_shl(5).wrapping_sub(h).wrapping_add(i32::from(unit))
    })
}
