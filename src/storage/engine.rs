//! Thread-Safe Storage Engine with Lazy Expiry
//!
//! This module implements the keyspace for linekv: a concurrent map from key
//! to value with an optional expiry instant.
//!
//! ## Design Decisions
//!
//! 1. **Sharded Locks**: The keyspace is split into shards, each behind its own `RwLock`.
//! 2. **Lazy Expiry**: Keys are checked for expiry on access. There is no background sweep.
//! 3. **Evict on Observe**: Once a read observes an expired entry, the entry is removed.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StorageEngine                           │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │ Shard N │           │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ RwLock  │           │
//! │  │ HashMap │ │ HashMap │ │ HashMap │ │ HashMap │           │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! A key always hashes to the same shard, so every operation on one key is
//! serialized by that shard's lock.

use bytes::Bytes;
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use tracing::trace;

/// Number of shards for the storage engine.
const NUM_SHARDS: usize = 64;

/// Represents a stored value with optional expiry time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The actual value stored
    pub value: Bytes,
    /// When this entry expires (None = never expires)
    pub expires_at: Option<Instant>,
}

impl Entry {
    /// Creates an entry that expires `ttl` after `now`.
    ///
    /// A zero `ttl` means the entry never expires.
    pub fn new(value: Bytes, ttl: Option<Duration>, now: Instant) -> Self {
        let expires_at = ttl.filter(|ttl| !ttl.is_zero()).map(|ttl| now + ttl);
        Self { value, expires_at }
    }

    /// Checks if this entry has expired as of `now`.
    ///
    /// The expiry instant itself still counts as live.
    #[inline]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|exp| now > exp)
    }
}

type ShardMap = HashMap<Bytes, Entry>;

/// A single shard containing a portion of the key-value pairs.
#[derive(Debug, Default)]
struct Shard {
    data: RwLock<ShardMap>,
}

impl Shard {
    // Every mutation is a single HashMap call, so a poisoned map is still coherent.
    fn read(&self) -> RwLockReadGuard<'_, ShardMap> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ShardMap> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The keyspace shared by every connection.
///
/// Wrap it in an `Arc` and hand a clone to each connection task. All
/// operations are total: they never fail and never block on anything but the
/// owning shard's lock.
///
/// # Example
///
/// ```
/// use linekv::storage::StorageEngine;
/// use bytes::Bytes;
/// use std::time::Duration;
///
/// let engine = StorageEngine::new();
///
/// engine.set(Bytes::from("name"), Bytes::from("linekv"), None);
/// assert_eq!(engine.get(&Bytes::from("name")), Some(Bytes::from("linekv")));
///
/// engine.set(
///     Bytes::from("session"),
///     Bytes::from("abc123"),
///     Some(Duration::from_secs(60)),
/// );
/// ```
pub struct StorageEngine {
    shards: Vec<Shard>,

    /// Statistics: number of resident keys
    key_count: AtomicU64,

    /// Statistics: total GET operations
    get_count: AtomicU64,

    /// Statistics: total SET operations
    set_count: AtomicU64,

    /// Statistics: number of expired keys evicted on access
    expired_count: AtomicU64,
}

impl std::fmt::Debug for StorageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageEngine")
            .field("shards", &self.shards.len())
            .field("key_count", &self.key_count.load(Ordering::Relaxed))
            .field("get_count", &self.get_count.load(Ordering::Relaxed))
            .field("set_count", &self.set_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for StorageEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageEngine {
    /// Creates an empty storage engine.
    pub fn new() -> Self {
        let shards = (0..NUM_SHARDS).map(|_| Shard::default()).collect();

        Self {
            shards,
            key_count: AtomicU64::new(0),
            get_count: AtomicU64::new(0),
            set_count: AtomicU64::new(0),
            expired_count: AtomicU64::new(0),
        }
    }

    #[inline]
    fn shard_index(&self, key: &[u8]) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % NUM_SHARDS
    }

    #[inline]
    fn get_shard(&self, key: &[u8]) -> &Shard {
        &self.shards[self.shard_index(key)]
    }

    /// Inserts or overwrites `key`.
    ///
    /// With `ttl` set to a non-zero duration the key expires that long from
    /// now; otherwise it never expires. An overwrite replaces both the value
    /// and any previous expiry.
    ///
    /// Returns `true` if a new key was created.
    pub fn set(&self, key: Bytes, value: Bytes, ttl: Option<Duration>) -> bool {
        self.set_at(key, value, ttl, Instant::now())
    }

    /// Like [`set`](Self::set), measuring `ttl` from `now`.
    pub fn set_at(&self, key: Bytes, value: Bytes, ttl: Option<Duration>, now: Instant) -> bool {
        self.set_count.fetch_add(1, Ordering::Relaxed);

        let mut data = self.get_shard(&key).write();
        let is_new = data.insert(key, Entry::new(value, ttl, now)).is_none();

        if is_new {
            self.key_count.fetch_add(1, Ordering::Relaxed);
        }

        is_new
    }

    /// Gets the value for a key.
    ///
    /// Returns `None` if the key doesn't exist or has expired. An expired key
    /// is removed from the map before returning.
    pub fn get(&self, key: &Bytes) -> Option<Bytes> {
        self.get_at(key, Instant::now())
    }

    /// Like [`get`](Self::get), judging expiry as of `now`.
    pub fn get_at(&self, key: &Bytes, now: Instant) -> Option<Bytes> {
        self.get_count.fetch_add(1, Ordering::Relaxed);

        let shard = self.get_shard(key);

        // Fast path: live or missing keys only need the read lock
        {
            let data = shard.read();
            match data.get(key) {
                Some(entry) if !entry.is_expired_at(now) => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // The entry looked expired. Re-check under the write lock, since a
        // concurrent SET may have replaced it or another GET evicted it.
        let mut data = shard.write();
        match data.get(key) {
            Some(entry) if entry.is_expired_at(now) => {
                data.remove(key);
                self.key_count.fetch_sub(1, Ordering::Relaxed);
                self.expired_count.fetch_add(1, Ordering::Relaxed);
                trace!(key = ?key, "Evicted expired key");
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    /// Returns true if the map physically holds `key`, expired or not.
    ///
    /// Unlike [`get`](Self::get) this never evicts anything.
    pub fn is_resident(&self, key: &Bytes) -> bool {
        self.get_shard(key).read().contains_key(key)
    }

    /// Returns the stored entry for `key` without applying expiry.
    pub fn peek_entry(&self, key: &Bytes) -> Option<Entry> {
        self.get_shard(key).read().get(key).cloned()
    }

    /// Returns the number of resident entries, including expired ones not yet evicted.
    pub fn len(&self) -> u64 {
        self.key_count.load(Ordering::Relaxed)
    }

    /// Returns true if the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a snapshot of the operation counters.
    pub fn stats(&self) -> StorageStats {
        StorageStats {
            keys: self.key_count.load(Ordering::Relaxed),
            get_ops: self.get_count.load(Ordering::Relaxed),
            set_ops: self.set_count.load(Ordering::Relaxed),
            expired: self.expired_count.load(Ordering::Relaxed),
        }
    }
}

/// Storage statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageStats {
    pub keys: u64,
    pub get_ops: u64,
    pub set_ops: u64,
    pub expired: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn key(s: &str) -> Bytes {
        Bytes::from(s.to_string())
    }

    #[test]
    fn test_set_and_get() {
        let engine = StorageEngine::new();

        engine.set(key("key"), key("value"), None);
        assert_eq!(engine.get(&key("key")), Some(key("value")));
    }

    #[test]
    fn test_get_nonexistent() {
        let engine = StorageEngine::new();
        assert_eq!(engine.get(&key("nonexistent")), None);
        assert!(engine.is_empty());
    }

    #[test]
    fn test_set_reports_new_keys() {
        let engine = StorageEngine::new();

        assert!(engine.set(key("key"), key("v1"), None));
        assert!(!engine.set(key("key"), key("v2"), None));
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_expiry_evicts_on_read() {
        let engine = StorageEngine::new();
        let start = Instant::now();

        engine.set_at(key("key"), key("value"), Some(Duration::from_millis(100)), start);

        // Still live at the deadline itself
        let deadline = start + Duration::from_millis(100);
        assert_eq!(engine.get_at(&key("key"), deadline), Some(key("value")));

        let later = start + Duration::from_millis(150);
        assert!(engine.is_resident(&key("key")));
        assert_eq!(engine.get_at(&key("key"), later), None);

        // Physically gone, not just masked
        assert!(!engine.is_resident(&key("key")));
        assert_eq!(engine.get_at(&key("key"), later), None);
        assert_eq!(engine.len(), 0);
        assert_eq!(engine.stats().expired, 1);
    }

    #[test]
    fn test_expiry_with_real_clock() {
        let engine = StorageEngine::new();

        engine.set(key("key"), key("value"), Some(Duration::from_millis(50)));
        assert_eq!(engine.get(&key("key")), Some(key("value")));

        thread::sleep(Duration::from_millis(100));

        assert_eq!(engine.get(&key("key")), None);
        assert!(!engine.is_resident(&key("key")));
    }

    #[test]
    fn test_zero_ttl_never_expires() {
        let engine = StorageEngine::new();
        let start = Instant::now();

        engine.set_at(key("key"), key("value"), Some(Duration::ZERO), start);

        assert_eq!(engine.peek_entry(&key("key")).unwrap().expires_at, None);
        let much_later = start + Duration::from_secs(3600);
        assert_eq!(engine.get_at(&key("key"), much_later), Some(key("value")));
    }

    #[test]
    fn test_overwrite_discards_previous_expiry() {
        let engine = StorageEngine::new();
        let start = Instant::now();

        engine.set_at(key("key"), key("v1"), Some(Duration::from_millis(10)), start);
        engine.set_at(key("key"), key("v2"), None, start);

        let entry = engine.peek_entry(&key("key")).unwrap();
        assert_eq!(entry.value, key("v2"));
        assert_eq!(entry.expires_at, None);

        let later = start + Duration::from_secs(1);
        assert_eq!(engine.get_at(&key("key"), later), Some(key("v2")));
    }

    #[test]
    fn test_overwrite_of_expired_key_is_live() {
        let engine = StorageEngine::new();
        let start = Instant::now();

        engine.set_at(key("key"), key("old"), Some(Duration::from_millis(10)), start);
        let later = start + Duration::from_millis(50);
        engine.set_at(key("key"), key("new"), Some(Duration::from_millis(100)), later);

        assert_eq!(engine.get_at(&key("key"), later), Some(key("new")));
        assert_eq!(engine.stats().expired, 0);
    }

    #[test]
    fn test_stats() {
        let engine = StorageEngine::new();

        engine.set(key("a"), key("1"), None);
        engine.set(key("b"), key("2"), None);
        engine.get(&key("a"));
        engine.get(&key("missing"));

        let stats = engine.stats();
        assert_eq!(stats.keys, 2);
        assert_eq!(stats.set_ops, 2);
        assert_eq!(stats.get_ops, 2);
        assert_eq!(stats.expired, 0);
    }

    #[test]
    fn test_concurrent_sets_on_distinct_keys() {
        let engine = Arc::new(StorageEngine::new());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    for i in 0..1_000 {
                        engine.set(
                            Bytes::from(format!("key:{}:{}", t, i)),
                            Bytes::from(format!("value:{}:{}", t, i)),
                            None,
                        );
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(engine.len(), 8_000);
        for t in 0..8 {
            for i in 0..1_000 {
                assert_eq!(
                    engine.get(&Bytes::from(format!("key:{}:{}", t, i))),
                    Some(Bytes::from(format!("value:{}:{}", t, i)))
                );
            }
        }
    }

    #[test]
    fn test_concurrent_reads_of_expired_key_evict_once() {
        let engine = Arc::new(StorageEngine::new());
        let start = Instant::now();
        engine.set_at(key("key"), key("value"), Some(Duration::from_millis(1)), start);
        let later = start + Duration::from_secs(1);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || engine.get_at(&key("key"), later))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), None);
        }

        assert_eq!(engine.stats().expired, 1);
        assert_eq!(engine.len(), 0);
    }
}
