//! Capture store: keyed, time-bounded lists of captured requests.

use super::types::{CapturedRequest, StoreError};
use crate::metrics;
use bytes::Bytes;
use dashmap::DashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

/// Requests stored under one key
#[derive(Debug)]
struct StoreEntry {
    /// Serialized snapshots in insertion order. Encoding at write time
    /// freezes the snapshot and keeps reads to cheap `Bytes` clones.
    requests: Vec<Bytes>,
    expires_at: Instant,
}

impl StoreEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Concurrent TTL store for captured requests.
///
/// Every append refreshes the whole entry's expiry to `now + ttl`. Expired
/// entries are invisible to readers immediately and physically removed by
/// [`CaptureStore::purge_expired`], which the task from
/// [`CaptureStore::spawn_cleanup`] runs periodically.
pub struct CaptureStore {
    entries: DashMap<String, StoreEntry>,
    ttl: Duration,
}

impl CaptureStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get the captured requests for `key` in insertion order
    pub fn get(&self, key: &str) -> Result<Option<Vec<CapturedRequest>>, StoreError> {
        // Clone out of the shard guard so decoding never holds the lock
        let encoded = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(Instant::now()) => entry.requests.clone(),
            _ => return Ok(None),
        };
        decode_all(&encoded).map(Some)
    }

    /// Append a captured request under `key`
    pub fn append(&self, key: &str, request: &CapturedRequest) -> Result<(), StoreError> {
        let encoded = serde_json::to_vec(request).map_err(StoreError::Encode)?;
        self.append_encoded(key, Bytes::from(encoded));
        Ok(())
    }

    /// Append an already serialized snapshot under `key`.
    ///
    /// The map entry stays locked for the whole read-modify-write, so
    /// concurrent appends to the same key cannot drop each other's writes.
    pub fn append_encoded(&self, key: &str, encoded: Bytes) {
        let now = Instant::now();
        let expires_at = now + self.ttl;

        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| StoreEntry {
                requests: Vec::new(),
                expires_at,
            });

        // An expired entry the sweep has not reached yet starts over
        if entry.is_expired(now) {
            entry.requests.clear();
        }
        entry.requests.push(encoded);
        entry.expires_at = expires_at;
    }

    /// Get the captured requests of every live key, one list per key
    pub fn all(&self) -> Result<Vec<Vec<CapturedRequest>>, StoreError> {
        let now = Instant::now();
        let encoded: Vec<Vec<Bytes>> = self
            .entries
            .iter()
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.requests.clone())
            .collect();

        encoded.iter().map(|requests| decode_all(requests)).collect()
    }

    /// Remove every expired entry, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let keep = !entry.is_expired(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    /// Number of keys held, including expired entries not yet purged
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear all entries
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Start the background sweep.
    ///
    /// The task only holds a weak reference and exits once the store is
    /// dropped. The first sweep runs one `interval` after the call.
    pub fn spawn_cleanup(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let store: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(store) = store.upgrade() else {
                    debug!("Capture store dropped, stopping cleanup");
                    break;
                };

                let removed = store.purge_expired();
                if removed > 0 {
                    debug!("Evicted {} expired store entries", removed);
                }
                metrics::record_store_sweep(removed, store.len());
            }
        })
    }
}

fn decode_all(encoded: &[Bytes]) -> Result<Vec<CapturedRequest>, StoreError> {
    encoded
        .iter()
        .map(|bytes| serde_json::from_slice(bytes).map_err(StoreError::Decode))
        .collect()
}
