//! Bounded LRU image cache with background population
//!
//! Entries are keyed by the item's image key. Ready entries sit in a
//! `PriorityQueue` ordered by access stamp so the least recently used one
//! pops first. Loads run as tokio tasks: they wait for a permit on a fair
//! semaphore, fetch the payload, decode on the blocking pool and install
//! the result only if the entry's ticket still matches (last-write-wins).
//! The owner learns about completions and disposals through [`CacheEvent`]s.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use log::{debug, trace, warn};
use parking_lot::Mutex;
use priority_queue::PriorityQueue;
use tokio::runtime::Handle;
use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;

use super::{ImageDecoder, ImageHandle, ImageKey};
use crate::error::ImageError;

/// Lazily evaluated raw payload of one image.
pub type PayloadFuture = BoxFuture<'static, Result<Vec<u8>, ImageError>>;

/// Notifications from the cache to its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEvent<K> {
    /// A load finished and the image is now resident.
    Ready { key: K },
    /// A load failed; the entry stays failed until requested again.
    Failed { key: K, error: ImageError },
    /// A ready image left the cache. Its handle must be released on the
    /// render side.
    Evicted { key: K, handle: ImageHandle },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Absent,
    Loading,
    Ready,
    Failed,
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub loads_started: u64,
    pub evictions: u64,
    /// Completions dropped because their token was cancelled or a newer
    /// request replaced the entry.
    pub stale_discards: u64,
    pub failures: u64,
}

#[derive(Debug)]
enum EntryState {
    Loading {
        ticket: u64,
        token: CancellationToken,
    },
    Ready(ImageHandle),
    Failed(ImageError),
}

#[derive(Debug)]
enum LoadOutcome {
    Decoded(ImageHandle),
    Failed(ImageError),
    Cancelled,
}

struct Inner<K: ImageKey> {
    entries: HashMap<K, EntryState>,
    lru: PriorityQueue<K, Reverse<u64>>,
    clock: u64,
    next_ticket: u64,
    capacity: usize,
    stats: CacheStats,
}

impl<K: ImageKey> Inner<K> {
    fn stamp(&mut self) -> Reverse<u64> {
        self.clock += 1;
        Reverse(self.clock)
    }

    fn evict_over_capacity(&mut self, events: &mut Vec<CacheEvent<K>>) -> usize {
        let mut evicted = 0;
        while self.lru.len() > self.capacity {
            let Some((key, _)) = self.lru.pop() else {
                break;
            };
            if let Some(EntryState::Ready(handle)) = self.entries.remove(&key) {
                trace!("Evicting {:?} (LRU)", key);
                events.push(CacheEvent::Evicted { key, handle });
                evicted += 1;
            }
        }
        self.stats.evictions += evicted as u64;
        evicted
    }

    fn ready(&self, key: &K) -> Option<ImageHandle> {
        match self.entries.get(key) {
            Some(EntryState::Ready(handle)) => Some(handle.clone()),
            _ => None,
        }
    }

    fn complete(
        &mut self,
        key: K,
        ticket: u64,
        outcome: LoadOutcome,
        events: &mut Vec<CacheEvent<K>>,
    ) {
        let current = matches!(
            self.entries.get(&key),
            Some(EntryState::Loading { ticket: live, .. }) if *live == ticket
        );
        if !current {
            trace!("Discarding stale load for {:?}", key);
            self.stats.stale_discards += 1;
            return;
        }

        match outcome {
            LoadOutcome::Decoded(handle) => {
                self.entries.insert(key.clone(), EntryState::Ready(handle));
                let stamp = self.stamp();
                self.lru.push(key.clone(), stamp);
                events.push(CacheEvent::Ready { key });
                self.evict_over_capacity(events);
            }
            LoadOutcome::Failed(error) => {
                warn!("Image load failed for {:?}: {}", key, error);
                self.stats.failures += 1;
                self.entries
                    .insert(key.clone(), EntryState::Failed(error.clone()));
                events.push(CacheEvent::Failed { key, error });
            }
            LoadOutcome::Cancelled => {
                trace!("Load for {:?} cancelled", key);
                self.stats.stale_discards += 1;
                self.entries.remove(&key);
            }
        }
    }
}

/// Shared LRU image cache. Cloning yields another handle to the same cache.
#[derive(Clone)]
pub struct ImageCache<K: ImageKey> {
    inner: Arc<Mutex<Inner<K>>>,
    runtime: Handle,
    permits: Arc<Semaphore>,
    decoder: Arc<dyn ImageDecoder>,
    events: mpsc::UnboundedSender<CacheEvent<K>>,
}

impl<K: ImageKey> fmt::Debug for ImageCache<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("ImageCache")
            .field("len", &inner.lru.len())
            .field("entries", &inner.entries.len())
            .field("capacity", &inner.capacity)
            .field("stats", &inner.stats)
            .finish_non_exhaustive()
    }
}

impl<K: ImageKey> ImageCache<K> {
    /// Create a cache holding at most `capacity` decoded images with up to
    /// `max_concurrent_loads` loads in flight on `runtime`.
    pub fn new(
        capacity: usize,
        max_concurrent_loads: usize,
        decoder: Arc<dyn ImageDecoder>,
        runtime: Handle,
    ) -> (Self, mpsc::UnboundedReceiver<CacheEvent<K>>) {
        let (events, rx) = mpsc::unbounded_channel();
        let cache = Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: HashMap::new(),
                lru: PriorityQueue::new(),
                clock: 0,
                next_ticket: 0,
                capacity,
                stats: CacheStats::default(),
            })),
            runtime,
            permits: Arc::new(Semaphore::new(max_concurrent_loads.max(1))),
            decoder,
            events,
        };
        (cache, rx)
    }

    /// Resident image for `key`. Recorded in [`CacheStats`] as a hit or a
    /// miss; does not promote the entry.
    pub fn get(&self, key: &K) -> Option<ImageHandle> {
        let mut inner = self.inner.lock();
        let handle = inner.ready(key);
        if handle.is_some() {
            inner.stats.hits += 1;
        } else {
            inner.stats.misses += 1;
        }
        handle
    }

    /// Like [`Self::get`] but left out of the statistics. For the owner's
    /// own bookkeeping.
    pub fn peek(&self, key: &K) -> Option<ImageHandle> {
        self.inner.lock().ready(key)
    }

    /// Schedule background population of `key`.
    ///
    /// No-op (returns false) when the key is ready or already loading under
    /// a live token, or when `loader` has no payload. Otherwise `loader` is
    /// invoked exactly once and the load runs under `token`.
    pub fn request<F>(&self, key: K, token: &CancellationToken, loader: F) -> bool
    where
        F: FnOnce() -> Option<PayloadFuture>,
    {
        let ticket = {
            let mut inner = self.inner.lock();
            match inner.entries.get(&key) {
                Some(EntryState::Ready(_)) => return false,
                Some(EntryState::Loading { token, .. }) if !token.is_cancelled() => {
                    return false;
                }
                _ => {}
            }
            inner.next_ticket += 1;
            let ticket = inner.next_ticket;
            inner.entries.insert(
                key.clone(),
                EntryState::Loading {
                    ticket,
                    token: token.clone(),
                },
            );
            ticket
        };

        let Some(payload) = loader() else {
            let mut inner = self.inner.lock();
            if matches!(
                inner.entries.get(&key),
                Some(EntryState::Loading { ticket: live, .. }) if *live == ticket
            ) {
                inner.entries.remove(&key);
            }
            return false;
        };

        self.inner.lock().stats.loads_started += 1;
        trace!("Scheduling load for {:?} (ticket {})", key, ticket);

        let inner = Arc::clone(&self.inner);
        let permits = Arc::clone(&self.permits);
        let decoder = Arc::clone(&self.decoder);
        let events = self.events.clone();
        let token = token.clone();
        self.runtime.spawn(async move {
            let outcome = load(payload, &token, permits, decoder).await;
            let mut pending = Vec::new();
            inner.lock().complete(key, ticket, outcome, &mut pending);
            for event in pending {
                if events.send(event).is_err() {
                    trace!("Cache event dropped, receiver closed");
                    break;
                }
            }
        });
        true
    }

    /// Mark `key` as most recently used. Returns false if it is not ready.
    pub fn touch(&self, key: &K) -> bool {
        let mut inner = self.inner.lock();
        if !inner.lru.contains(key) {
            return false;
        }
        let stamp = inner.stamp();
        inner.lru.change_priority(key, stamp);
        true
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }

    /// Change the bound and evict down to it.
    pub fn set_capacity(&self, capacity: usize) -> usize {
        self.inner.lock().capacity = capacity;
        self.evict_if_over_capacity()
    }

    /// Evict least recently used images until the bound holds. Returns how
    /// many were evicted.
    pub fn evict_if_over_capacity(&self) -> usize {
        let mut pending = Vec::new();
        let evicted = self.inner.lock().evict_over_capacity(&mut pending);
        self.emit(pending);
        evicted
    }

    /// Drop `key` in whatever state it is in. A load in flight for it is
    /// discarded when it completes.
    pub fn remove(&self, key: &K) -> bool {
        let removed = {
            let mut inner = self.inner.lock();
            inner.lru.remove(key);
            inner.entries.remove(key)
        };
        match removed {
            Some(EntryState::Ready(handle)) => {
                self.emit(vec![CacheEvent::Evicted {
                    key: key.clone(),
                    handle,
                }]);
                true
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Drop everything. Ready images are reported as evicted.
    pub fn clear(&self) -> usize {
        let drained: Vec<_> = {
            let mut inner = self.inner.lock();
            inner.lru.clear();
            inner.entries.drain().collect()
        };
        let mut pending = Vec::new();
        for (key, state) in drained {
            if let EntryState::Ready(handle) = state {
                pending.push(CacheEvent::Evicted { key, handle });
            }
        }
        let count = pending.len();
        debug!("Image cache cleared ({} ready images released)", count);
        self.emit(pending);
        count
    }

    pub fn status(&self, key: &K) -> EntryStatus {
        match self.inner.lock().entries.get(key) {
            None => EntryStatus::Absent,
            Some(EntryState::Loading { .. }) => EntryStatus::Loading,
            Some(EntryState::Ready(_)) => EntryStatus::Ready,
            Some(EntryState::Failed(_)) => EntryStatus::Failed,
        }
    }

    /// Error of a failed entry.
    pub fn failure(&self, key: &K) -> Option<ImageError> {
        match self.inner.lock().entries.get(key) {
            Some(EntryState::Failed(error)) => Some(error.clone()),
            _ => None,
        }
    }

    /// Number of ready images.
    pub fn len(&self) -> usize {
        self.inner.lock().lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Loads currently in flight.
    pub fn loading(&self) -> usize {
        self.inner
            .lock()
            .entries
            .values()
            .filter(|state| matches!(state, EntryState::Loading { .. }))
            .count()
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats
    }

    fn emit(&self, pending: Vec<CacheEvent<K>>) {
        for event in pending {
            if self.events.send(event).is_err() {
                trace!("Cache event dropped, receiver closed");
                break;
            }
        }
    }
}

async fn load(
    payload: PayloadFuture,
    token: &CancellationToken,
    permits: Arc<Semaphore>,
    decoder: Arc<dyn ImageDecoder>,
) -> LoadOutcome {
    let _permit = tokio::select! {
        biased;
        _ = token.cancelled() => return LoadOutcome::Cancelled,
        permit = permits.acquire_owned() => match permit {
            Ok(permit) => permit,
            Err(err) => return LoadOutcome::Failed(ImageError::Worker(err.to_string())),
        },
    };

    let bytes = tokio::select! {
        biased;
        _ = token.cancelled() => return LoadOutcome::Cancelled,
        bytes = payload => bytes,
    };
    let bytes = match bytes {
        Ok(bytes) => bytes,
        Err(err) => return LoadOutcome::Failed(err),
    };
    if token.is_cancelled() {
        return LoadOutcome::Cancelled;
    }

    let decoded = tokio::task::spawn_blocking(move || decoder.decode(&bytes)).await;
    if token.is_cancelled() {
        return LoadOutcome::Cancelled;
    }
    match decoded {
        Ok(Ok(handle)) => LoadOutcome::Decoded(handle),
        Ok(Err(err)) => LoadOutcome::Failed(err),
        Err(join) => LoadOutcome::Failed(join.into()),
    }
}
