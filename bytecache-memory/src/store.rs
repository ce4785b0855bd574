// Copyright 2026 bytecache Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{fmt::Debug, ops::Deref, sync::Arc, time::Duration};

use bytecache_common::{
    error::{Error, ErrorKind, Result},
    strict_assert,
    time::{MonotonicTimeSource, TimeSource},
};
use itertools::Itertools;
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use serde::{Deserialize, Serialize};

use crate::{
    arena::Arena,
    slot::{digest, Probe, Slot, SlotTable},
    statistics::{Counters, Event, Statistics},
    traits::KvCache,
};

/// What a shard does when a write finds no room in its arena or its slot table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionPolicy {
    /// Evict entries with the clock (second-chance) scan and compact the arena until the new entry fits.
    ///
    /// The write succeeds unless the entry is larger than the arena.
    #[default]
    Evict,
    /// Drop every entry of the shard and rewind its arena.
    ///
    /// The write that hit the limit reports failure and may be retried.
    ResetOnFull,
}

/// Configuration of a single shard.
///
/// The values are taken as-is: defaulting and validation belong to the caller.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Requested slot count, rounded up to the next power of two.
    pub capacity: usize,
    /// Arena budget in bytes. 0 selects the lazy chunked arena.
    pub arena_size: usize,
    /// Chunk size of the lazy arena. 0 selects the default chunk size.
    pub chunk_size: usize,
    /// Allocate arena memory at construction instead of on first use.
    pub preallocate_arena: bool,
    /// Ttl applied to writes with a zero ttl.
    pub default_ttl: Duration,
    /// If disabled, entries never expire.
    pub enable_ttl: bool,
    /// See [`ExhaustionPolicy`].
    pub exhaustion: ExhaustionPolicy,
    /// Refuse every write and delete.
    pub read_only: bool,
    /// Compare key bytes in addition to digests.
    ///
    /// If disabled, two keys with the same 64-bit digest are treated as the same key.
    pub verify_keys: bool,
    /// Maintain operation counters.
    pub enable_stats: bool,
    /// Source of timestamps for ttl bookkeeping.
    pub time_source: Arc<dyn TimeSource>,
}

impl StoreConfig {
    /// Create a config with the given capacity and arena size, and defaults for everything else.
    pub fn new(capacity: usize, arena_size: usize) -> Self {
        Self {
            capacity,
            arena_size,
            chunk_size: 0,
            preallocate_arena: false,
            default_ttl: Duration::ZERO,
            enable_ttl: true,
            exhaustion: ExhaustionPolicy::default(),
            read_only: false,
            verify_keys: false,
            enable_stats: false,
            time_source: Arc::new(MonotonicTimeSource::default()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Active,
    Stopped,
}

#[derive(Debug)]
struct StoreInner {
    table: SlotTable,
    arena: Arena,
    /// Clock hand for eviction.
    hand: usize,
    state: State,

    /// Occupied slots.
    len: usize,
    /// Arena bytes referenced by occupied slots.
    live_bytes: usize,

    exhaustion: ExhaustionPolicy,
    verify_keys: bool,
}

impl StoreInner {
    fn probe(&self, hash: u64, key: &[u8]) -> Probe {
        let arena = &self.arena;
        let verify_keys = self.verify_keys;
        self.table.probe(hash, |slot| {
            !verify_keys || arena.slice(slot.key_offset, slot.key_len as u32) == key
        })
    }

    fn lookup(&mut self, hash: u64, key: &[u8], now: u64, counters: &Counters) -> Option<usize> {
        let index = match self.probe(hash, key) {
            Probe::Found(index) => index,
            Probe::Vacant(_) | Probe::Full => {
                counters.record(Event::Miss);
                return None;
            }
        };

        if self.table.get(index).is_expired(now) {
            self.remove(index);
            counters.record(Event::Expire);
            counters.record(Event::Miss);
            return None;
        }

        counters.record(Event::Hit);
        Some(index)
    }

    fn insert(&mut self, hash: u64, key: &[u8], value: &[u8], expire: u64, counters: &Counters) -> bool {
        let key_len = key.len() as u32;
        let value_len = value.len() as u32;
        let weight = key_len + value_len;

        if weight > self.arena.max_allocation() {
            return false;
        }

        let mut replacing = false;
        loop {
            let index = match self.probe(hash, key) {
                Probe::Found(index) | Probe::Vacant(index) => index,
                Probe::Full => match self.reclaim(None, counters) {
                    true => continue,
                    false => return false,
                },
            };

            let Some(key_offset) = self.arena.allocate(weight) else {
                if !self.table.get(index).is_empty() {
                    // The old value is going to be replaced, it must not hold arena space while reclaiming.
                    self.remove(index);
                    replacing = true;
                    continue;
                }
                match self.reclaim(Some(weight), counters) {
                    true => continue,
                    false => return false,
                }
            };
            let value_offset = key_offset + key_len;

            self.arena.slice_mut(key_offset, key_len).copy_from_slice(key);
            self.arena.slice_mut(value_offset, value_len).copy_from_slice(value);

            let slot = self.table.get_mut(index);
            if slot.is_empty() {
                self.len += 1;
            } else {
                self.live_bytes -= slot.weight();
                replacing = true;
            }
            *slot = Slot {
                hash,
                expire,
                key_offset,
                value_offset,
                value_len,
                key_len: key_len as u16,
                used: true,
            };
            self.live_bytes += weight as usize;

            counters.record(if replacing { Event::Replace } else { Event::Insert });
            return true;
        }
    }

    /// Make room for a write, `need` is `None` if the table is full and `Some(bytes)` if the arena is.
    ///
    /// Returns true if the write should be retried.
    fn reclaim(&mut self, need: Option<u32>, counters: &Counters) -> bool {
        match self.exhaustion {
            ExhaustionPolicy::ResetOnFull => {
                tracing::debug!(
                    entries = self.len,
                    arena_usage = self.arena.usage(),
                    "[store]: no room left, wipe shard"
                );
                self.wipe();
                counters.record(Event::Wipe);
                false
            }
            ExhaustionPolicy::Evict => match need {
                None => self.evict(counters),
                Some(need) => self.reclaim_bytes(need as usize, counters),
            },
        }
    }

    fn reclaim_bytes(&mut self, need: usize, counters: &Counters) -> bool {
        let capacity = self.arena.capacity();
        let before = self.arena.usage();

        // Garbage left by deletes, overwrites and expirations may already be enough.
        if self.live_bytes + need <= capacity {
            self.compact();
            if self.arena.usage() < before {
                return true;
            }
        }

        if self.len == 0 {
            return false;
        }
        let mut evicted = false;
        while self.len > 0 && (!evicted || self.live_bytes + need > capacity) {
            evicted |= self.evict(counters);
        }
        self.compact();
        true
    }

    /// Evict one entry with the clock (second-chance) scan.
    fn evict(&mut self, counters: &Counters) -> bool {
        if self.len == 0 {
            return false;
        }
        loop {
            let index = self.hand;
            let slot = self.table.get_mut(index);
            if !slot.is_empty() {
                if !slot.used {
                    let victim = self.remove(index);
                    tracing::trace!(index, hash = victim.hash, "[store]: evict");
                    counters.record(Event::Evict);
                    return true;
                }
                slot.used = false;
            }
            self.hand = self.table.next(index);
        }
    }

    /// Slide live key/value bytes to the front of the arena and rewrite their offsets.
    fn compact(&mut self) {
        let before = self.arena.usage();
        let live = self
            .table
            .iter()
            .map(|(index, slot)| (slot.key_offset, slot.weight() as u32, index))
            .sorted_unstable()
            .collect_vec();

        self.arena.reset();
        for (from, weight, index) in live {
            let slot = self.table.get_mut(index);
            // Live ranges are disjoint and visited in address order, so each one moves down or stays. An empty
            // range may share its offset with the range after it and must be visited first.
            let Some(to) = self.arena.allocate(weight) else {
                unreachable!("compaction never needs more room than the live ranges it moves");
            };
            strict_assert!(to <= from);
            self.arena.relocate(from, to, weight);
            slot.key_offset = to;
            slot.value_offset = to + slot.key_len as u32;
        }
        strict_assert!(self.arena.usage() <= before);

        tracing::debug!(
            before,
            after = self.arena.usage(),
            entries = self.len,
            "[store]: compact arena"
        );
    }

    fn remove(&mut self, index: usize) -> Slot {
        let slot = self.table.remove(index);
        self.len -= 1;
        self.live_bytes -= slot.weight();
        slot
    }

    fn wipe(&mut self) {
        self.table.clear();
        self.arena.reset();
        self.hand = 0;
        self.len = 0;
        self.live_bytes = 0;
    }
}

/// A read-only view of a value inside the arena.
///
/// The view holds the shard lock: every other operation on the same shard blocks until the view is dropped. Keep
/// it short-lived, never call into the same cache while holding it, and copy the bytes out (e.g. with
/// [`KvCache::get_copied`]) to keep them longer.
pub struct ValueRef<'a> {
    inner: MappedMutexGuard<'a, [u8]>,
}

impl Deref for ValueRef<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl AsRef<[u8]> for ValueRef<'_> {
    fn as_ref(&self) -> &[u8] {
        self
    }
}

impl Debug for ValueRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ValueRef").field(&self.deref()).finish()
    }
}

/// A single-shard cache.
///
/// Owns one slot table, one arena and one clock hand, all guarded by a single mutex. Every operation holds the lock
/// for its whole critical section, including the stopped check.
pub struct Store {
    inner: Mutex<StoreInner>,

    default_ttl: Duration,
    enable_ttl: bool,
    read_only: bool,
    time_source: Arc<dyn TimeSource>,

    counters: Counters,
}

impl Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("default_ttl", &self.default_ttl)
            .field("enable_ttl", &self.enable_ttl)
            .field("read_only", &self.read_only)
            .finish()
    }
}

impl Store {
    /// Create a single-shard cache.
    pub fn new(config: StoreConfig) -> Result<Self> {
        Self::with_hash_shift(config, 0)
    }

    /// Create a shard whose slot index skips the lowest `shift` digest bits.
    pub(crate) fn with_hash_shift(config: StoreConfig, shift: u32) -> Result<Self> {
        let arena = match config.arena_size {
            0 => {
                let chunk_size = u32::try_from(config.chunk_size).map_err(|_| {
                    Error::new(ErrorKind::OutOfRange, "arena chunk size must fit in 32 bits")
                        .with_context("chunk_size", config.chunk_size)
                })?;
                Arena::lazy(chunk_size, config.preallocate_arena)
            }
            arena_size => {
                let arena_size = u32::try_from(arena_size).map_err(|_| {
                    Error::new(ErrorKind::OutOfRange, "shard arena size must fit in 32 bits")
                        .with_context("arena_size", arena_size)
                })?;
                Arena::fixed(arena_size, config.preallocate_arena)
            }
        };

        let inner = StoreInner {
            table: SlotTable::new(config.capacity, shift),
            arena,
            hand: 0,
            state: State::Active,
            len: 0,
            live_bytes: 0,
            exhaustion: config.exhaustion,
            verify_keys: config.verify_keys,
        };

        Ok(Self {
            inner: Mutex::new(inner),
            default_ttl: config.default_ttl,
            enable_ttl: config.enable_ttl,
            read_only: config.read_only,
            time_source: config.time_source,
            counters: Counters::new(config.enable_stats),
        })
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.inner.lock().table.size()
    }

    /// Number of occupied slots, including expired entries that have not been collected yet.
    pub fn len(&self) -> usize {
        self.inner.lock().len
    }

    /// Check if there are no occupied slots.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if the store has been stopped.
    pub fn is_stopped(&self) -> bool {
        self.inner.lock().state == State::Stopped
    }

    /// Arena bytes between the start and the bump pointer.
    pub fn arena_usage(&self) -> usize {
        self.inner.lock().arena.usage()
    }

    /// Counters and occupancy of the store.
    pub fn statistics(&self) -> Statistics {
        let inner = self.inner.lock();
        Statistics {
            entries: inner.len,
            capacity: inner.table.size(),
            arena_usage: inner.arena.usage(),
            arena_allocated: inner.arena.allocated(),
            ..Statistics::from_counters(&self.counters)
        }
    }

    fn expire_at(&self, ttl: Duration) -> u64 {
        if !self.enable_ttl {
            return 0;
        }
        let ttl = if ttl.is_zero() { self.default_ttl } else { ttl };
        self.time_source.expire_at(ttl)
    }
}

impl KvCache for Store {
    fn set(&self, key: &[u8], value: &[u8], ttl: Duration) -> bool {
        let hash = digest(key);

        let mut inner = self.inner.lock();

        let fits = key.len() <= u16::MAX as usize && key.len() + value.len() <= u32::MAX as usize;
        if inner.state == State::Stopped || self.read_only || !fits {
            self.counters.record(Event::Reject);
            return false;
        }

        let expire = self.expire_at(ttl);
        let inserted = inner.insert(hash, key, value, expire, &self.counters);
        if !inserted {
            self.counters.record(Event::Reject);
        }
        strict_assert!(inner.live_bytes <= inner.arena.usage());
        inserted
    }

    fn get(&self, key: &[u8]) -> Option<ValueRef<'_>> {
        let hash = digest(key);

        let mut inner = self.inner.lock();

        if inner.state == State::Stopped {
            self.counters.record(Event::Miss);
            return None;
        }

        let now = self.time_source.now();
        let index = inner.lookup(hash, key, now, &self.counters)?;

        let slot = inner.table.get_mut(index);
        slot.used = true;
        let (offset, len) = (slot.value_offset, slot.value_len);

        Some(ValueRef {
            inner: MutexGuard::map(inner, |inner| inner.arena.slice_mut(offset, len)),
        })
    }

    fn delete(&self, key: &[u8]) {
        let hash = digest(key);

        let mut inner = self.inner.lock();

        if inner.state == State::Stopped || self.read_only {
            return;
        }
        if let Probe::Found(index) = inner.probe(hash, key) {
            inner.remove(index);
            self.counters.record(Event::Remove);
        }
    }

    fn reset(&self) {
        self.inner.lock().wipe();
    }

    fn stop(&self) {
        self.inner.lock().state = State::Stopped;
    }
}
