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

//! Per-shard operation counters.
//!
//! Counters are updated inside the shard critical section but stored as atomics, so a snapshot can be read
//! without blocking writers. They are only maintained when statistics are enabled.

use std::{
    iter::Sum,
    ops::{Add, AddAssign},
    sync::atomic::{AtomicU64, Ordering},
};

use serde::{Deserialize, Serialize};

/// Event identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Lookup found a live entry.
    Hit,
    /// Lookup found nothing, or the store was stopped.
    Miss,
    /// A new key was written.
    Insert,
    /// An existing key was overwritten.
    Replace,
    /// An entry was deleted by the caller.
    Remove,
    /// An entry was dropped lazily because its ttl had passed.
    Expire,
    /// An entry was dropped by the clock scan.
    Evict,
    /// The whole shard was dropped because the arena or the table was full.
    Wipe,
    /// A write was refused.
    Reject,
}

const EVENTS: usize = 9;

#[derive(Debug, Default)]
pub(crate) struct Counters {
    enabled: bool,
    values: [AtomicU64; EVENTS],
}

impl Counters {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            values: Default::default(),
        }
    }

    #[inline]
    pub fn record(&self, event: Event) {
        if self.enabled {
            self.values[event as usize].fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    fn load(&self, event: Event) -> u64 {
        self.values[event as usize].load(Ordering::Relaxed)
    }
}

/// A point-in-time view of cache counters and occupancy.
///
/// Counters stay at zero unless statistics are enabled. Occupancy fields are always filled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    /// See [`Event::Hit`].
    pub hits: u64,
    /// See [`Event::Miss`].
    pub misses: u64,
    /// See [`Event::Insert`].
    pub inserts: u64,
    /// See [`Event::Replace`].
    pub replaces: u64,
    /// See [`Event::Remove`].
    pub removes: u64,
    /// See [`Event::Expire`].
    pub expirations: u64,
    /// See [`Event::Evict`].
    pub evictions: u64,
    /// See [`Event::Wipe`].
    pub wipes: u64,
    /// See [`Event::Reject`].
    pub rejections: u64,

    /// Occupied slots. May include expired entries not collected yet.
    pub entries: usize,
    /// Total slots.
    pub capacity: usize,
    /// Arena bytes between the start and the bump pointer.
    pub arena_usage: usize,
    /// Arena bytes backed by memory.
    pub arena_allocated: usize,
}

impl Statistics {
    pub(crate) fn from_counters(counters: &Counters) -> Self {
        Self {
            hits: counters.load(Event::Hit),
            misses: counters.load(Event::Miss),
            inserts: counters.load(Event::Insert),
            replaces: counters.load(Event::Replace),
            removes: counters.load(Event::Remove),
            expirations: counters.load(Event::Expire),
            evictions: counters.load(Event::Evict),
            wipes: counters.load(Event::Wipe),
            rejections: counters.load(Event::Reject),
            ..Default::default()
        }
    }

    /// Hit ratio of lookups, `None` before the first lookup.
    pub fn hit_ratio(&self) -> Option<f64> {
        match self.hits + self.misses {
            0 => None,
            total => Some(self.hits as f64 / total as f64),
        }
    }
}

impl AddAssign for Statistics {
    fn add_assign(&mut self, rhs: Self) {
        self.hits += rhs.hits;
        self.misses += rhs.misses;
        self.inserts += rhs.inserts;
        self.replaces += rhs.replaces;
        self.removes += rhs.removes;
        self.expirations += rhs.expirations;
        self.evictions += rhs.evictions;
        self.wipes += rhs.wipes;
        self.rejections += rhs.rejections;
        self.entries += rhs.entries;
        self.capacity += rhs.capacity;
        self.arena_usage += rhs.arena_usage;
        self.arena_allocated += rhs.arena_allocated;
    }
}

impl Add for Statistics {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl Sum for Statistics {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}
