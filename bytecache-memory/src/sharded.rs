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

use std::time::Duration;

use bytecache_common::{
    bits,
    error::{Error, Result},
};

use crate::{
    slot::digest,
    statistics::Statistics,
    store::{Store, StoreConfig, ValueRef},
    traits::{KvCache, ShardedKvCache},
};

/// A cache partitioned into independently locked [`Store`] shards.
///
/// Capacity and arena budget are split evenly across the shards, the remainder is dropped. A key is always routed
/// to shard `digest & (shards - 1)`, so routing is stable for a fixed shard count.
#[derive(Debug)]
pub struct ShardedStore {
    shards: Vec<Store>,
    mask: u64,
}

impl ShardedStore {
    /// Create a sharded cache from the totals in `config`.
    ///
    /// `shards` must be a power of two, and every shard must receive at least one slot and, unless the lazy arena
    /// is selected, at least one arena byte.
    pub fn new(config: StoreConfig, shards: usize) -> Result<Self> {
        if shards == 0 || !bits::is_pow2(shards) {
            return Err(Error::config("shards must be a power of two").with_context("shards", shards));
        }

        let capacity = config.capacity / shards;
        if capacity == 0 {
            return Err(Error::config("capacity must be at least the number of shards")
                .with_context("capacity", config.capacity)
                .with_context("shards", shards));
        }
        let arena_size = config.arena_size / shards;
        if config.arena_size > 0 && arena_size == 0 {
            return Err(Error::config("arena size must be at least the number of shards")
                .with_context("arena_size", config.arena_size)
                .with_context("shards", shards));
        }

        // The low bits pick the shard, the slot index starts above them.
        let shift = shards.trailing_zeros();
        let shards = (0..shards)
            .map(|_| {
                Store::with_hash_shift(
                    StoreConfig {
                        capacity,
                        arena_size,
                        ..config.clone()
                    },
                    shift,
                )
            })
            .collect::<Result<Vec<_>>>()?;
        let mask = shards.len() as u64 - 1;

        Ok(Self { shards, mask })
    }

    /// Index of the shard `key` is routed to.
    pub fn shard_index(&self, key: &[u8]) -> usize {
        (digest(key) & self.mask) as usize
    }

    /// Total number of slots across all shards.
    pub fn capacity(&self) -> usize {
        self.shards.iter().map(|shard| shard.capacity()).sum()
    }

    /// Total number of occupied slots across all shards.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.len()).sum()
    }

    /// Check if every shard is empty.
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| shard.is_empty())
    }

    /// Check if the cache has been stopped.
    pub fn is_stopped(&self) -> bool {
        self.shards.iter().all(|shard| shard.is_stopped())
    }

    /// Total arena bytes in use across all shards.
    pub fn arena_usage(&self) -> usize {
        self.shards.iter().map(|shard| shard.arena_usage()).sum()
    }

    /// Counters and occupancy summed over all shards.
    pub fn statistics(&self) -> Statistics {
        self.shards.iter().map(|shard| shard.statistics()).sum()
    }
}

impl KvCache for ShardedStore {
    fn set(&self, key: &[u8], value: &[u8], ttl: Duration) -> bool {
        self.shard(key).set(key, value, ttl)
    }

    fn get(&self, key: &[u8]) -> Option<ValueRef<'_>> {
        self.shard(key).get(key)
    }

    fn delete(&self, key: &[u8]) {
        self.shard(key).delete(key)
    }

    fn reset(&self) {
        self.shards.iter().for_each(|shard| shard.reset());
    }

    fn stop(&self) {
        self.shards.iter().for_each(|shard| shard.stop());
    }
}

impl ShardedKvCache for ShardedStore {
    fn shards(&self) -> usize {
        self.shards.len()
    }

    fn shard(&self, key: &[u8]) -> &Store {
        &self.shards[self.shard_index(key)]
    }

    fn for_each_shard<F>(&self, mut f: F)
    where
        F: FnMut(usize, &Store),
    {
        self.shards.iter().enumerate().for_each(|(index, shard)| f(index, shard));
    }
}
