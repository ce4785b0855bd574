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

use std::{fmt::Debug, path::PathBuf, sync::Arc, time::Duration};

use bytecache_common::{
    error::Result,
    time::{MonotonicTimeSource, TimeSource},
};
use bytecache_memory::{
    sharded::ShardedStore,
    statistics::Statistics,
    store::{Store, StoreConfig, ValueRef},
    traits::{KvCache, ShardedKvCache},
};

use crate::config::CacheConfig;

/// Builder of [`Cache`].
#[derive(Debug, Clone)]
pub struct CacheBuilder {
    config: CacheConfig,
    time_source: Option<Arc<dyn TimeSource>>,
}

impl Default for CacheBuilder {
    fn default() -> Self {
        Self::from_config(CacheConfig::default())
    }
}

impl CacheBuilder {
    /// Create a builder with the given total slot count and defaults for everything else.
    pub fn new(capacity: usize) -> Self {
        Self::default().with_capacity(capacity)
    }

    /// Create a builder from a complete configuration.
    pub fn from_config(config: CacheConfig) -> Self {
        Self {
            config,
            time_source: None,
        }
    }

    /// Set the total slot count.
    ///
    /// The count is split evenly across shards, and each shard rounds its share up to a power of two.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    /// Set the total arena budget in bytes. 0 selects the lazy arena.
    pub fn with_arena_size(mut self, arena_size: usize) -> Self {
        self.config.arena_size = arena_size;
        self
    }

    /// Set the shard count. Entries will be distributed to different shards based on their digest.
    ///
    /// Operations on different shards can be parallelized.
    pub fn with_shards(mut self, shards: usize) -> Self {
        self.config.shards = shards;
        self
    }

    /// Set the ttl applied to writes with a zero ttl.
    pub fn with_default_ttl(mut self, default_ttl: Duration) -> Self {
        self.config.default_ttl = default_ttl;
        self
    }

    /// Enable or disable ttl enforcement.
    pub fn with_ttl(mut self, enable: bool) -> Self {
        self.config.enable_ttl = enable;
        self
    }

    /// Evict with the clock scan when a shard runs out of room. This is the default.
    pub fn with_eviction(mut self) -> Self {
        self.config.enable_eviction = true;
        self.config.reset_on_full = false;
        self
    }

    /// Drop the whole shard when it runs out of room.
    pub fn with_reset_on_full(mut self) -> Self {
        self.config.enable_eviction = false;
        self.config.reset_on_full = true;
        self
    }

    /// Allocate arena memory at construction.
    pub fn with_preallocate_arena(mut self, preallocate: bool) -> Self {
        self.config.preallocate_arena = preallocate;
        self
    }

    /// Set the chunk size of the lazy arena.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.config.chunk_size = chunk_size;
        self
    }

    /// Refuse every write and delete.
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.config.read_only = read_only;
        self
    }

    /// Compare key bytes on lookup instead of trusting 64-bit digest equality.
    pub fn with_verify_keys(mut self, verify_keys: bool) -> Self {
        self.config.verify_keys = verify_keys;
        self
    }

    /// Maintain operation counters, see [`Cache::statistics`].
    pub fn with_stats(mut self, enable: bool) -> Self {
        self.config.enable_stats = enable;
        self
    }

    /// Set the node id. Not used yet.
    pub fn with_node_id(mut self, node_id: impl Into<String>) -> Self {
        self.config.node_id = node_id.into();
        self
    }

    /// Request persistence into `data_dir`. Not implemented yet.
    pub fn with_persistence(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.config.enable_persistence = true;
        self.config.data_dir = Some(data_dir.into());
        self
    }

    /// Set the time source used for ttl bookkeeping.
    ///
    /// The default is a monotonic clock started at construction.
    pub fn with_time_source(mut self, time_source: Arc<dyn TimeSource>) -> Self {
        self.time_source = Some(time_source);
        self
    }

    /// Normalize and validate the configuration, then build the cache.
    ///
    /// Builds a single-shard cache if the shard count is at most 1, a sharded one otherwise.
    pub fn build(self) -> Result<Cache> {
        let config = self.config.apply_defaults();
        config.validate()?;

        if config.enable_sync {
            tracing::warn!(node_id = %config.node_id, "[cache]: sync is not implemented, ignored");
        }
        if config.enable_persistence {
            tracing::warn!(data_dir = ?config.data_dir, "[cache]: persistence is not implemented, ignored");
        }

        let store_config = StoreConfig {
            capacity: config.capacity,
            arena_size: config.arena_size,
            chunk_size: config.chunk_size,
            preallocate_arena: config.preallocate_arena,
            default_ttl: config.default_ttl,
            enable_ttl: config.enable_ttl,
            exhaustion: config.exhaustion(),
            read_only: config.read_only,
            verify_keys: config.verify_keys,
            enable_stats: config.enable_stats,
            time_source: self
                .time_source
                .unwrap_or_else(|| Arc::new(MonotonicTimeSource::default())),
        };

        let cache = match config.shards {
            0 | 1 => Cache::Single(Arc::new(Store::new(store_config)?)),
            shards => Cache::Sharded(Arc::new(ShardedStore::new(store_config, shards)?)),
        };

        tracing::info!(
            capacity = cache.capacity(),
            arena_size = config.arena_size,
            shards = cache.shards(),
            exhaustion = ?config.exhaustion(),
            "[cache]: cache built"
        );

        Ok(cache)
    }
}

/// An arena-backed byte cache, single-shard or sharded.
///
/// Cloning is cheap, clones share the same storage.
#[derive(Clone)]
pub enum Cache {
    /// A single [`Store`].
    Single(Arc<Store>),
    /// A [`ShardedStore`].
    Sharded(Arc<ShardedStore>),
}

impl Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(_) => f.debug_tuple("Cache::Single").finish(),
            Self::Sharded(_) => f.debug_tuple("Cache::Sharded").finish(),
        }
    }
}

impl Cache {
    /// Create a builder with the given total slot count.
    pub fn builder(capacity: usize) -> CacheBuilder {
        CacheBuilder::new(capacity)
    }

    /// Number of shards, 1 for a single-shard cache.
    pub fn shards(&self) -> usize {
        match self {
            Cache::Single(_) => 1,
            Cache::Sharded(cache) => cache.shards(),
        }
    }

    /// The sharded store, if the cache is sharded.
    pub fn as_sharded(&self) -> Option<&ShardedStore> {
        match self {
            Cache::Single(_) => None,
            Cache::Sharded(cache) => Some(cache.as_ref()),
        }
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        match self {
            Cache::Single(cache) => cache.capacity(),
            Cache::Sharded(cache) => cache.capacity(),
        }
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        match self {
            Cache::Single(cache) => cache.len(),
            Cache::Sharded(cache) => cache.len(),
        }
    }

    /// Check if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        match self {
            Cache::Single(cache) => cache.is_empty(),
            Cache::Sharded(cache) => cache.is_empty(),
        }
    }

    /// Check if the cache has been stopped.
    pub fn is_stopped(&self) -> bool {
        match self {
            Cache::Single(cache) => cache.is_stopped(),
            Cache::Sharded(cache) => cache.is_stopped(),
        }
    }

    /// Arena bytes in use.
    pub fn arena_usage(&self) -> usize {
        match self {
            Cache::Single(cache) => cache.arena_usage(),
            Cache::Sharded(cache) => cache.arena_usage(),
        }
    }

    /// Counters and occupancy of the cache.
    pub fn statistics(&self) -> Statistics {
        match self {
            Cache::Single(cache) => cache.statistics(),
            Cache::Sharded(cache) => cache.statistics(),
        }
    }
}

impl KvCache for Cache {
    fn set(&self, key: &[u8], value: &[u8], ttl: Duration) -> bool {
        match self {
            Cache::Single(cache) => cache.set(key, value, ttl),
            Cache::Sharded(cache) => cache.set(key, value, ttl),
        }
    }

    fn get(&self, key: &[u8]) -> Option<ValueRef<'_>> {
        match self {
            Cache::Single(cache) => cache.get(key),
            Cache::Sharded(cache) => cache.get(key),
        }
    }

    fn delete(&self, key: &[u8]) {
        match self {
            Cache::Single(cache) => cache.delete(key),
            Cache::Sharded(cache) => cache.delete(key),
        }
    }

    fn reset(&self) {
        match self {
            Cache::Single(cache) => cache.reset(),
            Cache::Sharded(cache) => cache.reset(),
        }
    }

    fn stop(&self) {
        match self {
            Cache::Single(cache) => cache.stop(),
            Cache::Sharded(cache) => cache.stop(),
        }
    }
}

#[cfg(test)]
mod tests {
    use bytecache_common::error::ErrorKind;

    use super::*;

    #[test]
    fn test_single_or_sharded() {
        let cache = CacheBuilder::new(64).with_arena_size(4096).build().unwrap();
        assert!(matches!(cache, Cache::Single(_)));
        assert_eq!(cache.shards(), 1);
        assert!(cache.as_sharded().is_none());

        let cache = CacheBuilder::new(64).with_arena_size(4096).with_shards(0).build().unwrap();
        assert!(matches!(cache, Cache::Single(_)));

        let cache = CacheBuilder::new(64).with_arena_size(4096).with_shards(4).build().unwrap();
        assert!(matches!(cache, Cache::Sharded(_)));
        assert_eq!(cache.shards(), 4);
        assert_eq!(cache.capacity(), 64);
    }

    #[test]
    fn test_invalid_config() {
        let err = CacheBuilder::new(64).with_shards(3).build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_clone_shares_storage() {
        let cache = CacheBuilder::new(16).with_arena_size(1024).build().unwrap();
        let clone = cache.clone();
        assert!(cache.set(b"a", b"1", Duration::ZERO));
        assert_eq!(clone.get_copied(b"a"), Some(b"1".to_vec()));
    }

    #[test_log::test]
    fn test_unimplemented_features_warn() {
        let cache = CacheBuilder::new(16)
            .with_arena_size(1024)
            .with_node_id("node-1")
            .with_persistence("/tmp/bytecache")
            .build()
            .unwrap();
        assert!(cache.set(b"a", b"1", Duration::ZERO));
    }
}
