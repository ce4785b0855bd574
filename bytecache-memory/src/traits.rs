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

use crate::store::{Store, ValueRef};

/// The operation surface shared by single-shard and sharded caches.
///
/// Implementations may be single-shard or sharded, but must obey the same semantic contract.
pub trait KvCache: Send + Sync + 'static {
    /// Insert or overwrite the value of `key`.
    ///
    /// A zero `ttl` applies the configured default ttl. Returns false if the value was not stored, e.g. the cache is
    /// stopped or read-only, or there was no room for it.
    fn set(&self, key: &[u8], value: &[u8], ttl: Duration) -> bool;

    /// Get a read-only view of the value of `key`.
    ///
    /// The view borrows the cache internals; see [`ValueRef`] for the rules of holding it.
    fn get(&self, key: &[u8]) -> Option<ValueRef<'_>>;

    /// Remove `key`. No-op if the key does not exist.
    fn delete(&self, key: &[u8]);

    /// Drop every entry. The cache stays usable unless stopped.
    fn reset(&self);

    /// Permanently disable the cache.
    fn stop(&self);

    /// Get an owned copy of the value of `key`.
    fn get_copied(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.get(key).map(|value| value.to_vec())
    }

    /// Check if a live entry exists for `key`.
    fn contains(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Insert pairs from `keys` and `values` in order, up to the length of the shorter one.
    ///
    /// Each pair is inserted independently with the semantics of [`KvCache::set`]. Returns the number of pairs
    /// stored.
    fn load_bulk<K, V>(&self, keys: &[K], values: &[V], ttl: Duration) -> usize
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        keys.iter()
            .zip(values.iter())
            .filter(|(key, value)| self.set(key.as_ref(), value.as_ref(), ttl))
            .count()
    }
}

/// Shard-level access for sharded caches.
pub trait ShardedKvCache: KvCache {
    /// Number of shards.
    fn shards(&self) -> usize;

    /// The shard responsible for `key`.
    ///
    /// Operations on the returned shard bypass routing: only use it with keys that route to it.
    fn shard(&self, key: &[u8]) -> &Store;

    /// Call `f` once per shard with its index, in index order.
    ///
    /// Useful for maintenance tasks, statistics collection, or warm-up.
    fn for_each_shard<F>(&self, f: F)
    where
        F: FnMut(usize, &Store);
}
