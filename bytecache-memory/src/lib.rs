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

//! The storage engine of bytecache.
//!
//! A [`Store`](store::Store) is one shard: a fixed-size open-addressing slot table whose records point into a
//! bump-allocated byte arena, with lazy ttl expiration and clock (second-chance) eviction, all behind one mutex.
//! A [`ShardedStore`](sharded::ShardedStore) routes keys to independent stores by digest.

mod arena;
mod slot;

/// Shard router.
pub mod sharded;
/// Operation counters and snapshots.
pub mod statistics;
/// Single-shard store.
pub mod store;
/// The shared operation surface.
pub mod traits;

/// Re-exports of the commonly used types.
pub mod prelude {
    pub use crate::{
        sharded::ShardedStore,
        statistics::{Event, Statistics},
        store::{ExhaustionPolicy, Store, StoreConfig, ValueRef},
        traits::{KvCache, ShardedKvCache},
    };
}
