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

//! bytecache is an embeddable in-process byte cache.
//!
//! Keys and values are raw byte strings copied into a per-shard bump arena and indexed by a fixed-size
//! open-addressing table, so a write never allocates per entry. Entries expire lazily on read and are evicted with
//! a clock (second-chance) scan when a shard runs out of room.
//!
//! ```
//! use std::time::Duration;
//!
//! use bytecache::prelude::*;
//!
//! let cache = CacheBuilder::new(1024).with_arena_size(1 << 20).with_shards(4).build().unwrap();
//! assert!(cache.set(b"key", b"value", Duration::ZERO));
//! assert_eq!(cache.get(b"key").as_deref(), Some(&b"value"[..]));
//! ```

pub use bytecache_common as common;
pub use bytecache_memory as memory;

mod cache;
mod config;

/// Re-exports of the commonly used types.
pub mod prelude {
    pub use bytecache_common::{
        error::{Error, ErrorKind, Result},
        time::{ManualTimeSource, MonotonicTimeSource, TimeSource},
    };
    pub use bytecache_memory::prelude::*;

    pub use crate::{
        cache::{Cache, CacheBuilder},
        config::{
            CacheConfig, DEFAULT_ARENA_SIZE, DEFAULT_CAPACITY, DEFAULT_CHUNK_SIZE, DEFAULT_SNAPSHOT_INTERVAL,
        },
    };
}
