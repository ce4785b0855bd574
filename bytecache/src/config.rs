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

use std::{path::PathBuf, time::Duration};

use bytecache_common::{
    bits,
    error::{Error, ErrorKind, Result},
};
use bytecache_memory::store::ExhaustionPolicy;
use serde::{Deserialize, Serialize};

/// Default slot count.
pub const DEFAULT_CAPACITY: usize = 65536;
/// Default arena budget, 32 MiB.
pub const DEFAULT_ARENA_SIZE: usize = 32 << 20;
/// Default chunk size of the lazy arena, 1 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = 1 << 20;
/// Default snapshot interval.
pub const DEFAULT_SNAPSHOT_INTERVAL: Duration = Duration::from_secs(30);

/// Cache configuration.
///
/// Missing fields take their [`Default`] values when deserialized. [`CacheConfig::apply_defaults`] normalizes zero
/// values and [`CacheConfig::validate`] reports the first invalid option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Total slot count, split evenly across shards and rounded up to a power of two per shard.
    pub capacity: usize,
    /// Total arena budget in bytes, split evenly across shards.
    ///
    /// 0 selects the lazy arena, which grows in chunks of `chunk_size` bytes on demand.
    pub arena_size: usize,
    /// Shard count. 0 or 1 builds a single-shard cache, otherwise it must be a power of two.
    pub shards: usize,

    /// Ttl applied to writes with a zero ttl. Zero means no expiry.
    pub default_ttl: Duration,
    /// If disabled, entries never expire.
    pub enable_ttl: bool,

    /// Evict with the clock scan when a shard runs out of room.
    pub enable_eviction: bool,
    /// Drop the whole shard when it runs out of room.
    ///
    /// Mutually exclusive with `enable_eviction`.
    pub reset_on_full: bool,
    /// Allocate arena memory at construction.
    pub preallocate_arena: bool,
    /// Chunk size of the lazy arena.
    pub chunk_size: usize,

    /// Refuse every write and delete.
    pub read_only: bool,
    /// Compare key bytes on lookup instead of trusting 64-bit digest equality.
    pub verify_keys: bool,
    /// Maintain operation counters.
    pub enable_stats: bool,

    /// Accepted but not used yet.
    pub node_id: String,
    /// Accepted but not used yet.
    pub enable_sync: bool,
    /// Accepted but not used yet.
    pub enable_persistence: bool,
    /// Accepted but not used yet. Required if `enable_persistence` is set.
    pub data_dir: Option<PathBuf>,
    /// Accepted but not used yet.
    pub snapshot_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            arena_size: DEFAULT_ARENA_SIZE,
            shards: 1,
            default_ttl: Duration::ZERO,
            enable_ttl: true,
            enable_eviction: true,
            reset_on_full: false,
            preallocate_arena: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
            read_only: false,
            verify_keys: false,
            enable_stats: false,
            node_id: String::new(),
            enable_sync: false,
            enable_persistence: false,
            data_dir: None,
            snapshot_interval: DEFAULT_SNAPSHOT_INTERVAL,
        }
    }
}

impl CacheConfig {
    /// Replace zero values with defaults.
    ///
    /// `arena_size` is left untouched: 0 is a valid choice that selects the lazy arena.
    pub fn apply_defaults(mut self) -> Self {
        if self.capacity == 0 {
            self.capacity = DEFAULT_CAPACITY;
        }
        if self.shards == 0 {
            self.shards = 1;
        }
        if self.snapshot_interval.is_zero() {
            self.snapshot_interval = DEFAULT_SNAPSHOT_INTERVAL;
        }
        if !self.enable_eviction && !self.reset_on_full {
            self.enable_eviction = true;
        }
        self
    }

    /// Check the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::config("capacity must be greater than zero"));
        }
        if self.shards > 1 && !bits::is_pow2(self.shards) {
            return Err(Error::config("shards must be a power of two").with_context("shards", self.shards));
        }
        let shards = self.shards.max(1);
        if self.capacity < shards {
            return Err(Error::config("capacity must be at least the number of shards")
                .with_context("capacity", self.capacity)
                .with_context("shards", shards));
        }
        if self.enable_eviction && self.reset_on_full {
            return Err(Error::config("eviction and reset on full are mutually exclusive"));
        }
        if self.enable_persistence && self.data_dir.is_none() {
            return Err(Error::config("data dir must be set when persistence is enabled"));
        }

        match self.arena_size {
            0 => {
                if self.chunk_size == 0 || self.chunk_size > u32::MAX as usize {
                    return Err(Error::new(ErrorKind::Config, "chunk size must be in (0, u32::MAX]")
                        .with_context("chunk_size", self.chunk_size));
                }
            }
            arena_size => {
                let per_shard = arena_size / shards;
                if per_shard == 0 {
                    return Err(Error::config("arena size must be at least the number of shards")
                        .with_context("arena_size", arena_size)
                        .with_context("shards", shards));
                }
                if per_shard > u32::MAX as usize {
                    return Err(Error::config("arena size per shard must not exceed u32::MAX")
                        .with_context("arena_size", arena_size)
                        .with_context("shards", shards));
                }
            }
        }

        Ok(())
    }

    /// The exhaustion policy selected by the eviction flags.
    pub fn exhaustion(&self) -> ExhaustionPolicy {
        match self.reset_on_full && !self.enable_eviction {
            true => ExhaustionPolicy::ResetOnFull,
            false => ExhaustionPolicy::Evict,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_defaults() {
        let config = CacheConfig {
            capacity: 0,
            arena_size: 0,
            shards: 0,
            enable_eviction: false,
            snapshot_interval: Duration::ZERO,
            ..Default::default()
        }
        .apply_defaults();

        assert_eq!(config.capacity, DEFAULT_CAPACITY);
        assert_eq!(config.arena_size, 0);
        assert_eq!(config.shards, 1);
        assert!(config.enable_eviction);
        assert_eq!(config.snapshot_interval, DEFAULT_SNAPSHOT_INTERVAL);
        assert_eq!(config.exhaustion(), ExhaustionPolicy::Evict);
        config.validate().unwrap();
    }

    #[test]
    fn test_reset_on_full_kept() {
        let config = CacheConfig {
            enable_eviction: false,
            reset_on_full: true,
            ..Default::default()
        }
        .apply_defaults();
        assert!(!config.enable_eviction);
        assert_eq!(config.exhaustion(), ExhaustionPolicy::ResetOnFull);
        config.validate().unwrap();
    }

    #[test]
    fn test_validate() {
        let cases = [
            CacheConfig {
                capacity: 0,
                ..Default::default()
            },
            CacheConfig {
                shards: 3,
                ..Default::default()
            },
            CacheConfig {
                capacity: 4,
                shards: 8,
                ..Default::default()
            },
            CacheConfig {
                reset_on_full: true,
                ..Default::default()
            },
            CacheConfig {
                enable_persistence: true,
                ..Default::default()
            },
            CacheConfig {
                arena_size: 4,
                shards: 8,
                ..Default::default()
            },
            CacheConfig {
                arena_size: 0,
                chunk_size: 0,
                ..Default::default()
            },
        ];
        for config in cases {
            let err = config.validate().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Config, "{config:?}");
        }
    }

    #[test]
    fn test_validate_context() {
        let err = CacheConfig {
            shards: 6,
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.message(), "shards must be a power of two");
        assert_eq!(err.context(), &vec![("shards", "6".to_string())]);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_validate_arena_per_shard() {
        let config = CacheConfig {
            arena_size: 1 << 33,
            shards: 2,
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap_err().kind(), ErrorKind::Config);

        let config = CacheConfig {
            arena_size: 1 << 33,
            shards: 4,
            ..Default::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn test_persistence_with_data_dir() {
        let config = CacheConfig {
            enable_persistence: true,
            data_dir: Some(PathBuf::from("/tmp/bytecache")),
            ..Default::default()
        };
        config.validate().unwrap();
    }
}
