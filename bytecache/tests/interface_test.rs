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

//! Compile-time checks of the shared operation surface.

use std::time::Duration;

use bytecache::prelude::*;

fn is_kv_cache<C: KvCache>() {}
fn is_sharded_kv_cache<C: ShardedKvCache>() {}

#[test]
fn test_interfaces() {
    is_kv_cache::<Store>();
    is_kv_cache::<ShardedStore>();
    is_kv_cache::<Cache>();
    is_sharded_kv_cache::<ShardedStore>();
}

fn exercise(cache: &impl KvCache) {
    assert!(cache.set(b"k", b"v", Duration::ZERO));
    assert_eq!(cache.get_copied(b"k"), Some(b"v".to_vec()));
    assert!(cache.contains(b"k"));
    assert_eq!(cache.load_bulk(&["a", "b"], &["1", "2"], Duration::ZERO), 2);
    cache.delete(b"k");
    assert!(!cache.contains(b"k"));
    cache.reset();
    assert!(cache.get(b"a").is_none());
    cache.stop();
    assert!(!cache.set(b"k", b"v", Duration::ZERO));
}

#[test]
fn test_same_contract() {
    exercise(&Store::new(StoreConfig::new(16, 1024)).unwrap());
    exercise(&ShardedStore::new(StoreConfig::new(16, 1024), 2).unwrap());
    exercise(&CacheBuilder::new(16).with_arena_size(1024).build().unwrap());
    exercise(&CacheBuilder::new(16).with_arena_size(1024).with_shards(4).build().unwrap());
}
