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

//! Hot path benchmarks of the single-shard and sharded stores.

use std::{hint::black_box, time::Duration};

use bytecache_memory::prelude::*;
use criterion::{criterion_group, criterion_main, measurement::WallTime, BenchmarkGroup, BenchmarkId, Criterion};
use rand::{rngs::SmallRng, Rng, SeedableRng};

const KEYS: usize = 1 << 14;
const VALUE_SIZE: usize = 64;

fn keys() -> Vec<Vec<u8>> {
    (0..KEYS).map(|i| format!("key-{i:08}").into_bytes()).collect()
}

fn config() -> StoreConfig {
    StoreConfig {
        preallocate_arena: true,
        ..StoreConfig::new(KEYS * 2, KEYS * 2 * (VALUE_SIZE + 16))
    }
}

fn bench_set_with<C: KvCache>(group: &mut BenchmarkGroup<'_, WallTime>, name: &str, cache: C, keys: &[Vec<u8>]) {
    let value = vec![b'x'; VALUE_SIZE];
    let mut rng = SmallRng::seed_from_u64(42);
    group.bench_function(BenchmarkId::from_parameter(name), |b| {
        b.iter(|| {
            let key = &keys[rng.random_range(0..KEYS)];
            black_box(cache.set(key, &value, Duration::ZERO))
        })
    });
}

fn bench_get_with<C: KvCache>(group: &mut BenchmarkGroup<'_, WallTime>, name: &str, cache: C, keys: &[Vec<u8>]) {
    let value = vec![b'x'; VALUE_SIZE];
    let inserted = cache.load_bulk(keys, &vec![value; keys.len()], Duration::ZERO);
    assert_eq!(inserted, keys.len());

    let mut rng = SmallRng::seed_from_u64(42);
    group.bench_function(BenchmarkId::from_parameter(name), |b| {
        b.iter(|| {
            let key = &keys[rng.random_range(0..KEYS)];
            black_box(cache.get(key).map(|value| value.len()))
        })
    });
}

fn bench_set(c: &mut Criterion) {
    let keys = keys();
    let mut group = c.benchmark_group("set");
    bench_set_with(&mut group, "store", Store::new(config()).unwrap(), &keys);
    bench_set_with(&mut group, "sharded", ShardedStore::new(config(), 8).unwrap(), &keys);
    group.finish();
}

fn bench_get(c: &mut Criterion) {
    let keys = keys();
    let mut group = c.benchmark_group("get");
    bench_get_with(&mut group, "store", Store::new(config()).unwrap(), &keys);
    bench_get_with(&mut group, "sharded", ShardedStore::new(config(), 8).unwrap(), &keys);
    group.finish();
}

criterion_group!(benches, bench_set, bench_get);
criterion_main!(benches);
