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

use std::{
    fmt::Debug,
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

/// A source of timestamps for TTL bookkeeping.
///
/// Timestamps are nanoseconds since an arbitrary per-source epoch and must never go backwards.
pub trait TimeSource: Send + Sync + Debug + 'static {
    /// Nanoseconds elapsed since the epoch of this source.
    fn now(&self) -> u64;

    /// The absolute expiration timestamp for the given ttl, starting from now.
    ///
    /// Returns 0 (no expiry) if `ttl` is zero.
    fn expire_at(&self, ttl: Duration) -> u64 {
        if ttl.is_zero() {
            return 0;
        }
        let ttl = u64::try_from(ttl.as_nanos()).unwrap_or(u64::MAX);
        // Never yield 0 for a non-zero ttl, 0 is reserved for "no expiry".
        self.now().saturating_add(ttl).max(1)
    }
}

/// A monotonic time source backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicTimeSource {
    epoch: Instant,
}

impl Default for MonotonicTimeSource {
    fn default() -> Self {
        Self { epoch: Instant::now() }
    }
}

impl TimeSource for MonotonicTimeSource {
    fn now(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }
}

/// A time source that only moves when told to.
///
/// Useful for deterministic TTL tests.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    nanos: AtomicU64,
}

impl ManualTimeSource {
    /// Move the clock forward by the given duration.
    pub fn advance(&self, duration: Duration) {
        let delta = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_add(delta, Ordering::Relaxed);
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> u64 {
        self.nanos.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expire_at() {
        let ts = ManualTimeSource::default();
        assert_eq!(ts.expire_at(Duration::ZERO), 0);
        assert_eq!(ts.expire_at(Duration::from_nanos(1)), 1);

        ts.advance(Duration::from_secs(1));
        assert_eq!(ts.now(), 1_000_000_000);
        assert_eq!(ts.expire_at(Duration::from_millis(10)), 1_010_000_000);
        assert_eq!(ts.expire_at(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_monotonic() {
        let ts = MonotonicTimeSource::default();
        let a = ts.now();
        std::thread::sleep(Duration::from_millis(1));
        let b = ts.now();
        assert!(b > a);
    }
}
