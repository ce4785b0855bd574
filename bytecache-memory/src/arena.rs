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

//! A bump-pointer byte arena for raw key and value bytes.
//!
//! The arena hands out byte ranges addressed by a 32-bit offset. Memory is organized in equally sized chunks:
//!
//! - fixed mode: a single chunk whose size is the whole arena budget.
//! - lazy mode: chunks of a configured size, appended on demand until the 32-bit address space is used up.
//!
//! An allocation never straddles two chunks. Offsets are global: `chunk index * chunk size + offset in chunk`.
//!
//! Nothing is freed individually. [`Arena::reset`] rewinds the bump pointer without touching the bytes, which
//! logically invalidates every range handed out before.

use bytecache_common::strict_assert;

/// Default chunk size for the lazy arena mode.
pub const DEFAULT_CHUNK_SIZE: u32 = 1 << 20;

#[derive(Debug)]
pub struct Arena {
    chunks: Vec<Box<[u8]>>,
    chunk_size: u32,
    max_chunks: usize,
    offset: u32,
}

impl Arena {
    /// Create an arena backed by a single buffer of `capacity` bytes.
    ///
    /// The buffer is allocated up front if `preallocate` is set, otherwise on the first allocation.
    pub fn fixed(capacity: u32, preallocate: bool) -> Self {
        // A zero sized arena keeps a non-zero chunk size so offset math never divides by zero.
        let (chunk_size, max_chunks) = match capacity {
            0 => (1, 0),
            capacity => (capacity, 1),
        };
        Self::with_chunks(chunk_size, max_chunks, preallocate)
    }

    /// Create an arena that grows in chunks of `chunk_size` bytes.
    ///
    /// A `chunk_size` of 0 selects [`DEFAULT_CHUNK_SIZE`]. The first chunk is allocated up front if `preallocate`
    /// is set.
    pub fn lazy(chunk_size: u32, preallocate: bool) -> Self {
        let chunk_size = match chunk_size {
            0 => DEFAULT_CHUNK_SIZE,
            chunk_size => chunk_size,
        };
        let max_chunks = (u32::MAX / chunk_size) as usize;
        Self::with_chunks(chunk_size, max_chunks, preallocate)
    }

    fn with_chunks(chunk_size: u32, max_chunks: usize, preallocate: bool) -> Self {
        let mut arena = Self {
            chunks: Vec::new(),
            chunk_size,
            max_chunks,
            offset: 0,
        };
        if preallocate && max_chunks > 0 {
            arena.materialize(0);
        }
        arena
    }

    /// Allocate `n` contiguous bytes and return the offset of the first one.
    ///
    /// Returns `None` without any side effect if the arena cannot fit `n` more bytes.
    pub fn allocate(&mut self, n: u32) -> Option<u32> {
        if n == 0 {
            return Some(self.offset);
        }
        if n > self.chunk_size {
            return None;
        }

        let chunk_size = self.chunk_size as u64;
        let mut start = self.offset as u64;
        let used = start % chunk_size;
        if used + n as u64 > chunk_size {
            // Skip the tail of the current chunk.
            start += chunk_size - used;
        }

        let index = (start / chunk_size) as usize;
        let end = start + n as u64;
        if index >= self.max_chunks || end > u32::MAX as u64 {
            return None;
        }

        self.materialize(index);
        self.offset = end as u32;
        Some(start as u32)
    }

    /// Rewind the bump pointer to the beginning.
    ///
    /// Chunks are kept for reuse and their bytes are not cleared.
    pub fn reset(&mut self) {
        self.offset = 0;
    }

    /// Bytes between the arena start and the bump pointer, including skipped chunk tails.
    pub fn usage(&self) -> usize {
        self.offset as usize
    }

    /// Maximum number of bytes the arena can address.
    pub fn capacity(&self) -> usize {
        self.chunk_size as usize * self.max_chunks
    }

    /// The largest single allocation the arena can ever satisfy.
    pub fn max_allocation(&self) -> u32 {
        match self.max_chunks {
            0 => 0,
            _ => self.chunk_size,
        }
    }

    /// Bytes currently backed by memory.
    pub fn allocated(&self) -> usize {
        self.chunk_size as usize * self.chunks.len()
    }

    /// The bytes of a range previously returned by [`Arena::allocate`].
    pub fn slice(&self, offset: u32, len: u32) -> &[u8] {
        if len == 0 {
            return &[];
        }
        let (chunk, start) = self.locate(offset);
        &self.chunks[chunk][start..start + len as usize]
    }

    /// The mutable bytes of a range previously returned by [`Arena::allocate`].
    pub fn slice_mut(&mut self, offset: u32, len: u32) -> &mut [u8] {
        if len == 0 {
            return &mut [];
        }
        let (chunk, start) = self.locate(offset);
        &mut self.chunks[chunk][start..start + len as usize]
    }

    /// Move `len` bytes from offset `from` down to offset `to`.
    ///
    /// `to` must not be greater than `from`. Both ranges must lie within the materialized chunks, and each range
    /// within a single chunk.
    pub fn relocate(&mut self, from: u32, to: u32, len: u32) {
        strict_assert!(to <= from);
        if len == 0 || from == to {
            return;
        }
        let len = len as usize;
        let (src_chunk, src) = self.locate(from);
        let (dst_chunk, dst) = self.locate(to);

        if src_chunk == dst_chunk {
            self.chunks[src_chunk].copy_within(src..src + len, dst);
        } else {
            strict_assert!(dst_chunk < src_chunk);
            let (lower, upper) = self.chunks.split_at_mut(src_chunk);
            lower[dst_chunk][dst..dst + len].copy_from_slice(&upper[0][src..src + len]);
        }
    }

    #[inline]
    fn locate(&self, offset: u32) -> (usize, usize) {
        (
            (offset / self.chunk_size) as usize,
            (offset % self.chunk_size) as usize,
        )
    }

    fn materialize(&mut self, index: usize) {
        strict_assert!(index <= self.chunks.len());
        while self.chunks.len() <= index {
            self.chunks.push(vec![0; self.chunk_size as usize].into_boxed_slice());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_allocate() {
        let mut arena = Arena::fixed(16, true);
        assert_eq!(arena.allocated(), 16);
        assert_eq!(arena.allocate(4), Some(0));
        assert_eq!(arena.allocate(8), Some(4));
        assert_eq!(arena.usage(), 12);

        // Does not fit, and does not advance.
        assert_eq!(arena.allocate(5), None);
        assert_eq!(arena.usage(), 12);

        assert_eq!(arena.allocate(4), Some(12));
        assert_eq!(arena.allocate(1), None);
        assert_eq!(arena.allocate(0), Some(16));
    }

    #[test]
    fn test_fixed_deferred() {
        let mut arena = Arena::fixed(64, false);
        assert_eq!(arena.allocated(), 0);
        assert_eq!(arena.capacity(), 64);
        assert_eq!(arena.allocate(1), Some(0));
        assert_eq!(arena.allocated(), 64);
    }

    #[test]
    fn test_zero_sized() {
        let mut arena = Arena::fixed(0, true);
        assert_eq!(arena.capacity(), 0);
        assert_eq!(arena.max_allocation(), 0);
        assert_eq!(arena.allocated(), 0);
        assert_eq!(arena.allocate(1), None);
        assert_eq!(arena.allocate(0), Some(0));
        assert!(arena.slice(0, 0).is_empty());
    }

    #[test]
    fn test_reset_keeps_bytes() {
        let mut arena = Arena::fixed(8, true);
        let offset = arena.allocate(3).unwrap();
        arena.slice_mut(offset, 3).copy_from_slice(b"abc");
        arena.reset();
        assert_eq!(arena.usage(), 0);

        // The bytes survive until overwritten.
        assert_eq!(arena.slice(0, 3), b"abc");
        let offset = arena.allocate(2).unwrap();
        assert_eq!(offset, 0);
        arena.slice_mut(offset, 2).copy_from_slice(b"xy");
        assert_eq!(arena.slice(0, 3), b"xyc");
    }

    #[test]
    fn test_lazy_grows_by_chunk() {
        let mut arena = Arena::lazy(8, false);
        assert_eq!(arena.allocated(), 0);

        assert_eq!(arena.allocate(6), Some(0));
        assert_eq!(arena.allocated(), 8);

        // Does not straddle, skips the tail of chunk 0.
        assert_eq!(arena.allocate(4), Some(8));
        assert_eq!(arena.allocated(), 16);
        assert_eq!(arena.allocate(4), Some(12));
        assert_eq!(arena.allocate(8), Some(16));
        assert_eq!(arena.allocated(), 24);

        // Larger than a chunk never fits.
        assert_eq!(arena.allocate(9), None);

        arena.reset();
        assert_eq!(arena.allocate(8), Some(0));
        // Chunks are reused after reset.
        assert_eq!(arena.allocated(), 24);
    }

    #[test]
    fn test_lazy_default_chunk_size() {
        let arena = Arena::lazy(0, true);
        assert_eq!(arena.allocated(), DEFAULT_CHUNK_SIZE as usize);
    }

    #[test]
    fn test_relocate() {
        let mut arena = Arena::lazy(8, false);
        let a = arena.allocate(6).unwrap();
        let b = arena.allocate(5).unwrap();
        assert_eq!((a, b), (0, 8));
        arena.slice_mut(b, 5).copy_from_slice(b"hello");

        // Across chunks.
        arena.relocate(b, 0, 5);
        assert_eq!(arena.slice(0, 5), b"hello");

        // Within a chunk, overlapping.
        arena.slice_mut(8, 5).copy_from_slice(b"world");
        arena.relocate(9, 8, 4);
        assert_eq!(arena.slice(8, 4), b"orld");
    }
}
