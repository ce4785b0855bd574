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

use bytecache_common::{bits, hasher::fnv1a, strict_assert};

/// Digest stored for keys whose FNV-1a digest is exactly 0, which is reserved as the empty sentinel.
pub const ZERO_DIGEST_REMAP: u64 = 0x9e37_79b9_7f4a_7c15;

/// The 64-bit digest identifying a key.
///
/// Never returns 0.
#[inline]
pub fn digest(key: &[u8]) -> u64 {
    match fnv1a(key) {
        0 => ZERO_DIGEST_REMAP,
        hash => hash,
    }
}

/// A fixed-width hash table record.
///
/// A zero `hash` marks an empty slot. Key and value bytes live in the arena, the key first and the value right
/// after it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Slot {
    pub hash: u64,
    /// Absolute expiration timestamp in nanoseconds, 0 for no expiry.
    pub expire: u64,
    pub key_offset: u32,
    pub value_offset: u32,
    pub value_len: u32,
    pub key_len: u16,
    /// Second-chance bit for clock eviction.
    pub used: bool,
}

const _: () = assert!(std::mem::size_of::<Slot>() == 32);

impl Slot {
    pub const EMPTY: Self = Self {
        hash: 0,
        expire: 0,
        key_offset: 0,
        value_offset: 0,
        value_len: 0,
        key_len: 0,
        used: false,
    };

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.hash == 0
    }

    #[inline]
    pub fn is_expired(&self, now: u64) -> bool {
        self.expire > 0 && now > self.expire
    }

    /// Total arena bytes referenced by the slot.
    #[inline]
    pub fn weight(&self) -> usize {
        self.key_len as usize + self.value_len as usize
    }
}

/// Result of probing the table for a digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// A slot holding the digest that the matcher accepted.
    Found(usize),
    /// The first empty slot on the probe sequence.
    Vacant(usize),
    /// Every slot was visited without a match or an empty slot.
    Full,
}

/// Open-addressing hash table with linear probing.
///
/// The size is a power of two and never changes. The home index of a digest is `(hash >> shift) & mask`, where
/// `shift` lets a sharded cache skip the low bits already consumed by shard routing.
#[derive(Debug)]
pub struct SlotTable {
    slots: Box<[Slot]>,
    mask: usize,
    shift: u32,
}

impl SlotTable {
    /// Create a table with at least `capacity` slots, rounded up to the next power of two.
    pub fn new(capacity: usize, shift: u32) -> Self {
        let size = bits::round_up_pow2(capacity);
        bits::debug_assert_pow2(size);
        strict_assert!(shift < u64::BITS);
        Self {
            slots: vec![Slot::EMPTY; size].into_boxed_slice(),
            mask: size - 1,
            shift,
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn home(&self, hash: u64) -> usize {
        (hash >> self.shift) as usize & self.mask
    }

    #[inline]
    pub fn next(&self, index: usize) -> usize {
        (index + 1) & self.mask
    }

    /// Walk the probe sequence of `hash`.
    ///
    /// A slot with the same digest is a match only if `matches` accepts it, which lets the caller verify key bytes.
    pub fn probe(&self, hash: u64, mut matches: impl FnMut(&Slot) -> bool) -> Probe {
        let mut index = self.home(hash);
        for _ in 0..self.slots.len() {
            let slot = &self.slots[index];
            if slot.is_empty() {
                return Probe::Vacant(index);
            }
            if slot.hash == hash && matches(slot) {
                return Probe::Found(index);
            }
            index = self.next(index);
        }
        Probe::Full
    }

    /// Clear the slot at `index` and shift later members of its cluster back.
    ///
    /// Keeps every remaining key reachable from its home without tombstones. Returns the removed record.
    pub fn remove(&mut self, index: usize) -> Slot {
        let removed = self.slots[index];
        strict_assert!(!removed.is_empty());

        let mut hole = index;
        let mut cursor = self.next(index);
        while cursor != index {
            let slot = self.slots[cursor];
            if slot.is_empty() {
                break;
            }
            // The record may fill the hole if the hole lies between its home and its current position.
            let home = self.home(slot.hash);
            if (cursor.wrapping_sub(home) & self.mask) >= (cursor.wrapping_sub(hole) & self.mask) {
                self.slots[hole] = slot;
                hole = cursor;
            }
            cursor = self.next(cursor);
        }
        self.slots[hole] = Slot::EMPTY;

        removed
    }

    pub fn clear(&mut self) {
        self.slots.fill(Slot::EMPTY);
    }

    #[inline]
    pub fn get(&self, index: usize) -> &Slot {
        &self.slots[index]
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> &mut Slot {
        &mut self.slots[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Slot)> + '_ {
        self.slots.iter().enumerate().filter(|(_, slot)| !slot.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occupied(hash: u64) -> Slot {
        Slot {
            hash,
            ..Slot::EMPTY
        }
    }

    fn insert(table: &mut SlotTable, hash: u64) -> usize {
        match table.probe(hash, |_| true) {
            Probe::Vacant(index) | Probe::Found(index) => {
                *table.get_mut(index) = occupied(hash);
                index
            }
            Probe::Full => panic!("table is full"),
        }
    }

    #[test]
    fn test_size_rounds_up() {
        assert_eq!(SlotTable::new(0, 0).size(), 1);
        assert_eq!(SlotTable::new(4, 0).size(), 4);
        assert_eq!(SlotTable::new(5, 0).size(), 8);
        assert_eq!(SlotTable::new(1000, 0).size(), 1024);
    }

    #[test]
    fn test_digest_never_zero() {
        assert_ne!(digest(b""), 0);
        assert_eq!(digest(b"a"), fnv1a(b"a"));
    }

    #[test]
    fn test_linear_probe_and_full() {
        let mut table = SlotTable::new(4, 0);
        // All collide on home 1.
        assert_eq!(insert(&mut table, 1), 1);
        assert_eq!(insert(&mut table, 5), 2);
        assert_eq!(insert(&mut table, 9), 3);
        assert_eq!(insert(&mut table, 13), 0);
        assert_eq!(table.probe(17, |_| true), Probe::Full);
        assert_eq!(table.probe(9, |_| true), Probe::Found(3));
        // A rejecting matcher keeps probing past same-digest slots.
        assert_eq!(table.probe(9, |_| false), Probe::Full);
    }

    #[test]
    fn test_remove_keeps_cluster_reachable() {
        let mut table = SlotTable::new(8, 0);
        insert(&mut table, 1); // home 1 at 1
        insert(&mut table, 9); // home 1 at 2
        insert(&mut table, 2); // home 2 at 3
        insert(&mut table, 17); // home 1 at 4
        insert(&mut table, 6); // home 6 at 6

        let removed = table.remove(1);
        assert_eq!(removed.hash, 1);

        assert_eq!(table.probe(9, |_| true), Probe::Found(1));
        assert_eq!(table.probe(2, |_| true), Probe::Found(2));
        assert_eq!(table.probe(17, |_| true), Probe::Found(3));
        assert_eq!(table.probe(6, |_| true), Probe::Found(6));
        assert_eq!(table.probe(1, |_| true), Probe::Vacant(4));
        assert_eq!(table.iter().count(), 4);
    }

    #[test]
    fn test_remove_wraps_around() {
        let mut table = SlotTable::new(4, 0);
        insert(&mut table, 3); // at 3
        insert(&mut table, 7); // home 3 at 0
        insert(&mut table, 0x10); // home 0 at 1

        table.remove(3);
        assert_eq!(table.probe(7, |_| true), Probe::Found(3));
        assert_eq!(table.probe(0x10, |_| true), Probe::Found(0));
        assert!(table.get(1).is_empty());
    }

    #[test]
    fn test_shift() {
        let table = SlotTable::new(4, 2);
        assert_eq!(table.home(0b1100), 0b11);
        assert_eq!(table.home(0b0011), 0);
    }
}
