//! Fixed-capacity, open-addressed, direct-mapped tables keyed by a 64-bit
//! hash's low `N` bits.
//!
//! One slot per index, no chaining, no probing, always-replace on write. A
//! lookup whose stored key does not match the query key is treated as a
//! miss and returns the value type's default - collisions are tolerated
//! because every caller (the search transposition table and the
//! no-return/repetition table) can always fall back to recomputing from
//! scratch.

use crate::zobrist::HashKind;

/// `Nbits` sizes the table to `2usize.pow(Nbits)` slots, addressed by the
/// low `Nbits` bits of a 64-bit Zobrist hash.
#[derive(Debug, Clone)]
pub struct PositionTable<V> {
    slots: Vec<Option<(HashKind, V)>>,
    mask: u64,
}

impl<V: Clone> PositionTable<V> {
    /// `nbits` must be in `1..64`.
    pub fn new(nbits: u32) -> Self {
        let capacity = 1usize << nbits;
        Self {
            slots: vec![None; capacity],
            mask: (capacity as u64) - 1,
        }
    }

    fn index(&self, hash: HashKind) -> usize {
        (hash & self.mask) as usize
    }

    /// Returns the stored value if present and its key matches `hash`,
    /// `None` on a miss or a collision with a different key.
    pub fn get(&self, hash: HashKind) -> Option<&V> {
        match &self.slots[self.index(hash)] {
            Some((key, value)) if *key == hash => Some(value),
            _ => None,
        }
    }

    /// Always replaces whatever was previously stored at this index,
    /// regardless of depth or age - the simplest possible replacement
    /// policy.
    pub fn set(&mut self, hash: HashKind, value: V) {
        let idx = self.index(hash);
        self.slots[idx] = Some((hash, value));
    }

    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

impl<V: Clone> Default for PositionTable<V>
where
    V: Default,
{
    fn default() -> Self {
        Self::new(16)
    }
}

/// A `PositionTable` specialized for "has this hash been seen higher up the
/// current search path" queries. Membership only, no payload; `set`/`get`
/// operate on `bool` directly, which the default `PositionTable<bool>`
/// already supports, `NoReturnTable` is a thin naming wrapper matching
/// spec's "no-return table" vocabulary (4.5, 4.6.3).
pub type NoReturnTable = PositionTable<bool>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips() {
        let mut t: PositionTable<u32> = PositionTable::new(4);
        t.set(7, 42);
        assert_eq!(t.get(7), Some(&42));
    }

    #[test]
    fn miss_on_absent_key_returns_none() {
        let t: PositionTable<u32> = PositionTable::new(4);
        assert_eq!(t.get(123), None);
    }

    #[test]
    fn collision_always_replaces() {
        let mut t: PositionTable<u32> = PositionTable::new(2); // 4 slots.
        let a = 0u64; // index 0
        let b = 4u64; // also index 0, different key.
        t.set(a, 1);
        assert_eq!(t.get(a), Some(&1));
        t.set(b, 2);
        // a's entry was evicted by b's collision.
        assert_eq!(t.get(a), None);
        assert_eq!(t.get(b), Some(&2));
    }

    #[test]
    fn clear_empties_table() {
        let mut t: PositionTable<u32> = PositionTable::new(4);
        t.set(1, 9);
        t.clear();
        assert_eq!(t.get(1), None);
    }
}
