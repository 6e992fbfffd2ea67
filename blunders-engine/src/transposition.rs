//! Transposition table.
//!
//! Caches search results keyed by Zobrist hash so transposing move orders
//! are only searched once, on top of [`crate::tables::PositionTable`]:
//! single-threaded, always-replace, no chaining.

use crate::coretypes::{Cp, Move, PlyKind};
use crate::tables::PositionTable;
use crate::zobrist::HashKind;

/// Default table size: 2^25 slots.
const DEFAULT_TT_NBITS: u32 = 25;

/// Which bound `NodeInfo::eval` represents, from the search that produced
/// it.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum NodeType {
    /// `eval` is an upper bound: every child was searched and none beat α.
    FailLow,
    /// `eval` is exact: a child strictly improved α without reaching β.
    PV,
    /// `eval` is a lower bound: some child caused a β-cutoff.
    FailHigh,
}

/// A cached search result for one position, identified by its Zobrist hash
/// when stored in a [`TranspositionTable`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct NodeInfo {
    pub depth: PlyKind,
    pub node_type: NodeType,
    pub eval: Cp,
    pub best_move: Move,
}

impl NodeInfo {
    pub fn new(depth: PlyKind, node_type: NodeType, eval: Cp, best_move: Move) -> Self {
        Self {
            depth,
            node_type,
            eval,
            best_move,
        }
    }

    /// The sentinel returned when a search is cancelled mid-recursion.
    /// `PlyKind` is unsigned, so `depth == PlyKind::MAX` stands in for "no
    /// real depth was reached"; test with [`NodeInfo::is_cancelled`]
    /// rather than comparing depths directly.
    pub fn cancelled() -> Self {
        Self {
            depth: PlyKind::MAX,
            node_type: NodeType::FailLow,
            eval: Cp(0),
            best_move: Move::illegal(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.depth == PlyKind::MAX
    }
}

impl Default for NodeInfo {
    fn default() -> Self {
        Self {
            depth: 0,
            node_type: NodeType::FailLow,
            eval: Cp(0),
            best_move: Move::illegal(),
        }
    }
}

/// Search's cache of previously computed [`NodeInfo`]s, keyed by the full
/// Zobrist hash but indexed by its low `Nbits` bits. An always-replace,
/// direct-mapped table: collisions silently evict the older entry, which
/// the search tolerates by treating a hash mismatch as a plain cache miss.
#[derive(Debug, Clone)]
pub struct TranspositionTable {
    table: PositionTable<NodeInfo>,
}

impl TranspositionTable {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TT_NBITS)
    }

    pub fn with_capacity(nbits: u32) -> Self {
        Self {
            table: PositionTable::new(nbits),
        }
    }

    /// Sizes a table to roughly `megabytes` worth of slots, rounding down
    /// to the nearest power of two.
    pub fn with_megabytes(megabytes: usize) -> Self {
        let bytes = megabytes.saturating_mul(1024 * 1024);
        let slot_size = std::mem::size_of::<(HashKind, NodeInfo)>().max(1);
        let slots = (bytes / slot_size).max(1);
        let nbits = (usize::BITS - 1).saturating_sub(slots.leading_zeros()).max(1);
        Self::with_capacity(nbits)
    }

    pub fn get(&self, hash: HashKind) -> Option<&NodeInfo> {
        self.table.get(hash)
    }

    pub fn set(&mut self, hash: HashKind, info: NodeInfo) {
        self.table.set(hash, info);
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }

    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coretypes::Square::*;

    #[test]
    fn store_then_recall() {
        let mut tt = TranspositionTable::new();
        let info = NodeInfo::new(4, NodeType::PV, Cp(120), Move::new(E2, E4, None));
        tt.set(0xDEAD_BEEF, info);
        assert_eq!(tt.get(0xDEAD_BEEF), Some(&info));
    }

    #[test]
    fn with_megabytes_gives_a_usable_table() {
        let tt = TranspositionTable::with_megabytes(1);
        assert!(tt.capacity() >= 1);
    }

    #[test]
    fn cancelled_sentinel_is_recognizable() {
        assert!(NodeInfo::cancelled().is_cancelled());
        assert!(!NodeInfo::default().is_cancelled());
    }
}
