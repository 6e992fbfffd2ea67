//! Performance Test
//!
//! [Perft](https://www.chessprogramming.org/Perft)
//!
//! A simple debugging and testing function used to count
//! the number of nodes at a specific depth. Two independent counters are
//! provided: a naive tree walk, and a hash-assisted variant that memoizes
//! `(depth, count)` per node hash. Both must agree, since the memo is
//! purely a speed optimization.

use std::collections::HashMap;
use std::ops::{Add, AddAssign};
use std::sync::Arc;

use crate::node::Node;
use crate::position::Position;
use crate::zobrist::{HashKind, ZobristTable};

/// Debugging information about results of perft test.
/// nodes: Number of nodes at lowest depth of perft.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PerftInfo {
    pub nodes: u64,
}

impl PerftInfo {
    fn new(nodes: u64) -> Self {
        PerftInfo { nodes }
    }
}

impl Add for PerftInfo {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        PerftInfo {
            nodes: self.nodes + rhs.nodes,
        }
    }
}

impl AddAssign for PerftInfo {
    fn add_assign(&mut self, rhs: Self) {
        self.nodes += rhs.nodes;
    }
}

/// Count the number of nodes at a certain depth, by naive tree walk.
/// This ignores higher terminal nodes.
/// In other words, it counts the number of paths to the given depth.
pub fn perft(position: Position, ply: u32) -> PerftInfo {
    perft_recurse(position, ply)
}

fn perft_recurse(mut position: Position, ply: u32) -> PerftInfo {
    if ply == 0 {
        PerftInfo::new(1)
    } else if ply == 1 {
        PerftInfo::new(position.get_legal_moves().len() as u64)
    } else {
        let legal_moves = position.get_legal_moves();
        let mut perft_info = PerftInfo::new(0);
        for legal_move in legal_moves {
            let child_position = position.make_move_new(legal_move);
            perft_info += perft_recurse(child_position, ply - 1);
        }
        perft_info
    }
}

/// Counts nodes at `ply` like [`perft`], but memoizes `(depth, count)` per
/// incremental Zobrist hash so transposing move orders are only expanded
/// once. Used to cross-check the naive counter: the two must always agree,
/// as the memo is purely a speed optimization.
pub fn perft_hash_assisted(position: Position, ztable: Arc<ZobristTable>, ply: u32) -> PerftInfo {
    let node = Node::new(position, ztable);
    let mut memo: HashMap<HashKind, (u32, u64)> = HashMap::new();
    PerftInfo::new(perft_hash_recurse(node, ply, &mut memo))
}

fn perft_hash_recurse(node: Node, ply: u32, memo: &mut HashMap<HashKind, (u32, u64)>) -> u64 {
    if ply == 0 {
        return 1;
    }
    if let Some((memo_depth, count)) = memo.get(&node.hash()) {
        if *memo_depth == ply {
            return *count;
        }
    }

    let mut position_copy = *node.position();
    let legal_moves = position_copy.get_legal_moves();
    let count = if ply == 1 {
        legal_moves.len() as u64
    } else {
        let mut total = 0u64;
        for legal_move in legal_moves {
            let mut child = node.clone();
            child.make_move(legal_move);
            total += perft_hash_recurse(child, ply - 1, memo);
        }
        total
    };

    memo.insert(node.hash(), (ply, count));
    count
}
