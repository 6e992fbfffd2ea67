//! Blunders Chess Engine Core Library.

pub mod arrayvec;
pub mod attacks;
pub mod coretypes;
pub mod engine;
pub mod error;
pub mod eval;
pub mod fen;
pub mod game;
pub mod mailbox;
pub mod movelist;
pub mod node;
pub mod perft;
pub mod position;
pub mod search;
pub mod tables;
pub mod threads;
pub mod timeman;
pub mod transposition;
pub mod xboard;
pub mod zobrist;

pub use coretypes::{Color, File, Move, Rank, Square};
pub use engine::{Engine, EngineBuilder};
pub use fen::Fen;
pub use game::Game;
pub use node::Node;
pub use position::Position;
pub use search::SearchResult;
pub use transposition::TranspositionTable;
pub use xboard::Manager;
pub use zobrist::ZobristTable;

#[cfg(test)]
mod tests {
    #[test]
    fn it_works() {
        assert_eq!(2 + 2, 4);
    }
}

/// Add README.md rust code to testing.
#[doc = include_str!("../README.md")]
#[cfg(doctest)]
pub struct ReadmeDoctests;
