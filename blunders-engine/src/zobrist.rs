//! Zobrist Hashing.
//!
//! A `ZobristTable` holds a set of pseudo-randomly generated constants, one
//! per piece-on-square, one per en-passant file, four for the individual
//! castling rights, and one for "it is Black's turn to move". A position's
//! hash is the XOR of the constants for everything currently true about it;
//! because XOR is its own inverse, the same constant toggles a property on
//! and off, which is what lets `Node` maintain the hash incrementally
//! instead of recomputing it from scratch on every move.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::coretypes::{Castling, Color, File, Piece, PieceKind, Square, SquareIndexable};
use crate::coretypes::{NUM_PIECE_KINDS, NUM_SQUARES};

pub type HashKind = u64;

/// Fixed seed used whenever a caller wants reproducible hashes (tests,
/// benches, and `ZobristTable::new`'s default) rather than one reseeded
/// from OS entropy on every run.
const DEFAULT_SEED: u64 = 0x626C756E646572_73; // "blunders" in hex-ish ascii.

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct CastlingConstants {
    white_kingside: HashKind,
    white_queenside: HashKind,
    black_kingside: HashKind,
    black_queenside: HashKind,
}

#[derive(Debug, Clone)]
pub struct ZobristTable {
    piece_square: [[HashKind; NUM_SQUARES]; NUM_PIECE_KINDS],
    en_passant_file: [HashKind; 8],
    castling: CastlingConstants,
    turn: HashKind,
}

impl ZobristTable {
    /// A table seeded from OS entropy; two tables built this way will
    /// (almost certainly) disagree, so hashes are only ever compared
    /// within the same table.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// A table with constants derived deterministically from `seed`, so the
    /// same seed always produces the same constants (used by default so
    /// that repeated engine runs and tests are reproducible).
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(mut rng: StdRng) -> Self {
        let mut piece_square = [[0u64; NUM_SQUARES]; NUM_PIECE_KINDS];
        for table in piece_square.iter_mut() {
            for slot in table.iter_mut() {
                *slot = rng.gen();
            }
        }

        let mut en_passant_file = [0u64; 8];
        for slot in en_passant_file.iter_mut() {
            *slot = rng.gen();
        }

        let castling = CastlingConstants {
            white_kingside: rng.gen(),
            white_queenside: rng.gen(),
            black_kingside: rng.gen(),
            black_queenside: rng.gen(),
        };

        let turn = rng.gen();

        Self {
            piece_square,
            en_passant_file,
            castling,
            turn,
        }
    }

    fn piece_index(piece: Piece) -> usize {
        let color_block = match piece.color() {
            Color::White => 0,
            Color::Black => 6,
        };
        let kind_offset = match piece.piece_kind() {
            PieceKind::King => 0,
            PieceKind::Pawn => 1,
            PieceKind::Knight => 2,
            PieceKind::Bishop => 3,
            PieceKind::Rook => 4,
            PieceKind::Queen => 5,
        };
        color_block + kind_offset
    }

    pub fn hash_piece(&self, piece: Piece, square: Square) -> HashKind {
        self.piece_square[Self::piece_index(piece)][square.idx()]
    }

    pub fn hash_en_passant(&self, file: File) -> HashKind {
        self.en_passant_file[file as usize]
    }

    /// XOR of the constants for every castling right currently held. Four
    /// independent constants, one per right, so that losing one right
    /// toggles only its own bit pattern rather than also disturbing another.
    pub fn hash_castling(&self, castling: Castling) -> HashKind {
        let mut h = 0;
        if castling.has(Castling::W_KING) {
            h ^= self.castling.white_kingside;
        }
        if castling.has(Castling::W_QUEEN) {
            h ^= self.castling.white_queenside;
        }
        if castling.has(Castling::B_KING) {
            h ^= self.castling.black_kingside;
        }
        if castling.has(Castling::B_QUEEN) {
            h ^= self.castling.black_queenside;
        }
        h
    }

    pub fn hash_turn(&self) -> HashKind {
        self.turn
    }
}

impl Default for ZobristTable {
    fn default() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }
}
