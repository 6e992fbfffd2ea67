//! `Node` bundles a [`Position`] with its Zobrist hash and keeps both
//! consistent through every mutation: playing a move updates the hash by
//! XORing out the squares and rights it disturbs rather than rehashing the
//! board from scratch.

use std::sync::Arc;

use crate::coretypes::{Castling, Color, Move, MoveInfo, MoveKind, PieceKind, Square};
use crate::fen::Fen;
use crate::position::{castle_rook_squares, castling_rights_touched, en_passant_captured_square, Position};
use crate::zobrist::{HashKind, ZobristTable};

/// Position + incrementally maintained Zobrist hash + the square of the last
/// capture, if any (quiescence search restricts itself to recaptures on this
/// square).
#[derive(Debug, Clone)]
pub struct Node {
    position: Position,
    ztable: Arc<ZobristTable>,
    hash: HashKind,
    last_capture: Option<Square>,
}

impl Node {
    /// Builds a Node from scratch, computing its hash with a full
    /// `slow_hash` scan rather than incrementally.
    pub fn new(position: Position, ztable: Arc<ZobristTable>) -> Self {
        let hash = slow_hash(&position, &ztable);
        Self {
            position,
            ztable,
            hash,
            last_capture: None,
        }
    }

    pub fn from_fen(fen: &str, ztable: Arc<ZobristTable>) -> crate::error::Result<Self> {
        Position::parse_fen(fen).map(|position| Self::new(position, ztable))
    }

    pub fn start(ztable: Arc<ZobristTable>) -> Self {
        Self::new(Position::start_position(), ztable)
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Mutable access to the wrapped position, for legal-move generation
    /// (`get_legal_moves`, `is_checkmate`, `is_stalemate`) which caches its
    /// result and so needs `&mut self` even when no move is played.
    pub fn position_mut(&mut self) -> &mut Position {
        &mut self.position
    }

    pub fn hash(&self) -> HashKind {
        self.hash
    }

    pub fn last_capture(&self) -> Option<Square> {
        self.last_capture
    }

    pub fn ztable(&self) -> &Arc<ZobristTable> {
        &self.ztable
    }

    /// Hash this move's effect onto `hash`, mirroring `Position::make_move`'s
    /// board-level edits exactly.
    pub fn hash_move(&self, hash: &mut HashKind, mv: Move, move_info: MoveInfo) {
        let position = &self.position;
        let color = *position.side_to_move();
        let ztable = &self.ztable;

        match move_info.move_kind() {
            MoveKind::EnPassant => {
                let captured_square = en_passant_captured_square(mv.to, color);
                let captured_pawn = crate::coretypes::Piece::new(!color, PieceKind::Pawn);
                *hash ^= ztable.hash_piece(captured_pawn, captured_square);
                let pawn = crate::coretypes::Piece::new(color, PieceKind::Pawn);
                *hash ^= ztable.hash_piece(pawn, mv.from);
                *hash ^= ztable.hash_piece(pawn, mv.to);
            }
            MoveKind::Castle => {
                let king = crate::coretypes::Piece::new(color, PieceKind::King);
                *hash ^= ztable.hash_piece(king, mv.from);
                *hash ^= ztable.hash_piece(king, mv.to);
                let (rook_from, rook_to) = castle_rook_squares(mv.to, color);
                let rook = crate::coretypes::Piece::new(color, PieceKind::Rook);
                *hash ^= ztable.hash_piece(rook, rook_from);
                *hash ^= ztable.hash_piece(rook, rook_to);
            }
            MoveKind::Quiet | MoveKind::Capture(_) => {
                let moving = crate::coretypes::Piece::new(color, *move_info.piece_kind());
                *hash ^= ztable.hash_piece(moving, mv.from);
                if let Some(captured_kind) = move_info.captured() {
                    let captured = crate::coretypes::Piece::new(!color, captured_kind);
                    *hash ^= ztable.hash_piece(captured, mv.to);
                }
                match mv.promotion {
                    Some(promotion_kind) => {
                        let promoted = crate::coretypes::Piece::new(color, promotion_kind);
                        *hash ^= ztable.hash_piece(promoted, mv.to);
                    }
                    None => *hash ^= ztable.hash_piece(moving, mv.to),
                }
            }
        }

        // En-passant file: off for the old target, on for the new one.
        if let Some(old_ep) = position.en_passant() {
            *hash ^= ztable.hash_en_passant(old_ep.file());
        }
        let is_double_push = *move_info.piece_kind() == PieceKind::Pawn
            && (mv.from.rank_u8() as i8 - mv.to.rank_u8() as i8).abs() == 2;
        if is_double_push {
            *hash ^= ztable.hash_en_passant(mv.to.file());
        }

        // Castling rights: toggle off whatever the move strips.
        let lost = lost_castling_rights(position.castling(), mv, color);
        if !lost.is_none() {
            *hash ^= ztable.hash_castling(lost);
        }

        *hash ^= ztable.hash_turn();
    }

    /// Returns the hash that would result from playing `mv`, without
    /// mutating `self` or computing the child `Position` - used by search
    /// to probe the transposition table before generating the child node.
    pub fn hash_after_move(&self, mv: Move) -> HashKind {
        let move_info = self.position.move_info(mv);
        let mut hash = self.hash;
        self.hash_move(&mut hash, mv, move_info);
        hash
    }

    /// Applies `mv` to both the position and the hash, and records whether
    /// this move captured (for quiescence's last-capture restriction).
    pub fn make_move(&mut self, mv: Move) {
        let move_info = self.position.move_info(mv);
        self.hash_move(&mut self.hash, mv, move_info);
        self.last_capture = move_info.is_capture().then_some(mv.to);
        self.position.make_move(mv);
    }
}

/// XOR over every contribution currently true about `position`: one per
/// occupied square, the castling rights held, the en-passant file if set,
/// and the turn constant when Black is to move.
pub fn slow_hash(position: &Position, ztable: &ZobristTable) -> HashKind {
    let mut hash = 0;
    for (square, piece) in position.iter_pieces() {
        hash ^= ztable.hash_piece(piece, square);
    }
    hash ^= ztable.hash_castling(*position.castling());
    if let Some(ep) = position.en_passant() {
        hash ^= ztable.hash_en_passant(ep.file());
    }
    if *position.side_to_move() == Color::Black {
        hash ^= ztable.hash_turn();
    }
    hash
}

/// Castling rights stripped away by playing `mv`: the king moving, a rook
/// moving from its home corner, or a rook being captured on its home corner.
/// Only rights `current` still holds are reported, so the caller's XOR
/// toggle never flips a constant that was already off.
fn lost_castling_rights(current: &Castling, mv: Move, color: Color) -> Castling {
    let touched = castling_rights_touched(mv, color);
    let mut lost = Castling::NONE;
    for &right in &[
        Castling::W_KING,
        Castling::W_QUEEN,
        Castling::B_KING,
        Castling::B_QUEEN,
    ] {
        if touched.has(right) && current.has(right) {
            lost.set(right);
        }
    }
    lost
}
