//! Static position evaluation.
//!
//! Combines material, board control, and king safety from the mover's
//! point of view, reading off the mailbox position's attack tables rather
//! than walking piece lists.

use crate::coretypes::{Color, Cp, File, PieceKind, Rank, Square};
use crate::position::Position;

/// Material value of a piece kind, in the engine's internal centipawn-like
/// unit (×10 of a conventional centipawn — a pawn is worth 1000 here).
const fn material_value(piece_kind: PieceKind) -> Cp {
    match piece_kind {
        PieceKind::Pawn => Cp(1000),
        PieceKind::Knight => Cp(3000),
        PieceKind::Bishop => Cp(3000),
        PieceKind::Rook => Cp(5000),
        PieceKind::Queen => Cp(9000),
        PieceKind::King => Cp(0),
    }
}

/// Squares within squared Euclidean distance ≤ 2 of `center` (its 3×3
/// neighborhood, clipped to the board). Distance 0 is the king's own
/// square, 1 is orthogonally adjacent, 2 is diagonally adjacent; nothing
/// further out qualifies, since `(dx,dy) ∈ {-1,0,1}²` tops out at 2.
fn king_zone(center: Square) -> Vec<Square> {
    let cf = center.file_u8() as i8;
    let cr = center.rank_u8() as i8;
    let mut squares = Vec::with_capacity(9);
    for df in -1i8..=1 {
        for dr in -1i8..=1 {
            let f = cf + df;
            let r = cr + dr;
            if (0..8).contains(&f) && (0..8).contains(&r) {
                let file = File::from_u8(f as u8).unwrap();
                let rank = Rank::from_u8(r as u8).unwrap();
                squares.push(Square::from_idx((file, rank)).unwrap());
            }
        }
    }
    squares
}

/// Fraction (×100) of a king's zone that is not attacked by the other
/// side, i.e. how safe the king's immediate neighborhood currently is.
fn king_safety(position: &Position, king_color: Color) -> Cp {
    let king_sq = position.king_square(king_color);
    let attacker = !king_color;
    let zone = king_zone(king_sq);
    let safe_count = zone
        .iter()
        .filter(|&&sq| position.get_attacks_by_player(sq, attacker) == 0)
        .count();
    Cp((safe_count as i32 * 100) / zone.len() as i32)
}

/// Sum of `by_mover - by_opponent` attacker counts over every square on the
/// board, a cheap proxy for piece activity and central control.
fn board_control(position: &Position, mover: Color) -> Cp {
    let opponent = !mover;
    let mut control = 0i32;
    for square in Square::iter() {
        control += position.get_attacks_by_player(square, mover) as i32;
        control -= position.get_attacks_by_player(square, opponent) as i32;
    }
    Cp(control)
}

fn material(position: &Position, mover: Color) -> Cp {
    let mut total = Cp(0);
    for (_, piece) in position.iter_pieces() {
        let value = material_value(*piece.piece_kind());
        total = if *piece.color() == mover {
            total + value
        } else {
            total - value
        };
    }
    total
}

/// Material + board control + king safety, all from `mover`'s point of
/// view (positive favors the side to move).
pub fn simple_evaluate(position: &Position) -> Cp {
    let mover = *position.side_to_move();
    let opponent = !mover;

    let material_score = material(position, mover);
    let control_score = board_control(position, mover);
    let king_safety_score = king_safety(position, mover) - king_safety(position, opponent);

    material_score + control_score + king_safety_score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::Fen;

    #[test]
    fn start_position_is_balanced() {
        let position = Position::start_position();
        assert_eq!(simple_evaluate(&position), Cp(0));
    }

    #[test]
    fn missing_queen_is_bad_for_its_side() {
        // White has no queen.
        let position =
            Position::parse_fen("rnb1kbnr/pppppppp/8/8/8/8/PPPPPPPP/RNB1KBNR w KQkq - 0 1").unwrap();
        let eval = simple_evaluate(&position);
        assert!(
            eval < Cp(0),
            "white down a queen should evaluate negative, got {eval:?}"
        );
    }

    #[test]
    fn king_zone_is_clipped_at_board_edges() {
        assert_eq!(king_zone(Square::A1).len(), 4);
        assert_eq!(king_zone(Square::E4).len(), 9);
    }

    #[test]
    fn varied_king_placements_produce_a_legal_score() {
        let exposed = Position::parse_fen("rnbqkbnr/8/8/8/8/8/8/RNBQKBNR w KQkq - 0 1").unwrap();
        let castled = Position::parse_fen("rnbq1rk1/8/8/8/8/8/8/RNBQ1RK1 w - - 0 1").unwrap();
        assert!(simple_evaluate(&exposed).is_score());
        assert!(simple_evaluate(&castled).is_score());
    }
}
