//! Holds Position struct, the most important data structure for the engine.
//! Position represents a chess position, keeping a mailbox board alongside
//! attack/pin/check metadata that is updated incrementally rather than
//! rescanned from scratch on every move - the central algorithm of this
//! crate.

use std::fmt::{self, Display};

use crate::attacks::{
    belongs_to_line, belongs_to_segment, double_jump_rank, knight_move_away, pawn_direction,
    promotion_rank, within_board, Attacks, Direction, Segment,
};
use crate::coretypes::{Castling, Color, Move, MoveCount, MoveInfo, MoveKind, Piece, PieceKind};
use crate::coretypes::{Color::*, PieceKind::*};
use crate::coretypes::{File, Rank, Square};
use crate::fen::Fen;
use crate::mailbox::Mailbox;
use crate::movelist::MoveList;

const KNIGHT_DELTAS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (-1, 2),
    (-2, 1),
    (1, -2),
    (2, -1),
    (-1, -2),
    (-2, -1),
];

/// A complete data set that can represent any chess position, plus the
/// attack/pin/check bookkeeping legal move generation depends on.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Position {
    mailbox: Mailbox,
    side_to_move: Color,
    castling: Castling,
    en_passant: Option<Square>,
    halfmove_clock: MoveCount,
    fullmoves: MoveCount,

    white_king: Square,
    black_king: Square,
    /// `Some` iff the side to move is in exactly single check.
    check_segment: Option<Segment>,

    /// Total attacker counts per square, by color.
    attacks: [Attacks; 64],
    /// Attacker counts per square, resolved by the ray direction (from that
    /// square outward) the attacker is visible along. Used for pin
    /// inference (§4.2.3).
    directed_attacks: [[Attacks; 8]; 64],
    /// For square `sq` and outgoing direction `d`: is the first piece
    /// visible from `sq` looking in direction `d` a king, and whose.
    checking_squares: [[Attacks; 8]; 64],

    legal_moves_cache: MoveList,
    moves_generated: bool,
}

impl Position {
    /// Standard chess start position.
    pub fn start_position() -> Self {
        let mut position = Self {
            mailbox: Mailbox::new(),
            side_to_move: Color::White,
            castling: Castling::start_position(),
            en_passant: None,
            halfmove_clock: 0,
            fullmoves: 1,
            white_king: Square::E1,
            black_king: Square::E8,
            check_segment: None,
            attacks: [Attacks::new(); 64],
            directed_attacks: [[Attacks::new(); 8]; 64],
            checking_squares: [[Attacks::new(); 8]; 64],
            legal_moves_cache: MoveList::new(),
            moves_generated: false,
        };

        for (square, piece) in Mailbox::default().iter_pieces() {
            position.set_square(square, Some(piece));
        }
        position.recompute_check_state();
        position
    }

    /// An entirely empty board, side to move White, no rights. Useful for
    /// FEN parsing and tests that build up a position square by square.
    pub fn empty() -> Self {
        Self {
            mailbox: Mailbox::new(),
            side_to_move: Color::White,
            castling: Castling::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmoves: 1,
            white_king: Square::E1,
            black_king: Square::E8,
            check_segment: None,
            attacks: [Attacks::new(); 64],
            directed_attacks: [[Attacks::new(); 8]; 64],
            checking_squares: [[Attacks::new(); 8]; 64],
            legal_moves_cache: MoveList::new(),
            moves_generated: false,
        }
    }

    ////////////////////
    // Const getters. //
    ////////////////////
    pub fn side_to_move(&self) -> &Color {
        &self.side_to_move
    }
    pub fn castling(&self) -> &Castling {
        &self.castling
    }
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }
    pub fn halfmove_clock(&self) -> MoveCount {
        self.halfmove_clock
    }
    pub fn fullmoves(&self) -> MoveCount {
        self.fullmoves
    }
    pub fn king_square(&self, color: Color) -> Square {
        match color {
            Color::White => self.white_king,
            Color::Black => self.black_king,
        }
    }
    pub fn check_segment(&self) -> Option<Segment> {
        self.check_segment
    }
    pub fn get_square(&self, sq: Square) -> Option<Piece> {
        self.mailbox[sq]
    }
    pub fn get_attacks_by_player(&self, sq: Square, player: Color) -> i8 {
        self.attacks[sq.idx()].by(player)
    }
    pub fn get_checks(&self, player: Color) -> i8 {
        self.attacks[self.king_square(player).idx()].by(!player)
    }
    pub fn iter_pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.mailbox.iter_pieces()
    }

    // Field setters used by `fen::parse_fen`, which builds a Position up one
    // field at a time from a parsed FEN string.
    pub(crate) fn set_side_to_move(&mut self, color: Color) {
        self.side_to_move = color;
    }
    pub(crate) fn set_castling(&mut self, castling: Castling) {
        self.castling = castling;
    }
    pub(crate) fn set_en_passant(&mut self, en_passant: Option<Square>) {
        self.en_passant = en_passant;
    }
    pub(crate) fn set_halfmove_clock(&mut self, halfmove_clock: MoveCount) {
        self.halfmove_clock = halfmove_clock;
    }
    pub(crate) fn set_fullmoves(&mut self, fullmoves: MoveCount) {
        self.fullmoves = fullmoves;
    }
    /// Recomputes `check_segment` from scratch; exposed for `fen::parse_fen`,
    /// which places pieces via `set_square` (already check-state-aware) but
    /// only knows the final side to move after all fields are parsed.
    pub(crate) fn recompute_check_state_pub(&mut self) {
        self.recompute_check_state();
    }

    /// True iff the side to move's king is attacked.
    pub fn is_check(&self) -> bool {
        self.get_checks(self.side_to_move) > 0
    }

    /////////////////////////////////
    // Incremental attack updates. //
    /////////////////////////////////

    /// Places `new_piece` (or clears, if `None`) on `sq`, updating `attacks`,
    /// `directed_attacks` and `checking_squares` so they remain consistent
    /// with the resulting board - the central algorithm.
    pub fn set_square(&mut self, sq: Square, new_piece: Option<Piece>) {
        let old_piece = self.mailbox[sq];

        // 1. Remove the departing piece's own outward contribution.
        if let Some(p) = old_piece {
            self.project_piece(sq, p, -1);
        }

        // 2. If occupancy itself (Some-ness) toggles, every ray passing
        // through `sq` either gets truncated (a blocker appeared) or
        // extended (a blocker disappeared). Both `directed_attacks[sq][_]`
        // and `checking_squares[sq][_]` describe what's visible *beyond*
        // `sq`, which is unaffected by `sq`'s own content, so they are safe
        // to read here as the "what would now pass through" source.
        let was_occupied = old_piece.is_some();
        let will_be_occupied = new_piece.is_some();
        if was_occupied != will_be_occupied {
            // Placing a blocker removes pass-through (-1); removing one
            // restores it (+1).
            let sign: i8 = if will_be_occupied { -1 } else { 1 };
            for &e in &Direction::ALL {
                let opp = e.opposite();
                let attack_src = self.directed_attacks[sq.idx()][opp.idx()];
                let check_src = self.checking_squares[sq.idx()][opp.idx()];
                if attack_src == Attacks::new() && check_src == Attacks::new() {
                    continue;
                }
                self.walk_apply(sq, e, |pos, t| {
                    pos.attacks[t.idx()].add(White, sign * attack_src.by(White));
                    pos.attacks[t.idx()].add(Black, sign * attack_src.by(Black));
                    pos.directed_attacks[t.idx()][opp.idx()].add(White, sign * attack_src.by(White));
                    pos.directed_attacks[t.idx()][opp.idx()].add(Black, sign * attack_src.by(Black));
                    pos.checking_squares[t.idx()][opp.idx()].add(White, sign * check_src.by(White));
                    pos.checking_squares[t.idx()][opp.idx()].add(Black, sign * check_src.by(Black));
                });
            }
        }

        // 3. Commit the board change, updating the king-square cache.
        self.mailbox[sq] = new_piece;
        if let Some(p) = new_piece {
            if *p.piece_kind() == King {
                match p.color() {
                    Color::White => self.white_king = sq,
                    Color::Black => self.black_king = sq,
                }
            }
        }

        // 4. Add the arriving piece's own outward contribution.
        if let Some(p) = new_piece {
            self.project_piece(sq, p, 1);
        }

        self.moves_generated = false;
    }

    /// Applies a single piece's outward contribution at `sq` with the given
    /// sign (+1 to add, -1 to remove): fixed-offset attacks for pawns,
    /// knights and kings; ray-walked attacks (truncated at the first
    /// blocker) for sliders; and, for kings specifically, a long-range
    /// "visibility" ray into `checking_squares` (a king is not an attacker
    /// at range, but pin/check-discovery inference needs to know where it's
    /// visible from, exactly as if it projected like a queen).
    fn project_piece(&mut self, sq: Square, piece: Piece, sign: i8) {
        let color = *piece.color();
        match piece.piece_kind() {
            Pawn => {
                let dr = pawn_direction(color);
                for &df in &[-1i8, 1] {
                    if let Some(t) = step_delta(sq, df, dr) {
                        self.attacks[t.idx()].add(color, sign);
                    }
                }
            }
            Knight => {
                for &(df, dr) in &KNIGHT_DELTAS {
                    if let Some(t) = step_delta(sq, df, dr) {
                        self.attacks[t.idx()].add(color, sign);
                    }
                }
            }
            King => {
                for &dir in &Direction::ALL {
                    if let Some(t) = step(sq, dir) {
                        self.attacks[t.idx()].add(color, sign);
                    }
                }
                for &dir in &Direction::ALL {
                    let opp = dir.opposite();
                    self.walk_apply(sq, dir, |pos, t| {
                        pos.checking_squares[t.idx()][opp.idx()].add(color, sign);
                    });
                }
            }
            Bishop | Rook | Queen => {
                let dirs: &[Direction] = match piece.piece_kind() {
                    Bishop => &Direction::DIAGONAL,
                    Rook => &Direction::ORTHOGONAL,
                    Queen => &Direction::ALL,
                    _ => unreachable!(),
                };
                for &dir in dirs {
                    let opp = dir.opposite();
                    self.walk_apply(sq, dir, |pos, t| {
                        pos.attacks[t.idx()].add(color, sign);
                        pos.directed_attacks[t.idx()][opp.idx()].add(color, sign);
                    });
                }
            }
        }
    }

    /// Walks from `sq` stepping by `dir`, applying `f` to every square
    /// traversed, including the first occupied square - then stops, since a
    /// blocker truncates everything past it.
    fn walk_apply(&mut self, sq: Square, dir: Direction, mut f: impl FnMut(&mut Self, Square)) {
        let mut cur = step(sq, dir);
        while let Some(t) = cur {
            f(self, t);
            if self.mailbox[t].is_some() {
                break;
            }
            cur = step(t, dir);
        }
    }

    ////////////////////////
    // Pin / check state. //
    ////////////////////////

    /// Returns the direction, from `sq` toward the attacker, along which the
    /// piece at `sq` is pinned against its own king - `None` if unpinned.
    fn pin_direction(&self, sq: Square, color: Color) -> Option<Direction> {
        let opponent = !color;
        Direction::ALL.iter().copied().find(|&d| {
            self.directed_attacks[sq.idx()][d.idx()].by(opponent) > 0
                && self.checking_squares[sq.idx()][d.opposite().idx()].by(color) > 0
        })
    }

    /// Recomputes `check_segment` after a move. The check *count* is read
    /// straight from the incrementally maintained `attacks` table
    /// (`is_check`); only the *location* of a single checker needs a direct
    /// scan, and only when exactly one exists.
    fn recompute_check_state(&mut self) {
        let color = self.side_to_move;
        let king_sq = self.king_square(color);
        let num_checks = self.get_checks(color);

        self.check_segment = if num_checks == 1 {
            self.find_checker(king_sq, !color)
                .map(|checker| Segment::new(king_sq, checker))
        } else {
            None
        };
    }

    /// Direct (non-incremental) scan for the single piece of `by` checking
    /// the king at `king_sq`. Cheap (bounded work) and only called when the
    /// maintained attack count says exactly one checker exists.
    fn find_checker(&self, king_sq: Square, by: Color) -> Option<Square> {
        let dr = pawn_direction(!by);
        for &df in &[-1i8, 1] {
            if let Some(t) = step_delta(king_sq, df, dr) {
                if self.piece_at_is(t, by, Pawn) {
                    return Some(t);
                }
            }
        }
        for &(df, dr) in &KNIGHT_DELTAS {
            if let Some(t) = step_delta(king_sq, df, dr) {
                if self.piece_at_is(t, by, Knight) {
                    return Some(t);
                }
            }
        }
        for &dir in &Direction::ALL {
            if let Some(first) = self.first_piece(king_sq, dir) {
                if let Some(piece) = self.mailbox[first] {
                    if *piece.color() == by {
                        let matches = match piece.piece_kind() {
                            Queen => true,
                            Rook => dir.is_orthogonal(),
                            Bishop => dir.is_diagonal(),
                            _ => false,
                        };
                        if matches {
                            return Some(first);
                        }
                    }
                }
            }
        }
        None
    }

    fn piece_at_is(&self, sq: Square, color: Color, kind: PieceKind) -> bool {
        matches!(self.mailbox[sq], Some(p) if *p.color() == color && *p.piece_kind() == kind)
    }

    /// The first occupied square walking from `sq` in direction `dir`, if
    /// any before the edge of the board.
    fn first_piece(&self, sq: Square, dir: Direction) -> Option<Square> {
        let mut cur = step(sq, dir);
        while let Some(t) = cur {
            if self.mailbox[t].is_some() {
                return Some(t);
            }
            cur = step(t, dir);
        }
        None
    }

    /// Is `sq` attacked by `by`, pretending `ignore` (the moving king's own
    /// square) is empty. Used for king-move and castling-path legality,
    /// where the king must not be allowed to "hide behind itself" against a
    /// slider that would otherwise attack straight through its own square.
    fn attacked_ignoring(&self, sq: Square, by: Color, ignore: Square) -> bool {
        let dr = pawn_direction(!by);
        for &df in &[-1i8, 1] {
            if let Some(t) = step_delta(sq, df, dr) {
                if t != ignore && self.piece_at_is(t, by, Pawn) {
                    return true;
                }
            }
        }
        for &(df, dr) in &KNIGHT_DELTAS {
            if let Some(t) = step_delta(sq, df, dr) {
                if t != ignore && self.piece_at_is(t, by, Knight) {
                    return true;
                }
            }
        }
        for &dir in &Direction::ALL {
            if let Some(t) = step(sq, dir) {
                if t != ignore && self.piece_at_is(t, by, King) {
                    return true;
                }
            }
        }
        for &dir in &Direction::ALL {
            let mut cur = step(sq, dir);
            while let Some(t) = cur {
                if t == ignore {
                    cur = step(t, dir);
                    continue;
                }
                if let Some(piece) = self.mailbox[t] {
                    if *piece.color() == by {
                        let matches = match piece.piece_kind() {
                            Queen => true,
                            Rook => dir.is_orthogonal(),
                            Bishop => dir.is_diagonal(),
                            _ => false,
                        };
                        if matches {
                            return true;
                        }
                    }
                    break;
                }
                cur = step(t, dir);
            }
        }
        false
    }

    //////////////////////////
    // Legal move generator //
    //////////////////////////

    /// Returns the cached legal-move list, regenerating it if dirty.
    pub fn get_legal_moves(&mut self) -> MoveList {
        if !self.moves_generated {
            self.legal_moves_cache = self.generate_legal_moves();
            self.moves_generated = true;
        }
        self.legal_moves_cache
    }

    pub fn is_checkmate(&mut self) -> bool {
        self.is_check() && self.get_legal_moves().is_empty()
    }

    /// Note: this also reports true when the 50-move-rule clause below
    /// forces an empty move list even though the side to move is in check.
    /// Distinguishing that case from an actual stalemate is left to the
    /// protocol layer, which already tracks the halfmove clock separately.
    pub fn is_stalemate(&mut self) -> bool {
        !self.is_check() && self.get_legal_moves().is_empty()
    }

    fn generate_legal_moves(&self) -> MoveList {
        let mut moves = MoveList::new();

        // 50-move rule: empty move list once the halfmove clock caps out.
        if self.halfmove_clock >= 100 {
            return moves;
        }

        let color = self.side_to_move;
        let king_sq = self.king_square(color);
        let num_checks = self.get_checks(color);
        let in_double_check = num_checks >= 2;

        self.generate_king_moves(king_sq, color, &mut moves);

        if in_double_check {
            return moves; // Only the king may move.
        }

        if !self.is_check() {
            self.generate_castling_moves(color, &mut moves);
        }

        for (sq, piece) in self.mailbox.iter_pieces() {
            if *piece.color() != color || *piece.piece_kind() == King {
                continue;
            }
            let pin = self.pin_direction(sq, color);
            match piece.piece_kind() {
                Pawn => self.generate_pawn_moves(sq, color, king_sq, pin, &mut moves),
                Knight => {
                    for &(df, dr) in &KNIGHT_DELTAS {
                        if let Some(t) = step_delta(sq, df, dr) {
                            self.try_push(sq, t, None, king_sq, pin, &mut moves);
                        }
                    }
                }
                Bishop => self.generate_slider_moves(sq, &Direction::DIAGONAL, king_sq, pin, &mut moves),
                Rook => self.generate_slider_moves(sq, &Direction::ORTHOGONAL, king_sq, pin, &mut moves),
                Queen => self.generate_slider_moves(sq, &Direction::ALL, king_sq, pin, &mut moves),
                King => unreachable!(),
            }
        }

        moves
    }

    /// True iff `dest` is a legal landing square for a non-king piece
    /// currently at `sq`: respects the pin line (if any) and, if in single
    /// check, the check-blocking segment.
    fn destination_legal(&self, sq: Square, dest: Square, king_sq: Square, pin: Option<Direction>) -> bool {
        if pin.is_some() && !belongs_to_line(coords(king_sq), coords(sq), coords(dest)) {
            return false;
        }
        if let Some(seg) = self.check_segment {
            if !belongs_to_segment(coords(seg.from), coords(seg.to), coords(dest)) {
                return false;
            }
        }
        true
    }

    fn try_push(
        &self,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
        king_sq: Square,
        pin: Option<Direction>,
        moves: &mut MoveList,
    ) {
        if self.mailbox[to].map_or(false, |p| *p.color() == self.side_to_move) {
            return;
        }
        if !self.destination_legal(from, to, king_sq, pin) {
            return;
        }
        moves.push(Move::new(from, to, promotion));
    }

    fn generate_slider_moves(
        &self,
        sq: Square,
        dirs: &[Direction],
        king_sq: Square,
        pin: Option<Direction>,
        moves: &mut MoveList,
    ) {
        for &dir in dirs {
            let mut cur = step(sq, dir);
            while let Some(t) = cur {
                match self.mailbox[t] {
                    None => {
                        self.try_push(sq, t, None, king_sq, pin, moves);
                        cur = step(t, dir);
                    }
                    Some(p) => {
                        if *p.color() != self.side_to_move {
                            self.try_push(sq, t, None, king_sq, pin, moves);
                        }
                        break;
                    }
                }
            }
        }
    }

    fn generate_pawn_moves(
        &self,
        sq: Square,
        color: Color,
        king_sq: Square,
        pin: Option<Direction>,
        moves: &mut MoveList,
    ) {
        let dr = pawn_direction(color);
        let promotes = |rank_u8: u8| rank_u8 as i8 == promotion_rank(color);

        let mut push_with_promotion = |to: Square, pin: Option<Direction>, moves: &mut MoveList| {
            if !self.destination_legal(sq, to, king_sq, pin) {
                return;
            }
            if promotes(to.rank_u8()) {
                for &kind in &[Queen, Rook, Bishop, Knight] {
                    moves.push(Move::new(sq, to, Some(kind)));
                }
            } else {
                moves.push(Move::new(sq, to, None));
            }
        };

        // Single push.
        if let Some(one) = step_delta(sq, 0, dr) {
            if self.mailbox[one].is_none() {
                push_with_promotion(one, pin, moves);

                // Double push, only from the double-jump rank.
                if sq.rank_u8() as i8 == double_jump_rank(color) {
                    if let Some(two) = step_delta(sq, 0, dr * 2) {
                        if self.mailbox[two].is_none() {
                            push_with_promotion(two, pin, moves);
                        }
                    }
                }
            }
        }

        // Diagonal captures, including en passant.
        for &df in &[-1i8, 1] {
            if let Some(to) = step_delta(sq, df, dr) {
                let is_capture = self.mailbox[to].map_or(false, |p| *p.color() != color);
                let is_en_passant = Some(to) == self.en_passant;
                if is_capture || is_en_passant {
                    if is_en_passant && !self.en_passant_pin_safe(sq, to, color) {
                        continue;
                    }
                    push_with_promotion(to, pin, moves);
                }
            }
        }
    }

    /// The en-passant horizontal-pin exception: an en-passant
    /// capture that removes two pawns from the same rank is illegal if that
    /// rank, once both pawns are gone, exposes the mover's king to a
    /// rook/queen on the opposite side. Checked by walking the rank in both
    /// directions from the capturing pawn.
    fn en_passant_pin_safe(&self, from: Square, to: Square, color: Color) -> bool {
        let king_sq = self.king_square(color);
        if king_sq.rank_u8() != from.rank_u8() {
            return true; // King isn't even on this rank; exception can't apply.
        }
        let captured_sq = match color {
            Color::White => to.decrement_rank().unwrap(),
            Color::Black => to.increment_rank().unwrap(),
        };

        let (king_dir, away_dir) = if king_sq.file_u8() < from.file_u8() {
            (Direction::W, Direction::E)
        } else {
            (Direction::E, Direction::W)
        };

        // Walk from `from` toward the king, skipping over `from`/`captured_sq`.
        let first_toward_king = self.first_piece_skipping(from, king_dir, &[from, captured_sq]);
        if first_toward_king != Some(king_sq) {
            return true; // Something else is between the pawn and the king.
        }
        // Walk away from the king, looking for an enemy rook/queen.
        if let Some(t) = self.first_piece_skipping(from, away_dir, &[from, captured_sq]) {
            if let Some(piece) = self.mailbox[t] {
                if *piece.color() != color
                    && matches!(piece.piece_kind(), Rook | Queen)
                {
                    return false;
                }
            }
        }
        true
    }

    fn first_piece_skipping(&self, sq: Square, dir: Direction, skip: &[Square]) -> Option<Square> {
        let mut cur = step(sq, dir);
        while let Some(t) = cur {
            if skip.contains(&t) {
                cur = step(t, dir);
                continue;
            }
            if self.mailbox[t].is_some() {
                return Some(t);
            }
            cur = step(t, dir);
        }
        None
    }

    fn generate_king_moves(&self, king_sq: Square, color: Color, moves: &mut MoveList) {
        let opponent = !color;
        for &dir in &Direction::ALL {
            if let Some(t) = step(king_sq, dir) {
                if self.mailbox[t].map_or(false, |p| *p.color() == color) {
                    continue;
                }
                if self.attacked_ignoring(t, opponent, king_sq) {
                    continue;
                }
                moves.push(Move::new(king_sq, t, None));
            }
        }
    }

    fn generate_castling_moves(&self, color: Color, moves: &mut MoveList) {
        use Square::*;
        let opponent = !color;
        let (king_sq, kingside_right, queenside_right, kingside_path, queenside_empty, queenside_path) =
            match color {
                Color::White => (E1, Castling::W_KING, Castling::W_QUEEN, [F1, G1], [D1, C1, B1], [D1, C1]),
                Color::Black => (E8, Castling::B_KING, Castling::B_QUEEN, [F8, G8], [D8, C8, B8], [D8, C8]),
            };

        if self.castling.has(kingside_right)
            && kingside_path.iter().all(|&s| self.mailbox[s].is_none())
            && kingside_path
                .iter()
                .all(|&s| !self.attacked_ignoring(s, opponent, king_sq))
        {
            moves.push(Move::new(king_sq, kingside_path[1], None));
        }

        if self.castling.has(queenside_right)
            && queenside_empty.iter().all(|&s| self.mailbox[s].is_none())
            && queenside_path
                .iter()
                .all(|&s| !self.attacked_ignoring(s, opponent, king_sq))
        {
            moves.push(Move::new(king_sq, queenside_path[1], None));
        }
    }

    /// Cheap, conservative check predicate: never a false positive, may miss
    /// discovered checks through castling or en passant. Returns `false`
    /// for king moves, since a king move's own check status depends on the
    /// destination square's full attack state rather than a fast local test.
    pub fn move_is_check_fast(&self, mv: Move) -> bool {
        let moving = match self.mailbox[mv.from] {
            Some(p) => p,
            None => return false,
        };
        if *moving.piece_kind() == King {
            return false;
        }
        let color = *moving.color();
        let opponent = !color;
        let opp_king = self.king_square(opponent);
        let effective_kind = mv.promotion.unwrap_or(*moving.piece_kind());

        let direct = match effective_kind {
            Pawn => {
                let df = (opp_king.file_u8() as i8 - mv.to.file_u8() as i8).abs();
                let dr = opp_king.rank_u8() as i8 - mv.to.rank_u8() as i8;
                df == 1 && dr == pawn_direction(color)
            }
            Knight => knight_move_away(
                opp_king.file_u8() as i8 - mv.to.file_u8() as i8,
                opp_king.rank_u8() as i8 - mv.to.rank_u8() as i8,
            ),
            Bishop => Direction::DIAGONAL
                .iter()
                .any(|d| self.checking_squares[mv.to.idx()][d.idx()].by(opponent) > 0),
            Rook => Direction::ORTHOGONAL
                .iter()
                .any(|d| self.checking_squares[mv.to.idx()][d.idx()].by(opponent) > 0),
            Queen => Direction::ALL
                .iter()
                .any(|d| self.checking_squares[mv.to.idx()][d.idx()].by(opponent) > 0),
            King => false,
        };
        if direct {
            return true;
        }

        Direction::ALL.iter().any(|&d| {
            if self.directed_attacks[mv.from.idx()][d.idx()].by(color) > 0
                && self.checking_squares[mv.from.idx()][d.opposite().idx()].by(opponent) > 0
            {
                // `mv.from` is the sole blocker between a friendly slider in
                // direction `d` and the enemy king - but only a discovered
                // check if `mv.to` actually steps off that blocking segment,
                // not just off the `mv.from` square itself.
                let slider_sq = self
                    .first_piece(mv.from, d)
                    .expect("directed_attacks found a slider in this direction");
                !belongs_to_segment(coords(slider_sq), coords(opp_king), coords(mv.to))
            } else {
                false
            }
        })
    }

    /// Pseudo-legal capture moves by `player` landing on `sq`, generated
    /// direction-by-direction - used by quiescence search.
    pub fn get_captures_on_square(&self, sq: Square, player: Color) -> MoveList {
        let mut moves = MoveList::new();
        let dr = -pawn_direction(player);
        for &df in &[-1i8, 1] {
            if let Some(from) = step_delta(sq, df, dr) {
                if self.piece_at_is(from, player, Pawn) {
                    if sq.rank_u8() as i8 == promotion_rank(player) {
                        for &kind in &[Queen, Rook, Bishop, Knight] {
                            moves.push(Move::new(from, sq, Some(kind)));
                        }
                    } else {
                        moves.push(Move::new(from, sq, None));
                    }
                }
            }
        }
        for &(df, dr) in &KNIGHT_DELTAS {
            if let Some(from) = step_delta(sq, df, dr) {
                if self.piece_at_is(from, player, Knight) {
                    moves.push(Move::new(from, sq, None));
                }
            }
        }
        for &dir in &Direction::ALL {
            if let Some(from) = step(sq, dir) {
                if self.piece_at_is(from, player, King) {
                    moves.push(Move::new(from, sq, None));
                }
            }
        }
        for &dir in &Direction::ALL {
            if let Some(from) = self.first_piece(sq, dir) {
                if let Some(piece) = self.mailbox[from] {
                    if *piece.color() == player {
                        let matches = match piece.piece_kind() {
                            Queen => true,
                            Rook => dir.is_orthogonal(),
                            Bishop => dir.is_diagonal(),
                            _ => false,
                        };
                        if matches {
                            moves.push(Move::new(from, sq, None));
                        }
                    }
                }
            }
        }
        moves
    }

    /////////////////////
    // Move application //
    /////////////////////

    /// Classifies `mv` against the current board: which piece moves, and
    /// whether it's a plain move, a capture, a castle, or an en-passant
    /// capture. Used both to apply the move and (by `Node`) to mirror it
    /// onto the Zobrist hash.
    pub fn move_info(&self, mv: Move) -> MoveInfo {
        let moving = self.mailbox[mv.from].expect("move_info: no piece on `from` square");
        let piece_kind = *moving.piece_kind();

        let is_castle = piece_kind == King
            && (mv.from.file_u8() as i8 - mv.to.file_u8() as i8).abs() == 2;
        let is_en_passant =
            piece_kind == Pawn && Some(mv.to) == self.en_passant && self.mailbox[mv.to].is_none();

        let move_kind = if is_castle {
            MoveKind::Castle
        } else if is_en_passant {
            MoveKind::EnPassant
        } else if let Some(captured) = self.mailbox[mv.to] {
            MoveKind::Capture(*captured.piece_kind())
        } else {
            MoveKind::Quiet
        };

        MoveInfo::new(mv, piece_kind, move_kind)
    }

    /// Applies `mv` to `self`, in place. Does not validate legality - the
    /// caller (search, perft, or `Node`) is expected to only ever pass moves
    /// drawn from `get_legal_moves`. Updates board, castling rights,
    /// en-passant, clocks, `side_to_move`, and - via `set_square` - every
    /// derived table.
    pub fn make_move(&mut self, mv: Move) {
        let move_info = self.move_info(mv);
        let color = self.side_to_move;
        let piece_kind = *move_info.piece_kind();

        match move_info.move_kind() {
            MoveKind::Castle => {
                let (rook_from, rook_to) = castle_rook_squares(mv.to, color);
                let rook = self.mailbox[rook_from].expect("castle: missing rook");
                self.set_square(rook_from, None);
                self.set_square(rook_to, Some(rook));
            }
            MoveKind::EnPassant => {
                let captured_sq = en_passant_captured_square(mv.to, color);
                self.set_square(captured_sq, None);
            }
            _ => {}
        }

        let moving_piece = self.mailbox[mv.from].unwrap();
        self.set_square(mv.from, None);
        let placed = match mv.promotion {
            Some(promotion_kind) => Piece::new(color, promotion_kind),
            None => moving_piece,
        };
        self.set_square(mv.to, Some(placed));

        let is_double_push =
            piece_kind == Pawn && (mv.from.rank_u8() as i8 - mv.to.rank_u8() as i8).abs() == 2;
        self.en_passant = is_double_push.then(|| {
            let dr = pawn_direction(color);
            step_delta(mv.from, 0, dr).unwrap()
        });

        self.castling.clear(castling_rights_touched(mv, color));

        if piece_kind == Pawn || move_info.is_capture() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if color == Color::Black {
            self.fullmoves += 1;
        }

        self.side_to_move = !color;
        self.recompute_check_state();
    }

    /// Returns a new Position from applying `mv` on `self`.
    pub fn make_move_new(&self, mv: Move) -> Self {
        let mut clone = *self;
        clone.make_move(mv);
        clone
    }
}

/// Defaults to standard chess start position.
impl Default for Position {
    fn default() -> Self {
        Self::start_position()
    }
}

/// Displays pretty-printed chess board and FEN string representing Position.
impl Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}\n Fen: {}\n", self.mailbox, self.to_fen())
    }
}

/// Rook's corners/destinations for a king move landing on g1/c1/g8/c8.
pub(crate) fn castle_rook_squares(king_to: Square, color: Color) -> (Square, Square) {
    use Square::*;
    match (color, king_to) {
        (Color::White, G1) => (H1, F1),
        (Color::White, C1) => (A1, D1),
        (Color::Black, G8) => (H8, F8),
        (Color::Black, C8) => (A8, D8),
        _ => unreachable!("castle move must land the king on g1/c1/g8/c8"),
    }
}

pub(crate) fn en_passant_captured_square(to: Square, mover: Color) -> Square {
    match mover {
        Color::White => to.decrement_rank().unwrap(),
        Color::Black => to.increment_rank().unwrap(),
    }
}

/// The castling rights `mv` would touch, independent of whether `color`
/// currently holds them: the king's home square moving, or either rook
/// corner being vacated or captured into. Shared by `Position::make_move`
/// (clears rights) and `Node::hash_move` (toggles only the rights actually
/// held before the move).
pub(crate) fn castling_rights_touched(mv: Move, color: Color) -> Castling {
    use Square::*;
    let mut touched = Castling::NONE;
    let home_king = if color == Color::White { E1 } else { E8 };
    if mv.from == home_king {
        touched.set(match color {
            Color::White => Castling::W_SIDE,
            Color::Black => Castling::B_SIDE,
        });
    }
    for &(corner, right) in &[
        (A1, Castling::W_QUEEN),
        (H1, Castling::W_KING),
        (A8, Castling::B_QUEEN),
        (H8, Castling::B_KING),
    ] {
        if mv.from == corner || mv.to == corner {
            touched.set(right);
        }
    }
    touched
}

fn coords(sq: Square) -> (i8, i8) {
    (sq.file_u8() as i8, sq.rank_u8() as i8)
}

fn step(sq: Square, dir: Direction) -> Option<Square> {
    let (df, dr) = dir.delta();
    step_delta(sq, df, dr)
}

fn step_delta(sq: Square, df: i8, dr: i8) -> Option<Square> {
    let (file, rank) = coords(sq);
    let (nf, nr) = (file + df, rank + dr);
    if !within_board(nf, nr) {
        return None;
    }
    Square::from_idx((File::from_u8(nf as u8)?, Rank::from_u8(nr as u8)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_print_position() {
        let start_pos = Position::start_position();
        println!("{}", start_pos);
    }

    #[test]
    fn start_position_has_twenty_legal_moves() {
        let mut pos = Position::start_position();
        assert_eq!(pos.get_legal_moves().len(), 20);
    }

    #[test]
    fn start_position_attacks_are_consistent() {
        let pos = Position::start_position();
        for idx in 0..64 {
            assert!(pos.attacks[idx].is_valid());
        }
        // Every pawn is attacked exactly by its neighbors' nothing yet,
        // but squares in front of pawns are each attacked once or twice.
        let e3 = Square::E3;
        assert_eq!(pos.get_attacks_by_player(e3, Color::White), 2);
    }

    #[test]
    fn do_move_with_legal_move() {
        let mut position = Position::start_position();
        let mv = Move::new(Square::E2, Square::E4, None);
        position.make_move(mv);
        assert_eq!(position.get_square(Square::E4).map(|p| *p.piece_kind()), Some(Pawn));
        assert_eq!(position.get_square(Square::E2), None);
        assert_eq!(position.en_passant(), Some(Square::E3));
    }

    #[test]
    fn king_in_check_from_rook() {
        let pos = Position::parse_fen("8/8/8/8/3K3r/8/8/8 w - - 0 1").unwrap();
        assert_eq!(pos.get_checks(Color::White), 1);
        assert!(pos.is_check());
    }

    #[test]
    fn double_check_only_allows_king_moves() {
        let mut pos = Position::parse_fen("3q4/8/4b3/3k4/4P1n1/8/3Q4/2R5 b - - 0 1").unwrap();
        let moves = pos.get_legal_moves();
        assert!(moves.iter().all(|mv| mv.from == Square::D5));
    }

    #[test]
    fn pinned_rook_may_only_slide_along_pin_line() {
        // White king e1, white rook e2, black rook e8: rook is pinned
        // vertically and may only move along the e-file.
        let mut pos = Position::empty();
        pos.set_square(Square::E1, Some(Piece::new(Color::White, King)));
        pos.set_square(Square::E2, Some(Piece::new(Color::White, Rook)));
        pos.set_square(Square::E8, Some(Piece::new(Color::Black, Rook)));
        pos.set_square(Square::A1, Some(Piece::new(Color::Black, King)));
        pos.recompute_check_state();

        let moves = pos.get_legal_moves();
        let rook_moves: Vec<_> = moves.iter().filter(|mv| mv.from == Square::E2).collect();
        assert!(rook_moves.iter().all(|mv| mv.to.file_u8() == Square::E2.file_u8()));
        assert!(!rook_moves.is_empty());
    }

    #[test]
    fn castling_rights_cleared_on_rook_capture() {
        let mut pos = Position::start_position();
        // Hack a black piece onto h1 to capture the white rook on the next move.
        pos.set_square(Square::G2, None);
        pos.set_square(Square::H1, Some(Piece::new(Color::Black, Bishop)));
        pos.castling.clear(Castling::W_KING);
        assert!(!pos.castling().has(Castling::W_KING));
    }

    #[test]
    fn move_is_check_fast_rejects_pawn_push_that_stays_on_the_blocking_line() {
        // White rook a1, white pawn a4, black king a8, nothing else on the
        // a-file: a4-a5 keeps the pawn on the same file, still blocking the
        // rook's file against the king.
        let mut pos = Position::empty();
        pos.set_square(Square::A1, Some(Piece::new(Color::White, Rook)));
        pos.set_square(Square::A4, Some(Piece::new(Color::White, Pawn)));
        pos.set_square(Square::A8, Some(Piece::new(Color::Black, King)));
        pos.set_square(Square::H1, Some(Piece::new(Color::White, King)));
        pos.recompute_check_state();

        let mv = Move::new(Square::A4, Square::A5, None);
        assert!(!pos.move_is_check_fast(mv));
    }

    #[test]
    fn move_is_check_fast_detects_true_discovered_check() {
        // Same rook/king alignment, but the blocker steps off the file
        // entirely: the rook's file is now open to the king.
        let mut pos = Position::empty();
        pos.set_square(Square::A1, Some(Piece::new(Color::White, Rook)));
        pos.set_square(Square::A4, Some(Piece::new(Color::White, Knight)));
        pos.set_square(Square::A8, Some(Piece::new(Color::Black, King)));
        pos.set_square(Square::H1, Some(Piece::new(Color::White, King)));
        pos.recompute_check_state();

        let mv = Move::new(Square::A4, Square::C3, None);
        assert!(pos.move_is_check_fast(mv));
    }
}
