//! Linear undo-log game history.
//!
//! `Position` and `Node` only mutate forward, so undoing a move means
//! replaying every move but the last from the base position. `Game` keeps
//! that base position plus the move history needed to do the replay, so
//! the XBoard `undo` command can reconstruct a prior position.

use crate::coretypes::Move;
use crate::error::{self, ErrorKind};
use crate::movelist::MoveHistory;
use crate::position::Position;

/// The base position a game started from, every move played since, and the
/// resulting current position (kept in sync on every mutation).
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Game {
    base_position: Position,
    history: MoveHistory,
    position: Position,
}

impl Game {
    /// A game starting from `base_position` with no moves played yet.
    pub fn new(base_position: Position) -> Self {
        Self {
            base_position,
            history: MoveHistory::new(),
            position: base_position,
        }
    }

    /// A new game in the standard chess starting position.
    pub fn start_position() -> Self {
        Self::new(Position::start_position())
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn base_position(&self) -> &Position {
        &self.base_position
    }

    pub fn history(&self) -> &MoveHistory {
        &self.history
    }

    /// Plays `mv` on the current position and appends it to the history.
    /// Does not itself validate legality; callers are expected to have
    /// checked `mv` against `get_legal_moves()` first (consistent with
    /// `Position::make_move`'s own contract).
    pub fn make_move(&mut self, mv: Move) -> error::Result<()> {
        if self.history.is_full() {
            return Err(ErrorKind::MoveHistoryExceeded.into());
        }
        let move_info = self.position.move_info(mv);
        self.position.make_move(mv);
        self.history.push(move_info);
        Ok(())
    }

    /// Pops the last played move and reinstalls the resulting position by
    /// replaying everything else from `base_position`.
    pub fn undo(&mut self) -> error::Result<()> {
        if self.history.is_empty() {
            return Err((ErrorKind::GameIllegalMove, "no move to undo").into());
        }
        self.history.pop();
        self.replay_from_base();
        Ok(())
    }

    /// Installs `position` as a fresh base, clearing history.
    pub fn set_position(&mut self, position: Position) {
        self.base_position = position;
        self.history.clear();
        self.position = position;
    }

    fn replay_from_base(&mut self) {
        let mut position = self.base_position;
        for move_info in self.history.iter() {
            position.make_move(Move::from(*move_info));
        }
        self.position = position;
    }
}

impl From<Position> for Game {
    fn from(position: Position) -> Self {
        Self::new(position)
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::start_position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coretypes::Square::*;

    #[test]
    fn undo_replays_back_to_prior_position() {
        let mut game = Game::start_position();
        let before = *game.position();
        game.make_move(Move::new(E2, E4, None)).unwrap();
        assert_ne!(*game.position(), before);
        game.undo().unwrap();
        assert_eq!(*game.position(), before);
    }

    #[test]
    fn undo_on_empty_history_is_an_error() {
        let mut game = Game::start_position();
        assert!(game.undo().is_err());
    }

    #[test]
    fn set_position_clears_history() {
        let mut game = Game::start_position();
        game.make_move(Move::new(E2, E4, None)).unwrap();
        game.set_position(Position::start_position());
        assert!(game.history().is_empty());
    }
}
