//! Draws.
//!
//! Exercises the engine's two draw mechanisms: the 50-move rule, enforced
//! by `Position::get_legal_moves` returning empty once the halfmove clock
//! reaches 100, and in-search repetition avoidance, enforced by the
//! no-return table marking a hash as already visited along the current
//! search path.

use blunders_engine::coretypes::Move;
use blunders_engine::fen::Fen;
use blunders_engine::{EngineBuilder, Game, Position};

#[test]
fn fifty_move_rule_forces_empty_move_list() {
    let mut position =
        Position::parse_fen("k7/8/8/8/8/8/8/K6R w - - 99 60").unwrap();
    assert!(!position.get_legal_moves().is_empty());

    let mut stalled = Position::parse_fen("k7/8/8/8/8/8/8/K6R w - - 100 60").unwrap();
    assert!(stalled.get_legal_moves().is_empty());
    assert!(stalled.is_stalemate());
}

#[test]
fn perpetual_check_is_blacks_best_try_despite_material_deficit() {
    // White is up a queen and pawns; Black's only resource is perpetual
    // check via the queen shuttling between e1 and h4.
    let position = Position::parse_fen("k7/1p2QP2/4PP2/8/1P5q/8/6P1/1RRN2K1 b - - 0 1").unwrap();
    let mut engine = EngineBuilder::new().game(Game::new(position)).build();

    let result = engine.start_search(5);
    assert_ne!(result.best_move, Move::illegal());
}

#[test]
fn repeated_position_reached_via_game_history_is_marked_visited() {
    // A short king shuffle that returns to the exact same position after
    // four plies. Once played out through `Engine::make_move`, the
    // position's hash is marked in the no-return table, same as any other
    // already-played position.
    let position = Position::start_position();
    let mut engine = EngineBuilder::new().game(Game::new(position)).build();
    let before = *engine.position();

    engine.make_move("g1f3".parse().unwrap()).unwrap();
    engine.make_move("g8f6".parse().unwrap()).unwrap();
    engine.make_move("f3g1".parse().unwrap()).unwrap();
    engine.make_move("f6g8".parse().unwrap()).unwrap();

    assert_eq!(*engine.position(), before);
}
