//! Performance Test (perft).
//!
//! Counts leaf positions at a fixed depth and checks them against
//! well-known results: <https://www.chessprogramming.org/Perft_Results>.
//! Every scenario also cross-checks the naive tree walk against the
//! hash-assisted memoized counter, which must always agree.

use std::str::FromStr;
use std::sync::Arc;

use blunders_engine::fen::Fen;
use blunders_engine::perft::{perft, perft_hash_assisted};
use blunders_engine::{Move, Position, ZobristTable};

fn assert_perft(position: Position, ply: u32, expected: u64) {
    let ztable = Arc::new(ZobristTable::default());
    let naive = perft(position, ply);
    let assisted = perft_hash_assisted(position, ztable, ply);
    assert_eq!(naive, assisted, "naive/hash-assisted disagreement at ply {}", ply);
    assert_eq!(naive.nodes, expected, "perft({}) mismatch", ply);
}

#[test]
fn perft_starting_position() {
    let position = Position::start_position();
    assert_perft(position, 0, 1);
    assert_perft(position, 1, 20);
    assert_perft(position, 2, 400);
    assert_perft(position, 3, 8_902);
    assert_perft(position, 4, 197_281);
}

#[test]
#[ignore]
fn perft_starting_position_expensive() {
    let position = Position::start_position();
    assert_perft(position, 5, 4_865_609);
    assert_perft(position, 6, 119_060_324);
}

fn kiwipete_position() -> Position {
    // https://www.chessprogramming.org/Perft_Results#Position_2
    Position::parse_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
        .unwrap()
}

#[test]
fn perft_kiwipete_position() {
    let position = kiwipete_position();
    assert_perft(position, 0, 1);
    assert_perft(position, 1, 48);
    assert_perft(position, 2, 2_039);
    assert_perft(position, 3, 97_862);
}

#[test]
#[ignore]
fn perft_kiwipete_position_expensive() {
    let position = kiwipete_position();
    assert_perft(position, 4, 4_085_603);
}

fn position_3() -> Position {
    // https://www.chessprogramming.org/Perft_Results#Position_3
    Position::parse_fen("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1").unwrap()
}

#[test]
fn perft_test_position_3() {
    let position = position_3();
    assert_perft(position, 0, 1);
    assert_perft(position, 1, 14);
    assert_perft(position, 2, 191);
    assert_perft(position, 3, 2_812);
    assert_perft(position, 4, 43_238);
}

#[test]
#[ignore]
fn perft_test_position_3_expensive() {
    let position = position_3();
    assert_perft(position, 5, 674_624);
    assert_perft(position, 6, 11_030_083);
}

fn position_4() -> Position {
    // https://www.chessprogramming.org/Perft_Results#Position_4
    Position::parse_fen("r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1").unwrap()
}

#[test]
fn perft_test_position_4() {
    let position = position_4();
    assert_perft(position, 0, 1);
    assert_perft(position, 1, 6);
    assert_perft(position, 2, 264);
    assert_perft(position, 3, 9_467);
    assert_perft(position, 4, 422_333);
}

fn position_5() -> Position {
    // https://www.chessprogramming.org/Perft_Results#Position_5
    Position::parse_fen("rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8").unwrap()
}

#[test]
fn perft_test_position_5() {
    let position = position_5();
    assert_perft(position, 0, 1);
    assert_perft(position, 1, 44);
    assert_perft(position, 2, 1_486);
    assert_perft(position, 3, 62_379);
}

#[test]
#[ignore]
fn perft_test_position_5_expensive() {
    let position = position_5();
    assert_perft(position, 4, 2_103_487);
}

fn position_6() -> Position {
    // https://www.chessprogramming.org/Perft_Results#Position_6
    Position::parse_fen("r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10")
        .unwrap()
}

#[test]
fn perft_test_position_6() {
    let position = position_6();
    assert_perft(position, 0, 1);
    assert_perft(position, 1, 46);
    assert_perft(position, 2, 2_079);
    assert_perft(position, 3, 89_890);
}

#[test]
#[ignore]
fn perft_test_position_6_expensive() {
    let position = position_6();
    assert_perft(position, 4, 3_894_594);
}

/// Applies a sequence of moves given in coordinate notation, panicking if
/// any is malformed or illegal - a test-setup helper, not production code.
fn make_moves(mut position: Position, moves: &[&str]) -> Position {
    for mv_str in moves {
        let mv = Move::from_str(mv_str).expect("move text is valid coordinate notation");
        position = position.make_move_new(mv);
    }
    position
}

// The six depth-5 scenarios below are expensive (tens to low hundreds of
// millions of nodes) and so are `#[ignore]`d by default, like the other
// deep perft scenarios in this file; run with `--ignored` to exercise them.

#[test]
#[ignore]
fn perft_depth_5_scenario_1() {
    let base = Position::parse_fen("rnbqkb1r/pppp1ppp/8/4p3/8/5N2/PPPPBnPP/RNBQ1RK1 w kq - 8 5")
        .unwrap();
    let position = make_moves(base, &["g1f2", "d8h4", "f3h4", "a7a5"]);
    assert_perft(position, 5, 23_946_398);
}

#[test]
#[ignore]
fn perft_depth_5_scenario_2() {
    let base = Position::parse_fen("rnbqkb1r/pppp1ppp/8/4p3/8/5N2/PPPPBnPP/RNBQ1RK1 w kq - 8 5")
        .unwrap();
    let position = make_moves(
        base,
        &["g1f2", "d8h4", "f3h4", "a7a5", "h4g6", "f8a3", "g6h8"],
    );
    assert_perft(position, 5, 17_675_852);
}

#[test]
#[ignore]
fn perft_depth_5_scenario_3() {
    let position = Position::parse_fen("5r1k/p5pp/8/2pQ4/3p1p2/3P3q/PrPN1PR1/4RK2 b - - 1 27")
        .unwrap();
    assert_perft(position, 5, 87_680_580);
}

#[test]
#[ignore]
fn perft_depth_5_scenario_4() {
    let position = Position::parse_fen("8/5p1p/5P2/1K1p2p1/1Ppk2P1/P7/2P3P1/8 w - - 1 32").unwrap();
    assert_perft(position, 5, 29_991);
}

#[test]
#[ignore]
fn perft_depth_5_scenario_5() {
    let position = Position::parse_fen("5rk1/5p1p/5R2/p2pp3/q7/1rP5/1P4PP/1R1Q3K w - - 0 25")
        .unwrap();
    assert_perft(position, 5, 43_033_472);
}

#[test]
#[ignore]
fn perft_depth_5_scenario_6() {
    let position =
        Position::parse_fen("r4rk1/1ppb1pp1/1p1p2np/4p3/1PR5/P1qB4/2P2PPQ/2B2RK1 b - - 5 21")
            .unwrap();
    assert_perft(position, 5, 120_413_132);
}
