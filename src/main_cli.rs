//! Interactive debug CLI: play against the engine from a terminal without
//! speaking XBoard.

use std::io::{self, Write};

use blunders_engine::coretypes::Move;
use blunders_engine::eval::simple_evaluate;
use blunders_engine::{Engine, EngineBuilder};

/// Depth used for the computer's replies. Shallower than the XBoard
/// front-end's iterative deepening ceiling, since this CLI has no time
/// control and a human is waiting at a terminal.
const SEARCH_DEPTH: u8 = 6;

enum Input {
    Exit,
    NewGame,
    Help,
    Undo,
    GameMove(Move),
    Invalid(String),
}

impl From<&str> for Input {
    fn from(s: &str) -> Self {
        let trimmed = s.trim();
        if let Ok(move_) = trimmed.parse::<Move>() {
            return Self::GameMove(move_);
        }
        match trimmed {
            "exit" => Self::Exit,
            "newgame" | "ng" => Self::NewGame,
            "help" => Self::Help,
            "undo" => Self::Undo,
            other => Self::Invalid(other.to_string()),
        }
    }
}

fn print_help() {
    println!("Commands:");
    println!("newgame | ng => Begin a new game.");
    println!("undo => Undo your last move and the engine's reply.");
    println!("help => Print this help text.");
    println!("exit => end CLI.");
    println!("\nTo make a move, enter a move in algebraic coordinate form.");
    println!("Examples: d2d4 -> Move piece on D2 to D4.");
}

/// Checks for checkmate/stalemate after a move; announces the result and
/// starts a fresh game if the current one has ended.
fn game_over(engine: &mut Engine) -> bool {
    let position = engine.position_mut();
    if position.is_checkmate() {
        println!("{}", engine.position());
        println!("CHECKMATE.");
        true
    } else if position.is_stalemate() {
        println!("{}", engine.position());
        println!("DRAWN via STALEMATE.");
        true
    } else {
        false
    }
}

fn main() -> io::Result<()> {
    println!("Blunders CLI {}\n", env!("CARGO_PKG_VERSION"));
    let mut engine = EngineBuilder::new().build();
    let mut input = String::new();

    loop {
        println!("Current Static cp  : {}", simple_evaluate(engine.position()));
        println!("{}", engine.position());
        print!("> ");
        io::stdout().flush()?;
        input.clear();
        if io::stdin().read_line(&mut input)? == 0 {
            break; // stdin closed.
        }

        match Input::from(input.as_str()) {
            Input::Exit => break,
            Input::NewGame => {
                engine.new_game();
                println!("Starting new game...");
            }
            Input::Help => print_help(),
            Input::Undo => {
                // Undo both the engine's reply and the player's move that
                // provoked it.
                if engine.undo().is_ok() {
                    println!("Undid the engine's reply.");
                }
                if engine.undo().is_ok() {
                    println!("Undid your last move.");
                }
            }
            Input::Invalid(text) => println!("Invalid command: {}", text),
            Input::GameMove(mv) => {
                let legal = engine.position_mut().get_legal_moves().contains(&mv);
                if !legal {
                    println!("That move was illegal! No action taken.");
                    continue;
                }
                engine.make_move(mv).expect("already checked legal");

                if game_over(&mut engine) {
                    engine.new_game();
                    continue;
                }

                println!("{}\nthinking...", engine.position());
                let result = engine.start_search(SEARCH_DEPTH);
                if result.best_move == Move::illegal() {
                    println!("Blunders has no legal reply.");
                    engine.new_game();
                    continue;
                }
                println!("Blunders played move {}.", result.best_move);
                println!("{}", result);
                engine
                    .make_move(result.best_move)
                    .expect("engine's own search only returns legal moves");

                if game_over(&mut engine) {
                    engine.new_game();
                }
            }
        }
    }
    Ok(())
}
