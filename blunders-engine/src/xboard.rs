//! XBoard protocol command surface and the `Manager` that drives an
//! [`Engine`] through it.
//!
//! A line-parsed command enum plus a request/response split, built around
//! XBoard's flat text commands rather than a `position`/`go wtime...` pair:
//! there is no `setoption` negotiation, just `protover`, a handful of
//! one-word mode switches, `setboard`/`usermove`/`undo`/`level`, and the
//! `ping`/`quit`/`result` trio. The Force/Play/Analyze mode switch and the
//! `proceed_with_batch` time-budget callback drive the engine's lifecycle
//! from here rather than inside the search itself.

use std::cell::RefCell;
use std::rc::Rc;
use std::str::FromStr;
use std::time::Instant;

use crate::coretypes::{Color, Cp, Move, PlyKind, MAX_DEPTH};
use crate::engine::{Engine, EngineBuilder};
use crate::error::{self, Error, ErrorKind};
use crate::fen::Fen;
use crate::movelist::Line;
use crate::position::Position;
use crate::search::SearchResult;
use crate::threads::CommandQueue;
use crate::timeman::{MoveClock, TimeControl};

/// Name advertised in the `feature` handshake and the startup banner.
pub const ENGINE_NAME: &str = "blunders";

/// The engine's current mode of play, set by `force`/`go`/`analyze`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Mode {
    /// Do not search, regardless of whose turn it is.
    Force,
    /// Search and play moves for `engine_color` only.
    Play,
    /// Search indefinitely, for either side, never playing a move.
    Analyze,
}

/// One parsed line of the XBoard command surface.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum XboardCommand {
    Protover(u32),
    White,
    Black,
    Force,
    Go,
    Analyze,
    New,
    SetBoard(Position),
    UserMove(Move),
    Undo,
    Level(TimeControl),
    Ping(i64),
    Result(String),
    Quit,
}

impl XboardCommand {
    /// Parses a single input line. Unknown commands and malformed moves are
    /// reported as ordinary `Error`s - the manager logs and discards them
    /// rather than crashing or changing state.
    pub fn parse(line: &str) -> error::Result<Self> {
        let mut tokens = line.split_whitespace();
        let head = tokens.next().ok_or(ErrorKind::XboardUnknownCommand)?;

        match head {
            "protover" => {
                let n = tokens.next().and_then(|s| s.parse().ok()).unwrap_or(2);
                Ok(Self::Protover(n))
            }
            "white" => Ok(Self::White),
            "black" => Ok(Self::Black),
            "force" => Ok(Self::Force),
            "go" => Ok(Self::Go),
            "analyze" => Ok(Self::Analyze),
            "new" => Ok(Self::New),
            "setboard" => {
                let fen: String = tokens.collect::<Vec<_>>().join(" ");
                Position::parse_fen(&fen).map(Self::SetBoard)
            }
            "usermove" => {
                let mv_str = tokens.next().ok_or(ErrorKind::XboardMalformedMove)?;
                Move::from_str(mv_str)
                    .map(Self::UserMove)
                    .map_err(|_| Error::from(ErrorKind::XboardMalformedMove))
            }
            "undo" => Ok(Self::Undo),
            "level" => {
                let moves = tokens.next().ok_or(ErrorKind::XboardUnknownCommand)?;
                let time = tokens.next().ok_or(ErrorKind::XboardUnknownCommand)?;
                let increment = tokens.next().ok_or(ErrorKind::XboardUnknownCommand)?;
                TimeControl::parse(moves, time, increment).map(Self::Level)
            }
            "ping" => {
                let n = tokens.next().and_then(|s| s.parse().ok()).unwrap_or(0);
                Ok(Self::Ping(n))
            }
            "result" => Ok(Self::Result(tokens.collect::<Vec<_>>().join(" "))),
            "quit" => Ok(Self::Quit),
            _ => Err((ErrorKind::XboardUnknownCommand, head).into()),
        }
    }
}

/// Glue between the XBoard protocol and an [`Engine`]'s lifecycle: owns the
/// engine, the current mode, which color the engine plays, and the
/// in-progress time control, and drives the ProcessCommands -> Think ->
/// ProcessCommands -> MakeBestMove loop. Output is written directly to
/// standard output - there is exactly one realization of this surface, so
/// no abstract "protocol" trait is needed.
pub struct Manager {
    engine: Engine,
    mode: Mode,
    engine_color: Color,
    control: Option<TimeControl>,
    debug: bool,
}

impl Manager {
    pub fn new() -> Self {
        let engine = EngineBuilder::new().build();
        let engine_color = !*engine.position().side_to_move();
        Self {
            engine,
            mode: Mode::Force,
            engine_color,
            control: None,
            debug: false,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    fn debug_line(&self, message: &str) {
        if self.debug {
            println!("# {}", message);
        }
    }

    /// `feature ... done=1`, advertising `ping`/`reuse`/`analyze` support
    /// and the engine's name.
    fn send_feature(&self) {
        println!(
            "feature colors=0 playother=1 setboard=1 usermove=1 ping=1 sigint=0 \
             sigterm=0 reuse=1 analyze=1 myname=\"{}\" done=1",
            ENGINE_NAME
        );
    }

    /// Runs the manager's main loop: blocks for input, applies every queued
    /// command, then thinks if it's the engine's turn, cooperatively
    /// yielding back to `queue` at every search batch boundary. Returns once
    /// `quit` is received or standard input closes.
    pub fn run(&mut self, queue: &CommandQueue) {
        self.send_feature();
        loop {
            let lines = queue.wait_and_drain();
            if lines.is_empty() {
                return; // stdin closed (EOF).
            }
            if !self.process_lines(&lines) {
                return;
            }
            if !self.maybe_think(queue) {
                return;
            }
        }
    }

    /// Applies every line in order; returns `false` once `quit` is seen.
    fn process_lines(&mut self, lines: &[String]) -> bool {
        for line in lines {
            if !self.process_line(line) {
                return false;
            }
        }
        true
    }

    /// Applies one line. A parse failure is silently dropped: state is
    /// left exactly as it was.
    fn process_line(&mut self, line: &str) -> bool {
        match XboardCommand::parse(line) {
            Ok(command) => self.apply(command),
            Err(err) => {
                self.debug_line(&format!("dropped {:?}: {}", line, err));
                true
            }
        }
    }

    fn apply(&mut self, command: XboardCommand) -> bool {
        use XboardCommand::*;
        match command {
            Protover(_) => self.send_feature(),
            White => self.engine_color = Color::Black,
            Black => self.engine_color = Color::White,
            Force => self.mode = Mode::Force,
            Go => {
                self.mode = Mode::Play;
                self.engine_color = *self.engine.position().side_to_move();
            }
            Analyze => self.mode = Mode::Analyze,
            New => {
                self.engine.new_game();
                self.mode = Mode::Play;
                self.engine_color = !*self.engine.position().side_to_move();
            }
            SetBoard(position) => self.engine.set_position(position),
            UserMove(mv) => {
                if let Err(err) = self.engine.make_move(mv) {
                    self.debug_line(&format!("illegal move {}: {}", mv, err));
                }
            }
            Undo => {
                if let Err(err) = self.engine.undo() {
                    self.debug_line(&format!("undo failed: {}", err));
                }
            }
            Level(control) => self.control = Some(control),
            Ping(n) => println!("pong {}", n),
            Result(outcome) => {
                self.debug_line(&format!("game result: {}", outcome));
                self.mode = Mode::Force;
            }
            Quit => return false,
        }
        true
    }

    /// Searches and, in Play mode, plays the resulting move - the
    /// "Think -> ProcessCommands -> MakeBestMove" tail of the main loop.
    /// Returns `false` only when a command processed immediately after
    /// thinking was `quit`.
    fn maybe_think(&mut self, queue: &CommandQueue) -> bool {
        let should_think = match self.mode {
            Mode::Force => false,
            Mode::Play => *self.engine.position().side_to_move() == self.engine_color,
            Mode::Analyze => true,
        };
        if !should_think {
            return true;
        }

        let (result, pending, keep_running) = self.think(queue);

        if !keep_running {
            return false;
        }
        // Any command received mid-search abandons this iteration's result:
        // a mutation during a batch means the position may no longer match
        // what was searched.
        let aborted = !pending.is_empty();
        if self.mode == Mode::Play && !aborted && result.best_move != Move::illegal() {
            self.report_search(&result);
            println!("move {}", result.best_move);
            let _ = self.engine.make_move(result.best_move);
        }
        true
    }

    /// Runs one `start_search`, polling `queue` at every batch boundary.
    /// Commands observed mid-search are only collected here, never applied
    /// until the search returns; this function applies them immediately
    /// afterward and reports whether `quit` was among them.
    fn think(&mut self, queue: &CommandQueue) -> (SearchResult, Vec<String>, bool) {
        let pending: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let pending_for_batch = Rc::clone(&pending);
        let queue_for_batch = queue.clone();
        let clock = self.control.map(MoveClock::start);
        let mode = self.mode;

        self.engine.set_proceed_with_batch(move || {
            let mut drained = queue_for_batch.drain();
            let got_input = !drained.is_empty();
            pending_for_batch.borrow_mut().append(&mut drained);
            if got_input {
                return false;
            }
            match mode {
                Mode::Force => false,
                Mode::Play => clock.map(|c| c.within_budget()).unwrap_or(true),
                Mode::Analyze => true,
            }
        });

        let start = Instant::now();
        self.engine.set_report_progress(move |depth, eval, nodes, pv| {
            Self::print_progress(depth, eval, nodes, pv, start);
        });

        let result = self.engine.start_search(MAX_DEPTH);

        // Drop the engine's hold on `pending` (it holds its own `Rc` clone
        // inside the boxed closure above) before unwrapping, or the refcount
        // never reaches 1 and every mid-search command is silently lost.
        self.engine.set_proceed_with_batch(|| true);

        let pending_lines = Rc::try_unwrap(pending)
            .map(RefCell::into_inner)
            .unwrap_or_default();
        let keep_running = self.process_lines(&pending_lines);
        (result, pending_lines, keep_running)
    }

    fn report_search(&self, result: &SearchResult) {
        let score = Self::format_score(result.relative_score());
        let centiseconds = result.elapsed.as_millis() / 10;
        let pv = result
            .pv
            .iter()
            .map(Move::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        println!(
            "{} {} {} {} {}",
            result.depth, score, centiseconds, result.nodes, pv
        );
    }

    fn print_progress(depth: PlyKind, eval: Cp, nodes: u64, pv: &Line, start: Instant) {
        let score = Self::format_score(eval);
        let centiseconds = start.elapsed().as_millis() / 10;
        let pv_str = pv.iter().map(Move::to_string).collect::<Vec<_>>().join(" ");
        println!("{} {} {} {} {}", depth, score, centiseconds, nodes, pv_str);
    }

    /// Ordinary evaluations are divided by 10 (the engine's internal unit
    /// is a decipawn's worth finer than a centipawn); scores
    /// within `Cp::LONGEST_CHECKMATE` of a mate are reported as XBoard's
    /// conventional mate encoding, `±(100000 + moves_to_mate)`.
    fn format_score(eval: Cp) -> i32 {
        if eval.is_mate() {
            let plies_to_mate = Cp::CHECKMATE.0 - eval.0.abs();
            let moves_to_mate = (plies_to_mate + 1) / 2;
            eval.0.signum() * (100_000 + moves_to_mate)
        } else {
            eval.0 / 10
        }
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coretypes::Square::*;

    #[test]
    fn parses_usermove() {
        let cmd = XboardCommand::parse("usermove e2e4").unwrap();
        assert_eq!(cmd, XboardCommand::UserMove(Move::new(E2, E4, None)));
    }

    #[test]
    fn parses_level() {
        let cmd = XboardCommand::parse("level 40 5 0").unwrap();
        assert_eq!(
            cmd,
            XboardCommand::Level(TimeControl::new(40, 300, 0))
        );
    }

    #[test]
    fn parses_setboard() {
        let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        let cmd = XboardCommand::parse(&format!("setboard {}", fen)).unwrap();
        assert_eq!(cmd, XboardCommand::SetBoard(Position::start_position()));
    }

    #[test]
    fn unknown_command_is_an_error_not_a_panic() {
        assert!(XboardCommand::parse("frobnicate").is_err());
    }

    #[test]
    fn malformed_usermove_is_an_error() {
        assert!(XboardCommand::parse("usermove zz99").is_err());
    }

    #[test]
    fn force_mode_never_thinks() {
        let mut manager = Manager::new();
        manager.apply(XboardCommand::Force);
        assert_eq!(manager.mode(), Mode::Force);
    }

    #[test]
    fn new_sets_play_mode_and_opposite_engine_color() {
        let mut manager = Manager::new();
        manager.apply(XboardCommand::New);
        assert_eq!(manager.mode(), Mode::Play);
        assert_eq!(manager.engine_color, Color::Black);
    }

    #[test]
    fn go_assigns_engine_color_to_side_to_move() {
        let mut manager = Manager::new();
        manager.apply(XboardCommand::Go);
        assert_eq!(manager.mode(), Mode::Play);
        assert_eq!(manager.engine_color, Color::White);
    }

    #[test]
    fn quit_stops_processing() {
        let mut manager = Manager::new();
        let lines = vec!["force".to_string(), "quit".to_string(), "go".to_string()];
        assert!(!manager.process_lines(&lines));
        assert_eq!(manager.mode(), Mode::Force);
    }

    #[test]
    fn mate_score_formats_with_moves_to_mate() {
        let formatted = Manager::format_score(Cp::CHECKMATE);
        assert!(formatted >= 100_000);
    }

    #[test]
    fn ordinary_score_divides_by_ten() {
        assert_eq!(Manager::format_score(Cp(305)), 30);
    }
}
