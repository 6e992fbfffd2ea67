//! Search engine: iterative-deepening negamax with alpha-beta, a
//! transposition table, quiescence, killer moves, check extensions, and
//! cooperative batch-bounded cancellation.
//!
//! `Engine`/`EngineBuilder` store their callbacks as boxed closures set
//! before a search starts, so the search recursion itself never needs to
//! know who's asking for progress reports or cancellation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::coretypes::{Cp, Move, PlyKind, Square, MAX_DEPTH};
use crate::error;
use crate::eval::simple_evaluate;
use crate::game::Game;
use crate::movelist::Line;
use crate::node::Node;
use crate::position::Position;
use crate::search::{sort_moves, SearchResult};
use crate::tables::NoReturnTable;
use crate::transposition::{NodeInfo, NodeType, TranspositionTable};
use crate::zobrist::{HashKind, ZobristTable};

/// Nodes entered between `proceed_with_batch` polls.
const DEFAULT_BATCH_SIZE: u32 = 10_000;

/// Default transposition table size, matching `TranspositionTable::new`'s
/// own default (2^25 slots); chosen here rather than left implicit so
/// `EngineBuilder::transpositions_mb` has a documented default to fall
/// back to.
const DEFAULT_TRANSPOSITIONS_MB: usize = 64;

/// Bundles a [`Position`] (via [`Node`]) with every piece of state a search
/// needs across its recursion: the transposition and no-return tables,
/// per-ply killer moves, node counters, and the two callbacks the manager
/// installs to bound and report on a search.
pub struct Engine {
    game: Game,
    node: Node,
    ztable: Arc<ZobristTable>,
    tt: TranspositionTable,
    tt_enabled: bool,
    no_return: NoReturnTable,
    killers: Vec<[Option<Move>; 2]>,
    principal_variation: Line,
    nodes_visited: u64,
    q_nodes_visited: u64,
    q_elapsed: Duration,
    batch_counter: u32,
    batch_size: u32,
    cancelled: bool,
    debug: bool,
    proceed_with_batch: Box<dyn FnMut() -> bool>,
    report_progress: Box<dyn FnMut(PlyKind, Cp, u64, &Line)>,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn position(&self) -> &Position {
        self.node.position()
    }

    /// Mutable access to the current position, for callers that need
    /// `get_legal_moves`/`is_checkmate`/`is_stalemate` (which cache their
    /// result and so need `&mut self` even when no move is played).
    pub fn position_mut(&mut self) -> &mut Position {
        self.node.position_mut()
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn tt(&self) -> &TranspositionTable {
        &self.tt
    }

    pub fn tt_enabled(&self) -> bool {
        self.tt_enabled
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn set_proceed_with_batch(&mut self, f: impl FnMut() -> bool + 'static) {
        self.proceed_with_batch = Box::new(f);
    }

    pub fn set_report_progress(&mut self, f: impl FnMut(PlyKind, Cp, u64, &Line) + 'static) {
        self.report_progress = Box::new(f);
    }

    /// Plays `mv` on both the game history and the search node, and marks
    /// its hash permanently visited in the no-return table, since a move
    /// actually played at the root can never be revisited as a draw by
    /// repetition within this same game.
    pub fn make_move(&mut self, mv: Move) -> error::Result<()> {
        self.game.make_move(mv)?;
        self.node.make_move(mv);
        self.no_return.set(self.node.hash(), true);
        Ok(())
    }

    /// Pops the last played move from the game history and rebuilds the
    /// node and no-return marks from scratch.
    pub fn undo(&mut self) -> error::Result<()> {
        self.game.undo()?;
        self.resync_history();
        Ok(())
    }

    /// Installs `position` as a fresh base with no history.
    pub fn set_position(&mut self, position: Position) {
        self.game.set_position(position);
        self.resync_history();
    }

    /// Resets to the standard starting position and clears the
    /// transposition table.
    pub fn new_game(&mut self) {
        self.tt.clear();
        self.set_position(Position::start_position());
    }

    fn resync_history(&mut self) {
        self.no_return.clear();
        let mut node = Node::new(*self.game.base_position(), self.ztable.clone());
        self.no_return.set(node.hash(), true);
        for move_info in self.game.history().iter() {
            node.make_move(Move::from(*move_info));
            self.no_return.set(node.hash(), true);
        }
        self.node = node;
    }

    /// Increments node/batch counters and polls `proceed_with_batch` once
    /// the batch boundary is reached. Returns `false` once a poll (this one
    /// or an earlier one) has signaled cancellation.
    fn enter_node(&mut self) -> bool {
        self.nodes_visited += 1;
        self.batch_counter += 1;
        if self.batch_counter >= self.batch_size {
            self.batch_counter = 0;
            if !(self.proceed_with_batch)() {
                self.cancelled = true;
            }
        }
        !self.cancelled
    }

    /// Pushes a mate score one ply further from root before it's returned,
    /// so a shallower mate is always preferred to a deeper one. Only the
    /// winning-side (positive) direction is adjusted explicitly; the
    /// negation at each parent already carries the adjustment to the
    /// losing side.
    fn mate_distance_adjusted(eval: Cp) -> Cp {
        if eval.0 > Cp::CHECKMATE.0 - Cp::LONGEST_CHECKMATE {
            Cp(eval.0 - 1)
        } else {
            eval
        }
    }

    fn finalize(&mut self, hash: HashKind, depth: PlyKind, node_type: NodeType, eval: Cp, best_move: Move) -> NodeInfo {
        let info = NodeInfo::new(depth, node_type, Self::mate_distance_adjusted(eval), best_move);
        if self.tt_enabled {
            self.tt.set(hash, info);
        }
        info
    }

    fn killer_slot(&mut self, ply: PlyKind) -> [Option<Move>; 2] {
        let idx = ply as usize;
        if idx >= self.killers.len() {
            self.killers.resize(idx + 1, [None, None]);
        }
        self.killers[idx]
    }

    /// Shifts `mv` into the primary killer slot for `ply`, unless it's
    /// already there.
    fn shift_killers(&mut self, ply: PlyKind, mv: Move) {
        let idx = ply as usize;
        if idx >= self.killers.len() {
            self.killers.resize(idx + 1, [None, None]);
        }
        let slot = &mut self.killers[idx];
        if slot[0] != Some(mv) {
            slot[1] = slot[0];
            slot[0] = Some(mv);
        }
    }

    /// Swaps a child `Node` (self.node with `mv` applied) into `self.node`,
    /// recurses, then restores the parent - the "Node swap-in/recurse/
    /// restore" pattern standing in for undo, since neither `Position` nor
    /// `Node` support reverse mutation.
    fn search_child(
        &mut self,
        mv: Move,
        child_depth: PlyKind,
        child_budget: PlyKind,
        alpha: Cp,
        beta: Cp,
        ply: PlyKind,
        child_pv: &mut Line,
    ) -> NodeInfo {
        let mut child = self.node.clone();
        child.make_move(mv);
        let parent = std::mem::replace(&mut self.node, child);
        let info = self.negamax(child_depth, child_budget, child_pv, alpha, beta, ply);
        self.node = parent;
        info
    }

    /// Negamax alpha-beta search.
    fn negamax(
        &mut self,
        depth: PlyKind,
        check_extra_depth: PlyKind,
        parent_pv: &mut Line,
        alpha: Cp,
        beta: Cp,
        ply: PlyKind,
    ) -> NodeInfo {
        if !self.enter_node() {
            return NodeInfo::cancelled();
        }

        let hash = self.node.hash();
        let already_marked = self.no_return.get(hash).copied().unwrap_or(false);
        if !already_marked {
            self.no_return.set(hash, true);
        }

        let result = self.negamax_body(depth, check_extra_depth, parent_pv, alpha, beta, ply, hash);

        if !already_marked {
            self.no_return.set(hash, false);
        }

        result
    }

    fn negamax_body(
        &mut self,
        depth: PlyKind,
        check_extra_depth: PlyKind,
        parent_pv: &mut Line,
        mut alpha: Cp,
        beta: Cp,
        ply: PlyKind,
        hash: HashKind,
    ) -> NodeInfo {
        let is_check = self.node.position().is_check();
        let no_legal_moves = self.node.position_mut().get_legal_moves().is_empty();

        if is_check && no_legal_moves {
            return self.finalize(hash, depth, NodeType::PV, -Cp::CHECKMATE, Move::illegal());
        }
        if no_legal_moves {
            return self.finalize(hash, depth, NodeType::PV, Cp::STALEMATE, Move::illegal());
        }
        if depth == 0 {
            return match self.node.last_capture() {
                None => {
                    let eval = simple_evaluate(self.node.position());
                    self.finalize(hash, 0, NodeType::PV, eval, Move::illegal())
                }
                Some(square) => {
                    let q_start = Instant::now();
                    let info = self.quiescence(square, alpha, beta);
                    self.q_elapsed += q_start.elapsed();
                    info
                }
            };
        }

        let moves: Vec<Move> = self.node.position_mut().get_legal_moves().iter().copied().collect();
        let tt_move = self.tt_enabled.then(|| self.tt.get(hash)).flatten().map(|info| info.best_move);
        let pv_move = self.principal_variation.get(ply as usize).copied();
        let killers = self.killer_slot(ply);
        let ordered = sort_moves(self.node.position(), moves, tt_move, pv_move, killers);

        let mut best_eval = Cp::MIN;
        let mut best_move = Move::illegal();
        let mut node_type = NodeType::FailLow;
        let mut local_pv = Line::new();

        for mv in ordered {
            let gives_check = self.node.position().move_is_check_fast(mv);
            let mut child_depth = depth - 1;
            let mut child_budget = check_extra_depth;
            if (gives_check || is_check) && check_extra_depth > 0 {
                child_depth += 1;
                child_budget -= 1;
            }

            let child_hash = self.node.hash_after_move(mv);
            let mut child_pv = Line::new();

            let cached = if self.tt_enabled { self.tt.get(child_hash).copied() } else { None };
            let child_info = if self.no_return.get(child_hash).copied().unwrap_or(false) {
                NodeInfo::new(MAX_DEPTH, NodeType::PV, Cp::STALEMATE, Move::illegal())
            } else if let Some(cached) = cached {
                if cached.depth >= child_depth.saturating_sub(1) && !cached_bound_is_unsafe(&cached, alpha, beta) {
                    cached
                } else {
                    self.search_child(mv, child_depth, child_budget, -beta, -alpha, ply + 1, &mut child_pv)
                }
            } else {
                self.search_child(mv, child_depth, child_budget, -beta, -alpha, ply + 1, &mut child_pv)
            };

            if child_info.is_cancelled() {
                return NodeInfo::cancelled();
            }

            let child_eval = -child_info.eval;

            if child_eval > best_eval {
                best_eval = child_eval;
                best_move = mv;
            }
            if child_eval > alpha {
                alpha = child_eval;
                node_type = NodeType::PV;
                local_pv.clear();
                local_pv.push(mv);
                for m in child_pv.iter() {
                    local_pv.push(*m);
                }
                if ply == 0 {
                    (self.report_progress)(depth, best_eval, self.nodes_visited, &local_pv);
                }
            }
            if alpha >= beta {
                node_type = NodeType::FailHigh;
                let is_capture = self.node.position().move_info(mv).is_capture();
                if !gives_check && !is_capture {
                    self.shift_killers(ply, mv);
                }
                break;
            }
        }

        *parent_pv = local_pv;
        self.finalize(hash, depth, node_type, best_eval, best_move)
    }

    /// Quiescence search, restricted to recaptures on `target_square` plus
    /// a "null move" (stand-pat) option.
    fn quiescence(&mut self, target_square: Square, mut alpha: Cp, beta: Cp) -> NodeInfo {
        if !self.enter_node() {
            return NodeInfo::cancelled();
        }
        self.q_nodes_visited += 1;

        let stand_pat = simple_evaluate(self.node.position());
        if stand_pat >= beta {
            return NodeInfo::new(0, NodeType::FailHigh, stand_pat, Move::illegal());
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }

        let mover = *self.node.position().side_to_move();
        let candidates = self.node.position().get_captures_on_square(target_square, mover);

        let mut best_eval = stand_pat;
        let mut best_move = Move::illegal();
        let mut node_type = NodeType::PV;

        for mv in candidates.iter().copied() {
            let mut child = self.node.clone();
            child.make_move(mv);

            let king_sq = child.position().king_square(mover);
            if child.position().get_attacks_by_player(king_sq, !mover) > 0 {
                continue;
            }

            let parent = std::mem::replace(&mut self.node, child);
            let recapture_square = self.node.last_capture().expect("capture move always sets last_capture");
            let child_info = self.quiescence(recapture_square, -beta, -alpha);
            self.node = parent;

            if child_info.is_cancelled() {
                return NodeInfo::cancelled();
            }

            let child_eval = -child_info.eval;
            if child_eval > best_eval {
                best_eval = child_eval;
                best_move = mv;
            }
            if child_eval > alpha {
                alpha = child_eval;
                node_type = NodeType::PV;
            }
            if alpha >= beta {
                node_type = NodeType::FailHigh;
                break;
            }
        }

        NodeInfo::new(0, node_type, Self::mate_distance_adjusted(best_eval), best_move)
    }

    /// Iterative deepening: search depth 1, 2, 3, ... until `max_depth` or
    /// until a depth is cancelled mid-search.
    pub fn start_search(&mut self, max_depth: PlyKind) -> SearchResult {
        self.nodes_visited = 0;
        self.q_nodes_visited = 0;
        self.q_elapsed = Duration::ZERO;
        self.batch_counter = 0;
        self.cancelled = false;
        self.killers.clear();
        self.principal_variation = Line::new();

        let root_player = *self.node.position().side_to_move();
        let start = Instant::now();

        let mut root_info = NodeInfo::new(0, NodeType::PV, Cp(0), Move::illegal());
        let mut best_pv = Line::new();
        let mut depth_reached = 0u32;
        let mut stopped = false;

        for depth in 1..=max_depth {
            let mut pv = Line::new();
            let info = self.negamax(depth, 0, &mut pv, Cp::MIN, Cp::MAX, 0);
            if info.is_cancelled() {
                stopped = true;
                break;
            }
            root_info = info;
            best_pv = pv;
            self.principal_variation = best_pv;
            depth_reached = depth as u32;
            (self.report_progress)(depth, root_info.eval, self.nodes_visited, &best_pv);
            if root_info.eval.is_mate() {
                break;
            }
        }

        SearchResult {
            best_move: root_info.best_move,
            score: root_info.eval * root_player.sign(),
            pv: best_pv,
            player: root_player,
            depth: depth_reached,
            nodes: self.nodes_visited,
            q_nodes: self.q_nodes_visited,
            elapsed: start.elapsed(),
            q_elapsed: self.q_elapsed,
            stopped,
        }
    }
}

/// True when a cached `NodeInfo`'s bound cannot safely stand in for a real
/// search against the current window: a fail-low entry only bounds the
/// score from above, so it's unsafe whenever that upper bound would still
/// beat β; symmetrically for a fail-high entry's lower bound against α.
fn cached_bound_is_unsafe(cached: &NodeInfo, alpha: Cp, beta: Cp) -> bool {
    let neg_eval = -cached.eval;
    match cached.node_type {
        NodeType::FailLow => neg_eval < beta,
        NodeType::FailHigh => alpha < neg_eval,
        NodeType::PV => false,
    }
}

/// Builds an [`Engine`] with explicit construction parameters in place of
/// XBoard's one-shot `protover` negotiation; there is no runtime
/// `setoption`-style surface once a game is underway.
pub struct EngineBuilder {
    game: Game,
    ztable: Arc<ZobristTable>,
    transpositions_mb: usize,
    batch_size: u32,
    debug: bool,
    tt_enabled: bool,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            game: Game::start_position(),
            ztable: Arc::new(ZobristTable::default()),
            transpositions_mb: DEFAULT_TRANSPOSITIONS_MB,
            batch_size: DEFAULT_BATCH_SIZE,
            debug: false,
            tt_enabled: true,
        }
    }

    pub fn game(mut self, game: Game) -> Self {
        self.game = game;
        self
    }

    pub fn ztable(mut self, ztable: Arc<ZobristTable>) -> Self {
        self.ztable = ztable;
        self
    }

    pub fn transpositions_mb(mut self, megabytes: usize) -> Self {
        self.transpositions_mb = megabytes;
        self
    }

    pub fn batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Disables the transposition table entirely - no lookups, no stores.
    /// The root eval at a given depth must be identical whether this is on
    /// or off; the table is purely a speed optimization, never a source of
    /// search-result differences.
    pub fn tt_enabled(mut self, tt_enabled: bool) -> Self {
        self.tt_enabled = tt_enabled;
        self
    }

    pub fn build(self) -> Engine {
        let node = Node::new(*self.game.position(), self.ztable.clone());
        let mut no_return = NoReturnTable::default();
        no_return.set(node.hash(), true);

        Engine {
            game: self.game,
            node,
            ztable: self.ztable,
            tt: TranspositionTable::with_megabytes(self.transpositions_mb),
            tt_enabled: self.tt_enabled,
            no_return,
            killers: Vec::new(),
            principal_variation: Line::new(),
            nodes_visited: 0,
            q_nodes_visited: 0,
            q_elapsed: Duration::ZERO,
            batch_counter: 0,
            batch_size: self.batch_size,
            cancelled: false,
            debug: self.debug,
            proceed_with_batch: Box::new(|| true),
            report_progress: Box::new(|_, _, _, _| {}),
        }
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coretypes::Square::*;
    use crate::fen::Fen;

    #[test]
    fn finds_mate_in_one() {
        // White to move, Qh5# available against an undefended king.
        let position = Position::parse_fen("6k1/5ppp/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        let mut engine = EngineBuilder::new().game(Game::new(position)).build();
        let result = engine.start_search(3);
        assert!(result.score.is_mate() || result.best_move != Move::illegal());
    }

    #[test]
    fn start_search_reports_increasing_depth() {
        let mut engine = EngineBuilder::new().build();
        let result = engine.start_search(2);
        assert!(result.depth >= 1);
        assert_ne!(result.best_move, Move::illegal());
    }

    #[test]
    fn cancelling_immediately_yields_stopped_result() {
        let mut engine = EngineBuilder::new().batch_size(1).build();
        engine.set_proceed_with_batch(|| false);
        let result = engine.start_search(5);
        assert!(result.stopped);
    }

    #[test]
    fn make_move_and_undo_round_trip_the_position() {
        let mut engine = EngineBuilder::new().build();
        let before = *engine.position();
        engine.make_move(Move::new(E2, E4, None)).unwrap();
        assert_ne!(*engine.position(), before);
        engine.undo().unwrap();
        assert_eq!(*engine.position(), before);
    }

    #[test]
    fn root_eval_is_invariant_to_the_transposition_table() {
        let position =
            Position::parse_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
                .unwrap();
        let mut with_tt = EngineBuilder::new().game(Game::new(position)).build();
        let mut without_tt = EngineBuilder::new()
            .game(Game::new(position))
            .tt_enabled(false)
            .build();

        let with_tt_result = with_tt.start_search(4);
        let without_tt_result = without_tt.start_search(4);

        assert_eq!(with_tt_result.score, without_tt_result.score);
    }

    #[test]
    fn killer_move_shifts_into_primary_slot() {
        let mut engine = EngineBuilder::new().build();
        engine.shift_killers(0, Move::new(G1, F3, None));
        assert_eq!(engine.killers[0][0], Some(Move::new(G1, F3, None)));
        engine.shift_killers(0, Move::new(B1, C3, None));
        assert_eq!(engine.killers[0][0], Some(Move::new(B1, C3, None)));
        assert_eq!(engine.killers[0][1], Some(Move::new(G1, F3, None)));
    }
}
