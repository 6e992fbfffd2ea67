//! Time-to-depth benchmarks for the engine's main search.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use blunders_engine::{EngineBuilder, Game, Move, Position};

fn fresh_engine() -> blunders_engine::Engine {
    EngineBuilder::new()
        .game(Game::new(Position::start_position()))
        .debug(false)
        .transpositions_mb(100)
        .build()
}

pub fn start_pos_search_time_to_depth(c: &mut Criterion) {
    let mut result = Default::default();

    for depth in 2..=6u8 {
        c.bench_function(&format!("search start position ttd {}", depth), |b| {
            b.iter(|| {
                let mut engine = fresh_engine();
                result = engine.start_search(black_box(depth));
            });
        });
        if result.best_move != Move::illegal() {
            println!("{}", result);
        }
    }
}

pub fn start_pos_search_time_to_depth_long(c: &mut Criterion) {
    let mut result = Default::default();

    for depth in 7..=8u8 {
        c.bench_function(&format!("search start position ttd {}", depth), |b| {
            b.iter(|| {
                let mut engine = fresh_engine();
                result = engine.start_search(black_box(depth));
            });
        });
        if result.best_move != Move::illegal() {
            println!("{}", result);
        }
    }
}

criterion_group! {
    name = time_to_depth;
    config = Criterion::default().without_plots().sample_size(30);
    targets = start_pos_search_time_to_depth
}

criterion_group! {
    name = time_to_depth_long;
    config = Criterion::default().without_plots().sample_size(10);
    targets = start_pos_search_time_to_depth_long
}

criterion_main!(time_to_depth, time_to_depth_long);
