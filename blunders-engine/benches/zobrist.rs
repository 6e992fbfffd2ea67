//! Benchmarks for Zobrist hash generation and incremental update.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use blunders_engine::node::slow_hash;
use blunders_engine::{Move, Node, Position, Square::*, ZobristTable};

pub fn zobrist_generate_and_update(c: &mut Criterion) {
    let ztable = Arc::new(ZobristTable::new());
    let move_ = Move::new(E2, E4, None);

    let initial_pos = Position::start_position();
    let mut final_node = Node::new(initial_pos, ztable.clone());
    final_node.make_move(move_);

    let initial_hash = slow_hash(&initial_pos, &ztable);
    let final_hash = slow_hash(final_node.position(), &ztable);

    c.bench_function("zobrist initial position slow hash", |b| {
        b.iter(|| {
            let hash = slow_hash(black_box(&initial_pos), black_box(&ztable));
            assert_eq!(hash, initial_hash);
        });
    });

    c.bench_function("zobrist final position slow hash", |b| {
        b.iter(|| {
            let hash = slow_hash(black_box(final_node.position()), black_box(&ztable));
            assert_eq!(hash, final_hash);
        });
    });

    c.bench_function("zobrist final position incremental hash", |b| {
        b.iter(|| {
            let mut node = Node::new(black_box(initial_pos), ztable.clone());
            node.make_move(black_box(move_));
            assert_eq!(node.hash(), final_hash);
        });
    });
}

criterion_group! {
    name = zobrist_hashing;
    config = Criterion::default().without_plots().sample_size(100);
    targets = zobrist_generate_and_update
}

criterion_main!(zobrist_hashing);
