use board_2048::board::{Board, Direction};
use board_2048::game::Game;
use board_2048::shift;
use board_2048::spawn::Spawner;
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use rand::{rngs::StdRng, SeedableRng};
use std::hint::black_box;

fn corpus() -> Vec<Board> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut game = Game::new(4, 4, Spawner::default(), &mut rng);
    let mut boards = Vec::new();
    boards.push(Board::new(4, 4));
    boards.push(game.board().clone());
    // Derive a variety of densities deterministically
    let seq = [
        Direction::Left,
        Direction::Up,
        Direction::Right,
        Direction::Down,
    ];
    for i in 0..30 {
        if game.step(seq[i % seq.len()], &mut rng).is_none() {
            break;
        }
        boards.push(game.board().clone());
    }
    boards
}

fn bench_resolve(c: &mut Criterion) {
    for (name, dir) in [
        ("resolve/left", Direction::Left),
        ("resolve/right", Direction::Right),
        ("resolve/up", Direction::Up),
        ("resolve/down", Direction::Down),
    ] {
        c.bench_function(name, |bch| {
            let boards = corpus();
            bch.iter_batched(
                || boards.clone(),
                |mut boards| {
                    let mut acc = 0usize;
                    for board in &mut boards {
                        let result = shift::resolve(board, dir);
                        acc += result.moves.len() + result.merges.len();
                    }
                    black_box(acc)
                },
                BatchSize::SmallInput,
            )
        });
    }
}

fn bench_spawn(c: &mut Criterion) {
    c.bench_function("spawn/fill_board", |bch| {
        bch.iter_batched(
            || (Board::new(4, 4), StdRng::seed_from_u64(7)),
            |(mut board, mut rng)| {
                let spawner = Spawner::default();
                for _ in 0..16 {
                    spawner.spawn(&mut board, 1, &mut rng);
                }
                black_box(board.len())
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_full_game(c: &mut Criterion) {
    c.bench_function("game/random_play", |bch| {
        bch.iter_batched(
            || StdRng::seed_from_u64(9),
            |mut rng| {
                let mut game = Game::new(4, 4, Spawner::default(), &mut rng);
                let seq = [
                    Direction::Left,
                    Direction::Up,
                    Direction::Right,
                    Direction::Down,
                ];
                let mut steps = 0usize;
                while !game.is_over() && steps < 2_000 {
                    if game.step(seq[steps % seq.len()], &mut rng).is_none() {
                        break;
                    }
                    steps += 1;
                }
                black_box(game.board().highest_tile())
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(shift_ops, bench_resolve, bench_spawn, bench_full_game);
criterion_main!(shift_ops);
