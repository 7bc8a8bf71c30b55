//! board-2048: a 2048 board core (grid/tile model, shift/merge
//! resolution, tile spawning)
//!
//! This crate provides:
//! - A `Board` of cells and tiles with a single-source-of-truth occupancy
//!   map (`board` module)
//! - The shift/merge resolution algorithm, emitting movement and merge
//!   events for a presentation layer (`shift` module)
//! - A spawn policy with injectable randomness (`spawn` module)
//! - A `Game` session loop (`game` module) and a binary trace format for
//!   recorded runs (`trace` module)
//!
//! Quick start:
//! ```
//! use board_2048::board::{Board, Direction, Pos};
//!
//! let mut board = Board::new(4, 4);
//! board.spawn_tile(Pos::new(0, 0), 2);
//! board.spawn_tile(Pos::new(3, 0), 2);
//! let result = board.shift(Direction::Left);
//! assert_eq!(result.merges.len(), 1);
//! assert_eq!(board.highest_tile(), 4);
//! ```
//!
//! Deterministic play with a seeded RNG:
//! ```
//! use board_2048::board::Direction;
//! use board_2048::game::Game;
//! use board_2048::spawn::Spawner;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let mut game = Game::new(4, 4, Spawner::default(), &mut rng);
//! for dir in Direction::ALL.into_iter().cycle().take(8) {
//!     if game.step(dir, &mut rng).is_none() {
//!         break;
//!     }
//! }
//! assert!(game.board().len() >= 2);
//! ```
//!
//! Note: resolution is synchronous and inert. The board's logical state
//! is final the instant `shift` returns; the returned events exist for
//! presentation only.
pub mod board;
pub mod game;
pub mod shift;
pub mod spawn;
pub mod trace;
