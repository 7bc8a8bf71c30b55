//! Tile spawning policy.
//!
//! Cell selection and value selection both draw from an injected RNG, so a
//! seeded [`rand::rngs::StdRng`] reproduces runs exactly.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::{Board, Pos, TileId};

/// Default chance that a newly spawned tile is a 4 instead of a 2.
pub const FOUR_TILE_CHANCE: f64 = 0.2;

/// A tile created by a spawn pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spawn {
    pub tile: TileId,
    pub cell: Pos,
    pub value: u32,
}

/// Result of a spawn pass: placements, or the board-full signal when no
/// cell was free to begin with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpawnOutcome {
    Placed(Vec<Spawn>),
    BoardFull,
}

impl SpawnOutcome {
    pub fn is_board_full(&self) -> bool {
        matches!(self, SpawnOutcome::BoardFull)
    }

    /// The placed tiles; empty for `BoardFull`.
    pub fn placed(&self) -> &[Spawn] {
        match self {
            SpawnOutcome::Placed(spawns) => spawns,
            SpawnOutcome::BoardFull => &[],
        }
    }
}

/// Spawn policy: where new tiles go and which value they get.
#[derive(Debug, Clone, Copy)]
pub struct Spawner {
    pub four_chance: f64,
}

impl Default for Spawner {
    fn default() -> Self {
        Spawner {
            four_chance: FOUR_TILE_CHANCE,
        }
    }
}

impl Spawner {
    pub fn new(four_chance: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&four_chance),
            "four_chance must be within [0, 1], got {four_chance}"
        );
        Spawner { four_chance }
    }

    /// Place up to `count` tiles on free cells picked uniformly without
    /// replacement.
    ///
    /// Fewer free cells than `count` spawn what is available; zero free
    /// cells report `BoardFull` and place nothing.
    ///
    /// ```
    /// use board_2048::board::Board;
    /// use board_2048::spawn::Spawner;
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let mut rng = StdRng::seed_from_u64(7);
    /// let mut board = Board::new(4, 4);
    /// let outcome = Spawner::default().spawn(&mut board, 2, &mut rng);
    /// assert_eq!(outcome.placed().len(), 2);
    /// assert_eq!(board.len(), 2);
    /// ```
    pub fn spawn<R: Rng + ?Sized>(
        &self,
        board: &mut Board,
        count: usize,
        rng: &mut R,
    ) -> SpawnOutcome {
        let mut free = board.free_cells();
        if free.is_empty() {
            return SpawnOutcome::BoardFull;
        }
        free.shuffle(rng);
        free.truncate(count);
        let spawns = free
            .into_iter()
            .map(|cell| {
                let value = if rng.gen::<f64>() < self.four_chance { 4 } else { 2 };
                let tile = board.spawn_tile(cell, value);
                Spawn { tile, cell, value }
            })
            .collect();
        SpawnOutcome::Placed(spawns)
    }
}
