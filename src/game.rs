//! Game session: ties the board, shift resolution and spawning together.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::{Board, Direction};
use crate::shift::{self, ShiftResult};
use crate::spawn::{Spawn, SpawnOutcome, Spawner};

/// Tiles placed when a new game starts.
pub const INITIAL_TILES: usize = 2;
/// Tiles placed after each shift.
pub const TILES_PER_TURN: usize = 1;

/// Observable session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    AwaitingInput,
    GameOver,
}

/// One completed turn: the shift's events plus the tiles spawned after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub shift: ShiftResult,
    pub spawned: Vec<Spawn>,
    pub game_over: bool,
}

/// A running game over one board.
///
/// The game is over when no cell is free at spawn time. That is the
/// free-cell rule only: a full board with adjacent equal pairs still ends
/// the game.
#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    spawner: Spawner,
    phase: Phase,
}

impl Game {
    /// Start a game on a fresh `width x height` board with
    /// [`INITIAL_TILES`] spawned tiles.
    pub fn new<R: Rng + ?Sized>(width: u32, height: u32, spawner: Spawner, rng: &mut R) -> Self {
        let mut board = Board::new(width, height);
        let phase = match spawner.spawn(&mut board, INITIAL_TILES, rng) {
            SpawnOutcome::Placed(_) => Phase::AwaitingInput,
            SpawnOutcome::BoardFull => Phase::GameOver,
        };
        Game {
            board,
            spawner,
            phase,
        }
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[inline]
    pub fn is_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// Resolve one directional input, then spawn the follow-up tile.
    ///
    /// Returns `None` once the game is over. A shift that moves nothing
    /// still spawns, matching the rules this engine models.
    pub fn step<R: Rng + ?Sized>(&mut self, dir: Direction, rng: &mut R) -> Option<Turn> {
        if self.is_over() {
            return None;
        }
        let shift = shift::resolve(&mut self.board, dir);
        let (spawned, game_over) = match self.spawner.spawn(&mut self.board, TILES_PER_TURN, rng) {
            SpawnOutcome::Placed(spawns) => (spawns, false),
            SpawnOutcome::BoardFull => (Vec::new(), true),
        };
        if game_over {
            self.phase = Phase::GameOver;
        }
        Some(Turn {
            shift,
            spawned,
            game_over,
        })
    }
}
