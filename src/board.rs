use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A direction to move/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// A raw vector that is not one of the four canonical unit directions.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("not a unit direction vector: ({x}, {y})")]
pub struct InvalidDirection {
    pub x: i32,
    pub y: i32,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// The unit coordinate offset for this direction. `y` grows upward.
    #[inline]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, 1),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Validate a raw vector at the API boundary.
    ///
    /// ```
    /// use board_2048::board::Direction;
    /// assert_eq!(Direction::from_vector(-1, 0), Ok(Direction::Left));
    /// assert!(Direction::from_vector(1, 1).is_err());
    /// ```
    pub fn from_vector(x: i32, y: i32) -> Result<Self, InvalidDirection> {
        match (x, y) {
            (0, 1) => Ok(Direction::Up),
            (0, -1) => Ok(Direction::Down),
            (-1, 0) => Ok(Direction::Left),
            (1, 0) => Ok(Direction::Right),
            _ => Err(InvalidDirection { x, y }),
        }
    }

    /// Compact byte used by the trace format.
    #[inline]
    pub fn to_u8(self) -> u8 {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }

    #[inline]
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Direction::Up),
            1 => Some(Direction::Down),
            2 => Some(Direction::Left),
            3 => Some(Direction::Right),
            _ => None,
        }
    }
}

/// A grid coordinate. `y` grows upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Pos { x, y }
    }

    /// The neighboring position one step along `dir`.
    #[inline]
    pub const fn step(self, dir: Direction) -> Pos {
        let (dx, dy) = dir.offset();
        Pos {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Stable handle to a tile. Ids are never reused within one `Board`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(pub u32);

/// A numbered game piece occupying one cell.
///
/// `merging_into`, `incoming` and `consumed` are transient and only ever
/// set inside a single resolution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub id: TileId,
    pub value: u32,
    pub cell: Pos,
    pub(crate) merging_into: Option<TileId>,
    pub(crate) incoming: Option<TileId>,
    pub(crate) consumed: bool,
}

/// Fixed board extents, created once and never resized.
///
/// Cells enumerate row-major: `y` ascending, `x` ascending within a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: u32,
    height: u32,
}

impl Grid {
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "grid extents must be nonzero");
        Grid { width, height }
    }

    #[inline]
    pub fn width(self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(self) -> u32 {
        self.height
    }

    #[inline]
    pub fn contains(self, pos: Pos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    /// Row-major index of an in-bounds position.
    #[inline]
    pub(crate) fn index(self, pos: Pos) -> usize {
        debug_assert!(self.contains(pos));
        pos.y as usize * self.width as usize + pos.x as usize
    }

    /// All positions in row-major order.
    pub fn cells(self) -> impl Iterator<Item = Pos> {
        let (w, h) = (self.width as i32, self.height as i32);
        (0..h).flat_map(move |y| (0..w).map(move |x| Pos { x, y }))
    }

    /// Total number of cells.
    #[inline]
    pub fn cell_count(self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// The playing board: grid extents, owned tiles, and cell occupancy.
///
/// The occupancy map is the single source of truth for which tile sits on
/// which cell; `Tile::cell` is kept consistent with it by routing every
/// move through [`Board::place`]. The only exception is a merge-marked tile
/// inside a resolution pass, whose cell is released early so tiles behind
/// it can slide through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    grid: Grid,
    tiles: HashMap<TileId, Tile>,
    occupant: Vec<Option<TileId>>,
    next_id: u32,
}

impl Board {
    pub fn new(width: u32, height: u32) -> Self {
        let grid = Grid::new(width, height);
        Board {
            grid,
            tiles: HashMap::new(),
            occupant: vec![None; grid.cell_count()],
            next_id: 0,
        }
    }

    #[inline]
    pub fn grid(&self) -> Grid {
        self.grid
    }

    /// The tile occupying `pos`, or `None` if the cell is free or out of
    /// bounds.
    #[inline]
    pub fn occupant(&self, pos: Pos) -> Option<TileId> {
        if !self.grid.contains(pos) {
            return None;
        }
        self.occupant[self.grid.index(pos)]
    }

    #[inline]
    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(&id)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    /// Number of active tiles.
    #[inline]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// True when no cell is free.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.tiles.len() == self.grid.cell_count()
    }

    /// All unoccupied cells in row-major order.
    pub fn free_cells(&self) -> Vec<Pos> {
        self.grid
            .cells()
            .filter(|&p| self.occupant[self.grid.index(p)].is_none())
            .collect()
    }

    /// Sum of all active tile values.
    pub fn total_value(&self) -> u64 {
        self.tiles.values().map(|t| t.value as u64).sum()
    }

    /// The highest tile value on the board, 0 when empty.
    pub fn highest_tile(&self) -> u32 {
        self.tiles.values().map(|t| t.value).max().unwrap_or(0)
    }

    /// Slide and merge all tiles along `dir`. See [`crate::shift::resolve`].
    pub fn shift(&mut self, dir: Direction) -> crate::shift::ShiftResult {
        crate::shift::resolve(self, dir)
    }

    /// Create a tile on a free cell.
    ///
    /// Panics on an occupied or out-of-bounds cell: occupancy is a hard
    /// invariant, not a recoverable state.
    pub fn spawn_tile(&mut self, cell: Pos, value: u32) -> TileId {
        assert!(self.grid.contains(cell), "spawn outside the grid: {cell}");
        assert!(
            value >= 2 && value.is_power_of_two(),
            "tile value must be a power of two >= 2, got {value}"
        );
        let idx = self.grid.index(cell);
        assert!(self.occupant[idx].is_none(), "two tiles on one cell: {cell}");
        let id = TileId(self.next_id);
        self.next_id += 1;
        self.tiles.insert(
            id,
            Tile {
                id,
                value,
                cell,
                merging_into: None,
                incoming: None,
                consumed: false,
            },
        );
        self.occupant[idx] = Some(id);
        id
    }

    /// Move a tile onto a free cell, updating the tile and both cells in
    /// one step so the back-references never diverge.
    pub(crate) fn place(&mut self, id: TileId, to: Pos) {
        assert!(self.grid.contains(to), "move outside the grid: {to}");
        let to_idx = self.grid.index(to);
        assert!(self.occupant[to_idx].is_none(), "two tiles on one cell: {to}");
        let tile = self.tiles.get_mut(&id).expect("moving unknown tile");
        let from = tile.cell;
        tile.cell = to;
        let from_idx = self.grid.index(from);
        if self.occupant[from_idx] == Some(id) {
            self.occupant[from_idx] = None;
        }
        self.occupant[to_idx] = Some(id);
    }

    /// Release a tile's cell without moving the tile.
    pub(crate) fn vacate(&mut self, id: TileId) {
        let cell = self.tiles.get(&id).expect("vacating unknown tile").cell;
        let idx = self.grid.index(cell);
        if self.occupant[idx] == Some(id) {
            self.occupant[idx] = None;
        }
    }

    /// Merge eligibility: equal value, and the target neither has an
    /// incoming merger already nor a merge target of its own.
    pub(crate) fn merge_allowed(&self, target: TileId, mover: TileId) -> bool {
        match (self.tiles.get(&target), self.tiles.get(&mover)) {
            (Some(t), Some(m)) => {
                t.value == m.value && t.incoming.is_none() && t.merging_into.is_none()
            }
            _ => false,
        }
    }

    /// Link `mover` into `target` and release the mover's cell so tiles
    /// processed later in the same pass can slide through it.
    pub(crate) fn mark_merge(&mut self, mover: TileId, target: TileId) {
        self.tiles
            .get_mut(&mover)
            .expect("merging unknown tile")
            .merging_into = Some(target);
        self.tiles
            .get_mut(&target)
            .expect("merge target unknown")
            .incoming = Some(mover);
        self.vacate(mover);
    }

    pub(crate) fn mark_consumed(&mut self, id: TileId) {
        if let Some(t) = self.tiles.get_mut(&id) {
            t.consumed = true;
        }
    }

    /// Drop every tile flagged as consumed from the active set.
    pub(crate) fn sweep_consumed(&mut self) {
        let dead: Vec<TileId> = self
            .tiles
            .values()
            .filter(|t| t.consumed)
            .map(|t| t.id)
            .collect();
        for id in dead {
            self.remove_tile(id);
        }
    }

    /// Drop a tile from the active set, releasing its cell if it still
    /// holds it.
    pub(crate) fn remove_tile(&mut self, id: TileId) {
        if let Some(tile) = self.tiles.remove(&id) {
            let idx = self.grid.index(tile.cell);
            if self.occupant[idx] == Some(id) {
                self.occupant[idx] = None;
            }
        }
    }

    /// Row-major exponent snapshot: 0 for a free cell, log2(value)
    /// otherwise.
    pub fn exponents(&self) -> Vec<u8> {
        let mut out = vec![0u8; self.grid.cell_count()];
        for tile in self.tiles.values() {
            out[self.grid.index(tile.cell)] = tile.value.trailing_zeros() as u8;
        }
        out
    }

    /// Rebuild a board from an exponent snapshot (inverse of
    /// [`Board::exponents`]).
    pub fn from_exponents(width: u32, height: u32, exps: &[u8]) -> Self {
        let mut board = Board::new(width, height);
        assert_eq!(exps.len(), board.grid.cell_count(), "snapshot length mismatch");
        let grid = board.grid;
        for (pos, &e) in grid.cells().zip(exps.iter()) {
            if e > 0 {
                board.spawn_tile(pos, 1u32 << e);
            }
        }
        board
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let exps = self.exponents();
        let w = self.grid.width as usize;
        let h = self.grid.height as usize;
        writeln!(f)?;
        for row in (0..h).rev() {
            let line: Vec<String> = (0..w).map(|col| format_val(exps[row * w + col])).collect();
            writeln!(f, "{}", line.join("|"))?;
            if row > 0 {
                writeln!(f, "{}", "-".repeat(8 * w - 1))?;
            }
        }
        Ok(())
    }
}

fn format_val(exp: u8) -> String {
    if exp == 0 {
        " ".repeat(7)
    } else {
        format!("{:^7}", 1u64 << exp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occupant_out_of_bounds_is_none() {
        let board = Board::new(4, 4);
        assert_eq!(board.occupant(Pos::new(-1, 0)), None);
        assert_eq!(board.occupant(Pos::new(0, 4)), None);
        assert_eq!(board.occupant(Pos::new(4, 0)), None);
        assert_eq!(board.occupant(Pos::new(0, 0)), None);
    }

    #[test]
    fn free_cells_are_row_major() {
        let mut board = Board::new(2, 2);
        board.spawn_tile(Pos::new(1, 0), 2);
        assert_eq!(
            board.free_cells(),
            vec![Pos::new(0, 0), Pos::new(0, 1), Pos::new(1, 1)]
        );
    }

    #[test]
    fn spawn_and_move_keep_occupancy_consistent() {
        let mut board = Board::new(4, 4);
        let id = board.spawn_tile(Pos::new(1, 2), 2);
        assert_eq!(board.occupant(Pos::new(1, 2)), Some(id));
        assert_eq!(board.tile(id).unwrap().cell, Pos::new(1, 2));

        board.place(id, Pos::new(3, 2));
        assert_eq!(board.occupant(Pos::new(1, 2)), None);
        assert_eq!(board.occupant(Pos::new(3, 2)), Some(id));
        assert_eq!(board.tile(id).unwrap().cell, Pos::new(3, 2));
        assert_eq!(board.len(), 1);
    }

    #[test]
    #[should_panic(expected = "two tiles on one cell")]
    fn spawn_on_occupied_cell_panics() {
        let mut board = Board::new(4, 4);
        board.spawn_tile(Pos::new(0, 0), 2);
        board.spawn_tile(Pos::new(0, 0), 4);
    }

    #[test]
    fn direction_vectors_round_trip() {
        for dir in Direction::ALL {
            let (dx, dy) = dir.offset();
            assert_eq!(Direction::from_vector(dx, dy), Ok(dir));
            assert_eq!(Direction::from_u8(dir.to_u8()), Some(dir));
        }
        assert_eq!(
            Direction::from_vector(2, 0),
            Err(InvalidDirection { x: 2, y: 0 })
        );
        assert!(Direction::from_vector(0, 0).is_err());
        assert_eq!(Direction::from_u8(4), None);
    }

    #[test]
    fn exponent_snapshot_round_trips() {
        let mut board = Board::new(3, 2);
        board.spawn_tile(Pos::new(0, 0), 2);
        board.spawn_tile(Pos::new(2, 1), 1024);
        let exps = board.exponents();
        assert_eq!(exps, vec![1, 0, 0, 0, 0, 10]);
        let rebuilt = Board::from_exponents(3, 2, &exps);
        assert_eq!(rebuilt.exponents(), exps);
        assert_eq!(rebuilt.total_value(), board.total_value());
    }

    #[test]
    fn queries_on_tiles() {
        let mut board = Board::new(4, 4);
        assert_eq!(board.highest_tile(), 0);
        assert!(board.is_empty());
        board.spawn_tile(Pos::new(0, 0), 2);
        board.spawn_tile(Pos::new(1, 0), 8);
        assert_eq!(board.highest_tile(), 8);
        assert_eq!(board.total_value(), 10);
        assert_eq!(board.len(), 2);
        assert!(!board.is_full());
    }

    #[test]
    fn full_board_detection() {
        let mut board = Board::new(2, 1);
        board.spawn_tile(Pos::new(0, 0), 2);
        assert!(!board.is_full());
        board.spawn_tile(Pos::new(1, 0), 2);
        assert!(board.is_full());
        assert!(board.free_cells().is_empty());
    }
}
