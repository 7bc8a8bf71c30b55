//! Shift/merge resolution.
//!
//! [`resolve`] slides every tile as far as it can travel along a
//! direction, marks merges between equal-valued tiles, then finalizes the
//! merges in a deferred pass. Deferral means exactly two tiles ever
//! combine per merge: a tile produced by a merge cannot merge again within
//! the same shift.

use serde::{Deserialize, Serialize};

use crate::board::{Board, Direction, Pos, TileId};

/// A tile that came to rest on a different cell than it started on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveEvent {
    pub tile: TileId,
    pub from: Pos,
    pub to: Pos,
}

/// Two equal tiles combined into a fresh tile of double value.
///
/// `consumed` is `[target, mover]`: the stationary tile whose cell becomes
/// `cell`, and the tile that slid into it from `moved_from` (its resting
/// cell at merge time, also covered by a [`MoveEvent`] if it travelled).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeEvent {
    pub cell: Pos,
    pub consumed: [TileId; 2],
    pub moved_from: Pos,
    pub new_tile: TileId,
    pub value: u32,
}

/// Everything a presentation layer needs to animate one shift.
///
/// The value is inert: logical state is final the instant [`resolve`]
/// returns, and the caller decides how and when to present it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftResult {
    pub moves: Vec<MoveEvent>,
    pub merges: Vec<MergeEvent>,
    pub free_cells: Vec<Pos>,
}

impl ShiftResult {
    /// True when the shift moved or merged at least one tile.
    pub fn changed(&self) -> bool {
        !self.moves.is_empty() || !self.merges.is_empty()
    }
}

/// Slide and merge every tile along `dir`, mutating `board` in place.
///
/// Tiles are processed nearest-to-target-edge first (leading coordinate,
/// other-axis-ascending tie-break), so a docked tile is never overtaken.
/// Cells vacated by merge-marked tiles are open to tiles processed later
/// in the same pass.
///
/// ```
/// use board_2048::board::{Board, Direction, Pos};
/// use board_2048::shift::resolve;
///
/// let mut board = Board::new(4, 1);
/// board.spawn_tile(Pos::new(0, 0), 2);
/// board.spawn_tile(Pos::new(1, 0), 2);
/// board.spawn_tile(Pos::new(3, 0), 4);
/// let result = resolve(&mut board, Direction::Left);
///
/// // The two 2s merge; the 4 docks behind the merged tile without
/// // merging again in the same pass.
/// assert_eq!(result.merges.len(), 1);
/// assert_eq!(result.merges[0].value, 4);
/// assert_eq!(board.exponents(), vec![2, 2, 0, 0]);
/// ```
pub fn resolve(board: &mut Board, dir: Direction) -> ShiftResult {
    let (dx, dy) = dir.offset();
    let mut order: Vec<(TileId, Pos)> = board.tiles().map(|t| (t.id, t.cell)).collect();
    order.sort_by_key(|&(_, p)| {
        let (lead, other) = if dx != 0 { (p.x, p.y) } else { (p.y, p.x) };
        let lead = if dx + dy > 0 { -lead } else { lead };
        (lead, other)
    });

    let mut moves = Vec::new();
    for &(id, origin) in &order {
        let mut pos = origin;
        loop {
            let candidate = pos.step(dir);
            if !board.grid().contains(candidate) {
                break;
            }
            match board.occupant(candidate) {
                Some(other) => {
                    if board.merge_allowed(other, id) {
                        board.mark_merge(id, other);
                    }
                    break;
                }
                None => {
                    board.place(id, candidate);
                    pos = candidate;
                }
            }
        }
        if pos != origin {
            moves.push(MoveEvent {
                tile: id,
                from: origin,
                to: pos,
            });
        }
    }

    // Finalization is deferred until every tile has advanced.
    let mut merges = Vec::new();
    for &(id, _) in &order {
        let Some((target, moved_from)) = board
            .tile(id)
            .and_then(|t| t.merging_into.map(|target| (target, t.cell)))
        else {
            continue;
        };
        let (cell, value) = {
            let t = board.tile(target).expect("merge target missing");
            (t.cell, t.value * 2)
        };
        board.mark_consumed(id);
        board.mark_consumed(target);
        board.vacate(target);
        let new_tile = board.spawn_tile(cell, value);
        merges.push(MergeEvent {
            cell,
            consumed: [target, id],
            moved_from,
            new_tile,
            value,
        });
    }
    board.sweep_consumed();

    ShiftResult {
        moves,
        merges,
        free_cells: board.free_cells(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Direction::{Down, Left, Right, Up};

    fn board_4x4(tiles: &[(i32, i32, u32)]) -> Board {
        let mut board = Board::new(4, 4);
        for &(x, y, v) in tiles {
            board.spawn_tile(Pos::new(x, y), v);
        }
        board
    }

    fn placements(board: &Board) -> Vec<(i32, i32, u32)> {
        let mut out: Vec<_> = board
            .tiles()
            .map(|t| (t.cell.x, t.cell.y, t.value))
            .collect();
        out.sort_unstable();
        out
    }

    fn assert_consistent(board: &Board) {
        let mut occupied = 0;
        for pos in board.grid().cells() {
            if let Some(id) = board.occupant(pos) {
                occupied += 1;
                assert_eq!(board.tile(id).unwrap().cell, pos);
            }
        }
        assert_eq!(occupied, board.len());
    }

    #[test]
    fn merged_tile_does_not_merge_again() {
        // (0,0)=2 (1,0)=2 (3,0)=4, shift left: the 2s merge to a 4 at the
        // edge; the incoming 4 docks next to it unmerged.
        let mut board = board_4x4(&[(0, 0, 2), (1, 0, 2), (3, 0, 4)]);
        let result = resolve(&mut board, Left);
        assert_eq!(placements(&board), vec![(0, 0, 4), (1, 0, 4)]);
        assert_eq!(result.merges.len(), 1);
        assert_eq!(result.merges[0].cell, Pos::new(0, 0));
        assert_eq!(result.merges[0].value, 4);
        assert_consistent(&board);
    }

    #[test]
    fn triple_merges_nearest_target_edge() {
        let mut board = board_4x4(&[(0, 0, 2), (1, 0, 2), (2, 0, 2)]);
        let result = resolve(&mut board, Left);
        assert_eq!(placements(&board), vec![(0, 0, 4), (1, 0, 2)]);
        assert_eq!(result.merges.len(), 1);
        assert_consistent(&board);
    }

    #[test]
    fn four_equal_tiles_merge_in_pairs() {
        let mut board = board_4x4(&[(0, 0, 2), (1, 0, 2), (2, 0, 2), (3, 0, 2)]);
        let result = resolve(&mut board, Left);
        assert_eq!(placements(&board), vec![(0, 0, 4), (1, 0, 4)]);
        assert_eq!(result.merges.len(), 2);
        assert_consistent(&board);
    }

    #[test]
    fn mover_slides_then_merges_with_events() {
        let mut board = Board::new(4, 1);
        let stationary = board.spawn_tile(Pos::new(0, 0), 2);
        let mover = board.spawn_tile(Pos::new(3, 0), 2);
        let result = resolve(&mut board, Left);

        // The mover travels to the cell adjacent to its target, then the
        // pair collapses onto the target's cell.
        assert_eq!(
            result.moves,
            vec![MoveEvent {
                tile: mover,
                from: Pos::new(3, 0),
                to: Pos::new(1, 0),
            }]
        );
        assert_eq!(result.merges.len(), 1);
        let merge = result.merges[0];
        assert_eq!(merge.cell, Pos::new(0, 0));
        assert_eq!(merge.consumed, [stationary, mover]);
        assert_eq!(merge.moved_from, Pos::new(1, 0));
        assert_eq!(merge.value, 4);
        assert_eq!(board.tile(merge.new_tile).unwrap().value, 4);
        assert_eq!(board.len(), 1);
        assert_consistent(&board);
    }

    #[test]
    fn no_op_shift_emits_nothing() {
        let mut board = board_4x4(&[(0, 0, 2), (1, 0, 4)]);
        let before = board.clone();
        let result = resolve(&mut board, Left);
        assert!(!result.changed());
        assert!(result.moves.is_empty());
        assert!(result.merges.is_empty());
        assert_eq!(board, before);
        assert_eq!(result.free_cells, board.free_cells());
    }

    #[test]
    fn tile_at_boundary_produces_no_movement_event() {
        let mut board = board_4x4(&[(0, 2, 2)]);
        let result = resolve(&mut board, Left);
        assert!(result.moves.is_empty());
        assert_eq!(placements(&board), vec![(0, 2, 2)]);
    }

    #[test]
    fn unequal_neighbor_blocks_without_merging() {
        let mut board = board_4x4(&[(0, 0, 2), (2, 0, 4)]);
        let result = resolve(&mut board, Left);
        assert_eq!(placements(&board), vec![(0, 0, 2), (1, 0, 4)]);
        assert!(result.merges.is_empty());
        assert_eq!(result.moves.len(), 1);
    }

    #[test]
    fn right_shift_mirrors_left() {
        let mut board = board_4x4(&[(1, 0, 2), (2, 0, 2)]);
        let result = resolve(&mut board, Right);
        assert_eq!(placements(&board), vec![(3, 0, 4)]);
        assert_eq!(result.merges[0].cell, Pos::new(3, 0));
    }

    #[test]
    fn vertical_shifts_resolve_columns_independently() {
        let mut board = board_4x4(&[(0, 0, 2), (0, 3, 2), (1, 2, 4)]);
        resolve(&mut board, Up);
        assert_eq!(placements(&board), vec![(0, 3, 4), (1, 3, 4)]);

        let mut board = board_4x4(&[(2, 1, 2), (2, 3, 2), (3, 2, 8)]);
        resolve(&mut board, Down);
        assert_eq!(placements(&board), vec![(2, 0, 4), (3, 0, 8)]);
    }

    #[test]
    fn resolution_preserves_total_value() {
        let tiles = [
            (0, 0, 2),
            (1, 0, 2),
            (3, 0, 4),
            (0, 1, 4),
            (2, 1, 4),
            (1, 2, 8),
            (1, 3, 8),
            (3, 3, 2),
        ];
        for dir in Direction::ALL {
            let mut board = board_4x4(&tiles);
            let before = board.total_value();
            let result = resolve(&mut board, dir);
            assert_eq!(board.total_value(), before, "direction {dir:?}");
            for merge in &result.merges {
                assert_eq!(merge.value % 2, 0);
                assert_eq!(board.tile(merge.new_tile).unwrap().value, merge.value);
            }
            assert_consistent(&board);
        }
    }

    #[test]
    fn merges_only_between_equal_values() {
        let tiles = [(0, 1, 2), (1, 1, 4), (2, 1, 4), (3, 1, 2)];
        let mut board = board_4x4(&tiles);
        let values: std::collections::HashMap<TileId, u32> =
            board.tiles().map(|t| (t.id, t.value)).collect();
        let result = resolve(&mut board, Left);
        assert_eq!(result.merges.len(), 1);
        for merge in &result.merges {
            let [a, b] = merge.consumed;
            assert_eq!(values[&a], values[&b]);
            assert_eq!(merge.value, values[&a] * 2);
        }
        assert_eq!(placements(&board), vec![(0, 1, 2), (1, 1, 8), (2, 1, 2)]);
    }

    #[test]
    fn identical_inputs_produce_identical_events() {
        let tiles = [(0, 0, 2), (1, 0, 2), (2, 2, 4), (2, 3, 4), (3, 1, 2)];
        for dir in Direction::ALL {
            let mut a = board_4x4(&tiles);
            let mut b = board_4x4(&tiles);
            assert_eq!(resolve(&mut a, dir), resolve(&mut b, dir));
            assert_eq!(a.exponents(), b.exponents());
        }
    }

    #[test]
    fn free_cells_reflect_post_shift_board() {
        let mut board = board_4x4(&[(2, 0, 2), (3, 0, 2)]);
        let result = resolve(&mut board, Left);
        assert_eq!(result.free_cells, board.free_cells());
        assert_eq!(result.free_cells.len(), 15);
    }

    #[test]
    fn shift_method_delegates_to_resolve() {
        let mut board = board_4x4(&[(3, 0, 2)]);
        let result = board.shift(Left);
        assert_eq!(result.moves.len(), 1);
        assert_eq!(placements(&board), vec![(0, 0, 2)]);
    }
}
