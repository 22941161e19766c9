//! A* over the grid with a Manhattan heuristic and unit edge cost.
//!
//! Equal f-scores are broken by lower h, then lower y, then lower x, so the
//! chosen path is reproducible.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::grid::Grid;
use crate::position::GridPosition;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct OpenNode {
    f: u32,
    h: u32,
    y: i32,
    x: i32,
}

impl OpenNode {
    fn pos(self) -> GridPosition {
        GridPosition::new(self.x, self.y)
    }
}

/// Shortest path from `start` to `end`, inclusive of both ends.
///
/// Returns an empty vector when `end` is out of bounds, unwalkable, or
/// unreachable. Unless `ignore_occupants` is set, fully occupied tiles are
/// not entered, except `end` itself.
pub fn find_path(
    grid: &Grid,
    start: GridPosition,
    end: GridPosition,
    ignore_occupants: bool,
) -> Vec<GridPosition> {
    if !grid.in_bounds(start) || !grid.is_walkable(end) {
        return Vec::new();
    }
    if start == end {
        return vec![start];
    }

    let mut open = BTreeSet::new();
    let mut closed = HashSet::new();
    let mut g_score: HashMap<GridPosition, u32> = HashMap::new();
    let mut came_from: HashMap<GridPosition, GridPosition> = HashMap::new();

    let h = start.manhattan(end);
    open.insert(OpenNode {
        f: h,
        h,
        y: start.y,
        x: start.x,
    });
    g_score.insert(start, 0);

    while let Some(node) = open.pop_first() {
        let current = node.pos();
        if current == end {
            return reconstruct(&came_from, start, end);
        }
        if !closed.insert(current) {
            continue;
        }
        let current_g = g_score.get(&current).copied().unwrap_or(u32::MAX);

        for next in grid.walkable_neighbors(current) {
            if closed.contains(&next) {
                continue;
            }
            if !ignore_occupants && next != end && grid.is_occupied(next) {
                continue;
            }
            let tentative = current_g.saturating_add(1);
            if tentative < g_score.get(&next).copied().unwrap_or(u32::MAX) {
                came_from.insert(next, current);
                g_score.insert(next, tentative);
                let h = next.manhattan(end);
                open.insert(OpenNode {
                    f: tentative + h,
                    h,
                    y: next.y,
                    x: next.x,
                });
            }
        }
    }

    Vec::new()
}

fn reconstruct(
    came_from: &HashMap<GridPosition, GridPosition>,
    start: GridPosition,
    end: GridPosition,
) -> Vec<GridPosition> {
    let mut path = vec![end];
    let mut node = end;
    while node != start {
        match came_from.get(&node) {
            Some(&prev) => {
                path.push(prev);
                node = prev;
            }
            None => return Vec::new(),
        }
    }
    path.reverse();
    path
}

/// True if any path exists.
pub fn path_exists(grid: &Grid, start: GridPosition, end: GridPosition, ignore_occupants: bool) -> bool {
    !find_path(grid, start, end, ignore_occupants).is_empty()
}

/// Number of steps along the shortest path, or -1 if unreachable.
pub fn path_distance(grid: &Grid, start: GridPosition, end: GridPosition, ignore_occupants: bool) -> i32 {
    let path = find_path(grid, start, end, ignore_occupants);
    path.len() as i32 - 1
}

/// The first tile to step onto toward `end`, if any.
pub fn next_step(
    grid: &Grid,
    start: GridPosition,
    end: GridPosition,
    ignore_occupants: bool,
) -> Option<GridPosition> {
    find_path(grid, start, end, ignore_occupants).get(1).copied()
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use proptest::prelude::*;

    use super::*;
    use crate::grid::{Occupant, SubTile, TileType};
    use crate::object::ObjectId;

    fn bfs_distance(grid: &Grid, start: GridPosition, end: GridPosition) -> Option<u32> {
        if !grid.is_walkable(end) {
            return None;
        }
        let mut dist = HashMap::new();
        let mut queue = VecDeque::new();
        dist.insert(start, 0u32);
        queue.push_back(start);
        while let Some(p) = queue.pop_front() {
            if p == end {
                return dist.get(&p).copied();
            }
            let d = dist[&p];
            for n in grid.walkable_neighbors(p) {
                if let std::collections::hash_map::Entry::Vacant(e) = dist.entry(n) {
                    e.insert(d + 1);
                    queue.push_back(n);
                }
            }
        }
        None
    }

    fn assert_contiguous(path: &[GridPosition]) {
        for pair in path.windows(2) {
            assert_eq!(pair[0].manhattan(pair[1]), 1, "path jumps: {path:?}");
        }
    }

    #[test]
    fn scenario_walls_on_column_three() {
        let mut grid = Grid::new(4, 4).unwrap();
        grid.set_tile_type(GridPosition::new(3, 0), TileType::Wall).unwrap();
        grid.set_tile_type(GridPosition::new(3, 2), TileType::Wall).unwrap();

        let path = find_path(&grid, GridPosition::new(0, 0), GridPosition::new(2, 1), false);
        assert_eq!(path.len(), 4);
        assert_eq!(path.first(), Some(&GridPosition::new(0, 0)));
        assert_eq!(path.last(), Some(&GridPosition::new(2, 1)));
        assert_contiguous(&path);
    }

    #[test]
    fn same_start_and_end() {
        let grid = Grid::new(3, 3).unwrap();
        let p = GridPosition::new(1, 1);
        assert_eq!(find_path(&grid, p, p, false), vec![p]);
        assert_eq!(path_distance(&grid, p, p, false), 0);
        assert_eq!(next_step(&grid, p, p, false), None);
    }

    #[test]
    fn unwalkable_or_out_of_bounds_target_is_empty() {
        let grid = Grid::from_rows(&["..#"]).unwrap();
        let start = GridPosition::new(0, 0);
        assert!(find_path(&grid, start, GridPosition::new(2, 0), false).is_empty());
        assert!(find_path(&grid, start, GridPosition::new(9, 9), false).is_empty());
        assert!(find_path(&grid, start, GridPosition::new(-1, 0), true).is_empty());
        assert_eq!(path_distance(&grid, start, GridPosition::new(2, 0), false), -1);
        assert!(!path_exists(&grid, start, GridPosition::new(2, 0), false));
    }

    #[test]
    fn walled_off_target_is_unreachable() {
        let grid = Grid::from_rows(&[".#.", ".#.", ".#."]).unwrap();
        assert!(!path_exists(&grid, GridPosition::new(0, 0), GridPosition::new(2, 2), true));
    }

    #[test]
    fn full_tiles_block_unless_ignored_or_destination() {
        let mut grid = Grid::from_rows(&["...", "#.#"]).unwrap();
        let mid = GridPosition::new(1, 0);
        for i in 0..4 {
            grid.set_occupant(
                Occupant::Object(ObjectId::new(format!("o{i}"))),
                mid,
                SubTile::from_index(i),
            )
            .unwrap();
        }
        let start = GridPosition::new(0, 0);
        let end = GridPosition::new(2, 0);
        assert!(find_path(&grid, start, end, false).is_empty());
        assert_eq!(find_path(&grid, start, end, true).len(), 3);
        // The destination itself may be full.
        assert_eq!(find_path(&grid, start, mid, false), vec![start, mid]);
    }

    #[test]
    fn next_step_moves_toward_goal() {
        let grid = Grid::new(5, 1).unwrap();
        assert_eq!(
            next_step(&grid, GridPosition::new(0, 0), GridPosition::new(4, 0), false),
            Some(GridPosition::new(1, 0))
        );
        assert_eq!(
            path_distance(&grid, GridPosition::new(0, 0), GridPosition::new(4, 0), false),
            4
        );
    }

    #[test]
    fn ties_resolve_deterministically() {
        let grid = Grid::new(3, 3).unwrap();
        let a = find_path(&grid, GridPosition::new(0, 0), GridPosition::new(2, 2), false);
        let b = find_path(&grid, GridPosition::new(0, 0), GridPosition::new(2, 2), false);
        assert_eq!(a, b);
        assert_eq!(a.len(), 5);
    }

    proptest! {
        #[test]
        fn astar_matches_bfs_distance(
            walls in proptest::collection::vec(any::<bool>(), 36),
            sx in 0i32..6, sy in 0i32..6, ex in 0i32..6, ey in 0i32..6,
        ) {
            let mut grid = Grid::new(6, 6).unwrap();
            for (i, wall) in walls.iter().enumerate() {
                let p = GridPosition::new(i as i32 % 6, i as i32 / 6);
                if *wall && i % 3 == 0 {
                    grid.set_tile_type(p, TileType::Wall).unwrap();
                }
            }
            let start = GridPosition::new(sx, sy);
            let end = GridPosition::new(ex, ey);
            let path = find_path(&grid, start, end, false);
            match bfs_distance(&grid, start, end) {
                Some(d) => {
                    prop_assert_eq!(path.len() as u32 - 1, d);
                    assert_contiguous(&path);
                }
                None => prop_assert!(path.is_empty()),
            }
        }
    }
}
