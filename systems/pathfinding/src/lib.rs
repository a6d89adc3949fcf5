#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Grid pathfinding primitives: A*, breadth-first distances, and line of sight.
//!
//! Every search uses 4-directional connectivity over [`TileGrid`] and treats
//! only walls and obstacles as blocked.

mod field;

use std::{cmp::Reverse, collections::BinaryHeap};

use delve_core::{CellCoord, TileGrid};

pub use field::DistanceField;

const NO_PARENT: usize = usize::MAX;

/// Reusable A* workspace.
///
/// The open set orders entries by `(f, insertion order)`, so among equal-f
/// candidates the one inserted first is expanded first. Test expectations
/// elsewhere depend on that tie-break.
#[derive(Debug, Default)]
pub struct PathFinder {
    g_scores: Vec<u32>,
    parents: Vec<usize>,
    closed: Vec<bool>,
    open: BinaryHeap<Reverse<(u32, u64, usize)>>,
}

impl PathFinder {
    /// Creates a path finder with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds a shortest path from `start` to `goal`, both inclusive.
    ///
    /// Returns an empty path when either endpoint is not walkable or the goal
    /// cannot be reached.
    pub fn find_path(
        &mut self,
        grid: &TileGrid,
        start: CellCoord,
        goal: CellCoord,
    ) -> Vec<CellCoord> {
        if !grid.is_walkable(start) || !grid.is_walkable(goal) {
            return Vec::new();
        }
        if start == goal {
            return vec![start];
        }

        let (Some(start_index), Some(goal_index)) = (grid.index(start), grid.index(goal)) else {
            return Vec::new();
        };
        let Ok(width) = usize::try_from(grid.width()) else {
            return Vec::new();
        };

        self.prepare(grid.tiles().len());
        let mut insertion: u64 = 0;
        self.g_scores[start_index] = 0;
        self.open
            .push(Reverse((start.manhattan_distance(goal), insertion, start_index)));

        while let Some(Reverse((_, _, current))) = self.open.pop() {
            if self.closed[current] {
                continue;
            }
            self.closed[current] = true;

            if current == goal_index {
                return self.reconstruct(goal_index, width);
            }

            let cell = cell_at(current, width);
            let tentative = self.g_scores[current].saturating_add(1);
            for neighbor in grid.walkable_neighbors(cell) {
                let Some(neighbor_index) = grid.index(neighbor) else {
                    continue;
                };
                if self.closed[neighbor_index] || tentative >= self.g_scores[neighbor_index] {
                    continue;
                }

                self.g_scores[neighbor_index] = tentative;
                self.parents[neighbor_index] = current;
                insertion += 1;
                let estimate = tentative.saturating_add(neighbor.manhattan_distance(goal));
                self.open.push(Reverse((estimate, insertion, neighbor_index)));
            }
        }

        Vec::new()
    }

    fn prepare(&mut self, cell_count: usize) {
        self.g_scores.clear();
        self.g_scores.resize(cell_count, u32::MAX);
        self.parents.clear();
        self.parents.resize(cell_count, NO_PARENT);
        self.closed.clear();
        self.closed.resize(cell_count, false);
        self.open.clear();
    }

    fn reconstruct(&self, goal_index: usize, width: usize) -> Vec<CellCoord> {
        let mut path = Vec::new();
        let mut cursor = goal_index;
        while cursor != NO_PARENT {
            path.push(cell_at(cursor, width));
            cursor = self.parents[cursor];
        }
        path.reverse();
        path
    }
}

/// Convenience wrapper around a throwaway [`PathFinder`].
#[must_use]
pub fn find_path(grid: &TileGrid, start: CellCoord, goal: CellCoord) -> Vec<CellCoord> {
    PathFinder::new().find_path(grid, start, goal)
}

/// Reports whether every tile strictly between `from` and `to` on the
/// Bresenham line is walkable. The endpoints themselves are not checked.
#[must_use]
pub fn has_line_of_sight(grid: &TileGrid, from: CellCoord, to: CellCoord) -> bool {
    let mut x = i64::from(from.column());
    let mut y = i64::from(from.row());
    let target_x = i64::from(to.column());
    let target_y = i64::from(to.row());

    let dx = (target_x - x).abs();
    let dy = -(target_y - y).abs();
    let step_x = if x < target_x { 1 } else { -1 };
    let step_y = if y < target_y { 1 } else { -1 };
    let mut error = dx + dy;

    loop {
        if x == target_x && y == target_y {
            return true;
        }

        let doubled = 2 * error;
        if doubled >= dy {
            error += dy;
            x += step_x;
        }
        if doubled <= dx {
            error += dx;
            y += step_y;
        }

        if x == target_x && y == target_y {
            return true;
        }

        let walkable = CellCoord::new(0, 0)
            .offset(x, y)
            .is_some_and(|cell| grid.is_walkable(cell));
        if !walkable {
            return false;
        }
    }
}

/// Straight-line distance between two tile coordinates.
#[must_use]
pub fn euclidean_distance(from: CellCoord, to: CellCoord) -> f64 {
    let dx = f64::from(from.column()) - f64::from(to.column());
    let dy = f64::from(from.row()) - f64::from(to.row());
    (dx * dx + dy * dy).sqrt()
}

fn cell_at(index: usize, width: usize) -> CellCoord {
    let column = u32::try_from(index % width).unwrap_or(u32::MAX);
    let row = u32::try_from(index / width).unwrap_or(u32::MAX);
    CellCoord::new(column, row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_corridor_path_is_inclusive() {
        let grid = TileGrid::from_rows(&["#####", "#...#", "#####"]);
        let path = find_path(&grid, CellCoord::new(1, 1), CellCoord::new(3, 1));
        assert_eq!(
            path,
            vec![
                CellCoord::new(1, 1),
                CellCoord::new(2, 1),
                CellCoord::new(3, 1),
            ]
        );
    }

    #[test]
    fn blocked_endpoints_yield_empty_path() {
        let grid = TileGrid::from_rows(&["#####", "#.o.#", "#####"]);
        assert!(find_path(&grid, CellCoord::new(1, 1), CellCoord::new(2, 1)).is_empty());
        assert!(find_path(&grid, CellCoord::new(0, 0), CellCoord::new(1, 1)).is_empty());
        assert!(find_path(&grid, CellCoord::new(1, 1), CellCoord::new(3, 1)).is_empty());
    }

    #[test]
    fn start_equal_to_goal_is_single_tile() {
        let grid = TileGrid::from_rows(&["..."]);
        let cell = CellCoord::new(1, 0);
        assert_eq!(find_path(&grid, cell, cell), vec![cell]);
    }

    #[test]
    fn tie_break_expands_first_inserted_candidate() {
        // From (0,0) to (1,1) both detours have f = 2; east is inserted
        // before south, so the path goes east first.
        let grid = TileGrid::from_rows(&["..", ".."]);
        let path = find_path(&grid, CellCoord::new(0, 0), CellCoord::new(1, 1));
        assert_eq!(
            path,
            vec![
                CellCoord::new(0, 0),
                CellCoord::new(1, 0),
                CellCoord::new(1, 1),
            ]
        );
    }

    #[test]
    fn path_routes_around_obstacles() {
        let grid = TileGrid::from_rows(&[
            "#######", //
            "#..o..#", //
            "#..o..#", //
            "#.....#", //
            "#######", //
        ]);
        let path = find_path(&grid, CellCoord::new(1, 1), CellCoord::new(5, 1));
        assert_eq!(path.len(), 9);
        assert!(path.iter().all(|cell| grid.is_walkable(*cell)));
        for pair in path.windows(2) {
            assert_eq!(pair[0].manhattan_distance(pair[1]), 1);
        }
    }

    #[test]
    fn workspace_is_reusable_across_grids() {
        let mut finder = PathFinder::new();
        let small = TileGrid::from_rows(&["..."]);
        let large = TileGrid::from_rows(&["....", "....", "...."]);
        assert_eq!(
            finder
                .find_path(&small, CellCoord::new(0, 0), CellCoord::new(2, 0))
                .len(),
            3
        );
        assert_eq!(
            finder
                .find_path(&large, CellCoord::new(0, 0), CellCoord::new(3, 2))
                .len(),
            6
        );
    }

    #[test]
    fn line_of_sight_ignores_endpoints() {
        let grid = TileGrid::from_rows(&["o...o"]);
        assert!(has_line_of_sight(&grid, CellCoord::new(0, 0), CellCoord::new(4, 0)));
    }

    #[test]
    fn line_of_sight_blocked_by_intermediate_wall() {
        let grid = TileGrid::from_rows(&["..#.."]);
        assert!(!has_line_of_sight(&grid, CellCoord::new(0, 0), CellCoord::new(4, 0)));
        assert!(has_line_of_sight(&grid, CellCoord::new(0, 0), CellCoord::new(1, 0)));
    }

    #[test]
    fn line_of_sight_follows_diagonals() {
        let grid = TileGrid::from_rows(&[
            "....", //
            ".#..", //
            "....", //
            "....", //
        ]);
        assert!(!has_line_of_sight(&grid, CellCoord::new(0, 0), CellCoord::new(3, 3)));
        assert!(has_line_of_sight(&grid, CellCoord::new(0, 3), CellCoord::new(3, 0)));
    }

    #[test]
    fn euclidean_distance_matches_pythagoras() {
        let distance = euclidean_distance(CellCoord::new(0, 0), CellCoord::new(3, 4));
        assert!((distance - 5.0).abs() < f64::EPSILON);
    }
}
