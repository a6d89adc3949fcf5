//! Breadth-first distance field over a tile grid.

use std::collections::VecDeque;

use delve_core::{CellCoord, TileGrid};

/// Dense step-distance grid seeded from one or more source cells.
///
/// The field mirrors the grid dimensions and stores breadth-first search
/// results. Distances stay at `u32::MAX` for unreachable or blocked cells so
/// callers can tell walls from far-away floor.
#[derive(Clone, Debug, Default)]
pub struct DistanceField {
    width: u32,
    height: u32,
    distances: Vec<u32>,
}

impl DistanceField {
    /// Creates an empty field.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the distances from `sources` using a breadth-first search.
    ///
    /// Sources outside the grid or on blocked tiles are skipped.
    pub fn rebuild(&mut self, grid: &TileGrid, sources: &[CellCoord]) {
        let cell_count = grid.tiles().len();
        self.width = grid.width();
        self.height = grid.height();
        if self.distances.len() != cell_count {
            self.distances = vec![u32::MAX; cell_count];
        } else {
            self.distances.fill(u32::MAX);
        }

        if cell_count == 0 {
            return;
        }

        let mut queue = VecDeque::new();
        for &source in sources {
            if !grid.is_walkable(source) {
                continue;
            }
            let Some(index) = grid.index(source) else {
                continue;
            };
            if self.distances[index] == 0 {
                continue;
            }
            self.distances[index] = 0;
            queue.push_back(source);
        }

        while let Some(cell) = queue.pop_front() {
            let Some(current_index) = grid.index(cell) else {
                continue;
            };
            let next_distance = self.distances[current_index].saturating_add(1);

            for neighbor in grid.walkable_neighbors(cell) {
                let Some(neighbor_index) = grid.index(neighbor) else {
                    continue;
                };
                if self.distances[neighbor_index] <= next_distance {
                    continue;
                }
                self.distances[neighbor_index] = next_distance;
                queue.push_back(neighbor);
            }
        }
    }

    /// Builds a fresh field from a single source cell.
    #[must_use]
    pub fn from_source(grid: &TileGrid, source: CellCoord) -> Self {
        let mut field = Self::new();
        field.rebuild(grid, &[source]);
        field
    }

    /// Step distance to the provided cell, or `None` when it is unreachable.
    #[must_use]
    pub fn distance(&self, cell: CellCoord) -> Option<u32> {
        if cell.column() >= self.width || cell.row() >= self.height {
            return None;
        }

        let width = usize::try_from(self.width).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let row = usize::try_from(cell.row()).ok()?;
        let offset = row.checked_mul(width)?.checked_add(column)?;
        self.distances
            .get(offset)
            .copied()
            .filter(|distance| *distance != u32::MAX)
    }

    /// Reports whether the cell was reached from any source.
    #[must_use]
    pub fn is_reachable(&self, cell: CellCoord) -> bool {
        self.distance(cell).is_some()
    }
}
