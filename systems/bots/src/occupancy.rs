//! One-bot-per-tile occupancy grid.

use delve_core::{BotId, CellCoord};

/// Dense per-tile record of which bot stands where.
#[derive(Clone, Debug)]
pub(crate) struct OccupancyGrid {
    width: u32,
    height: u32,
    cells: Vec<Option<BotId>>,
}

impl OccupancyGrid {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        let capacity = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);
        Self {
            width,
            height,
            cells: vec![None; capacity],
        }
    }

    pub(crate) fn occupant(&self, cell: CellCoord) -> Option<BotId> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    pub(crate) fn occupy(&mut self, bot_id: BotId, cell: CellCoord) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = Some(bot_id);
            }
        }
    }

    pub(crate) fn vacate(&mut self, cell: CellCoord) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = None;
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.cells.fill(None);
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() >= self.width || cell.row() >= self.height {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.width).ok()?;
        Some(row * width + column)
    }
}
