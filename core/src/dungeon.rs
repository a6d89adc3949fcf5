//! Generated map description shared by the generator and the room.

use crate::{CellCoord, Direction, Seed, Tile, TileGrid};

/// Rectangle carved into the grid as open floor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Room {
    /// Column of the upper-left corner.
    pub x: u32,
    /// Row of the upper-left corner.
    pub y: u32,
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
}

impl Room {
    /// Creates a new room rectangle.
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Center tile of the room, rounded toward the upper-left.
    #[must_use]
    pub const fn center(&self) -> CellCoord {
        CellCoord::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Reports whether the cell lies inside the room.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() >= self.x
            && cell.column() < self.x + self.width
            && cell.row() >= self.y
            && cell.row() < self.y + self.height
    }

    /// Reports whether `other` overlaps this room grown by `padding` tiles.
    #[must_use]
    pub fn intersects_padded(&self, other: &Room, padding: u32) -> bool {
        let left = self.x.saturating_sub(padding);
        let top = self.y.saturating_sub(padding);
        let right = self.x + self.width + padding;
        let bottom = self.y + self.height + padding;

        left < other.x + other.width
            && other.x < right
            && top < other.y + other.height
            && other.y < bottom
    }
}

/// Region bots are spawned in, anchored in one cardinal direction from the entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpawnZone {
    /// Center tile of the zone.
    pub center: CellCoord,
    /// Radius of the zone in tiles.
    pub radius: u32,
    /// Direction of the zone as seen from the entry point.
    pub direction: Direction,
}

/// Loose parts assembled by a generator into a [`DungeonData`].
#[derive(Clone, Debug)]
pub struct DungeonLayout {
    /// Final tile grid.
    pub grid: TileGrid,
    /// Rooms in generation order.
    pub rooms: Vec<Room>,
    /// Tile players are placed on when they arrive through the entry.
    pub spawn_point: CellCoord,
    /// Center of the first room; the home marker or the entry portal.
    pub entry_point: CellCoord,
    /// Tile of the exit portal.
    pub exit_portal: CellCoord,
    /// Tiles of the transport pads in generation order.
    pub transport_points: Vec<CellCoord>,
    /// Spawn zones in north, south, east, west order, skipping empty directions.
    pub spawn_zones: Vec<SpawnZone>,
    /// Depth the map was generated for.
    pub depth: u32,
    /// Seed the map was generated from.
    pub seed: Seed,
}

/// Immutable description of one generated map.
///
/// The only mutation allowed after generation is flipping transport pads
/// from inactive to active.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DungeonData {
    grid: TileGrid,
    rooms: Vec<Room>,
    spawn_point: CellCoord,
    entry_point: CellCoord,
    exit_portal: CellCoord,
    transport_points: Vec<CellCoord>,
    spawn_zones: Vec<SpawnZone>,
    depth: u32,
    seed: Seed,
}

impl DungeonData {
    /// Freezes a generated layout.
    #[must_use]
    pub fn new(layout: DungeonLayout) -> Self {
        Self {
            grid: layout.grid,
            rooms: layout.rooms,
            spawn_point: layout.spawn_point,
            entry_point: layout.entry_point,
            exit_portal: layout.exit_portal,
            transport_points: layout.transport_points,
            spawn_zones: layout.spawn_zones,
            depth: layout.depth,
            seed: layout.seed,
        }
    }

    /// Tile grid of the map.
    #[must_use]
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// Rooms in generation order.
    #[must_use]
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// Tile players are placed on when they arrive through the entry.
    #[must_use]
    pub const fn spawn_point(&self) -> CellCoord {
        self.spawn_point
    }

    /// Center of the first room, regardless of depth.
    #[must_use]
    pub const fn entry_point(&self) -> CellCoord {
        self.entry_point
    }

    /// Entry portal of the map; the home map has none.
    #[must_use]
    pub const fn entry_portal(&self) -> Option<CellCoord> {
        if self.depth == 0 {
            None
        } else {
            Some(self.entry_point)
        }
    }

    /// Tile of the exit portal.
    #[must_use]
    pub const fn exit_portal(&self) -> CellCoord {
        self.exit_portal
    }

    /// Tiles of the transport pads in generation order.
    #[must_use]
    pub fn transport_points(&self) -> &[CellCoord] {
        &self.transport_points
    }

    /// Spawn zones derived from the entry point.
    #[must_use]
    pub fn spawn_zones(&self) -> &[SpawnZone] {
        &self.spawn_zones
    }

    /// Depth the map was generated for.
    #[must_use]
    pub const fn depth(&self) -> u32 {
        self.depth
    }

    /// Seed the map was generated from.
    #[must_use]
    pub const fn seed(&self) -> Seed {
        self.seed
    }

    /// Flips an inactive transport pad to active.
    ///
    /// Returns `true` when the pad changed state.
    pub fn activate_transport(&mut self, cell: CellCoord) -> bool {
        if self.grid.get(cell) != Some(Tile::InactiveTransport) {
            return false;
        }
        self.grid.set(cell, Tile::ActiveTransport);
        true
    }

    /// Next active pad after `from` in generation order, wrapping around.
    #[must_use]
    pub fn next_active_transport(&self, from: CellCoord) -> Option<CellCoord> {
        let start = self.transport_points.iter().position(|cell| *cell == from)?;
        let count = self.transport_points.len();
        (1..count)
            .map(|offset| self.transport_points[(start + offset) % count])
            .find(|cell| self.grid.get(*cell) == Some(Tile::ActiveTransport))
    }
}
