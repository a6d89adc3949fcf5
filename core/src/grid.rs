//! Tile grid primitives shared by generation, pathfinding, and the room.

use serde::{Deserialize, Serialize};

/// Terrain classification of a single grid cell.
///
/// The discriminants are the wire values clients use when they rebuild a
/// grid locally.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Tile {
    /// Solid rock that blocks movement and sight.
    Wall = 0,
    /// Open ground.
    Floor = 1,
    /// Debris scattered on the floor; blocks movement and sight.
    Obstacle = 2,
    /// Portal leading back to the previous depth.
    EntryPortal = 3,
    /// Portal leading to the next depth.
    ExitPortal = 4,
    /// Starting point of the home map at depth zero.
    HomeMarker = 5,
    /// Transport pad that has not been discovered yet.
    InactiveTransport = 6,
    /// Transport pad that players may travel between.
    ActiveTransport = 7,
}

impl Tile {
    /// Small integer written on the wire for this tile.
    #[must_use]
    pub const fn wire_value(self) -> u8 {
        self as u8
    }

    /// Decodes a wire value, returning `None` for unknown values.
    #[must_use]
    pub const fn from_wire(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Wall),
            1 => Some(Self::Floor),
            2 => Some(Self::Obstacle),
            3 => Some(Self::EntryPortal),
            4 => Some(Self::ExitPortal),
            5 => Some(Self::HomeMarker),
            6 => Some(Self::InactiveTransport),
            7 => Some(Self::ActiveTransport),
            _ => None,
        }
    }

    /// Reports whether entities may stand on the tile.
    ///
    /// Only walls and obstacles block; portals and pads are walkable.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        !matches!(self, Self::Wall | Self::Obstacle)
    }

    /// Reports whether the tile is an entry or exit portal.
    #[must_use]
    pub const fn is_portal(self) -> bool {
        matches!(self, Self::EntryPortal | Self::ExitPortal)
    }
}

/// Cardinal movement directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// All directions in clockwise order starting at north.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Column and row delta of a single step in this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Computes the Chebyshev distance between two cell coordinates.
    #[must_use]
    pub fn chebyshev_distance(self, other: CellCoord) -> u32 {
        self.column()
            .abs_diff(other.column())
            .max(self.row().abs_diff(other.row()))
    }

    /// Offsets the cell by a signed delta, returning `None` below zero.
    ///
    /// Upper bounds are the grid's concern; see [`TileGrid::contains`].
    #[must_use]
    pub fn offset(self, dx: i64, dy: i64) -> Option<CellCoord> {
        let column = i64::from(self.column).checked_add(dx)?;
        let row = i64::from(self.row).checked_add(dy)?;
        let column = u32::try_from(column).ok()?;
        let row = u32::try_from(row).ok()?;
        Some(CellCoord::new(column, row))
    }

    /// Cell reached by stepping once in the provided direction.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<CellCoord> {
        let (dx, dy) = direction.delta();
        self.offset(i64::from(dx), i64::from(dy))
    }

    /// Direction of a single cardinal step from `self` to `to`, if adjacent.
    #[must_use]
    pub fn direction_to(self, to: CellCoord) -> Option<Direction> {
        let column_diff = self.column.abs_diff(to.column);
        let row_diff = self.row.abs_diff(to.row);
        if column_diff + row_diff != 1 {
            return None;
        }

        if column_diff == 1 {
            if to.column > self.column {
                Some(Direction::East)
            } else {
                Some(Direction::West)
            }
        } else if to.row > self.row {
            Some(Direction::South)
        } else {
            Some(Direction::North)
        }
    }
}

/// Dense row-major grid of tiles with fixed dimensions.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

impl TileGrid {
    /// Creates a grid of the provided dimensions filled with `fill`.
    #[must_use]
    pub fn filled(width: u32, height: u32, fill: Tile) -> Self {
        let capacity_u64 = u64::from(width) * u64::from(height);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            width,
            height,
            tiles: vec![fill; capacity],
        }
    }

    /// Parses a grid from text rows where `#` is a wall, `.` floor, `o` an
    /// obstacle, `<` an entry portal, `>` an exit portal, `H` the home
    /// marker, `t` an inactive and `T` an active transport pad.
    ///
    /// Rows shorter than the first are padded with walls; unknown characters
    /// are read as walls.
    #[must_use]
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = u32::try_from(rows.len()).unwrap_or(0);
        let width = rows
            .first()
            .map_or(0, |row| u32::try_from(row.chars().count()).unwrap_or(0));
        let mut grid = Self::filled(width, height, Tile::Wall);
        for (row_index, row) in rows.iter().enumerate() {
            for (column_index, symbol) in row.chars().enumerate() {
                let (Ok(column), Ok(row)) = (u32::try_from(column_index), u32::try_from(row_index))
                else {
                    continue;
                };
                grid.set(CellCoord::new(column, row), tile_from_symbol(symbol));
            }
        }
        grid
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.width && cell.row() < self.height
    }

    /// Tile stored at the provided cell, if it lies within the grid.
    #[must_use]
    pub fn get(&self, cell: CellCoord) -> Option<Tile> {
        self.index(cell)
            .and_then(|index| self.tiles.get(index).copied())
    }

    /// Overwrites the tile at the provided cell; out-of-bounds writes are ignored.
    pub fn set(&mut self, cell: CellCoord, tile: Tile) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.tiles.get_mut(index) {
                *slot = tile;
            }
        }
    }

    /// Reports whether the cell exists and may be stood on.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        self.get(cell).is_some_and(Tile::is_walkable)
    }

    /// Dense tiles stored in row-major order.
    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Counts the tiles equal to `tile`.
    #[must_use]
    pub fn count(&self, tile: Tile) -> usize {
        self.tiles.iter().filter(|candidate| **candidate == tile).count()
    }

    /// Row-major wire encoding of the grid, one byte per tile.
    #[must_use]
    pub fn to_wire(&self) -> Vec<u8> {
        self.tiles.iter().map(|tile| tile.wire_value()).collect()
    }

    /// Renders the grid using the symbols accepted by [`TileGrid::from_rows`].
    #[must_use]
    pub fn render(&self) -> String {
        let width = usize::try_from(self.width).unwrap_or(0);
        if width == 0 {
            return String::new();
        }

        let mut out = String::with_capacity(self.tiles.len() + self.tiles.len() / width);
        for row in self.tiles.chunks(width) {
            out.extend(row.iter().map(|tile| symbol_for(*tile)));
            out.push('\n');
        }
        out
    }

    /// Walkable cardinal neighbours of `cell` in north, east, south, west order.
    pub fn walkable_neighbors(&self, cell: CellCoord) -> impl Iterator<Item = CellCoord> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |direction| cell.step(direction))
            .filter(move |neighbor| self.is_walkable(*neighbor))
    }

    /// Row-major index of the cell, if it lies within the grid.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.width).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

fn tile_from_symbol(symbol: char) -> Tile {
    match symbol {
        '.' => Tile::Floor,
        'o' => Tile::Obstacle,
        '<' => Tile::EntryPortal,
        '>' => Tile::ExitPortal,
        'H' => Tile::HomeMarker,
        't' => Tile::InactiveTransport,
        'T' => Tile::ActiveTransport,
        _ => Tile::Wall,
    }
}

fn symbol_for(tile: Tile) -> char {
    match tile {
        Tile::Wall => '#',
        Tile::Floor => '.',
        Tile::Obstacle => 'o',
        Tile::EntryPortal => '<',
        Tile::ExitPortal => '>',
        Tile::HomeMarker => 'H',
        Tile::InactiveTransport => 't',
        Tile::ActiveTransport => 'T',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
        assert_eq!(origin.chebyshev_distance(destination), 3);
    }

    #[test]
    fn wire_values_cover_every_tile() {
        for value in 0..8 {
            let tile = Tile::from_wire(value).expect("known wire value");
            assert_eq!(tile.wire_value(), value);
        }
        assert_eq!(Tile::from_wire(8), None);
    }

    #[test]
    fn only_walls_and_obstacles_block() {
        assert!(!Tile::Wall.is_walkable());
        assert!(!Tile::Obstacle.is_walkable());
        assert!(Tile::EntryPortal.is_walkable());
        assert!(Tile::InactiveTransport.is_walkable());
    }

    #[test]
    fn rows_round_trip_through_render() {
        let rows = ["#####", "#.o>#", "#H.t#", "#####"];
        let grid = TileGrid::from_rows(&rows);
        assert_eq!(grid.width(), 5);
        assert_eq!(grid.height(), 4);
        assert_eq!(grid.get(CellCoord::new(2, 1)), Some(Tile::Obstacle));
        assert_eq!(grid.render(), "#####\n#.o>#\n#H.t#\n#####\n");
    }

    #[test]
    fn offset_rejects_negative_coordinates() {
        let origin = CellCoord::new(0, 2);
        assert_eq!(origin.offset(-1, 0), None);
        assert_eq!(origin.offset(3, -2), Some(CellCoord::new(3, 0)));
        assert_eq!(origin.step(Direction::North), Some(CellCoord::new(0, 1)));
    }

    #[test]
    fn direction_between_neighbors() {
        let origin = CellCoord::new(3, 3);
        assert_eq!(origin.direction_to(CellCoord::new(3, 2)), Some(Direction::North));
        assert_eq!(origin.direction_to(CellCoord::new(4, 3)), Some(Direction::East));
        assert_eq!(origin.direction_to(CellCoord::new(3, 4)), Some(Direction::South));
        assert_eq!(origin.direction_to(CellCoord::new(2, 3)), Some(Direction::West));
        assert_eq!(origin.direction_to(origin), None);
    }

    #[test]
    fn walkable_neighbors_skip_blocked_and_out_of_bounds_cells() {
        let grid = TileGrid::from_rows(&[".#", ".."]);
        let neighbors: Vec<_> = grid.walkable_neighbors(CellCoord::new(0, 0)).collect();
        assert_eq!(neighbors, vec![CellCoord::new(0, 1)]);
    }
}
