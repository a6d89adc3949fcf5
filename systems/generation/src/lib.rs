#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic dungeon generator.
//!
//! [`generate`] is a pure function of `(width, height, seed, depth)`. Every
//! random draw comes from one [`Lcg`] seeded with the map seed, consumed in a
//! fixed order:
//!
//! 1. rooms: four draws per attempt (width, height, x, y);
//! 2. corridors: one draw per connection selecting the bend;
//! 3. obstacles: two draws per attempt (x, y);
//! 4. transport pads: two draws per attempt (x, y).
//!
//! Portals and spawn zones are derived without drawing. Another
//! implementation that follows the same order rebuilds a byte-identical grid.

use delve_core::{
    CellCoord, Direction, DungeonData, DungeonLayout, Lcg, Room, Seed, SpawnZone, Tile, TileGrid,
};
use delve_system_pathfinding::DistanceField;

/// Smallest width or height the generator works with; smaller requests are clamped.
pub const MIN_DIMENSION: u32 = 24;

const BASE_ROOM_COUNT: u32 = 8;
const MAX_ROOM_COUNT: u32 = 15;
const ROOM_ATTEMPTS: u32 = 100;
const ROOM_MIN_SIZE: u32 = 6;
const ROOM_MAX_SIZE: u32 = 14;
const ROOM_PADDING: u32 = 1;

const CORRIDOR_WIDTH: u32 = 4;

const EXIT_MIN_DISTANCE: u32 = 60;
const SPAWN_POINT_OFFSET: i64 = 2;

const OBSTACLE_BASE_PERCENT: u32 = 2;
const OBSTACLE_MAX_PERCENT: u32 = 8;
const OBSTACLE_ATTEMPT_FACTOR: usize = 10;
const OBSTACLE_SPACING: u32 = 2;
const PORTAL_CLEARANCE: u32 = 5;

const TRANSPORT_COUNT: usize = 3;
const TRANSPORT_ATTEMPTS: u32 = 200;
const TRANSPORT_PORTAL_CLEARANCE: u32 = 10;
const TRANSPORT_SPACING: u32 = 15;

const SPAWN_ZONE_RADIUS: u32 = 5;
const SPAWN_ZONE_FIRST_DISTANCE: u32 = 10;
const SPAWN_ZONE_DISTANCE_STEP: u32 = 5;
const SPAWN_ZONE_DIRECTIONS: [Direction; 4] = [
    Direction::North,
    Direction::South,
    Direction::East,
    Direction::West,
];

/// Maximum number of rooms attempted for a depth.
#[must_use]
pub fn room_target(depth: u32) -> u32 {
    BASE_ROOM_COUNT.saturating_add(depth).min(MAX_ROOM_COUNT)
}

/// Percentage of floor tiles turned into obstacles at a depth.
#[must_use]
pub fn obstacle_percent(depth: u32) -> u32 {
    OBSTACLE_BASE_PERCENT
        .saturating_add(depth)
        .min(OBSTACLE_MAX_PERCENT)
}

/// Generates the map for `(width, height, seed, depth)`.
///
/// Placement budgets that run out degrade to fewer rooms, obstacles, or pads;
/// the call never fails and never loops unbounded.
#[must_use]
pub fn generate(width: u32, height: u32, seed: Seed, depth: u32) -> DungeonData {
    let width = width.max(MIN_DIMENSION);
    let height = height.max(MIN_DIMENSION);
    let mut builder = Builder {
        rng: Lcg::new(seed),
        grid: TileGrid::filled(width, height, Tile::Wall),
        field: DistanceField::new(),
    };

    let rooms = builder.place_rooms(depth);
    builder.connect_rooms(&rooms);

    let entry_point = rooms
        .first()
        .map_or_else(|| CellCoord::new(width / 2, height / 2), Room::center);
    let entry_tile = if depth == 0 {
        Tile::HomeMarker
    } else {
        Tile::EntryPortal
    };
    builder.grid.set(entry_point, entry_tile);

    let exit_portal = select_exit(&rooms, entry_point);
    builder.grid.set(exit_portal, Tile::ExitPortal);

    let spawn_point = builder.spawn_point(entry_point);
    builder.scatter_obstacles(depth, entry_point, exit_portal);
    let transport_points = builder.place_transports(entry_point, exit_portal);
    let spawn_zones = derive_spawn_zones(&builder.grid, entry_point);

    DungeonData::new(DungeonLayout {
        grid: builder.grid,
        rooms,
        spawn_point,
        entry_point,
        exit_portal,
        transport_points,
        spawn_zones,
        depth,
        seed,
    })
}

struct Builder {
    rng: Lcg,
    grid: TileGrid,
    field: DistanceField,
}

impl Builder {
    fn place_rooms(&mut self, depth: u32) -> Vec<Room> {
        let target = usize::try_from(room_target(depth)).unwrap_or(usize::MAX);
        let width = self.grid.width();
        let height = self.grid.height();
        let mut rooms: Vec<Room> = Vec::with_capacity(target);

        for _ in 0..ROOM_ATTEMPTS {
            if rooms.len() >= target {
                break;
            }

            let room_width = self.rng.next_in_range(ROOM_MIN_SIZE, ROOM_MAX_SIZE);
            let room_height = self.rng.next_in_range(ROOM_MIN_SIZE, ROOM_MAX_SIZE);
            let x = self
                .rng
                .next_in_range(1, width.saturating_sub(room_width + 1));
            let y = self
                .rng
                .next_in_range(1, height.saturating_sub(room_height + 1));
            let candidate = Room::new(x, y, room_width, room_height);

            if rooms
                .iter()
                .any(|room| room.intersects_padded(&candidate, ROOM_PADDING))
            {
                continue;
            }

            self.carve_room(&candidate);
            rooms.push(candidate);
        }

        rooms
    }

    fn carve_room(&mut self, room: &Room) {
        for row in room.y..room.y + room.height {
            for column in room.x..room.x + room.width {
                self.carve(column, row);
            }
        }
    }

    fn connect_rooms(&mut self, rooms: &[Room]) {
        for pair in rooms.windows(2) {
            let from = pair[0].center();
            let to = pair[1].center();
            let horizontal_first = self.rng.next_below(2) == 0;

            if horizontal_first {
                self.carve_horizontal(from.column(), to.column(), from.row());
                self.carve_vertical(from.row(), to.row(), to.column());
            } else {
                self.carve_vertical(from.row(), to.row(), from.column());
                self.carve_horizontal(from.column(), to.column(), to.row());
            }
        }
    }

    fn carve_horizontal(&mut self, from_column: u32, to_column: u32, row: u32) {
        for column in from_column.min(to_column)..=from_column.max(to_column) {
            for lane in corridor_lanes(row) {
                self.carve(column, lane);
            }
        }
    }

    fn carve_vertical(&mut self, from_row: u32, to_row: u32, column: u32) {
        for row in from_row.min(to_row)..=from_row.max(to_row) {
            for lane in corridor_lanes(column) {
                self.carve(lane, row);
            }
        }
    }

    /// Opens a floor tile, leaving the one-tile border intact.
    fn carve(&mut self, column: u32, row: u32) {
        let inside = column >= 1
            && row >= 1
            && column + 1 < self.grid.width()
            && row + 1 < self.grid.height();
        if inside {
            self.grid.set(CellCoord::new(column, row), Tile::Floor);
        }
    }

    fn spawn_point(&self, entry_point: CellCoord) -> CellCoord {
        Direction::ALL
            .into_iter()
            .filter_map(|direction| {
                let (dx, dy) = direction.delta();
                entry_point.offset(
                    i64::from(dx) * SPAWN_POINT_OFFSET,
                    i64::from(dy) * SPAWN_POINT_OFFSET,
                )
            })
            .find(|cell| self.grid.get(*cell) == Some(Tile::Floor))
            .unwrap_or(entry_point)
    }

    fn scatter_obstacles(&mut self, depth: u32, entry_point: CellCoord, exit_portal: CellCoord) {
        let floor_tiles = self.grid.count(Tile::Floor);
        let percent = usize::try_from(obstacle_percent(depth)).unwrap_or(0);
        let target = floor_tiles * percent / 100;
        let attempts = target.saturating_mul(OBSTACLE_ATTEMPT_FACTOR);
        let mut placed: Vec<CellCoord> = Vec::with_capacity(target);

        for _ in 0..attempts {
            if placed.len() >= target {
                break;
            }

            let cell = self.random_cell();
            if self.grid.get(cell) != Some(Tile::Floor) {
                continue;
            }
            if within_radius(cell, entry_point, PORTAL_CLEARANCE)
                || within_radius(cell, exit_portal, PORTAL_CLEARANCE)
            {
                continue;
            }
            if placed
                .iter()
                .any(|other| other.chebyshev_distance(cell) < OBSTACLE_SPACING)
            {
                continue;
            }

            self.grid.set(cell, Tile::Obstacle);
            self.field.rebuild(&self.grid, &[entry_point]);
            if self.field.is_reachable(exit_portal) {
                placed.push(cell);
            } else {
                self.grid.set(cell, Tile::Floor);
            }
        }
    }

    fn place_transports(&mut self, entry_point: CellCoord, exit_portal: CellCoord) -> Vec<CellCoord> {
        self.field.rebuild(&self.grid, &[entry_point]);
        let mut pads: Vec<CellCoord> = Vec::with_capacity(TRANSPORT_COUNT);

        for _ in 0..TRANSPORT_ATTEMPTS {
            if pads.len() >= TRANSPORT_COUNT {
                break;
            }

            let cell = self.random_cell();
            if self.grid.get(cell) != Some(Tile::Floor) || !self.field.is_reachable(cell) {
                continue;
            }
            if !at_least(cell, entry_point, TRANSPORT_PORTAL_CLEARANCE)
                || !at_least(cell, exit_portal, TRANSPORT_PORTAL_CLEARANCE)
            {
                continue;
            }
            if pads
                .iter()
                .any(|other| !at_least(cell, *other, TRANSPORT_SPACING))
            {
                continue;
            }

            self.grid.set(cell, Tile::InactiveTransport);
            pads.push(cell);
        }

        pads
    }

    fn random_cell(&mut self) -> CellCoord {
        let column = self.rng.next_below(self.grid.width());
        let row = self.rng.next_below(self.grid.height());
        CellCoord::new(column, row)
    }
}

fn corridor_lanes(center: u32) -> impl Iterator<Item = u32> {
    let first = center.saturating_sub(CORRIDOR_WIDTH / 2 - 1);
    first..first + CORRIDOR_WIDTH
}

/// Exit room: the last-generated room beyond the distance threshold, else the
/// farthest room. A lone room gets its exit in the far corner.
fn select_exit(rooms: &[Room], entry_point: CellCoord) -> CellCoord {
    let beyond_threshold = rooms
        .iter()
        .skip(1)
        .rev()
        .find(|room| room.center().manhattan_distance(entry_point) > EXIT_MIN_DISTANCE);
    if let Some(room) = beyond_threshold {
        return room.center();
    }

    let farthest = rooms.iter().skip(1).fold(None::<&Room>, |best, room| {
        let distance = room.center().manhattan_distance(entry_point);
        match best {
            Some(current) if current.center().manhattan_distance(entry_point) >= distance => {
                Some(current)
            }
            _ => Some(room),
        }
    });

    match (farthest, rooms.first()) {
        (Some(room), _) => room.center(),
        (None, Some(room)) => CellCoord::new(room.x + room.width - 2, room.y + room.height - 2),
        (None, None) => entry_point,
    }
}

fn squared_distance(a: CellCoord, b: CellCoord) -> u64 {
    let dx = u64::from(a.column().abs_diff(b.column()));
    let dy = u64::from(a.row().abs_diff(b.row()));
    dx * dx + dy * dy
}

/// Inclusive disc test: `|a - b| <= radius`.
fn within_radius(a: CellCoord, b: CellCoord, radius: u32) -> bool {
    squared_distance(a, b) <= u64::from(radius) * u64::from(radius)
}

/// `|a - b| >= minimum`.
fn at_least(a: CellCoord, b: CellCoord, minimum: u32) -> bool {
    squared_distance(a, b) >= u64::from(minimum) * u64::from(minimum)
}

fn derive_spawn_zones(grid: &TileGrid, entry_point: CellCoord) -> Vec<SpawnZone> {
    let reach = grid.width().max(grid.height());
    let mut zones = Vec::with_capacity(SPAWN_ZONE_DIRECTIONS.len());

    for direction in SPAWN_ZONE_DIRECTIONS {
        let (dx, dy) = direction.delta();
        let mut best: Option<(usize, CellCoord)> = None;
        let mut distance = SPAWN_ZONE_FIRST_DISTANCE;

        while distance <= reach {
            let Some(center) = entry_point
                .offset(i64::from(dx) * i64::from(distance), i64::from(dy) * i64::from(distance))
                .filter(|cell| grid.contains(*cell))
            else {
                break;
            };

            let density = walkable_density(grid, center, SPAWN_ZONE_RADIUS);
            if density > best.map_or(0, |(count, _)| count) {
                best = Some((density, center));
            }
            distance += SPAWN_ZONE_DISTANCE_STEP;
        }

        if let Some((_, center)) = best {
            zones.push(SpawnZone {
                center,
                radius: SPAWN_ZONE_RADIUS,
                direction,
            });
        }
    }

    zones
}

fn walkable_density(grid: &TileGrid, center: CellCoord, radius: u32) -> usize {
    let radius = i64::from(radius);
    let mut count = 0;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            if center
                .offset(dx, dy)
                .is_some_and(|cell| grid.is_walkable(cell))
            {
                count += 1;
            }
        }
    }
    count
}
