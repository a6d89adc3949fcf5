//! Spawn cadence and spawn location search.

use std::{f64::consts::TAU, time::Duration};

use delve_core::{CellCoord, SpawnZone, Tile, TileGrid};
use delve_system_pathfinding::euclidean_distance;
use rand::Rng;

const ZONE_ATTEMPTS: u32 = 20;
const MAP_ATTEMPTS: u32 = 200;

/// Accumulates simulated time and reports how many spawns fell due.
#[derive(Clone, Debug)]
pub(crate) struct SpawnClock {
    interval: Duration,
    accumulator: Duration,
}

impl SpawnClock {
    pub(crate) const fn new(interval: Duration) -> Self {
        Self {
            interval,
            accumulator: Duration::ZERO,
        }
    }

    pub(crate) fn advance(&mut self, dt: Duration) -> usize {
        if self.interval.is_zero() {
            return 0;
        }
        self.accumulator = self.accumulator.saturating_add(dt);

        let mut due = 0;
        while self.accumulator >= self.interval {
            self.accumulator -= self.interval;
            due += 1;
        }
        due
    }

    pub(crate) fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
    }
}

/// Everything the location search reads.
#[derive(Clone, Copy, Debug)]
pub struct SpawnArea<'a> {
    /// Grid of the instance.
    pub grid: &'a TileGrid,
    /// Spawn zones of the instance.
    pub zones: &'a [SpawnZone],
    /// Tiles of the living players on the instance.
    pub players: &'a [CellCoord],
    /// Reference point bots never spawn close to, normally the entry point.
    pub origin: CellCoord,
    /// Minimum straight-line distance from players and the origin.
    pub min_distance: f64,
}

impl SpawnArea<'_> {
    /// Reports whether a bot may appear on `cell`.
    #[must_use]
    pub fn accepts(&self, cell: CellCoord) -> bool {
        self.grid.get(cell) == Some(Tile::Floor)
            && euclidean_distance(cell, self.origin) >= self.min_distance
            && self
                .players
                .iter()
                .all(|player| euclidean_distance(cell, *player) >= self.min_distance)
    }
}

/// Round-robin zone rotation that never hands out the same zone twice in a
/// row while more than one zone exists.
#[derive(Clone, Debug, Default)]
pub(crate) struct ZoneCursor {
    last: Option<usize>,
}

impl ZoneCursor {
    pub(crate) fn next(&mut self, zone_count: usize) -> Option<usize> {
        if zone_count == 0 {
            return None;
        }
        let next = self.last.map_or(0, |last| (last + 1) % zone_count);
        self.last = Some(next);
        Some(next)
    }
}

/// Searches the primary zone, its neighbours, then the whole map.
pub(crate) fn find_location<R, F>(
    area: &SpawnArea<'_>,
    primary: Option<usize>,
    is_free: F,
    rng: &mut R,
) -> Option<CellCoord>
where
    R: Rng,
    F: Fn(CellCoord) -> bool,
{
    let accepts = |cell: CellCoord| area.accepts(cell) && is_free(cell);

    if let Some(primary) = primary {
        let count = area.zones.len();
        let mut order = vec![primary];
        if count > 1 {
            order.push((primary + 1) % count);
        }
        if count > 2 {
            order.push((primary + count - 1) % count);
        }

        for index in order {
            let Some(zone) = area.zones.get(index) else {
                continue;
            };
            if let Some(cell) = sample_zone(zone, &accepts, rng) {
                return Some(cell);
            }
        }
    }

    sample_map(area.grid, &accepts, rng)
}

fn sample_zone<R, F>(zone: &SpawnZone, accepts: &F, rng: &mut R) -> Option<CellCoord>
where
    R: Rng,
    F: Fn(CellCoord) -> bool,
{
    let radius = f64::from(zone.radius);
    for _ in 0..ZONE_ATTEMPTS {
        let angle = rng.gen::<f64>() * TAU;
        let distance = rng.gen::<f64>() * radius;
        let dx = (angle.cos() * distance).round() as i64;
        let dy = (angle.sin() * distance).round() as i64;
        if let Some(cell) = zone.center.offset(dx, dy).filter(|cell| accepts(*cell)) {
            return Some(cell);
        }
    }
    None
}

fn sample_map<R, F>(grid: &TileGrid, accepts: &F, rng: &mut R) -> Option<CellCoord>
where
    R: Rng,
    F: Fn(CellCoord) -> bool,
{
    if grid.width() == 0 || grid.height() == 0 {
        return None;
    }
    for _ in 0..MAP_ATTEMPTS {
        let cell = CellCoord::new(
            rng.gen_range(0..grid.width()),
            rng.gen_range(0..grid.height()),
        );
        if accepts(cell) {
            return Some(cell);
        }
    }
    None
}
