//! Live entities shared between the room and the combat system.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{BulletId, CellCoord, PlayerId, Seed};

/// Identity of one live map: a depth paired with the seed generating it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MapKey {
    /// Depth along the portal chain.
    pub depth: u32,
    /// Seed the map is generated from.
    pub seed: Seed,
}

impl MapKey {
    /// Creates a new map key.
    #[must_use]
    pub const fn new(depth: u32, seed: Seed) -> Self {
        Self { depth, seed }
    }
}

/// Targeting behaviour of a bot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TacticalRole {
    /// Heads straight for the nearest player.
    Attack,
    /// Approaches from the side of the nearest player.
    Flank,
}

/// How a player's run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameOutcome {
    /// The player crossed the exit of the final depth.
    Victory,
    /// The player ran out of lives.
    Defeat,
}

/// Continuous position measured in tiles; `(0.5, 0.5)` is the center of cell `(0, 0)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal component.
    pub x: f32,
    /// Vertical component.
    pub y: f32,
}

impl Point {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Center of the provided cell.
    #[must_use]
    pub fn center_of(cell: CellCoord) -> Self {
        Self::new(cell.column() as f32 + 0.5, cell.row() as f32 + 0.5)
    }

    /// Cell containing the point, or `None` when a component is negative.
    #[must_use]
    pub fn cell(&self) -> Option<CellCoord> {
        if !(self.x >= 0.0 && self.y >= 0.0) || !self.x.is_finite() || !self.y.is_finite() {
            return None;
        }
        Some(CellCoord::new(self.x.floor() as u32, self.y.floor() as u32))
    }
}

/// Authoritative state of one connected player.
#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    /// Session identifier of the player.
    pub id: PlayerId,
    /// Tile the player stands on.
    pub cell: CellCoord,
    /// Tile the player stood on before the last step.
    pub previous_cell: CellCoord,
    /// Lives left; zero means the player is dead.
    pub lives: u32,
    /// Last aim angle reported by the client, in radians.
    pub aim_angle: f32,
    /// Accumulated score.
    pub score: f64,
    /// Simulated time at which the current invincibility window ends.
    pub invincible_until: Duration,
    /// Simulated time of the last accepted shot.
    pub last_shot_at: Option<Duration>,
    /// Depth the player is on.
    pub depth: u32,
    /// Seed of the map the player is on.
    pub seed: Seed,
    /// Set once the run has ended; finished players no longer act.
    pub finished: bool,
}

impl Player {
    /// Creates a player standing on `cell` of the provided map.
    #[must_use]
    pub fn new(id: PlayerId, cell: CellCoord, lives: u32, map: MapKey) -> Self {
        Self {
            id,
            cell,
            previous_cell: cell,
            lives,
            aim_angle: 0.0,
            score: 0.0,
            invincible_until: Duration::ZERO,
            last_shot_at: None,
            depth: map.depth,
            seed: map.seed,
            finished: false,
        }
    }

    /// Reports whether the player has lives left.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.lives > 0
    }

    /// Reports whether the player may still act.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.is_alive() && !self.finished
    }

    /// Reports whether an invincibility window covers `now`.
    #[must_use]
    pub fn is_invincible(&self, now: Duration) -> bool {
        now < self.invincible_until
    }

    /// Map instance the player currently belongs to.
    #[must_use]
    pub const fn map(&self) -> MapKey {
        MapKey::new(self.depth, self.seed)
    }

    /// Moves the player, remembering the tile they left.
    pub fn relocate(&mut self, cell: CellCoord) {
        self.previous_cell = self.cell;
        self.cell = cell;
    }

    /// Places the player without recording a step, e.g. after a map change.
    pub fn place(&mut self, cell: CellCoord) {
        self.previous_cell = cell;
        self.cell = cell;
    }
}

/// Projectile fired by a player.
#[derive(Clone, Debug, PartialEq)]
pub struct Bullet {
    /// Identifier of the bullet.
    pub id: BulletId,
    /// Player credited with any damage the bullet deals.
    pub owner: PlayerId,
    /// Current position in tiles.
    pub position: Point,
    /// Velocity in tiles per second.
    pub velocity: Point,
    /// Map instance the bullet travels on.
    pub map: MapKey,
    /// Simulated time the bullet was fired.
    pub fired_at: Duration,
}
