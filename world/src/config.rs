//! Room-scoped tunables.

use std::time::Duration;

use delve_core::Seed;
use serde::{Deserialize, Serialize};

/// Settings of one game room. Missing fields take their defaults.
///
/// Map generation constants are not part of the configuration; only the
/// map size and the base seed travel to clients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Width of every generated map, in tiles.
    pub map_width: u32,
    /// Height of every generated map, in tiles.
    pub map_height: u32,
    /// Seed of the home map at depth 0.
    pub base_seed: u32,
    /// Interval at which the transport layer is expected to send ticks.
    pub tick_interval_ms: u64,
    /// Maximum number of departed maps cached per player.
    pub cache_capacity: usize,
    /// Time an empty instance survives before it is torn down.
    pub idle_timeout_ms: u64,
    /// Depth whose exit portal completes the run.
    pub final_depth: u32,
    /// Lives a player joins with.
    pub lives: u32,
    /// Invincibility window after a hit.
    pub invincibility_ms: u64,
    /// Bullet speed in tiles per second.
    pub bullet_speed: f32,
    /// Time after which a bullet despawns.
    pub bullet_lifetime_ms: u64,
    /// Health a bullet removes from a bot.
    pub bullet_damage: u32,
    /// Minimum time between two shots of one player.
    pub fire_cooldown_ms: u64,
    /// Score awarded for one whole kill credit.
    pub kill_score: f64,
    /// Path requests solved per instance and tick.
    pub path_requests_per_tick: usize,
    /// Minimum straight-line distance between a new bot and any player.
    pub min_spawn_distance: f64,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            map_width: 120,
            map_height: 120,
            base_seed: 42,
            tick_interval_ms: 33,
            cache_capacity: 5,
            idle_timeout_ms: 30_000,
            final_depth: 10,
            lives: 3,
            invincibility_ms: 2_000,
            bullet_speed: 20.0,
            bullet_lifetime_ms: 2_000,
            bullet_damage: 10,
            fire_cooldown_ms: 200,
            kill_score: 100.0,
            path_requests_per_tick: 3,
            min_spawn_distance: 12.0,
        }
    }
}

impl RoomConfig {
    /// Seed of the home map.
    #[must_use]
    pub const fn base_seed(&self) -> Seed {
        Seed::new(self.base_seed)
    }

    /// Tick interval as a duration.
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Idle teardown timeout as a duration.
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    /// Invincibility window as a duration.
    #[must_use]
    pub const fn invincibility(&self) -> Duration {
        Duration::from_millis(self.invincibility_ms)
    }

    /// Bullet lifetime as a duration.
    #[must_use]
    pub const fn bullet_lifetime(&self) -> Duration {
        Duration::from_millis(self.bullet_lifetime_ms)
    }

    /// Fire cooldown as a duration.
    #[must_use]
    pub const fn fire_cooldown(&self) -> Duration {
        Duration::from_millis(self.fire_cooldown_ms)
    }
}
