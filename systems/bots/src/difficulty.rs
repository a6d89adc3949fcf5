//! Depth-keyed difficulty curve.

use std::time::Duration;

const BASE_HEALTH: u32 = 30;
const HEALTH_PER_DEPTH: u32 = 10;
const MAX_HEALTH: u32 = 150;

const BASE_COOLDOWN_MS: u64 = 400;
const COOLDOWN_STEP_MS: u64 = 25;
const MIN_COOLDOWN_MS: u64 = 150;

const BASE_BOT_CAP: usize = 5;
const BOT_CAP_PER_DEPTH: usize = 2;
const MAX_BOT_CAP: usize = 25;

const BASE_SPAWN_INTERVAL_MS: u64 = 3_000;
const SPAWN_INTERVAL_STEP_MS: u64 = 200;
const MIN_SPAWN_INTERVAL_MS: u64 = 1_000;

/// Bot parameters for one depth. Each one is capped independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Difficulty {
    /// Health a freshly spawned bot starts with.
    pub health: u32,
    /// Minimum time between two moves of the same bot.
    pub move_cooldown: Duration,
    /// Maximum number of live bots on one instance.
    pub max_bots: usize,
    /// Time between two spawns on an occupied instance.
    pub spawn_interval: Duration,
}

impl Difficulty {
    /// Difficulty at the provided depth.
    #[must_use]
    pub fn for_depth(depth: u32) -> Self {
        let depth_u64 = u64::from(depth);
        let depth_usize = usize::try_from(depth).unwrap_or(usize::MAX);

        let health = BASE_HEALTH
            .saturating_add(depth.saturating_mul(HEALTH_PER_DEPTH))
            .min(MAX_HEALTH);
        let cooldown = BASE_COOLDOWN_MS
            .saturating_sub(depth_u64.saturating_mul(COOLDOWN_STEP_MS))
            .max(MIN_COOLDOWN_MS);
        let max_bots = BASE_BOT_CAP
            .saturating_add(depth_usize.saturating_mul(BOT_CAP_PER_DEPTH))
            .min(MAX_BOT_CAP);
        let spawn_interval = BASE_SPAWN_INTERVAL_MS
            .saturating_sub(depth_u64.saturating_mul(SPAWN_INTERVAL_STEP_MS))
            .max(MIN_SPAWN_INTERVAL_MS);

        Self {
            health,
            move_cooldown: Duration::from_millis(cooldown),
            max_bots,
            spawn_interval: Duration::from_millis(spawn_interval),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_depth_uses_base_values() {
        let difficulty = Difficulty::for_depth(0);
        assert_eq!(difficulty.health, 30);
        assert_eq!(difficulty.move_cooldown, Duration::from_millis(400));
        assert_eq!(difficulty.max_bots, 5);
        assert_eq!(difficulty.spawn_interval, Duration::from_secs(3));
    }

    #[test]
    fn parameters_cap_independently() {
        let depth_ten = Difficulty::for_depth(10);
        assert_eq!(depth_ten.health, 130);
        assert_eq!(depth_ten.move_cooldown, Duration::from_millis(150));
        assert_eq!(depth_ten.max_bots, 25);
        assert_eq!(depth_ten.spawn_interval, Duration::from_millis(1_000));

        let deep = Difficulty::for_depth(1_000);
        assert_eq!(deep.health, 150);
        assert_eq!(deep.move_cooldown, Duration::from_millis(150));
    }
}
