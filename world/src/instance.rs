use std::{collections::BTreeSet, time::Duration};

use delve_core::{CellCoord, Direction, DungeonData, MapKey, PlayerId, Tile};
use delve_system_bots::BotManager;
use delve_system_generation::generate;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// One live `(depth, seed)` simulation.
///
/// The instance owns its dungeon and bot manager; dropping it drops both.
#[derive(Debug)]
pub(crate) struct ActiveMapInstance {
    pub(crate) dungeon: DungeonData,
    pub(crate) bots: BotManager,
    pub(crate) present: BTreeSet<PlayerId>,
    pub(crate) empty_since: Option<Duration>,
    pub(crate) rng: ChaCha8Rng,
}

impl ActiveMapInstance {
    pub(crate) fn generate(key: MapKey, width: u32, height: u32) -> Self {
        let dungeon = generate(width, height, key.seed, key.depth);
        let grid = dungeon.grid();
        let bots = BotManager::new(grid.width(), grid.height(), key.depth);
        Self {
            dungeon,
            bots,
            present: BTreeSet::new(),
            empty_since: None,
            rng: ChaCha8Rng::seed_from_u64(instance_rng_seed(key)),
        }
    }

    pub(crate) fn enter(&mut self, player: PlayerId) {
        let _ = self.present.insert(player);
        self.empty_since = None;
    }

    pub(crate) fn leave(&mut self, player: PlayerId, now: Duration) {
        let _ = self.present.remove(&player);
        if self.present.is_empty() && self.empty_since.is_none() {
            self.empty_since = Some(now);
        }
    }

    pub(crate) fn is_idle(&self, now: Duration, timeout: Duration) -> bool {
        self.present.is_empty()
            && self
                .empty_since
                .is_some_and(|since| now.saturating_sub(since) >= timeout)
    }

    /// Walkable non-portal tile beside the exit, used when climbing back up.
    pub(crate) fn beside_exit(&self) -> CellCoord {
        let exit = self.dungeon.exit_portal();
        Direction::ALL
            .into_iter()
            .filter_map(|direction| exit.step(direction))
            .find(|cell| self.is_arrival_tile(*cell))
            .unwrap_or_else(|| self.dungeon.spawn_point())
    }

    /// Tiles a player may be placed on after a map change.
    pub(crate) fn is_arrival_tile(&self, cell: CellCoord) -> bool {
        matches!(
            self.dungeon.grid().get(cell),
            Some(Tile::Floor | Tile::HomeMarker)
        )
    }
}

fn instance_rng_seed(key: MapKey) -> u64 {
    (u64::from(key.seed.get()) << 32) | u64::from(key.depth)
}
