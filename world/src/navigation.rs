//! Per-player map history: permanent seed history plus a bounded cache of
//! departed maps.

use std::{collections::BTreeMap, num::NonZeroUsize};

use delve_core::{CellCoord, Seed};
use delve_system_bots::BotSnapshot;
use lru::LruCache;

/// One player's view of a map they left.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedMapState {
    /// Seed of the departed map.
    pub seed: Seed,
    /// Bots alive on the map at departure.
    pub bots: Vec<BotSnapshot>,
    /// Tile the player stood on before stepping onto the portal.
    pub last_position: CellCoord,
    /// Entry portal of the map; absent on the home map.
    pub entry_portal: Option<CellCoord>,
    /// Exit portal of the map.
    pub exit_portal: CellCoord,
}

/// Navigation record of one player.
///
/// The seed history remembers the seed of every depth the player has
/// reached, the home map included, and is never pruned. The map cache holds at most
/// `capacity` departed maps and drops the least recently touched one first.
#[derive(Debug)]
pub struct PlayerMapState {
    current_depth: u32,
    seed_history: BTreeMap<u32, Seed>,
    cache: LruCache<u32, CachedMapState>,
}

impl PlayerMapState {
    /// Creates the record of a player standing on the home map generated
    /// from `home_seed`.
    ///
    /// A zero capacity is raised to one.
    #[must_use]
    pub fn new(cache_capacity: usize, home_seed: Seed) -> Self {
        let capacity = NonZeroUsize::new(cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            current_depth: 0,
            seed_history: BTreeMap::from([(0, home_seed)]),
            cache: LruCache::new(capacity),
        }
    }

    /// Depth the player is on.
    #[must_use]
    pub const fn current_depth(&self) -> u32 {
        self.current_depth
    }

    /// Seeds of every depth reached so far, keyed by depth.
    #[must_use]
    pub fn seed_history(&self) -> &BTreeMap<u32, Seed> {
        &self.seed_history
    }

    /// Number of cached maps.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Maximum number of cached maps.
    #[must_use]
    pub fn cache_capacity(&self) -> usize {
        self.cache.cap().get()
    }

    /// Cached depths from most to least recently touched.
    #[must_use]
    pub fn cached_depths(&self) -> Vec<u32> {
        self.cache.iter().map(|(depth, _)| *depth).collect()
    }

    /// Cached view of `depth` without touching its recency.
    #[must_use]
    pub fn peek_cached(&self, depth: u32) -> Option<&CachedMapState> {
        self.cache.peek(&depth)
    }

    /// Seed for the next depth: the recorded one, or `derive()` remembered
    /// permanently on first visit.
    pub(crate) fn seed_for_descent(&mut self, depth: u32, derive: impl FnOnce() -> Seed) -> Seed {
        *self.seed_history.entry(depth).or_insert_with(derive)
    }

    /// Recorded seed for a shallower depth.
    pub(crate) fn seed_for_ascent(&self, depth: u32) -> Option<Seed> {
        self.seed_history.get(&depth).copied()
    }

    /// Caches the departed map, returning the depth evicted to make room.
    pub(crate) fn remember(&mut self, depth: u32, state: CachedMapState) -> Option<u32> {
        match self.cache.push(depth, state) {
            Some((evicted, _)) if evicted != depth => Some(evicted),
            _ => None,
        }
    }

    /// Cached view of `depth` generated from `seed`, marking it as touched.
    pub(crate) fn recall(&mut self, depth: u32, seed: Seed) -> Option<&CachedMapState> {
        self.cache.get(&depth).filter(|state| state.seed == seed)
    }

    pub(crate) fn set_current_depth(&mut self, depth: u32) {
        self.current_depth = depth;
    }
}
