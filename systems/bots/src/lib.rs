#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Enemy bot manager: spawning, tactical movement, path caching, occupancy.
//!
//! A [`BotManager`] belongs to exactly one map instance. It never owns the
//! grid; callers pass the instance grid into every operation so the manager
//! can be dropped together with the instance.

mod bot;
mod difficulty;
mod occupancy;
mod spawn;
pub mod tactics;

use std::{collections::VecDeque, time::Duration};

use delve_core::{BotId, CellCoord, TacticalRole, TileGrid};
use delve_system_pathfinding::PathFinder;
use rand::Rng;
use tracing::debug;

pub use bot::{Bot, BotSnapshot};
pub use difficulty::Difficulty;
pub use spawn::SpawnArea;
pub use tactics::PlayerTarget;

use occupancy::OccupancyGrid;
use spawn::{SpawnClock, ZoneCursor};
use tactics::{PathState, Step};

/// Every n-th spawned bot flanks.
const FLANK_EVERY: u32 = 4;

/// Live bots of one map instance together with their caches.
#[derive(Debug)]
pub struct BotManager {
    difficulty: Difficulty,
    bots: Vec<Bot>,
    occupancy: OccupancyGrid,
    finder: PathFinder,
    path_queue: VecDeque<PathRequest>,
    spawn_clock: SpawnClock,
    zones: ZoneCursor,
    next_spawn_index: u32,
}

#[derive(Clone, Copy, Debug)]
struct PathRequest {
    bot_id: BotId,
    goal: CellCoord,
    player_cell: CellCoord,
}

impl BotManager {
    /// Creates an empty manager for a grid of the provided size at `depth`.
    #[must_use]
    pub fn new(width: u32, height: u32, depth: u32) -> Self {
        let difficulty = Difficulty::for_depth(depth);
        Self {
            difficulty,
            bots: Vec::new(),
            occupancy: OccupancyGrid::new(width, height),
            finder: PathFinder::new(),
            path_queue: VecDeque::new(),
            spawn_clock: SpawnClock::new(difficulty.spawn_interval),
            zones: ZoneCursor::default(),
            next_spawn_index: 0,
        }
    }

    /// Difficulty parameters of the instance.
    #[must_use]
    pub const fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Live bots in spawn order.
    #[must_use]
    pub fn bots(&self) -> &[Bot] {
        &self.bots
    }

    /// Number of live bots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bots.len()
    }

    /// Reports whether no bot is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bots.is_empty()
    }

    /// Looks up a bot.
    #[must_use]
    pub fn bot(&self, bot_id: BotId) -> Option<&Bot> {
        self.bots.iter().find(|bot| bot.id == bot_id)
    }

    /// Mutable access for damage bookkeeping; positions stay manager-owned.
    pub fn bot_mut(&mut self, bot_id: BotId) -> Option<&mut Bot> {
        self.bots.iter_mut().find(|bot| bot.id == bot_id)
    }

    /// Bot standing on `cell`, if any.
    #[must_use]
    pub fn occupant(&self, cell: CellCoord) -> Option<BotId> {
        self.occupancy.occupant(cell)
    }

    /// Path requests waiting for the next drain.
    #[must_use]
    pub fn pending_paths(&self) -> usize {
        self.path_queue.len()
    }

    /// Reports whether another bot may be spawned.
    #[must_use]
    pub fn has_capacity(&self) -> bool {
        self.bots.len() < self.difficulty.max_bots
    }

    /// Advances the spawn cadence and returns how many spawns fell due.
    pub fn spawns_due(&mut self, dt: Duration) -> usize {
        self.spawn_clock.advance(dt)
    }

    /// Places a fresh bot with full health on `cell`.
    ///
    /// The role follows the spawn index: every fourth bot flanks. Fails when
    /// the tile is blocked or already occupied.
    pub fn insert(&mut self, grid: &TileGrid, bot_id: BotId, cell: CellCoord) -> bool {
        if !grid.is_walkable(cell) || self.occupancy.occupant(cell).is_some() {
            return false;
        }
        let spawn_index = self.next_spawn_index;
        self.next_spawn_index = self.next_spawn_index.saturating_add(1);
        let role = role_for(spawn_index);
        let health = self.difficulty.health;
        self.place(Bot::new(bot_id, cell, health, health, role, spawn_index));
        true
    }

    /// Spawns a bot inside the next spawn zone, falling back to the
    /// neighbouring zones and then the whole map.
    ///
    /// Returns the chosen tile, or `None` when the instance is full or no
    /// acceptable tile was found.
    pub fn spawn<R: Rng>(
        &mut self,
        area: &SpawnArea<'_>,
        bot_id: BotId,
        rng: &mut R,
    ) -> Option<CellCoord> {
        if !self.has_capacity() {
            return None;
        }
        let primary = self.zones.next(area.zones.len());
        let occupancy = &self.occupancy;
        let cell = spawn::find_location(
            area,
            primary,
            |cell| occupancy.occupant(cell).is_none(),
            rng,
        )?;
        if self.insert(area.grid, bot_id, cell) {
            Some(cell)
        } else {
            None
        }
    }

    /// Restores a cached bot under a fresh identifier.
    ///
    /// Fails when the cached tile is no longer free.
    pub fn restore(&mut self, grid: &TileGrid, bot_id: BotId, snapshot: &BotSnapshot) -> bool {
        if snapshot.health == 0
            || !grid.is_walkable(snapshot.cell)
            || self.occupancy.occupant(snapshot.cell).is_some()
        {
            return false;
        }
        let mut bot = Bot::new(
            bot_id,
            snapshot.cell,
            snapshot.health,
            snapshot.max_health,
            snapshot.role,
            snapshot.spawn_index,
        );
        bot.goal = snapshot.target;
        self.next_spawn_index = self
            .next_spawn_index
            .max(snapshot.spawn_index.saturating_add(1));
        self.place(bot);
        true
    }

    fn place(&mut self, bot: Bot) {
        self.occupancy.occupy(bot.id, bot.cell);
        self.bots.push(bot);
    }

    /// Removes a bot and frees its tile.
    pub fn remove(&mut self, bot_id: BotId) -> Option<Bot> {
        let index = self.bots.iter().position(|bot| bot.id == bot_id)?;
        let bot = self.bots.remove(index);
        self.occupancy.vacate(bot.cell);
        self.path_queue.retain(|request| request.bot_id != bot_id);
        Some(bot)
    }

    /// Moves a bot outside its turn, e.g. when knocked back.
    ///
    /// Fails when the tile is blocked or held by another bot. The cached path
    /// is dropped because it no longer starts next to the bot.
    pub fn relocate(&mut self, grid: &TileGrid, bot_id: BotId, cell: CellCoord) -> bool {
        if !grid.is_walkable(cell) {
            return false;
        }
        if self
            .occupancy
            .occupant(cell)
            .is_some_and(|occupant| occupant != bot_id)
        {
            return false;
        }
        let Some(bot) = self.bots.iter_mut().find(|bot| bot.id == bot_id) else {
            return false;
        };
        self.occupancy.vacate(bot.cell);
        bot.cell = cell;
        bot.forget_path();
        self.occupancy.occupy(bot_id, cell);
        true
    }

    /// Drops every bot and pending request.
    pub fn clear(&mut self) {
        self.bots.clear();
        self.occupancy.clear();
        self.path_queue.clear();
        self.spawn_clock.reset();
    }

    /// Cache view of every live bot.
    #[must_use]
    pub fn snapshot(&self) -> Vec<BotSnapshot> {
        self.bots.iter().map(Bot::snapshot).collect()
    }

    /// Runs one bot turn for the instance.
    ///
    /// Planning queues path requests, at most `path_budget` queued requests
    /// are solved, then every bot whose move cooldown elapsed takes a step.
    pub fn tick(
        &mut self,
        grid: &TileGrid,
        players: &[PlayerTarget],
        now: Duration,
        path_budget: usize,
    ) {
        if players.is_empty() {
            return;
        }
        self.plan(grid, players, now);
        self.drain_paths(grid, now, path_budget);
        self.advance(grid, now);
    }

    fn plan(&mut self, grid: &TileGrid, players: &[PlayerTarget], now: Duration) {
        for bot in &mut self.bots {
            let Some(player) = tactics::nearest_player(bot.cell, players) else {
                continue;
            };
            let goal = tactics::target_for(bot.role, grid, bot.cell, player.cell);
            bot.goal = Some(goal);

            if bot.path_queued {
                continue;
            }
            let state = PathState {
                remaining_steps: bot.path.len(),
                computed_at: bot.path_computed_at,
                tracked_player_cell: bot.tracked_player_cell,
                stuck_turns: bot.stuck_turns,
            };
            let Some(reason) = tactics::repath_reason(&state, now, player.cell) else {
                continue;
            };
            if reason == tactics::RepathReason::Stuck {
                bot.stuck_turns = 0;
            }
            bot.path_queued = true;
            self.path_queue.push_back(PathRequest {
                bot_id: bot.id,
                goal,
                player_cell: player.cell,
            });
        }
    }

    fn drain_paths(&mut self, grid: &TileGrid, now: Duration, budget: usize) {
        if self.path_queue.len() > budget {
            debug!(
                pending = self.path_queue.len(),
                budget, "path requests deferred to later ticks"
            );
        }

        for _ in 0..budget {
            let Some(request) = self.path_queue.pop_front() else {
                break;
            };
            let Some(bot) = self.bots.iter_mut().find(|bot| bot.id == request.bot_id) else {
                continue;
            };
            let mut path: VecDeque<CellCoord> =
                self.finder.find_path(grid, bot.cell, request.goal).into();
            let _ = path.pop_front();
            bot.path = path;
            bot.path_computed_at = Some(now);
            bot.tracked_player_cell = Some(request.player_cell);
            bot.path_queued = false;
            bot.interpolation_target = bot.path.front().copied().unwrap_or(bot.cell);
        }
    }

    fn advance(&mut self, grid: &TileGrid, now: Duration) {
        let cooldown = self.difficulty.move_cooldown;
        for bot in &mut self.bots {
            let ready = bot
                .last_move_at
                .map_or(true, |at| now.saturating_sub(at) >= cooldown);
            if !ready {
                continue;
            }
            let Some(goal) = bot.goal else {
                continue;
            };
            bot.last_move_at = Some(now);

            let step = tactics::choose_step(grid, bot.cell, goal, &bot.path);
            let destination = step
                .cell()
                .filter(|cell| self.occupancy.occupant(*cell).is_none());
            let Some(destination) = destination else {
                if bot.cell != goal {
                    bot.stuck_turns = bot.stuck_turns.saturating_add(1);
                }
                if step == Step::Idle {
                    bot.path.clear();
                }
                continue;
            };

            self.occupancy.vacate(bot.cell);
            bot.cell = destination;
            self.occupancy.occupy(bot.id, destination);
            bot.stuck_turns = 0;
            tactics::trim_path(&mut bot.path, destination);
            bot.interpolation_target = bot.path.front().copied().unwrap_or(destination);
        }
    }
}

/// Tactical role for the bot at `spawn_index`.
#[must_use]
pub const fn role_for(spawn_index: u32) -> TacticalRole {
    if spawn_index.wrapping_add(1) % FLANK_EVERY == 0 {
        TacticalRole::Flank
    } else {
        TacticalRole::Attack
    }
}
