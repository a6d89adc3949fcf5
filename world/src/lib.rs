#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative room state for Delve.
//!
//! A [`GameRoom`] owns every player, every active map instance, the live
//! bullets, and each player's navigation record. Commands enter through
//! [`apply`]; read-only views leave through [`query`]. Nothing is shared
//! between rooms, so tearing a room down is dropping the value.

mod config;
mod error;
mod instance;
mod navigation;

use std::{collections::BTreeMap, time::Duration};

use delve_core::{
    BotId, Bullet, BulletId, CellCoord, Command, Direction, Event, GameOutcome, MapKey, Player,
    PlayerId, TacticalRole, Tile,
};
use delve_system_bots::{Bot, PlayerTarget, SpawnArea};
use delve_system_combat::{self as combat, CombatRules};
use tracing::{debug, error, info, warn};

pub use config::RoomConfig;
pub use error::RoomError;
pub use navigation::{CachedMapState, PlayerMapState};

use instance::ActiveMapInstance;

/// Authoritative state of one game room.
#[derive(Debug)]
pub struct GameRoom {
    config: RoomConfig,
    clock: Duration,
    players: BTreeMap<PlayerId, Player>,
    map_states: BTreeMap<PlayerId, PlayerMapState>,
    instances: BTreeMap<MapKey, ActiveMapInstance>,
    bullets: Vec<Bullet>,
    next_bot_id: u32,
    next_bullet_id: u32,
}

impl GameRoom {
    /// Creates an empty room.
    #[must_use]
    pub fn new(config: RoomConfig) -> Self {
        Self {
            config,
            clock: Duration::ZERO,
            players: BTreeMap::new(),
            map_states: BTreeMap::new(),
            instances: BTreeMap::new(),
            bullets: Vec::new(),
            next_bot_id: 0,
            next_bullet_id: 0,
        }
    }

    fn combat_rules(&self) -> CombatRules {
        CombatRules {
            bullet_damage: self.config.bullet_damage,
            bullet_lifetime: self.config.bullet_lifetime(),
            invincibility: self.config.invincibility(),
        }
    }
}

impl Default for GameRoom {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Arrival {
    Descent,
    Ascent,
}

/// Applies the provided command to the room and appends the resulting events.
///
/// A rejected command leaves the room untouched. Blocked moves and shots
/// inside the fire cooldown are not errors; they simply have no effect.
pub fn apply(
    room: &mut GameRoom,
    command: Command,
    out_events: &mut Vec<Event>,
) -> Result<(), RoomError> {
    let result = match command {
        Command::AddPlayer { player } => add_player(room, player, out_events),
        Command::RemovePlayer { player } => remove_player(room, player),
        Command::Move { player, direction } => move_player(room, player, direction, out_events),
        Command::UpdateAngle { player, angle } => update_angle(room, player, angle),
        Command::Shoot { player, angle } => shoot(room, player, angle),
        Command::Tick { dt } => {
            tick(room, dt, out_events);
            Ok(())
        }
    };

    if let Err(err) = &result {
        if !matches!(err, RoomError::MissingSeed { .. }) {
            warn!(%err, "command rejected");
        }
    }
    result
}

fn next_id(counter: &mut u32) -> u32 {
    let id = *counter;
    *counter = counter.wrapping_add(1);
    id
}

fn active_player(
    players: &BTreeMap<PlayerId, Player>,
    player_id: PlayerId,
) -> Result<&Player, RoomError> {
    let player = players
        .get(&player_id)
        .ok_or(RoomError::UnknownPlayer(player_id))?;
    if player.is_active() {
        Ok(player)
    } else {
        Err(RoomError::PlayerInactive(player_id))
    }
}

fn active_player_mut(
    players: &mut BTreeMap<PlayerId, Player>,
    player_id: PlayerId,
) -> Result<&mut Player, RoomError> {
    let player = players
        .get_mut(&player_id)
        .ok_or(RoomError::UnknownPlayer(player_id))?;
    if player.is_active() {
        Ok(player)
    } else {
        Err(RoomError::PlayerInactive(player_id))
    }
}

/// Returns the live instance for `key`, generating it on first use.
///
/// A fresh instance is seeded with the cached bots when a snapshot is given;
/// restored bots receive new identifiers.
fn ensure_instance<'a>(
    room: &'a mut GameRoom,
    key: MapKey,
    cached: Option<&CachedMapState>,
) -> &'a mut ActiveMapInstance {
    let width = room.config.map_width;
    let height = room.config.map_height;
    let next_bot_id = &mut room.next_bot_id;
    room.instances
        .entry(key)
        .or_insert_with(|| build_instance(key, width, height, cached, next_bot_id))
}

fn build_instance(
    key: MapKey,
    width: u32,
    height: u32,
    cached: Option<&CachedMapState>,
    next_bot_id: &mut u32,
) -> ActiveMapInstance {
    let mut instance = ActiveMapInstance::generate(key, width, height);
    let Some(cached) = cached else {
        debug!(depth = key.depth, seed = key.seed.get(), "map instance created");
        return instance;
    };

    let mut restored = 0;
    for snapshot in &cached.bots {
        let bot_id = BotId::new(next_id(next_bot_id));
        if instance
            .bots
            .restore(instance.dungeon.grid(), bot_id, snapshot)
        {
            restored += 1;
        }
    }
    debug!(
        depth = key.depth,
        seed = key.seed.get(),
        restored,
        "map instance restored from cache"
    );
    instance
}

fn add_player(
    room: &mut GameRoom,
    player_id: PlayerId,
    out_events: &mut Vec<Event>,
) -> Result<(), RoomError> {
    if room.players.contains_key(&player_id) {
        return Err(RoomError::DuplicatePlayer(player_id));
    }

    let key = MapKey::new(0, room.config.base_seed());
    let lives = room.config.lives;
    let capacity = room.config.cache_capacity;

    let instance = ensure_instance(room, key, None);
    instance.enter(player_id);
    let position = instance.dungeon.spawn_point();
    let entry_portal = instance.dungeon.entry_portal();
    let exit_portal = instance.dungeon.exit_portal();

    let _ = room
        .players
        .insert(player_id, Player::new(player_id, position, lives, key));
    let _ = room
        .map_states
        .insert(player_id, PlayerMapState::new(capacity, key.seed));

    info!(
        player = player_id.get(),
        depth = key.depth,
        seed = key.seed.get(),
        "player joined"
    );
    out_events.push(Event::MapChanged {
        player: player_id,
        new_depth: key.depth,
        new_seed: key.seed,
        entry_portal,
        exit_portal,
        position,
    });
    Ok(())
}

fn remove_player(room: &mut GameRoom, player_id: PlayerId) -> Result<(), RoomError> {
    let player = room
        .players
        .remove(&player_id)
        .ok_or(RoomError::UnknownPlayer(player_id))?;
    let _ = room.map_states.remove(&player_id);
    if let Some(instance) = room.instances.get_mut(&player.map()) {
        instance.leave(player_id, room.clock);
    }
    room.bullets.retain(|bullet| bullet.owner != player_id);

    info!(player = player_id.get(), depth = player.depth, "player left");
    Ok(())
}

fn update_angle(room: &mut GameRoom, player_id: PlayerId, angle: f32) -> Result<(), RoomError> {
    let player = room
        .players
        .get_mut(&player_id)
        .ok_or(RoomError::UnknownPlayer(player_id))?;
    player.aim_angle = angle;
    Ok(())
}

fn shoot(room: &mut GameRoom, player_id: PlayerId, angle: f32) -> Result<(), RoomError> {
    let now = room.clock;
    let cooldown = room.config.fire_cooldown();
    let speed = room.config.bullet_speed;

    let player = active_player_mut(&mut room.players, player_id)?;
    player.aim_angle = angle;
    if player
        .last_shot_at
        .is_some_and(|at| now.saturating_sub(at) < cooldown)
    {
        return Ok(());
    }
    player.last_shot_at = Some(now);

    let bullet_id = BulletId::new(next_id(&mut room.next_bullet_id));
    let bullet = combat::fire(player, bullet_id, angle, speed, now);
    room.bullets.push(bullet);
    Ok(())
}

fn move_player(
    room: &mut GameRoom,
    player_id: PlayerId,
    direction: Direction,
    out_events: &mut Vec<Event>,
) -> Result<(), RoomError> {
    let player = active_player(&room.players, player_id)?;
    let key = player.map();
    let Some(target) = player.cell.step(direction) else {
        return Ok(());
    };
    let Some(tile) = room
        .instances
        .get(&key)
        .and_then(|instance| instance.dungeon.grid().get(target))
    else {
        return Ok(());
    };
    if !tile.is_walkable() {
        return Ok(());
    }

    match tile {
        Tile::ExitPortal => {
            relocate(room, player_id, target);
            descend(room, player_id, key, out_events)
        }
        Tile::EntryPortal if key.depth > 0 => ascend(room, player_id, key, target, out_events),
        Tile::InactiveTransport => {
            relocate(room, player_id, target);
            let activated = room
                .instances
                .get_mut(&key)
                .is_some_and(|instance| instance.dungeon.activate_transport(target));
            if activated {
                debug!(depth = key.depth, seed = key.seed.get(), "transport pad activated");
                out_events.push(Event::TransportActivated {
                    map: key,
                    cell: target,
                });
            }
            Ok(())
        }
        Tile::ActiveTransport => {
            relocate(room, player_id, target);
            let destination = room
                .instances
                .get(&key)
                .and_then(|instance| instance.dungeon.next_active_transport(target));
            if let (Some(destination), Some(player)) =
                (destination, room.players.get_mut(&player_id))
            {
                player.place(destination);
                out_events.push(Event::PlayerTeleported {
                    player: player_id,
                    from: target,
                    to: destination,
                });
            }
            Ok(())
        }
        _ => {
            relocate(room, player_id, target);
            Ok(())
        }
    }
}

fn relocate(room: &mut GameRoom, player_id: PlayerId, cell: CellCoord) {
    if let Some(player) = room.players.get_mut(&player_id) {
        player.relocate(cell);
    }
}

fn descend(
    room: &mut GameRoom,
    player_id: PlayerId,
    from: MapKey,
    out_events: &mut Vec<Event>,
) -> Result<(), RoomError> {
    if from.depth >= room.config.final_depth {
        complete(room, player_id, GameOutcome::Victory, out_events);
        return Ok(());
    }

    let depth = from.depth + 1;
    let state = room
        .map_states
        .get_mut(&player_id)
        .ok_or(RoomError::UnknownPlayer(player_id))?;
    let seed = state.seed_for_descent(depth, || from.seed.successor());
    transition(
        room,
        player_id,
        from,
        MapKey::new(depth, seed),
        Arrival::Descent,
        out_events,
    )
}

fn ascend(
    room: &mut GameRoom,
    player_id: PlayerId,
    from: MapKey,
    portal: CellCoord,
    out_events: &mut Vec<Event>,
) -> Result<(), RoomError> {
    let depth = from.depth - 1;
    let state = room
        .map_states
        .get(&player_id)
        .ok_or(RoomError::UnknownPlayer(player_id))?;
    let seed = state.seed_for_ascent(depth);
    debug_assert!(
        seed.is_some(),
        "backward transition to depth {depth} without a recorded seed"
    );
    let Some(seed) = seed else {
        error!(
            player = player_id.get(),
            depth, "backward transition without a recorded seed"
        );
        return Err(RoomError::MissingSeed {
            player: player_id,
            depth,
        });
    };

    relocate(room, player_id, portal);
    transition(
        room,
        player_id,
        from,
        MapKey::new(depth, seed),
        Arrival::Ascent,
        out_events,
    )
}

/// Moves a player between instances: snapshot the departed map, resolve or
/// create the target instance, and place the player on it.
fn transition(
    room: &mut GameRoom,
    player_id: PlayerId,
    from: MapKey,
    to: MapKey,
    arrival: Arrival,
    out_events: &mut Vec<Event>,
) -> Result<(), RoomError> {
    let now = room.clock;
    let last_position = room
        .players
        .get(&player_id)
        .ok_or(RoomError::UnknownPlayer(player_id))?
        .previous_cell;

    if let Some(instance) = room.instances.get_mut(&from) {
        let departed = CachedMapState {
            seed: from.seed,
            bots: instance.bots.snapshot(),
            last_position,
            entry_portal: instance.dungeon.entry_portal(),
            exit_portal: instance.dungeon.exit_portal(),
        };
        instance.leave(player_id, now);
        if let Some(state) = room.map_states.get_mut(&player_id) {
            if let Some(evicted) = state.remember(from.depth, departed) {
                debug!(
                    player = player_id.get(),
                    depth = evicted,
                    "map cache evicted oldest depth"
                );
            }
        }
    }

    let cached = room
        .map_states
        .get_mut(&player_id)
        .and_then(|state| state.recall(to.depth, to.seed).cloned());
    let instance = ensure_instance(room, to, cached.as_ref());
    instance.enter(player_id);
    let position = cached
        .as_ref()
        .map(|state| state.last_position)
        .filter(|cell| instance.is_arrival_tile(*cell))
        .unwrap_or_else(|| match arrival {
            Arrival::Descent => instance.dungeon.spawn_point(),
            Arrival::Ascent => instance.beside_exit(),
        });
    let entry_portal = instance.dungeon.entry_portal();
    let exit_portal = instance.dungeon.exit_portal();

    if let Some(state) = room.map_states.get_mut(&player_id) {
        state.set_current_depth(to.depth);
    }
    if let Some(player) = room.players.get_mut(&player_id) {
        player.depth = to.depth;
        player.seed = to.seed;
        player.place(position);
    }

    info!(
        player = player_id.get(),
        from_depth = from.depth,
        depth = to.depth,
        seed = to.seed.get(),
        "player changed map"
    );
    out_events.push(Event::MapChanged {
        player: player_id,
        new_depth: to.depth,
        new_seed: to.seed,
        entry_portal,
        exit_portal,
        position,
    });
    Ok(())
}

fn complete(
    room: &mut GameRoom,
    player_id: PlayerId,
    outcome: GameOutcome,
    out_events: &mut Vec<Event>,
) {
    let Some(player) = room.players.get_mut(&player_id) else {
        return;
    };
    player.finished = true;
    if let Some(instance) = room.instances.get_mut(&player.map()) {
        instance.leave(player_id, room.clock);
    }
    info!(
        player = player_id.get(),
        depth = player.depth,
        score = player.score,
        ?outcome,
        "run completed"
    );
    out_events.push(Event::GameCompleted {
        player: player_id,
        depth: player.depth,
        score: player.score,
        outcome,
    });
}

fn tick(room: &mut GameRoom, dt: Duration, out_events: &mut Vec<Event>) {
    room.clock = room.clock.saturating_add(dt);
    let now = room.clock;
    let rules = room.combat_rules();

    let keys: Vec<MapKey> = room.instances.keys().copied().collect();
    for key in keys {
        step_instance(room, key, dt, now, &rules, out_events);
    }

    tear_down_idle(room, now);
    room.bullets
        .retain(|bullet| room.instances.contains_key(&bullet.map));
}

/// One tick of one instance: bullets, bot movement, contacts, spawns.
fn step_instance(
    room: &mut GameRoom,
    key: MapKey,
    dt: Duration,
    now: Duration,
    rules: &CombatRules,
    out_events: &mut Vec<Event>,
) {
    let kill_score = room.config.kill_score;
    let path_budget = room.config.path_requests_per_tick;
    let min_distance = room.config.min_spawn_distance;

    let Some(instance) = room.instances.get_mut(&key) else {
        return;
    };
    if instance.present.is_empty() {
        return;
    }
    let grid = instance.dungeon.grid();

    let kills = combat::resolve_bullets(
        key,
        &mut room.bullets,
        &mut instance.bots,
        grid,
        dt,
        now,
        rules,
    );
    for kill in kills {
        for credited in &kill.credited_players {
            if let Some(player) = room.players.get_mut(credited) {
                player.score += kill.credit_per_player * kill_score;
            }
        }
        out_events.push(Event::BotKilled {
            bot_id: kill.bot_id,
            credited_players: kill.credited_players,
            credit_per_player: kill.credit_per_player,
        });
    }

    let targets = living_players(&room.players, key);
    instance.bots.tick(grid, &targets, now, path_budget);

    let spawn_point = instance.dungeon.spawn_point();
    let mut on_map: Vec<&mut Player> = room
        .players
        .values_mut()
        .filter(|player| player.map() == key)
        .collect();
    let hits = combat::resolve_contacts(
        key,
        &mut on_map,
        &mut instance.bots,
        grid,
        now,
        rules,
        &mut instance.rng,
    );
    let mut defeated = Vec::new();
    for hit in hits {
        out_events.push(Event::PlayerHit {
            player: hit.player,
            lives_remaining: hit.lives_remaining,
        });
        let Some(player) = on_map.iter_mut().find(|player| player.id == hit.player) else {
            continue;
        };
        if hit.lives_remaining > 0 {
            player.place(spawn_point);
            continue;
        }
        player.finished = true;
        defeated.push(hit.player);
        info!(
            player = hit.player.get(),
            depth = player.depth,
            "player ran out of lives"
        );
        out_events.push(Event::GameCompleted {
            player: hit.player,
            depth: player.depth,
            score: player.score,
            outcome: GameOutcome::Defeat,
        });
    }
    for player in defeated {
        instance.leave(player, now);
    }
    let grid = instance.dungeon.grid();

    let living: Vec<CellCoord> = living_players(&room.players, key)
        .into_iter()
        .map(|target| target.cell)
        .collect();
    if living.is_empty() {
        return;
    }
    let due = instance.bots.spawns_due(dt);
    for _ in 0..due {
        if !instance.bots.has_capacity() {
            break;
        }
        let area = SpawnArea {
            grid,
            zones: instance.dungeon.spawn_zones(),
            players: &living,
            origin: instance.dungeon.entry_point(),
            min_distance,
        };
        let bot_id = BotId::new(next_id(&mut room.next_bot_id));
        let Some(cell) = instance.bots.spawn(&area, bot_id, &mut instance.rng) else {
            continue;
        };
        let role = instance
            .bots
            .bot(bot_id)
            .map_or(TacticalRole::Attack, Bot::role);
        out_events.push(Event::BotSpawned {
            bot_id,
            map: key,
            cell,
            role,
        });
    }
}

fn living_players(players: &BTreeMap<PlayerId, Player>, key: MapKey) -> Vec<PlayerTarget> {
    players
        .values()
        .filter(|player| player.map() == key && player.is_active())
        .map(|player| PlayerTarget {
            id: player.id,
            cell: player.cell,
        })
        .collect()
}

fn tear_down_idle(room: &mut GameRoom, now: Duration) {
    let timeout = room.config.idle_timeout();
    let idle: Vec<MapKey> = room
        .instances
        .iter()
        .filter(|(_, instance)| instance.is_idle(now, timeout))
        .map(|(key, _)| *key)
        .collect();

    for key in idle {
        if let Some(mut instance) = room.instances.remove(&key) {
            instance.bots.clear();
            debug!(
                depth = key.depth,
                seed = key.seed.get(),
                "idle map instance torn down"
            );
        }
    }
}

/// Query functions that expose read-only views into the room.
pub mod query {
    use std::time::Duration;

    use delve_core::{Bullet, DungeonData, MapKey, Player, PlayerId};
    use delve_system_bots::Bot;

    use super::{GameRoom, PlayerMapState, RoomConfig};

    /// Simulated time since the room was created.
    #[must_use]
    pub fn clock(room: &GameRoom) -> Duration {
        room.clock
    }

    /// Configuration the room runs with.
    #[must_use]
    pub fn config(room: &GameRoom) -> &RoomConfig {
        &room.config
    }

    /// Looks up one player.
    #[must_use]
    pub fn player(room: &GameRoom, player_id: PlayerId) -> Option<&Player> {
        room.players.get(&player_id)
    }

    /// Every player in identifier order.
    pub fn players(room: &GameRoom) -> impl Iterator<Item = &Player> + '_ {
        room.players.values()
    }

    /// Navigation record of a player.
    #[must_use]
    pub fn map_state(room: &GameRoom, player_id: PlayerId) -> Option<&PlayerMapState> {
        room.map_states.get(&player_id)
    }

    /// Keys of the live map instances in ascending order.
    #[must_use]
    pub fn instances(room: &GameRoom) -> Vec<MapKey> {
        room.instances.keys().copied().collect()
    }

    /// Dungeon of a live instance.
    #[must_use]
    pub fn dungeon(room: &GameRoom, key: MapKey) -> Option<&DungeonData> {
        room.instances.get(&key).map(|instance| &instance.dungeon)
    }

    /// Live bots of an instance in spawn order.
    #[must_use]
    pub fn bots(room: &GameRoom, key: MapKey) -> Option<&[Bot]> {
        room.instances.get(&key).map(|instance| instance.bots.bots())
    }

    /// Players currently present on an instance.
    #[must_use]
    pub fn present_players(room: &GameRoom, key: MapKey) -> Vec<PlayerId> {
        room.instances
            .get(&key)
            .map(|instance| instance.present.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Bullets in flight across every instance.
    #[must_use]
    pub fn bullets(room: &GameRoom) -> &[Bullet] {
        &room.bullets
    }
}
