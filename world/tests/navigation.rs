use std::{collections::BTreeSet, time::Duration};

use delve_core::{CellCoord, Command, Event, GameOutcome, MapKey, PlayerId, Seed, Tile};
use delve_system_pathfinding::find_path;
use delve_world::{self as world, query, GameRoom, RoomConfig, RoomError};

fn config() -> RoomConfig {
    RoomConfig {
        map_width: 60,
        map_height: 60,
        lives: 100,
        ..RoomConfig::default()
    }
}

fn join(room: &mut GameRoom, player: PlayerId) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(room, Command::AddPlayer { player }, &mut events).expect("join accepted");
    events
}

fn key_of(room: &GameRoom, player: PlayerId) -> MapKey {
    query::player(room, player).expect("player present").map()
}

/// Walks the player one tile at a time towards `goal` until it is reached
/// or the player changes map. Active transport pads and `avoid` are routed
/// around when possible.
fn walk_to(
    room: &mut GameRoom,
    player: PlayerId,
    goal: CellCoord,
    avoid: Option<CellCoord>,
    events: &mut Vec<Event>,
) {
    let start = key_of(room, player);
    for _ in 0..4_000 {
        let current = query::player(room, player).expect("player present").clone();
        if current.map() != start || current.cell == goal || current.finished {
            return;
        }

        let dungeon = query::dungeon(room, start).expect("instance alive");
        let mut grid = dungeon.grid().clone();
        for pad in dungeon.transport_points() {
            if *pad != current.cell && grid.get(*pad) == Some(Tile::ActiveTransport) {
                grid.set(*pad, Tile::Wall);
            }
        }
        if let Some(cell) = avoid {
            grid.set(cell, Tile::Wall);
        }
        let mut path = find_path(&grid, current.cell, goal);
        if path.len() < 2 {
            path = find_path(dungeon.grid(), current.cell, goal);
        }
        assert!(
            path.len() >= 2,
            "no path from {:?} to {goal:?}",
            current.cell
        );

        let direction = current
            .cell
            .direction_to(path[1])
            .expect("path steps are adjacent");
        world::apply(room, Command::Move { player, direction }, events).expect("move accepted");
    }
    panic!("player {player:?} never reached {goal:?}");
}

fn descend(room: &mut GameRoom, player: PlayerId, events: &mut Vec<Event>) {
    let key = key_of(room, player);
    let dungeon = query::dungeon(room, key).expect("instance alive");
    let exit = dungeon.exit_portal();
    let entry = dungeon.entry_portal();
    walk_to(room, player, exit, entry, events);
}

fn ascend(room: &mut GameRoom, player: PlayerId, events: &mut Vec<Event>) {
    let key = key_of(room, player);
    let dungeon = query::dungeon(room, key).expect("instance alive");
    let entry = dungeon.entry_portal().expect("home map has no entry portal");
    let exit = dungeon.exit_portal();
    walk_to(room, player, entry, Some(exit), events);
}

fn tick_for(room: &mut GameRoom, total: Duration, events: &mut Vec<Event>) {
    let step = Duration::from_millis(100);
    let mut elapsed = Duration::ZERO;
    while elapsed < total {
        world::apply(room, Command::Tick { dt: step }, events).expect("tick accepted");
        elapsed += step;
    }
}

fn map_changes(events: &[Event]) -> Vec<(u32, Seed, CellCoord)> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::MapChanged {
                new_depth,
                new_seed,
                position,
                ..
            } => Some((*new_depth, *new_seed, *position)),
            _ => None,
        })
        .collect()
}

#[test]
fn joining_places_player_on_home_map() {
    let mut room = GameRoom::new(config());
    let player = PlayerId::new(1);
    let events = join(&mut room, player);

    let home = MapKey::new(0, Seed::new(42));
    let dungeon = query::dungeon(&room, home).expect("home instance");
    assert_eq!(
        events,
        vec![Event::MapChanged {
            player,
            new_depth: 0,
            new_seed: Seed::new(42),
            entry_portal: None,
            exit_portal: dungeon.exit_portal(),
            position: dungeon.spawn_point(),
        }]
    );
    assert_eq!(query::present_players(&room, home), vec![player]);
    assert_eq!(
        query::map_state(&room, player).map(|state| state.current_depth()),
        Some(0)
    );
}

#[test]
fn descending_derives_and_records_next_seed() {
    let mut room = GameRoom::new(config());
    let player = PlayerId::new(1);
    let _ = join(&mut room, player);

    let mut events = Vec::new();
    descend(&mut room, player, &mut events);

    let next_seed = Seed::new(42).successor();
    let changes = map_changes(&events);
    assert_eq!(changes.len(), 1);
    let (depth, seed, position) = changes[0];
    assert_eq!((depth, seed), (1, next_seed));

    let key = MapKey::new(1, next_seed);
    let dungeon = query::dungeon(&room, key).expect("depth 1 instance");
    assert_eq!(position, dungeon.spawn_point());
    assert!(dungeon.entry_portal().is_some());

    let state = query::map_state(&room, player).expect("map state");
    assert_eq!(state.current_depth(), 1);
    assert_eq!(state.seed_history().get(&1), Some(&next_seed));
    let cached = state.peek_cached(0).expect("home map cached");
    assert_eq!(cached.seed, Seed::new(42));
    assert_eq!(
        query::dungeon(&room, MapKey::new(0, Seed::new(42)))
            .expect("home instance still alive")
            .grid()
            .get(cached.last_position),
        Some(Tile::Floor)
    );
}

#[test]
fn returning_home_restores_position_and_bots() {
    let mut room = GameRoom::new(RoomConfig {
        idle_timeout_ms: 1_000,
        ..config()
    });
    let player = PlayerId::new(1);
    let _ = join(&mut room, player);
    let home = MapKey::new(0, Seed::new(42));

    let mut events = Vec::new();
    tick_for(&mut room, Duration::from_millis(3_500), &mut events);
    let spawned_before: Vec<_> = query::bots(&room, home)
        .expect("home instance")
        .iter()
        .map(|bot| bot.id())
        .collect();
    assert!(!spawned_before.is_empty(), "no bot spawned on the home map");

    descend(&mut room, player, &mut events);
    let cached = query::map_state(&room, player)
        .and_then(|state| state.peek_cached(0))
        .cloned()
        .expect("home map cached");
    assert_eq!(cached.bots.len(), spawned_before.len());

    tick_for(&mut room, Duration::from_millis(1_500), &mut events);
    assert!(
        !query::instances(&room).contains(&home),
        "empty home instance outlived its idle timeout"
    );

    let mut events = Vec::new();
    ascend(&mut room, player, &mut events);
    let changes = map_changes(&events);
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0], (0, Seed::new(42), cached.last_position));

    let restored = query::bots(&room, home).expect("home instance recreated");
    let restored_cells: BTreeSet<CellCoord> = restored.iter().map(|bot| bot.cell()).collect();
    let cached_cells: BTreeSet<CellCoord> = cached.bots.iter().map(|bot| bot.cell).collect();
    assert_eq!(restored_cells, cached_cells);
    for bot in restored {
        assert!(
            !spawned_before.contains(&bot.id()),
            "restored bot reused identifier {:?}",
            bot.id()
        );
    }
}

#[test]
fn map_cache_keeps_most_recent_departures() {
    let mut room = GameRoom::new(RoomConfig {
        cache_capacity: 2,
        ..config()
    });
    let player = PlayerId::new(7);
    let _ = join(&mut room, player);

    let mut events = Vec::new();
    for _ in 0..3 {
        descend(&mut room, player, &mut events);
    }

    let state = query::map_state(&room, player).expect("map state");
    assert_eq!(state.current_depth(), 3);
    assert_eq!(state.cache_len(), 2);
    assert_eq!(state.cached_depths(), vec![2, 1]);
    assert!(state.peek_cached(0).is_none());

    let first = Seed::new(42).successor();
    let second = first.successor();
    let third = second.successor();
    let history: Vec<(u32, Seed)> = state
        .seed_history()
        .iter()
        .map(|(depth, seed)| (*depth, *seed))
        .collect();
    assert_eq!(
        history,
        vec![(0, Seed::new(42)), (1, first), (2, second), (3, third)]
    );
}

#[test]
fn visiting_one_more_depth_than_the_cache_holds() {
    const CAPACITY: usize = 2;
    let mut room = GameRoom::new(RoomConfig {
        cache_capacity: CAPACITY,
        idle_timeout_ms: 0,
        ..config()
    });
    let player = PlayerId::new(4);
    let _ = join(&mut room, player);
    let home = MapKey::new(0, Seed::new(42));
    let home_map = query::dungeon(&room, home).expect("home instance").clone();

    let mut events = Vec::new();
    for _ in 0..CAPACITY {
        descend(&mut room, player, &mut events);
    }
    tick_for(&mut room, Duration::from_millis(100), &mut events);
    assert!(!query::instances(&room).contains(&home));

    let state = query::map_state(&room, player).expect("map state");
    assert_eq!(state.current_depth(), 2);
    assert_eq!(state.cache_len(), CAPACITY);
    assert_eq!(state.seed_history().len(), CAPACITY + 1);
    assert_eq!(state.seed_history().get(&0), Some(&Seed::new(42)));

    for _ in 0..CAPACITY {
        ascend(&mut room, player, &mut events);
    }
    assert_eq!(key_of(&room, player), home);
    let restored = query::dungeon(&room, home).expect("home instance regenerated");
    assert_eq!(restored.grid(), home_map.grid());
    assert_eq!(restored.rooms(), home_map.rooms());
    assert_eq!(restored.exit_portal(), home_map.exit_portal());
}

#[test]
fn ascending_past_the_cache_regenerates_from_seed_history() {
    let mut room = GameRoom::new(RoomConfig {
        cache_capacity: 1,
        idle_timeout_ms: 0,
        ..config()
    });
    let player = PlayerId::new(2);
    let _ = join(&mut room, player);

    let mut events = Vec::new();
    for _ in 0..3 {
        descend(&mut room, player, &mut events);
    }
    tick_for(&mut room, Duration::from_millis(100), &mut events);

    let depth_one = MapKey::new(1, Seed::new(42).successor());
    assert!(!query::instances(&room).contains(&depth_one));

    ascend(&mut room, player, &mut events);
    let state = query::map_state(&room, player).expect("map state");
    assert_eq!(state.cached_depths(), vec![3]);
    assert!(state.peek_cached(1).is_none());

    let mut events = Vec::new();
    ascend(&mut room, player, &mut events);
    let changes = map_changes(&events);
    assert_eq!(changes.len(), 1);
    assert_eq!((changes[0].0, changes[0].1), (1, depth_one.seed));

    let dungeon = query::dungeon(&room, depth_one).expect("depth 1 regenerated");
    assert_eq!(changes[0].2.manhattan_distance(dungeon.exit_portal()), 1);
    assert!(query::bots(&room, depth_one).expect("instance").is_empty());
}

#[test]
fn players_on_different_maps_do_not_interact() {
    let mut room = GameRoom::new(config());
    let diver = PlayerId::new(1);
    let stayer = PlayerId::new(2);
    let _ = join(&mut room, diver);
    let _ = join(&mut room, stayer);

    let mut events = Vec::new();
    descend(&mut room, diver, &mut events);
    let home = MapKey::new(0, Seed::new(42));
    let below = key_of(&room, diver);
    assert_eq!(query::present_players(&room, home), vec![stayer]);
    assert_eq!(query::present_players(&room, below), vec![diver]);

    for step in 0..60_u16 {
        let angle = f32::from(step) * 0.7;
        world::apply(
            &mut room,
            Command::Shoot {
                player: diver,
                angle,
            },
            &mut events,
        )
        .expect("shot accepted");
        for bullet in query::bullets(&room) {
            assert_eq!(bullet.map, below);
        }
        world::apply(
            &mut room,
            Command::Tick {
                dt: Duration::from_millis(100),
            },
            &mut events,
        )
        .expect("tick accepted");
    }

    let home_bots = query::bots(&room, home).expect("home instance");
    assert!(!home_bots.is_empty());
    for bot in home_bots {
        assert_eq!(bot.health(), bot.max_health());
        assert!(bot.damaged_by().is_empty());
    }
    let home_spawns: BTreeSet<_> = events
        .iter()
        .filter_map(|event| match event {
            Event::BotSpawned { bot_id, map, .. } if *map == home => Some(*bot_id),
            _ => None,
        })
        .collect();
    for event in &events {
        if let Event::BotKilled {
            bot_id,
            credited_players,
            ..
        } = event
        {
            assert!(!home_spawns.contains(bot_id));
            assert_eq!(credited_players, &vec![diver]);
        }
    }
}

#[test]
fn crossing_final_exit_wins_the_run() {
    let mut room = GameRoom::new(RoomConfig {
        final_depth: 0,
        idle_timeout_ms: 0,
        ..config()
    });
    let player = PlayerId::new(3);
    let _ = join(&mut room, player);

    let mut events = Vec::new();
    descend(&mut room, player, &mut events);

    let completion = events.iter().find_map(|event| match event {
        Event::GameCompleted {
            player: who,
            depth,
            outcome,
            ..
        } => Some((*who, *depth, *outcome)),
        _ => None,
    });
    assert_eq!(completion, Some((player, 0, GameOutcome::Victory)));
    assert!(map_changes(&events).is_empty());
    assert!(query::player(&room, player).expect("player").finished);
    let home = MapKey::new(0, Seed::new(42));
    assert!(query::present_players(&room, home).is_empty());
    tick_for(&mut room, Duration::from_millis(100), &mut events);
    assert!(!query::instances(&room).contains(&home));

    let result = world::apply(
        &mut room,
        Command::Move {
            player,
            direction: delve_core::Direction::North,
        },
        &mut events,
    );
    assert_eq!(result, Err(RoomError::PlayerInactive(player)));
}
