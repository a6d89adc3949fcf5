use delve_core::{BotId, CellCoord, Seed};
use delve_system_bots::{BotManager, SpawnArea};
use delve_system_generation::generate;
use delve_system_pathfinding::euclidean_distance;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const MIN_DISTANCE: f64 = 12.0;

#[test]
fn spawned_bots_keep_their_distance() {
    let mut rng = ChaCha8Rng::seed_from_u64(0xb07_5afe);
    let mut seed = Seed::new(42);
    let dungeons: Vec<_> = (0..10u32)
        .map(|index| {
            seed = seed.successor();
            generate(80, 80, seed, index % 5)
        })
        .collect();
    let mut spawned = 0;

    for trial in 0..1_000u32 {
        let dungeon = &dungeons[trial as usize % dungeons.len()];
        let depth = dungeon.depth();
        let grid = dungeon.grid();

        let players: Vec<CellCoord> = (0..3)
            .map(|_| random_walkable(&mut rng, grid))
            .collect();
        let area = SpawnArea {
            grid,
            zones: dungeon.spawn_zones(),
            players: &players,
            origin: dungeon.entry_point(),
            min_distance: MIN_DISTANCE,
        };

        let mut manager = BotManager::new(grid.width(), grid.height(), depth);
        let Some(cell) = manager.spawn(&area, BotId::new(trial), &mut rng) else {
            continue;
        };
        spawned += 1;

        assert!(grid.is_walkable(cell));
        assert!(euclidean_distance(cell, dungeon.entry_point()) >= MIN_DISTANCE);
        for player in &players {
            assert!(
                euclidean_distance(cell, *player) >= MIN_DISTANCE,
                "bot at {cell:?} spawned next to player at {player:?}"
            );
        }
    }

    assert!(spawned > 900, "only {spawned} of 1000 trials found a location");
}

#[test]
fn spawning_stops_at_the_bot_cap() {
    let dungeon = generate(120, 120, Seed::new(7), 0);
    let grid = dungeon.grid();
    let area = SpawnArea {
        grid,
        zones: dungeon.spawn_zones(),
        players: &[],
        origin: dungeon.entry_point(),
        min_distance: MIN_DISTANCE,
    };
    let mut manager = BotManager::new(grid.width(), grid.height(), 0);
    let mut rng = ChaCha8Rng::seed_from_u64(11);

    for index in 0..20 {
        let _ = manager.spawn(&area, BotId::new(index), &mut rng);
    }
    assert_eq!(manager.len(), manager.difficulty().max_bots);

    let mut cells: Vec<_> = manager.bots().iter().map(|bot| bot.cell()).collect();
    cells.sort();
    cells.dedup();
    assert_eq!(cells.len(), manager.len(), "two bots share a tile");
}

fn random_walkable(rng: &mut ChaCha8Rng, grid: &delve_core::TileGrid) -> CellCoord {
    loop {
        let cell = CellCoord::new(
            rng.gen_range(0..grid.width()),
            rng.gen_range(0..grid.height()),
        );
        if grid.is_walkable(cell) {
            return cell;
        }
    }
}
