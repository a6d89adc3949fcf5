#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Collision and combat resolution for one map instance.
//!
//! Every entry point takes the instance's [`MapKey`] and ignores bullets and
//! players that belong to another instance, so entities on different maps
//! never interact even when a caller hands over a shared roster.

use std::time::Duration;

use delve_core::{
    BotId, Bullet, BulletId, CellCoord, Direction, MapKey, Player, PlayerId, Point, TileGrid,
};
use delve_system_bots::BotManager;
use rand::seq::SliceRandom;
use rand::Rng;

/// Longest distance a bullet travels between two collision checks, in tiles.
const MAX_SUBSTEP: f32 = 0.25;

/// Damage and timing rules applied by the resolver.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CombatRules {
    /// Health removed from a bot per bullet.
    pub bullet_damage: u32,
    /// Time after which a bullet despawns.
    pub bullet_lifetime: Duration,
    /// Invincibility granted to a player after a hit.
    pub invincibility: Duration,
}

/// Bot death with its kill credit.
#[derive(Clone, Debug, PartialEq)]
pub struct Kill {
    /// Bot that died.
    pub bot_id: BotId,
    /// Every player that damaged the bot, in id order.
    pub credited_players: Vec<PlayerId>,
    /// Share of the kill each credited player receives.
    pub credit_per_player: f64,
}

/// Bot touching a player outside their invincibility window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hit {
    /// Player that lost a life.
    pub player: PlayerId,
    /// Bot that touched them.
    pub bot_id: BotId,
    /// Lives the player has left.
    pub lives_remaining: u32,
    /// Tile the bot was pushed to, if a free one existed.
    pub knockback: Option<CellCoord>,
}

/// Creates a bullet leaving the center of the shooter's tile along `angle`.
#[must_use]
pub fn fire(
    shooter: &Player,
    bullet_id: BulletId,
    angle: f32,
    speed: f32,
    now: Duration,
) -> Bullet {
    Bullet {
        id: bullet_id,
        owner: shooter.id,
        position: Point::center_of(shooter.cell),
        velocity: Point::new(angle.cos() * speed, angle.sin() * speed),
        map: shooter.map(),
        fired_at: now,
    }
}

/// Moves the instance's bullets by `dt` and applies their hits to bots.
///
/// A bullet despawns when it leaves the grid, enters a blocked tile,
/// outlives [`CombatRules::bullet_lifetime`], or strikes a bot. Deaths are
/// resolved after every bullet has moved, so several hits on one tick yield
/// a single [`Kill`] that credits every contributor equally.
pub fn resolve_bullets(
    map: MapKey,
    bullets: &mut Vec<Bullet>,
    bots: &mut BotManager,
    grid: &TileGrid,
    dt: Duration,
    now: Duration,
    rules: &CombatRules,
) -> Vec<Kill> {
    let mut struck: Vec<BotId> = Vec::new();

    bullets.retain_mut(|bullet| {
        if bullet.map != map {
            return true;
        }
        if now.saturating_sub(bullet.fired_at) >= rules.bullet_lifetime {
            return false;
        }
        match advance_bullet(bullet, grid, bots, dt) {
            Flight::Flying => true,
            Flight::Blocked => false,
            Flight::Struck(bot_id) => {
                if let Some(bot) = bots.bot_mut(bot_id) {
                    let _ = bot.apply_damage(rules.bullet_damage, bullet.owner);
                }
                if !struck.contains(&bot_id) {
                    struck.push(bot_id);
                }
                false
            }
        }
    });

    let mut kills = Vec::new();
    for bot_id in struck {
        let dead = bots.bot(bot_id).is_some_and(|bot| bot.is_dead());
        if !dead {
            continue;
        }
        let Some(bot) = bots.remove(bot_id) else {
            continue;
        };
        let credited_players: Vec<PlayerId> = bot.damaged_by().iter().copied().collect();
        let credit_per_player = kill_credit(credited_players.len());
        kills.push(Kill {
            bot_id,
            credited_players,
            credit_per_player,
        });
    }
    kills
}

/// Even split of one kill among `contributors` players.
#[must_use]
pub fn kill_credit(contributors: usize) -> f64 {
    if contributors == 0 {
        return 0.0;
    }
    1.0 / contributors as f64
}

enum Flight {
    Flying,
    Blocked,
    Struck(BotId),
}

fn advance_bullet(bullet: &mut Bullet, grid: &TileGrid, bots: &BotManager, dt: Duration) -> Flight {
    let seconds = dt.as_secs_f32();
    let dx = bullet.velocity.x * seconds;
    let dy = bullet.velocity.y * seconds;
    let distance = (dx * dx + dy * dy).sqrt();
    let steps = (distance / MAX_SUBSTEP).ceil().max(1.0) as u32;
    let step_x = dx / steps as f32;
    let step_y = dy / steps as f32;

    for _ in 0..steps {
        bullet.position = Point::new(bullet.position.x + step_x, bullet.position.y + step_y);
        let Some(cell) = bullet.position.cell().filter(|cell| grid.contains(*cell)) else {
            return Flight::Blocked;
        };
        if !grid.is_walkable(cell) {
            return Flight::Blocked;
        }
        if let Some(bot_id) = bots.occupant(cell) {
            return Flight::Struck(bot_id);
        }
    }
    Flight::Flying
}

/// Resolves bots standing on the same tile as a player of the instance.
///
/// Dead players and players inside their invincibility window are skipped.
/// A hit costs one life, grants [`CombatRules::invincibility`], and knocks the
/// bot one tile back in a shuffled cardinal direction. Respawning the player
/// is left to the caller.
pub fn resolve_contacts<R: Rng>(
    map: MapKey,
    players: &mut [&mut Player],
    bots: &mut BotManager,
    grid: &TileGrid,
    now: Duration,
    rules: &CombatRules,
    rng: &mut R,
) -> Vec<Hit> {
    let mut hits = Vec::new();

    for player in players.iter_mut() {
        if player.map() != map || !player.is_active() || player.is_invincible(now) {
            continue;
        }
        let Some(bot_id) = bots.occupant(player.cell) else {
            continue;
        };

        player.lives = player.lives.saturating_sub(1);
        player.invincible_until = now.saturating_add(rules.invincibility);
        let knockback = knock_back(bots, grid, bot_id, player.cell, rng);
        hits.push(Hit {
            player: player.id,
            bot_id,
            lives_remaining: player.lives,
            knockback,
        });
    }

    hits
}

fn knock_back<R: Rng>(
    bots: &mut BotManager,
    grid: &TileGrid,
    bot_id: BotId,
    player_cell: CellCoord,
    rng: &mut R,
) -> Option<CellCoord> {
    let from = bots.bot(bot_id)?.cell();
    let mut directions = Direction::ALL;
    directions.shuffle(rng);

    let destination = directions
        .into_iter()
        .filter_map(|direction| from.step(direction))
        .find(|cell| {
            *cell != player_cell && grid.is_walkable(*cell) && bots.occupant(*cell).is_none()
        })?;
    if bots.relocate(grid, bot_id, destination) {
        Some(destination)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use delve_core::{Seed, Tile};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn map() -> MapKey {
        MapKey::new(0, Seed::new(1))
    }

    fn rules() -> CombatRules {
        CombatRules {
            bullet_damage: 10,
            bullet_lifetime: Duration::from_secs(2),
            invincibility: Duration::from_secs(2),
        }
    }

    fn bullet(id: u32, owner: u64, position: Point, velocity: Point) -> Bullet {
        Bullet {
            id: BulletId::new(id),
            owner: PlayerId::new(owner),
            position,
            velocity,
            map: map(),
            fired_at: Duration::ZERO,
        }
    }

    #[test]
    fn credit_splits_evenly() {
        assert!((kill_credit(1) - 1.0).abs() < f64::EPSILON);
        assert!((kill_credit(2) - 0.5).abs() < f64::EPSILON);
        assert!((kill_credit(4) - 0.25).abs() < f64::EPSILON);
        assert_eq!(kill_credit(0), 0.0);
    }

    #[test]
    fn fire_aims_from_tile_center() {
        let player = Player::new(PlayerId::new(3), CellCoord::new(2, 4), 3, map());
        let shot = fire(&player, BulletId::new(1), 0.0, 20.0, Duration::from_secs(1));
        assert_eq!(shot.position, Point::new(2.5, 4.5));
        assert!((shot.velocity.x - 20.0).abs() < 1e-4);
        assert!(shot.velocity.y.abs() < 1e-4);
        assert_eq!(shot.owner, PlayerId::new(3));
        assert_eq!(shot.map, player.map());
    }

    #[test]
    fn bullets_stop_at_walls() {
        let grid = TileGrid::from_rows(&["..#.."]);
        let mut bots = BotManager::new(5, 1, 0);
        let mut bullets = vec![bullet(1, 1, Point::new(0.5, 0.5), Point::new(20.0, 0.0))];
        let kills = resolve_bullets(
            map(),
            &mut bullets,
            &mut bots,
            &grid,
            Duration::from_millis(100),
            Duration::from_millis(100),
            &rules(),
        );
        assert!(kills.is_empty());
        assert!(bullets.is_empty());
    }

    #[test]
    fn bullets_expire_after_lifetime() {
        let grid = TileGrid::filled(50, 1, Tile::Floor);
        let mut bots = BotManager::new(50, 1, 0);
        let mut bullets = vec![bullet(1, 1, Point::new(0.5, 0.5), Point::new(1.0, 0.0))];
        let _ = resolve_bullets(
            map(),
            &mut bullets,
            &mut bots,
            &grid,
            Duration::from_millis(33),
            Duration::from_secs(1),
            &rules(),
        );
        assert_eq!(bullets.len(), 1);
        let _ = resolve_bullets(
            map(),
            &mut bullets,
            &mut bots,
            &grid,
            Duration::from_millis(33),
            Duration::from_secs(2),
            &rules(),
        );
        assert!(bullets.is_empty());
    }

    #[test]
    fn fast_bullets_do_not_tunnel_through_bots() {
        let grid = TileGrid::filled(10, 1, Tile::Floor);
        let mut bots = BotManager::new(10, 1, 0);
        assert!(bots.insert(&grid, BotId::new(1), CellCoord::new(3, 0)));
        let mut bullets = vec![bullet(1, 1, Point::new(0.5, 0.5), Point::new(60.0, 0.0))];
        let _ = resolve_bullets(
            map(),
            &mut bullets,
            &mut bots,
            &grid,
            Duration::from_millis(100),
            Duration::from_millis(100),
            &rules(),
        );
        assert!(bullets.is_empty());
        assert_eq!(bots.bot(BotId::new(1)).map(|bot| bot.health()), Some(20));
    }

    #[test]
    fn bullets_of_other_maps_are_untouched() {
        let grid = TileGrid::filled(10, 1, Tile::Floor);
        let mut bots = BotManager::new(10, 1, 0);
        assert!(bots.insert(&grid, BotId::new(1), CellCoord::new(1, 0)));
        let mut foreign = bullet(1, 1, Point::new(0.5, 0.5), Point::new(10.0, 0.0));
        foreign.map = MapKey::new(1, Seed::new(2));
        let mut bullets = vec![foreign.clone()];
        let _ = resolve_bullets(
            map(),
            &mut bullets,
            &mut bots,
            &grid,
            Duration::from_millis(100),
            Duration::from_millis(100),
            &rules(),
        );
        assert_eq!(bullets, vec![foreign]);
        assert_eq!(bots.bot(BotId::new(1)).map(|bot| bot.health()), Some(30));
    }

    #[test]
    fn contact_costs_a_life_and_knocks_the_bot_back() {
        let grid = TileGrid::filled(5, 5, Tile::Floor);
        let mut bots = BotManager::new(5, 5, 0);
        let cell = CellCoord::new(2, 2);
        assert!(bots.insert(&grid, BotId::new(1), cell));
        let mut player = Player::new(PlayerId::new(1), cell, 3, map());
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let hits = resolve_contacts(
            map(),
            &mut [&mut player],
            &mut bots,
            &grid,
            Duration::from_secs(1),
            &rules(),
            &mut rng,
        );

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].lives_remaining, 2);
        assert_eq!(player.lives, 2);
        assert_eq!(player.invincible_until, Duration::from_secs(3));
        let Some(knockback) = hits[0].knockback else {
            panic!("expected a knockback tile");
        };
        assert_eq!(knockback.manhattan_distance(cell), 1);
        assert_eq!(bots.occupant(knockback), Some(BotId::new(1)));
    }

    #[test]
    fn invincible_and_dead_players_are_skipped() {
        let grid = TileGrid::filled(5, 5, Tile::Floor);
        let mut bots = BotManager::new(5, 5, 0);
        let cell = CellCoord::new(2, 2);
        assert!(bots.insert(&grid, BotId::new(1), cell));
        let mut shielded = Player::new(PlayerId::new(1), cell, 3, map());
        shielded.invincible_until = Duration::from_secs(5);
        let mut dead = Player::new(PlayerId::new(2), cell, 0, map());
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let hits = resolve_contacts(
            map(),
            &mut [&mut shielded, &mut dead],
            &mut bots,
            &grid,
            Duration::from_secs(1),
            &rules(),
            &mut rng,
        );
        assert!(hits.is_empty());
        assert_eq!(shielded.lives, 3);
        assert_eq!(bots.bot(BotId::new(1)).map(|bot| bot.cell()), Some(cell));
    }

    #[test]
    fn cornered_bots_stay_put() {
        let grid = TileGrid::from_rows(&[
            "###", //
            "#.#", //
            "###", //
        ]);
        let mut bots = BotManager::new(3, 3, 0);
        let cell = CellCoord::new(1, 1);
        assert!(bots.insert(&grid, BotId::new(1), cell));
        let mut player = Player::new(PlayerId::new(1), cell, 1, map());
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        let hits = resolve_contacts(
            map(),
            &mut [&mut player],
            &mut bots,
            &grid,
            Duration::ZERO,
            &rules(),
            &mut rng,
        );
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].knockback, None);
        assert_eq!(hits[0].lives_remaining, 0);
        assert!(!player.is_alive());
    }
}
