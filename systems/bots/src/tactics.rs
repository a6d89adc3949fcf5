//! Per-turn decision table for bots.
//!
//! A turn runs four independent steps:
//!
//! | step | function | outcome |
//! |---|---|---|
//! | pick player | [`nearest_player`] | closest living player on the instance |
//! | pick target | [`target_for`] | player tile (attack) or lateral point (flank) |
//! | refresh plan | [`repath_reason`] | why the cached path must be recomputed, if at all |
//! | pick step | [`choose_step`] | greedy step under line of sight, else the path head |
//!
//! The manager finishes the turn with the occupancy check and then
//! [`trim_path`] so the cached path starts next to the bot again.

use std::{collections::VecDeque, time::Duration};

use delve_core::{CellCoord, PlayerId, TacticalRole, TileGrid};
use delve_system_pathfinding::{euclidean_distance, has_line_of_sight};

/// Lateral distance of the flank point from the player, in tiles.
pub const FLANK_OFFSET: f64 = 5.0;
/// Age after which a cached path is recomputed.
pub const PATH_REFRESH_INTERVAL: Duration = Duration::from_secs(1);
/// Distance the tracked player must move before the path is recomputed.
pub const PLAYER_MOVED_THRESHOLD: f64 = 3.0;
/// Consecutive failed turns after which the path is recomputed.
pub const STUCK_THRESHOLD: u32 = 3;

/// Living player a bot may target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerTarget {
    /// Player identifier.
    pub id: PlayerId,
    /// Tile the player stands on.
    pub cell: CellCoord,
}

/// Why a bot's cached path has to be recomputed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepathReason {
    /// The cached path has no steps left.
    Exhausted,
    /// The path is older than [`PATH_REFRESH_INTERVAL`].
    Expired,
    /// The tracked player moved at least [`PLAYER_MOVED_THRESHOLD`] tiles.
    PlayerMoved,
    /// The bot failed to advance for [`STUCK_THRESHOLD`] turns.
    Stuck,
}

/// Inputs of the refresh step.
#[derive(Clone, Copy, Debug)]
pub struct PathState {
    /// Steps left on the cached path.
    pub remaining_steps: usize,
    /// When the cached path was computed.
    pub computed_at: Option<Duration>,
    /// Player tile the cached path was computed against.
    pub tracked_player_cell: Option<CellCoord>,
    /// Consecutive failed turns.
    pub stuck_turns: u32,
}

/// Next tile a bot wants to enter and how it was chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Greedy step toward a visible target.
    Greedy(CellCoord),
    /// Head of the cached path.
    Path(CellCoord),
    /// Nothing to do this turn.
    Idle,
}

impl Step {
    /// Tile the step leads to, if any.
    #[must_use]
    pub const fn cell(self) -> Option<CellCoord> {
        match self {
            Self::Greedy(cell) | Self::Path(cell) => Some(cell),
            Self::Idle => None,
        }
    }
}

/// Closest player by straight-line distance; ties keep the earlier entry.
#[must_use]
pub fn nearest_player(from: CellCoord, players: &[PlayerTarget]) -> Option<PlayerTarget> {
    players.iter().copied().fold(None, |best, candidate| match best {
        Some(current)
            if euclidean_distance(from, current.cell)
                <= euclidean_distance(from, candidate.cell) =>
        {
            Some(current)
        }
        _ => Some(candidate),
    })
}

/// Tile a bot with `role` standing on `bot` aims for when chasing `player`.
#[must_use]
pub fn target_for(role: TacticalRole, grid: &TileGrid, bot: CellCoord, player: CellCoord) -> CellCoord {
    match role {
        TacticalRole::Attack => player,
        TacticalRole::Flank => flank_target(grid, bot, player).unwrap_or(player),
    }
}

/// Walkable point beside the player, perpendicular to the bot's approach.
///
/// The side closer to the bot wins; the other side is the fallback.
#[must_use]
pub fn flank_target(grid: &TileGrid, bot: CellCoord, player: CellCoord) -> Option<CellCoord> {
    let dx = f64::from(player.column()) - f64::from(bot.column());
    let dy = f64::from(player.row()) - f64::from(bot.row());
    let length = (dx * dx + dy * dy).sqrt();
    if length == 0.0 {
        return None;
    }

    let offset_x = (-dy / length * FLANK_OFFSET).round() as i64;
    let offset_y = (dx / length * FLANK_OFFSET).round() as i64;
    let mut candidates: Vec<CellCoord> = [
        player.offset(offset_x, offset_y),
        player.offset(-offset_x, -offset_y),
    ]
    .into_iter()
    .flatten()
    .filter(|cell| grid.is_walkable(*cell))
    .collect();

    candidates.sort_by(|a, b| {
        euclidean_distance(bot, *a).total_cmp(&euclidean_distance(bot, *b))
    });
    candidates.first().copied()
}

/// Checks the refresh triggers in order: exhausted, expired, player moved, stuck.
#[must_use]
pub fn repath_reason(state: &PathState, now: Duration, player: CellCoord) -> Option<RepathReason> {
    if state.remaining_steps == 0 {
        return Some(RepathReason::Exhausted);
    }
    let expired = state
        .computed_at
        .map_or(true, |at| now.saturating_sub(at) >= PATH_REFRESH_INTERVAL);
    if expired {
        return Some(RepathReason::Expired);
    }
    let moved = state
        .tracked_player_cell
        .map_or(true, |cell| euclidean_distance(cell, player) >= PLAYER_MOVED_THRESHOLD);
    if moved {
        return Some(RepathReason::PlayerMoved);
    }
    if state.stuck_turns >= STUCK_THRESHOLD {
        return Some(RepathReason::Stuck);
    }
    None
}

/// One tile toward `target` along the axis with the larger remaining distance.
///
/// Horizontal wins ties. Returns `None` when already on the target.
#[must_use]
pub fn greedy_step(from: CellCoord, target: CellCoord) -> Option<CellCoord> {
    let dx = i64::from(target.column()) - i64::from(from.column());
    let dy = i64::from(target.row()) - i64::from(from.row());
    if dx == 0 && dy == 0 {
        return None;
    }
    if dx.abs() >= dy.abs() {
        from.offset(dx.signum(), 0)
    } else {
        from.offset(0, dy.signum())
    }
}

/// Picks the bot's move for this turn.
///
/// Under line of sight a walkable greedy step wins; otherwise the head of the
/// cached path is used when it is adjacent to the bot.
#[must_use]
pub fn choose_step(
    grid: &TileGrid,
    from: CellCoord,
    target: CellCoord,
    path: &VecDeque<CellCoord>,
) -> Step {
    if has_line_of_sight(grid, from, target) {
        if let Some(cell) = greedy_step(from, target).filter(|cell| grid.is_walkable(*cell)) {
            return Step::Greedy(cell);
        }
    }

    match path.front() {
        Some(next) if next.manhattan_distance(from) == 1 && grid.is_walkable(*next) => {
            Step::Path(*next)
        }
        _ => Step::Idle,
    }
}

/// Drops the part of `path` the bot no longer needs after moving to `cell`.
///
/// Steps up to and including `cell` are removed when the bot landed on the
/// path; otherwise leading steps are removed until the head is adjacent.
pub fn trim_path(path: &mut VecDeque<CellCoord>, cell: CellCoord) {
    if let Some(index) = path.iter().position(|step| *step == cell) {
        let _ = path.drain(..=index);
        return;
    }
    while path
        .front()
        .is_some_and(|next| next.manhattan_distance(cell) != 1)
    {
        let _ = path.pop_front();
    }
}
