//! Bot entity and its cache snapshot.

use std::{
    collections::{BTreeSet, VecDeque},
    time::Duration,
};

use delve_core::{BotId, CellCoord, PlayerId, TacticalRole};

/// Enemy bot standing on one tile of an instance.
#[derive(Clone, Debug, PartialEq)]
pub struct Bot {
    pub(crate) id: BotId,
    pub(crate) cell: CellCoord,
    pub(crate) interpolation_target: CellCoord,
    pub(crate) health: u32,
    pub(crate) max_health: u32,
    pub(crate) role: TacticalRole,
    pub(crate) spawn_index: u32,
    pub(crate) last_move_at: Option<Duration>,
    pub(crate) path: VecDeque<CellCoord>,
    pub(crate) path_computed_at: Option<Duration>,
    pub(crate) tracked_player_cell: Option<CellCoord>,
    pub(crate) goal: Option<CellCoord>,
    pub(crate) stuck_turns: u32,
    pub(crate) path_queued: bool,
    pub(crate) damaged_by: BTreeSet<PlayerId>,
}

impl Bot {
    pub(crate) fn new(
        id: BotId,
        cell: CellCoord,
        health: u32,
        max_health: u32,
        role: TacticalRole,
        spawn_index: u32,
    ) -> Self {
        Self {
            id,
            cell,
            interpolation_target: cell,
            health,
            max_health,
            role,
            spawn_index,
            last_move_at: None,
            path: VecDeque::new(),
            path_computed_at: None,
            tracked_player_cell: None,
            goal: None,
            stuck_turns: 0,
            path_queued: false,
            damaged_by: BTreeSet::new(),
        }
    }

    /// Identifier of the bot.
    #[must_use]
    pub const fn id(&self) -> BotId {
        self.id
    }

    /// Tile the bot stands on.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Tile the bot is about to step onto; equals [`Bot::cell`] while idle.
    #[must_use]
    pub const fn interpolation_target(&self) -> CellCoord {
        self.interpolation_target
    }

    /// Remaining health.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Health the bot spawned with.
    #[must_use]
    pub const fn max_health(&self) -> u32 {
        self.max_health
    }

    /// Targeting behaviour.
    #[must_use]
    pub const fn role(&self) -> TacticalRole {
        self.role
    }

    /// Position of the bot in the instance's spawn sequence.
    #[must_use]
    pub const fn spawn_index(&self) -> u32 {
        self.spawn_index
    }

    /// Players that damaged the bot, in id order.
    #[must_use]
    pub fn damaged_by(&self) -> &BTreeSet<PlayerId> {
        &self.damaged_by
    }

    /// Tile the bot is currently heading for.
    #[must_use]
    pub const fn goal(&self) -> Option<CellCoord> {
        self.goal
    }

    /// Remaining steps of the cached path.
    #[must_use]
    pub fn path(&self) -> &VecDeque<CellCoord> {
        &self.path
    }

    /// Reports whether health reached zero.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.health == 0
    }

    /// Applies damage from `attacker`, remembering them for kill credit.
    ///
    /// Hits on a bot already at zero health still record the attacker, since
    /// deaths are resolved after every hit of a tick has landed. Returns
    /// `true` when this hit brought the bot to zero health.
    pub fn apply_damage(&mut self, amount: u32, attacker: PlayerId) -> bool {
        let was_alive = !self.is_dead();
        let _ = self.damaged_by.insert(attacker);
        self.health = self.health.saturating_sub(amount);
        was_alive && self.is_dead()
    }

    pub(crate) fn forget_path(&mut self) {
        self.path.clear();
        self.interpolation_target = self.cell;
    }

    /// Captures what survives in a player's map cache.
    #[must_use]
    pub fn snapshot(&self) -> BotSnapshot {
        BotSnapshot {
            cell: self.cell,
            health: self.health,
            max_health: self.max_health,
            role: self.role,
            spawn_index: self.spawn_index,
            target: self.goal,
        }
    }
}

/// Cached view of a bot used to restore an instance on return.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BotSnapshot {
    /// Tile the bot stood on.
    pub cell: CellCoord,
    /// Health at departure.
    pub health: u32,
    /// Health the bot spawned with.
    pub max_health: u32,
    /// Targeting behaviour.
    pub role: TacticalRole,
    /// Position in the spawn sequence.
    pub spawn_index: u32,
    /// Tile the bot was heading for.
    pub target: Option<CellCoord>,
}
