#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Delve simulation.
//!
//! This crate defines the message surface that connects the transport layer,
//! the authoritative room, and the pure systems. The session layer submits
//! [`Command`] values describing player intent, the room executes those
//! commands via its `apply` entry point, and then emits [`Event`] values for
//! the transport layer to broadcast. Everything needed to regenerate a map on
//! an independent implementation travels as a [`Seed`] plus dimensions and
//! depth; the grid itself is never sent.

mod dungeon;
mod entities;
mod grid;
mod rng;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use dungeon::{DungeonData, DungeonLayout, Room, SpawnZone};
pub use entities::{Bullet, GameOutcome, MapKey, Player, Point, TacticalRole};
pub use grid::{CellCoord, Direction, Tile, TileGrid};
pub use rng::{Lcg, Seed};

/// Commands that express all permissible room mutations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Adds a player session to the room at depth zero.
    AddPlayer {
        /// Session identifier supplied by the transport layer.
        player: PlayerId,
    },
    /// Removes a player session from the room.
    RemovePlayer {
        /// Session identifier of the departing player.
        player: PlayerId,
    },
    /// Requests that a player step one tile in the provided direction.
    ///
    /// Stepping onto a portal or transport tile triggers the matching
    /// transition implicitly.
    Move {
        /// Identifier of the moving player.
        player: PlayerId,
        /// Direction of travel for the attempted step.
        direction: Direction,
    },
    /// Updates the aim angle a player reports for presentation.
    UpdateAngle {
        /// Identifier of the aiming player.
        player: PlayerId,
        /// Aim angle in radians.
        angle: f32,
    },
    /// Requests that a player fire a bullet along the provided angle.
    Shoot {
        /// Identifier of the shooting player.
        player: PlayerId,
        /// Firing angle in radians.
        angle: f32,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
}

/// Events emitted by the room after processing commands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Announces that a player now inhabits a different map.
    MapChanged {
        /// Player whose map changed.
        player: PlayerId,
        /// Depth of the map the player arrived on.
        new_depth: u32,
        /// Seed that regenerates the map the player arrived on.
        new_seed: Seed,
        /// Entry portal of the new map, absent on the home map.
        entry_portal: Option<CellCoord>,
        /// Exit portal of the new map.
        exit_portal: CellCoord,
        /// Tile the player was placed on.
        position: CellCoord,
    },
    /// Reports that a bot collided with a player.
    PlayerHit {
        /// Player that lost a life.
        player: PlayerId,
        /// Lives the player has left after the hit.
        lives_remaining: u32,
    },
    /// Reports that a bot died and how the kill was credited.
    BotKilled {
        /// Identifier of the bot that died.
        bot_id: BotId,
        /// Players that damaged the bot, in ascending identifier order.
        credited_players: Vec<PlayerId>,
        /// Fraction of one kill credited to each listed player.
        credit_per_player: f64,
    },
    /// Confirms that a bot entered a map instance.
    BotSpawned {
        /// Identifier allocated to the bot.
        bot_id: BotId,
        /// Map instance the bot lives on.
        map: MapKey,
        /// Tile the bot occupies.
        cell: CellCoord,
        /// Targeting behaviour assigned to the bot.
        role: TacticalRole,
    },
    /// Announces that a transport pad was discovered and is now usable.
    TransportActivated {
        /// Map instance owning the pad.
        map: MapKey,
        /// Tile of the pad.
        cell: CellCoord,
    },
    /// Reports that a player travelled between two active transport pads.
    PlayerTeleported {
        /// Player that travelled.
        player: PlayerId,
        /// Pad the player stepped on.
        from: CellCoord,
        /// Pad the player arrived at.
        to: CellCoord,
    },
    /// Announces that a player's run ended.
    GameCompleted {
        /// Player whose run ended.
        player: PlayerId,
        /// Depth the run ended on.
        depth: u32,
        /// Final score of the player.
        score: f64,
        /// How the run ended.
        outcome: GameOutcome,
    },
}

/// Session identifier assigned to a player by the transport layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(u64);

impl PlayerId {
    /// Creates a new player identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Unique identifier assigned to a bot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BotId(u32);

impl BotId {
    /// Creates a new bot identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a bullet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BulletId(u32);

impl BulletId {
    /// Creates a new bullet identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}
