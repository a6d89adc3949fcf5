use delve_core::PlayerId;
use thiserror::Error;

/// Reasons a command is rejected by the room.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum RoomError {
    /// The command names a player that never joined or already left.
    #[error("player {} is not in the room", .0.get())]
    UnknownPlayer(PlayerId),
    /// The session layer announced a player twice.
    #[error("player {} already joined the room", .0.get())]
    DuplicatePlayer(PlayerId),
    /// Backward travel to a depth without a recorded seed.
    #[error("no seed on record for depth {depth} of player {}", .player.get())]
    MissingSeed {
        /// Player attempting the transition.
        player: PlayerId,
        /// Depth the player tried to return to.
        depth: u32,
    },
    /// The player is dead or finished the run.
    #[error("player {} can no longer act", .0.get())]
    PlayerInactive(PlayerId),
}
