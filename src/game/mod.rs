//! Duel simulation modules

pub mod ability;
pub mod combat;
pub mod combo;
pub mod cues;
pub mod r#match;
pub mod physics;
pub mod player;
pub mod runner;
pub mod snapshot;
pub mod stabilizer;

pub use ability::{Ability, ComboTable, Sign};
pub use player::{PlayerId, PlayerState, Roi};
pub use r#match::{DuelMatch, GameState};
pub use runner::{DuelHandle, DuelRunner};

use std::time::Instant;

use uuid::Uuid;

use crate::ws::protocol::ClientMsg;

/// Collaborator message received over WebSocket or HTTP
#[derive(Debug, Clone)]
pub struct DuelInput {
    pub connection_id: Uuid,
    pub msg: ClientMsg,
    pub received_at: Instant,
}

impl DuelInput {
    pub fn new(connection_id: Uuid, msg: ClientMsg) -> Self {
        Self {
            connection_id,
            msg,
            received_at: Instant::now(),
        }
    }
}

/// Reasons a collaborator command cannot be applied
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown player number {0}")]
    UnknownPlayer(u8),

    #[error("Unknown ability {0:?}")]
    UnknownAbility(String),

    #[error("Duel loop is not running")]
    LoopStopped,
}

pub fn parse_player(number: u8) -> Result<PlayerId, CommandError> {
    PlayerId::try_from(number).map_err(CommandError::UnknownPlayer)
}

pub fn parse_ability(name: &str) -> Result<Ability, CommandError> {
    Ability::parse(name).ok_or_else(|| CommandError::UnknownAbility(name.to_string()))
}

/// Check the ids a message refers to without applying it
pub fn validate_command(msg: &ClientMsg) -> Result<(), CommandError> {
    match msg {
        ClientMsg::Sign { player, .. } => parse_player(*player).map(|_| ()),
        ClientMsg::Cast { player, ability } => {
            parse_player(*player)?;
            parse_ability(ability).map(|_| ())
        }
        ClientMsg::Start | ClientMsg::Restart | ClientMsg::Abort | ClientMsg::Ping { .. } => Ok(()),
    }
}
