//! WebSocket protocol message definitions
//! These are the wire types between the duel server and its collaborators
//! (classifier bridge, keyboard bridge, renderer, audio)

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::ability::{Ability, Sign};
use crate::game::player::{PlayerId, Roi};
use crate::game::r#match::GameState;

/// Messages sent from collaborators to the server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Latest classifier output for one player's region
    Sign {
        /// Player number (1 or 2)
        player: u8,
        /// Detected label, or null when nothing was detected
        sign: Option<String>,
    },

    /// Start the duel from the start screen
    Start,

    /// Start a new duel after game over
    Restart,

    /// Return to the start screen
    Abort,

    /// Cast an ability directly, bypassing gesture recognition
    Cast {
        /// Player number (1 or 2)
        player: u8,
        /// Ability name, e.g. "fireball"
        ability: String,
    },

    /// Ping for latency measurement
    Ping {
        /// Client timestamp
        t: u64,
    },
}

/// Messages sent from server to collaborators
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Welcome message after connection
    Welcome {
        connection_id: Uuid,
        server_time: u64,
    },

    /// Duel state after a tick (sent at the snapshot rate)
    Snapshot(DuelSnapshot),

    /// Events produced during one tick
    Events {
        tick: u64,
        events: Vec<GameEvent>,
    },

    /// Presentation cue for audio/VFX layers
    Cue {
        cue: Cue,
    },

    /// Error message
    Error {
        code: String,
        message: String,
    },

    /// Pong response
    Pong {
        /// Echo back client timestamp
        t: u64,
    },
}

/// Immutable view of the duel published after a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuelSnapshot {
    /// Ticks simulated since startup
    pub tick: u64,
    /// Simulation time in seconds
    pub time: f64,
    pub state: GameState,
    pub winner: Option<PlayerId>,
    pub players: Vec<PlayerSnapshot>,
    pub projectiles: Vec<ProjectileView>,
    pub walls: Vec<WallView>,
}

/// Player state in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub hp: u32,
    pub max_hp: u32,
    /// Remaining cooldown for every ability (0 = ready)
    pub cooldowns: Vec<CooldownView>,
    /// Latest raw sign shown by the player
    pub current_sign: Option<Sign>,
    pub roi: Roi,
    pub casts: u32,
    pub damage_dealt: u32,
    pub damage_taken: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CooldownView {
    pub ability: Ability,
    pub remaining: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileView {
    pub id: u64,
    pub kind: Ability,
    pub owner: PlayerId,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallView {
    pub id: u64,
    pub owner: PlayerId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Seconds until the wall expires
    pub remaining: f64,
}

/// Game events (casts, blocks, hits, state changes)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum GameEvent {
    /// An ability was successfully cast
    AbilityCast {
        player: PlayerId,
        ability: Ability,
    },

    /// Match lifecycle transition
    StateChanged {
        from: GameState,
        to: GameState,
    },

    /// A fireball and a water ball cancelled each other
    ProjectilesClashed {
        first: u64,
        second: u64,
        x: f32,
        y: f32,
    },

    /// A wall absorbed a projectile and fell
    WallBlocked {
        projectile: u64,
        wall: u64,
        owner: PlayerId,
    },

    /// A wall ran out of time
    WallExpired {
        wall: u64,
        owner: PlayerId,
    },

    /// A projectile hit a player
    PlayerHit {
        attacker: PlayerId,
        target: PlayerId,
        ability: Ability,
        damage: u32,
        /// Target hit points after the hit
        hp: u32,
    },
}

/// Cues for the audio and visual-effect layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    FireSound,
    WaterSound,
    HeavySound,
    EarthSound,
    MusicStart,
    MusicStop,
}
