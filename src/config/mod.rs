//! Configuration module - environment variable parsing and duel settings

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::game::ability::{Ability, ComboTable};
use crate::game::player::Roi;
use crate::util::time::{DEFAULT_SNAPSHOT_RATE, DEFAULT_TICK_RATE};

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Allowed client origins for CORS (comma-separated)
    pub client_origin: String,
    /// Simulation and gameplay settings
    pub duel: DuelSettings,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("127.0.0.1:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string())
        };

        let frame_width = parse_var("FRAME_WIDTH", 1280)?;
        let frame_height = parse_var("FRAME_HEIGHT", 720)?;

        let duel = DuelSettings {
            max_hp: parse_var("MAX_HP", 100)?,
            tick_rate: parse_var("TICK_RATE", DEFAULT_TICK_RATE)?,
            snapshot_rate: parse_var("SNAPSHOT_RATE", DEFAULT_SNAPSHOT_RATE)?,
            sign_stale_after: Duration::from_millis(parse_var("SIGN_STALE_MS", 250)?),
            frame_width,
            frame_height,
            rois: Roi::default_pair(frame_width, frame_height),
            combos: Arc::new(ComboTable::default()),
        };
        duel.validate()?;

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            client_origin: env::var("CLIENT_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),

            duel,
        })
    }
}

/// Parse an optional numeric variable, falling back to `default` when unset
fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Gameplay settings shared by the duel and its driver
#[derive(Clone, Debug)]
pub struct DuelSettings {
    /// Starting and maximum hit points
    pub max_hp: u32,
    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Snapshots broadcast per second
    pub snapshot_rate: u32,
    /// A reported sign older than this counts as "no sign"
    pub sign_stale_after: Duration,
    pub frame_width: u32,
    pub frame_height: u32,
    /// Input regions of player one and player two
    pub rois: [Roi; 2],
    pub combos: Arc<ComboTable>,
}

impl DuelSettings {
    /// Reject settings the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_hp == 0 {
            return Err(ConfigError::ZeroMaxHp);
        }
        if self.tick_rate == 0 {
            return Err(ConfigError::ZeroRate("TICK_RATE"));
        }
        if self.snapshot_rate == 0 {
            return Err(ConfigError::ZeroRate("SNAPSHOT_RATE"));
        }

        let [left, right] = self.rois;
        let bottom = left.y.max(right.y) + left.h.max(right.h);
        if !left.is_valid()
            || !right.is_valid()
            || left.right() > right.x
            || bottom > self.frame_height as f32
        {
            return Err(ConfigError::FrameTooSmall {
                width: self.frame_width,
                height: self.frame_height,
            });
        }

        if let Some(ability) = Ability::ALL
            .into_iter()
            .find(|a| self.combos.combo_for(*a).is_none())
        {
            return Err(ConfigError::MissingCombo(ability));
        }

        Ok(())
    }
}

impl Default for DuelSettings {
    fn default() -> Self {
        Self {
            max_hp: 100,
            tick_rate: DEFAULT_TICK_RATE,
            snapshot_rate: DEFAULT_SNAPSHOT_RATE,
            sign_stale_after: Duration::from_millis(250),
            frame_width: 1280,
            frame_height: 720,
            rois: Roi::default_pair(1280, 720),
            combos: Arc::new(ComboTable::default()),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1:?}")]
    Invalid(&'static str, String),

    #[error("Invalid server address format")]
    InvalidAddress,

    #[error("MAX_HP must be greater than zero")]
    ZeroMaxHp,

    #[error("{0} must be greater than zero")]
    ZeroRate(&'static str),

    #[error("Frame {width}x{height} is too small for two player regions")]
    FrameTooSmall { width: u32, height: u32 },

    #[error("Combo for {0:?} is empty")]
    EmptyCombo(Ability),

    #[error("{0:?} and {1:?} share the same combo")]
    DuplicateCombo(Ability, Ability),

    #[error("No combo registered for {0:?}")]
    MissingCombo(Ability),
}
