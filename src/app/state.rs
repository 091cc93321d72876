//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::DuelHandle;
use crate::util::rate_limit::{create_limiter, Limiter, COMMAND_RATE_LIMIT};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub duel: DuelHandle,
    pub command_limiter: Arc<Limiter>,
}

impl AppState {
    pub fn new(config: Config, duel: DuelHandle) -> Self {
        Self {
            config: Arc::new(config),
            duel,
            command_limiter: create_limiter(COMMAND_RATE_LIMIT),
        }
    }
}
