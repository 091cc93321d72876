//! Presentation cues derived from duel events
//!
//! Audio and visual-effect layers subscribe to cues instead of hooking into
//! casting; nothing here feeds back into the simulation.

use crate::ws::protocol::{Cue, GameEvent};

use super::ability::Ability;
use super::r#match::GameState;

/// Maps duel events to the cues presentation layers react to
#[derive(Debug, Default)]
pub struct CueDispatcher {
    music_playing: bool,
}

impl CueDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cue emitted when `ability` is cast
    pub fn cast_cue(ability: Ability) -> Cue {
        match ability {
            Ability::Fireball => Cue::FireSound,
            Ability::WaterBall => Cue::WaterSound,
            Ability::HeavyAttack => Cue::HeavySound,
            Ability::Wall => Cue::EarthSound,
        }
    }

    /// Cues for one event; background music only toggles on real changes
    pub fn dispatch(&mut self, event: &GameEvent) -> Option<Cue> {
        match event {
            GameEvent::AbilityCast { ability, .. } => Some(Self::cast_cue(*ability)),
            GameEvent::StateChanged { to: GameState::Playing, .. } if !self.music_playing => {
                self.music_playing = true;
                Some(Cue::MusicStart)
            }
            GameEvent::StateChanged {
                to: GameState::Start | GameState::GameOver,
                ..
            } if self.music_playing => {
                self.music_playing = false;
                Some(Cue::MusicStop)
            }
            _ => None,
        }
    }

    pub fn dispatch_all(&mut self, events: &[GameEvent]) -> Vec<Cue> {
        events.iter().filter_map(|e| self.dispatch(e)).collect()
    }
}
