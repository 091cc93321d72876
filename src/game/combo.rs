//! Time-windowed sign history and combo recognition

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::debug;

use super::ability::{Ability, ComboTable, Sign};
use super::stabilizer::StabilizedSign;

/// Maximum number of signs kept in a player's history
pub const HISTORY_MAX_LEN: usize = 5;
/// Maximum age of a sign in the history (seconds)
pub const HISTORY_WINDOW: f64 = 1.5;

/// Bounded, time-windowed sequence of stabilized signs.
///
/// After every mutation all entries satisfy `now - at <= window` and the
/// length never exceeds `max_len`.
#[derive(Debug, Clone)]
pub struct InputHistory {
    entries: VecDeque<(Sign, f64)>,
    max_len: usize,
    window: f64,
}

impl InputHistory {
    pub fn new(max_len: usize, window: f64) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_len + 1),
            max_len,
            window,
        }
    }

    /// Append a sign observed at `at`, then enforce the age and length bounds
    pub fn push(&mut self, sign: Sign, at: f64) {
        self.entries.push_back((sign, at));
        self.prune(at);
        while self.entries.len() > self.max_len {
            self.entries.pop_front();
        }
    }

    /// Drop entries older than the window relative to `now`
    pub fn prune(&mut self, now: f64) {
        self.entries.retain(|(_, at)| now - at <= self.window);
    }

    /// Signs still inside the window at `now`, oldest first
    pub fn sequence(&mut self, now: f64) -> Vec<Sign> {
        self.prune(now);
        self.entries.iter().map(|(sign, _)| sign.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for InputHistory {
    fn default() -> Self {
        Self::new(HISTORY_MAX_LEN, HISTORY_WINDOW)
    }
}

/// Matches the tail of a player's sign history against the combo table
#[derive(Debug, Clone)]
pub struct ComboRecognizer {
    history: InputHistory,
    combos: Arc<ComboTable>,
}

impl ComboRecognizer {
    /// History holds at least the longest combo, so every combo stays reachable
    pub fn new(combos: Arc<ComboTable>) -> Self {
        Self {
            history: InputHistory::new(HISTORY_MAX_LEN.max(combos.max_len()), HISTORY_WINDOW),
            combos,
        }
    }

    /// Record a stabilized sign and return the ability it completes, if any.
    ///
    /// A match consumes the whole history.
    pub fn add(&mut self, stabilized: StabilizedSign) -> Option<Ability> {
        let now = stabilized.at;
        self.history.push(stabilized.sign, now);

        let sequence = self.history.sequence(now);
        let ability = self.combos.match_suffix(&sequence)?;

        debug!(ability = ?ability, sequence = ?sequence, "Combo matched");
        self.history.clear();
        Some(ability)
    }

    /// Current sequence, pruned to the window at `now`
    pub fn current_sequence(&mut self, now: f64) -> Vec<Sign> {
        self.history.sequence(now)
    }

    pub fn history(&self) -> &InputHistory {
        &self.history
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}
