//! Debouncing of raw per-frame sign classifications

use tracing::trace;

use super::ability::Sign;

/// How long a raw sign must be observed without interruption (seconds)
pub const STABILIZATION_WINDOW: f64 = 0.2;

/// A sign that has been observed long enough to be trusted
#[derive(Debug, Clone, PartialEq)]
pub struct StabilizedSign {
    pub sign: Sign,
    /// Simulation time at which the sign became confident
    pub at: f64,
}

/// Edge-triggered debouncer for one player's raw classifier output.
///
/// A sign is emitted once it has been seen continuously for the
/// stabilization window, and only if it differs from the last emitted sign.
/// Observing no sign clears both the candidate and the lock.
#[derive(Debug, Clone)]
pub struct Stabilizer {
    window: f64,
    /// Sign currently being timed and when timing started
    candidate: Option<(Sign, f64)>,
    /// Last emitted sign
    locked: Option<Sign>,
}

impl Stabilizer {
    pub fn new(window: f64) -> Self {
        Self {
            window,
            candidate: None,
            locked: None,
        }
    }

    /// Feed one raw observation taken at simulation time `now`
    pub fn observe(&mut self, raw: Option<&Sign>, now: f64) -> Option<StabilizedSign> {
        let Some(sign) = raw else {
            self.reset();
            return None;
        };

        match &self.candidate {
            Some((candidate, since)) if candidate == sign => {
                if now - since >= self.window && self.locked.as_ref() != Some(sign) {
                    self.locked = Some(sign.clone());
                    return Some(StabilizedSign {
                        sign: sign.clone(),
                        at: now,
                    });
                }
            }
            _ => {
                trace!(sign = %sign, "Tracking new candidate sign");
                self.candidate = Some((sign.clone(), now));
            }
        }

        None
    }

    /// Last emitted sign, if still held
    pub fn locked(&self) -> Option<&Sign> {
        self.locked.as_ref()
    }

    pub fn reset(&mut self) {
        self.candidate = None;
        self.locked = None;
    }
}

impl Default for Stabilizer {
    fn default() -> Self {
        Self::new(STABILIZATION_WINDOW)
    }
}
