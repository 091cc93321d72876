//! Per-player duel state: hit points, cooldowns and gesture pipeline

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::util::time::SimClock;

use super::ability::{Ability, ComboTable, Sign};
use super::combo::ComboRecognizer;
use super::stabilizer::Stabilizer;

/// Slack when comparing cooldown deadlines, absorbs `dt` rounding
pub const COOLDOWN_EPSILON: f64 = 1e-6;

/// One of the two duelists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PlayerId {
    /// Left side of the frame, casts toward +x
    One,
    /// Right side of the frame, casts toward -x
    Two,
}

impl PlayerId {
    pub const ALL: [PlayerId; 2] = [PlayerId::One, PlayerId::Two];

    pub fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }

    /// Horizontal direction of this player's casts
    pub fn facing(self) -> f32 {
        match self {
            Self::One => 1.0,
            Self::Two => -1.0,
        }
    }
}

impl TryFrom<u8> for PlayerId {
    type Error = u8;

    fn try_from(number: u8) -> Result<Self, Self::Error> {
        match number {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            other => Err(other),
        }
    }
}

impl From<PlayerId> for u8 {
    fn from(id: PlayerId) -> Self {
        id.number()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.number())
    }
}

/// Rectangular input region of a player, in frame coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Roi {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Roi {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.w / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.h / 2.0
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    /// A region with a positive, finite area
    pub fn is_valid(&self) -> bool {
        [self.x, self.y, self.w, self.h].iter().all(|v| v.is_finite())
            && self.w > 0.0
            && self.h > 0.0
    }

    /// Default regions: two boxes near the left and right frame edges
    pub fn default_pair(frame_width: u32, frame_height: u32) -> [Roi; 2] {
        const BOX_W: u32 = 400;
        const BOX_H: u32 = 600;
        const MARGIN: u32 = 50;

        let y = frame_height.saturating_sub(BOX_H) / 2;
        let right_x = frame_width.saturating_sub(BOX_W + MARGIN);
        [
            Roi::new(MARGIN as f32, y as f32, BOX_W as f32, BOX_H as f32),
            Roi::new(right_x as f32, y as f32, BOX_W as f32, BOX_H as f32),
        ]
    }
}

/// Authoritative state of one player
#[derive(Debug, Clone)]
pub struct PlayerState {
    pub id: PlayerId,
    pub hp: u32,
    pub max_hp: u32,
    pub roi: Roi,
    /// Time spent playing; only advances through `tick`
    cooldown_clock: SimClock,
    /// Cooldown deadline per ability on `cooldown_clock`, indexed by `Ability::index`
    ready_at: [f64; Ability::COUNT],
    /// Latest raw (unstabilized) sign, for display
    pub current_sign: Option<Sign>,
    pub stabilizer: Stabilizer,
    pub recognizer: ComboRecognizer,

    // Stats
    pub casts: u32,
    pub damage_dealt: u32,
    pub damage_taken: u32,
}

impl PlayerState {
    pub fn new(id: PlayerId, roi: Roi, max_hp: u32, combos: Arc<ComboTable>) -> Self {
        Self {
            id,
            hp: max_hp,
            max_hp,
            roi,
            cooldown_clock: SimClock::new(),
            ready_at: [0.0; Ability::COUNT],
            current_sign: None,
            stabilizer: Stabilizer::default(),
            recognizer: ComboRecognizer::new(combos),
            casts: 0,
            damage_dealt: 0,
            damage_taken: 0,
        }
    }

    /// Run all cooldowns down by `dt` seconds
    pub fn tick(&mut self, dt: f32) {
        self.cooldown_clock.advance(dt);
    }

    pub fn can_cast(&self, ability: Ability) -> bool {
        self.cooldown_clock.now() + COOLDOWN_EPSILON >= self.ready_at[ability.index()]
    }

    /// Remaining cooldown in seconds, 0 when ready
    pub fn cooldown(&self, ability: Ability) -> f32 {
        if self.can_cast(ability) {
            return 0.0;
        }
        (self.ready_at[ability.index()] - self.cooldown_clock.now()) as f32
    }

    /// Callers check `can_cast` first
    pub fn start_cooldown(&mut self, ability: Ability) {
        self.ready_at[ability.index()] =
            self.cooldown_clock.now() + f64::from(ability.cooldown());
    }

    pub fn take_damage(&mut self, amount: u32) {
        self.hp = self.hp.saturating_sub(amount);
        self.damage_taken = self.damage_taken.saturating_add(amount);
    }

    pub fn is_defeated(&self) -> bool {
        self.hp == 0
    }

    /// Back to full health with no cooldowns and an empty gesture pipeline
    pub fn reset(&mut self) {
        self.hp = self.max_hp;
        self.cooldown_clock = SimClock::new();
        self.ready_at = [0.0; Ability::COUNT];
        self.current_sign = None;
        self.stabilizer.reset();
        self.recognizer.clear();
        self.casts = 0;
        self.damage_dealt = 0;
        self.damage_taken = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::time::tick_delta;

    fn player() -> PlayerState {
        let [roi, _] = Roi::default_pair(1280, 720);
        PlayerState::new(PlayerId::One, roi, 100, Arc::new(ComboTable::default()))
    }

    #[test]
    fn default_rois_match_frame_layout() {
        let [left, right] = Roi::default_pair(1280, 720);
        assert_eq!(left, Roi::new(50.0, 60.0, 400.0, 600.0));
        assert_eq!(right, Roi::new(830.0, 60.0, 400.0, 600.0));
        assert_eq!(left.center_x(), 250.0);
        assert_eq!(right.center_y(), 360.0);
    }

    #[test]
    fn cooldown_gates_and_decays() {
        let mut p = player();
        assert!(p.can_cast(Ability::Fireball));
        p.start_cooldown(Ability::Fireball);
        assert_eq!(p.cooldown(Ability::Fireball), 1.0);
        assert!(!p.can_cast(Ability::Fireball));
        assert!(p.can_cast(Ability::WaterBall));

        p.tick(0.5);
        assert!(!p.can_cast(Ability::Fireball));
        p.tick(0.75);
        assert_eq!(p.cooldown(Ability::Fireball), 0.0);
        assert!(p.can_cast(Ability::Fireball));
    }

    #[test]
    fn cooldowns_end_on_schedule_at_real_tick_rates() {
        for rate in [24, 30, 60, 144] {
            let dt = tick_delta(rate);
            for ability in Ability::ALL {
                let mut p = player();
                p.start_cooldown(ability);
                let ticks = (ability.cooldown() * rate as f32).round() as usize;

                for _ in 0..ticks - 1 {
                    p.tick(dt);
                }
                assert!(!p.can_cast(ability), "{ability:?} ready early at {rate} Hz");

                p.tick(dt);
                assert!(p.can_cast(ability), "{ability:?} late at {rate} Hz");
                assert_eq!(p.cooldown(ability), 0.0);
            }
        }
    }

    #[test]
    fn water_ball_has_its_own_cooldown_slot() {
        let mut p = player();
        p.start_cooldown(Ability::WaterBall);
        assert_eq!(p.cooldown(Ability::WaterBall), 1.0);
        p.tick(1.0);
        assert!(p.can_cast(Ability::WaterBall));
    }

    #[test]
    fn damage_saturates_at_zero() {
        let mut p = player();
        p.take_damage(25);
        assert_eq!(p.hp, 75);
        p.take_damage(500);
        assert_eq!(p.hp, 0);
        assert!(p.is_defeated());
    }

    #[test]
    fn reset_restores_full_state() {
        let mut p = player();
        p.take_damage(40);
        p.start_cooldown(Ability::HeavyAttack);
        p.current_sign = Some(Sign::from("dog"));
        p.reset();
        assert_eq!(p.hp, 100);
        assert!(Ability::ALL.iter().all(|a| p.can_cast(*a)));
        assert!(p.current_sign.is_none());
        assert!(p.recognizer.history().is_empty());
    }

    #[test]
    fn player_ids_parse_from_numbers() {
        assert_eq!(PlayerId::try_from(1), Ok(PlayerId::One));
        assert_eq!(PlayerId::try_from(2), Ok(PlayerId::Two));
        assert_eq!(PlayerId::try_from(3), Err(3));
        assert_eq!(PlayerId::One.opponent(), PlayerId::Two);
        assert!(!Roi::new(0.0, 0.0, 0.0, 10.0).is_valid());
    }
}
