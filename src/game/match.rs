//! Duel state machine: gesture routing, casting and win detection

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::DuelSettings;
use crate::util::time::SimClock;
use crate::ws::protocol::GameEvent;

use super::ability::{Ability, Sign};
use super::combat::{CombatSystem, WALL_WIDTH};
use super::player::{PlayerId, PlayerState};

/// Horizontal distance between the cast point and a new wall
pub const WALL_FORWARD_OFFSET: f32 = 50.0;
/// How far above the cast point a new wall's top edge sits
pub const WALL_RAISE: f32 = 75.0;

/// Match lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    /// Waiting for the start command
    Start,
    /// Duel in progress
    Playing,
    /// A player ran out of hit points
    GameOver,
}

/// The authoritative duel.
///
/// Everything is driven by explicit calls: `process_gesture` for each player
/// and then `update(dt)` once per tick. Side effects for presentation layers
/// are queued as events and collected with `take_events`.
#[derive(Debug)]
pub struct DuelMatch {
    state: GameState,
    players: [PlayerState; 2],
    combat: CombatSystem,
    winner: Option<PlayerId>,
    clock: SimClock,
    tick: u64,
    events: Vec<GameEvent>,
}

impl DuelMatch {
    pub fn new(settings: &DuelSettings) -> Self {
        let [left, right] = settings.rois;
        Self {
            state: GameState::Start,
            players: [
                PlayerState::new(PlayerId::One, left, settings.max_hp, settings.combos.clone()),
                PlayerState::new(PlayerId::Two, right, settings.max_hp, settings.combos.clone()),
            ],
            combat: CombatSystem::new(),
            winner: None,
            clock: SimClock::new(),
            tick: 0,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    pub fn player(&self, id: PlayerId) -> &PlayerState {
        &self.players[id.index()]
    }

    pub fn player_mut(&mut self, id: PlayerId) -> &mut PlayerState {
        &mut self.players[id.index()]
    }

    pub fn players(&self) -> &[PlayerState; 2] {
        &self.players
    }

    pub fn combat(&self) -> &CombatSystem {
        &self.combat
    }

    /// Simulation time in seconds
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Advance the simulation by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.clock.advance(dt);
        self.tick += 1;

        if self.state != GameState::Playing {
            return;
        }

        for player in self.players.iter_mut() {
            player.tick(dt);
        }

        let events = self.combat.step(dt, self.clock.now(), &mut self.players);
        self.events.extend(events);

        self.check_win_condition();
    }

    /// Player one is checked first, so a double knockout goes to player two
    fn check_win_condition(&mut self) {
        let winner = if self.players[0].is_defeated() {
            PlayerId::Two
        } else if self.players[1].is_defeated() {
            PlayerId::One
        } else {
            return;
        };

        self.winner = Some(winner);
        info!(winner = %winner, tick = self.tick, "Duel won");
        self.set_state(GameState::GameOver);
    }

    /// Feed one raw classifier result for a player.
    ///
    /// Ignored outside `Playing`. A completed combo is cast immediately and
    /// the player's history is cleared whether or not the cast succeeds.
    pub fn process_gesture(&mut self, id: PlayerId, raw: Option<Sign>) {
        if self.state != GameState::Playing {
            return;
        }

        let now = self.clock.now();
        let player = &mut self.players[id.index()];
        let stabilized = player.stabilizer.observe(raw.as_ref(), now);
        player.current_sign = raw;

        let Some(stabilized) = stabilized else {
            return;
        };
        debug!(player = %id, sign = %stabilized.sign, "Sign stabilized");

        if let Some(ability) = player.recognizer.add(stabilized) {
            self.request_cast(id, ability);
        }
    }

    /// Cast requested outside gesture recognition (keyboard, debug tools).
    /// Only honoured while playing, and still subject to cooldowns.
    pub fn manual_cast(&mut self, id: PlayerId, ability: Ability) -> bool {
        if self.state != GameState::Playing {
            return false;
        }
        self.request_cast(id, ability)
    }

    /// Cast `ability` for a player if it is off cooldown.
    ///
    /// Projectiles start at the caster's region edge facing the opponent, at
    /// its vertical center. Walls stand a little further forward and raised
    /// so they straddle that line.
    pub fn request_cast(&mut self, id: PlayerId, ability: Ability) -> bool {
        let now = self.clock.now();
        let player = &mut self.players[id.index()];

        if !player.can_cast(ability) {
            debug!(player = %id, ability = ?ability, "Cast dropped, on cooldown");
            return false;
        }

        if !player.roi.is_valid() {
            warn!(player = %id, ability = ?ability, roi = ?player.roi, "Cast dropped, no valid spawn region");
            return false;
        }

        let roi = player.roi;
        let spawn_x = match id {
            PlayerId::One => roi.right(),
            PlayerId::Two => roi.x,
        };
        let spawn_y = roi.center_y();
        let direction = id.facing();

        player.start_cooldown(ability);
        player.casts += 1;

        if ability.is_projectile() {
            self.combat
                .spawn_projectile(spawn_x, spawn_y, direction, ability, id);
        } else {
            let mut wall_x = spawn_x + WALL_FORWARD_OFFSET * direction;
            if id == PlayerId::Two {
                wall_x -= WALL_WIDTH;
            }
            self.combat.spawn_wall(wall_x, spawn_y - WALL_RAISE, id, now);
        }

        info!(player = %id, ability = ?ability, x = spawn_x, y = spawn_y, "Ability cast");
        self.events.push(GameEvent::AbilityCast {
            player: id,
            ability,
        });
        true
    }

    /// Begin a fresh round from any state
    pub fn start_game(&mut self) {
        for player in self.players.iter_mut() {
            player.reset();
        }
        self.combat.clear();
        self.winner = None;
        self.set_state(GameState::Playing);
    }

    /// Abort back to the start screen, keeping hit points and cooldowns
    pub fn reset_to_start(&mut self) {
        self.set_state(GameState::Start);
    }

    fn set_state(&mut self, next: GameState) {
        if self.state == next {
            return;
        }
        info!(from = ?self.state, to = ?next, "Duel state changed");
        self.events.push(GameEvent::StateChanged {
            from: self.state,
            to: next,
        });
        self.state = next;
    }

    /// Drain events queued since the last call
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::player::Roi;

    fn playing() -> DuelMatch {
        let mut duel = DuelMatch::new(&DuelSettings::default());
        duel.start_game();
        duel.take_events();
        duel
    }

    /// Hold a raw sign long enough to stabilize (0.25 s in 0.0625 s frames)
    fn show(duel: &mut DuelMatch, id: PlayerId, sign: &str) {
        for _ in 0..5 {
            duel.process_gesture(id, Some(Sign::from(sign)));
            duel.update(0.0625);
        }
    }

    #[test]
    fn starts_in_start_state_and_ignores_gestures() {
        let mut duel = DuelMatch::new(&DuelSettings::default());
        assert_eq!(duel.state(), GameState::Start);
        show(&mut duel, PlayerId::One, "snake");
        show(&mut duel, PlayerId::One, "ram");
        assert!(duel.combat().projectiles().is_empty());
        assert!(duel.player(PlayerId::One).current_sign.is_none());
    }

    #[test]
    fn start_game_emits_state_change_once() {
        let mut duel = DuelMatch::new(&DuelSettings::default());
        duel.start_game();
        duel.start_game();
        let events = duel.take_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            GameEvent::StateChanged {
                from: GameState::Start,
                to: GameState::Playing
            }
        ));
    }

    #[test]
    fn gesture_combo_casts_fireball() {
        let mut duel = playing();
        show(&mut duel, PlayerId::One, "snake");
        show(&mut duel, PlayerId::One, "ram");

        let events = duel.take_events();
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::AbilityCast {
                player: PlayerId::One,
                ability: Ability::Fireball
            }
        )));
        assert!(!duel.player(PlayerId::One).can_cast(Ability::Fireball));
        assert!(duel.player(PlayerId::One).recognizer.history().is_empty());
        assert_eq!(duel.combat().projectiles().len(), 1);
    }

    #[test]
    fn projectile_spawns_at_facing_edge() {
        let mut duel = playing();
        assert!(duel.request_cast(PlayerId::One, Ability::Fireball));
        assert!(duel.request_cast(PlayerId::Two, Ability::HeavyAttack));

        let projectiles = duel.combat().projectiles();
        assert_eq!((projectiles[0].x, projectiles[0].y), (450.0, 360.0));
        assert_eq!(projectiles[0].direction, 1.0);
        assert_eq!((projectiles[1].x, projectiles[1].y), (830.0, 360.0));
        assert_eq!(projectiles[1].direction, -1.0);
    }

    #[test]
    fn walls_spawn_ahead_of_caster() {
        let mut duel = playing();
        assert!(duel.request_cast(PlayerId::One, Ability::Wall));
        assert!(duel.request_cast(PlayerId::Two, Ability::Wall));

        let walls = duel.combat().walls();
        assert_eq!((walls[0].x, walls[0].y), (500.0, 285.0));
        assert_eq!((walls[1].x, walls[1].y), (740.0, 285.0));
    }

    #[test]
    fn cast_on_cooldown_is_dropped_silently() {
        let mut duel = playing();
        assert!(duel.request_cast(PlayerId::One, Ability::Fireball));
        duel.take_events();
        assert!(!duel.request_cast(PlayerId::One, Ability::Fireball));
        assert!(duel.take_events().is_empty());
        assert_eq!(duel.combat().projectiles().len(), 1);
    }

    #[test]
    fn invalid_region_drops_cast_without_cooldown() {
        let mut duel = playing();
        duel.player_mut(PlayerId::One).roi = Roi::new(0.0, 0.0, 0.0, 0.0);
        assert!(!duel.request_cast(PlayerId::One, Ability::Fireball));
        assert!(duel.player(PlayerId::One).can_cast(Ability::Fireball));
        assert!(duel.take_events().is_empty());
    }

    #[test]
    fn manual_cast_requires_playing() {
        let mut duel = DuelMatch::new(&DuelSettings::default());
        assert!(!duel.manual_cast(PlayerId::One, Ability::Fireball));
        duel.start_game();
        assert!(duel.manual_cast(PlayerId::One, Ability::Fireball));
    }

    #[test]
    fn simultaneous_knockout_goes_to_player_two() {
        let mut duel = playing();
        duel.player_mut(PlayerId::One).take_damage(100);
        duel.player_mut(PlayerId::Two).take_damage(100);
        duel.update(0.0625);
        assert_eq!(duel.state(), GameState::GameOver);
        assert_eq!(duel.winner(), Some(PlayerId::Two));
    }

    #[test]
    fn reset_to_start_keeps_hit_points() {
        let mut duel = playing();
        duel.player_mut(PlayerId::Two).take_damage(30);
        duel.reset_to_start();
        assert_eq!(duel.state(), GameState::Start);
        assert_eq!(duel.player(PlayerId::Two).hp, 70);
    }

    #[test]
    fn update_outside_playing_only_advances_clock() {
        let mut duel = DuelMatch::new(&DuelSettings::default());
        duel.player_mut(PlayerId::One).start_cooldown(Ability::Wall);
        duel.update(0.5);
        assert_eq!(duel.now(), 0.5);
        assert_eq!(duel.player(PlayerId::One).cooldown(Ability::Wall), 3.0);
    }
}
