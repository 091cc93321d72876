//! Snapshot building for renderers and other read-only consumers

use crate::ws::protocol::{CooldownView, DuelSnapshot, PlayerSnapshot, ProjectileView, WallView};

use super::ability::Ability;
use super::player::PlayerState;
use super::r#match::DuelMatch;

/// Decides when to publish snapshots and builds them
pub struct SnapshotBuilder {
    /// Tick counter since last snapshot
    ticks_since_snapshot: u32,
    /// Snapshot interval in ticks
    snapshot_interval: u32,
}

impl SnapshotBuilder {
    pub fn new(snapshot_interval: u32) -> Self {
        Self {
            ticks_since_snapshot: 0,
            snapshot_interval: snapshot_interval.max(1),
        }
    }

    /// Interval that publishes `snapshot_rate` times per second at `tick_rate`
    pub fn for_rates(tick_rate: u32, snapshot_rate: u32) -> Self {
        Self::new(tick_rate / snapshot_rate.max(1))
    }

    /// Check if it's time to send a snapshot
    pub fn should_send(&mut self) -> bool {
        self.ticks_since_snapshot += 1;
        if self.ticks_since_snapshot >= self.snapshot_interval {
            self.ticks_since_snapshot = 0;
            true
        } else {
            false
        }
    }

    /// Force snapshot on next check (used for state transitions)
    pub fn force_next(&mut self) {
        self.ticks_since_snapshot = self.snapshot_interval;
    }

    /// Build a snapshot of the duel as it stands
    pub fn build(duel: &DuelMatch) -> DuelSnapshot {
        let now = duel.now();

        let players = duel.players().iter().map(player_snapshot).collect();

        let projectiles = duel
            .combat()
            .projectiles()
            .iter()
            .map(|p| ProjectileView {
                id: p.id,
                kind: p.kind,
                owner: p.owner,
                x: p.x,
                y: p.y,
            })
            .collect();

        let walls = duel
            .combat()
            .walls()
            .iter()
            .map(|w| WallView {
                id: w.id,
                owner: w.owner,
                x: w.x,
                y: w.y,
                width: w.width,
                height: w.height,
                remaining: w.remaining(now),
            })
            .collect();

        DuelSnapshot {
            tick: duel.tick(),
            time: now,
            state: duel.state(),
            winner: duel.winner(),
            players,
            projectiles,
            walls,
        }
    }
}

fn player_snapshot(p: &PlayerState) -> PlayerSnapshot {
    PlayerSnapshot {
        id: p.id,
        hp: p.hp,
        max_hp: p.max_hp,
        cooldowns: Ability::ALL
            .iter()
            .map(|a| CooldownView {
                ability: *a,
                remaining: p.cooldown(*a),
            })
            .collect(),
        current_sign: p.current_sign.clone(),
        roi: p.roi,
        casts: p.casts,
        damage_dealt: p.damage_dealt,
        damage_taken: p.damage_taken,
    }
}
