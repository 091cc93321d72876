//! Combat system - projectiles, walls, blocking and damage

use serde::Serialize;
use tracing::debug;

use crate::ws::protocol::GameEvent;

use super::ability::Ability;
use super::physics::PhysicsSystem;
use super::player::{PlayerId, PlayerState};

/// Collision radius shared by all projectiles
pub const PROJECTILE_RADIUS: f32 = 20.0;
/// How long a wall stands before expiring (seconds)
pub const WALL_DURATION: f64 = 2.0;
pub const WALL_WIDTH: f32 = 40.0;
pub const WALL_HEIGHT: f32 = 150.0;

/// Stable identifier of an arena entity, unique within a round
pub type EntityId = u64;

/// Projectile stats per ability
#[derive(Debug, Clone, Copy)]
pub struct ProjectileStats {
    pub speed: f32,
    pub damage: u32,
}

impl ProjectileStats {
    /// `None` for abilities that do not fire a projectile
    pub fn for_ability(ability: Ability) -> Option<Self> {
        match ability {
            Ability::Fireball => Some(Self {
                speed: 600.0,
                damage: 10,
            }),
            Ability::HeavyAttack => Some(Self {
                speed: 400.0,
                damage: 25,
            }),
            Ability::WaterBall => Some(Self {
                speed: 600.0,
                damage: 10,
            }),
            Ability::Wall => None,
        }
    }
}

/// Active projectile in the arena
#[derive(Debug, Clone, Serialize)]
pub struct Projectile {
    pub id: EntityId,
    pub owner: PlayerId,
    pub kind: Ability,
    pub x: f32,
    pub y: f32,
    /// +1.0 moves right, -1.0 moves left
    pub direction: f32,
    pub speed: f32,
    pub damage: u32,
    pub radius: f32,
    pub active: bool,
}

impl Projectile {
    /// Move along x; deactivates once outside the arena
    pub fn update(&mut self, dt: f32) {
        self.x = PhysicsSystem::advance(self.x, self.direction, self.speed, dt);
        if PhysicsSystem::out_of_bounds(self.x) {
            self.active = false;
        }
    }

    /// Fireballs and water balls cancel each other
    pub fn cancels(&self, other: &Projectile) -> bool {
        matches!(
            (self.kind, other.kind),
            (Ability::Fireball, Ability::WaterBall) | (Ability::WaterBall, Ability::Fireball)
        )
    }
}

/// Barrier that absorbs a single enemy projectile
#[derive(Debug, Clone, Serialize)]
pub struct Wall {
    pub id: EntityId,
    pub owner: PlayerId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Simulation time of the cast
    pub spawned_at: f64,
    pub duration: f64,
    pub active: bool,
}

impl Wall {
    pub fn remaining(&self, now: f64) -> f64 {
        (self.duration - (now - self.spawned_at)).max(0.0)
    }

    pub fn is_expired(&self, now: f64) -> bool {
        now - self.spawned_at >= self.duration
    }

    fn blocks(&self, projectile: &Projectile) -> bool {
        self.active
            && self.owner != projectile.owner
            && PhysicsSystem::in_wall_box(
                projectile.x,
                projectile.y,
                self.x,
                self.y,
                self.width,
                self.height,
            )
    }
}

/// Owns every projectile and wall and resolves their interactions
#[derive(Debug, Default)]
pub struct CombatSystem {
    projectiles: Vec<Projectile>,
    walls: Vec<Wall>,
    next_id: EntityId,
}

impl CombatSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> EntityId {
        self.next_id += 1;
        self.next_id
    }

    /// Spawn a projectile for `ability`. Returns `None` for non-projectile abilities.
    pub fn spawn_projectile(
        &mut self,
        x: f32,
        y: f32,
        direction: f32,
        ability: Ability,
        owner: PlayerId,
    ) -> Option<EntityId> {
        let stats = ProjectileStats::for_ability(ability)?;
        let id = self.allocate_id();
        self.projectiles.push(Projectile {
            id,
            owner,
            kind: ability,
            x,
            y,
            direction,
            speed: stats.speed,
            damage: stats.damage,
            radius: PROJECTILE_RADIUS,
            active: true,
        });
        Some(id)
    }

    /// Spawn a wall with its top-left corner at (x, y)
    pub fn spawn_wall(&mut self, x: f32, y: f32, owner: PlayerId, now: f64) -> EntityId {
        let id = self.allocate_id();
        self.walls.push(Wall {
            id,
            owner,
            x,
            y,
            width: WALL_WIDTH,
            height: WALL_HEIGHT,
            spawned_at: now,
            duration: WALL_DURATION,
            active: true,
        });
        id
    }

    /// Advance every entity by `dt` and resolve collisions.
    ///
    /// Each projectile, in spawn order, moves and is then checked against
    /// opposing projectiles, enemy walls and the opposing player, stopping at
    /// the first hit. Walls expire afterwards and inactive entities are purged.
    pub fn step(&mut self, dt: f32, now: f64, players: &mut [PlayerState; 2]) -> Vec<GameEvent> {
        let mut events = Vec::new();

        for i in 0..self.projectiles.len() {
            if !self.projectiles[i].active {
                continue;
            }

            self.projectiles[i].update(dt);
            if !self.projectiles[i].active {
                continue;
            }

            // Projectile vs projectile
            if let Some(j) = self.find_clash(i) {
                self.projectiles[i].active = false;
                self.projectiles[j].active = false;
                debug!(
                    first = self.projectiles[i].id,
                    second = self.projectiles[j].id,
                    "Projectiles clashed"
                );
                events.push(GameEvent::ProjectilesClashed {
                    first: self.projectiles[i].id,
                    second: self.projectiles[j].id,
                    x: self.projectiles[i].x,
                    y: self.projectiles[i].y,
                });
                continue;
            }

            // Projectile vs wall
            let projectile = &mut self.projectiles[i];
            if let Some(wall) = self.walls.iter_mut().find(|w| w.blocks(projectile)) {
                projectile.active = false;
                wall.active = false;
                debug!(projectile = projectile.id, wall = wall.id, "Wall blocked projectile");
                events.push(GameEvent::WallBlocked {
                    projectile: projectile.id,
                    wall: wall.id,
                    owner: wall.owner,
                });
                continue;
            }

            // Projectile vs player
            let (owner, damage, kind) = (projectile.owner, projectile.damage, projectile.kind);
            let (x, y) = (projectile.x, projectile.y);
            let target = &mut players[owner.opponent().index()];
            if PhysicsSystem::in_player_hitbox(x, y, &target.roi) {
                target.take_damage(damage);
                projectile.active = false;
                events.push(GameEvent::PlayerHit {
                    attacker: owner,
                    target: target.id,
                    ability: kind,
                    damage,
                    hp: target.hp,
                });
                let attacker = &mut players[owner.index()];
                attacker.damage_dealt = attacker.damage_dealt.saturating_add(damage);
            }
        }

        for wall in self.walls.iter_mut().filter(|w| w.active) {
            if wall.is_expired(now) {
                wall.active = false;
                events.push(GameEvent::WallExpired {
                    wall: wall.id,
                    owner: wall.owner,
                });
            }
        }

        self.projectiles.retain(|p| p.active);
        self.walls.retain(|w| w.active);

        events
    }

    /// First active projectile that cancels projectile `i`
    fn find_clash(&self, i: usize) -> Option<usize> {
        let projectile = &self.projectiles[i];
        self.projectiles.iter().enumerate().position(|(j, other)| {
            j != i
                && other.active
                && other.owner != projectile.owner
                && projectile.cancels(other)
                && PhysicsSystem::circles_overlap(
                    projectile.x,
                    projectile.y,
                    projectile.radius,
                    other.x,
                    other.y,
                    other.radius,
                )
        })
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    /// Remove every entity and restart id allocation
    pub fn clear(&mut self) {
        self.projectiles.clear();
        self.walls.clear();
        self.next_id = 0;
    }
}
