//! Arena geometry and collision tests

use super::player::Roi;

/// Projectiles outside `0..=ARENA_MAX_X` are discarded
pub const ARENA_MAX_X: f32 = 2000.0;
/// Horizontal slack added on both sides of a wall's hit box
pub const WALL_HIT_MARGIN: f32 = 20.0;
/// Half extents of the rectangular hit box around a player's ROI center
pub const PLAYER_HIT_HALF_WIDTH: f32 = 50.0;
pub const PLAYER_HIT_HALF_HEIGHT: f32 = 100.0;

/// Physics helpers for moving and colliding arena entities
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Advance a position along x. Returns the new x.
    pub fn advance(x: f32, direction: f32, speed: f32, dt: f32) -> f32 {
        x + direction * speed * dt
    }

    /// Check if an x coordinate left the arena
    pub fn out_of_bounds(x: f32) -> bool {
        !(0.0..=ARENA_MAX_X).contains(&x)
    }

    /// Strict circle overlap: touching circles do not collide
    pub fn circles_overlap(x1: f32, y1: f32, radius1: f32, x2: f32, y2: f32, radius2: f32) -> bool {
        let dx = x2 - x1;
        let dy = y2 - y1;
        let combined_radius = radius1 + radius2;
        (dx * dx + dy * dy).sqrt() < combined_radius
    }

    /// Point inside a wall's box, widened horizontally by `WALL_HIT_MARGIN`
    pub fn in_wall_box(x: f32, y: f32, wall_x: f32, wall_y: f32, width: f32, height: f32) -> bool {
        (wall_x - WALL_HIT_MARGIN..=wall_x + width + WALL_HIT_MARGIN).contains(&x)
            && (wall_y..=wall_y + height).contains(&y)
    }

    /// Point inside the hit box centered on a player's region
    pub fn in_player_hitbox(x: f32, y: f32, roi: &Roi) -> bool {
        (x - roi.center_x()).abs() < PLAYER_HIT_HALF_WIDTH
            && (y - roi.center_y()).abs() < PLAYER_HIT_HALF_HEIGHT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_inclusive() {
        assert!(!PhysicsSystem::out_of_bounds(0.0));
        assert!(!PhysicsSystem::out_of_bounds(ARENA_MAX_X));
        assert!(PhysicsSystem::out_of_bounds(-0.5));
        assert!(PhysicsSystem::out_of_bounds(2000.5));
    }

    #[test]
    fn touching_circles_do_not_overlap() {
        assert!(!PhysicsSystem::circles_overlap(0.0, 0.0, 20.0, 40.0, 0.0, 20.0));
        assert!(PhysicsSystem::circles_overlap(0.0, 0.0, 20.0, 39.0, 0.0, 20.0));
    }

    #[test]
    fn wall_box_includes_margin() {
        assert!(PhysicsSystem::in_wall_box(480.0, 300.0, 500.0, 285.0, 40.0, 150.0));
        assert!(PhysicsSystem::in_wall_box(560.0, 435.0, 500.0, 285.0, 40.0, 150.0));
        assert!(!PhysicsSystem::in_wall_box(479.0, 300.0, 500.0, 285.0, 40.0, 150.0));
        assert!(!PhysicsSystem::in_wall_box(520.0, 436.0, 500.0, 285.0, 40.0, 150.0));
    }

    #[test]
    fn player_hitbox_is_strict() {
        let roi = Roi::new(830.0, 60.0, 400.0, 600.0);
        assert!(PhysicsSystem::in_player_hitbox(1000.5, 360.0, &roi));
        assert!(!PhysicsSystem::in_player_hitbox(980.0, 360.0, &roi));
        assert!(!PhysicsSystem::in_player_hitbox(1030.0, 460.0, &roi));
    }
}
