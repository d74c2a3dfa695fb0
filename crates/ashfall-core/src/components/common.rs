//! Components shared by every moving entity.

use ashfall_logic::geometry::{circles_overlap, Vec2};
use ashfall_logic::grid::TileGrid;
use serde::{Deserialize, Serialize};

/// Position, velocity and collision radius in world units
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
}

impl Body {
    pub fn new(pos: Vec2, radius: f32) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            radius,
        }
    }

    pub fn moving(pos: Vec2, vel: Vec2, radius: f32) -> Self {
        Self { pos, vel, radius }
    }

    pub fn overlaps(&self, other: &Body) -> bool {
        circles_overlap(self.pos, self.radius, other.pos, other.radius)
    }

    /// Integrate velocity with per-axis tile collision.
    pub fn step(&mut self, grid: &TileGrid, dt: f32) {
        let (pos, vel) = grid.move_circle(self.pos, self.vel, self.radius, dt);
        self.pos = pos;
        self.vel = vel;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ashfall_logic::grid::Tile;

    #[test]
    fn test_overlap_is_strict() {
        let a = Body::new(Vec2::new(0.0, 0.0), 5.0);
        let b = Body::new(Vec2::new(10.0, 0.0), 5.0);
        assert!(!a.overlaps(&b));
        let c = Body::new(Vec2::new(9.9, 0.0), 5.0);
        assert!(a.overlaps(&c));
    }

    #[test]
    fn test_step_stops_at_wall() {
        let mut grid = TileGrid::new(10, 10, 32.0, Tile::Floor);
        grid.set(5, 2, Tile::Wall);
        let mut body = Body::moving(Vec2::new(144.0, 80.0), Vec2::new(400.0, 0.0), 12.0);
        body.step(&grid, 0.1);
        assert_eq!(body.pos.x, 144.0);
        assert_eq!(body.vel.x, 0.0);
    }
}
