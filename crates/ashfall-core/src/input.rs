//! Per-tick player input.

use ashfall_logic::geometry::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum AimTarget {
    /// Nearest living enemy of the active arena
    #[default]
    Auto,
    /// Toward a world-space point
    Point(Vec2),
}

/// Input sampled for one tick. `dash` and `heavy` are edge-triggered,
/// `fire` is held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    pub move_x: f32,
    pub move_y: f32,
    pub dash: bool,
    pub heavy: bool,
    pub fire: bool,
    pub aim: AimTarget,
    /// Request to leave a cleared arena
    pub advance: bool,
}

impl TickInput {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn moving(x: f32, y: f32) -> Self {
        Self {
            move_x: x,
            move_y: y,
            ..Self::default()
        }
    }

    /// Axes clamped to [-1, 1], then normalized if longer than 1.
    pub fn direction(&self) -> Vec2 {
        let axis = |v: f32| if v.is_finite() { v.clamp(-1.0, 1.0) } else { 0.0 };
        let dir = Vec2::new(axis(self.move_x), axis(self.move_y));
        if dir.length() > 1.0 {
            dir.normalize()
        } else {
            dir
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagonal_normalized() {
        let dir = TickInput::moving(1.0, 1.0).direction();
        assert!((dir.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_axes_clamped() {
        let dir = TickInput::moving(5.0, 0.0).direction();
        assert_eq!(dir, Vec2::new(1.0, 0.0));
        let dir = TickInput::moving(f32::NAN, -0.5).direction();
        assert_eq!(dir, Vec2::new(0.0, -0.5));
    }
}
