//! Player and enemy components.

use ashfall_logic::combat::{EnemyKind, EnemyProfile, Experience};
use ashfall_logic::geometry::Vec2;
use ashfall_logic::stats::{refresh_vitals, Modifiers, Stats, Vitals};
use serde::{Deserialize, Serialize};

/// Countdown timers driving the player's action gating, in seconds
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ActionTimers {
    pub dash_cooldown: f32,
    pub dash_remaining: f32,
    pub invulnerable: f32,
    pub heavy_cooldown: f32,
    pub shoot_cooldown: f32,
}

impl ActionTimers {
    /// Count every cooldown down by `dt`, flooring at zero.
    /// Invulnerability and dash time are handled by the movement step.
    pub fn tick_cooldowns(&mut self, dt: f32) {
        self.dash_cooldown = (self.dash_cooldown - dt).max(0.0);
        self.heavy_cooldown = (self.heavy_cooldown - dt).max(0.0);
        self.shoot_cooldown = (self.shoot_cooldown - dt).max(0.0);
    }

    pub fn is_dashing(&self) -> bool {
        self.dash_remaining > 0.0
    }
}

/// The single player-controlled entity, with all run-scoped progression.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub vitals: Vitals,
    pub stats: Stats,
    pub modifiers: Modifiers,
    pub experience: Experience,
    pub timers: ActionTimers,
    pub dash_dir: Vec2,
    /// Last aim direction (unit length)
    pub facing: Vec2,
    /// Ash collected this run
    pub ash: u32,
    /// Names of acquired perks and items, in pickup order
    pub inventory: Vec<String>,
}

impl Player {
    pub fn new(stats: Stats) -> Self {
        let modifiers = Modifiers::default();
        let mut vitals = Vitals::new(stats.base_max_health());
        refresh_vitals(&mut vitals, &stats, &modifiers);
        Self {
            vitals,
            stats,
            modifiers,
            experience: Experience::default(),
            timers: ActionTimers::default(),
            dash_dir: Vec2::ZERO,
            facing: Vec2::new(1.0, 0.0),
            ash: 0,
            inventory: Vec::new(),
        }
    }

    pub fn is_invulnerable(&self) -> bool {
        self.timers.invulnerable > 0.0
    }
}

/// A hostile entity owned by one arena.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Enemy {
    /// Monotonic id, unique for the whole run
    pub id: u32,
    pub kind: EnemyKind,
    /// Index of the owning arena
    pub arena: u32,
    pub profile: EnemyProfile,
    pub health: f32,
    pub max_health: f32,
    pub poise: f32,
    pub max_poise: f32,
    pub stun: f32,
    pub attack_cooldown: f32,
    pub shot_timer: f32,
    /// Winding up an attack
    pub telegraphing: bool,
}

impl Enemy {
    pub fn new(id: u32, kind: EnemyKind, arena: u32, level: u32) -> Self {
        let profile = kind.profile(level);
        Self {
            id,
            kind,
            arena,
            profile,
            health: profile.health,
            max_health: profile.health,
            poise: profile.poise,
            max_poise: profile.poise,
            stun: 0.0,
            attack_cooldown: 0.0,
            shot_timer: 0.0,
            telegraphing: false,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    pub fn is_stunned(&self) -> bool {
        self.stun > 0.0
    }

    /// Apply a hit. Poise only drains while not already stunned; a break
    /// stuns for `stun` seconds and refills poise. Returns whether poise broke.
    pub fn take_hit(&mut self, damage: f32, poise_damage: f32, stun: f32) -> bool {
        self.health -= damage;
        if self.is_stunned() {
            return false;
        }
        self.poise -= poise_damage;
        if self.poise <= 0.0 {
            self.stun = stun;
            self.poise = self.max_poise;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_starts_full() {
        let player = Player::new(Stats::default());
        assert_eq!(player.vitals.health, 110.0);
        assert_eq!(player.vitals.health, player.vitals.max_health);
        assert_eq!(player.vitals.stamina, 100.0);
    }

    #[test]
    fn test_poise_break_stuns_and_refills() {
        let mut enemy = Enemy::new(1, EnemyKind::Basic, 0, 1);
        assert_eq!(enemy.max_poise, 60.0);
        assert!(!enemy.take_hit(5.0, 30.0, 1.5));
        assert!(enemy.take_hit(5.0, 30.0, 1.5));
        assert_eq!(enemy.stun, 1.5);
        assert_eq!(enemy.poise, 60.0);
        assert_eq!(enemy.health, 28.0);

        // Stunned enemies keep taking damage but not poise damage.
        assert!(!enemy.take_hit(5.0, 100.0, 1.5));
        assert_eq!(enemy.poise, 60.0);
        assert_eq!(enemy.health, 23.0);
    }

    #[test]
    fn test_cooldowns_floor_at_zero() {
        let mut timers = ActionTimers {
            dash_cooldown: 0.05,
            heavy_cooldown: 1.0,
            ..ActionTimers::default()
        };
        timers.tick_cooldowns(0.1);
        assert_eq!(timers.dash_cooldown, 0.0);
        assert!((timers.heavy_cooldown - 0.9).abs() < 1e-6);
    }
}
