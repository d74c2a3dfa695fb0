//! Combat formulas: player actions, enemy profiles, damage, drops, XP.
//!
//! All numbers that shape a fight live here as constants or pure functions.
//! The engine applies them; nothing in this module touches entity state.

use serde::{Deserialize, Serialize};

use crate::perks::Rarity;
use crate::stats::{Modifiers, Stats, UnlockFlag};

// ── Player ─────────────────────────────────────────────────────────────

pub const PLAYER_RADIUS: f32 = 12.0;
/// Acceleration as a multiple of max speed.
pub const PLAYER_ACCEL_FACTOR: f32 = 8.0;
/// Velocity kept per tick.
pub const PLAYER_FRICTION: f32 = 0.88;

pub const DASH_COST: f32 = 25.0;
pub const DASH_SPEED: f32 = 600.0;
pub const DASH_DURATION: f32 = 0.25;
pub const DASH_BASE_COOLDOWN: f32 = 0.8;
/// Invulnerability beyond the end of a dash.
pub const DASH_INVULN_BUFFER: f32 = 0.1;

pub const SHOT_COST: f32 = 2.0;
pub const SHOT_BASE_INTERVAL: f32 = 0.2;
pub const SHOT_SPREAD: f32 = 0.1;
/// Fan spread once stamina runs dry.
pub const SHOT_SPREAD_EXHAUSTED: f32 = 0.4;

pub const HEAVY_COST: f32 = 30.0;
pub const HEAVY_COOLDOWN: f32 = 1.0;

/// Invulnerability after taking a hit.
pub const HIT_INVULN: f32 = 0.6;
/// Extra pickup reach beyond the player's radius.
pub const PICKUP_REACH: f32 = 10.0;

pub const BASE_XP_THRESHOLD: u32 = 100;

// ── Projectiles ────────────────────────────────────────────────────────

/// Everything needed to spawn a volley.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotPattern {
    pub count: u32,
    /// Radians between neighbouring projectiles
    pub spread: f32,
    pub damage: f32,
    pub poise_damage: f32,
    pub speed: f32,
    pub radius: f32,
    pub lifetime: f32,
}

impl ShotPattern {
    /// Launch angles, fanned symmetrically around `aim`.
    pub fn angles(&self, aim: f32) -> Vec<f32> {
        let mid = (self.count as f32 - 1.0) / 2.0;
        (0..self.count)
            .map(|i| aim + (i as f32 - mid) * self.spread)
            .collect()
    }
}

fn focus_multiplier(stats: &Stats) -> f32 {
    1.0 + stats.focus as f32 * 0.1
}

/// Primary fire volley. `exhausted` widens the fan.
pub fn primary_shot(stats: &Stats, modifiers: &Modifiers, exhausted: bool) -> ShotPattern {
    let damage = (10.0 + stats.might as f32 * 2.0) * focus_multiplier(stats);
    let count = (1.0 + stats.focus as f32 * 0.5 + modifiers.extra_projectiles).floor();
    ShotPattern {
        count: count.max(1.0) as u32,
        spread: if exhausted {
            SHOT_SPREAD_EXHAUSTED
        } else {
            SHOT_SPREAD
        },
        damage,
        poise_damage: damage * 0.1,
        speed: 500.0 * (1.0 + stats.focus as f32 * 0.05),
        radius: 4.0,
        lifetime: 2.0,
    }
}

/// Single slow, heavy projectile with a large poise hit.
pub fn heavy_shot(stats: &Stats) -> ShotPattern {
    let damage = (30.0 + stats.might as f32 * 3.0) * focus_multiplier(stats);
    ShotPattern {
        count: 1,
        spread: 0.0,
        damage,
        poise_damage: 100.0 + damage * 0.5,
        speed: 300.0,
        radius: 10.0,
        lifetime: 2.0,
    }
}

pub fn shot_interval(stats: &Stats) -> f32 {
    SHOT_BASE_INTERVAL * stats.cooldown_factor()
}

pub fn dash_cooldown(stats: &Stats, modifiers: &Modifiers) -> f32 {
    DASH_BASE_COOLDOWN * stats.cooldown_factor() * modifiers.dash_cooldown_mult
}

pub fn dash_duration(modifiers: &Modifiers) -> f32 {
    DASH_DURATION + modifiers.dash_duration
}

/// Damage the player actually loses from a raw hit.
pub fn player_damage_taken(raw: f32, stats: &Stats) -> f32 {
    raw / stats.damage_reduction()
}

// ── Enemies ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Basic,
    Fast,
    Ranged,
    Heavy,
    Boss,
}

impl EnemyKind {
    /// Kinds a regular arena draws from.
    pub const REGULAR: [EnemyKind; 4] = [
        EnemyKind::Basic,
        EnemyKind::Fast,
        EnemyKind::Ranged,
        EnemyKind::Heavy,
    ];

    pub fn is_melee(self) -> bool {
        matches!(
            self,
            EnemyKind::Basic | EnemyKind::Fast | EnemyKind::Heavy | EnemyKind::Boss
        )
    }

    pub fn is_ranged(self) -> bool {
        matches!(self, EnemyKind::Ranged | EnemyKind::Boss)
    }

    /// Ranged shooters stop to fire; the boss keeps closing in.
    pub fn holds_position_to_fire(self) -> bool {
        self == EnemyKind::Ranged
    }

    /// Stats for this kind at the given player level.
    pub fn profile(self, level: u32) -> EnemyProfile {
        let l = level as f32;
        if self == EnemyKind::Boss {
            return EnemyProfile {
                speed: 80.0,
                speed_mult: 0.9,
                radius: 32.0,
                health: 500.0 + l * 100.0,
                damage: 25.0 + l * 5.0,
                poise: 500.0,
                shot_interval: 0.8,
                attack_range: 48.0,
                melee_cooldown: 1.5,
            };
        }

        let mut profile = EnemyProfile {
            speed: 150.0 + l * 8.0,
            speed_mult: 1.0,
            radius: 12.0,
            health: 30.0 + l * 8.0,
            damage: 5.0 + l * 2.0,
            poise: 50.0 + l * 10.0,
            shot_interval: 1.5,
            attack_range: 20.0,
            melee_cooldown: 1.5,
        };
        match self {
            EnemyKind::Fast => {
                profile.speed *= 1.6;
                profile.speed_mult = 2.0;
                profile.poise *= 0.5;
                profile.attack_range = 30.0;
                profile.melee_cooldown = 0.8;
            }
            EnemyKind::Heavy => {
                profile.health *= 2.0;
                profile.poise *= 2.0;
                profile.speed *= 0.6;
                profile.speed_mult = 0.7;
                profile.radius = 16.0;
            }
            _ => {}
        }
        profile
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemyProfile {
    pub speed: f32,
    /// Max-speed multiplier applied while moving
    pub speed_mult: f32,
    pub radius: f32,
    pub health: f32,
    /// Contact, melee and projectile damage
    pub damage: f32,
    pub poise: f32,
    pub shot_interval: f32,
    pub attack_range: f32,
    pub melee_cooldown: f32,
}

pub const ENEMY_ACCEL_FACTOR: f32 = 3.5;
pub const ENEMY_FRICTION: f32 = 0.92;
pub const STUN_DURATION: f32 = 1.5;
/// Distance, in tiles, inside which ranged enemies open fire.
pub const RANGED_ENGAGE_TILES: f32 = 8.0;
pub const ENEMY_SHOT_SPEED: f32 = 250.0;
pub const ENEMY_SHOT_RADIUS: f32 = 6.0;
pub const ENEMY_SHOT_LIFETIME: f32 = 3.0;
pub const RANGED_TELEGRAPH: f32 = 0.2;
pub const MELEE_TELEGRAPH: f32 = 0.3;
/// Delay between a melee wind-up and the hit landing.
pub const MELEE_STRIKE_DELAY: f32 = 0.15;

// ── Drops & experience ────────────────────────────────────────────────

pub const ITEM_DROP_CHANCE: f64 = 0.4;

pub fn ash_drop_chance(stats: &Stats) -> f64 {
    0.05 + stats.luck as f64 * 0.01
}

/// Scale a rolled base amount (1..=3) by luck and the economy perk.
pub fn ash_drop_amount(base: u32, stats: &Stats, modifiers: &Modifiers) -> u32 {
    let perk_bonus = if modifiers.has(UnlockFlag::CosmicEconomy) {
        1.25
    } else {
        1.0
    };
    (base as f32 * (1.0 + stats.luck as f32 * 0.05) * perk_bonus).ceil() as u32
}

/// Map a unit roll to an item rarity. Luck shrinks the roll range, pushing
/// results toward the rare end.
pub fn item_rarity(unit_roll: f64, stats: &Stats) -> Rarity {
    let roll = unit_roll * (100.0 - stats.luck as f64 * 2.0);
    if roll < 5.0 {
        Rarity::Legendary
    } else if roll < 20.0 {
        Rarity::Epic
    } else if roll < 45.0 {
        Rarity::Rare
    } else {
        Rarity::Common
    }
}

pub fn kill_xp(stats: &Stats, modifiers: &Modifiers) -> f32 {
    (10.0 + stats.level as f32) * (1.0 - modifiers.xp_penalty)
}

/// Experience counter toward the next level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub xp: f32,
    pub threshold: u32,
}

impl Default for Experience {
    fn default() -> Self {
        Self {
            xp: 0.0,
            threshold: BASE_XP_THRESHOLD,
        }
    }
}

impl Experience {
    pub fn ready(&self) -> bool {
        self.xp >= self.threshold as f32
    }

    /// Spend one threshold's worth of XP if available, carrying the excess
    /// and raising the next threshold. Returns whether a level was gained.
    pub fn try_level_up(&mut self) -> bool {
        if !self.ready() {
            return false;
        }
        self.xp -= self.threshold as f32;
        self.threshold = next_threshold(self.threshold);
        true
    }
}

pub fn next_threshold(current: u32) -> u32 {
    (current as f32 * 1.5 + 50.0).floor() as u32
}

/// Fraction of max health restored on level-up.
pub const LEVEL_UP_HEAL: f32 = 0.25;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_damage_grit() {
        let mut stats = Stats::default();
        assert_eq!(player_damage_taken(10.0, &stats), 10.0);
        stats.grit = 4;
        assert!((player_damage_taken(10.0, &stats) - 8.333_333).abs() < 1e-4);
    }

    #[test]
    fn test_primary_shot_defaults() {
        let shot = primary_shot(&Stats::default(), &Modifiers::default(), false);
        assert_eq!(shot.count, 1);
        assert_eq!(shot.damage, 10.0);
        assert_eq!(shot.poise_damage, 1.0);
        assert_eq!(shot.speed, 500.0);
        assert_eq!(shot.spread, SHOT_SPREAD);
    }

    #[test]
    fn test_primary_shot_scales_with_focus() {
        let stats = Stats {
            focus: 2,
            might: 5,
            ..Stats::default()
        };
        let mods = Modifiers {
            extra_projectiles: 0.5,
            ..Modifiers::default()
        };
        let shot = primary_shot(&stats, &mods, true);
        // floor(1 + 1 + 0.5)
        assert_eq!(shot.count, 2);
        assert!((shot.damage - 24.0).abs() < 1e-4);
        assert_eq!(shot.spread, SHOT_SPREAD_EXHAUSTED);
    }

    #[test]
    fn test_fan_angles_symmetric() {
        let shot = ShotPattern {
            count: 3,
            spread: 0.1,
            ..heavy_shot(&Stats::default())
        };
        let angles = shot.angles(1.0);
        assert_eq!(angles.len(), 3);
        assert!((angles[0] - 0.9).abs() < 1e-6);
        assert!((angles[1] - 1.0).abs() < 1e-6);
        assert!((angles[2] - 1.1).abs() < 1e-6);
    }

    #[test]
    fn test_heavy_shot() {
        let shot = heavy_shot(&Stats::default());
        assert_eq!(shot.damage, 30.0);
        assert_eq!(shot.poise_damage, 115.0);
        assert_eq!(shot.count, 1);
    }

    #[test]
    fn test_enemy_profiles() {
        let basic = EnemyKind::Basic.profile(1);
        assert_eq!(basic.health, 38.0);
        assert_eq!(basic.speed, 158.0);
        let heavy = EnemyKind::Heavy.profile(1);
        assert_eq!(heavy.health, 76.0);
        assert_eq!(heavy.radius, 16.0);
        let fast = EnemyKind::Fast.profile(1);
        assert_eq!(fast.poise, 30.0);
        assert_eq!(fast.attack_range, 30.0);
        let boss = EnemyKind::Boss.profile(2);
        assert_eq!(boss.health, 700.0);
        assert_eq!(boss.damage, 35.0);
        assert!(EnemyKind::Boss.is_ranged() && EnemyKind::Boss.is_melee());
    }

    #[test]
    fn test_level_up_carries_excess() {
        let mut exp = Experience {
            xp: 105.0,
            threshold: 100,
        };
        assert!(exp.try_level_up());
        assert_eq!(exp.xp, 5.0);
        assert_eq!(exp.threshold, 200);
        assert!(!exp.try_level_up());
    }

    #[test]
    fn test_item_rarity_bands() {
        let stats = Stats::default();
        assert_eq!(item_rarity(0.01, &stats), Rarity::Legendary);
        assert_eq!(item_rarity(0.10, &stats), Rarity::Epic);
        assert_eq!(item_rarity(0.30, &stats), Rarity::Rare);
        assert_eq!(item_rarity(0.90, &stats), Rarity::Common);
        let lucky = Stats {
            luck: 20,
            ..Stats::default()
        };
        // 0.5 * 60 = 30
        assert_eq!(item_rarity(0.5, &lucky), Rarity::Rare);
    }

    #[test]
    fn test_ash_amount_bonus() {
        let stats = Stats {
            luck: 2,
            ..Stats::default()
        };
        let mut mods = Modifiers::default();
        assert_eq!(ash_drop_amount(3, &stats, &mods), 4);
        mods.flags.insert(UnlockFlag::CosmicEconomy);
        assert_eq!(ash_drop_amount(3, &stats, &mods), 5);
    }

    #[test]
    fn test_kill_xp_penalty() {
        let mods = Modifiers {
            xp_penalty: 0.5,
            ..Modifiers::default()
        };
        assert_eq!(kill_xp(&Stats::default(), &mods), 5.5);
    }
}
