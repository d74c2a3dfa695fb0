//! Perk and item pools, weighted selection, and effect application.
//!
//! Effects are data: a closed [`Effect`] enum interpreted by
//! [`apply_effects`]. Anything an effect needs from outside the player's own
//! state (buffing live enemies, undoing a timed bonus) comes back as a
//! [`FollowUp`] for the engine to carry out.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::stats::{validate_all, ModifierKind, Modifiers, StatKind, Stats, UnlockFlag, Vitals};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    /// Base weight when drawing level-up perks.
    pub fn perk_weight(self) -> f64 {
        match self {
            Rarity::Common => 1.0,
            Rarity::Rare => 0.7,
            Rarity::Epic => 0.4,
            Rarity::Legendary => 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    AddStat(StatKind, i32),
    MultiplyStat(StatKind, i32),
    AddModifier(ModifierKind, f32),
    ScaleModifier(ModifierKind, f32),
    RestoreStamina(f32),
    /// Raise the flat max-health bonus and heal by the same amount
    RaiseMaxHealth(f32),
    HealToFull,
    /// Add to a modifier now and take it back after `seconds`
    TimedModifier {
        kind: ModifierKind,
        amount: f32,
        seconds: f32,
    },
    /// Raise health and max health of every living enemy
    BoostEnemyHealth(f32),
    Unlock(UnlockFlag),
}

/// Work an effect hands back to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FollowUp {
    BoostEnemyHealth(f32),
    ExpireModifier {
        kind: ModifierKind,
        amount: f32,
        after: f32,
    },
}

/// Static perk or item template.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Template {
    pub name: &'static str,
    pub rarity: Rarity,
    pub description: &'static str,
    pub effects: &'static [Effect],
}

use self::Effect::*;
use ModifierKind as M;
use StatKind as S;
use UnlockFlag as U;

/// Items dropped by enemies.
#[rustfmt::skip]
pub const ITEM_POOL: &[Template] = &[
    Template { name: "Beer", rarity: Rarity::Common, description: "Quick recharge", effects: &[RestoreStamina(30.0)] },
    Template { name: "Sharp Dagger", rarity: Rarity::Common, description: "Clean strike", effects: &[AddStat(S::Might, 1)] },
    Template { name: "Battery", rarity: Rarity::Common, description: "Extra regen (10s)", effects: &[TimedModifier { kind: M::StaminaRegen, amount: 20.0, seconds: 10.0 }] },
    Template { name: "Rusty Shield", rarity: Rarity::Rare, description: "Basic block", effects: &[AddStat(S::Grit, 2)] },
    Template { name: "Light Boots", rarity: Rarity::Rare, description: "Fluid dash", effects: &[AddStat(S::Haste, 1)] },
    Template { name: "Magnifier", rarity: Rarity::Rare, description: "Precision", effects: &[AddStat(S::Focus, 1)] },
    Template { name: "Focus Stone", rarity: Rarity::Epic, description: "Burst", effects: &[AddStat(S::Focus, 2)] },
    Template { name: "Blood Flask", rarity: Rarity::Epic, description: "Vampire", effects: &[AddModifier(M::Vampiric, 0.03)] },
    Template { name: "Gale", rarity: Rarity::Epic, description: "Knockback", effects: &[Unlock(U::Knockback)] },
    Template { name: "Turbo Engine", rarity: Rarity::Legendary, description: "Hyperspeed", effects: &[AddStat(S::Haste, 2), ScaleModifier(M::DashCooldown, 0.8)] },
    Template { name: "Magma Core", rarity: Rarity::Legendary, description: "Explosion", effects: &[Unlock(U::Explosion)] },
    Template { name: "Ethereal Essence", rarity: Rarity::Legendary, description: "Ghost", effects: &[AddStat(S::Focus, 3), Unlock(U::Piercing)] },
    Template { name: "Cursed Amulet", rarity: Rarity::Legendary, description: "High risk", effects: &[AddStat(S::Might, 3), AddStat(S::Luck, -1)] },
    Template { name: "Cosmic Clover", rarity: Rarity::Legendary, description: "Fortune", effects: &[AddStat(S::Luck, 3), Unlock(U::CosmicClover)] },
    Template { name: "Broken Tool", rarity: Rarity::Legendary, description: "Repair", effects: &[AddStat(S::Grit, 2), RaiseMaxHealth(10.0)] },
    Template { name: "Shooting Star", rarity: Rarity::Legendary, description: "Omni", effects: &[AddStat(S::Might, 1), AddStat(S::Focus, 1)] },
];

/// Perks offered on level-up.
#[rustfmt::skip]
pub const PERK_POOL: &[Template] = &[
    Template { name: "Extra Projectiles", rarity: Rarity::Common, description: "+0.5 projectiles. +1 Focus.", effects: &[AddStat(S::Focus, 1), AddModifier(M::ExtraProjectiles, 0.5)] },
    Template { name: "Sturdy Heart", rarity: Rarity::Common, description: "+10 max HP via grit.", effects: &[AddStat(S::Grit, 1)] },
    Template { name: "Light Step", rarity: Rarity::Common, description: "+8% move speed.", effects: &[AddStat(S::Haste, 2)] },
    Template { name: "Dash Master", rarity: Rarity::Rare, description: "Dash cooldown -25%. +1 Haste.", effects: &[AddStat(S::Haste, 1), ScaleModifier(M::DashCooldown, 0.75)] },
    Template { name: "Vampiric Reload", rarity: Rarity::Rare, description: "Shots heal 5% of damage.", effects: &[AddModifier(M::Vampiric, 0.05)] },
    Template { name: "Poise Breaker", rarity: Rarity::Rare, description: "Heavy attack +50% poise damage.", effects: &[Unlock(U::PoiseBreaker)] },
    Template { name: "Drunken Speed", rarity: Rarity::Rare, description: "+20% speed, -1 Might.", effects: &[AddStat(S::Haste, 5), AddStat(S::Might, -1)] },
    Template { name: "Caffeine Overload", rarity: Rarity::Epic, description: "+10 stamina regen, XP gain -15%.", effects: &[AddModifier(M::StaminaRegen, 10.0), AddModifier(M::XpPenalty, 0.15)] },
    Template { name: "Devil's Luck", rarity: Rarity::Epic, description: "x2 Luck, enemies +15 HP.", effects: &[MultiplyStat(S::Luck, 2), BoostEnemyHealth(15.0)] },
    Template { name: "Explosive Dash", rarity: Rarity::Epic, description: "Dash breaks poise in an area.", effects: &[Unlock(U::ExplosiveDash)] },
    Template { name: "Homing Rounds", rarity: Rarity::Epic, description: "Projectiles seek targets.", effects: &[Unlock(U::Homing)] },
    Template { name: "Reflective Armor", rarity: Rarity::Epic, description: "10% damage reflected.", effects: &[AddModifier(M::Reflect, 0.1)] },
    Template { name: "Titanium Heart", rarity: Rarity::Legendary, description: "+2 Grit, full heal.", effects: &[AddStat(S::Grit, 2), HealToFull] },
    Template { name: "Eternal Storm", rarity: Rarity::Legendary, description: "+1 projectile, +2 Focus.", effects: &[AddModifier(M::ExtraProjectiles, 1.0), AddStat(S::Focus, 2)] },
    Template { name: "Invincible Ghost", rarity: Rarity::Legendary, description: "Dash i-frames +0.2s.", effects: &[AddModifier(M::DashDuration, 0.2)] },
    Template { name: "Infinite Poise", rarity: Rarity::Legendary, description: "+50 player poise.", effects: &[Unlock(U::InfinitePoise)] },
    Template { name: "Multihit Heavy", rarity: Rarity::Legendary, description: "Heavy attack hits three times.", effects: &[Unlock(U::MultihitHeavy)] },
    Template { name: "Cosmic Economy", rarity: Rarity::Legendary, description: "+25% ash, +1 Luck.", effects: &[AddStat(S::Luck, 1), Unlock(U::CosmicEconomy)] },
    Template { name: "Hyperhaste", rarity: Rarity::Legendary, description: "+2 Haste, faster fire.", effects: &[AddStat(S::Haste, 2), Unlock(U::RapidFire)] },
    Template { name: "Apocalypse", rarity: Rarity::Legendary, description: "+1 Might, +1 Focus.", effects: &[AddStat(S::Might, 1), AddStat(S::Focus, 1)] },
];

pub fn find_item(name: &str) -> Option<&'static Template> {
    ITEM_POOL.iter().find(|t| t.name == name)
}

pub fn find_perk(name: &str) -> Option<&'static Template> {
    PERK_POOL.iter().find(|t| t.name == name)
}

/// Player state an effect may mutate.
pub struct EffectTarget<'a> {
    pub stats: &'a mut Stats,
    pub modifiers: &'a mut Modifiers,
    pub vitals: &'a mut Vitals,
}

/// Apply effects in order, then clamp everything. Returns engine follow-ups.
pub fn apply_effects(effects: &[Effect], target: EffectTarget<'_>) -> Vec<FollowUp> {
    let EffectTarget {
        stats,
        modifiers,
        vitals,
    } = target;
    let mut follow_ups = Vec::new();

    for effect in effects {
        match *effect {
            AddStat(kind, delta) => {
                let v = stats.get_mut(kind);
                *v = v.saturating_add(delta);
            }
            MultiplyStat(kind, factor) => {
                let v = stats.get_mut(kind);
                *v = v.saturating_mul(factor);
            }
            AddModifier(kind, amount) => *modifiers.get_mut(kind) += amount,
            ScaleModifier(kind, factor) => *modifiers.get_mut(kind) *= factor,
            RestoreStamina(amount) => {
                vitals.stamina = (vitals.stamina + amount).min(vitals.max_stamina);
            }
            RaiseMaxHealth(amount) => {
                modifiers.max_health += amount;
                vitals.max_health += amount;
                vitals.health += amount;
            }
            HealToFull => {
                // Max health may have just moved; settle it first.
                validate_all(stats, modifiers, vitals);
                vitals.health = vitals.max_health;
            }
            TimedModifier {
                kind,
                amount,
                seconds,
            } => {
                // Only what survives the clamp is taken back on expiry.
                let before = modifiers.get(kind);
                *modifiers.get_mut(kind) += amount;
                modifiers.clamp();
                follow_ups.push(FollowUp::ExpireModifier {
                    kind,
                    amount: modifiers.get(kind) - before,
                    after: seconds,
                });
            }
            BoostEnemyHealth(amount) => follow_ups.push(FollowUp::BoostEnemyHealth(amount)),
            Unlock(flag) => {
                modifiers.flags.insert(flag);
            }
        }
    }

    validate_all(stats, modifiers, vitals);
    follow_ups
}

/// Draw `count` distinct perk indices into [`PERK_POOL`], weighted by rarity
/// with a flat luck bonus on every tier.
pub fn roll_perk_choices<R: Rng + ?Sized>(rng: &mut R, luck: i32, count: usize) -> Vec<usize> {
    let luck_bonus = luck as f64 * 0.02;
    let mut available: Vec<usize> = (0..PERK_POOL.len()).collect();
    let mut chosen = Vec::with_capacity(count);

    for _ in 0..count {
        if available.is_empty() {
            break;
        }
        let weights: Vec<f64> = available
            .iter()
            .map(|&i| PERK_POOL[i].rarity.perk_weight() + luck_bonus)
            .collect();
        let total: f64 = weights.iter().sum();
        let roll = rng.gen::<f64>() * total;

        let mut acc = 0.0;
        let mut pick = 0;
        for (j, w) in weights.iter().enumerate() {
            acc += w;
            if roll <= acc {
                pick = j;
                break;
            }
        }
        chosen.push(available.remove(pick));
    }

    chosen
}

/// Pick an item index of the given rarity, falling back to common.
pub fn roll_item<R: Rng + ?Sized>(rng: &mut R, rarity: Rarity) -> Option<usize> {
    let mut candidates: Vec<usize> = (0..ITEM_POOL.len())
        .filter(|&i| ITEM_POOL[i].rarity == rarity)
        .collect();
    if candidates.is_empty() {
        candidates = (0..ITEM_POOL.len())
            .filter(|&i| ITEM_POOL[i].rarity == Rarity::Common)
            .collect();
    }
    if candidates.is_empty() {
        return None;
    }
    let idx = rng.gen_range(0..candidates.len() as u32) as usize;
    Some(candidates[idx])
}
