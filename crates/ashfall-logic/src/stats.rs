//! Run stats, perk-driven modifiers, and the player's resource pools.
//!
//! Everything a perk or item can touch lives here, along with the clamp
//! ranges that keep it sane. Clamping is idempotent: clamping an
//! already-valid value set changes nothing.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Base movement speed before haste, world units per second.
pub const BASE_MOVE_SPEED: f32 = 180.0;
pub const BASE_MAX_HEALTH: f32 = 100.0;
pub const BASE_MAX_STAMINA: f32 = 100.0;
/// Stamina regained per second before modifiers.
pub const BASE_STAMINA_REGEN: f32 = 45.0;

const CORE_STAT_MAX: i32 = 100;
const LUCK_MAX: i32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StatKind {
    Might,
    Focus,
    Grit,
    Haste,
    Luck,
}

impl StatKind {
    pub const ALL: [StatKind; 5] = [
        StatKind::Might,
        StatKind::Focus,
        StatKind::Grit,
        StatKind::Haste,
        StatKind::Luck,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StatKind::Might => "might",
            StatKind::Focus => "focus",
            StatKind::Grit => "grit",
            StatKind::Haste => "haste",
            StatKind::Luck => "luck",
        }
    }

    /// Upper clamp bound for this stat.
    pub fn max_value(self) -> i32 {
        match self {
            StatKind::Luck => LUCK_MAX,
            _ => CORE_STAT_MAX,
        }
    }
}

/// Run-scoped attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub level: u32,
    pub might: i32,
    pub focus: i32,
    pub grit: i32,
    pub haste: i32,
    pub luck: i32,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            level: 1,
            might: 0,
            focus: 0,
            grit: 0,
            haste: 0,
            luck: 0,
        }
    }
}

impl Stats {
    pub fn get(&self, kind: StatKind) -> i32 {
        match kind {
            StatKind::Might => self.might,
            StatKind::Focus => self.focus,
            StatKind::Grit => self.grit,
            StatKind::Haste => self.haste,
            StatKind::Luck => self.luck,
        }
    }

    pub fn get_mut(&mut self, kind: StatKind) -> &mut i32 {
        match kind {
            StatKind::Might => &mut self.might,
            StatKind::Focus => &mut self.focus,
            StatKind::Grit => &mut self.grit,
            StatKind::Haste => &mut self.haste,
            StatKind::Luck => &mut self.luck,
        }
    }

    pub fn clamp(&mut self) {
        self.level = self.level.max(1);
        for kind in StatKind::ALL {
            let v = self.get_mut(kind);
            *v = (*v).clamp(0, kind.max_value());
        }
    }

    pub fn is_valid(&self) -> bool {
        self.level >= 1
            && StatKind::ALL
                .iter()
                .all(|&k| (0..=k.max_value()).contains(&self.get(k)))
    }

    pub fn move_speed(&self) -> f32 {
        BASE_MOVE_SPEED * (1.0 + self.haste as f32 * 0.04)
    }

    /// Multiplier applied to dash and fire cooldowns. Haste shaves 10% per
    /// point, capped at 75%.
    pub fn cooldown_factor(&self) -> f32 {
        1.0 - (self.haste as f32 * 0.1).min(0.75)
    }

    /// Max health before flat modifiers.
    pub fn base_max_health(&self) -> f32 {
        BASE_MAX_HEALTH + self.level as f32 * 10.0 + self.grit as f32 * 10.0
    }

    /// Divisor applied to incoming damage.
    pub fn damage_reduction(&self) -> f32 {
        1.0 + self.grit as f32 * 0.05
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierKind {
    ExtraProjectiles,
    /// Fraction of dealt damage healed back
    Vampiric,
    /// Fraction of taken damage reflected (recorded only)
    Reflect,
    /// Bonus stamina regen per second
    StaminaRegen,
    /// Fraction of kill XP withheld
    XpPenalty,
    DashCooldown,
    DashDuration,
    MaxHealth,
}

/// Perk effects with no combat hook of their own; recorded so a
/// presentation layer can show them and later systems can query them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnlockFlag {
    Knockback,
    Explosion,
    Piercing,
    CosmicClover,
    PoiseBreaker,
    ExplosiveDash,
    Homing,
    InfinitePoise,
    MultihitHeavy,
    /// +25% ash from drops
    CosmicEconomy,
    RapidFire,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifiers {
    pub extra_projectiles: f32,
    pub vampiric: f32,
    pub reflect: f32,
    pub stamina_regen: f32,
    pub xp_penalty: f32,
    pub dash_cooldown_mult: f32,
    pub dash_duration: f32,
    pub max_health: f32,
    pub flags: BTreeSet<UnlockFlag>,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            extra_projectiles: 0.0,
            vampiric: 0.0,
            reflect: 0.0,
            stamina_regen: 0.0,
            xp_penalty: 0.0,
            dash_cooldown_mult: 1.0,
            dash_duration: 0.0,
            max_health: 0.0,
            flags: BTreeSet::new(),
        }
    }
}

impl Modifiers {
    pub fn get(&self, kind: ModifierKind) -> f32 {
        match kind {
            ModifierKind::ExtraProjectiles => self.extra_projectiles,
            ModifierKind::Vampiric => self.vampiric,
            ModifierKind::Reflect => self.reflect,
            ModifierKind::StaminaRegen => self.stamina_regen,
            ModifierKind::XpPenalty => self.xp_penalty,
            ModifierKind::DashCooldown => self.dash_cooldown_mult,
            ModifierKind::DashDuration => self.dash_duration,
            ModifierKind::MaxHealth => self.max_health,
        }
    }

    pub fn get_mut(&mut self, kind: ModifierKind) -> &mut f32 {
        match kind {
            ModifierKind::ExtraProjectiles => &mut self.extra_projectiles,
            ModifierKind::Vampiric => &mut self.vampiric,
            ModifierKind::Reflect => &mut self.reflect,
            ModifierKind::StaminaRegen => &mut self.stamina_regen,
            ModifierKind::XpPenalty => &mut self.xp_penalty,
            ModifierKind::DashCooldown => &mut self.dash_cooldown_mult,
            ModifierKind::DashDuration => &mut self.dash_duration,
            ModifierKind::MaxHealth => &mut self.max_health,
        }
    }

    pub fn has(&self, flag: UnlockFlag) -> bool {
        self.flags.contains(&flag)
    }

    /// Total stamina regained per second.
    pub fn stamina_regen_rate(&self) -> f32 {
        BASE_STAMINA_REGEN + self.stamina_regen
    }

    pub fn clamp(&mut self) {
        self.extra_projectiles = self.extra_projectiles.clamp(0.0, 20.0);
        self.vampiric = self.vampiric.clamp(0.0, 0.5);
        self.reflect = self.reflect.clamp(0.0, 0.5);
        // Keeps the total regen rate within 1..=500.
        self.stamina_regen = self
            .stamina_regen
            .clamp(1.0 - BASE_STAMINA_REGEN, 500.0 - BASE_STAMINA_REGEN);
        self.xp_penalty = self.xp_penalty.clamp(0.0, 0.9);
        self.dash_cooldown_mult = self.dash_cooldown_mult.clamp(0.1, 1.0);
        self.dash_duration = self.dash_duration.clamp(0.0, 1.0);
        self.max_health = self.max_health.clamp(0.0, 10_000.0);
    }
}

/// Health and stamina pools.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub health: f32,
    pub max_health: f32,
    pub stamina: f32,
    pub max_stamina: f32,
}

impl Vitals {
    pub fn new(max_health: f32) -> Self {
        Self {
            health: max_health,
            max_health,
            stamina: BASE_MAX_STAMINA,
            max_stamina: BASE_MAX_STAMINA,
        }
    }

    pub fn clamp(&mut self) {
        self.max_health = self.max_health.clamp(50.0, 10_000.0);
        self.health = self.health.clamp(0.0, self.max_health);
        self.max_stamina = self.max_stamina.clamp(50.0, 1_000.0);
        self.stamina = self.stamina.clamp(0.0, self.max_stamina);
    }

    pub fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount).min(self.max_health);
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }
}

/// Recompute max health from stats and modifiers, then clamp every pool.
pub fn refresh_vitals(vitals: &mut Vitals, stats: &Stats, modifiers: &Modifiers) {
    vitals.max_health = stats.base_max_health() + modifiers.max_health;
    vitals.clamp();
}

/// Clamp stats, modifiers and pools together, as after any perk or item.
pub fn validate_all(stats: &mut Stats, modifiers: &mut Modifiers, vitals: &mut Vitals) {
    stats.clamp();
    modifiers.clamp();
    refresh_vitals(vitals, stats, modifiers);
}
