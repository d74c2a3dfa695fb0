//! Meta-progression record: baseline stats, upgrade costs, banked ash.
//!
//! The record outlives runs. A run copies its baseline into run stats; game
//! over deposits the run's ash back. Storage is someone else's job; this
//! module only defines the record, its sanitizing rules, and purchases.

use serde::{Deserialize, Serialize};

use crate::stats::{StatKind, Stats};

/// Lowest cost any upgrade may have after sanitizing.
pub const MIN_UPGRADE_COST: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeCosts {
    pub might: u32,
    pub focus: u32,
    pub grit: u32,
    pub haste: u32,
    pub luck: u32,
}

impl Default for UpgradeCosts {
    fn default() -> Self {
        Self {
            might: 150,
            focus: 150,
            grit: 100,
            haste: 120,
            luck: 200,
        }
    }
}

impl UpgradeCosts {
    pub fn get(&self, kind: StatKind) -> u32 {
        match kind {
            StatKind::Might => self.might,
            StatKind::Focus => self.focus,
            StatKind::Grit => self.grit,
            StatKind::Haste => self.haste,
            StatKind::Luck => self.luck,
        }
    }

    fn get_mut(&mut self, kind: StatKind) -> &mut u32 {
        match kind {
            StatKind::Might => &mut self.might,
            StatKind::Focus => &mut self.focus,
            StatKind::Grit => &mut self.grit,
            StatKind::Haste => &mut self.haste,
            StatKind::Luck => &mut self.luck,
        }
    }
}

/// Cost of the purchase after one at `cost`.
pub fn escalate_cost(cost: u32) -> u32 {
    (cost as f64 * 1.25 + 20.0).floor() as u32
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaRecord {
    pub level: u32,
    pub might: i32,
    pub focus: i32,
    pub grit: i32,
    pub haste: i32,
    pub luck: i32,
    pub costs: UpgradeCosts,
    /// Banked currency
    pub ash: u32,
}

impl Default for MetaRecord {
    fn default() -> Self {
        Self::from_baseline(Stats::default(), UpgradeCosts::default(), 0)
    }
}

impl MetaRecord {
    pub fn from_baseline(stats: Stats, costs: UpgradeCosts, ash: u32) -> Self {
        Self {
            level: stats.level,
            might: stats.might,
            focus: stats.focus,
            grit: stats.grit,
            haste: stats.haste,
            luck: stats.luck,
            costs,
            ash,
        }
    }

    pub fn baseline(&self) -> Stats {
        Stats {
            level: self.level,
            might: self.might,
            focus: self.focus,
            grit: self.grit,
            haste: self.haste,
            luck: self.luck,
        }
    }

    /// Starting stats for a new run: the baseline, clamped to valid ranges.
    pub fn run_stats(&self) -> Stats {
        let mut stats = self.baseline();
        stats.clamp();
        stats
    }

    pub fn deposit(&mut self, ash: u32) {
        self.ash = self.ash.saturating_add(ash);
    }

    /// Buy one point of `stat`. Returns the new baseline value.
    pub fn purchase(&mut self, stat: StatKind) -> Result<i32, UpgradeError> {
        let cost = self.costs.get(stat);
        if self.ash < cost {
            return Err(UpgradeError::InsufficientAsh {
                cost,
                available: self.ash,
            });
        }
        self.ash -= cost;
        *self.costs.get_mut(stat) = escalate_cost(cost);

        let mut baseline = self.baseline();
        let v = baseline.get_mut(stat);
        *v = v.saturating_add(1);
        let new_value = *v;
        *self = Self::from_baseline(baseline, self.costs, self.ash);
        Ok(new_value)
    }
}

/// Loosely-typed record as read from storage, before sanitizing.
///
/// Stat fields are required; a record missing any of them is structurally
/// invalid. Costs fall back per field, ash falls back to zero.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMetaRecord {
    pub level: f64,
    pub might: f64,
    pub focus: f64,
    pub grit: f64,
    pub haste: f64,
    pub luck: f64,
    pub costs: RawUpgradeCosts,
    #[serde(default)]
    pub ash: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawUpgradeCosts {
    #[serde(default)]
    pub might: Option<f64>,
    #[serde(default)]
    pub focus: Option<f64>,
    #[serde(default)]
    pub grit: Option<f64>,
    #[serde(default)]
    pub haste: Option<f64>,
    #[serde(default)]
    pub luck: Option<f64>,
}

fn floor_at_least(v: f64, min: f64) -> f64 {
    if v.is_finite() {
        v.floor().max(min)
    } else {
        min
    }
}

fn sanitize_cost(raw: Option<f64>, default: u32) -> u32 {
    let v = match raw {
        Some(c) if c.is_finite() && c != 0.0 => c,
        _ => default as f64,
    };
    floor_at_least(v, MIN_UPGRADE_COST as f64) as u32
}

impl From<RawMetaRecord> for MetaRecord {
    fn from(raw: RawMetaRecord) -> Self {
        let defaults = UpgradeCosts::default();
        Self {
            level: floor_at_least(raw.level, 1.0) as u32,
            might: floor_at_least(raw.might, 0.0) as i32,
            focus: floor_at_least(raw.focus, 0.0) as i32,
            grit: floor_at_least(raw.grit, 0.0) as i32,
            haste: floor_at_least(raw.haste, 0.0) as i32,
            luck: floor_at_least(raw.luck, 0.0) as i32,
            costs: UpgradeCosts {
                might: sanitize_cost(raw.costs.might, defaults.might),
                focus: sanitize_cost(raw.costs.focus, defaults.focus),
                grit: sanitize_cost(raw.costs.grit, defaults.grit),
                haste: sanitize_cost(raw.costs.haste, defaults.haste),
                luck: sanitize_cost(raw.costs.luck, defaults.luck),
            },
            ash: floor_at_least(raw.ash.unwrap_or(0.0), 0.0) as u32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeError {
    InsufficientAsh { cost: u32, available: u32 },
}

impl std::fmt::Display for UpgradeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpgradeError::InsufficientAsh { cost, available } => {
                write!(f, "Upgrade costs {} ash, only {} available", cost, available)
            }
        }
    }
}

impl std::error::Error for UpgradeError {}
