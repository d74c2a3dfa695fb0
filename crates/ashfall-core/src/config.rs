//! Simulation tunables.
//!
//! Every field has a default, so a partial JSON document only overrides what
//! it names.

use ashfall_logic::dungeon::DungeonConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Generation parameters for each floor
    pub dungeon: DungeonConfig,
    /// Largest step a single tick may advance, in seconds
    pub max_step: f32,
    pub base_enemy_count: f32,
    /// Enemy count growth per player level
    pub level_scaling: f32,
    /// Enemy count growth per arena index
    pub arena_scaling: f32,
    /// Every n-th arena is a boss arena
    pub boss_every: u32,
    /// Spawn ring radius as a fraction of the arena's shorter side
    pub spawn_ring: f32,
    pub clear_reward: u32,
    pub boss_clear_reward: u32,
    /// Seconds between leaving a cleared arena and entering the next
    pub transition_delay: f32,
    pub exit_radius: f32,
    /// Exit zone distance above the arena's bottom edge
    pub exit_offset: f32,
    pub perk_choices: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dungeon: DungeonConfig::floor(),
            max_step: 0.1,
            base_enemy_count: 8.0,
            level_scaling: 0.15,
            arena_scaling: 0.05,
            boss_every: 5,
            spawn_ring: 0.3,
            clear_reward: 10,
            boss_clear_reward: 50,
            transition_delay: 0.6,
            exit_radius: 50.0,
            exit_offset: 20.0,
            perk_choices: 3,
        }
    }
}

impl SimConfig {
    /// Parse a (possibly partial) JSON config and check it is usable.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.dungeon.tile_size.is_finite() && self.dungeon.tile_size > 0.0) {
            return Err(ConfigError::Invalid("dungeon.tile_size must be positive".into()));
        }
        if !(self.max_step.is_finite() && self.max_step > 0.0) {
            return Err(ConfigError::Invalid("max_step must be positive".into()));
        }
        if self.boss_every == 0 {
            return Err(ConfigError::Invalid("boss_every must be at least 1".into()));
        }
        Ok(())
    }

    /// Enemies spawned in arena `index` at player `level`.
    pub fn enemy_count(&self, index: usize, level: u32) -> u32 {
        let count = self.base_enemy_count
            * (1.0 + self.level_scaling * level as f32)
            * (1.0 + self.arena_scaling * index as f32);
        count.max(0.0).floor() as u32
    }

    pub fn is_boss_arena(&self, index: usize) -> bool {
        (index + 1) % self.boss_every.max(1) as usize == 0
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Json(serde_json::Error),
    Invalid(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Json(e) => write!(f, "Malformed config: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
