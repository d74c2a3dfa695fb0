//! Events and snapshots handed back to the presentation layer each tick.

use ashfall_logic::combat::EnemyKind;
use ashfall_logic::geometry::Vec2;
use ashfall_logic::meta::MetaRecord;
use ashfall_logic::perks::Rarity;
use serde::{Deserialize, Serialize};

use crate::arena::CombatMode;
use crate::components::Owner;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerAction {
    Dash,
    Heavy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    InsufficientStamina,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageSource {
    Contact,
    Melee,
    Projectile,
}

/// Something that happened during a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    DamageTaken {
        amount: f32,
        health: f32,
        source: DamageSource,
    },
    EnemyDamaged {
        enemy: u32,
        amount: f32,
        health: f32,
    },
    PoiseBroken {
        enemy: u32,
    },
    /// An enemy began winding up a melee swing or a shot
    EnemyTelegraph {
        enemy: u32,
    },
    EnemyKilled {
        enemy: u32,
        kind: EnemyKind,
        position: Vec2,
    },
    ItemDropped {
        item: u32,
        name: String,
        rarity: Rarity,
        position: Vec2,
    },
    ItemPickedUp {
        name: String,
        rarity: Rarity,
    },
    CurrencyGained {
        amount: u32,
        total: u32,
    },
    DashStarted {
        direction: Vec2,
    },
    ActionRejected {
        action: PlayerAction,
        reason: RejectReason,
    },
    LevelUp {
        level: u32,
        choices: Vec<String>,
    },
    PerkChosen {
        name: String,
    },
    RoomCleared {
        arena: u32,
        boss: bool,
        reward: u32,
    },
    ArenaEntered {
        arena: u32,
        enemies: u32,
        boss: bool,
    },
    FloorGenerated {
        floor: u32,
        rooms: u32,
    },
    GameOver {
        ash_earned: u32,
        ash_total: u32,
    },
    MetaRecordUpdated {
        record: MetaRecord,
    },
    RunHalted {
        reason: String,
    },
}

/// Where the run stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// No run started yet
    Idle,
    Running,
    GameOver,
    /// Stopped by a broken invariant
    Halted,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub pos: Vec2,
    pub vel: Vec2,
    pub facing: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub stamina: f32,
    pub max_stamina: f32,
    pub level: u32,
    pub xp: f32,
    pub xp_next: u32,
    pub ash: u32,
    pub dashing: bool,
    pub invulnerable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemyView {
    pub id: u32,
    pub kind: EnemyKind,
    pub pos: Vec2,
    pub radius: f32,
    pub health: f32,
    pub max_health: f32,
    pub poise: f32,
    pub max_poise: f32,
    pub stunned: bool,
    pub telegraphing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileView {
    pub pos: Vec2,
    pub radius: f32,
    pub owner: Owner,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemView {
    pub id: u32,
    pub name: String,
    pub rarity: Rarity,
    pub pos: Vec2,
}

/// Read-only view of the simulation after a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    pub time: f64,
    pub status: RunStatus,
    pub mode: CombatMode,
    pub floor: u32,
    pub arena: u32,
    pub arena_count: u32,
    pub paused: bool,
    /// Names of the perks offered while paused
    pub perk_choices: Vec<String>,
    pub player: Option<PlayerView>,
    pub enemies: Vec<EnemyView>,
    pub projectiles: Vec<ProjectileView>,
    pub items: Vec<ItemView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickOutput {
    pub events: Vec<SimEvent>,
    pub snapshot: Snapshot,
}
