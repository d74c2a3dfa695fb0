//! Engine error types.

use crate::arena::{ArenaState, CombatMode};

/// Broken simulation invariant. Halts the run; never panics.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    MissingPlayer,
    OrphanEnemy {
        enemy: u32,
        arena: u32,
    },
    IllegalArenaTransition {
        arena: u32,
        from: ArenaState,
        to: ArenaState,
    },
    IllegalModeTransition {
        from: CombatMode,
        to: CombatMode,
    },
    NoArena,
    ActiveArenaCount {
        mode: CombatMode,
        active: usize,
    },
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimError::MissingPlayer => write!(f, "Player entity is missing"),
            SimError::OrphanEnemy { enemy, arena } => {
                write!(f, "Enemy {} claims arena {} which does not own it", enemy, arena)
            }
            SimError::IllegalArenaTransition { arena, from, to } => {
                write!(f, "Arena {} cannot go from {:?} to {:?}", arena, from, to)
            }
            SimError::IllegalModeTransition { from, to } => {
                write!(f, "Combat mode cannot go from {:?} to {:?}", from, to)
            }
            SimError::NoArena => write!(f, "No arena to fight in"),
            SimError::ActiveArenaCount { mode, active } => {
                write!(f, "{} arenas active in {:?} mode", active, mode)
            }
        }
    }
}

impl std::error::Error for SimError {}

/// Rejected perk selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceError {
    NotPaused,
    InvalidIndex { index: usize, available: usize },
}

impl std::fmt::Display for ChoiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChoiceError::NotPaused => write!(f, "No perk choice is pending"),
            ChoiceError::InvalidIndex { index, available } => {
                write!(f, "Perk index {} out of range ({} offered)", index, available)
            }
        }
    }
}

impl std::error::Error for ChoiceError {}
