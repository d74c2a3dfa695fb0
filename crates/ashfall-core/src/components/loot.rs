//! Projectiles and dropped items.

use ashfall_logic::perks::{Template, ITEM_POOL};
use serde::{Deserialize, Serialize};

/// World radius of a dropped item
pub const ITEM_RADIUS: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    Player,
    Enemy,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Projectile {
    /// Spawn-order id, used to resolve hits deterministically
    pub id: u32,
    pub owner: Owner,
    /// Arena the shot was fired in; it never touches any other
    pub arena: u32,
    pub damage: f32,
    pub poise_damage: f32,
    /// Seconds left before the projectile fizzles
    pub lifetime: f32,
}

/// An item lying in an arena, waiting to be picked up.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WorldItem {
    pub id: u32,
    /// Index into [`ITEM_POOL`]
    pub template: usize,
    pub arena: u32,
}

impl WorldItem {
    pub fn template(&self) -> Option<&'static Template> {
        ITEM_POOL.get(self.template)
    }
}
