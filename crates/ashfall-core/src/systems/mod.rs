//! Systems - logic that operates on components
//!
//! Each system is a free function over the world plus a [`TickContext`]
//! holding the engine state it may touch. Systems collect what they need
//! first, then apply changes, and always visit entities in id order so a
//! restored session replays identically.

mod arena;
mod enemy;
mod loot;
mod player;
mod progression;
mod projectile;

pub use arena::*;
pub use enemy::*;
pub use loot::*;
pub use player::*;
pub use progression::*;
pub use projectile::*;

use ashfall_logic::grid::TileGrid;
use ashfall_logic::rng::SeededRng;
use hecs::{Entity, World};
use serde::{Deserialize, Serialize};

use crate::arena::ArenaManager;
use crate::components::{Body, Player};
use crate::config::SimConfig;
use crate::error::SimError;
use crate::events::SimEvent;
use crate::schedule::Schedule;

/// Hands out run-unique ids for enemies, projectiles and items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn next_id(&mut self) -> u32 {
        let id = self.next;
        self.next = self.next.wrapping_add(1);
        id
    }
}

/// Engine state borrowed by systems for one phase of a tick.
pub struct TickContext<'a> {
    pub grid: &'a TileGrid,
    pub arenas: &'a mut ArenaManager,
    pub schedule: &'a mut Schedule,
    pub rng: &'a mut SeededRng,
    pub ids: &'a mut IdAllocator,
    pub events: &'a mut Vec<SimEvent>,
    pub config: &'a SimConfig,
    /// Simulation time, in seconds
    pub now: f64,
}

impl TickContext<'_> {
    /// Index of the arena whose members are simulated.
    pub fn current_arena(&self) -> u32 {
        self.arenas.current_index() as u32
    }
}

pub fn find_player(world: &World) -> Result<Entity, SimError> {
    world
        .query::<&Player>()
        .iter()
        .next()
        .map(|(entity, _)| entity)
        .ok_or(SimError::MissingPlayer)
}

pub fn player_body(world: &World, player: Entity) -> Result<Body, SimError> {
    world
        .get::<&Body>(player)
        .map(|body| *body)
        .map_err(|_| SimError::MissingPlayer)
}
