//! Ashfall Core - Arena Combat Simulation Engine
//!
//! A deterministic, tick-driven simulation of a roguelite run: a procedurally
//! generated floor of rooms, fought through one arena at a time, with perks,
//! items and a persistent meta record between runs.
//!
//! # Architecture
//!
//! The simulation uses an Entity Component System (ECS) architecture via `hecs`:
//! - **Entities**: The player, enemies, projectiles, dropped items
//! - **Components**: Pure data attached to entities (Body, Player, Enemy, etc.)
//! - **Systems**: Logic that queries and updates components, in a fixed order
//!
//! Arena flow, the time-ordered schedule and the tile grid live outside the
//! world in the engine itself. Each tick consumes a [`input::TickInput`] and
//! returns the events it produced plus a snapshot for rendering.
//!
//! # Example
//!
//! ```rust,no_run
//! use ashfall_core::prelude::*;
//!
//! let mut engine = SimulationEngine::new(SimConfig::default(), 1234);
//! engine.start_run(&MetaRecord::default());
//!
//! // Run simulation
//! loop {
//!     let output = engine.tick(&TickInput::moving(1.0, 0.0), 1.0 / 60.0); // 60 FPS
//!     if output.snapshot.status != RunStatus::Running {
//!         break;
//!     }
//! }
//! ```

pub mod arena;
pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod input;
pub mod persistence;
pub mod schedule;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::arena::{ArenaState, CombatMode};
    pub use crate::components::*;
    pub use crate::config::SimConfig;
    pub use crate::engine::SimulationEngine;
    pub use crate::error::{ChoiceError, SimError};
    pub use crate::events::*;
    pub use crate::input::{AimTarget, TickInput};
    pub use crate::persistence::{MetaRecordJson, PersistError};
    pub use ashfall_logic::meta::MetaRecord;
}
