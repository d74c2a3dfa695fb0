//! Component definitions for the ECS simulation.
//!
//! Components are pure data structs attached to entities.
//! They have no behavior beyond small helpers - that lives in systems.

mod actors;
mod common;
mod loot;

pub use actors::*;
pub use common::*;
pub use loot::*;
