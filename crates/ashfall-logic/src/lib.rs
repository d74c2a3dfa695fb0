//! Pure game logic for Ashfall.
//!
//! This crate contains all logic that is independent of the ECS world,
//! storage, or presentation. Functions take plain data (and an RNG where
//! needed) and return results, so they are unit-testable and shared by the
//! simulation engine and the headless harness.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`combat`] | Shot patterns, enemy profiles, damage, drops, experience |
//! | [`disjoint_set`] | Union-find for the spanning-tree step |
//! | [`dungeon`] | Room placement, MST + loop corridors, carving, hazards |
//! | [`geometry`] | `Vec2`, `Rect`, circle overlap |
//! | [`grid`] | Floor/Wall/Void tile grid and axis-separated movement |
//! | [`meta`] | Persistent baseline stats, upgrade costs, sanitizing |
//! | [`perks`] | Item/perk pools, weighted draws, effect application |
//! | [`rng`] | Seeded Mulberry32 stream implementing `rand::RngCore` |
//! | [`stats`] | Run stats, modifiers, vitals, clamp ranges |

pub mod combat;
pub mod disjoint_set;
pub mod dungeon;
pub mod geometry;
pub mod grid;
pub mod meta;
pub mod perks;
pub mod rng;
pub mod stats;
