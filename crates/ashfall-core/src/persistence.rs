//! Save/Load functionality for persisting simulation state
//!
//! Sessions use bincode: every piece of engine state plus each entity's
//! components as optionals, rebuilt component by component on load.
//! Entities are written in a fixed order (player, then enemies, projectiles
//! and items by id) so identical sessions produce identical bytes.
//!
//! The meta record is stored as JSON instead, since it outlives any session
//! and is meant to be inspected by hand.

use ashfall_logic::dungeon::Dungeon;
use ashfall_logic::meta::{MetaRecord, RawMetaRecord};
use ashfall_logic::rng::SeededRng;
use hecs::World;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::arena::ArenaManager;
use crate::components::*;
use crate::config::SimConfig;
use crate::engine::SimulationEngine;
use crate::events::RunStatus;
use crate::schedule::Schedule;
use crate::systems::IdAllocator;

/// Version number for save file format (increment when format changes)
const SAVE_VERSION: u32 = 2;

/// Serializable snapshot of a session
#[derive(Serialize, Deserialize)]
pub struct SaveData {
    /// Save format version
    pub version: u32,
    pub config: SimConfig,
    pub seed: u32,
    /// Generator state at the moment of saving
    pub rng: SeededRng,
    pub dungeon: Dungeon,
    pub arenas: ArenaManager,
    /// Pending melee strikes, telegraph ends, modifier expiries, advances
    pub schedule: Schedule,
    pub meta: MetaRecord,
    pub status: RunStatus,
    pub pending_perks: Vec<usize>,
    pub floor: u32,
    pub ids: IdAllocator,
    /// Simulation time in seconds
    pub sim_time: f64,
    pub tick_count: u64,
    /// All entities with their components
    pub entities: Vec<SerializableEntity>,
}

/// All possible components for an entity, serialized as optionals
#[derive(Serialize, Deserialize, Default)]
pub struct SerializableEntity {
    pub body: Option<Body>,
    pub player: Option<Player>,
    pub enemy: Option<Enemy>,
    pub projectile: Option<Projectile>,
    pub item: Option<WorldItem>,
}

/// Sort key giving the player first, then each kind in id order.
fn entity_order(se: &SerializableEntity) -> (u8, u32) {
    if se.player.is_some() {
        (0, 0)
    } else if let Some(e) = &se.enemy {
        (1, e.id)
    } else if let Some(p) = &se.projectile {
        (2, p.id)
    } else if let Some(i) = &se.item {
        (3, i.id)
    } else {
        (4, 0)
    }
}

/// Extract all entities from a world into serializable form
fn serialize_entities(world: &World) -> Vec<SerializableEntity> {
    let mut entities: Vec<SerializableEntity> = world
        .iter()
        .map(|entity_ref| SerializableEntity {
            body: entity_ref.get::<&Body>().map(|c| *c),
            player: entity_ref.get::<&Player>().map(|c| (*c).clone()),
            enemy: entity_ref.get::<&Enemy>().map(|c| (*c).clone()),
            projectile: entity_ref.get::<&Projectile>().map(|c| *c),
            item: entity_ref.get::<&WorldItem>().map(|c| *c),
        })
        .collect();
    entities.sort_by_key(entity_order);
    entities
}

/// Spawn an entity with all its components
fn spawn_entity(world: &mut World, se: SerializableEntity) {
    let entity = world.spawn(());

    if let Some(c) = se.body {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.player {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.enemy {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.projectile {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.item {
        let _ = world.insert_one(entity, c);
    }
}

/// Save the complete session to a writer
pub fn save_simulation<W: Write>(writer: W, engine: &SimulationEngine) -> Result<(), SaveError> {
    let save_data = SaveData {
        version: SAVE_VERSION,
        config: engine.config.clone(),
        seed: engine.seed,
        rng: engine.rng.clone(),
        dungeon: engine.dungeon.clone(),
        arenas: engine.arenas.clone(),
        schedule: engine.schedule.clone(),
        meta: engine.meta.clone(),
        status: engine.status,
        pending_perks: engine.pending_perks.clone(),
        floor: engine.floor,
        ids: engine.ids.clone(),
        sim_time: engine.sim_time,
        tick_count: engine.tick_count,
        entities: serialize_entities(&engine.world),
    };

    bincode::serialize_into(writer, &save_data)?;
    Ok(())
}

/// Load a session from a reader
pub fn load_simulation<R: Read>(reader: R) -> Result<SimulationEngine, SaveError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;

    if save_data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }

    let mut world = World::new();
    for se in save_data.entities {
        spawn_entity(&mut world, se);
    }

    Ok(SimulationEngine {
        world,
        config: save_data.config,
        seed: save_data.seed,
        rng: save_data.rng,
        dungeon: save_data.dungeon,
        arenas: save_data.arenas,
        schedule: save_data.schedule,
        meta: save_data.meta,
        status: save_data.status,
        pending_perks: save_data.pending_perks,
        floor: save_data.floor,
        ids: save_data.ids,
        sim_time: save_data.sim_time,
        tick_count: save_data.tick_count,
    })
}

/// Errors that can occur during save/load
#[derive(Debug)]
pub enum SaveError {
    Io(std::io::Error),
    Bincode(Box<bincode::ErrorKind>),
    VersionMismatch { expected: u32, found: u32 },
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for SaveError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        SaveError::Bincode(e)
    }
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "IO error: {}", e),
            SaveError::Bincode(e) => write!(f, "Serialization error: {}", e),
            SaveError::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Save version mismatch: expected {}, found {}",
                    expected, found
                )
            }
        }
    }
}

impl std::error::Error for SaveError {}

/// Errors reading or writing the meta record
#[derive(Debug)]
pub enum PersistError {
    Json(serde_json::Error),
}

impl From<serde_json::Error> for PersistError {
    fn from(e: serde_json::Error) -> Self {
        PersistError::Json(e)
    }
}

impl std::fmt::Display for PersistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistError::Json(e) => write!(f, "Meta record error: {}", e),
        }
    }
}

impl std::error::Error for PersistError {}

/// JSON form of the persistent meta record.
pub trait MetaRecordJson: Sized {
    /// Parse a stored record. Stat fields and the cost table are required;
    /// out-of-range values are floored and clamped.
    fn from_json(json: &str) -> Result<Self, PersistError>;

    /// Parse a stored record, or start fresh when it is missing or corrupt.
    fn load_or_default(json: Option<&str>) -> Self;

    fn to_json(&self) -> Result<String, PersistError>;
}

impl MetaRecordJson for MetaRecord {
    fn from_json(json: &str) -> Result<Self, PersistError> {
        let raw: RawMetaRecord = serde_json::from_str(json)?;
        Ok(raw.into())
    }

    fn load_or_default(json: Option<&str>) -> Self {
        let Some(json) = json else {
            return MetaRecord::default();
        };
        match Self::from_json(json) {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Discarding unreadable meta record: {}", e);
                MetaRecord::default()
            }
        }
    }

    fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
