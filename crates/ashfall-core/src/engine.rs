//! Simulation engine - main entry point for running a run

use ashfall_logic::combat::PLAYER_RADIUS;
use ashfall_logic::dungeon::{generate, Dungeon};
use ashfall_logic::geometry::Vec2;
use ashfall_logic::grid::{Tile, TileGrid};
use ashfall_logic::meta::MetaRecord;
use ashfall_logic::perks::PERK_POOL;
use ashfall_logic::rng::SeededRng;
use hecs::World;

use crate::arena::{ArenaManager, CombatMode};
use crate::components::*;
use crate::config::SimConfig;
use crate::error::{ChoiceError, SimError};
use crate::events::*;
use crate::input::TickInput;
use crate::schedule::{Schedule, ScheduledAction};
use crate::systems::*;

/// Main simulation engine
///
/// Owns the ECS world and every piece of run state. Independent engines
/// share nothing.
pub struct SimulationEngine {
    /// ECS world containing the player, enemies, projectiles and items
    pub world: World,
    pub(crate) config: SimConfig,
    pub(crate) seed: u32,
    pub(crate) rng: SeededRng,
    pub(crate) dungeon: Dungeon,
    pub(crate) arenas: ArenaManager,
    pub(crate) schedule: Schedule,
    pub(crate) meta: MetaRecord,
    pub(crate) status: RunStatus,
    /// Perk indices offered by the pending level-up
    pub(crate) pending_perks: Vec<usize>,
    pub(crate) floor: u32,
    pub(crate) ids: IdAllocator,
    /// Simulation time in seconds since the run started
    pub(crate) sim_time: f64,
    pub(crate) tick_count: u64,
}

fn empty_dungeon(tile_size: f32) -> Dungeon {
    Dungeon {
        grid: TileGrid::new(0, 0, tile_size, Tile::Wall),
        rooms: Vec::new(),
        corridors: Vec::new(),
        connections: Vec::new(),
    }
}

impl SimulationEngine {
    /// Create an idle engine. Nothing is generated until [`start_run`].
    ///
    /// [`start_run`]: SimulationEngine::start_run
    pub fn new(config: SimConfig, seed: u32) -> Self {
        let dungeon = empty_dungeon(config.dungeon.tile_size);
        Self {
            world: World::new(),
            config,
            seed,
            rng: SeededRng::new(seed),
            dungeon,
            arenas: ArenaManager::new(Vec::new()),
            schedule: Schedule::new(),
            meta: MetaRecord::default(),
            status: RunStatus::Idle,
            pending_perks: Vec::new(),
            floor: 0,
            ids: IdAllocator::default(),
            sim_time: 0.0,
            tick_count: 0,
        }
    }

    /// Start a fresh run from a meta record's baseline: new player, first
    /// floor, first arena. Any previous run is discarded.
    pub fn start_run(&mut self, meta: &MetaRecord) -> Vec<SimEvent> {
        self.world.clear();
        self.schedule = Schedule::new();
        self.pending_perks.clear();
        self.meta = meta.clone();
        self.floor = 0;
        self.sim_time = 0.0;
        self.tick_count = 0;
        self.status = RunStatus::Running;

        let stats = meta.run_stats();
        self.world
            .spawn((Body::new(Vec2::ZERO, PLAYER_RADIUS), Player::new(stats)));
        log::info!("Run started (seed {}, level {})", self.seed, stats.level);

        let mut events = Vec::new();
        if let Err(err) = self.generate_floor(&mut events) {
            self.halt(err, &mut events);
        }
        events
    }

    /// Advance the simulation by `dt` seconds (clamped to the configured
    /// maximum step). Paused, finished or halted runs only report state.
    pub fn tick(&mut self, input: &TickInput, dt: f32) -> TickOutput {
        let mut events = Vec::new();
        if self.status == RunStatus::Running && self.pending_perks.is_empty() {
            let dt = if dt.is_finite() {
                dt.clamp(0.0, self.config.max_step)
            } else {
                0.0
            };
            if let Err(err) = self.step(input, dt, &mut events) {
                self.halt(err, &mut events);
            }
        }
        TickOutput {
            events,
            snapshot: self.snapshot(),
        }
    }

    fn step(&mut self, input: &TickInput, dt: f32, events: &mut Vec<SimEvent>) -> Result<(), SimError> {
        self.check_invariants()?;
        self.sim_time += dt as f64;
        self.tick_count += 1;

        self.run_schedule(events)?;
        if self.finish_if_dead(events)? {
            return Ok(());
        }

        {
            let (world, mut ctx) = self.split(events);
            player_system(world, &mut ctx, input, dt)?;
        }
        if self.finish_if_dead(events)? {
            return Ok(());
        }

        {
            let (world, mut ctx) = self.split(events);
            enemy_system(world, &mut ctx, dt)?;
            projectile_system(world, &mut ctx, dt)?;
        }
        if self.finish_if_dead(events)? {
            return Ok(());
        }

        let choices = {
            let (world, mut ctx) = self.split(events);
            death_system(world, &mut ctx)?;
            pickup_system(world, &mut ctx)?;
            let choices = level_up_system(world, &mut ctx)?;
            clear_system(world, &mut ctx)?;
            exit_zone_system(world, &mut ctx, input)?;
            choices
        };
        if let Some(choices) = choices {
            self.pending_perks = choices;
        }
        Ok(())
    }

    /// Borrow the world and the rest of the engine state separately.
    fn split<'a>(&'a mut self, events: &'a mut Vec<SimEvent>) -> (&'a mut World, TickContext<'a>) {
        let now = self.sim_time;
        (
            &mut self.world,
            TickContext {
                grid: &self.dungeon.grid,
                arenas: &mut self.arenas,
                schedule: &mut self.schedule,
                rng: &mut self.rng,
                ids: &mut self.ids,
                events,
                config: &self.config,
                now,
            },
        )
    }

    fn run_schedule(&mut self, events: &mut Vec<SimEvent>) -> Result<(), SimError> {
        for action in self.schedule.drain_due(self.sim_time) {
            match action {
                ScheduledAction::MeleeStrike { enemy } => {
                    let (world, mut ctx) = self.split(events);
                    resolve_melee_strike(world, &mut ctx, enemy)?;
                }
                ScheduledAction::EndTelegraph { enemy } => end_telegraph(&mut self.world, enemy),
                ScheduledAction::ExpireModifier { kind, amount } => {
                    expire_modifier(&mut self.world, kind, amount)?;
                }
                ScheduledAction::AdvanceArena => self.advance_arena(events)?,
            }
        }
        Ok(())
    }

    fn advance_arena(&mut self, events: &mut Vec<SimEvent>) -> Result<(), SimError> {
        match self.arenas.next_index() {
            Some(next) => {
                let (world, mut ctx) = self.split(events);
                enter_arena(world, &mut ctx, next)?;
                Ok(())
            }
            None => self.generate_floor(events),
        }
    }

    /// Replace the dungeon wholesale: new grid and arenas, no stale enemies,
    /// projectiles or items, then enter arena 0.
    fn generate_floor(&mut self, events: &mut Vec<SimEvent>) -> Result<(), SimError> {
        self.floor += 1;
        self.dungeon = generate(&self.config.dungeon, &mut self.rng);
        self.arenas = ArenaManager::from_dungeon(&self.dungeon, &self.config);
        if self.dungeon.rooms.is_empty() {
            if let Some(arena) = self.arenas.current() {
                let bounds = arena.bounds;
                self.dungeon.grid.fill_rect(&bounds, Tile::Floor);
                log::warn!("Floor {} has no rooms, using fallback arena", self.floor);
            }
        }

        let stale: Vec<hecs::Entity> = self
            .world
            .iter()
            .filter(|e| !e.has::<Player>())
            .map(|e| e.entity())
            .collect();
        for entity in stale {
            let _ = self.world.despawn(entity);
        }
        self.schedule.clear_enemy_actions();

        log::info!(
            "Floor {} generated: {} rooms, {} corridors",
            self.floor,
            self.dungeon.rooms.len(),
            self.dungeon.corridors.len()
        );
        events.push(SimEvent::FloorGenerated {
            floor: self.floor,
            rooms: self.dungeon.rooms.len() as u32,
        });

        let (world, mut ctx) = self.split(events);
        enter_arena(world, &mut ctx, 0)?;
        Ok(())
    }

    fn check_invariants(&self) -> Result<(), SimError> {
        find_player(&self.world)?;
        if self.arenas.is_empty() {
            return Err(SimError::NoArena);
        }
        for (_, enemy) in self.world.query::<&Enemy>().iter() {
            if !self.arenas.owns(enemy.arena, enemy.id) {
                return Err(SimError::OrphanEnemy {
                    enemy: enemy.id,
                    arena: enemy.arena,
                });
            }
        }
        let active = self.arenas.active_count();
        let fighting = self.arenas.mode() == CombatMode::Fight;
        if active > 1 || (fighting && active != 1) {
            return Err(SimError::ActiveArenaCount {
                mode: self.arenas.mode(),
                active,
            });
        }
        Ok(())
    }

    /// End the run if the player is dead: bank the run's ash into the meta
    /// record and report both.
    fn finish_if_dead(&mut self, events: &mut Vec<SimEvent>) -> Result<bool, SimError> {
        let player = find_player(&self.world)?;
        let (dead, ash) = {
            let p = self
                .world
                .get::<&Player>(player)
                .map_err(|_| SimError::MissingPlayer)?;
            (p.vitals.is_dead(), p.ash)
        };
        if !dead {
            return Ok(false);
        }

        self.status = RunStatus::GameOver;
        self.meta.deposit(ash);
        log::info!("Game over: {} ash banked, {} total", ash, self.meta.ash);
        events.push(SimEvent::GameOver {
            ash_earned: ash,
            ash_total: self.meta.ash,
        });
        events.push(SimEvent::MetaRecordUpdated {
            record: self.meta.clone(),
        });
        Ok(true)
    }

    fn halt(&mut self, err: SimError, events: &mut Vec<SimEvent>) {
        log::error!("Run halted: {}", err);
        self.status = RunStatus::Halted;
        events.push(SimEvent::RunHalted {
            reason: err.to_string(),
        });
    }

    /// Resolve a pending level-up by picking one of the offered perks.
    pub fn choose_perk(&mut self, index: usize) -> Result<Vec<SimEvent>, ChoiceError> {
        if self.pending_perks.is_empty() {
            return Err(ChoiceError::NotPaused);
        }
        let template = self
            .pending_perks
            .get(index)
            .and_then(|&perk| PERK_POOL.get(perk))
            .ok_or(ChoiceError::InvalidIndex {
                index,
                available: self.pending_perks.len(),
            })?;

        let mut events = Vec::new();
        let applied = find_player(&self.world).and_then(|player| {
            apply_template(
                &mut self.world,
                &mut self.schedule,
                self.sim_time,
                player,
                template,
            )
        });
        self.pending_perks.clear();
        match applied {
            Ok(()) => {
                log::info!("Perk chosen: {}", template.name);
                events.push(SimEvent::PerkChosen {
                    name: template.name.to_string(),
                });
            }
            Err(err) => self.halt(err, &mut events),
        }
        Ok(events)
    }

    /// Top-left corner of a `viewport`-sized view following the player
    /// inside the active arena.
    pub fn camera(&self, viewport: Vec2) -> Option<Vec2> {
        let arena = self.arenas.current()?;
        let player = find_player(&self.world).ok()?;
        let body = player_body(&self.world, player).ok()?;
        Some(arena.camera(body.pos, viewport))
    }

    pub fn snapshot(&self) -> Snapshot {
        let current = self.arenas.current_index() as u32;

        let player = self
            .world
            .query::<(&Body, &Player)>()
            .iter()
            .next()
            .map(|(_, (body, p))| PlayerView {
                pos: body.pos,
                vel: body.vel,
                facing: p.facing,
                health: p.vitals.health,
                max_health: p.vitals.max_health,
                stamina: p.vitals.stamina,
                max_stamina: p.vitals.max_stamina,
                level: p.stats.level,
                xp: p.experience.xp,
                xp_next: p.experience.threshold,
                ash: p.ash,
                dashing: p.timers.is_dashing(),
                invulnerable: p.is_invulnerable(),
            });

        let mut enemies: Vec<EnemyView> = self
            .world
            .query::<(&Body, &Enemy)>()
            .iter()
            .filter(|(_, (_, e))| e.arena == current)
            .map(|(_, (body, e))| EnemyView {
                id: e.id,
                kind: e.kind,
                pos: body.pos,
                radius: body.radius,
                health: e.health,
                max_health: e.max_health,
                poise: e.poise,
                max_poise: e.max_poise,
                stunned: e.is_stunned(),
                telegraphing: e.telegraphing,
            })
            .collect();
        enemies.sort_unstable_by_key(|e| e.id);

        let mut projectiles: Vec<(u32, ProjectileView)> = self
            .world
            .query::<(&Body, &Projectile)>()
            .iter()
            .filter(|(_, (_, shot))| shot.arena == current)
            .map(|(_, (body, shot))| {
                (
                    shot.id,
                    ProjectileView {
                        pos: body.pos,
                        radius: body.radius,
                        owner: shot.owner,
                    },
                )
            })
            .collect();
        projectiles.sort_unstable_by_key(|p| p.0);

        let mut items: Vec<ItemView> = self
            .world
            .query::<(&Body, &WorldItem)>()
            .iter()
            .filter(|(_, (_, item))| item.arena == current)
            .filter_map(|(_, (body, item))| {
                item.template().map(|t| ItemView {
                    id: item.id,
                    name: t.name.to_string(),
                    rarity: t.rarity,
                    pos: body.pos,
                })
            })
            .collect();
        items.sort_unstable_by_key(|i| i.id);

        Snapshot {
            tick: self.tick_count,
            time: self.sim_time,
            status: self.status,
            mode: self.arenas.mode(),
            floor: self.floor,
            arena: current,
            arena_count: self.arenas.len() as u32,
            paused: !self.pending_perks.is_empty(),
            perk_choices: self
                .pending_perks
                .iter()
                .filter_map(|&i| PERK_POOL.get(i))
                .map(|t| t.name.to_string())
                .collect(),
            player,
            enemies,
            projectiles: projectiles.into_iter().map(|(_, p)| p).collect(),
            items,
        }
    }

    /// Save the session to a writer
    pub fn save<W: std::io::Write>(&self, writer: W) -> Result<(), crate::persistence::SaveError> {
        crate::persistence::save_simulation(writer, self)
    }

    /// Replace this engine's state with a saved session
    pub fn load<R: std::io::Read>(&mut self, reader: R) -> Result<(), crate::persistence::SaveError> {
        *self = crate::persistence::load_simulation(reader)?;
        Ok(())
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn mode(&self) -> CombatMode {
        self.arenas.mode()
    }

    pub fn is_paused(&self) -> bool {
        !self.pending_perks.is_empty()
    }

    pub fn meta(&self) -> &MetaRecord {
        &self.meta
    }

    pub fn dungeon(&self) -> &Dungeon {
        &self.dungeon
    }

    pub fn arenas(&self) -> &ArenaManager {
        &self.arenas
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn floor(&self) -> u32 {
        self.floor
    }

    /// Simulation time in seconds
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Copy of the player's body and state, if a run is live
    pub fn player(&self) -> Option<(Body, Player)> {
        self.world
            .query::<(&Body, &Player)>()
            .iter()
            .next()
            .map(|(_, (body, p))| (*body, p.clone()))
    }

    /// Count enemies alive in any arena
    pub fn enemy_count(&self) -> usize {
        self.world.query::<&Enemy>().iter().count()
    }

    pub fn projectile_count(&self) -> usize {
        self.world.query::<&Projectile>().iter().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ashfall_logic::dungeon::DungeonConfig;

    fn small_config() -> SimConfig {
        SimConfig {
            dungeon: DungeonConfig {
                max_rooms: 6,
                void_density: 0.0,
                ..DungeonConfig::default()
            },
            ..SimConfig::default()
        }
    }

    #[test]
    fn test_engine_creation() {
        let mut engine = SimulationEngine::new(small_config(), 1);
        assert_eq!(engine.status(), RunStatus::Idle);
        assert_eq!(engine.sim_time(), 0.0);
        // Idle engines ignore ticks.
        let out = engine.tick(&TickInput::idle(), 0.016);
        assert!(out.events.is_empty());
        assert_eq!(out.snapshot.tick, 0);
    }

    #[test]
    fn test_start_run_enters_first_arena() {
        let mut engine = SimulationEngine::new(small_config(), 7);
        let events = engine.start_run(&MetaRecord::default());
        assert!(matches!(events[0], SimEvent::FloorGenerated { floor: 1, .. }));
        assert!(events
            .iter()
            .any(|e| matches!(e, SimEvent::ArenaEntered { arena: 0, .. })));
        assert_eq!(engine.mode(), CombatMode::Fight);
        assert_eq!(engine.arenas().active_count(), 1);
        assert!(engine.enemy_count() > 0);

        let (body, _) = engine.player().unwrap();
        assert_eq!(body.pos, engine.arenas().current().unwrap().bounds.center());
    }

    #[test]
    fn test_dt_is_clamped() {
        let mut engine = SimulationEngine::new(small_config(), 3);
        engine.start_run(&MetaRecord::default());
        engine.tick(&TickInput::idle(), 5.0);
        assert!((engine.sim_time() - 0.1).abs() < 1e-9);
        engine.tick(&TickInput::idle(), -1.0);
        assert!((engine.sim_time() - 0.1).abs() < 1e-9);
        engine.tick(&TickInput::idle(), f32::NAN);
        assert_eq!(engine.tick_count(), 3);
    }

    #[test]
    fn test_choose_perk_without_level_up() {
        let mut engine = SimulationEngine::new(small_config(), 3);
        engine.start_run(&MetaRecord::default());
        assert_eq!(engine.choose_perk(0), Err(ChoiceError::NotPaused));
    }

    #[test]
    fn test_missing_player_halts() {
        let mut engine = SimulationEngine::new(small_config(), 3);
        engine.start_run(&MetaRecord::default());
        let player = find_player(&engine.world).unwrap();
        engine.world.despawn(player).unwrap();

        let out = engine.tick(&TickInput::idle(), 0.016);
        assert!(matches!(out.events.as_slice(), [SimEvent::RunHalted { .. }]));
        assert_eq!(engine.status(), RunStatus::Halted);

        let out = engine.tick(&TickInput::idle(), 0.016);
        assert!(out.events.is_empty());
    }

    #[test]
    fn test_camera_stays_in_arena() {
        let mut engine = SimulationEngine::new(small_config(), 11);
        engine.start_run(&MetaRecord::default());
        let bounds = engine.arenas().current().unwrap().bounds;
        let cam = engine.camera(Vec2::new(64.0, 64.0)).unwrap();
        assert!(cam.x >= bounds.x && cam.x + 64.0 <= bounds.right() + 1e-3);
        assert!(cam.y >= bounds.y && cam.y + 64.0 <= bounds.bottom() + 1e-3);
    }
}
