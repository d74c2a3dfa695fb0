//! Integration tests for a run end to end.
//!
//! Exercises: start_run → arena entry → clearing → exit → next arena
//! → floor regeneration → game over → meta record

use ashfall_core::prelude::*;
use ashfall_logic::combat::LEVEL_UP_HEAL;
use ashfall_logic::dungeon::DungeonConfig;
use ashfall_logic::geometry::Vec2;
use ashfall_logic::grid::Tile;

// ── Helpers ────────────────────────────────────────────────────────────

fn config(max_rooms: u32) -> SimConfig {
    SimConfig {
        dungeon: DungeonConfig {
            max_rooms,
            void_density: 0.0,
            ..DungeonConfig::default()
        },
        base_enemy_count: 3.0,
        level_scaling: 0.0,
        arena_scaling: 0.0,
        // Leave only on request, never by walking into the exit.
        exit_radius: 0.0,
        ..SimConfig::default()
    }
}

fn started(config: SimConfig, seed: u32) -> (SimulationEngine, Vec<SimEvent>) {
    let mut engine = SimulationEngine::new(config, seed);
    let events = engine.start_run(&MetaRecord::default());
    (engine, events)
}

fn kill_all(engine: &mut SimulationEngine) {
    for (_, enemy) in engine.world.query_mut::<&mut Enemy>() {
        enemy.health = 0.0;
    }
}

/// Kill the living enemy with the lowest id.
fn kill_lowest(engine: &mut SimulationEngine) {
    let target = engine
        .world
        .query::<&Enemy>()
        .iter()
        .filter(|(_, e)| !e.is_dead())
        .map(|(_, e)| e.id)
        .min();
    for (_, enemy) in engine.world.query_mut::<&mut Enemy>() {
        if Some(enemy.id) == target {
            enemy.health = 0.0;
        }
    }
}

/// Kill everything, let the room clear, then press advance once.
fn clear_and_advance(engine: &mut SimulationEngine, input: TickInput) {
    kill_all(engine);
    engine.tick(&TickInput::idle(), 0.016);
    resume(engine);
    engine.tick(
        &TickInput {
            advance: true,
            ..input
        },
        0.016,
    );
}

fn resume(engine: &mut SimulationEngine) {
    if engine.is_paused() {
        engine.choose_perk(0).unwrap();
    }
}

/// Tick until the engine reports `pred` on an event, up to `limit` ticks.
fn tick_until(
    engine: &mut SimulationEngine,
    input: TickInput,
    limit: usize,
    pred: impl Fn(&SimEvent) -> bool,
) -> Option<SimEvent> {
    for _ in 0..limit {
        resume(engine);
        let out = engine.tick(&input, 0.1);
        if let Some(event) = out.events.into_iter().find(|e| pred(e)) {
            return Some(event);
        }
    }
    None
}

// ── Arena flow ─────────────────────────────────────────────────────────

#[test]
fn test_first_arena_spawns_scaled_enemies() {
    let (engine, events) = started(config(6), 5);
    assert!(events.contains(&SimEvent::ArenaEntered {
        arena: 0,
        enemies: 3,
        boss: false,
    }));
    assert_eq!(engine.enemy_count(), 3);
    assert_eq!(engine.arenas().get(0).unwrap().enemies.len(), 3);
    assert_eq!(engine.mode(), CombatMode::Fight);
}

#[test]
fn test_room_clear_same_tick() {
    let (mut engine, _) = started(config(6), 5);
    kill_all(&mut engine);
    let out = engine.tick(&TickInput::idle(), 0.016);

    let kills = out
        .events
        .iter()
        .filter(|e| matches!(e, SimEvent::EnemyKilled { .. }))
        .count();
    assert_eq!(kills, 3);
    assert!(out.events.iter().any(|e| matches!(
        e,
        SimEvent::RoomCleared {
            arena: 0,
            boss: false,
            reward: 10
        }
    )));
    assert_eq!(engine.mode(), CombatMode::Clear);
    assert_eq!(engine.arenas().get(0).unwrap().state, ArenaState::Cleared);
    assert!(engine.arenas().get(1).map_or(true, |a| a.unlocked));
    assert!(engine.player().unwrap().1.ash >= 10);
}

#[test]
fn test_room_stays_open_until_last_kill() {
    let (mut engine, _) = started(config(6), 5);
    for kill in 0..3 {
        kill_lowest(&mut engine);
        let out = engine.tick(&TickInput::idle(), 0.016);
        let cleared = out
            .events
            .iter()
            .any(|e| matches!(e, SimEvent::RoomCleared { .. }));
        if kill < 2 {
            assert!(!cleared, "cleared after kill {}", kill);
            assert_eq!(engine.mode(), CombatMode::Fight);
            assert_eq!(engine.arenas().get(0).unwrap().enemies.len(), 2 - kill);
        } else {
            assert!(cleared);
            assert_eq!(engine.mode(), CombatMode::Clear);
        }
    }
}

#[test]
fn test_enemies_never_spawn_on_the_player() {
    for seed in 0..60 {
        let (engine, _) = started(SimConfig::default(), seed);
        let (player, _) = engine.player().unwrap();
        for enemy in engine.snapshot().enemies {
            let gap = enemy.pos.distance(&player.pos) - enemy.radius - player.radius;
            assert!(gap > 0.0, "seed {} enemy {} overlaps the player", seed, enemy.id);
        }
    }
}

#[test]
fn test_advance_enters_next_arena_after_delay() {
    let (mut engine, _) = started(config(8), 21);
    assert!(engine.arenas().len() >= 2, "seed should give several rooms");

    kill_all(&mut engine);
    engine.tick(&TickInput::idle(), 0.016);
    resume(&mut engine);

    let advance = TickInput {
        advance: true,
        ..TickInput::idle()
    };
    engine.tick(&advance, 0.016);
    assert_eq!(engine.mode(), CombatMode::Transition);
    assert_eq!(engine.arenas().active_count(), 0);

    let entered = tick_until(&mut engine, TickInput::idle(), 20, |e| {
        matches!(e, SimEvent::ArenaEntered { .. })
    });
    assert!(matches!(entered, Some(SimEvent::ArenaEntered { arena: 1, .. })));
    assert_eq!(engine.mode(), CombatMode::Fight);
    assert_eq!(engine.arenas().current_index(), 1);

    let (body, _) = engine.player().unwrap();
    assert_eq!(body.pos, engine.arenas().current().unwrap().bounds.center());
}

#[test]
fn test_shots_do_not_follow_into_next_arena() {
    let (mut engine, _) = started(config(8), 21);
    let fire = TickInput {
        fire: true,
        aim: AimTarget::Point(Vec2::new(0.0, 0.0)),
        ..TickInput::idle()
    };
    clear_and_advance(&mut engine, fire);
    assert_eq!(engine.mode(), CombatMode::Transition);
    assert!(engine.projectile_count() > 0);
    // Park the shot so only the arena switch can remove it.
    for (_, (body, _)) in engine.world.query_mut::<(&mut Body, &Projectile)>() {
        body.vel = Vec2::ZERO;
    }

    let entered = tick_until(&mut engine, TickInput::idle(), 20, |e| {
        matches!(e, SimEvent::ArenaEntered { .. })
    });
    assert!(matches!(entered, Some(SimEvent::ArenaEntered { arena: 1, .. })));
    assert_eq!(engine.projectile_count(), 0);
    assert!(engine.snapshot().projectiles.is_empty());
}

#[test]
fn test_stray_shot_from_old_arena_is_inert() {
    let (mut engine, _) = started(config(8), 21);
    clear_and_advance(&mut engine, TickInput::idle());
    tick_until(&mut engine, TickInput::idle(), 20, |e| {
        matches!(e, SimEvent::ArenaEntered { .. })
    })
    .expect("second arena entered");

    let target = engine.snapshot().enemies[0];
    engine.world.spawn((
        Body::new(target.pos, 4.0),
        Projectile {
            id: 10_000,
            owner: Owner::Player,
            arena: 0,
            damage: 50.0,
            poise_damage: 5.0,
            lifetime: 2.0,
        },
    ));
    assert!(engine.snapshot().projectiles.is_empty());

    let out = engine.tick(&TickInput::idle(), 0.016);
    assert_eq!(engine.projectile_count(), 0);
    let after = out
        .snapshot
        .enemies
        .iter()
        .find(|e| e.id == target.id)
        .expect("enemy survives");
    assert_eq!(after.health, target.health);
    assert_eq!(after.poise, target.poise);
}

#[test]
fn test_last_arena_regenerates_floor() {
    let (mut engine, _) = started(config(3), 9);
    let advance = TickInput {
        advance: true,
        ..TickInput::idle()
    };

    let mut regenerated = None;
    for _ in 0..200 {
        resume(&mut engine);
        kill_all(&mut engine);
        let out = engine.tick(&advance, 0.1);
        regenerated = out
            .events
            .into_iter()
            .find(|e| matches!(e, SimEvent::FloorGenerated { .. }));
        if regenerated.is_some() {
            break;
        }
    }

    assert!(matches!(regenerated, Some(SimEvent::FloorGenerated { floor: 2, .. })));
    assert_eq!(engine.floor(), 2);
    assert_eq!(engine.arenas().current_index(), 0);
    assert_eq!(engine.mode(), CombatMode::Fight);
    assert_eq!(engine.projectile_count(), 0);
    assert!(engine.snapshot().items.is_empty());
}

#[test]
fn test_fallback_arena_without_rooms() {
    let (engine, events) = started(config(0), 2);
    assert!(matches!(events[0], SimEvent::FloorGenerated { rooms: 0, .. }));
    assert_eq!(engine.arenas().len(), 1);
    assert_eq!(engine.status(), RunStatus::Running);

    let arena = engine.arenas().current().unwrap();
    assert_eq!(arena.room_id, None);
    let grid = &engine.dungeon().grid;
    assert_eq!(grid.tile_at(arena.bounds.center()), Some(Tile::Floor));
}

#[test]
fn test_boss_arena_single_enemy() {
    let mut cfg = config(8);
    cfg.boss_every = 1;
    let (engine, events) = started(cfg, 4);
    assert!(events.contains(&SimEvent::ArenaEntered {
        arena: 0,
        enemies: 1,
        boss: true,
    }));
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.enemies.len(), 1);
    assert_eq!(snapshot.enemies[0].kind, ashfall_logic::combat::EnemyKind::Boss);
}

// ── Progression ────────────────────────────────────────────────────────

#[test]
fn test_level_up_pauses_until_perk_chosen() {
    let (mut engine, _) = started(config(6), 13);
    {
        let mut query = engine.world.query::<&mut Player>();
        let (_, player) = query.iter().next().unwrap();
        player.experience.xp = player.experience.threshold as f32;
    }

    let out = engine.tick(&TickInput::idle(), 0.016);
    let level_up = out
        .events
        .iter()
        .find(|e| matches!(e, SimEvent::LevelUp { .. }))
        .cloned();
    let Some(SimEvent::LevelUp { level, choices }) = level_up else {
        panic!("expected a level-up");
    };
    assert_eq!(level, 2);
    assert_eq!(choices.len(), 3);
    assert!(engine.is_paused());
    assert_eq!(out.snapshot.perk_choices, choices);

    // Paused: ticks do nothing.
    let time = engine.sim_time();
    engine.tick(&TickInput::idle(), 0.016);
    assert_eq!(engine.sim_time(), time);

    assert_eq!(
        engine.choose_perk(7),
        Err(ChoiceError::InvalidIndex {
            index: 7,
            available: 3
        })
    );
    let events = engine.choose_perk(1).unwrap();
    assert_eq!(
        events,
        vec![SimEvent::PerkChosen {
            name: choices[1].clone()
        }]
    );
    assert!(!engine.is_paused());
    assert!(engine.player().unwrap().1.inventory.contains(&choices[1]));
}

#[test]
fn test_level_up_carries_overflow_and_heals() {
    let (mut engine, _) = started(config(6), 13);
    {
        let mut query = engine.world.query::<&mut Player>();
        let (_, player) = query.iter().next().unwrap();
        assert_eq!(player.experience.threshold, 100);
        // 95 of 100, then a 10 xp gain.
        player.experience.xp = 95.0 + 10.0;
        player.vitals.health = 50.0;
    }

    let out = engine.tick(&TickInput::idle(), 0.016);
    assert!(out.events.iter().any(|e| matches!(e, SimEvent::LevelUp { level: 2, .. })));
    assert!(engine.is_paused());

    let view = out.snapshot.player.unwrap();
    assert_eq!(view.level, 2);
    assert_eq!(view.xp, 5.0);
    assert_eq!(view.xp_next, 200);
    let expected = (50.0 + view.max_health * LEVEL_UP_HEAL).min(view.max_health);
    assert!((view.health - expected).abs() < 1e-3);
    assert!(view.health < view.max_health);
}

// ── Game over ──────────────────────────────────────────────────────────

#[test]
fn test_death_banks_ash_into_meta() {
    let mut meta = MetaRecord::default();
    meta.deposit(5);
    let mut engine = SimulationEngine::new(config(6), 3);
    engine.start_run(&meta);
    {
        let mut query = engine.world.query::<&mut Player>();
        let (_, player) = query.iter().next().unwrap();
        player.ash = 20;
        player.vitals.health = 0.0;
    }

    let out = engine.tick(&TickInput::idle(), 0.016);
    assert!(out.events.contains(&SimEvent::GameOver {
        ash_earned: 20,
        ash_total: 25,
    }));
    assert_eq!(engine.status(), RunStatus::GameOver);
    assert_eq!(engine.meta().ash, 25);

    let json = engine.meta().to_json().unwrap();
    assert_eq!(MetaRecord::from_json(&json).unwrap().ash, 25);

    // Finished runs ignore input.
    let out = engine.tick(&TickInput::moving(1.0, 0.0), 0.016);
    assert!(out.events.is_empty());
}

#[test]
fn test_restart_after_game_over() {
    let (mut engine, _) = started(config(6), 3);
    {
        let mut query = engine.world.query::<&mut Player>();
        let (_, player) = query.iter().next().unwrap();
        player.vitals.health = 0.0;
    }
    engine.tick(&TickInput::idle(), 0.016);
    assert_eq!(engine.status(), RunStatus::GameOver);

    let meta = engine.meta().clone();
    engine.start_run(&meta);
    assert_eq!(engine.status(), RunStatus::Running);
    assert_eq!(engine.floor(), 1);
    assert_eq!(engine.tick_count(), 0);
    let (_, player) = engine.player().unwrap();
    assert_eq!(player.vitals.health, player.vitals.max_health);
}
