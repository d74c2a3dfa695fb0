//! Ashfall Headless Simulation Harness
//!
//! Validates generation, combat tables and full runs without a renderer.
//! Runs entirely in-process, with no window, audio or storage.
//!
//! Usage:
//!   cargo run -p ashfall-simtest
//!   cargo run -p ashfall-simtest -- --verbose

use ashfall_core::prelude::*;
use ashfall_logic::combat::{next_threshold, EnemyKind, BASE_XP_THRESHOLD};
use ashfall_logic::disjoint_set::DisjointSet;
use ashfall_logic::dungeon::{generate, AudioSnapshot, DungeonConfig};
use ashfall_logic::geometry::Vec2;
use ashfall_logic::grid::Tile;
use ashfall_logic::meta::UpgradeError;
use ashfall_logic::perks::{roll_item, roll_perk_choices, Rarity, ITEM_POOL, PERK_POOL};
use ashfall_logic::rng::SeededRng;
use ashfall_logic::stats::StatKind;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::collections::HashSet;

// ── Shipped tunables (same JSON the game loads) ─────────────────────────
const CONFIG_JSON: &str = include_str!("../../../data/sim_config.json");

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

/// Prints engine log lines to stderr when `--verbose` is given.
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("  [{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    if verbose && log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Info);
    }
    println!("=== Ashfall Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Shipped config
    let config = validate_config(&mut results);

    // 2. Dungeon generation sweep
    results.extend(validate_generation(verbose));

    // 3. Enemy and progression tables
    results.extend(validate_combat_tables(verbose));

    // 4. Perk and item pools
    results.extend(validate_pools(verbose));

    // 5. Headless runs
    results.extend(validate_runs(&config, verbose));

    // 6. Meta record
    results.extend(validate_meta(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Config ───────────────────────────────────────────────────────────

fn validate_config(results: &mut Vec<TestResult>) -> SimConfig {
    println!("--- Config ---");
    match SimConfig::from_json(CONFIG_JSON) {
        Ok(config) => {
            results.push(TestResult {
                name: "config_parse".into(),
                passed: true,
                detail: format!(
                    "{}x{} world, {} rooms max",
                    config.dungeon.width, config.dungeon.height, config.dungeon.max_rooms
                ),
            });
            results.push(TestResult {
                name: "config_enemy_scaling".into(),
                passed: config.enemy_count(0, 1) >= 1
                    && config.enemy_count(10, 10) > config.enemy_count(0, 1),
                detail: format!(
                    "arena 0 @ L1: {}, arena 10 @ L10: {}",
                    config.enemy_count(0, 1),
                    config.enemy_count(10, 10)
                ),
            });
            config
        }
        Err(e) => {
            results.push(TestResult {
                name: "config_parse".into(),
                passed: false,
                detail: format!("{}", e),
            });
            SimConfig::default()
        }
    }
}

// ── 2. Dungeon Generation ───────────────────────────────────────────────

fn validate_generation(verbose: bool) -> Vec<TestResult> {
    println!("--- Dungeon Generation ---");
    let mut results = Vec::new();
    let config = DungeonConfig::floor();

    let mut disconnected = Vec::new();
    let mut overlapping = Vec::new();
    let mut walled_rooms = Vec::new();
    let mut open_border = Vec::new();
    let mut room_counts = Vec::new();

    for seed in 0..40u32 {
        let dungeon = generate(&config, &mut SeededRng::new(seed));
        let n = dungeon.rooms.len() as u32;
        room_counts.push(n);

        let mut sets = DisjointSet::new(n);
        for &(a, b) in &dungeon.connections {
            sets.union(a, b);
        }
        if n > 0 && sets.component_count() != 1 {
            disconnected.push(seed);
        }

        let overlaps = dungeon.rooms.iter().enumerate().any(|(i, a)| {
            dungeon.rooms[i + 1..]
                .iter()
                .any(|b| a.rect.overlaps(&b.rect))
        });
        if overlaps {
            overlapping.push(seed);
        }

        let grid = &dungeon.grid;
        if dungeon
            .rooms
            .iter()
            .any(|r| grid.tile_at(r.center()) == Some(Tile::Wall))
        {
            walled_rooms.push(seed);
        }

        let border_open = (0..grid.cols() as i64).any(|c| {
            grid.get(c, 0) != Some(Tile::Wall)
                || grid.get(c, grid.rows() as i64 - 1) != Some(Tile::Wall)
        }) || (0..grid.rows() as i64).any(|r| {
            grid.get(0, r) != Some(Tile::Wall)
                || grid.get(grid.cols() as i64 - 1, r) != Some(Tile::Wall)
        });
        if border_open {
            open_border.push(seed);
        }
    }

    results.push(TestResult {
        name: "gen_connected".into(),
        passed: disconnected.is_empty(),
        detail: format!("40 seeds, disconnected: {:?}", disconnected),
    });
    results.push(TestResult {
        name: "gen_rooms_disjoint".into(),
        passed: overlapping.is_empty(),
        detail: format!("overlapping rooms on seeds: {:?}", overlapping),
    });
    results.push(TestResult {
        name: "gen_rooms_carved".into(),
        passed: walled_rooms.is_empty(),
        detail: format!("uncarved room centers on seeds: {:?}", walled_rooms),
    });
    results.push(TestResult {
        name: "gen_border_walled".into(),
        passed: open_border.is_empty(),
        detail: format!("open border on seeds: {:?}", open_border),
    });

    let a = generate(&config, &mut SeededRng::new(1234));
    let b = generate(&config, &mut SeededRng::new(1234));
    results.push(TestResult {
        name: "gen_deterministic".into(),
        passed: a == b,
        detail: "same seed, same dungeon".into(),
    });

    let quiet = DungeonConfig::floor().from_audio(&AudioSnapshot::default());
    let loud = DungeonConfig::floor().from_audio(&AudioSnapshot {
        low: 1.0,
        mid: 1.0,
        high: 1.0,
        rms: 1.0,
    });
    results.push(TestResult {
        name: "gen_audio_scaling".into(),
        passed: loud.max_rooms > quiet.max_rooms && loud.void_density > quiet.void_density,
        detail: format!(
            "rooms {} → {}, void {:.3} → {:.3}",
            quiet.max_rooms, loud.max_rooms, quiet.void_density, loud.void_density
        ),
    });

    if verbose {
        let min = room_counts.iter().min().copied().unwrap_or(0);
        let max = room_counts.iter().max().copied().unwrap_or(0);
        let avg = room_counts.iter().sum::<u32>() as f32 / room_counts.len().max(1) as f32;
        println!("  Rooms per floor: min {} / avg {:.1} / max {}", min, avg, max);
    }

    results
}

// ── 3. Combat Tables ────────────────────────────────────────────────────

fn validate_combat_tables(verbose: bool) -> Vec<TestResult> {
    println!("--- Combat Tables ---");
    let mut results = Vec::new();

    let kinds = [
        EnemyKind::Basic,
        EnemyKind::Fast,
        EnemyKind::Ranged,
        EnemyKind::Heavy,
        EnemyKind::Boss,
    ];
    let mut bad = Vec::new();
    for kind in kinds {
        for level in 1..=30 {
            let p = kind.profile(level);
            let ok = p.speed > 0.0
                && p.radius > 0.0
                && p.health > 0.0
                && p.damage > 0.0
                && p.poise > 0.0
                && p.attack_range > 0.0;
            if !ok {
                bad.push(format!("{:?}@{}", kind, level));
            }
        }
    }
    results.push(TestResult {
        name: "enemy_profiles_positive".into(),
        passed: bad.is_empty(),
        detail: if bad.is_empty() {
            "5 kinds x 30 levels".into()
        } else {
            format!("bad profiles: {}", bad.join(", "))
        },
    });

    let growth = kinds
        .iter()
        .all(|k| k.profile(10).health > k.profile(1).health);
    results.push(TestResult {
        name: "enemy_health_scales".into(),
        passed: growth,
        detail: "health grows with player level".into(),
    });

    let mut threshold = BASE_XP_THRESHOLD;
    let mut increasing = true;
    for _ in 0..20 {
        let next = next_threshold(threshold);
        increasing &= next > threshold;
        threshold = next;
    }
    results.push(TestResult {
        name: "xp_thresholds_increase".into(),
        passed: increasing,
        detail: format!("level 21 threshold: {}", threshold),
    });

    if verbose {
        println!("  Level 5 profiles:");
        for kind in kinds {
            let p = kind.profile(5);
            println!(
                "    {:6?}: hp {:6.1}  dmg {:5.1}  speed {:5.1}  range {:4.1}",
                kind, p.health, p.damage, p.speed, p.attack_range
            );
        }
    }

    results
}

// ── 4. Perk & Item Pools ────────────────────────────────────────────────

fn validate_pools(_verbose: bool) -> Vec<TestResult> {
    println!("--- Perk & Item Pools ---");
    let mut results = Vec::new();

    for (label, pool) in [("items", ITEM_POOL), ("perks", PERK_POOL)] {
        let names: HashSet<&str> = pool.iter().map(|t| t.name).collect();
        results.push(TestResult {
            name: format!("{}_unique_names", label),
            passed: names.len() == pool.len(),
            detail: format!("{} templates", pool.len()),
        });
        results.push(TestResult {
            name: format!("{}_have_effects", label),
            passed: pool.iter().all(|t| !t.effects.is_empty()),
            detail: "every template does something".into(),
        });
    }

    let mut rng = SeededRng::new(77);
    let distinct = (0..200).all(|_| {
        let picks = roll_perk_choices(&mut rng, 10, 3);
        let set: HashSet<usize> = picks.iter().copied().collect();
        picks.len() == 3 && set.len() == 3
    });
    results.push(TestResult {
        name: "perk_choices_distinct".into(),
        passed: distinct,
        detail: "200 draws of 3".into(),
    });

    let rarities = [Rarity::Common, Rarity::Rare, Rarity::Epic, Rarity::Legendary];
    let matching = rarities.iter().all(|&rarity| {
        (0..50).all(|_| match roll_item(&mut rng, rarity) {
            Some(i) => ITEM_POOL[i].rarity == rarity,
            None => !ITEM_POOL.iter().any(|t| t.rarity == rarity),
        })
    });
    results.push(TestResult {
        name: "item_rolls_match_rarity".into(),
        passed: matching,
        detail: "dropped items come from the rolled tier".into(),
    });

    results
}

// ── 5. Headless Runs ────────────────────────────────────────────────────

fn scripted_input(tick: usize) -> TickInput {
    let angle = tick as f32 * 0.03;
    TickInput {
        move_x: angle.cos(),
        move_y: angle.sin(),
        fire: true,
        dash: tick % 60 == 0,
        heavy: tick % 90 == 0,
        aim: AimTarget::Auto,
        advance: true,
    }
}

struct RunSummary {
    events: Vec<SimEvent>,
    ticks: usize,
    final_status: RunStatus,
    max_active: usize,
}

fn play(engine: &mut SimulationEngine, ticks: usize) -> RunSummary {
    let mut events = engine.start_run(&MetaRecord::default());
    let mut max_active = 0;
    let mut played = 0;
    for t in 0..ticks {
        if engine.is_paused() {
            if let Ok(chosen) = engine.choose_perk(t % 3) {
                events.extend(chosen);
            }
        }
        let out = engine.tick(&scripted_input(t), 1.0 / 60.0);
        events.extend(out.events);
        max_active = max_active.max(engine.arenas().active_count());
        played += 1;
        if out.snapshot.status != RunStatus::Running {
            break;
        }
    }
    RunSummary {
        events,
        ticks: played,
        final_status: engine.status(),
        max_active,
    }
}

fn validate_runs(config: &SimConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Headless Runs ---");
    let mut results = Vec::new();
    const TICKS: usize = 60 * 60 * 2;

    let mut halted = Vec::new();
    let mut clears = 0;
    let mut kills = 0;
    let mut level_ups = 0;
    for seed in 0..5u32 {
        let mut engine = SimulationEngine::new(config.clone(), seed);
        let summary = play(&mut engine, TICKS);
        if summary.final_status == RunStatus::Halted || summary.max_active > 1 {
            halted.push(seed);
        }
        for e in &summary.events {
            match e {
                SimEvent::RoomCleared { .. } => clears += 1,
                SimEvent::EnemyKilled { .. } => kills += 1,
                SimEvent::LevelUp { .. } => level_ups += 1,
                _ => {}
            }
        }
        if verbose {
            println!(
                "  seed {}: {} ticks, {:?}, floor {}, arena {}",
                seed,
                summary.ticks,
                summary.final_status,
                engine.floor(),
                engine.arenas().current_index()
            );
        }
    }
    results.push(TestResult {
        name: "run_invariants_hold".into(),
        passed: halted.is_empty(),
        detail: format!("5 runs, halted or multi-active: {:?}", halted),
    });
    results.push(TestResult {
        name: "run_combat_happens".into(),
        passed: kills > 0,
        detail: format!("{} kills, {} clears, {} level-ups", kills, clears, level_ups),
    });

    let mut a = SimulationEngine::new(config.clone(), 4242);
    let mut b = SimulationEngine::new(config.clone(), 4242);
    let run_a = play(&mut a, 1200);
    let run_b = play(&mut b, 1200);
    results.push(TestResult {
        name: "run_deterministic".into(),
        passed: run_a.events == run_b.events && a.snapshot() == b.snapshot(),
        detail: format!("{} events replayed", run_a.events.len()),
    });

    let mut buffer = Vec::new();
    let restored = a.save(&mut buffer).map_err(|e| e.to_string()).and_then(|_| {
        let mut copy = SimulationEngine::new(SimConfig::default(), 0);
        copy.load(&buffer[..]).map_err(|e| e.to_string())?;
        Ok(copy)
    });
    let (passed, detail) = match restored {
        Ok(mut copy) => {
            let input = TickInput::moving(-1.0, 0.5);
            let same = (0..300).all(|_| {
                if a.is_paused() {
                    let _ = a.choose_perk(0);
                    let _ = copy.choose_perk(0);
                }
                a.tick(&input, 1.0 / 60.0) == copy.tick(&input, 1.0 / 60.0)
            });
            (same, format!("{} byte save, 300 ticks compared", buffer.len()))
        }
        Err(e) => (false, e),
    };
    results.push(TestResult {
        name: "run_save_restore".into(),
        passed,
        detail,
    });

    let mut engine = SimulationEngine::new(config.clone(), 1);
    engine.start_run(&MetaRecord::default());
    let camera = engine.camera(Vec2::new(640.0, 360.0));
    results.push(TestResult {
        name: "run_camera_available".into(),
        passed: camera.is_some(),
        detail: format!("{:?}", camera),
    });

    results
}

// ── 6. Meta Record ──────────────────────────────────────────────────────

fn validate_meta(_verbose: bool) -> Vec<TestResult> {
    println!("--- Meta Record ---");
    let mut results = Vec::new();

    let mut record = MetaRecord::default();
    let broke = record.purchase(StatKind::Might);
    results.push(TestResult {
        name: "meta_purchase_needs_ash".into(),
        passed: matches!(broke, Err(UpgradeError::InsufficientAsh { .. })),
        detail: format!("{:?}", broke),
    });

    record.deposit(1_000);
    let cost = record.costs.get(StatKind::Might);
    let bought = record.purchase(StatKind::Might);
    results.push(TestResult {
        name: "meta_purchase_escalates".into(),
        passed: bought == Ok(1) && record.costs.get(StatKind::Might) > cost,
        detail: format!(
            "might cost {} → {}, ash left {}",
            cost,
            record.costs.get(StatKind::Might),
            record.ash
        ),
    });

    let roundtrip = record
        .to_json()
        .ok()
        .and_then(|json| MetaRecord::from_json(&json).ok());
    results.push(TestResult {
        name: "meta_json_roundtrip".into(),
        passed: roundtrip.as_ref() == Some(&record),
        detail: "stored record reloads unchanged".into(),
    });

    let fallback = MetaRecord::load_or_default(Some(r#"{"level": 2}"#));
    results.push(TestResult {
        name: "meta_corrupt_falls_back".into(),
        passed: fallback == MetaRecord::default(),
        detail: "missing stats → fresh record".into(),
    });

    results
}
