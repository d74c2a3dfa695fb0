//! Integration tests for the dungeon generation pipeline.
//!
//! Exercises: DungeonConfig → rooms → spanning tree + loops → corridors
//! → carved TileGrid → Void hazards
//!
//! All tests are pure logic, seeded through `SeededRng`.

use std::collections::{BTreeSet, VecDeque};

use ashfall_logic::dungeon::{generate, Dungeon, DungeonConfig};
use ashfall_logic::grid::Tile;
use ashfall_logic::rng::SeededRng;
use proptest::prelude::*;

// ── Helpers ────────────────────────────────────────────────────────────

fn generate_seeded(config: &DungeonConfig, seed: u32) -> Dungeon {
    generate(config, &mut SeededRng::new(seed))
}

/// Rooms reachable from room 0 over the recorded connections.
fn reachable_rooms(dungeon: &Dungeon) -> BTreeSet<u32> {
    let mut seen = BTreeSet::new();
    if dungeon.rooms.is_empty() {
        return seen;
    }
    let mut open = VecDeque::from([0u32]);
    seen.insert(0);
    while let Some(room) = open.pop_front() {
        for &(a, b) in &dungeon.connections {
            let next = if a == room {
                b
            } else if b == room {
                a
            } else {
                continue;
            };
            if seen.insert(next) {
                open.push_back(next);
            }
        }
    }
    seen
}

fn rooms_overlap(dungeon: &Dungeon) -> bool {
    let rooms = &dungeon.rooms;
    (0..rooms.len()).any(|i| (i + 1..rooms.len()).any(|j| rooms[i].rect.overlaps(&rooms[j].rect)))
}

/// Every tile under a room or corridor rectangle, per the carving span.
fn carved_tiles(dungeon: &Dungeon) -> Vec<(i64, i64)> {
    let rects = dungeon
        .rooms
        .iter()
        .map(|r| r.rect)
        .chain(dungeon.corridors.iter().map(|c| c.rect));
    let mut tiles = Vec::new();
    for rect in rects {
        let (cols, rows) = dungeon.grid.tile_span(&rect);
        for row in rows {
            for col in cols.clone() {
                tiles.push((col, row));
            }
        }
    }
    tiles
}

// ── Scenario ───────────────────────────────────────────────────────────

#[test]
fn small_world_without_hazards() {
    let config = DungeonConfig {
        width: 800.0,
        height: 600.0,
        tile_size: 32.0,
        max_rooms: 5,
        void_density: 0.0,
        ..DungeonConfig::default()
    };
    for seed in 0..25 {
        let dungeon = generate_seeded(&config, seed);
        let n = dungeon.rooms.len();
        assert!((1..=5).contains(&n), "seed {seed}: {n} rooms");
        assert!(!rooms_overlap(&dungeon));
        assert_eq!(reachable_rooms(&dungeon).len(), n);
        assert_eq!(dungeon.grid.count(Tile::Void), 0);
        for (col, row) in carved_tiles(&dungeon) {
            assert_eq!(dungeon.grid.get(col, row), Some(Tile::Floor));
        }
    }
}

#[test]
fn deterministic_output() {
    let config = DungeonConfig::floor();
    let a = generate_seeded(&config, 2024);
    let b = generate_seeded(&config, 2024);
    assert_eq!(a, b);
}

#[test]
fn string_seeds_reproduce() {
    let config = DungeonConfig::default();
    let a = generate(&config, &mut SeededRng::from_str_seed("night drive"));
    let b = generate(&config, &mut SeededRng::from_str_seed("night drive"));
    assert_eq!(a.rooms, b.rooms);
    assert_eq!(a.grid, b.grid);
}

#[test]
fn different_seeds_produce_variation() {
    let config = DungeonConfig::default();
    let layouts: BTreeSet<Vec<(u32, u32)>> = (0..20)
        .map(|seed| {
            generate_seeded(&config, seed)
                .rooms
                .iter()
                .map(|r| (r.rect.x as u32, r.rect.y as u32))
                .collect()
        })
        .collect();
    assert!(layouts.len() >= 2);
}

#[test]
fn floor_preset_places_many_rooms() {
    let dungeon = generate_seeded(&DungeonConfig::floor(), 7);
    assert!(dungeon.rooms.len() >= 5, "only {} rooms", dungeon.rooms.len());
    assert_eq!(dungeon.grid.cols(), 120);
    assert_eq!(dungeon.grid.rows(), 80);
    assert_eq!(reachable_rooms(&dungeon).len(), dungeon.rooms.len());
}

#[test]
fn loops_added_on_top_of_tree() {
    let dungeon = generate_seeded(&DungeonConfig::floor(), 99);
    let n = dungeon.rooms.len();
    // A tree has n - 1 edges; loop edges push past that.
    assert!(dungeon.connections.len() > n - 1);
}

#[test]
fn border_never_carved_to_void() {
    let config = DungeonConfig {
        void_density: 1.0,
        ..DungeonConfig::default()
    };
    let dungeon = generate_seeded(&config, 4);
    let grid = &dungeon.grid;
    for col in 0..grid.cols() as i64 {
        for row in 0..grid.rows() as i64 {
            if grid.is_border(col, row) {
                assert_ne!(grid.get(col, row), Some(Tile::Void));
            }
        }
    }
}

// ── Properties ─────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_rooms_never_overlap(seed in any::<u32>(), max_rooms in 0_u32..40) {
        let config = DungeonConfig { max_rooms, ..DungeonConfig::default() };
        let dungeon = generate_seeded(&config, seed);
        prop_assert!(dungeon.rooms.len() as u32 <= max_rooms);
        prop_assert!(!rooms_overlap(&dungeon), "seed={seed} produced overlapping rooms");
    }

    #[test]
    fn prop_all_rooms_connected(seed in any::<u32>(), max_rooms in 1_u32..40) {
        let config = DungeonConfig { max_rooms, ..DungeonConfig::default() };
        let dungeon = generate_seeded(&config, seed);
        prop_assert_eq!(reachable_rooms(&dungeon).len(), dungeon.rooms.len());
    }

    #[test]
    fn prop_carving_consistent(seed in any::<u32>(), density in 0.0_f64..0.2, min_radius in 0.0_f32..6.0) {
        let config = DungeonConfig {
            void_density: density,
            min_void_radius: min_radius,
            ..DungeonConfig::default()
        };
        let dungeon = generate_seeded(&config, seed);
        let grid = &dungeon.grid;

        // Carved rectangles hold no walls; hazards only replace floor.
        for (col, row) in carved_tiles(&dungeon) {
            prop_assert_ne!(grid.get(col, row), Some(Tile::Wall));
        }

        if let Some(spawn) = dungeon.spawn_room() {
            let c = spawn.center();
            let sc = (c.x / config.tile_size).floor() as i64;
            let sr = (c.y / config.tile_size).floor() as i64;
            for col in 0..grid.cols() as i64 {
                for row in 0..grid.rows() as i64 {
                    if grid.get(col, row) != Some(Tile::Void) {
                        continue;
                    }
                    prop_assert!(!grid.is_border(col, row));
                    let d = (((col - sc).pow(2) + (row - sr).pow(2)) as f32).sqrt();
                    prop_assert!(d >= min_radius, "void at ({col},{row}) within {min_radius} of spawn");
                }
            }
        }
    }

    #[test]
    fn prop_degenerate_worlds_never_panic(seed in any::<u32>(), width in 0.0_f32..400.0, height in 0.0_f32..400.0) {
        let config = DungeonConfig { width, height, ..DungeonConfig::default() };
        let dungeon = generate_seeded(&config, seed);
        prop_assert!(!rooms_overlap(&dungeon));
        prop_assert_eq!(dungeon.corridors.len(), dungeon.connections.len() * 2);
    }
}
