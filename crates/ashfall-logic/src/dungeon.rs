//! Dungeon generation: rooms, spanning-tree corridors, carving, hazards.
//!
//! Pipeline:
//! 1. Scatter non-overlapping rectangular rooms
//! 2. Link each room to its 3 nearest neighbours (candidate edges)
//! 3. Kruskal's MST over the candidates, bridging any leftover components
//! 4. Re-add ~15% of the non-tree candidates as loop edges
//! 5. Emit an L-shaped pair of corridor strips per selected edge
//! 6. Carve rooms and corridors out of an all-wall grid
//! 7. Sprinkle Void hazards over interior floor, away from the spawn room
//!
//! Generation never fails. A degenerate config just produces fewer rooms,
//! possibly none.

use std::collections::BTreeSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::disjoint_set::DisjointSet;
use crate::geometry::{Rect, Vec2};
use crate::grid::{Tile, TileGrid};

/// Placement attempts per requested room.
const ATTEMPTS_PER_ROOM: u32 = 5;

/// Nearest neighbours each room proposes an edge to.
const NEAREST_NEIGHBOURS: usize = 3;

/// Fraction of non-tree candidate edges kept as loops.
const LOOP_EDGE_FRACTION: f64 = 0.15;

/// Largest hazard disk radius, in tiles.
const MAX_VOID_RADIUS: i64 = 3;

/// Configuration for dungeon generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DungeonConfig {
    /// World width in world units
    pub width: f32,
    /// World height in world units
    pub height: f32,
    pub tile_size: f32,
    pub max_rooms: u32,
    /// Chance per eligible floor tile of seeding a Void disk
    pub void_density: f64,
    /// Radius (tiles) around the first room's center kept free of hazards
    pub min_void_radius: f32,
    /// Room side length range, in whole tiles (inclusive)
    pub room_min_tiles: u32,
    pub room_max_tiles: u32,
}

impl Default for DungeonConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            tile_size: 32.0,
            max_rooms: 20,
            void_density: 0.02,
            min_void_radius: 3.0,
            room_min_tiles: 3,
            room_max_tiles: 7,
        }
    }
}

impl DungeonConfig {
    /// Full-size floor used by a run: 120x80 tiles, larger rooms.
    pub fn floor() -> Self {
        Self {
            width: 120.0 * 32.0,
            height: 80.0 * 32.0,
            max_rooms: 30,
            room_min_tiles: 8,
            room_max_tiles: 15,
            ..Self::default()
        }
    }

    /// Derive room count and hazard density from an audio analysis snapshot.
    pub fn from_audio(self, audio: &AudioSnapshot) -> Self {
        let rooms = (12.0 + audio.rms * 20.0 + audio.low * 10.0).round();
        let density = 0.02 + audio.high as f64 * 0.03;
        Self {
            max_rooms: rooms.clamp(10.0, 40.0) as u32,
            void_density: density.clamp(0.01, 0.05),
            ..self
        }
    }
}

/// Band energies of the current track, each in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioSnapshot {
    pub low: f32,
    pub mid: f32,
    pub high: f32,
    pub rms: f32,
}

/// A generated room. Ids follow creation order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: u32,
    pub rect: Rect,
}

impl Room {
    pub fn center(&self) -> Vec2 {
        self.rect.center()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorridorAxis {
    Horizontal,
    Vertical,
}

/// One straight leg of an L-shaped connector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Corridor {
    pub rect: Rect,
    pub axis: CorridorAxis,
    pub from: u32,
    pub to: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dungeon {
    pub grid: TileGrid,
    pub rooms: Vec<Room>,
    pub corridors: Vec<Corridor>,
    /// Room pairs joined by corridors (tree edges first, then loops)
    pub connections: Vec<(u32, u32)>,
}

impl Dungeon {
    /// First room, where a run spawns.
    pub fn spawn_room(&self) -> Option<&Room> {
        self.rooms.first()
    }
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    a: u32,
    b: u32,
    weight: f32,
    in_tree: bool,
}

/// Generate a dungeon from `config`, drawing all randomness from `rng`.
pub fn generate<R: Rng + ?Sized>(config: &DungeonConfig, rng: &mut R) -> Dungeon {
    let rooms = place_rooms(config, rng);

    let edges = candidate_edges(&rooms);
    let (tree, rest) = spanning_tree(&rooms, edges);
    let loops = pick_loop_edges(rest, rng);

    let mut corridors = Vec::with_capacity((tree.len() + loops.len()) * 2);
    let mut connections = Vec::with_capacity(tree.len() + loops.len());
    for edge in tree.iter().chain(loops.iter()) {
        corridors.extend(corridor_pair(&rooms, edge, config.tile_size));
        connections.push((edge.a, edge.b));
    }

    let mut grid = TileGrid::for_world(config.width, config.height, config.tile_size, Tile::Wall);
    for room in &rooms {
        grid.fill_rect(&room.rect, Tile::Floor);
    }
    for corridor in &corridors {
        grid.fill_rect(&corridor.rect, Tile::Floor);
    }

    place_voids(&mut grid, &rooms, config, rng);

    Dungeon {
        grid,
        rooms,
        corridors,
        connections,
    }
}

fn place_rooms<R: Rng + ?Sized>(config: &DungeonConfig, rng: &mut R) -> Vec<Room> {
    let mut rooms: Vec<Room> = Vec::new();
    let min_tiles = config.room_min_tiles.min(config.room_max_tiles).max(1);
    let max_tiles = config.room_max_tiles.max(min_tiles);
    let attempts = config.max_rooms.saturating_mul(ATTEMPTS_PER_ROOM);

    for _ in 0..attempts {
        if rooms.len() as u32 >= config.max_rooms {
            break;
        }
        let w = rng.gen_range(min_tiles..=max_tiles) as f32 * config.tile_size;
        let h = rng.gen_range(min_tiles..=max_tiles) as f32 * config.tile_size;
        let span_x = config.width - w;
        let span_y = config.height - h;
        if span_x <= 0.0 || span_y <= 0.0 {
            continue;
        }
        let x = rng.gen_range(0..span_x.ceil() as u32) as f32;
        let y = rng.gen_range(0..span_y.ceil() as u32) as f32;
        let rect = Rect::new(x, y, w, h);

        if rooms.iter().all(|r| !r.rect.overlaps(&rect)) {
            rooms.push(Room {
                id: rooms.len() as u32,
                rect,
            });
        }
    }

    rooms
}

fn candidate_edges(rooms: &[Room]) -> Vec<Edge> {
    let mut seen = BTreeSet::new();
    let mut edges = Vec::new();

    for room in rooms {
        let center = room.center();
        let mut others: Vec<(u32, f32)> = rooms
            .iter()
            .filter(|o| o.id != room.id)
            .map(|o| (o.id, center.distance(&o.center())))
            .collect();
        others.sort_by(|a, b| a.1.total_cmp(&b.1));

        for &(other, weight) in others.iter().take(NEAREST_NEIGHBOURS) {
            let key = (room.id.min(other), room.id.max(other));
            if seen.insert(key) {
                edges.push(Edge {
                    a: key.0,
                    b: key.1,
                    weight,
                    in_tree: false,
                });
            }
        }
    }

    edges
}

/// Kruskal over the candidates. Returns (tree edges, leftover candidates).
fn spanning_tree(rooms: &[Room], mut edges: Vec<Edge>) -> (Vec<Edge>, Vec<Edge>) {
    edges.sort_by(|a, b| a.weight.total_cmp(&b.weight));
    let mut sets = DisjointSet::new(rooms.len() as u32);

    for edge in edges.iter_mut() {
        if sets.union(edge.a, edge.b) {
            edge.in_tree = true;
        }
    }

    let (mut tree, rest): (Vec<Edge>, Vec<Edge>) = edges.into_iter().partition(|e| e.in_tree);

    // Nearest-neighbour candidates can leave isolated clusters; join them
    // with the shortest cross-cluster links.
    if sets.component_count() > 1 {
        let mut bridges = Vec::new();
        for (i, a) in rooms.iter().enumerate() {
            for b in &rooms[i + 1..] {
                if !sets.connected(a.id, b.id) {
                    bridges.push(Edge {
                        a: a.id,
                        b: b.id,
                        weight: a.center().distance(&b.center()),
                        in_tree: false,
                    });
                }
            }
        }
        bridges.sort_by(|a, b| a.weight.total_cmp(&b.weight));
        for mut edge in bridges {
            if sets.union(edge.a, edge.b) {
                edge.in_tree = true;
                tree.push(edge);
            }
        }
    }

    (tree, rest)
}

fn pick_loop_edges<R: Rng + ?Sized>(mut rest: Vec<Edge>, rng: &mut R) -> Vec<Edge> {
    let count = (rest.len() as f64 * LOOP_EDGE_FRACTION).ceil() as usize;
    let mut picked = Vec::with_capacity(count);
    for _ in 0..count {
        if rest.is_empty() {
            break;
        }
        let idx = rng.gen_range(0..rest.len() as u32) as usize;
        picked.push(rest.remove(idx));
    }
    picked
}

/// Horizontal strip at the first room's y, vertical strip at the second
/// room's x. Both are half a tile thick.
fn corridor_pair(rooms: &[Room], edge: &Edge, tile: f32) -> [Corridor; 2] {
    let c1 = rooms[edge.a as usize].center();
    let c2 = rooms[edge.b as usize].center();
    let thickness = tile / 2.0;
    let inset = tile / 4.0;

    let horizontal = Rect::new(
        c1.x.min(c2.x),
        c1.y - inset,
        (c2.x - c1.x).abs() + thickness,
        thickness,
    );
    let vertical = Rect::new(
        c2.x - inset,
        c1.y.min(c2.y),
        thickness,
        (c2.y - c1.y).abs() + thickness,
    );

    [
        Corridor {
            rect: horizontal,
            axis: CorridorAxis::Horizontal,
            from: edge.a,
            to: edge.b,
        },
        Corridor {
            rect: vertical,
            axis: CorridorAxis::Vertical,
            from: edge.a,
            to: edge.b,
        },
    ]
}

fn place_voids<R: Rng + ?Sized>(
    grid: &mut TileGrid,
    rooms: &[Room],
    config: &DungeonConfig,
    rng: &mut R,
) {
    let Some(spawn) = rooms.first() else {
        return;
    };
    let spawn_center = spawn.center();
    let spawn_col = (spawn_center.x / config.tile_size).floor() as i64;
    let spawn_row = (spawn_center.y / config.tile_size).floor() as i64;
    let near_spawn = |col: i64, row: i64| {
        let dc = (col - spawn_col) as f32;
        let dr = (row - spawn_row) as f32;
        (dc * dc + dr * dr).sqrt() < config.min_void_radius
    };

    let cols = grid.cols() as i64;
    let rows = grid.rows() as i64;
    for col in 1..cols - 1 {
        for row in 1..rows - 1 {
            if grid.get(col, row) != Some(Tile::Floor) || near_spawn(col, row) {
                continue;
            }
            if rng.gen::<f64>() >= config.void_density {
                continue;
            }
            let radius = rng.gen_range(1..=MAX_VOID_RADIUS as u32) as i64;
            for dc in -radius..=radius {
                for dr in -radius..=radius {
                    if dc * dc + dr * dr > radius * radius {
                        continue;
                    }
                    let (c, r) = (col + dc, row + dr);
                    if grid.is_border(c, r) || near_spawn(c, r) {
                        continue;
                    }
                    if grid.get(c, r) == Some(Tile::Floor) {
                        grid.set(c, r, Tile::Void);
                    }
                }
            }
        }
    }
}
