//! Tile grid: the carved dungeon as the simulation sees it.
//!
//! Cells are stored row-major. World coordinates map to tiles by dividing by
//! the tile size; anything outside the grid counts as blocked.

use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    Floor,
    Wall,
    /// Impassable hazard carved out of floor.
    Void,
}

impl Tile {
    pub fn is_blocking(self) -> bool {
        !matches!(self, Tile::Floor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileGrid {
    cols: u32,
    rows: u32,
    tile_size: f32,
    cells: Vec<Tile>,
}

impl TileGrid {
    pub fn new(cols: u32, rows: u32, tile_size: f32, fill: Tile) -> Self {
        Self {
            cols,
            rows,
            tile_size,
            cells: vec![fill; cols as usize * rows as usize],
        }
    }

    /// Grid covering a world of the given size, rounded up to whole tiles.
    pub fn for_world(width: f32, height: f32, tile_size: f32, fill: Tile) -> Self {
        let cols = tiles_for(width, tile_size);
        let rows = tiles_for(height, tile_size);
        Self::new(cols, rows, tile_size, fill)
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn world_width(&self) -> f32 {
        self.cols as f32 * self.tile_size
    }

    pub fn world_height(&self) -> f32 {
        self.rows as f32 * self.tile_size
    }

    pub fn get(&self, col: i64, row: i64) -> Option<Tile> {
        self.index(col, row).map(|i| self.cells[i])
    }

    pub fn set(&mut self, col: i64, row: i64, tile: Tile) -> bool {
        match self.index(col, row) {
            Some(i) => {
                self.cells[i] = tile;
                true
            }
            None => false,
        }
    }

    /// Whether (col, row) lies on the outermost ring of the grid.
    pub fn is_border(&self, col: i64, row: i64) -> bool {
        col == 0 || row == 0 || col == self.cols as i64 - 1 || row == self.rows as i64 - 1
    }

    pub fn count(&self, tile: Tile) -> usize {
        self.cells.iter().filter(|&&t| t == tile).count()
    }

    /// Half-open tile ranges covered by a world rectangle, clipped to the grid.
    /// Uses floor for the start edge and ceil for the end edge.
    pub fn tile_span(&self, rect: &Rect) -> (std::ops::Range<i64>, std::ops::Range<i64>) {
        let (c0, c1) = self.raw_span(rect.x, rect.right());
        let (r0, r1) = self.raw_span(rect.y, rect.bottom());
        (
            c0.max(0)..c1.min(self.cols as i64),
            r0.max(0)..r1.min(self.rows as i64),
        )
    }

    /// Set every tile under `rect` to `tile`.
    pub fn fill_rect(&mut self, rect: &Rect, tile: Tile) {
        let (cols, rows) = self.tile_span(rect);
        for row in rows {
            for col in cols.clone() {
                self.set(col, row, tile);
            }
        }
    }

    /// Tile under a world point; `None` outside the grid.
    pub fn tile_at(&self, point: Vec2) -> Option<Tile> {
        let col = (point.x / self.tile_size).floor() as i64;
        let row = (point.y / self.tile_size).floor() as i64;
        self.get(col, row)
    }

    pub fn is_blocked_at(&self, point: Vec2) -> bool {
        self.tile_at(point).map_or(true, Tile::is_blocking)
    }

    /// Whether the bounding box of a circle touches a blocking or
    /// out-of-grid tile.
    pub fn circle_blocked(&self, center: Vec2, radius: f32) -> bool {
        let (c0, c1) = self.raw_span(center.x - radius, center.x + radius);
        let (r0, r1) = self.raw_span(center.y - radius, center.y + radius);
        for row in r0..r1 {
            for col in c0..c1 {
                if self.get(col, row).map_or(true, Tile::is_blocking) {
                    return true;
                }
            }
        }
        false
    }

    /// Move a circle by `vel * dt`, one axis at a time. An axis whose move
    /// would enter a blocked tile is rolled back and its velocity zeroed.
    /// A circle that already overlaps blocked tiles is not held by them.
    pub fn move_circle(&self, pos: Vec2, vel: Vec2, radius: f32, dt: f32) -> (Vec2, Vec2) {
        let mut pos = pos;
        let mut vel = vel;

        let embedded = self.circle_blocked(pos, radius);
        let next_x = Vec2::new(pos.x + vel.x * dt, pos.y);
        if !embedded && self.circle_blocked(next_x, radius) {
            vel.x = 0.0;
        } else {
            pos = next_x;
        }

        let embedded = self.circle_blocked(pos, radius);
        let next_y = Vec2::new(pos.x, pos.y + vel.y * dt);
        if !embedded && self.circle_blocked(next_y, radius) {
            vel.y = 0.0;
        } else {
            pos = next_y;
        }

        (pos, vel)
    }

    fn raw_span(&self, lo: f32, hi: f32) -> (i64, i64) {
        (
            (lo / self.tile_size).floor() as i64,
            (hi / self.tile_size).ceil() as i64,
        )
    }

    fn index(&self, col: i64, row: i64) -> Option<usize> {
        if col < 0 || row < 0 || col >= self.cols as i64 || row >= self.rows as i64 {
            return None;
        }
        Some(row as usize * self.cols as usize + col as usize)
    }
}

fn tiles_for(extent: f32, tile_size: f32) -> u32 {
    if tile_size <= 0.0 || extent <= 0.0 {
        return 0;
    }
    (extent / tile_size).ceil() as u32
}
