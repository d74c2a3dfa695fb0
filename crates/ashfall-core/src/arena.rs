//! Combat arenas and the state machine that moves a run through them.
//!
//! Each generated room becomes an [`Arena`]. Arenas only ever move
//! `Locked → Active → Cleared`; the global [`CombatMode`] cycles
//! `Fight → Clear → Transition → Fight` in lockstep. Any other transition is
//! a [`SimError`].

use ashfall_logic::dungeon::Dungeon;
use ashfall_logic::geometry::{Rect, Vec2};
use ashfall_logic::grid::TileGrid;
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::error::SimError;

/// Smallest grid side (in tiles) that still gets an inset fallback arena.
const FALLBACK_MIN_TILES: u32 = 5;
const FALLBACK_INSET_TILES: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArenaState {
    Locked,
    Active,
    Cleared,
}

impl ArenaState {
    pub fn can_transition_to(self, next: ArenaState) -> bool {
        matches!(
            (self, next),
            (ArenaState::Locked, ArenaState::Active) | (ArenaState::Active, ArenaState::Cleared)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatMode {
    Fight,
    Clear,
    Transition,
}

impl CombatMode {
    pub fn can_transition_to(self, next: CombatMode) -> bool {
        matches!(
            (self, next),
            (CombatMode::Fight, CombatMode::Clear)
                | (CombatMode::Clear, CombatMode::Transition)
                | (CombatMode::Transition, CombatMode::Fight)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub index: u32,
    /// Source room, `None` for the fallback arena
    pub room_id: Option<u32>,
    pub bounds: Rect,
    pub state: ArenaState,
    /// Door open; the arena may be entered next
    pub unlocked: bool,
    pub boss: bool,
    pub target_enemies: u32,
    /// Ids of living enemies owned by this arena
    pub enemies: Vec<u32>,
}

impl Arena {
    pub fn new(index: u32, room_id: Option<u32>, bounds: Rect, boss: bool) -> Self {
        Self {
            index,
            room_id,
            bounds,
            state: ArenaState::Locked,
            unlocked: false,
            boss,
            target_enemies: 0,
            enemies: Vec::new(),
        }
    }

    pub fn owns(&self, enemy: u32) -> bool {
        self.enemies.contains(&enemy)
    }

    /// Center of the exit zone, just above the bottom edge.
    pub fn exit_point(&self, offset: f32) -> Vec2 {
        Vec2::new(self.bounds.center().x, self.bounds.bottom() - offset)
    }

    /// `count` points evenly spaced on a ring around the center.
    pub fn spawn_ring(&self, count: u32, ring_fraction: f32) -> Vec<Vec2> {
        let center = self.bounds.center();
        let radius = self.bounds.w.min(self.bounds.h) * ring_fraction;
        (0..count)
            .map(|i| {
                let angle = i as f32 / count as f32 * std::f32::consts::TAU;
                center + Vec2::from_angle(angle) * radius
            })
            .collect()
    }

    /// Top-left of a `viewport`-sized view centered on `focus`, kept inside
    /// the arena. An arena smaller than the view is centered instead.
    pub fn camera(&self, focus: Vec2, viewport: Vec2) -> Vec2 {
        let axis = |focus: f32, view: f32, lo: f32, len: f32| {
            if view >= len {
                lo + (len - view) / 2.0
            } else {
                (focus - view / 2.0).clamp(lo, lo + len - view)
            }
        };
        Vec2::new(
            axis(focus.x, viewport.x, self.bounds.x, self.bounds.w),
            axis(focus.y, viewport.y, self.bounds.y, self.bounds.h),
        )
    }
}

/// World rectangle for a dungeon with no rooms: the grid inset by two tiles,
/// or the whole grid when it is too small to inset.
pub fn fallback_bounds(grid: &TileGrid) -> Rect {
    let ts = grid.tile_size();
    if grid.cols() < FALLBACK_MIN_TILES || grid.rows() < FALLBACK_MIN_TILES {
        return Rect::new(0.0, 0.0, grid.world_width(), grid.world_height());
    }
    let inset = FALLBACK_INSET_TILES;
    Rect::new(
        (inset as f32) * ts,
        (inset as f32) * ts,
        (grid.cols() - 2 * inset) as f32 * ts,
        (grid.rows() - 2 * inset) as f32 * ts,
    )
}

/// Owns every arena of the current floor and the global combat mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaManager {
    arenas: Vec<Arena>,
    current: usize,
    mode: CombatMode,
}

impl ArenaManager {
    /// All arenas start locked, with the mode waiting to enter the first.
    pub fn new(arenas: Vec<Arena>) -> Self {
        Self {
            arenas,
            current: 0,
            mode: CombatMode::Transition,
        }
    }

    /// One arena per room, in room order. A dungeon without rooms gets a
    /// single fallback arena; the caller must carve its floor.
    pub fn from_dungeon(dungeon: &Dungeon, config: &SimConfig) -> Self {
        let arenas = if dungeon.rooms.is_empty() {
            vec![Arena::new(0, None, fallback_bounds(&dungeon.grid), false)]
        } else {
            dungeon
                .rooms
                .iter()
                .enumerate()
                .map(|(i, room)| {
                    Arena::new(i as u32, Some(room.id), room.rect, config.is_boss_arena(i))
                })
                .collect()
        };
        Self::new(arenas)
    }

    pub fn len(&self) -> usize {
        self.arenas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arenas.is_empty()
    }

    pub fn arenas(&self) -> &[Arena] {
        &self.arenas
    }

    pub fn get(&self, index: u32) -> Option<&Arena> {
        self.arenas.get(index as usize)
    }

    pub fn mode(&self) -> CombatMode {
        self.mode
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&Arena> {
        self.arenas.get(self.current)
    }

    pub fn current_mut(&mut self) -> Option<&mut Arena> {
        self.arenas.get_mut(self.current)
    }

    pub fn next_index(&self) -> Option<usize> {
        let next = self.current + 1;
        (next < self.arenas.len()).then_some(next)
    }

    pub fn active_count(&self) -> usize {
        self.arenas
            .iter()
            .filter(|a| a.state == ArenaState::Active)
            .count()
    }

    fn set_mode(&mut self, to: CombatMode) -> Result<(), SimError> {
        if !self.mode.can_transition_to(to) {
            return Err(SimError::IllegalModeTransition {
                from: self.mode,
                to,
            });
        }
        self.mode = to;
        Ok(())
    }

    fn set_state(&mut self, index: usize, to: ArenaState) -> Result<(), SimError> {
        let arena = self.arenas.get_mut(index).ok_or(SimError::NoArena)?;
        if !arena.state.can_transition_to(to) {
            return Err(SimError::IllegalArenaTransition {
                arena: arena.index,
                from: arena.state,
                to,
            });
        }
        arena.state = to;
        Ok(())
    }

    /// Make arena `index` the active one with `target` enemies to spawn.
    pub fn activate(&mut self, index: usize, target: u32) -> Result<&Arena, SimError> {
        if self.mode != CombatMode::Transition {
            return Err(SimError::IllegalModeTransition {
                from: self.mode,
                to: CombatMode::Fight,
            });
        }
        self.set_state(index, ArenaState::Active)?;
        self.set_mode(CombatMode::Fight)?;
        self.current = index;
        let arena = &mut self.arenas[index];
        arena.unlocked = true;
        arena.target_enemies = target;
        Ok(arena)
    }

    /// Clear the active arena and unlock the next. Returns the cleared arena.
    pub fn clear_current(&mut self) -> Result<&Arena, SimError> {
        self.set_state(self.current, ArenaState::Cleared)?;
        self.set_mode(CombatMode::Clear)?;
        if let Some(next) = self.arenas.get_mut(self.current + 1) {
            next.unlocked = true;
        }
        Ok(&self.arenas[self.current])
    }

    pub fn begin_transition(&mut self) -> Result<(), SimError> {
        self.set_mode(CombatMode::Transition)
    }

    pub fn register_enemy(&mut self, arena: u32, enemy: u32) -> Result<(), SimError> {
        let arena = self
            .arenas
            .get_mut(arena as usize)
            .ok_or(SimError::OrphanEnemy { enemy, arena })?;
        arena.enemies.push(enemy);
        Ok(())
    }

    /// Forget a dead enemy. Returns whether `arena` owned it.
    pub fn remove_enemy(&mut self, arena: u32, enemy: u32) -> bool {
        match self.arenas.get_mut(arena as usize) {
            Some(a) => {
                let before = a.enemies.len();
                a.enemies.retain(|&id| id != enemy);
                a.enemies.len() != before
            }
            None => false,
        }
    }

    pub fn owns(&self, arena: u32, enemy: u32) -> bool {
        self.get(arena).is_some_and(|a| a.owns(enemy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ashfall_logic::grid::Tile;

    fn manager(n: u32) -> ArenaManager {
        let arenas = (0..n)
            .map(|i| {
                Arena::new(
                    i,
                    Some(i),
                    Rect::new(i as f32 * 400.0, 0.0, 320.0, 320.0),
                    false,
                )
            })
            .collect();
        ArenaManager::new(arenas)
    }

    #[test]
    fn test_state_table() {
        use ArenaState::*;
        assert!(Locked.can_transition_to(Active));
        assert!(Active.can_transition_to(Cleared));
        assert!(!Locked.can_transition_to(Cleared));
        assert!(!Cleared.can_transition_to(Active));
        assert!(!Active.can_transition_to(Locked));
    }

    #[test]
    fn test_full_cycle() {
        let mut m = manager(2);
        m.activate(0, 3).unwrap();
        assert_eq!(m.mode(), CombatMode::Fight);
        assert_eq!(m.active_count(), 1);

        m.clear_current().unwrap();
        assert_eq!(m.mode(), CombatMode::Clear);
        assert!(m.get(1).unwrap().unlocked);
        assert_eq!(m.active_count(), 0);

        m.begin_transition().unwrap();
        m.activate(1, 4).unwrap();
        assert_eq!(m.current_index(), 1);
        assert_eq!(m.current().unwrap().target_enemies, 4);
        assert_eq!(m.next_index(), None);
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        let mut m = manager(2);
        m.activate(0, 1).unwrap();
        assert!(matches!(
            m.begin_transition(),
            Err(SimError::IllegalModeTransition { .. })
        ));

        m.clear_current().unwrap();
        m.begin_transition().unwrap();
        // Re-activating a cleared arena is not allowed.
        assert!(matches!(
            m.activate(0, 1),
            Err(SimError::IllegalArenaTransition { .. })
        ));
        assert_eq!(m.mode(), CombatMode::Transition);
    }

    #[test]
    fn test_enemy_membership() {
        let mut m = manager(2);
        m.register_enemy(1, 7).unwrap();
        assert!(m.owns(1, 7));
        assert!(!m.owns(0, 7));
        assert!(m.remove_enemy(1, 7));
        assert!(!m.remove_enemy(1, 7));
        assert!(m.register_enemy(9, 1).is_err());
    }

    #[test]
    fn test_fallback_bounds() {
        let grid = TileGrid::new(20, 10, 32.0, Tile::Wall);
        assert_eq!(fallback_bounds(&grid), Rect::new(64.0, 64.0, 512.0, 192.0));

        let tiny = TileGrid::new(4, 3, 32.0, Tile::Wall);
        assert_eq!(fallback_bounds(&tiny), Rect::new(0.0, 0.0, 128.0, 96.0));
    }

    #[test]
    fn test_spawn_ring() {
        let arena = Arena::new(0, None, Rect::new(0.0, 0.0, 200.0, 100.0), false);
        let points = arena.spawn_ring(4, 0.3);
        assert_eq!(points.len(), 4);
        for p in &points {
            assert!((p.distance(&Vec2::new(100.0, 50.0)) - 30.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_camera_clamps_and_centers() {
        let arena = Arena::new(0, None, Rect::new(100.0, 100.0, 400.0, 200.0), false);
        let cam = arena.camera(Vec2::new(110.0, 150.0), Vec2::new(200.0, 300.0));
        assert_eq!(cam.x, 100.0);
        // Viewport taller than the arena: centered vertically.
        assert_eq!(cam.y, 50.0);
    }
}
