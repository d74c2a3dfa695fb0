//! Arena flow - entering, clearing, and leaving arenas

use ashfall_logic::combat::EnemyKind;
use ashfall_logic::geometry::{circles_overlap, Rect, Vec2};
use ashfall_logic::grid::TileGrid;
use hecs::{Entity, World};
use rand::Rng;

use super::{find_player, TickContext};
use crate::arena::CombatMode;
use crate::components::{Body, Enemy, Player, Projectile};
use crate::error::SimError;
use crate::events::SimEvent;
use crate::input::TickInput;
use crate::schedule::ScheduledAction;

/// Gap kept between a freshly spawned enemy and the player.
const SPAWN_CLEARANCE: f32 = 4.0;

/// Ring radius scales tried at each angle, nearest first.
const RADIUS_STEPS: [f32; 7] = [1.0, 0.85, 1.15, 0.7, 1.3, 0.55, 1.45];

/// Angle nudges tried around a ring slot, as fractions of the slot width.
const ANGLE_STEPS: [f32; 7] = [0.0, 0.125, -0.125, 0.25, -0.25, 0.375, -0.375];

/// Activate arena `index`, move the player to its center and spawn its
/// enemies on a ring. Returns the number spawned.
///
/// Shots still in flight from the previous arena are removed.
pub fn enter_arena(
    world: &mut World,
    ctx: &mut TickContext<'_>,
    index: usize,
) -> Result<u32, SimError> {
    let player = find_player(world)?;
    let level = world
        .get::<&Player>(player)
        .map(|p| p.stats.level)
        .map_err(|_| SimError::MissingPlayer)?;

    let boss = ctx
        .arenas
        .arenas()
        .get(index)
        .ok_or(SimError::NoArena)?
        .boss;
    let count = if boss {
        1
    } else {
        ctx.config.enemy_count(index, level)
    };
    let arena = ctx.arenas.activate(index, count)?.clone();
    let center = arena.bounds.center();

    let mut player_radius = 0.0;
    if let Ok(mut body) = world.get::<&mut Body>(player) {
        body.pos = center;
        body.vel = Vec2::ZERO;
        player_radius = body.radius;
    }

    let leftovers: Vec<Entity> = world
        .query::<&Projectile>()
        .iter()
        .map(|(entity, _)| entity)
        .collect();
    for entity in leftovers {
        let _ = world.despawn(entity);
    }

    let slot = std::f32::consts::TAU / count.max(1) as f32;

    for point in arena.spawn_ring(count, ctx.config.spawn_ring) {
        let kind = if boss {
            EnemyKind::Boss
        } else {
            let pick = ctx.rng.gen_range(0..EnemyKind::REGULAR.len() as u32);
            EnemyKind::REGULAR[pick as usize]
        };
        let id = ctx.ids.next_id();
        let enemy = Enemy::new(id, kind, arena.index, level);
        let pos = spawn_point(
            ctx.grid,
            &arena.bounds,
            point,
            enemy.profile.radius,
            player_radius + enemy.profile.radius + SPAWN_CLEARANCE,
            slot,
        );
        world.spawn((Body::new(pos, enemy.profile.radius), enemy));
        ctx.arenas.register_enemy(arena.index, id)?;
    }

    log::info!(
        "Entered arena {} ({} enemies{})",
        arena.index,
        count,
        if boss { ", boss" } else { "" }
    );
    ctx.events.push(SimEvent::ArenaEntered {
        arena: arena.index,
        enemies: count,
        boss,
    });
    Ok(count)
}

/// Find an open spot for an enemy whose ring slot is `point`. Tries other
/// radii along the slot's angle first, then nudges the angle within the slot.
/// Every candidate keeps at least `clearance` from the center, so an enemy
/// never starts on top of the player even when nothing open is found.
fn spawn_point(
    grid: &TileGrid,
    bounds: &Rect,
    point: Vec2,
    radius: f32,
    clearance: f32,
    slot: f32,
) -> Vec2 {
    let center = bounds.center();
    let offset = point - center;
    let ring = offset.length().max(clearance);
    let angle = offset.angle();
    let inside = |p: Vec2| {
        p.x - radius >= bounds.x
            && p.x + radius <= bounds.right()
            && p.y - radius >= bounds.y
            && p.y + radius <= bounds.bottom()
    };

    for nudge in ANGLE_STEPS {
        let dir = Vec2::from_angle(angle + nudge * slot);
        for scale in RADIUS_STEPS {
            let distance = ring * scale;
            if distance < clearance {
                continue;
            }
            let candidate = center + dir * distance;
            if inside(candidate) && !grid.circle_blocked(candidate, radius) {
                return candidate;
            }
        }
    }
    log::debug!("No open spawn near ({:.0}, {:.0})", point.x, point.y);
    center + Vec2::from_angle(angle) * ring
}

/// Clear the active arena once it owns no enemies, paying the clear reward.
pub fn clear_system(world: &mut World, ctx: &mut TickContext<'_>) -> Result<bool, SimError> {
    if ctx.arenas.mode() != CombatMode::Fight {
        return Ok(false);
    }
    let Some(arena) = ctx.arenas.current() else {
        return Err(SimError::NoArena);
    };
    if !arena.enemies.is_empty() {
        return Ok(false);
    }

    let cleared = ctx.arenas.clear_current()?;
    let (index, boss) = (cleared.index, cleared.boss);
    let reward = if boss {
        ctx.config.boss_clear_reward
    } else {
        ctx.config.clear_reward
    };

    let player = find_player(world)?;
    let p = world
        .query_one_mut::<&mut Player>(player)
        .map_err(|_| SimError::MissingPlayer)?;
    p.ash = p.ash.saturating_add(reward);

    log::info!("Arena {} cleared, +{} ash", index, reward);
    ctx.events.push(SimEvent::RoomCleared {
        arena: index,
        boss,
        reward,
    });
    ctx.events.push(SimEvent::CurrencyGained {
        amount: reward,
        total: p.ash,
    });
    Ok(true)
}

/// Leave a cleared arena on request or when the player reaches the exit.
/// The move itself happens when the scheduled advance fires.
pub fn exit_zone_system(
    world: &World,
    ctx: &mut TickContext<'_>,
    input: &TickInput,
) -> Result<bool, SimError> {
    if ctx.arenas.mode() != CombatMode::Clear {
        return Ok(false);
    }
    let Some(arena) = ctx.arenas.current() else {
        return Err(SimError::NoArena);
    };
    let exit = arena.exit_point(ctx.config.exit_offset);
    let body = super::player_body(world, find_player(world)?)?;
    let at_exit = circles_overlap(body.pos, 0.0, exit, ctx.config.exit_radius);
    if !(input.advance || at_exit) {
        return Ok(false);
    }

    ctx.arenas.begin_transition()?;
    ctx.schedule.push(
        ctx.now + ctx.config.transition_delay as f64,
        ScheduledAction::AdvanceArena,
    );
    log::debug!("Leaving arena {}", ctx.arenas.current_index());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ashfall_logic::grid::Tile;

    const SLOT: f32 = std::f32::consts::TAU / 3.0;

    #[test]
    fn test_blocked_slot_moves_inward_along_its_angle() {
        let mut grid = TileGrid::new(20, 20, 32.0, Tile::Floor);
        grid.fill_rect(&Rect::new(480.0, 288.0, 64.0, 64.0), Tile::Wall);
        let bounds = Rect::new(0.0, 0.0, 640.0, 640.0);
        let center = bounds.center();

        let pos = spawn_point(&grid, &bounds, Vec2::new(512.0, 320.0), 12.0, 28.0, SLOT);
        assert!(!grid.circle_blocked(pos, 12.0));
        assert!(pos.distance(&center) >= 28.0);
        assert!((pos.y - 320.0).abs() < 1e-3);
        assert!(pos.x > center.x);
    }

    #[test]
    fn test_open_slot_is_kept() {
        let grid = TileGrid::new(20, 20, 32.0, Tile::Floor);
        let bounds = Rect::new(0.0, 0.0, 640.0, 640.0);
        let point = Vec2::new(320.0, 128.0);
        let pos = spawn_point(&grid, &bounds, point, 12.0, 28.0, SLOT);
        assert!(pos.distance(&point) < 1e-3);
    }

    #[test]
    fn test_no_open_spot_still_clears_center() {
        let grid = TileGrid::new(20, 20, 32.0, Tile::Wall);
        let bounds = Rect::new(0.0, 0.0, 640.0, 640.0);
        let center = bounds.center();
        // A ring tighter than the clearance is pushed out to it.
        let pos = spawn_point(&grid, &bounds, Vec2::new(330.0, 320.0), 16.0, 40.0, SLOT);
        assert!(pos.distance(&center) >= 40.0 - 1e-3);
    }
}
