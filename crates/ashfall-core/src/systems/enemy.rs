//! Enemy system - chase, ranged volleys, melee wind-ups, stuns

use ashfall_logic::combat::{
    ShotPattern, ENEMY_ACCEL_FACTOR, ENEMY_FRICTION, ENEMY_SHOT_LIFETIME, ENEMY_SHOT_RADIUS,
    ENEMY_SHOT_SPEED, MELEE_STRIKE_DELAY, MELEE_TELEGRAPH, RANGED_ENGAGE_TILES, RANGED_TELEGRAPH,
};
use ashfall_logic::geometry::Vec2;
use hecs::{Entity, World};

use super::{emit_volley, find_player, player_body, TickContext};
use crate::components::{Body, Enemy, Owner, Player};
use crate::error::SimError;
use crate::events::{DamageSource, SimEvent};
use crate::schedule::ScheduledAction;

/// Living enemies of `arena`, ordered by id.
pub fn arena_enemies(world: &World, arena: u32) -> Vec<(u32, Entity)> {
    let mut found: Vec<(u32, Entity)> = world
        .query::<&Enemy>()
        .iter()
        .filter(|(_, e)| e.arena == arena && !e.is_dead())
        .map(|(entity, e)| (e.id, entity))
        .collect();
    found.sort_unstable_by_key(|f| f.0);
    found
}

pub fn find_enemy(world: &World, id: u32) -> Option<Entity> {
    world
        .query::<&Enemy>()
        .iter()
        .find(|(_, e)| e.id == id)
        .map(|(entity, _)| entity)
}

/// Advance every enemy of the active arena by one step.
pub fn enemy_system(world: &mut World, ctx: &mut TickContext<'_>, dt: f32) -> Result<(), SimError> {
    let target = player_body(world, find_player(world)?)?.pos;
    let engage_range = ctx.grid.tile_size() * RANGED_ENGAGE_TILES;
    let mut volleys = Vec::new();

    for (_, entity) in arena_enemies(world, ctx.current_arena()) {
        let Ok((body, enemy)) = world.query_one_mut::<(&mut Body, &mut Enemy)>(entity) else {
            continue;
        };

        if enemy.is_stunned() {
            enemy.stun = (enemy.stun - dt).max(0.0);
            body.vel = Vec2::ZERO;
            continue;
        }

        let to_player = target - body.pos;
        let dist = to_player.length();
        let mut dir = to_player.normalize();

        if enemy.kind.is_ranged() && dist < engage_range {
            if enemy.kind.holds_position_to_fire() {
                dir = Vec2::ZERO;
            }
            enemy.shot_timer += dt;
            if enemy.shot_timer >= enemy.profile.shot_interval {
                enemy.shot_timer = 0.0;
                telegraph(enemy, ctx, RANGED_TELEGRAPH);
                let aim = if dist > 0.0 {
                    to_player.normalize()
                } else {
                    Vec2::new(1.0, 0.0)
                };
                let pattern = ShotPattern {
                    count: 1,
                    spread: 0.0,
                    damage: enemy.profile.damage,
                    poise_damage: 0.0,
                    speed: ENEMY_SHOT_SPEED,
                    radius: ENEMY_SHOT_RADIUS,
                    lifetime: ENEMY_SHOT_LIFETIME,
                };
                emit_volley(
                    &mut volleys,
                    ctx.ids,
                    body,
                    aim,
                    &pattern,
                    Owner::Enemy,
                    enemy.arena,
                );
            }
        }

        if enemy.kind.is_melee() && dist < enemy.profile.attack_range {
            enemy.attack_cooldown -= dt;
            if enemy.attack_cooldown <= 0.0 {
                enemy.attack_cooldown = enemy.profile.melee_cooldown;
                telegraph(enemy, ctx, MELEE_TELEGRAPH);
                ctx.schedule.push(
                    ctx.now + MELEE_STRIKE_DELAY as f64,
                    ScheduledAction::MeleeStrike { enemy: enemy.id },
                );
            }
        }

        let speed = enemy.profile.speed;
        let mult = enemy.profile.speed_mult;
        body.vel += dir * (speed * ENEMY_ACCEL_FACTOR * mult * dt);
        body.vel *= ENEMY_FRICTION;
        body.vel = body.vel.clamp_length(speed * mult);
        body.step(ctx.grid, dt);
    }

    for volley in volleys {
        world.spawn(volley);
    }
    Ok(())
}

fn telegraph(enemy: &mut Enemy, ctx: &mut TickContext<'_>, seconds: f32) {
    enemy.telegraphing = true;
    ctx.schedule.push(
        ctx.now + seconds as f64,
        ScheduledAction::EndTelegraph { enemy: enemy.id },
    );
    ctx.events.push(SimEvent::EnemyTelegraph { enemy: enemy.id });
}

/// Land a scheduled melee hit. Dropped if the attacker is gone, left the
/// active arena, or the player moved out of range during the wind-up.
pub fn resolve_melee_strike(
    world: &mut World,
    ctx: &mut TickContext<'_>,
    enemy_id: u32,
) -> Result<(), SimError> {
    let Some(attacker) = find_enemy(world, enemy_id) else {
        return Ok(());
    };
    let (reach, damage, from) = {
        let (body, enemy) = match world.query_one_mut::<(&Body, &Enemy)>(attacker) {
            Ok(found) => found,
            Err(_) => return Ok(()),
        };
        if enemy.is_dead() || enemy.arena != ctx.current_arena() {
            return Ok(());
        }
        (enemy.profile.attack_range, enemy.profile.damage, body.pos)
    };

    let player = find_player(world)?;
    let (body, player) = world
        .query_one_mut::<(&Body, &mut Player)>(player)
        .map_err(|_| SimError::MissingPlayer)?;
    if body.pos.distance(&from) < reach {
        super::damage_player(player, damage, DamageSource::Melee, ctx.events);
    }
    Ok(())
}

pub fn end_telegraph(world: &mut World, enemy_id: u32) {
    if let Some(entity) = find_enemy(world, enemy_id) {
        if let Ok(mut enemy) = world.get::<&mut Enemy>(entity) {
            enemy.telegraphing = false;
        }
    }
}

/// Apply a player hit to an enemy, reporting damage and poise breaks.
pub fn damage_enemy(
    enemy: &mut Enemy,
    damage: f32,
    poise_damage: f32,
    stun: f32,
    events: &mut Vec<SimEvent>,
) {
    let broke = enemy.take_hit(damage, poise_damage, stun);
    events.push(SimEvent::EnemyDamaged {
        enemy: enemy.id,
        amount: damage,
        health: enemy.health,
    });
    if broke {
        events.push(SimEvent::PoiseBroken { enemy: enemy.id });
    }
}
