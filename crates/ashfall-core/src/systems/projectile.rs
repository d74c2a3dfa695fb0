//! Projectile system - flight, expiry, wall hits, damage resolution

use ashfall_logic::combat::STUN_DURATION;
use hecs::{Entity, World};

use super::{arena_enemies, damage_enemy, damage_player, find_player, player_body, TickContext};
use crate::components::{Body, Enemy, Owner, Player, Projectile};
use crate::error::SimError;
use crate::events::DamageSource;

/// Move every projectile, then resolve what it hit.
///
/// Player shots strike the first overlapping active enemy by id; enemy shots
/// strike the player and are spent even if the player shrugs them off.
/// Shots left over from another arena are dropped without moving.
pub fn projectile_system(
    world: &mut World,
    ctx: &mut TickContext<'_>,
    dt: f32,
) -> Result<(), SimError> {
    let player_entity = find_player(world)?;
    let target = player_body(world, player_entity)?;
    let vampiric = world
        .get::<&Player>(player_entity)
        .map(|p| p.modifiers.vampiric)
        .map_err(|_| SimError::MissingPlayer)?;

    let current = ctx.current_arena();
    let mut enemies: Vec<(Entity, Body)> = Vec::new();
    for (_, entity) in arena_enemies(world, current) {
        if let Ok(body) = world.get::<&Body>(entity) {
            enemies.push((entity, *body));
        }
    }

    let mut shots: Vec<(Entity, Body, Projectile)> = world
        .query::<(&Body, &Projectile)>()
        .iter()
        .map(|(entity, (body, shot))| (entity, *body, *shot))
        .collect();
    shots.sort_unstable_by_key(|s| s.2.id);

    let mut spent: Vec<Entity> = Vec::new();
    let mut moved: Vec<(Entity, Body, Projectile)> = Vec::with_capacity(shots.len());
    let mut player_hits: Vec<f32> = Vec::new();
    let mut lifesteal = 0.0;

    for (entity, mut body, mut shot) in shots {
        if shot.arena != current {
            spent.push(entity);
            continue;
        }
        body.pos += body.vel * dt;
        shot.lifetime -= dt;
        if shot.lifetime <= 0.0 || ctx.grid.is_blocked_at(body.pos) {
            spent.push(entity);
            continue;
        }

        match shot.owner {
            Owner::Player => {
                let hit = enemies.iter().find(|(e, eb)| {
                    body.overlaps(eb)
                        && world.get::<&Enemy>(*e).map_or(false, |en| !en.is_dead())
                });
                if let Some(&(enemy_entity, _)) = hit {
                    if let Ok(mut enemy) = world.get::<&mut Enemy>(enemy_entity) {
                        damage_enemy(
                            &mut enemy,
                            shot.damage,
                            shot.poise_damage,
                            STUN_DURATION,
                            ctx.events,
                        );
                    }
                    lifesteal += shot.damage * vampiric;
                    spent.push(entity);
                    continue;
                }
            }
            Owner::Enemy => {
                if body.overlaps(&target) {
                    player_hits.push(shot.damage);
                    spent.push(entity);
                    continue;
                }
            }
        }
        moved.push((entity, body, shot));
    }

    for (entity, body, shot) in moved {
        if let Ok((b, p)) = world.query_one_mut::<(&mut Body, &mut Projectile)>(entity) {
            *b = body;
            *p = shot;
        }
    }
    for entity in spent {
        let _ = world.despawn(entity);
    }

    let player = world
        .query_one_mut::<&mut Player>(player_entity)
        .map_err(|_| SimError::MissingPlayer)?;
    if lifesteal > 0.0 {
        player.vitals.heal(lifesteal);
    }
    for damage in player_hits {
        damage_player(player, damage, DamageSource::Projectile, ctx.events);
    }
    Ok(())
}
