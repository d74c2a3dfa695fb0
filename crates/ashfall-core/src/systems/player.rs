//! Player system - movement, dash, firing, stamina, contact damage

use ashfall_logic::combat::{
    dash_cooldown, dash_duration, heavy_shot, player_damage_taken, primary_shot, shot_interval,
    ShotPattern, DASH_COST, DASH_INVULN_BUFFER, DASH_SPEED, HEAVY_COOLDOWN, HEAVY_COST,
    HIT_INVULN, PLAYER_ACCEL_FACTOR, PLAYER_FRICTION, SHOT_COST,
};
use ashfall_logic::geometry::Vec2;
use hecs::World;

use super::{find_player, IdAllocator, TickContext};
use crate::components::{Body, Enemy, Owner, Player, Projectile};
use crate::error::SimError;
use crate::events::{DamageSource, PlayerAction, RejectReason, SimEvent};
use crate::input::{AimTarget, TickInput};

/// Distance beyond the shooter's radius at which projectiles appear.
const MUZZLE_OFFSET: f32 = 5.0;

/// Advance the player by one step.
pub fn player_system(
    world: &mut World,
    ctx: &mut TickContext<'_>,
    input: &TickInput,
    dt: f32,
) -> Result<(), SimError> {
    let entity = find_player(world)?;
    let current = ctx.current_arena();
    let bounds = ctx.arenas.current().map(|a| a.bounds);

    // Active enemies, pre-move, by id: (id, body, contact damage)
    let mut targets: Vec<(u32, Body, f32)> = world
        .query::<(&Body, &Enemy)>()
        .iter()
        .filter(|(_, (_, e))| e.arena == current && !e.is_dead())
        .map(|(_, (b, e))| (e.id, *b, e.profile.damage))
        .collect();
    targets.sort_by_key(|t| t.0);

    let mut volleys: Vec<(Body, Projectile)> = Vec::new();
    {
        let (body, player) = world
            .query_one_mut::<(&mut Body, &mut Player)>(entity)
            .map_err(|_| SimError::MissingPlayer)?;

        player.timers.tick_cooldowns(dt);
        let move_dir = input.direction();
        update_facing(player, body.pos, &input.aim, &targets);
        let aim = player.facing;

        if input.dash {
            try_dash(player, move_dir, ctx.events);
        }

        if player.timers.is_dashing() {
            body.vel = player.dash_dir * DASH_SPEED;
            player.timers.dash_remaining = (player.timers.dash_remaining - dt).max(0.0);
        } else {
            let speed = player.stats.move_speed();
            body.vel += move_dir * (speed * PLAYER_ACCEL_FACTOR * dt);
            body.vel *= PLAYER_FRICTION;
            body.vel = body.vel.clamp_length(speed);
        }
        body.step(ctx.grid, dt);
        if let Some(bounds) = bounds {
            body.pos = bounds.clamp_circle(body.pos, body.radius);
        }

        if input.fire && player.timers.shoot_cooldown <= 0.0 {
            // Soft fail: an empty pool still fires, just wider.
            player.vitals.stamina = (player.vitals.stamina - SHOT_COST).max(0.0);
            let exhausted = player.vitals.stamina <= 0.0;
            let pattern = primary_shot(&player.stats, &player.modifiers, exhausted);
            emit_volley(&mut volleys, ctx.ids, body, aim, &pattern, Owner::Player, current);
            player.timers.shoot_cooldown = shot_interval(&player.stats);
        }

        if input.heavy && player.timers.heavy_cooldown <= 0.0 {
            if player.vitals.stamina >= HEAVY_COST {
                player.vitals.stamina -= HEAVY_COST;
                let pattern = heavy_shot(&player.stats);
                emit_volley(&mut volleys, ctx.ids, body, aim, &pattern, Owner::Player, current);
                player.timers.heavy_cooldown = HEAVY_COOLDOWN;
            } else {
                ctx.events.push(SimEvent::ActionRejected {
                    action: PlayerAction::Heavy,
                    reason: RejectReason::InsufficientStamina,
                });
            }
        }

        player.timers.invulnerable = (player.timers.invulnerable - dt).max(0.0);
        let regen = player.modifiers.stamina_regen_rate() * dt;
        player.vitals.stamina = (player.vitals.stamina + regen).min(player.vitals.max_stamina);

        for (_, enemy_body, damage) in &targets {
            if body.overlaps(enemy_body) {
                damage_player(player, *damage, DamageSource::Contact, ctx.events);
            }
        }
    }

    for volley in volleys {
        world.spawn(volley);
    }
    Ok(())
}

fn update_facing(player: &mut Player, pos: Vec2, aim: &AimTarget, targets: &[(u32, Body, f32)]) {
    let toward = match *aim {
        AimTarget::Auto => targets
            .iter()
            .min_by(|a, b| {
                a.1.pos
                    .distance_squared(&pos)
                    .total_cmp(&b.1.pos.distance_squared(&pos))
            })
            .map(|t| t.1.pos - pos),
        AimTarget::Point(point) => Some(point - pos),
    };
    if let Some(dir) = toward {
        let dir = dir.normalize();
        if dir.length() > 0.0 {
            player.facing = dir;
        }
    }
}

fn try_dash(player: &mut Player, move_dir: Vec2, events: &mut Vec<SimEvent>) {
    // Held or cooling down: ignored without feedback.
    if player.timers.is_dashing() || player.timers.dash_cooldown > 0.0 {
        return;
    }
    if player.vitals.stamina < DASH_COST {
        events.push(SimEvent::ActionRejected {
            action: PlayerAction::Dash,
            reason: RejectReason::InsufficientStamina,
        });
        return;
    }

    player.vitals.stamina -= DASH_COST;
    let direction = if move_dir.length() > 0.0 {
        move_dir.normalize()
    } else {
        player.facing
    };
    let duration = dash_duration(&player.modifiers);
    player.dash_dir = direction;
    player.timers.dash_remaining = duration;
    player.timers.dash_cooldown = dash_cooldown(&player.stats, &player.modifiers);
    player.timers.invulnerable = player
        .timers
        .invulnerable
        .max(duration + DASH_INVULN_BUFFER);
    events.push(SimEvent::DashStarted { direction });
}

/// Spawn data for a fan of projectiles leaving `shooter` toward `aim`,
/// owned by `arena`.
pub fn emit_volley(
    out: &mut Vec<(Body, Projectile)>,
    ids: &mut IdAllocator,
    shooter: &Body,
    aim: Vec2,
    pattern: &ShotPattern,
    owner: Owner,
    arena: u32,
) {
    for angle in pattern.angles(aim.angle()) {
        let dir = Vec2::from_angle(angle);
        let pos = shooter.pos + dir * (shooter.radius + MUZZLE_OFFSET);
        out.push((
            Body::moving(pos, dir * pattern.speed, pattern.radius),
            Projectile {
                id: ids.next_id(),
                owner,
                arena,
                damage: pattern.damage,
                poise_damage: pattern.poise_damage,
                lifetime: pattern.lifetime,
            },
        ));
    }
}

/// Apply a raw hit to the player. Ignored while invulnerable; otherwise
/// reduced by grit and followed by a short invulnerability window.
/// Returns the health actually lost.
pub fn damage_player(
    player: &mut Player,
    raw: f32,
    source: DamageSource,
    events: &mut Vec<SimEvent>,
) -> f32 {
    if player.is_invulnerable() || player.vitals.is_dead() {
        return 0.0;
    }
    let taken = player_damage_taken(raw, &player.stats);
    player.vitals.health = (player.vitals.health - taken).max(0.0);
    player.timers.invulnerable = HIT_INVULN;
    events.push(SimEvent::DamageTaken {
        amount: taken,
        health: player.vitals.health,
        source,
    });
    taken
}
