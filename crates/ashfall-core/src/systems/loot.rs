//! Deaths, drops and item pickups

use ashfall_logic::combat::{
    ash_drop_amount, ash_drop_chance, item_rarity, kill_xp, ITEM_DROP_CHANCE, PICKUP_REACH,
};
use ashfall_logic::geometry::{circles_overlap, Vec2};
use ashfall_logic::perks::{roll_item, ITEM_POOL};
use hecs::{Entity, World};
use rand::Rng;

use super::{apply_template, find_player, player_body, TickContext};
use crate::components::{Body, Enemy, Player, WorldItem, ITEM_RADIUS};
use crate::error::SimError;
use crate::events::SimEvent;

/// Remove dead enemies, roll their drops, and pay out xp and ash.
pub fn death_system(world: &mut World, ctx: &mut TickContext<'_>) -> Result<(), SimError> {
    let player = find_player(world)?;
    let (stats, modifiers) = {
        let p = world
            .get::<&Player>(player)
            .map_err(|_| SimError::MissingPlayer)?;
        (p.stats, p.modifiers.clone())
    };

    let mut dead: Vec<(u32, Entity, Enemy, Vec2)> = world
        .query::<(&Body, &Enemy)>()
        .iter()
        .filter(|(_, (_, e))| e.is_dead())
        .map(|(entity, (b, e))| (e.id, entity, e.clone(), b.pos))
        .collect();
    if dead.is_empty() {
        return Ok(());
    }
    dead.sort_unstable_by_key(|d| d.0);

    let mut xp = 0.0;
    let mut ash = 0;
    let mut ash_drops = Vec::new();
    for (id, entity, enemy, position) in dead {
        let _ = world.despawn(entity);
        ctx.arenas.remove_enemy(enemy.arena, id);
        ctx.schedule.forget_enemy(id);
        ctx.events.push(SimEvent::EnemyKilled {
            enemy: id,
            kind: enemy.kind,
            position,
        });

        if ctx.rng.gen::<f64>() < ITEM_DROP_CHANCE {
            let rarity = item_rarity(ctx.rng.gen::<f64>(), &stats);
            if let Some(template) = roll_item(ctx.rng, rarity) {
                let item = ctx.ids.next_id();
                world.spawn((
                    Body::new(position, ITEM_RADIUS),
                    WorldItem {
                        id: item,
                        template,
                        arena: enemy.arena,
                    },
                ));
                ctx.events.push(SimEvent::ItemDropped {
                    item,
                    name: ITEM_POOL[template].name.to_string(),
                    rarity: ITEM_POOL[template].rarity,
                    position,
                });
            }
        }

        if ctx.rng.gen::<f64>() < ash_drop_chance(&stats) {
            let base = ctx.rng.gen_range(1..=3u32);
            let amount = ash_drop_amount(base, &stats, &modifiers);
            ash += amount;
            ash_drops.push(amount);
        }

        xp += kill_xp(&stats, &modifiers);
    }

    let player = world
        .query_one_mut::<&mut Player>(player)
        .map_err(|_| SimError::MissingPlayer)?;
    player.experience.xp += xp;
    for amount in ash_drops {
        player.ash = player.ash.saturating_add(amount);
        ctx.events.push(SimEvent::CurrencyGained {
            amount,
            total: player.ash,
        });
    }
    log::debug!("Enemies down: +{} xp, +{} ash", xp, ash);
    Ok(())
}

/// Pick up every active-arena item the player is touching.
pub fn pickup_system(world: &mut World, ctx: &mut TickContext<'_>) -> Result<(), SimError> {
    let player = find_player(world)?;
    let reach = player_body(world, player)?;
    let current = ctx.current_arena();

    let mut touched: Vec<(u32, Entity, usize)> = world
        .query::<(&Body, &WorldItem)>()
        .iter()
        .filter(|(_, (b, item))| {
            item.arena == current && circles_overlap(reach.pos, reach.radius, b.pos, PICKUP_REACH)
        })
        .map(|(entity, (_, item))| (item.id, entity, item.template))
        .collect();
    touched.sort_unstable_by_key(|t| t.0);

    for (_, entity, index) in touched {
        let _ = world.despawn(entity);
        let Some(template) = ITEM_POOL.get(index) else {
            continue;
        };
        apply_template(world, ctx.schedule, ctx.now, player, template)?;
        ctx.events.push(SimEvent::ItemPickedUp {
            name: template.name.to_string(),
            rarity: template.rarity,
        });
    }
    Ok(())
}
