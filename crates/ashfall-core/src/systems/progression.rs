//! Progression - level-ups, perk and item effects, timed modifiers

use ashfall_logic::combat::LEVEL_UP_HEAL;
use ashfall_logic::perks::{
    apply_effects, roll_perk_choices, EffectTarget, FollowUp, Template, PERK_POOL,
};
use ashfall_logic::stats::{refresh_vitals, validate_all, ModifierKind};
use hecs::{Entity, World};

use super::{find_player, TickContext};
use crate::components::{Enemy, Player};
use crate::error::SimError;
use crate::events::SimEvent;
use crate::schedule::{Schedule, ScheduledAction};

/// Apply a perk or item to the player and carry out whatever the effects
/// hand back: enemy buffs now, modifier expiry later.
pub fn apply_template(
    world: &mut World,
    schedule: &mut Schedule,
    now: f64,
    player: Entity,
    template: &Template,
) -> Result<(), SimError> {
    let follow_ups = {
        let mut guard = world
            .get::<&mut Player>(player)
            .map_err(|_| SimError::MissingPlayer)?;
        let p = &mut *guard;
        let follow_ups = apply_effects(
            template.effects,
            EffectTarget {
                stats: &mut p.stats,
                modifiers: &mut p.modifiers,
                vitals: &mut p.vitals,
            },
        );
        p.inventory.push(template.name.to_string());
        follow_ups
    };

    for follow_up in follow_ups {
        match follow_up {
            FollowUp::BoostEnemyHealth(amount) => {
                for (_, enemy) in world.query_mut::<&mut Enemy>() {
                    if !enemy.is_dead() {
                        enemy.health += amount;
                        enemy.max_health += amount;
                    }
                }
            }
            FollowUp::ExpireModifier {
                kind,
                amount,
                after,
            } => schedule.push(
                now + after as f64,
                ScheduledAction::ExpireModifier { kind, amount },
            ),
        }
    }
    Ok(())
}

/// Take back a timed bonus, then re-clamp.
pub fn expire_modifier(world: &mut World, kind: ModifierKind, amount: f32) -> Result<(), SimError> {
    let player = find_player(world)?;
    let p = world
        .query_one_mut::<&mut Player>(player)
        .map_err(|_| SimError::MissingPlayer)?;
    *p.modifiers.get_mut(kind) -= amount;
    validate_all(&mut p.stats, &mut p.modifiers, &mut p.vitals);
    Ok(())
}

/// Spend one level's worth of xp if available. Returns the offered perk
/// indices (into [`PERK_POOL`]) when the player levelled.
pub fn level_up_system(
    world: &mut World,
    ctx: &mut TickContext<'_>,
) -> Result<Option<Vec<usize>>, SimError> {
    let player = find_player(world)?;
    let p = world
        .query_one_mut::<&mut Player>(player)
        .map_err(|_| SimError::MissingPlayer)?;
    if !p.experience.try_level_up() {
        return Ok(None);
    }

    p.stats.level += 1;
    refresh_vitals(&mut p.vitals, &p.stats, &p.modifiers);
    let heal = p.vitals.max_health * LEVEL_UP_HEAL;
    p.vitals.heal(heal);

    let choices = roll_perk_choices(ctx.rng, p.stats.luck, ctx.config.perk_choices);
    let names: Vec<String> = choices
        .iter()
        .map(|&i| PERK_POOL[i].name.to_string())
        .collect();
    log::info!("Level {} reached, offering {:?}", p.stats.level, names);
    ctx.events.push(SimEvent::LevelUp {
        level: p.stats.level,
        choices: names,
    });
    Ok(Some(choices))
}
