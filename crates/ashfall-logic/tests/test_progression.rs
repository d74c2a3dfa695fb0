//! Integration tests for perks, items, stat clamping and meta records.
//!
//! Exercises: MetaRecord → run Stats → perk/item effects → clamp ranges
//! → level-up arithmetic

use ashfall_logic::combat::{player_damage_taken, Experience};
use ashfall_logic::meta::MetaRecord;
use ashfall_logic::perks::{apply_effects, EffectTarget, FollowUp, ITEM_POOL, PERK_POOL};
use ashfall_logic::stats::{validate_all, Modifiers, StatKind, Stats, Vitals};
use proptest::prelude::*;

// ── Helpers ────────────────────────────────────────────────────────────

struct RunState {
    stats: Stats,
    modifiers: Modifiers,
    vitals: Vitals,
}

impl RunState {
    fn from_record(record: &MetaRecord) -> Self {
        let stats = record.run_stats();
        Self {
            stats,
            modifiers: Modifiers::default(),
            vitals: Vitals::new(stats.base_max_health()),
        }
    }

    fn apply_template(&mut self, index: usize) -> Vec<FollowUp> {
        let template = if index < PERK_POOL.len() {
            &PERK_POOL[index]
        } else {
            &ITEM_POOL[index - PERK_POOL.len()]
        };
        apply_effects(
            template.effects,
            EffectTarget {
                stats: &mut self.stats,
                modifiers: &mut self.modifiers,
                vitals: &mut self.vitals,
            },
        )
    }

    fn validate(&mut self) {
        validate_all(&mut self.stats, &mut self.modifiers, &mut self.vitals);
    }
}

// ── Scenarios ──────────────────────────────────────────────────────────

#[test]
fn grit_zero_takes_full_damage() {
    let stats = Stats::default();
    let mut vitals = Vitals::new(stats.base_max_health());
    vitals.health -= player_damage_taken(10.0, &stats);
    assert_eq!(vitals.health, stats.base_max_health() - 10.0);
}

#[test]
fn grit_four_reduces_damage() {
    let stats = Stats {
        grit: 4,
        ..Stats::default()
    };
    let taken = player_damage_taken(10.0, &stats);
    assert!((taken - 10.0 / 1.2).abs() < 1e-4);
}

#[test]
fn level_up_from_95_of_100() {
    let mut stats = Stats::default();
    let mut exp = Experience {
        xp: 95.0,
        threshold: 100,
    };
    let mut vitals = Vitals::new(stats.base_max_health());
    vitals.health = 50.0;

    exp.xp += 10.0;
    assert!(exp.try_level_up());
    stats.level += 1;
    vitals.max_health = stats.base_max_health();
    vitals.heal(vitals.max_health * 0.25);

    assert_eq!(stats.level, 2);
    assert_eq!(exp.xp, 5.0);
    assert_eq!(exp.threshold, 200);
    assert_eq!(vitals.health, 80.0);
}

#[test]
fn upgrades_flow_into_run_stats() {
    let mut record = MetaRecord {
        ash: 1_000,
        ..MetaRecord::default()
    };
    record.purchase(StatKind::Might).unwrap();
    record.purchase(StatKind::Might).unwrap();
    record.purchase(StatKind::Grit).unwrap();
    let run = RunState::from_record(&record);
    assert_eq!(run.stats.might, 2);
    assert_eq!(run.stats.grit, 1);
    assert_eq!(run.vitals.max_health, 120.0);
    // 150 + 207 + 100
    assert_eq!(record.ash, 1_000 - 457);
}

#[test]
fn every_template_applies_cleanly() {
    for index in 0..PERK_POOL.len() + ITEM_POOL.len() {
        let mut run = RunState::from_record(&MetaRecord::default());
        run.apply_template(index);
        assert!(run.stats.is_valid(), "template {index} broke stats");
        assert!(run.vitals.health <= run.vitals.max_health);
    }
}

// ── Properties ─────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_stats_stay_in_range(picks in prop::collection::vec(0_usize..36, 0..60)) {
        let mut run = RunState::from_record(&MetaRecord::default());
        for index in picks {
            run.apply_template(index);
            for kind in StatKind::ALL {
                let v = run.stats.get(kind);
                prop_assert!(v >= 0 && v <= kind.max_value(), "{:?} = {}", kind, v);
            }
            prop_assert!(run.vitals.health >= 0.0 && run.vitals.health <= run.vitals.max_health);
            prop_assert!(run.vitals.stamina >= 0.0 && run.vitals.stamina <= run.vitals.max_stamina);
            prop_assert!(run.modifiers.vampiric <= 0.5);
            prop_assert!(run.modifiers.xp_penalty <= 0.9);
        }
    }

    #[test]
    fn prop_validation_is_idempotent(picks in prop::collection::vec(0_usize..36, 0..30)) {
        let mut run = RunState::from_record(&MetaRecord::default());
        for index in picks {
            run.apply_template(index);
        }
        let stats = run.stats;
        let modifiers = run.modifiers.clone();
        let vitals = run.vitals;
        run.validate();
        prop_assert_eq!(run.stats, stats);
        prop_assert_eq!(run.modifiers, modifiers);
        prop_assert_eq!(run.vitals, vitals);
    }

    #[test]
    fn prop_clamp_fixes_any_stats(
        level in 0_u32..500,
        might in -1000_i32..1000,
        luck in -1000_i32..1000,
        haste in any::<i32>(),
    ) {
        let mut stats = Stats { level, might, luck, haste, ..Stats::default() };
        stats.clamp();
        prop_assert!(stats.is_valid());
        let once = stats;
        stats.clamp();
        prop_assert_eq!(stats, once);
    }
}
