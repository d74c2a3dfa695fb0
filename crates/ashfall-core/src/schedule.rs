//! Delayed actions keyed on simulation time.
//!
//! Entries are kept sorted by (due time, insertion sequence), so two actions
//! due at the same instant fire in the order they were scheduled.

use ashfall_logic::stats::ModifierKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScheduledAction {
    /// Land a melee hit if the attacker still lives and is in range
    MeleeStrike { enemy: u32 },
    /// Drop an enemy's wind-up flag
    EndTelegraph { enemy: u32 },
    /// Take back a timed modifier bonus
    ExpireModifier { kind: ModifierKind, amount: f32 },
    /// Leave the cleared arena for the next one (or a new floor)
    AdvanceArena,
}

impl ScheduledAction {
    /// Enemy this action refers to, if any.
    pub fn enemy(&self) -> Option<u32> {
        match *self {
            ScheduledAction::MeleeStrike { enemy } | ScheduledAction::EndTelegraph { enemy } => {
                Some(enemy)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub due: f64,
    pub seq: u64,
    pub action: ScheduledAction,
}

impl ScheduledEvent {
    fn key_cmp(&self, due: f64, seq: u64) -> std::cmp::Ordering {
        self.due.total_cmp(&due).then(self.seq.cmp(&seq))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    queue: Vec<ScheduledEvent>,
    next_seq: u64,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `action` to fire once simulation time reaches `due`.
    pub fn push(&mut self, due: f64, action: ScheduledAction) {
        let seq = self.next_seq;
        self.next_seq += 1;
        let at = self
            .queue
            .partition_point(|e| e.key_cmp(due, seq).is_lt());
        self.queue.insert(at, ScheduledEvent { due, seq, action });
    }

    /// Remove and return everything due at or before `now`, in order.
    pub fn drain_due(&mut self, now: f64) -> Vec<ScheduledAction> {
        let split = self.queue.partition_point(|e| e.due <= now);
        self.queue.drain(..split).map(|e| e.action).collect()
    }

    /// Drop every pending action that refers to `enemy`.
    pub fn forget_enemy(&mut self, enemy: u32) {
        self.queue.retain(|e| e.action.enemy() != Some(enemy));
    }

    /// Drop enemy actions, keeping modifier expiry and arena advances.
    pub fn clear_enemy_actions(&mut self) {
        self.queue.retain(|e| e.action.enemy().is_none());
    }

    pub fn contains(&self, action: &ScheduledAction) -> bool {
        self.queue.iter().any(|e| e.action == *action)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScheduledEvent> {
        self.queue.iter()
    }
}
