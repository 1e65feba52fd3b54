//! Progression engine: the state transition applied on every quest toggle.
//!
//! XP, level, attributes, and the completed set always change together in one
//! transition so no observer can see a half-updated pair (e.g. xp bumped but
//! level stale) and persist it.

use std::collections::BTreeSet;

use crate::attributes::Attributes;
use crate::constants::XP_PER_LEVEL;
use crate::quest::Quest;

/// Character progression for one account.
///
/// Invariant: `xp < 100`, `level >= 1`, and the pair is always derived from a
/// single total (`total = (level-1)*100 + xp`). The total itself is never
/// stored; every transition recomputes the pair from a freshly derived total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressionState {
    pub xp: u32,
    pub level: u32,
    pub stats: Attributes,
    pub completed: BTreeSet<u64>,
}

impl Default for ProgressionState {
    fn default() -> Self {
        Self {
            xp: 0,
            level: 1,
            stats: Attributes::new(),
            completed: BTreeSet::new(),
        }
    }
}

impl ProgressionState {
    /// Total accumulated XP implied by the (xp, level) pair.
    pub fn total_xp(&self) -> u64 {
        (self.level.saturating_sub(1)) as u64 * XP_PER_LEVEL as u64 + self.xp as u64
    }

    /// Splits a total back into the stored (xp, level) pair.
    fn apply_total_xp(&mut self, total: u64) {
        self.level = (total / XP_PER_LEVEL as u64) as u32 + 1;
        self.xp = (total % XP_PER_LEVEL as u64) as u32;
    }

    /// Builds a state from a stored (xp, level) pair, renormalizing so the
    /// invariant holds even for hand-edited documents: a level below 1 is
    /// lifted and an xp of 100 or more rolls into the level.
    pub fn from_stored(
        xp: u32,
        level: u32,
        stats: Attributes,
        completed: BTreeSet<u64>,
    ) -> Self {
        let level = level.max(1);
        let total = (level - 1) as u64 * XP_PER_LEVEL as u64 + xp as u64;
        let mut state = Self {
            xp: 0,
            level: 1,
            stats,
            completed,
        };
        state.apply_total_xp(total);
        state
    }

    pub fn is_completed(&self, quest_id: u64) -> bool {
        self.completed.contains(&quest_id)
    }
}

/// Computes the next progression state from a quest-toggle event.
///
/// Completing adds the quest's XP and attribute points and marks it done.
/// Uncompleting is the exact inverse except at the floors: total XP is
/// clamped at 0 and each attribute is clamped at 0 independently, so reversal
/// at a floor is intentionally lossy.
pub fn toggle_quest(state: &ProgressionState, quest: &Quest) -> ProgressionState {
    let mut next = state.clone();

    if state.is_completed(quest.id) {
        let total = state.total_xp().saturating_sub(quest.xp as u64);
        next.apply_total_xp(total);
        for (name, points) in &quest.stats {
            next.stats.spend(name, *points);
        }
        next.completed.remove(&quest.id);
    } else {
        let total = state.total_xp() + quest.xp as u64;
        next.apply_total_xp(total);
        for (name, points) in &quest.stats {
            next.stats.gain(name, *points);
        }
        next.completed.insert(quest.id);
    }

    next
}
