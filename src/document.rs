//! Remote document shape for one account.
//!
//! This is the wire type: `stats` stays a plain name→value map so retired
//! attribute names survive deserialization long enough for the rename
//! migrations to see them, and `completedQuests` keeps the stored
//! `{"<id>": true}` presence-map shape.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::attributes::Attributes;
use crate::goals::Goal;
use crate::progression::ProgressionState;
use crate::quest::{default_quests, Quest};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserDocument {
    pub xp: u32,
    pub level: u32,
    pub stats: BTreeMap<String, u32>,
    pub quests: Vec<Quest>,
    pub completed_quests: BTreeMap<u64, bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_date: Option<String>,
    pub habit_goals: Vec<Goal>,
    pub material_goals: Vec<Goal>,
}

impl Default for UserDocument {
    fn default() -> Self {
        Self {
            xp: 0,
            level: 1,
            stats: Attributes::new().to_map(),
            quests: default_quests(),
            completed_quests: BTreeMap::new(),
            last_login_date: None,
            habit_goals: Vec::new(),
            material_goals: Vec::new(),
        }
    }
}

impl UserDocument {
    /// Progression state held in this document, with attribute migrations
    /// applied. Hand-edited or corrupt pairs (`level` below 1, `xp` of 100
    /// or more) are renormalized from their implied total.
    pub fn progression(&self) -> ProgressionState {
        ProgressionState::from_stored(
            self.xp,
            self.level,
            Attributes::from_map(&self.stats),
            self.completed_set(),
        )
    }

    /// Quest ids recorded as completed.
    pub fn completed_set(&self) -> BTreeSet<u64> {
        self.completed_quests
            .iter()
            .filter(|(_, done)| **done)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Writes a progression snapshot back into the document fields. All
    /// progression fields are replaced wholesale: a stats key absent from
    /// the snapshot is removed, not preserved.
    pub fn set_progression(&mut self, state: &ProgressionState) {
        self.xp = state.xp;
        self.level = state.level;
        self.stats = state.stats.to_map();
        self.completed_quests = state.completed.iter().map(|id| (*id, true)).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeType;

    #[test]
    fn test_default_document() {
        let doc = UserDocument::default();
        assert_eq!(doc.xp, 0);
        assert_eq!(doc.level, 1);
        assert_eq!(doc.quests.len(), 4);
        assert!(doc.completed_quests.is_empty());
        assert!(doc.last_login_date.is_none());
        assert!(doc.habit_goals.is_empty());
    }

    #[test]
    fn test_camel_case_wire_shape() {
        let doc = UserDocument::default();
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("completedQuests").is_some());
        assert!(json.get("habitGoals").is_some());
        assert!(json.get("materialGoals").is_some());
        // Unset login date is omitted, not null
        assert!(json.get("lastLoginDate").is_none());
    }

    #[test]
    fn test_completed_quests_keys_are_strings_on_the_wire() {
        let mut doc = UserDocument::default();
        doc.completed_quests.insert(3, true);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["completedQuests"]["3"], serde_json::json!(true));
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        // Documents written before goals existed lack those fields entirely;
        // missing fields come from the default document
        let doc: UserDocument =
            serde_json::from_value(serde_json::json!({"xp": 40, "level": 2})).unwrap();
        assert_eq!(doc.xp, 40);
        assert_eq!(doc.level, 2);
        assert!(doc.habit_goals.is_empty());
        assert!(doc.material_goals.is_empty());
        assert_eq!(doc.quests.len(), 4);
        assert!(doc.last_login_date.is_none());
    }

    #[test]
    fn test_progression_applies_migrations() {
        let mut doc = UserDocument::default();
        doc.stats = [("mindfulness".to_string(), 5), ("charisma".to_string(), 1)]
            .into_iter()
            .collect();
        let state = doc.progression();
        assert_eq!(state.stats.get(AttributeType::Mindset), 5);
        assert_eq!(state.stats.get(AttributeType::Charisma), 1);
    }

    #[test]
    fn test_progression_lifts_zero_level() {
        let mut doc = UserDocument::default();
        doc.level = 0;
        assert_eq!(doc.progression().level, 1);
    }

    #[test]
    fn test_progression_renormalizes_oversized_xp() {
        let mut doc = UserDocument::default();
        doc.xp = 250;
        doc.level = 2;

        let state = doc.progression();
        assert_eq!(state.level, 4);
        assert_eq!(state.xp, 50);
        assert_eq!(state.total_xp(), 350);
    }

    #[test]
    fn test_completed_set_ignores_false_entries() {
        let mut doc = UserDocument::default();
        doc.completed_quests.insert(1, true);
        doc.completed_quests.insert(2, false);
        assert_eq!(doc.completed_set(), BTreeSet::from([1]));
    }

    #[test]
    fn test_set_progression_replaces_stats_wholesale() {
        let mut doc = UserDocument::default();
        doc.stats.insert("leftover".to_string(), 9);

        let mut state = ProgressionState::default();
        state.stats.gain("education", 2);
        doc.set_progression(&state);

        assert!(doc.stats.get("leftover").is_none());
        assert_eq!(doc.stats["education"], 2);
        // Every current attribute is present, zeros included
        assert_eq!(doc.stats.len(), crate::attributes::NUM_ATTRIBUTES);
    }

    #[test]
    fn test_progression_roundtrip() {
        let mut state = ProgressionState::default();
        state.xp = 42;
        state.level = 3;
        state.stats.gain("mindset", 4);
        state.completed.insert(2);

        let mut doc = UserDocument::default();
        doc.set_progression(&state);
        assert_eq!(doc.progression(), state);
    }
}
