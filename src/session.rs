//! Account session: owns the authoritative in-memory state for a signed-in
//! identity and reconciles it with the remote store and local cache.
//!
//! Lifecycle is a small state machine: Unauthenticated → Loading → Ready on
//! sign-in, back to Unauthenticated on sign-out. The daily completed-quest
//! reset is evaluated exactly once per load, and its write-back lands before
//! any mutation is accepted, so a toggle can never race the reset.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{info, warn};

use crate::constants::{
    CACHE_KEY_COMPLETED_QUESTS, CACHE_KEY_HABIT_GOALS, CACHE_KEY_LEVEL, CACHE_KEY_MATERIAL_GOALS,
    CACHE_KEY_QUESTS, CACHE_KEY_STATS, CACHE_KEY_XP, LOGIN_DATE_FORMAT,
};
use crate::document::UserDocument;
use crate::goals::{build_goal, Goal, GoalType};
use crate::progression::{toggle_quest, ProgressionState};
use crate::quest::{build_quest, next_quest_id, Quest};
use crate::store::{LocalCache, RemoteStore, StoreError};
use crate::suggestions::SuggestedQuest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Unauthenticated,
    Loading,
    Ready,
}

/// Outcome of the most recent remote write. Writes are optimistic and never
/// retried, so this is the only signal a caller gets about sync health.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// No write attempted yet this session.
    Idle,
    Synced,
    Failed,
}

pub struct Session<S: RemoteStore, C: LocalCache> {
    store: S,
    cache: C,
    uid: Option<String>,
    phase: SessionPhase,
    state: ProgressionState,
    quests: Vec<Quest>,
    habit_goals: Vec<Goal>,
    material_goals: Vec<Goal>,
    last_login_date: Option<String>,
    sync: SyncStatus,
}

fn today_string() -> String {
    chrono::Local::now().format(LOGIN_DATE_FORMAT).to_string()
}

impl<S: RemoteStore, C: LocalCache> Session<S, C> {
    pub fn new(store: S, cache: C) -> Self {
        Self {
            store,
            cache,
            uid: None,
            phase: SessionPhase::Unauthenticated,
            state: ProgressionState::default(),
            quests: Vec::new(),
            habit_goals: Vec::new(),
            material_goals: Vec::new(),
            last_login_date: None,
            sync: SyncStatus::Idle,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_ready(&self) -> bool {
        self.phase == SessionPhase::Ready
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.sync
    }

    pub fn progression(&self) -> &ProgressionState {
        &self.state
    }

    pub fn quests(&self) -> &[Quest] {
        &self.quests
    }

    pub fn habit_goals(&self) -> &[Goal] {
        &self.habit_goals
    }

    pub fn material_goals(&self) -> &[Goal] {
        &self.material_goals
    }

    pub fn last_login_date(&self) -> Option<&str> {
        self.last_login_date.as_deref()
    }

    /// Signs in and loads state for `uid`, using today's local date for the
    /// daily reset.
    ///
    /// A failed remote *read* abandons the load and drops back to
    /// Unauthenticated; failed *writes* during the load are logged and
    /// swallowed like any other write.
    pub fn sign_in(&mut self, uid: &str) -> Result<(), StoreError> {
        self.sign_in_on_date(uid, &today_string())
    }

    /// Sign-in with an explicit date, the seam the daily-reset tests use.
    pub fn sign_in_on_date(&mut self, uid: &str, today: &str) -> Result<(), StoreError> {
        self.phase = SessionPhase::Loading;
        self.uid = Some(uid.to_string());

        let fetched = match self.store.get(uid) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(uid, error = %e, "remote load failed, abandoning sign-in");
                self.reset_in_memory();
                return Err(e);
            }
        };

        let created = fetched.is_none();
        let doc = fetched.unwrap_or_default();

        // Attribute migrations happen inside progression(); the completed
        // set and (xp, level) pair come over as stored.
        self.state = doc.progression();
        self.quests = doc.quests;
        self.habit_goals = doc.habit_goals;
        self.material_goals = doc.material_goals;
        self.last_login_date = doc.last_login_date;

        // Daily reset: first load after the local date changes clears the
        // completed set. The stamped write-back must land before Ready so a
        // toggle cannot slip in ahead of the reset.
        let reset = self.last_login_date.as_deref() != Some(today);
        if reset {
            info!(uid, today, previous = ?self.last_login_date, "daily quest reset");
            self.state.completed.clear();
        }
        self.last_login_date = Some(today.to_string());

        if created || reset {
            self.push_remote();
        }
        self.mirror_cache();

        self.phase = SessionPhase::Ready;
        Ok(())
    }

    /// Discards the session. The write path is disabled before the state is
    /// dropped so nothing can flush discarded values.
    pub fn sign_out(&mut self) {
        self.reset_in_memory();
    }

    fn reset_in_memory(&mut self) {
        // Phase flips first so the write path is gated off before state drops
        self.phase = SessionPhase::Unauthenticated;
        self.uid = None;
        self.state = ProgressionState::default();
        self.quests.clear();
        self.habit_goals.clear();
        self.material_goals.clear();
        self.last_login_date = None;
        self.sync = SyncStatus::Idle;
    }

    /// Toggles completion of the quest with `quest_id`. Unknown ids and
    /// calls before the session is ready are no-ops.
    pub fn toggle_quest(&mut self, quest_id: u64) -> bool {
        if !self.is_ready() {
            return false;
        }
        let Some(quest) = self.quests.iter().find(|q| q.id == quest_id).cloned() else {
            return false;
        };
        self.state = toggle_quest(&self.state, &quest);
        self.write_back();
        true
    }

    /// Appends a user-authored quest. Empty text or zero XP is rejected as a
    /// silent no-op.
    pub fn add_quest(&mut self, text: &str, xp: u32, stats: BTreeMap<String, u32>) -> Option<u64> {
        if !self.is_ready() {
            return None;
        }
        let quest = build_quest(&self.quests, text, xp, stats)?;
        let id = quest.id;
        self.quests.push(quest);
        self.write_back();
        Some(id)
    }

    /// Appends generated quest suggestions in one mutation, skipping any that
    /// fail validation. Returns how many were added.
    pub fn append_suggestions(&mut self, suggestions: &[SuggestedQuest]) -> usize {
        if !self.is_ready() {
            return 0;
        }
        let mut added = 0;
        for suggestion in suggestions {
            if !suggestion.is_valid() {
                continue;
            }
            self.quests.push(Quest {
                id: next_quest_id(&self.quests),
                text: suggestion.text.trim().to_string(),
                xp: suggestion.xp,
                stats: suggestion.stats.clone(),
            });
            added += 1;
        }
        if added > 0 {
            self.write_back();
        }
        added
    }

    /// Adds a goal to the list for `goal_type`. Empty text is a no-op.
    pub fn add_goal(
        &mut self,
        goal_type: GoalType,
        text: &str,
        deadline: Option<String>,
    ) -> Option<String> {
        if !self.is_ready() {
            return None;
        }
        let goal = build_goal(text, deadline)?;
        let id = goal.id.clone();
        match goal_type {
            GoalType::Habit => self.habit_goals.push(goal),
            GoalType::Material => self.material_goals.push(goal),
        }
        self.write_back();
        Some(id)
    }

    /// Removes a goal by id. Unknown ids are a no-op.
    pub fn delete_goal(&mut self, goal_type: GoalType, goal_id: &str) -> bool {
        if !self.is_ready() {
            return false;
        }
        let list = match goal_type {
            GoalType::Habit => &mut self.habit_goals,
            GoalType::Material => &mut self.material_goals,
        };
        let before = list.len();
        list.retain(|g| g.id != goal_id);
        if list.len() == before {
            return false;
        }
        self.write_back();
        true
    }

    /// Flushes the current snapshot to the remote store and mirrors it to
    /// the cache. Always serializes the state as it is *now*, not as it was
    /// when the triggering event fired.
    fn write_back(&mut self) {
        self.last_login_date = Some(today_string());
        self.push_remote();
        self.mirror_cache();
    }

    fn snapshot(&self) -> UserDocument {
        let mut doc = UserDocument {
            quests: self.quests.clone(),
            last_login_date: self.last_login_date.clone(),
            habit_goals: self.habit_goals.clone(),
            material_goals: self.material_goals.clone(),
            ..UserDocument::default()
        };
        doc.set_progression(&self.state);
        doc
    }

    /// Optimistic remote write: a failure is logged and swallowed, the
    /// in-memory state stands, and no retry is scheduled.
    fn push_remote(&mut self) {
        let Some(uid) = self.uid.clone() else {
            return;
        };
        match self.store.merge(&uid, &self.snapshot()) {
            Ok(()) => self.sync = SyncStatus::Synced,
            Err(e) => {
                warn!(uid = %uid, error = %e, "remote write failed, keeping in-memory state");
                self.sync = SyncStatus::Failed;
            }
        }
    }

    fn mirror_cache(&self) {
        self.cache_json(CACHE_KEY_XP, &self.state.xp);
        self.cache_json(CACHE_KEY_LEVEL, &self.state.level);
        self.cache_json(CACHE_KEY_STATS, &self.state.stats.to_map());
        self.cache_json(CACHE_KEY_QUESTS, &self.quests);
        let completed: BTreeMap<u64, bool> =
            self.state.completed.iter().map(|id| (*id, true)).collect();
        self.cache_json(CACHE_KEY_COMPLETED_QUESTS, &completed);
        self.cache_json(CACHE_KEY_HABIT_GOALS, &self.habit_goals);
        self.cache_json(CACHE_KEY_MATERIAL_GOALS, &self.material_goals);
    }

    fn cache_json<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(json) => self.cache.set(key, json),
            Err(e) => warn!(key, error = %e, "cache mirror serialization failed"),
        }
    }
}
