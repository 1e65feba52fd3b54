use std::sync::atomic::{AtomicI64, Ordering};

use serde::{Deserialize, Serialize};

/// Which goal list a goal (or a quest suggestion request) belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GoalType {
    Habit,
    Material,
}

impl GoalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalType::Habit => "habit",
            GoalType::Material => "material",
        }
    }
}

/// A longer-term aspiration that can seed generated quests. Not itself
/// scored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Goal {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

/// Issues a timestamp-derived goal id, strictly increasing even when two
/// goals are created within the same millisecond.
pub fn new_goal_id() -> String {
    static LAST: AtomicI64 = AtomicI64::new(0);

    let now = chrono::Utc::now().timestamp_millis();
    let mut prev = LAST.load(Ordering::Relaxed);
    loop {
        let next = now.max(prev + 1);
        match LAST.compare_exchange_weak(prev, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next.to_string(),
            Err(actual) => prev = actual,
        }
    }
}

/// Builds a goal for appending to a list. Returns `None` when the text is
/// empty or whitespace.
pub fn build_goal(text: &str, deadline: Option<String>) -> Option<Goal> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(Goal {
        id: new_goal_id(),
        text: text.to_string(),
        deadline,
        frequency: None,
        active: None,
    })
}
