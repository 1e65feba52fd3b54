use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A discrete task awarding XP and optional attribute points on completion.
/// Quests are immutable once created; the list as a whole is replaceable but
/// individual quests are never edited.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Quest {
    pub id: u64,
    pub text: String,
    pub xp: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub stats: BTreeMap<String, u32>,
}

/// The seed quest list given to a brand-new account.
pub fn default_quests() -> Vec<Quest> {
    let base_stats: BTreeMap<String, u32> = [
        ("mindset".to_string(), 1),
        ("healthWellness".to_string(), 2),
    ]
    .into_iter()
    .collect();

    vec![
        Quest {
            id: 1,
            text: "🧠 Read 30 mins".to_string(),
            xp: 20,
            stats: base_stats.clone(),
        },
        Quest {
            id: 2,
            text: "🏋️ Workout".to_string(),
            xp: 25,
            stats: base_stats.clone(),
        },
        Quest {
            id: 3,
            text: "📈 Study coding 1hr".to_string(),
            xp: 30,
            stats: base_stats.clone(),
        },
        Quest {
            id: 4,
            text: "🤝 Network with 1 person".to_string(),
            xp: 25,
            stats: base_stats,
        },
    ]
}

/// Next id for a quest appended to `quests`.
///
/// Uses max(id) + 1 rather than list length so ids stay unique after any
/// quest has been removed from the list.
pub fn next_quest_id(quests: &[Quest]) -> u64 {
    quests.iter().map(|q| q.id).max().unwrap_or(0) + 1
}

/// Parses a raw `<xp> <text>` entry line into its parts.
///
/// Returns `None` (caller treats as a no-op) when the XP token is not a
/// positive integer or the text is missing. Zero and empty-text rejection
/// stays with [`build_quest`].
pub fn parse_quest_entry(input: &str) -> Option<(u32, &str)> {
    let (xp_token, text) = input.trim().split_once(' ')?;
    let xp = xp_token.parse::<u32>().ok()?;
    Some((xp, text.trim()))
}

/// Builds a quest for appending to `quests`, validating its fields.
///
/// Returns `None` (caller treats as a no-op) when `text` is empty or
/// whitespace, or `xp` is zero.
pub fn build_quest(
    quests: &[Quest],
    text: &str,
    xp: u32,
    stats: BTreeMap<String, u32>,
) -> Option<Quest> {
    let text = text.trim();
    if text.is_empty() || xp == 0 {
        return None;
    }
    Some(Quest {
        id: next_quest_id(quests),
        text: text.to_string(),
        xp,
        stats,
    })
}
