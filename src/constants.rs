// Experience and progression constants
pub const XP_PER_LEVEL: u32 = 100;

// Bounds accepted for generated quest suggestions
pub const SUGGESTION_XP_MIN: u32 = 10;
pub const SUGGESTION_XP_MAX: u32 = 100;

// Local cache keys (one JSON value per key, mirrored on every change)
pub const CACHE_KEY_XP: &str = "xp";
pub const CACHE_KEY_LEVEL: &str = "level";
pub const CACHE_KEY_STATS: &str = "stats";
pub const CACHE_KEY_QUESTS: &str = "quests";
pub const CACHE_KEY_COMPLETED_QUESTS: &str = "completedQuests";
pub const CACHE_KEY_HABIT_GOALS: &str = "habitGoals";
pub const CACHE_KEY_MATERIAL_GOALS: &str = "materialGoals";

// Date format used for the daily reset comparison
pub const LOGIN_DATE_FORMAT: &str = "%Y-%m-%d";
