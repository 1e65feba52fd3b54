//! End-to-end reconciliation: session mutations against the remote store and
//! local cache, including the file-backed implementations.

use std::collections::BTreeMap;

use lifequest::goals::GoalType;
use lifequest::session::{Session, SyncStatus};
use lifequest::store::{FileCache, FileStore, LocalCache, MemoryCache, MemoryStore};
use serde_json::json;

fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

#[test]
fn test_full_session_flow_reaches_remote() {
    let store = MemoryStore::new();
    let cache = MemoryCache::new();
    let mut session = Session::new(store.clone(), cache.clone());
    session.sign_in_on_date("user-1", &today()).unwrap();

    // Complete two defaults: 20 + 90 from a custom quest crosses a level
    session.toggle_quest(1);
    let id = session
        .add_quest("Ship the side project", 90, BTreeMap::new())
        .unwrap();
    session.toggle_quest(id);

    let state = session.progression();
    assert_eq!(state.level, 2);
    assert_eq!(state.xp, 10);

    let doc = store.document("user-1").unwrap();
    assert_eq!(doc.level, 2);
    assert_eq!(doc.xp, 10);
    assert_eq!(doc.quests.len(), 5);
    assert_eq!(doc.completed_set().len(), 2);

    // The cache mirrors the same snapshot
    assert_eq!(cache.get("level"), Some(json!(2)));
    assert_eq!(cache.get("xp"), Some(json!(10)));
}

#[test]
fn test_state_survives_sign_out_and_back_in() {
    let store = MemoryStore::new();
    let mut session = Session::new(store.clone(), MemoryCache::new());
    let date = today();

    session.sign_in_on_date("user-1", &date).unwrap();
    session.toggle_quest(3); // 30 xp
    session.add_goal(GoalType::Habit, "meditate daily", None);
    session.sign_out();

    let mut session = Session::new(store, MemoryCache::new());
    session.sign_in_on_date("user-1", &date).unwrap();
    assert_eq!(session.progression().xp, 30);
    assert!(session.progression().is_completed(3));
    assert_eq!(session.habit_goals().len(), 1);
    assert_eq!(session.habit_goals()[0].text, "meditate daily");
}

#[test]
fn test_merge_write_preserves_unrelated_document_fields() {
    let store = MemoryStore::new();
    store.insert_raw(
        "user-1",
        json!({"displayName": "Avery", "theme": "dark", "level": 1, "xp": 0}),
    );

    let mut session = Session::new(store.clone(), MemoryCache::new());
    session.sign_in_on_date("user-1", &today()).unwrap();
    session.toggle_quest(2);

    let raw = store.raw("user-1").unwrap();
    assert_eq!(raw["displayName"], json!("Avery"));
    assert_eq!(raw["theme"], json!("dark"));
    assert_eq!(raw["xp"], json!(25));
}

#[test]
fn test_stats_replaced_wholesale_not_field_merged() {
    // A stats key retired from the in-memory bundle disappears remotely
    let store = MemoryStore::new();
    store.insert_raw(
        "user-1",
        json!({
            "xp": 0, "level": 1,
            "stats": {"mindfulness": 4, "charisma": 1},
            "lastLoginDate": today(),
        }),
    );

    let mut session = Session::new(store.clone(), MemoryCache::new());
    session.sign_in_on_date("user-1", &today()).unwrap();
    session.toggle_quest(1);

    let raw = store.raw("user-1").unwrap();
    let stats = raw["stats"].as_object().unwrap();
    assert!(stats.get("mindfulness").is_none());
    // The migrated value moved under the current name and kept growing
    assert_eq!(stats["mindset"], json!(5));
}

#[test]
fn test_failed_write_does_not_roll_back_memory() {
    let store = MemoryStore::new();
    let mut session = Session::new(store.clone(), MemoryCache::new());
    session.sign_in_on_date("user-1", &today()).unwrap();

    store.set_fail_writes(true);
    session.toggle_quest(1);
    session.toggle_quest(2);
    assert_eq!(session.sync_status(), SyncStatus::Failed);
    assert_eq!(session.progression().total_xp(), 45);

    // Remote still holds the pre-failure document
    let doc = store.document("user-1").unwrap();
    assert_eq!(doc.xp, 0);

    // A later successful write carries the whole current snapshot, so the
    // missed syncs are recovered without any replay
    store.set_fail_writes(false);
    session.toggle_quest(3);
    assert_eq!(session.sync_status(), SyncStatus::Synced);
    assert_eq!(store.document("user-1").unwrap().xp, 75);
}

#[test]
fn test_file_backed_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let date = today();

    {
        let store = FileStore::with_dir(dir.path().join("users")).unwrap();
        let cache = FileCache::with_path(dir.path().join("cache.json"));
        let mut session = Session::new(store, cache);
        session.sign_in_on_date("local-profile", &date).unwrap();
        session.toggle_quest(4); // 25 xp
        session.add_goal(
            GoalType::Material,
            "new laptop",
            Some("2027-01-01".to_string()),
        );
    }

    let store = FileStore::with_dir(dir.path().join("users")).unwrap();
    let cache = FileCache::with_path(dir.path().join("cache.json"));
    let mut session = Session::new(store, cache.clone());
    session.sign_in_on_date("local-profile", &date).unwrap();

    assert_eq!(session.progression().xp, 25);
    assert!(session.progression().is_completed(4));
    assert_eq!(session.material_goals().len(), 1);
    assert_eq!(
        session.material_goals()[0].deadline.as_deref(),
        Some("2027-01-01")
    );

    // The previous session's cache mirror is still readable as a fallback
    assert_eq!(cache.get("xp"), Some(json!(25)));
}
