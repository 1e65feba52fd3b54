//! Remote-store and local-cache interfaces.
//!
//! The remote store is keyed by an opaque user id and supports get and
//! merge-write at the document level: top-level fields written by the merge
//! replace their remote counterparts, unrelated top-level fields on the same
//! document are preserved. The local cache is a plain string-keyed JSON
//! mirror used only as a single-session fallback.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use directories::ProjectDirs;
use serde_json::Value;
use thiserror::Error;

use crate::document::UserDocument;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("store serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub trait RemoteStore {
    /// Fetches the document for `uid`, `None` when absent.
    fn get(&self, uid: &str) -> Result<Option<UserDocument>, StoreError>;

    /// Merge-writes `doc` into the document for `uid`.
    fn merge(&self, uid: &str, doc: &UserDocument) -> Result<(), StoreError>;
}

pub trait LocalCache {
    fn get(&self, key: &str) -> Option<Value>;

    /// Best-effort write; implementations swallow their own failures.
    fn set(&self, key: &str, value: Value);
}

/// Overlays `update`'s top-level fields onto `existing`, preserving fields
/// the update does not carry.
fn merge_value(existing: Value, update: Value) -> Value {
    match (existing, update) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                base.insert(key, value);
            }
            Value::Object(base)
        }
        (_, update) => update,
    }
}

/// Remote store backed by one JSON file per user id under the platform data
/// directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new() -> io::Result<Self> {
        let project_dirs = ProjectDirs::from("", "", "lifequest").ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "Could not determine data directory")
        })?;
        let dir = project_dirs.data_dir().join("users");
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Store rooted at an explicit directory (tests, portable installs).
    pub fn with_dir(dir: PathBuf) -> io::Result<Self> {
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, uid: &str) -> PathBuf {
        // Uid strings come from the identity provider; keep filenames tame.
        let safe: String = uid
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", safe))
    }

    fn read_raw(&self, uid: &str) -> Result<Option<Value>, StoreError> {
        match fs::read_to_string(self.path_for(uid)) {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl RemoteStore for FileStore {
    fn get(&self, uid: &str) -> Result<Option<UserDocument>, StoreError> {
        match self.read_raw(uid)? {
            Some(raw) => Ok(Some(serde_json::from_value(raw)?)),
            None => Ok(None),
        }
    }

    fn merge(&self, uid: &str, doc: &UserDocument) -> Result<(), StoreError> {
        let existing = self.read_raw(uid)?.unwrap_or(Value::Object(Default::default()));
        let merged = merge_value(existing, serde_json::to_value(doc)?);
        let json = serde_json::to_string_pretty(&merged)?;
        fs::write(self.path_for(uid), json)?;
        Ok(())
    }
}

/// Local cache backed by a single JSON file of key→value pairs.
#[derive(Clone)]
pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    pub fn new() -> io::Result<Self> {
        let project_dirs = ProjectDirs::from("", "", "lifequest").ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "Could not determine data directory")
        })?;
        fs::create_dir_all(project_dirs.data_dir())?;
        Ok(Self {
            path: project_dirs.data_dir().join("cache.json"),
        })
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_all(&self) -> BTreeMap<String, Value> {
        match fs::read_to_string(&self.path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_default(),
            Err(_) => BTreeMap::new(),
        }
    }
}

impl LocalCache for FileCache {
    fn get(&self, key: &str) -> Option<Value> {
        self.read_all().remove(key)
    }

    fn set(&self, key: &str, value: Value) {
        let mut all = self.read_all();
        all.insert(key.to_string(), value);
        match serde_json::to_string_pretty(&all) {
            Ok(json) => {
                if let Err(e) = fs::write(&self.path, json) {
                    tracing::warn!(key, error = %e, "local cache write failed");
                }
            }
            Err(e) => tracing::warn!(key, error = %e, "local cache serialization failed"),
        }
    }
}

/// In-memory remote store for tests. Clones share the same backing map, and
/// writes can be counted or forced to fail.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    documents: BTreeMap<String, Value>,
    write_count: u64,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a document before a session load.
    pub fn insert(&self, uid: &str, doc: &UserDocument) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .documents
            .insert(uid.to_string(), serde_json::to_value(doc).unwrap());
    }

    /// Seeds a raw JSON document, for exercising unknown-field preservation.
    pub fn insert_raw(&self, uid: &str, raw: Value) {
        self.inner.lock().unwrap().documents.insert(uid.to_string(), raw);
    }

    pub fn raw(&self, uid: &str) -> Option<Value> {
        self.inner.lock().unwrap().documents.get(uid).cloned()
    }

    pub fn document(&self, uid: &str) -> Option<UserDocument> {
        self.raw(uid)
            .map(|raw| serde_json::from_value(raw).expect("stored document deserializes"))
    }

    pub fn write_count(&self) -> u64 {
        self.inner.lock().unwrap().write_count
    }

    /// When set, every merge write returns an error (and is not recorded).
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.lock().unwrap().fail_writes = fail;
    }
}

impl RemoteStore for MemoryStore {
    fn get(&self, uid: &str) -> Result<Option<UserDocument>, StoreError> {
        match self.raw(uid) {
            Some(raw) => Ok(Some(serde_json::from_value(raw)?)),
            None => Ok(None),
        }
    }

    fn merge(&self, uid: &str, doc: &UserDocument) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_writes {
            return Err(StoreError::Io(io::Error::new(
                io::ErrorKind::Other,
                "injected write failure",
            )));
        }
        let existing = inner
            .documents
            .remove(uid)
            .unwrap_or(Value::Object(Default::default()));
        let merged = merge_value(existing, serde_json::to_value(doc)?);
        inner.documents.insert(uid.to_string(), merged);
        inner.write_count += 1;
        Ok(())
    }
}

/// In-memory local cache for tests; clones share the same backing map.
#[derive(Clone, Default)]
pub struct MemoryCache {
    inner: Arc<Mutex<BTreeMap<String, Value>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LocalCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        self.inner.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) {
        self.inner.lock().unwrap().insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_file_store_get_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::with_dir(dir.path().to_path_buf()).unwrap();
        assert!(store.get("nobody").unwrap().is_none());
    }

    #[test]
    fn test_file_store_merge_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::with_dir(dir.path().to_path_buf()).unwrap();

        let mut doc = UserDocument::default();
        doc.xp = 35;
        store.merge("alice", &doc).unwrap();

        let loaded = store.get("alice").unwrap().unwrap();
        assert_eq!(loaded.xp, 35);
        assert_eq!(loaded.quests.len(), 4);
    }

    #[test]
    fn test_file_store_merge_preserves_unrelated_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::with_dir(dir.path().to_path_buf()).unwrap();

        // A field some other feature wrote on the same document
        let path = dir.path().join("alice.json");
        fs::write(&path, r#"{"displayName": "Alice", "xp": 5}"#).unwrap();

        let mut doc = UserDocument::default();
        doc.xp = 50;
        store.merge("alice", &doc).unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["displayName"], json!("Alice"));
        assert_eq!(raw["xp"], json!(50));
    }

    #[test]
    fn test_file_store_sanitizes_uid_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::with_dir(dir.path().to_path_buf()).unwrap();
        store.merge("../evil", &UserDocument::default()).unwrap();
        assert!(dir.path().join("___evil.json").exists());
        assert!(store.get("../evil").unwrap().is_some());
    }

    #[test]
    fn test_file_cache_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::with_path(dir.path().join("cache.json"));

        assert!(cache.get("xp").is_none());
        cache.set("xp", json!(42));
        cache.set("level", json!(2));
        assert_eq!(cache.get("xp"), Some(json!(42)));
        assert_eq!(cache.get("level"), Some(json!(2)));
    }

    #[test]
    fn test_memory_store_counts_writes() {
        let store = MemoryStore::new();
        assert_eq!(store.write_count(), 0);
        store.merge("u", &UserDocument::default()).unwrap();
        store.merge("u", &UserDocument::default()).unwrap();
        assert_eq!(store.write_count(), 2);
    }

    #[test]
    fn test_memory_store_failure_injection() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);
        assert!(store.merge("u", &UserDocument::default()).is_err());
        assert_eq!(store.write_count(), 0);

        store.set_fail_writes(false);
        assert!(store.merge("u", &UserDocument::default()).is_ok());
    }

    #[test]
    fn test_memory_store_merge_preserves_unrelated_fields() {
        let store = MemoryStore::new();
        store.insert_raw("u", json!({"displayName": "Bob"}));
        store.merge("u", &UserDocument::default()).unwrap();

        let raw = store.raw("u").unwrap();
        assert_eq!(raw["displayName"], json!("Bob"));
        assert_eq!(raw["level"], json!(1));
    }

    #[test]
    fn test_merge_value_non_object_replaced() {
        let merged = merge_value(json!("scalar"), json!({"a": 1}));
        assert_eq!(merged, json!({"a": 1}));
    }
}
