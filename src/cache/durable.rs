// src/cache/durable.rs
// =============================================================================
// The durable tier of the cache: a plain string key/value store.
//
// FileStore keeps one JSON file per key inside the cache directory and
// writes atomically (temp file, then rename) so a crash mid-write never
// leaves a half-written entry behind. Every write gets its own temp file, so
// two writers racing on one key each rename a complete file and the last
// rename wins. MemoryStore is used when no cache directory is wanted and in
// tests.
//
// The store is synchronous and is called straight from async tasks, without
// spawn_blocking. Entries are a few kilobytes at most and are written once
// per fetch.
// =============================================================================

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::error::CacheError;

// Sequence for temp file names, unique within the process
static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

pub trait DurableStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, CacheError>;
    fn write(&self, key: &str, value: &str) -> Result<(), CacheError>;
    fn remove(&self, key: &str) -> Result<(), CacheError>;
}

/// One file per key under `dir`.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys look like "activity:owner/name"; keep them filesystem-safe
        let file_name: String = key
            .chars()
            .map(|c| match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '.' | '_' => c,
                '/' => '+',
                _ => '_',
            })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }
}

impl DurableStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, CacheError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let path = self.path_for(key);
        let tmp_path = path.with_extension(format!(
            "json.{}.{}.tmp",
            std::process::id(),
            TMP_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        fs::write(&tmp_path, value)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local stand-in for the durable tier.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_round_trip_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        assert_eq!(store.read("catalog:octo").unwrap(), None);

        store.write("catalog:octo", "[1,2,3]").unwrap();
        assert_eq!(store.read("catalog:octo").unwrap().as_deref(), Some("[1,2,3]"));

        store.remove("catalog:octo").unwrap();
        assert_eq!(store.read("catalog:octo").unwrap(), None);

        // Removing twice is fine
        store.remove("catalog:octo").unwrap();
    }

    #[test]
    fn test_file_store_keys_with_slashes_stay_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        store.write("activity:octo/tool", "{}").unwrap();

        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
        assert_eq!(store.read("activity:octo/tool").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_file_store_racing_writers_leave_one_whole_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        let values: Vec<String> = (0..8)
            .map(|i| format!("[{}]", i.to_string().repeat(4096)))
            .collect();

        std::thread::scope(|scope| {
            for value in &values {
                let store = &store;
                scope.spawn(move || {
                    for _ in 0..20 {
                        store.write("catalog:octo", value).unwrap();
                    }
                });
            }
        });

        let stored = store.read("catalog:octo").unwrap().unwrap();
        assert!(values.contains(&stored));

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["catalog_octo.json".to_string()]);
    }
}
