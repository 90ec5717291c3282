//! Named JSON document storage with file locking.
//!
//! Each key maps to `<data_dir>/<key>.json`. Loads never fail on bad data:
//! a missing, unreadable or corrupted document yields the type's default.
//! Writes are atomic (temp file + rename) and `update` holds an exclusive
//! lock on a sidecar `<key>.lock` for the whole load-modify-save cycle, so
//! two processes cannot both apply a change computed from the same snapshot.

use crate::{Error, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const XP_PROFILE: &str = "xp_profile";
pub const BODY_PART_GOALS: &str = "body_part_goals";
pub const REST_TIMER_CONFIG: &str = "rest_timer_config";
pub const NUTRIENT_GOALS: &str = "nutrient_goals";
pub const DAILY_LOGS: &str = "daily_logs";
pub const ACHIEVEMENTS: &str = "achievements";

/// File name of the append-only workout log inside the data directory
pub const WORKOUT_HISTORY_FILE: &str = "workout_history.jsonl";

/// Directory of JSON documents
#[derive(Clone, Debug)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    pub fn history_path(&self) -> PathBuf {
        self.dir.join(WORKOUT_HISTORY_FILE)
    }

    pub fn exists(&self, key: &str) -> bool {
        self.path(key).exists()
    }

    /// Load a document with shared locking
    ///
    /// Returns the default value if the file doesn't exist.
    /// If the file is corrupted, logs a warning and returns the default.
    pub fn load<T>(&self, key: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        Ok(self.load_optional(key)?.unwrap_or_default())
    }

    /// Like [`Store::load`] but distinguishes "nothing usable stored" (`None`)
    pub fn load_optional<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let path = self.path(key);
        if !path.exists() {
            tracing::debug!("No {} document found, using default", key);
            return Ok(None);
        }

        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open {:?}: {}. Using defaults.", path, e);
                return Ok(None);
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock {:?}: {}. Using defaults.", path, e);
            return Ok(None);
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!("Failed to read {:?}: {}. Using defaults.", path, e);
            return Ok(None);
        }

        file.unlock()?;

        match serde_json::from_str::<T>(&contents) {
            Ok(value) => {
                tracing::debug!("Loaded {} from {:?}", key, path);
                Ok(Some(value))
            }
            Err(e) => {
                tracing::warn!("Failed to parse {:?}: {}. Using defaults.", path, e);
                Ok(None)
            }
        }
    }

    /// Save a document atomically
    ///
    /// 1. Write to a temp file in the same directory
    /// 2. Sync to disk
    /// 3. Rename over the original
    pub fn save<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize,
    {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path(key);

        let temp = NamedTempFile::new_in(&self.dir)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(value)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved {} to {:?}", key, path);
        Ok(())
    }

    /// Load a document, modify it, and save it back under an exclusive lock
    ///
    /// The closure's return value is passed through. If the closure fails,
    /// nothing is written.
    pub fn update<T, R, F>(&self, key: &str, f: F) -> Result<R>
    where
        T: Serialize + DeserializeOwned + Default,
        F: FnOnce(&mut T) -> Result<R>,
    {
        std::fs::create_dir_all(&self.dir)?;
        let lock_path = self.dir.join(format!("{}.lock", key));
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        lock.lock_exclusive()?;

        let result = (|| {
            let mut value: T = self.load(key)?;
            let out = f(&mut value)?;
            self.save(key, &value)?;
            Ok(out)
        })();

        lock.unlock()?;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
    struct Counter {
        value: u32,
        label: Option<String>,
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = Store::new(temp_dir.path());

        let counter = Counter {
            value: 7,
            label: Some("sets".into()),
        };
        store.save("counter", &counter).unwrap();

        let loaded: Counter = store.load("counter").unwrap();
        assert_eq!(loaded, counter);
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = Store::new(temp_dir.path().join("missing"));

        let loaded: Counter = store.load("counter").unwrap();
        assert_eq!(loaded, Counter::default());
        assert!(store.load_optional::<Counter>("counter").unwrap().is_none());
    }

    #[test]
    fn test_corrupted_document_returns_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = Store::new(temp_dir.path());
        std::fs::write(store.path("counter"), "{ invalid json }").unwrap();

        let loaded: Counter = store.load("counter").unwrap();
        assert_eq!(loaded, Counter::default());
    }

    #[test]
    fn test_update_pattern() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = Store::new(temp_dir.path());

        let returned = store
            .update("counter", |c: &mut Counter| {
                c.value += 2;
                Ok(c.value)
            })
            .unwrap();
        assert_eq!(returned, 2);

        let loaded: Counter = store.load("counter").unwrap();
        assert_eq!(loaded.value, 2);
    }

    #[test]
    fn test_failed_update_writes_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = Store::new(temp_dir.path());
        store.save("counter", &Counter { value: 1, label: None }).unwrap();

        let result = store.update("counter", |c: &mut Counter| -> Result<()> {
            c.value = 99;
            Err(Error::Other("boom".into()))
        });
        assert!(result.is_err());

        let loaded: Counter = store.load("counter").unwrap();
        assert_eq!(loaded.value, 1);
    }

    #[test]
    fn test_concurrent_updates_do_not_lose_writes() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().to_path_buf();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Store::new(dir.clone());
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        store
                            .update("counter", |c: &mut Counter| {
                                c.value += 1;
                                Ok(())
                            })
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let loaded: Counter = Store::new(dir).load("counter").unwrap();
        assert_eq!(loaded.value, 40);
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = Store::new(temp_dir.path());
        store.save("counter", &Counter::default()).unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "counter.json")
            .collect();
        assert!(extras.is_empty(), "found extras: {:?}", extras);
    }
}
