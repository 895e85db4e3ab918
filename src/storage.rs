//! Key-value persistence for the task list.
//!
//! The whole list lives under a single key as a JSON array and is rewritten in
//! full after every mutation. `FileStorage` maps each key to a file in a data
//! directory and writes atomically (temp file + rename); `MemoryStorage` keeps
//! everything in a map for tests.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::task::Task;

/// Key holding the serialized task list.
pub const TASKS_KEY: &str = "tasks";
/// Key a malformed task list is copied to before starting fresh.
pub const CORRUPT_KEY: &str = "tasks.corrupt";

/// A string key-value store.
pub trait Storage {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set_item(&mut self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// What to do when the stored task list cannot be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadPolicy {
    /// Keep a copy of the bad payload under `CORRUPT_KEY` and start empty.
    #[default]
    Backup,
    /// Refuse to start.
    Fail,
}

/// One JSON file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    #[tracing::instrument(skip(dir))]
    pub fn open(dir: &Path) -> anyhow::Result<Self> {
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
        info!(data_dir = %dir.display(), "opened storage");
        Ok(FileStorage { dir: dir.to_path_buf() })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            debug!(file = %path.display(), "no stored value");
            return Ok(None);
        }
        let raw = fs::read_to_string(&path).with_context(|| format!("failed reading {}", path.display()))?;
        Ok(Some(raw))
    }

    #[tracing::instrument(skip(self, value), fields(bytes = value.len()))]
    fn set_item(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        let path = self.path_for(key);
        let mut temp = NamedTempFile::new_in(&self.dir)?;
        temp.write_all(value.as_bytes())?;
        temp.flush()?;
        temp.persist(&path)
            .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;
        Ok(())
    }
}

/// In-memory storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(mut self, key: &str, value: &str) -> Self {
        self.items.insert(key.to_string(), value.to_string());
        self
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Read the stored task list. A missing or blank value is an empty list.
#[tracing::instrument(skip(storage))]
pub fn load_tasks<S: Storage + ?Sized>(storage: &mut S, policy: LoadPolicy) -> anyhow::Result<Vec<Task>> {
    let Some(raw) = storage.get_item(TASKS_KEY)? else {
        return Ok(Vec::new());
    };
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    match serde_json::from_str::<Vec<Task>>(&raw) {
        Ok(tasks) => {
            debug!(count = tasks.len(), "loaded tasks");
            Ok(tasks)
        }
        Err(err) => match policy {
            LoadPolicy::Fail => Err(err).context("stored task list is malformed"),
            LoadPolicy::Backup => {
                warn!(error = %err, backup = CORRUPT_KEY, "stored task list is malformed; starting empty");
                storage
                    .set_item(CORRUPT_KEY, &raw)
                    .context("failed to back up malformed task list")?;
                Ok(Vec::new())
            }
        },
    }
}

/// Overwrite the stored task list.
#[tracing::instrument(skip(storage, tasks), fields(count = tasks.len()))]
pub fn save_tasks<S: Storage + ?Sized>(storage: &mut S, tasks: &[Task]) -> anyhow::Result<()> {
    let data = serde_json::to_string_pretty(tasks).context("failed to serialize tasks")?;
    storage.set_item(TASKS_KEY, &data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn sample() -> Vec<Task> {
        let mut done = Task::new(2, "Water plants", None, "personal");
        done.done = true;
        vec![
            done,
            Task::new(1, "File <taxes>", NaiveDate::from_ymd_opt(2024, 4, 15), "work"),
        ]
    }

    #[test]
    fn test_missing_and_blank_values_load_empty() {
        let mut storage = MemoryStorage::new();
        assert!(load_tasks(&mut storage, LoadPolicy::Fail).unwrap().is_empty());

        let mut storage = MemoryStorage::new().with_item(TASKS_KEY, "   ");
        assert!(load_tasks(&mut storage, LoadPolicy::Fail).unwrap().is_empty());
    }

    #[test]
    fn test_round_trip() {
        let mut storage = MemoryStorage::new();
        save_tasks(&mut storage, &sample()).unwrap();
        assert_eq!(load_tasks(&mut storage, LoadPolicy::Fail).unwrap(), sample());
    }

    #[test]
    fn test_loads_list_written_by_older_builds() {
        let raw = r#"[{"id":1718000000000,"text":"Old","done":false,"dueDate":"","category":"study"}]"#;
        let mut storage = MemoryStorage::new().with_item(TASKS_KEY, raw);
        let tasks = load_tasks(&mut storage, LoadPolicy::Fail).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, 1718000000000);
        assert_eq!(tasks[0].due_date, None);
    }

    #[test]
    fn test_malformed_data_with_backup_policy() {
        let mut storage = MemoryStorage::new().with_item(TASKS_KEY, "{not json");
        let tasks = load_tasks(&mut storage, LoadPolicy::Backup).unwrap();
        assert!(tasks.is_empty());
        assert_eq!(storage.get_item(CORRUPT_KEY).unwrap().as_deref(), Some("{not json"));
    }

    #[test]
    fn test_malformed_data_with_fail_policy() {
        let mut storage = MemoryStorage::new().with_item(TASKS_KEY, "[1, 2");
        let err = load_tasks(&mut storage, LoadPolicy::Fail).unwrap_err();
        assert!(err.to_string().contains("malformed"));
        assert_eq!(storage.get_item(CORRUPT_KEY).unwrap(), None);
    }

    #[test]
    fn test_file_storage_writes_one_file_per_key() {
        let temp = tempdir().unwrap();
        let mut storage = FileStorage::open(&temp.path().join("data")).unwrap();
        assert_eq!(storage.get_item(TASKS_KEY).unwrap(), None);

        save_tasks(&mut storage, &sample()).unwrap();
        assert!(storage.path_for(TASKS_KEY).exists());

        let reopened = FileStorage::open(storage.dir()).unwrap();
        let raw = reopened.get_item(TASKS_KEY).unwrap().unwrap();
        let parsed: Vec<Task> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, sample());
    }
}
