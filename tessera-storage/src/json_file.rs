//! JSON-lines file store.
//!
//! One record per line. Inserts append; replace and delete rewrite the whole
//! file. Any I/O error during a mutation is reported as
//! [`StoreOutcome::Failure`], so an unwritable file yields store-access
//! errors at the cache level.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tessera_core::{CacheConfig, EntityId, StoreError};

use crate::{Record, Store, StoreOutcome};

/// File-backed store holding one JSON object per line.
#[derive(Debug)]
pub struct JsonLinesStore {
    path: PathBuf,
    read_only: bool,
    io_lock: Mutex<()>,
}

impl JsonLinesStore {
    /// Open a store, creating an empty file if none exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| io_error(&path, &e))?;
        Ok(Self {
            path,
            read_only: false,
            io_lock: Mutex::new(()),
        })
    }

    /// Open an existing file without write access. Every mutation fails.
    pub fn open_read_only(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        fs::metadata(&path).map_err(|e| io_error(&path, &e))?;
        Ok(Self {
            path,
            read_only: true,
            io_lock: Mutex::new(()),
        })
    }

    /// Open the store named by a cache configuration.
    pub fn from_config(config: &CacheConfig) -> Result<Self, StoreError> {
        Self::open(config.store_path.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Empty the file.
    pub fn truncate(&self) -> Result<(), StoreError> {
        let _guard = self.io_lock.lock();
        fs::write(&self.path, "").map_err(|e| io_error(&self.path, &e))
    }

    /// Largest stored identifier, or `None` for an empty store.
    pub fn max_id(&self) -> Result<Option<EntityId>, StoreError> {
        Ok(self.fetch_all()?.iter().filter_map(Record::id).max())
    }

    fn read_lines(&self) -> Result<Vec<String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(contents
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(str::to_string)
                .collect()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(io_error(&self.path, &e)),
        }
    }

    fn parse_lines(lines: &[String]) -> Result<Vec<Record>, StoreError> {
        lines
            .iter()
            .enumerate()
            .map(|(index, line)| {
                Record::from_line(line).map_err(|e| StoreError::Malformed {
                    line: index + 1,
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    fn write_lines(&self, lines: &[String]) -> Result<(), StoreError> {
        let mut contents = lines.join("\n");
        if !contents.is_empty() {
            contents.push('\n');
        }
        fs::write(&self.path, contents).map_err(|e| io_error(&self.path, &e))
    }

    fn append_line(&self, line: &str) -> Result<(), StoreError> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| io_error(&self.path, &e))?;
        writeln!(file, "{}", line).map_err(|e| io_error(&self.path, &e))?;
        file.flush().map_err(|e| io_error(&self.path, &e))
    }

    fn find(&self, id: EntityId) -> Result<Option<Record>, StoreError> {
        let lines = self.read_lines()?;
        Ok(Self::parse_lines(&lines)?
            .into_iter()
            .find(|record| record.id() == Some(id)))
    }

    /// Rewrite the file with the line for `id` replaced (or dropped when `with` is None).
    fn rewrite(&self, id: EntityId, with: Option<&Record>) -> StoreOutcome {
        let lines = match self.read_lines() {
            Ok(lines) => lines,
            Err(e) => return StoreOutcome::failure(e.to_string()),
        };
        let records = match Self::parse_lines(&lines) {
            Ok(records) => records,
            Err(e) => return StoreOutcome::failure(e.to_string()),
        };
        let Some(index) = records.iter().position(|r| r.id() == Some(id)) else {
            return StoreOutcome::NotFound;
        };

        let mut lines = lines;
        match with {
            Some(record) => lines[index] = record.to_line(),
            None => {
                lines.remove(index);
            }
        }

        match self.write_lines(&lines) {
            Ok(()) => StoreOutcome::Success,
            Err(e) => StoreOutcome::failure(e.to_string()),
        }
    }

    fn check_mutation(&self, record: &Record) -> Result<EntityId, StoreOutcome> {
        if self.read_only {
            return Err(StoreOutcome::failure(format!(
                "{} opened read-only",
                self.path.display()
            )));
        }
        record
            .id()
            .ok_or_else(|| StoreOutcome::failure("record has no integer id"))
    }
}

fn io_error(path: &Path, e: &std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

impl Store for JsonLinesStore {
    fn fetch_one(&self, id: EntityId) -> Option<Record> {
        let _guard = self.io_lock.lock();
        match self.find(id) {
            Ok(found) => found,
            Err(e) => {
                tracing::debug!(entity_id = %id, error = %e, "Store read failed");
                None
            }
        }
    }

    fn fetch_all(&self) -> Result<Vec<Record>, StoreError> {
        let _guard = self.io_lock.lock();
        self.read_lines()
            .and_then(|lines| Self::parse_lines(&lines))
            .map_err(|e| StoreError::EnumerationFailed {
                reason: e.to_string(),
            })
    }

    fn insert(&self, record: &Record) -> StoreOutcome {
        let Some(id) = record.id() else {
            return StoreOutcome::failure("record has no integer id");
        };
        let _guard = self.io_lock.lock();
        // An existing id is reported even on a read-only handle.
        match self.find(id) {
            Ok(Some(_)) => return StoreOutcome::AlreadyExists,
            Ok(None) => {}
            Err(e) => return StoreOutcome::failure(e.to_string()),
        }
        if let Err(outcome) = self.check_mutation(record) {
            return outcome;
        }
        match self.append_line(&record.to_line()) {
            Ok(()) => StoreOutcome::Success,
            Err(e) => StoreOutcome::failure(e.to_string()),
        }
    }

    fn replace(&self, record: &Record) -> StoreOutcome {
        let id = match self.check_mutation(record) {
            Ok(id) => id,
            Err(outcome) => return outcome,
        };
        let _guard = self.io_lock.lock();
        self.rewrite(id, Some(record))
    }

    fn delete(&self, record: &Record) -> StoreOutcome {
        let id = match self.check_mutation(record) {
            Ok(id) => id,
            Err(outcome) => return outcome,
        };
        let _guard = self.io_lock.lock();
        self.rewrite(id, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn record(id: i64, name: &str) -> Record {
        Record::new(json!({"id": id, "name": name}))
    }

    fn open_temp() -> (TempDir, JsonLinesStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonLinesStore::open(dir.path().join("db.jsonl")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_open_creates_empty_file() {
        let (_dir, store) = open_temp();
        assert!(store.path().exists());
        assert!(store.fetch_all().unwrap().is_empty());
        assert_eq!(store.max_id().unwrap(), None);
    }

    #[test]
    fn test_insert_appends_one_line_per_record() {
        let (_dir, store) = open_temp();
        assert_eq!(store.insert(&record(1, "Flaky")), StoreOutcome::Success);
        assert_eq!(store.insert(&record(2, "Flay")), StoreOutcome::Success);
        assert_eq!(store.insert(&record(1, "Again")), StoreOutcome::AlreadyExists);

        let contents = fs::read_to_string(store.path()).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert_eq!(store.fetch_one(EntityId::new(2)), Some(record(2, "Flay")));
        assert_eq!(store.max_id().unwrap(), Some(EntityId::new(2)));
    }

    #[test]
    fn test_replace_rewrites_in_place() {
        let (_dir, store) = open_temp();
        store.insert(&record(1, "a"));
        store.insert(&record(2, "b"));
        store.insert(&record(3, "c"));

        assert_eq!(store.replace(&record(2, "B")), StoreOutcome::Success);
        assert_eq!(store.replace(&record(7, "?")), StoreOutcome::NotFound);

        let names: Vec<String> = store
            .fetch_all()
            .unwrap()
            .iter()
            .map(|r| r.as_value()["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a", "B", "c"]);
    }

    #[test]
    fn test_delete_removes_line() {
        let (_dir, store) = open_temp();
        store.insert(&record(1, "a"));
        store.insert(&record(2, "b"));

        assert_eq!(store.delete(&record(1, "a")), StoreOutcome::Success);
        assert_eq!(store.delete(&record(1, "a")), StoreOutcome::NotFound);
        assert_eq!(store.fetch_one(EntityId::new(1)), None);
        assert_eq!(store.fetch_all().unwrap(), vec![record(2, "b")]);
    }

    #[test]
    fn test_malformed_line_breaks_enumeration() {
        let (_dir, store) = open_temp();
        store.insert(&record(1, "a"));
        fs::write(store.path(), "{\"id\":1,\"name\":\"a\"}\n{oops\n").unwrap();

        match store.fetch_all() {
            Err(StoreError::EnumerationFailed { reason }) => assert!(reason.contains("line 2")),
            other => panic!("expected enumeration failure, got {:?}", other),
        }
        assert_eq!(store.fetch_one(EntityId::new(1)), None);
        assert!(matches!(store.replace(&record(1, "z")), StoreOutcome::Failure { .. }));
    }

    #[test]
    fn test_read_only_store_fails_mutations() {
        let (dir, store) = open_temp();
        store.insert(&record(0, "old"));

        let read_only = JsonLinesStore::open_read_only(dir.path().join("db.jsonl")).unwrap();
        assert_eq!(read_only.fetch_one(EntityId::new(0)), Some(record(0, "old")));
        assert!(matches!(read_only.insert(&record(5, "x")), StoreOutcome::Failure { .. }));
        assert!(matches!(read_only.replace(&record(0, "new")), StoreOutcome::Failure { .. }));
        assert!(matches!(read_only.delete(&record(0, "old")), StoreOutcome::Failure { .. }));
        assert_eq!(store.fetch_one(EntityId::new(0)), Some(record(0, "old")));
    }

    #[test]
    fn test_read_only_insert_of_stored_id_is_already_exists() {
        let (dir, store) = open_temp();
        store.insert(&record(0, "old"));

        let read_only = JsonLinesStore::open_read_only(dir.path().join("db.jsonl")).unwrap();
        assert_eq!(read_only.insert(&record(0, "other")), StoreOutcome::AlreadyExists);
        assert!(matches!(read_only.insert(&record(1, "new")), StoreOutcome::Failure { .. }));
        assert_eq!(fs::read_to_string(store.path()).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_open_read_only_requires_existing_file() {
        let dir = TempDir::new().unwrap();
        let err = JsonLinesStore::open_read_only(dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn test_truncate_empties_store() {
        let (_dir, store) = open_temp();
        store.insert(&record(1, "a"));
        store.truncate().unwrap();
        assert!(store.fetch_all().unwrap().is_empty());
    }
}
