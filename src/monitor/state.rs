use super::Status;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Last status observed per site url as of the end of the previous run.
/// Keys accumulate across runs and are never deleted by the engine.
pub type StateRecord = BTreeMap<String, Status>;

/// Durable home of the [`StateRecord`]: a human-readable JSON file, read
/// once at run start and replaced wholesale once at run end.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted record. A missing or corrupt file degrades to an
    /// empty record so monitoring keeps running; every site then starts from
    /// the absent-prior baseline.
    pub fn load(&self) -> StateRecord {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return StateRecord::new();
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "state file unreadable; starting empty");
                return StateRecord::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "state file corrupt; starting empty");
                StateRecord::new()
            }
        }
    }

    /// Replaces the persisted record with `record` in one atomic step:
    /// write a sibling temp file, then rename over the target. A run killed
    /// mid-save leaves the previous run's record authoritative.
    pub fn save(&self, record: &StateRecord) -> Result<(), PersistenceError> {
        let json =
            serde_json::to_string_pretty(record).map_err(PersistenceError::Encode)?;

        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, json).map_err(|source| PersistenceError::Write {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|source| PersistenceError::Commit {
            path: self.path.clone(),
            source,
        })
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[derive(Debug)]
pub enum PersistenceError {
    Encode(serde_json::Error),
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    Commit {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Encode(err) => write!(f, "failed to encode state record: {err}"),
            PersistenceError::Write { path, .. } => {
                write!(f, "failed to write state file {}", path.display())
            }
            PersistenceError::Commit { path, .. } => {
                write!(f, "failed to commit state file {}", path.display())
            }
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistenceError::Encode(source) => Some(source),
            PersistenceError::Write { source, .. } | PersistenceError::Commit { source, .. } => {
                Some(source)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn temp_state_path(tag: &str) -> PathBuf {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!(
            "roomwatch-state-{tag}-{}-{n}.json",
            std::process::id()
        ))
    }

    #[test]
    fn missing_file_loads_empty() {
        let store = StateStore::new(temp_state_path("missing"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let path = temp_state_path("corrupt");
        fs::write(&path, "{ not json").expect("write corrupt file");
        let store = StateStore::new(&path);
        assert!(store.load().is_empty());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn save_then_load_round_trips() {
        let path = temp_state_path("roundtrip");
        let store = StateStore::new(&path);

        let mut record = StateRecord::new();
        record.insert("https://a.example".to_string(), Status::Available);
        record.insert("https://b.example".to_string(), Status::SoldOut);
        record.insert("https://c.example".to_string(), Status::Unknown);

        store.save(&record).expect("state saves");
        assert_eq!(store.load(), record);

        // Re-saving what was loaded must not change the bytes on disk.
        let before = fs::read_to_string(&path).expect("state readable");
        store.save(&store.load()).expect("state saves again");
        let after = fs::read_to_string(&path).expect("state readable");
        assert_eq!(before, after);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn persisted_form_uses_plain_status_strings() {
        let path = temp_state_path("schema");
        let store = StateStore::new(&path);

        let mut record = StateRecord::new();
        record.insert("https://a.example".to_string(), Status::SoldOut);
        store.save(&record).expect("state saves");

        let raw = fs::read_to_string(&path).expect("state readable");
        assert!(raw.contains("\"soldout\""));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn save_leaves_no_temp_file_behind() {
        let path = temp_state_path("tmpfile");
        let store = StateStore::new(&path);
        store.save(&StateRecord::new()).expect("state saves");
        assert!(!store.tmp_path().exists());
        let _ = fs::remove_file(&path);
    }
}
