//! Per-job result files on disk, guarded by a per-job lock table.
//!
//! The table maps a job id to a mutex that is held while that job's file is
//! written or read. Presence of an entry means the job is pending or
//! executing; absence for an id that has been issued means the job is done
//! and its file is immutable, so a reader that finds no entry can read the
//! file without acquiring any lock.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResultStoreError {
    #[error("failed to prepare results directory {path}: {source}")]
    PrepareDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write result file for job {id}: {source}")]
    Write {
        id: u64,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read result file for job {id}: {source}")]
    Read {
        id: u64,
        #[source]
        source: std::io::Error,
    },
    #[error("result file for job {id} contains invalid JSON: {source}")]
    Corrupt {
        id: u64,
        #[source]
        source: serde_json::Error,
    },
}

/// The state a poll observes for a given job id.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultState {
    Running,
    Done(Value),
    /// No file exists for this id. Only expected for ids that were never
    /// issued; a missing file for an issued id is an invariant breach.
    Missing,
}

#[derive(Serialize)]
struct RunningDoc {
    status: &'static str,
}

#[derive(Serialize)]
struct DoneDoc<'a> {
    status: &'static str,
    data: &'a Value,
}

pub struct ResultStore {
    dir: PathBuf,
    locks: DashMap<u64, Arc<Mutex<()>>>,
}

impl ResultStore {
    /// Create the store, wiping and recreating `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ResultStoreError> {
        let dir = dir.into();
        if dir.exists() {
            std::fs::remove_dir_all(&dir).map_err(|source| ResultStoreError::PrepareDir {
                path: dir.clone(),
                source,
            })?;
        }
        std::fs::create_dir_all(&dir).map_err(|source| ResultStoreError::PrepareDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir,
            locks: DashMap::new(),
        })
    }

    fn path_for(&self, id: u64) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Insert a fresh lock entry and write the initial `{"status":"running"}` file.
    #[allow(clippy::unwrap_used)]
    pub fn register(&self, id: u64) -> Result<(), ResultStoreError> {
        let entry = self
            .locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())));
        let lock = Arc::clone(entry.value());
        drop(entry);

        let _guard = lock.lock().unwrap();
        self.write_doc(id, &RunningDoc { status: "running" })
    }

    /// Overwrite the file with the terminal document, then drop the lock entry.
    #[allow(clippy::unwrap_used)]
    pub fn finalize(&self, id: u64, data: &Value) -> Result<(), ResultStoreError> {
        let lock = self
            .locks
            .get(&id)
            .map(|entry| Arc::clone(entry.value()));

        if let Some(lock) = lock {
            let _guard = lock.lock().unwrap();
            self.write_doc(
                id,
                &DoneDoc {
                    status: "done",
                    data,
                },
            )?;
        }
        self.locks.remove(&id);
        Ok(())
    }

    /// Read the current state of a job's result.
    #[allow(clippy::unwrap_used)]
    pub fn read(&self, id: u64) -> Result<ResultState, ResultStoreError> {
        let lock = self
            .locks
            .get(&id)
            .map(|entry| Arc::clone(entry.value()));

        match lock {
            Some(lock) => {
                let _guard = lock.lock().unwrap();
                self.read_file(id)
            }
            None => self.read_file(id),
        }
    }

    /// Snapshot membership test: is `id` still pending or executing?
    pub fn contains(&self, id: u64) -> bool {
        self.locks.contains_key(&id)
    }

    fn write_doc(&self, id: u64, doc: &impl Serialize) -> Result<(), ResultStoreError> {
        let path = self.path_for(id);
        let bytes =
            serde_json::to_vec(doc).map_err(|source| ResultStoreError::Corrupt { id, source })?;
        std::fs::write(&path, bytes).map_err(|source| ResultStoreError::Write { id, source })
    }

    fn read_file(&self, id: u64) -> Result<ResultState, ResultStoreError> {
        let path = self.path_for(id);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ResultState::Missing),
            Err(source) => return Err(ResultStoreError::Read { id, source }),
        };
        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|source| ResultStoreError::Corrupt { id, source })?;

        match value.get("status").and_then(Value::as_str) {
            Some("done") => Ok(ResultState::Done(
                value.get("data").cloned().unwrap_or(Value::Null),
            )),
            _ => Ok(ResultState::Running),
        }
    }
}
