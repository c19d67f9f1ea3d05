//! In-memory account store with snapshot persistence
//!
//! Keeps all records in a map and flushes the whole map to a JSON snapshot
//! file at a fixed interval. Safe for concurrent access; not meant for
//! production workloads (the snapshot is plaintext and flushes are whole-file
//! rewrites).
//!
//! The flush loop runs on a dedicated thread and stops when told to: a
//! shutdown signals the thread, joins it, and writes one final snapshot.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::Duration;

use super::{AccountKey, AccountRecord, AccountResult, AccountStoreError, RecordStore};

/// Default snapshot file name inside the data directory.
pub const SNAPSHOT_FILE_NAME: &str = "records.json";

const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(10);

/// In-memory record store, optionally persisted as a JSON snapshot.
pub struct MemoryStore {
    shared: Arc<Shared>,
    flush_interval: Duration,
    worker: Mutex<Option<FlushWorker>>,
}

struct Shared {
    state: Mutex<State>,
}

struct State {
    records: HashMap<AccountKey, AccountRecord>,
    snapshot_path: Option<PathBuf>,
    closed: bool,
}

struct FlushWorker {
    stop: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl MemoryStore {
    /// Creates a store with no persistence and the default flush interval.
    ///
    /// Call [`MemoryStore::initialize_persistence`] afterwards to load an
    /// existing snapshot and start the periodic flush; without it all data
    /// lives in memory only.
    pub fn new() -> Self {
        Self::with_flush_interval(DEFAULT_FLUSH_INTERVAL)
    }

    /// Creates a store flushing at the given interval once persistence is
    /// initialized.
    pub fn with_flush_interval(flush_interval: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    records: HashMap::new(),
                    snapshot_path: None,
                    closed: false,
                }),
            }),
            flush_interval,
            worker: Mutex::new(None),
        }
    }

    /// Loads the snapshot at `path` (creating it if absent) and starts the
    /// periodic flush thread.
    pub fn initialize_persistence(&self, path: impl Into<PathBuf>) -> AccountResult<()> {
        let path = path.into();

        let records = match fs::read(&path) {
            Ok(contents) if contents.is_empty() => HashMap::new(),
            Ok(contents) => serde_json::from_slice(&contents).map_err(|source| {
                AccountStoreError::Decode {
                    key: path.display().to_string(),
                    source,
                }
            })?,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&path, b"")?;
                HashMap::new()
            }
            Err(err) => return Err(err.into()),
        };

        {
            let mut state = self.shared.lock_state();
            state.records = records;
            state.snapshot_path = Some(path);
        }

        let (stop_tx, stop_rx) = mpsc::channel();
        let shared = Arc::clone(&self.shared);
        let interval = self.flush_interval;
        let handle = std::thread::spawn(move || loop {
            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {
                    let _ = shared.flush();
                }
                // Stop requested, or the store was dropped.
                _ => break,
            }
        });

        let mut worker = match self.worker.lock() {
            Ok(worker) => worker,
            Err(poisoned) => poisoned.into_inner(),
        };
        *worker = Some(FlushWorker {
            stop: stop_tx,
            handle,
        });

        Ok(())
    }

    /// Writes the current state to the snapshot file, if persistence is
    /// enabled. Blocks writers for the duration of the flush.
    pub fn flush(&self) -> AccountResult<()> {
        self.shared.flush()
    }

    /// Stops the flush thread, persists one final snapshot, and marks the
    /// store closed. Idempotent; after shutdown every `put` and `fetch`
    /// fails with [`AccountStoreError::Closed`]. A closed store cannot be
    /// reused.
    pub fn shutdown(&self) -> AccountResult<()> {
        let worker = {
            let mut slot = match self.worker.lock() {
                Ok(slot) => slot,
                Err(poisoned) => poisoned.into_inner(),
            };
            slot.take()
        };

        if let Some(worker) = worker {
            let _ = worker.stop.send(());
            let _ = worker.handle.join();
        }

        {
            let mut state = self.shared.lock_state();
            if state.closed {
                return Ok(());
            }
            state.closed = true;
        }

        self.shared.flush()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MemoryStore {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

impl RecordStore for MemoryStore {
    fn put(&self, key: &AccountKey, record: &AccountRecord) -> AccountResult<()> {
        let mut state = self.shared.lock_state();
        if state.closed {
            return Err(AccountStoreError::Closed);
        }
        state.records.insert(key.clone(), record.clone());
        Ok(())
    }

    fn fetch(&self, key: &AccountKey) -> AccountResult<AccountRecord> {
        let state = self.shared.lock_state();
        if state.closed {
            return Err(AccountStoreError::Closed);
        }
        state
            .records
            .get(key)
            .cloned()
            .ok_or_else(|| crate::logstore::StoreError::not_found(key.as_str()).into())
    }
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn flush(&self) -> AccountResult<()> {
        let state = self.lock_state();
        let path = match &state.snapshot_path {
            Some(path) => path.clone(),
            // Persistence not enabled.
            None => return Ok(()),
        };
        let payload =
            serde_json::to_vec(&state.records).map_err(AccountStoreError::Encode)?;
        fs::write(path, payload)?;
        Ok(())
    }
}
