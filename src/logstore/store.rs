//! Append-only log store
//!
//! Persists opaque byte values under text keys in a single log file:
//!
//! - Append-only: existing bytes are never overwritten.
//! - Latest record wins; a tombstone hides a key without reclaiming space.
//! - Writers serialize on a mutex; the full record goes out in one locked
//!   `write_all`, optionally followed by fsync.
//! - Readers never lock. Each lookup opens its own handle and scans to the
//!   end, so a reader sees some prefix of the writer's appends and a torn
//!   tail parses as a clean end of stream.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::observability::Logger;

use super::errors::{StoreError, StoreResult};
use super::record::Record;
use super::scanner::RecordScanner;

/// Fixed name of the log file inside the store directory.
pub const LOG_FILE_NAME: &str = "logstore.db";

/// Default bound on a single serialized record: 1 MiB.
pub const DEFAULT_MAX_RECORD_SIZE: usize = 1 << 20;

/// Construction-time store settings. Runtime mutation is not supported.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Largest serialized record accepted by the write path.
    pub max_record_size: usize,
    /// Flush every append to stable storage before acknowledging it.
    /// Synchronous mode costs a disk round-trip per write.
    pub sync: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_record_size: DEFAULT_MAX_RECORD_SIZE,
            sync: false,
        }
    }
}

/// A persistent, append-only, log-based key-value store.
pub struct LogStore {
    /// Path of the underlying log file.
    path: PathBuf,
    max_record_size: usize,
    sync: bool,
    /// Serializes writers. Readers deliberately do not take it.
    write_lock: Mutex<()>,
    logger: Logger,
}

impl LogStore {
    /// Opens the store in `dir` with default settings.
    ///
    /// Joins `dir` with the fixed file name and creates the file (mode 0600
    /// on Unix) if it does not exist. Existing contents are never truncated.
    pub fn open(dir: impl AsRef<Path>, logger: Logger) -> StoreResult<Self> {
        Self::open_with_config(dir, StoreConfig::default(), logger)
    }

    /// Opens the store in `dir` with explicit settings.
    pub fn open_with_config(
        dir: impl AsRef<Path>,
        config: StoreConfig,
        logger: Logger,
    ) -> StoreResult<Self> {
        let path = dir.as_ref().join(LOG_FILE_NAME);

        // Ensure the file exists up front so later opens only race on
        // content, not existence.
        open_log_file(&path)?;

        Ok(Self {
            path,
            max_record_size: config.max_record_size,
            sync: config.sync,
            write_lock: Mutex::new(()),
            logger,
        })
    }

    /// Returns the path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stores `value` under `key` by appending a value record.
    pub fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        self.append(Record::value(key, value.to_vec()))
    }

    /// Logically removes `key` by appending a tombstone.
    pub fn delete(&self, key: &str) -> StoreResult<()> {
        self.append(Record::tombstone(key))
    }

    /// Returns the latest value stored under `key`.
    ///
    /// Scans the whole log and keeps the last record whose key matches;
    /// the single file is the only source of truth, so a lookup costs one
    /// sequential pass.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no record matches or the latest match is a tombstone
    /// - `Corrupt` if a frame fails validation mid-scan
    /// - `Io` on file errors
    pub fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        let file = File::open(&self.path).map_err(|e| {
            self.logger
                .error("logstore_open_failed", &[("error", &e.to_string())]);
            StoreError::Io(e)
        })?;

        let mut scanner = RecordScanner::new(file, self.max_record_size);
        let mut latest: Option<Record> = None;

        loop {
            match scanner.next_record() {
                Ok(Some(record)) => {
                    if record.key == key {
                        latest = Some(record);
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    self.logger
                        .error("logstore_read_failed", &[("error", &err.to_string())]);
                    return Err(err);
                }
            }
        }

        match latest {
            Some(record) if !record.is_tombstone() => Ok(record.value),
            _ => Err(StoreError::not_found(key)),
        }
    }

    /// Appends one record to the log. Shared by `set` and `delete`.
    fn append(&self, record: Record) -> StoreResult<()> {
        let size = record.serialized_len();
        if size > self.max_record_size {
            return Err(StoreError::bad_request(format!(
                "record too large: {} bytes (max allowed: {})",
                size, self.max_record_size
            )));
        }

        let bytes = record.serialize();

        // A poisoned lock only means another writer panicked mid-append;
        // the file itself is still append-consistent.
        let _guard = match self.write_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let result = self.write_record(&bytes);
        if let Err(err) = &result {
            self.logger
                .error("logstore_append_failed", &[("error", &err.to_string())]);
        }
        result
    }

    fn write_record(&self, bytes: &[u8]) -> StoreResult<()> {
        let mut file = open_log_file(&self.path)?;

        // write_all retries short writes while the mutex is held, so no
        // reader can observe a record interleaved with another writer's.
        file.write_all(bytes)?;

        if self.sync {
            file.sync_all()?;
        }

        self.logger
            .info("logstore_append", &[("bytes", &bytes.len().to_string())]);

        Ok(())
    }
}

/// Opens the log file for appending, creating it with owner-only
/// permissions if absent.
fn open_log_file(path: &Path) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io;
    use tempfile::TempDir;

    fn quiet_logger() -> Logger {
        Logger::with_writer(crate::observability::Severity::Fatal, Box::new(io::sink()))
    }

    fn open_store(dir: &TempDir) -> LogStore {
        LogStore::open(dir.path(), quiet_logger()).unwrap()
    }

    #[test]
    fn test_open_creates_log_file() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        assert_eq!(store.path(), dir.path().join(LOG_FILE_NAME));
        assert!(store.path().exists());
        assert_eq!(fs::metadata(store.path()).unwrap().len(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_log_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_get_on_empty_store_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let err = store.get("foo").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_set_then_get() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        store
            .set("my-precious-testkey", b"this-will-soon-become-binary")
            .unwrap();
        assert_eq!(
            store.get("my-precious-testkey").unwrap(),
            b"this-will-soon-become-binary"
        );
    }

    #[test]
    fn test_reopen_preserves_records() {
        let dir = TempDir::new().unwrap();
        {
            let store = open_store(&dir);
            store.set("persisted", b"across reopen").unwrap();
        }

        let store = open_store(&dir);
        assert_eq!(store.get("persisted").unwrap(), b"across reopen");
    }

    #[test]
    fn test_latest_write_wins() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        store.set("k", b"a").unwrap();
        store.set("k", b"b").unwrap();
        store.set("k", b"c").unwrap();

        assert_eq!(store.get("k").unwrap(), b"c");
    }

    #[test]
    fn test_delete_hides_key_but_keeps_bytes() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        store.set("k", b"v").unwrap();
        store.delete("k").unwrap();

        assert!(store.get("k").unwrap_err().is_not_found());

        // Both records remain physically present.
        let expected = Record::value("k", b"v".to_vec()).serialized_len()
            + Record::tombstone("k").serialized_len();
        assert_eq!(
            fs::metadata(store.path()).unwrap().len(),
            expected as u64
        );
    }

    #[test]
    fn test_set_after_delete_revives_key() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        store.set("k", b"first").unwrap();
        store.delete("k").unwrap();
        store.set("k", b"second").unwrap();

        assert_eq!(store.get("k").unwrap(), b"second");
    }

    #[test]
    fn test_oversize_record_rejected_without_touching_log() {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig {
            max_record_size: 64,
            sync: false,
        };
        let store =
            LogStore::open_with_config(dir.path(), config, quiet_logger()).unwrap();

        store.set("small", b"fits").unwrap();
        let len_before = fs::metadata(store.path()).unwrap().len();

        let err = store.set("k", &[0u8; 60]).unwrap_err();
        assert!(err.is_bad_request());
        assert_eq!(fs::metadata(store.path()).unwrap().len(), len_before);

        // 13 + 1 + 50 = 64 is exactly at the bound and must pass.
        store.set("k", &[0u8; 50]).unwrap();
    }

    #[test]
    fn test_sync_mode_appends() {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig {
            sync: true,
            ..Default::default()
        };
        let store =
            LogStore::open_with_config(dir.path(), config, quiet_logger()).unwrap();

        store.set("durable", b"synced").unwrap();
        assert_eq!(store.get("durable").unwrap(), b"synced");
    }

    #[test]
    fn test_corrupted_log_surfaces_on_get() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        store.set("k", b"valid").unwrap();

        // Flip a payload byte in place.
        let mut contents = fs::read(store.path()).unwrap();
        let last = contents.len() - 1;
        contents[last] ^= 0xFF;
        fs::write(store.path(), contents).unwrap();

        let err = store.get("k").unwrap_err();
        assert!(err.is_corrupt());
    }

    #[test]
    fn test_distinct_keys_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        store.set("alpha", b"1").unwrap();
        store.set("beta", b"2").unwrap();
        store.delete("alpha").unwrap();

        assert!(store.get("alpha").unwrap_err().is_not_found());
        assert_eq!(store.get("beta").unwrap(), b"2");
    }
}
