//! Log-backed account store
//!
//! Adapter that persists account records through the append-only log store.
//! Records travel as JSON payloads; the log store itself never interprets
//! them.

use crate::logstore::LogStore;

use super::{AccountKey, AccountRecord, AccountResult, RecordStore};

/// Account store persisting every change as a log append.
pub struct LogBackedStore {
    store: LogStore,
}

impl LogBackedStore {
    /// Wraps an opened log store.
    pub fn new(store: LogStore) -> Self {
        Self { store }
    }
}

impl RecordStore for LogBackedStore {
    fn put(&self, key: &AccountKey, record: &AccountRecord) -> AccountResult<()> {
        let payload = record.to_bytes()?;
        self.store.set(key.as_str(), &payload)?;
        Ok(())
    }

    fn fetch(&self, key: &AccountKey) -> AccountResult<AccountRecord> {
        let payload = self.store.get(key.as_str())?;
        AccountRecord::from_bytes(key, &payload)
    }
}
