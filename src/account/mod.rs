//! Account records and the storage seam
//!
//! An account is identified by a service-agnostic `AccountKey` (a UUID in
//! text form) and owns one pseudonymous key per downstream service. The
//! `RecordStore` trait is the seam between the request handler and a
//! backend; accounts are indexed by `AccountKey` only, never by a service
//! key.

mod log_backed;
mod memory;

pub use log_backed::LogBackedStore;
pub use memory::{MemoryStore, SNAPSHOT_FILE_NAME};

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::logstore::StoreError;

/// Result type for account store operations
pub type AccountResult<T> = Result<T, AccountStoreError>;

/// Errors surfaced by account stores.
#[derive(Debug, Error)]
pub enum AccountStoreError {
    /// The supplied account key is not a UUID.
    #[error("account key is not a valid UUID: {0}")]
    InvalidKey(String),

    /// Error from the underlying log store.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The stored payload could not be encoded.
    #[error("error encoding account record: {0}")]
    Encode(#[source] serde_json::Error),

    /// The stored payload could not be decoded.
    #[error("error decoding account record for key {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A snapshot file operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The store was shut down; it cannot be reused.
    #[error("store is closed")]
    Closed,
}

impl AccountStoreError {
    /// Returns true if the error means "no record for this key".
    pub fn is_not_found(&self) -> bool {
        matches!(self, AccountStoreError::Store(err) if err.is_not_found())
    }
}

/// A validated account identifier: the canonical UUID text of a user,
/// shared across all services.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountKey(String);

impl AccountKey {
    /// Parses an account key, rejecting anything that is not a UUID.
    pub fn parse(s: &str) -> AccountResult<Self> {
        Uuid::parse_str(s)
            .map_err(|_| AccountStoreError::InvalidKey(s.to_string()))?;
        Ok(Self(s.to_string()))
    }

    /// Returns the key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-account state: one pseudonymous key per service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    /// Maps a service name to that service's key for this user.
    #[serde(default)]
    pub service_keys: HashMap<String, String>,

    /// Deactivated accounts keep their mappings but should not be served.
    #[serde(default)]
    pub inactive: bool,
}

impl AccountRecord {
    /// Creates an empty, active record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes the record into the byte payload stored by a backend.
    pub fn to_bytes(&self) -> AccountResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(AccountStoreError::Encode)
    }

    /// Decodes a record fetched for `key` from its byte payload.
    pub fn from_bytes(key: &AccountKey, bytes: &[u8]) -> AccountResult<Self> {
        serde_json::from_slice(bytes).map_err(|source| AccountStoreError::Decode {
            key: key.to_string(),
            source,
        })
    }
}

/// Backend seam: stores and retrieves records by `AccountKey` only.
pub trait RecordStore: Send + Sync {
    /// Stores `record` under `key`, replacing any previous record.
    fn put(&self, key: &AccountKey, record: &AccountRecord) -> AccountResult<()>;

    /// Retrieves the record for `key`. Returns a not-found error (see
    /// [`AccountStoreError::is_not_found`]) if the account is unknown.
    fn fetch(&self, key: &AccountKey) -> AccountResult<AccountRecord>;
}
