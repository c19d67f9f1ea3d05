//! Append-only log-structured key-value store
//!
//! The persistence core of aliasd. A single file holds a sequence of
//! framed, checksummed records; the logical state is the fold of that
//! sequence with the latest record winning per key.
//!
//! # Design Principles
//!
//! - Append-only: crash safety without in-place mutation
//! - Checksum-verified on every read
//! - Tombstone deletion; deleted keys stay physically present
//! - Point lookups scan the whole log; one source of truth, no index
//! - A torn trailing write parses as a clean end of stream

mod checksum;
mod errors;
mod record;
mod scanner;
mod store;

pub use checksum::{compute_checksum, verify_checksum};
pub use errors::{DecodeError, StoreError, StoreResult};
pub use record::{Record, RecordKind};
pub use scanner::RecordScanner;
pub use store::{LogStore, StoreConfig, DEFAULT_MAX_RECORD_SIZE, LOG_FILE_NAME};
