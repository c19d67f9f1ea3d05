//! Log store error taxonomy
//!
//! Four caller-visible kinds, discriminable by variant rather than by string
//! matching:
//!
//! - `NotFound`: the scan finished without a live record for the key
//! - `BadRequest`: the caller violated a precondition (oversize record)
//! - `Corrupt`: checksum mismatch or malformed frame mid-scan
//! - `Io`: transport errors from the underlying file operations
//!
//! `DecodeError` is the codec-internal result: the scanner translates
//! `Insufficient` into either "read more bytes" or a clean end-of-stream and
//! never surfaces it to callers.

use std::io;

use thiserror::Error;

/// Result type for log store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the log store and its scanner.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No live record exists for the key (never written, or tombstoned).
    #[error("no value for key: {key}")]
    NotFound { key: String },

    /// The write request violated a precondition; the log was not touched.
    #[error("invalid write request: {reason}")]
    BadRequest { reason: String },

    /// A frame failed validation mid-scan. Physical damage or a partial
    /// write that is not a clean truncation.
    #[error("log corrupted at offset {offset}: {reason}")]
    Corrupt { offset: u64, reason: String },

    /// Transport error from a file operation.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StoreError {
    /// Creates a `NotFound` error for the given key.
    pub fn not_found(key: impl Into<String>) -> Self {
        StoreError::NotFound { key: key.into() }
    }

    /// Creates a `BadRequest` error with the given reason.
    pub fn bad_request(reason: impl Into<String>) -> Self {
        StoreError::BadRequest {
            reason: reason.into(),
        }
    }

    /// Creates a `Corrupt` error anchored at a byte offset.
    pub fn corruption(offset: u64, reason: impl Into<String>) -> Self {
        StoreError::Corrupt {
            offset,
            reason: reason.into(),
        }
    }

    /// Returns true if this is a `NotFound` error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Returns true if this is a `BadRequest` error.
    pub fn is_bad_request(&self) -> bool {
        matches!(self, StoreError::BadRequest { .. })
    }

    /// Returns true if this is a `Corrupt` error.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, StoreError::Corrupt { .. })
    }
}

/// Outcome of attempting to decode a single record from a byte prefix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Fewer bytes available than the header, or than the header declares.
    #[error("insufficient bytes to decode a record")]
    Insufficient,

    /// The frame is structurally invalid or its checksum does not match.
    #[error("corrupt record: {reason}")]
    Corrupt { reason: String },
}

impl DecodeError {
    /// Creates a `Corrupt` decode error with the given reason.
    pub fn corrupt(reason: impl Into<String>) -> Self {
        DecodeError::Corrupt {
            reason: reason.into(),
        }
    }
}
