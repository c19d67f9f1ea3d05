//! Framed record scanner
//!
//! Turns a byte stream into a sequence of records, delegating framing
//! decisions to the record codec:
//!
//! - a codec `Insufficient` means "buffer more bytes", or a clean end of
//!   stream when the source is exhausted; a truncated trailing fragment
//!   (the residue of a crashed writer) is end-of-stream, not an error;
//! - a codec `Corrupt` surfaces as a store error carrying the byte offset
//!   of the offending frame;
//! - a frame whose header declares more than the configured bound is
//!   refused before it is buffered.

use std::io::{self, Read};

use super::errors::{DecodeError, StoreError, StoreResult};
use super::record::{declared_frame_len, Record};

const READ_CHUNK: usize = 4096;

/// Streaming scanner yielding successive records from any `Read` source.
pub struct RecordScanner<R: Read> {
    source: R,
    buf: Vec<u8>,
    /// File offset of the first buffered byte.
    offset: u64,
    /// Largest frame the scanner will buffer: max record size plus header.
    max_frame: usize,
    eof: bool,
}

impl<R: Read> RecordScanner<R> {
    /// Creates a scanner over `source` that refuses to buffer more than
    /// `max_record_size` plus one header for a single frame.
    pub fn new(source: R, max_record_size: usize) -> Self {
        Self {
            source,
            buf: Vec::with_capacity(READ_CHUNK),
            offset: 0,
            max_frame: max_record_size + Record::HEADER_LEN,
            eof: false,
        }
    }

    /// Byte offset of the next frame to be yielded.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Yields the next complete record.
    ///
    /// Returns `Ok(None)` at end of stream, including when a partial
    /// trailing fragment remains buffered, which is how a log looks after a
    /// writer crashed mid-append.
    pub fn next_record(&mut self) -> StoreResult<Option<Record>> {
        loop {
            if self.buf.len() >= Record::HEADER_LEN {
                let declared = declared_frame_len(&self.buf);
                if declared > self.max_frame {
                    return Err(StoreError::corruption(
                        self.offset,
                        format!(
                            "declared record length {} exceeds limit {}",
                            declared, self.max_frame
                        ),
                    ));
                }
            }

            match Record::deserialize(&self.buf) {
                Ok((record, consumed)) => {
                    self.buf.drain(..consumed);
                    self.offset += consumed as u64;
                    return Ok(Some(record));
                }
                Err(DecodeError::Insufficient) => {
                    if self.eof {
                        return Ok(None);
                    }
                    self.fill()?;
                }
                Err(DecodeError::Corrupt { reason }) => {
                    return Err(StoreError::corruption(self.offset, reason));
                }
            }
        }
    }

    /// Reads one chunk from the source into the buffer.
    fn fill(&mut self) -> StoreResult<()> {
        let mut chunk = [0u8; READ_CHUNK];
        match self.source.read(&mut chunk) {
            Ok(0) => {
                self.eof = true;
                Ok(())
            }
            Ok(n) => {
                self.buf.extend_from_slice(&chunk[..n]);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}
