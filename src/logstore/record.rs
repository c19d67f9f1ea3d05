//! Log record wire codec
//!
//! Each record is serialized as a fixed 13-byte header followed by the key
//! and value bytes, all integers big-endian:
//!
//! ```text
//! +------------------+
//! | Checksum         | (u32 BE, CRC-32 IEEE of everything after it)
//! +------------------+
//! | Kind             | (u8: 0 = value, 1 = tombstone)
//! +------------------+
//! | Key Length       | (u32 BE)
//! +------------------+
//! | Value Length     | (u32 BE)
//! +------------------+
//! | Key              | (keyLen bytes, UTF-8 text)
//! +------------------+
//! | Value            | (valueLen bytes, opaque)
//! +------------------+
//! ```
//!
//! The checksum excludes its own field so the encoder can write a zero
//! placeholder, hash the remainder, and patch the result in a single pass.

use super::checksum::compute_checksum;
use super::errors::DecodeError;

/// Byte offsets within the serialized header.
const CHECKSUM_LEN: usize = 4;
const KIND_OFFSET: usize = CHECKSUM_LEN;
const KEY_LEN_OFFSET: usize = KIND_OFFSET + 1;
const VALUE_LEN_OFFSET: usize = KEY_LEN_OFFSET + 4;

/// The kind of operation a record represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordKind {
    /// Insert or update a key-value pair.
    Value = 0,
    /// Logically remove a key. The record stays in the log; readers treat
    /// the key as absent.
    Tombstone = 1,
}

impl RecordKind {
    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(RecordKind::Value),
            1 => Some(RecordKind::Tombstone),
            _ => None,
        }
    }
}

/// A single record in the log: the unit of persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Operation kind.
    pub kind: RecordKind,
    /// Key text. Non-empty for any record the store writes.
    pub key: String,
    /// Value bytes. Always empty for tombstones.
    pub value: Vec<u8>,
}

impl Record {
    /// Serialized header length: checksum + kind + key length + value length.
    pub const HEADER_LEN: usize = CHECKSUM_LEN + 1 + 4 + 4;

    /// Creates a value record.
    pub fn value(key: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            kind: RecordKind::Value,
            key: key.into(),
            value,
        }
    }

    /// Creates a tombstone record for the given key.
    pub fn tombstone(key: impl Into<String>) -> Self {
        Self {
            kind: RecordKind::Tombstone,
            key: key.into(),
            value: Vec::new(),
        }
    }

    /// Returns true if this record logically removes its key.
    pub fn is_tombstone(&self) -> bool {
        self.kind == RecordKind::Tombstone
    }

    /// Total serialized size in bytes. No I/O, no failure.
    pub fn serialized_len(&self) -> usize {
        Self::HEADER_LEN + self.key.len() + self.value.len()
    }

    /// Serializes the record into its wire format.
    ///
    /// Single pass: zero checksum placeholder, header, key, value, then the
    /// CRC over everything after the checksum field is patched into the
    /// first four bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.serialized_len());

        buf.extend_from_slice(&[0u8; CHECKSUM_LEN]);
        buf.push(self.kind as u8);
        buf.extend_from_slice(&(self.key.len() as u32).to_be_bytes());
        buf.extend_from_slice(&(self.value.len() as u32).to_be_bytes());
        buf.extend_from_slice(self.key.as_bytes());
        buf.extend_from_slice(&self.value);

        let checksum = compute_checksum(&buf[CHECKSUM_LEN..]);
        buf[..CHECKSUM_LEN].copy_from_slice(&checksum.to_be_bytes());

        buf
    }

    /// Decodes one record from the front of `data`.
    ///
    /// Returns the record and the number of bytes it occupied. Bytes past
    /// the decoded frame are ignored; they belong to the next frame.
    ///
    /// # Errors
    ///
    /// - `DecodeError::Insufficient` if `data` holds fewer bytes than the
    ///   header, or fewer than the header declares.
    /// - `DecodeError::Corrupt` if the checksum does not match, the kind
    ///   byte is unknown, a tombstone declares a non-zero value length, or
    ///   the key is not valid UTF-8.
    pub fn deserialize(data: &[u8]) -> Result<(Record, usize), DecodeError> {
        if data.len() < Self::HEADER_LEN {
            return Err(DecodeError::Insufficient);
        }

        let stored_checksum =
            u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        let key_len = u32::from_be_bytes([
            data[KEY_LEN_OFFSET],
            data[KEY_LEN_OFFSET + 1],
            data[KEY_LEN_OFFSET + 2],
            data[KEY_LEN_OFFSET + 3],
        ]) as usize;
        let value_len = u32::from_be_bytes([
            data[VALUE_LEN_OFFSET],
            data[VALUE_LEN_OFFSET + 1],
            data[VALUE_LEN_OFFSET + 2],
            data[VALUE_LEN_OFFSET + 3],
        ]) as usize;

        let total = Self::HEADER_LEN + key_len + value_len;
        if data.len() < total {
            return Err(DecodeError::Insufficient);
        }

        let computed = compute_checksum(&data[KIND_OFFSET..total]);
        if computed != stored_checksum {
            return Err(DecodeError::corrupt(format!(
                "checksum mismatch: computed {:08x}, stored {:08x}",
                computed, stored_checksum
            )));
        }

        let kind = RecordKind::from_byte(data[KIND_OFFSET]).ok_or_else(|| {
            DecodeError::corrupt(format!("unknown record kind: {}", data[KIND_OFFSET]))
        })?;

        if kind == RecordKind::Tombstone && value_len != 0 {
            return Err(DecodeError::corrupt(format!(
                "tombstone declares a value of {} bytes",
                value_len
            )));
        }

        let key_bytes = &data[Self::HEADER_LEN..Self::HEADER_LEN + key_len];
        let key = std::str::from_utf8(key_bytes)
            .map_err(|_| DecodeError::corrupt("record key is not valid UTF-8"))?
            .to_string();
        let value = data[Self::HEADER_LEN + key_len..total].to_vec();

        Ok((Record { kind, key, value }, total))
    }
}

/// Total frame length a header prefix declares, without decoding it.
///
/// Callers must supply at least `Record::HEADER_LEN` bytes.
pub(crate) fn declared_frame_len(data: &[u8]) -> usize {
    let key_len = u32::from_be_bytes([
        data[KEY_LEN_OFFSET],
        data[KEY_LEN_OFFSET + 1],
        data[KEY_LEN_OFFSET + 2],
        data[KEY_LEN_OFFSET + 3],
    ]) as usize;
    let value_len = u32::from_be_bytes([
        data[VALUE_LEN_OFFSET],
        data[VALUE_LEN_OFFSET + 1],
        data[VALUE_LEN_OFFSET + 2],
        data[VALUE_LEN_OFFSET + 3],
    ]) as usize;
    Record::HEADER_LEN + key_len + value_len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_roundtrip() {
        let record = Record::value("user:1", b"payload bytes".to_vec());
        let serialized = record.serialize();
        let (decoded, consumed) = Record::deserialize(&serialized).unwrap();

        assert_eq!(decoded, record);
        assert_eq!(consumed, serialized.len());
        assert_eq!(consumed, record.serialized_len());
    }

    #[test]
    fn test_tombstone_roundtrip() {
        let record = Record::tombstone("user:1");
        let (decoded, _) = Record::deserialize(&record.serialize()).unwrap();

        assert!(decoded.is_tombstone());
        assert!(decoded.value.is_empty());
        assert_eq!(decoded.key, "user:1");
    }

    #[test]
    fn test_binary_value_roundtrip() {
        let value: Vec<u8> = (0..=255).collect();
        let record = Record::value("bin", value.clone());
        let (decoded, _) = Record::deserialize(&record.serialize()).unwrap();
        assert_eq!(decoded.value, value);
    }

    #[test]
    fn test_empty_value_roundtrip() {
        let record = Record::value("empty", Vec::new());
        let (decoded, _) = Record::deserialize(&record.serialize()).unwrap();
        assert_eq!(decoded.kind, RecordKind::Value);
        assert!(decoded.value.is_empty());
    }

    #[test]
    fn test_header_layout() {
        let record = Record::value("ab", b"xyz".to_vec());
        let serialized = record.serialize();

        assert_eq!(serialized.len(), 13 + 2 + 3);
        assert_eq!(serialized[4], 0); // kind
        assert_eq!(&serialized[5..9], &2u32.to_be_bytes()); // key length
        assert_eq!(&serialized[9..13], &3u32.to_be_bytes()); // value length
        assert_eq!(&serialized[13..15], b"ab");
        assert_eq!(&serialized[15..18], b"xyz");
    }

    #[test]
    fn test_known_wire_fixture() {
        let record = Record::value("valid_key", b"valid_value".to_vec());
        let serialized = record.serialize();

        // Checksum of the fixed fixture record, big-endian on the wire.
        assert_eq!(&serialized[..4], &0x9858306au32.to_be_bytes());

        let (decoded, _) = Record::deserialize(&serialized).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_short_buffer_is_insufficient() {
        assert_eq!(Record::deserialize(&[]), Err(DecodeError::Insufficient));
        assert_eq!(
            Record::deserialize(&[0u8; 12]),
            Err(DecodeError::Insufficient)
        );

        let serialized = Record::value("k", b"v".to_vec()).serialize();
        assert_eq!(
            Record::deserialize(&serialized[..serialized.len() - 1]),
            Err(DecodeError::Insufficient)
        );
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let record = Record::value("k", b"v".to_vec());
        let mut data = record.serialize();
        let frame_len = data.len();
        data.extend_from_slice(b"next frame garbage");

        let (decoded, consumed) = Record::deserialize(&data).unwrap();
        assert_eq!(decoded, record);
        assert_eq!(consumed, frame_len);
    }

    #[test]
    fn test_payload_bit_flip_detected() {
        let record = Record::value("flip", b"sensitive".to_vec());
        let serialized = record.serialize();

        // Any flip in the kind byte, key, or value breaks the checksum; a
        // flip in the checksum field breaks the comparison directly.
        for byte in (0..4).chain(4..5).chain(13..serialized.len()) {
            for bit in 0..8 {
                let mut corrupted = serialized.clone();
                corrupted[byte] ^= 1 << bit;
                let result = Record::deserialize(&corrupted);
                assert!(
                    matches!(result, Err(DecodeError::Corrupt { .. })),
                    "flip at byte {} bit {} not detected",
                    byte,
                    bit
                );
            }
        }
    }

    #[test]
    fn test_length_field_bit_flip_never_decodes() {
        let record = Record::value("flip", b"sensitive".to_vec());
        let serialized = record.serialize();

        // A flip in a length field either declares more bytes than exist
        // (insufficient) or shifts the checksummed region (corrupt). It must
        // never decode successfully.
        for byte in 5..13 {
            for bit in 0..8 {
                let mut corrupted = serialized.clone();
                corrupted[byte] ^= 1 << bit;
                assert!(
                    Record::deserialize(&corrupted).is_err(),
                    "flip at byte {} bit {} decoded successfully",
                    byte,
                    bit
                );
            }
        }
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let record = Record::value("k", b"v".to_vec());
        let mut data = record.serialize();

        // Re-checksum after forging the kind byte so the kind check is hit.
        data[4] = 7;
        let checksum = compute_checksum(&data[4..]);
        data[..4].copy_from_slice(&checksum.to_be_bytes());

        let err = Record::deserialize(&data).unwrap_err();
        assert!(matches!(err, DecodeError::Corrupt { .. }));
        assert!(err.to_string().contains("kind"));
    }

    #[test]
    fn test_tombstone_with_value_rejected() {
        // Forge a tombstone frame that declares a one-byte value.
        let mut data = Vec::new();
        data.extend_from_slice(&[0u8; 4]);
        data.push(1); // tombstone
        data.extend_from_slice(&1u32.to_be_bytes()); // key length
        data.extend_from_slice(&1u32.to_be_bytes()); // value length
        data.extend_from_slice(b"kx");
        let checksum = compute_checksum(&data[4..]);
        data[..4].copy_from_slice(&checksum.to_be_bytes());

        let err = Record::deserialize(&data).unwrap_err();
        assert!(matches!(err, DecodeError::Corrupt { .. }));
    }

    #[test]
    fn test_declared_frame_len() {
        let record = Record::value("abc", b"defgh".to_vec());
        let serialized = record.serialize();
        assert_eq!(declared_frame_len(&serialized), serialized.len());
    }
}
