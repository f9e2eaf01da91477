//! Binlog file format.
//!
//! Every binlog payload written to the object store has the layout:
//!
//! ```text
//! | magic "BNLG" (4) | version u16 (2) | kind u8 (1) | descriptor_len u32 (4) |
//! | descriptor (CBOR) | body | crc32 u32 (4) |
//! ```
//!
//! All integers are little-endian. The CRC covers every byte before it.
//! The descriptor identifies the segment and field the body belongs to;
//! the body encoding depends on the log kind (CBOR columns for insert and
//! delete logs, JSON for stats logs).

use crate::error::{CodecError, CodecResult};
use crate::schema::{DataType, FieldId, UniqueId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Magic bytes at the start of every binlog.
pub const MAGIC: [u8; 4] = *b"BNLG";

/// Current format version.
pub const FORMAT_VERSION: u16 = 1;

/// Header size: magic (4) + version (2) + kind (1) + descriptor_len (4) = 11
const HEADER_SIZE: usize = 11;

/// CRC size.
const CRC_SIZE: usize = 4;

/// Descriptors are tiny; anything larger is corruption.
const MAX_DESCRIPTOR_LEN: usize = 64 * 1024;

/// The kind of log a binlog holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogKind {
    /// Inserted rows of one field.
    Insert,
    /// Deleted primary keys of a segment.
    Delete,
    /// Primary-key statistics of a segment.
    Stats,
}

impl LogKind {
    /// Returns the on-disk tag.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        match self {
            LogKind::Insert => 1,
            LogKind::Delete => 2,
            LogKind::Stats => 3,
        }
    }

    /// Parses an on-disk tag.
    #[must_use]
    pub const fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(LogKind::Insert),
            2 => Some(LogKind::Delete),
            3 => Some(LogKind::Stats),
            _ => None,
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogKind::Insert => write!(f, "insert"),
            LogKind::Delete => write!(f, "delete"),
            LogKind::Stats => write!(f, "stats"),
        }
    }
}

/// Identity of a binlog: which segment and field its body belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinlogDescriptor {
    /// Owning collection.
    pub collection_id: UniqueId,
    /// Owning partition.
    pub partition_id: UniqueId,
    /// Owning segment.
    pub segment_id: UniqueId,
    /// Field the body belongs to (0 for delete logs).
    pub field_id: FieldId,
    /// Element type of the body, when it is a column.
    pub data_type: Option<DataType>,
    /// Number of rows (entries) described by the body.
    pub row_count: u64,
}

/// A decoded binlog: kind, descriptor and raw body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinlogFile {
    /// Log kind.
    pub kind: LogKind,
    /// Segment / field identity.
    pub descriptor: BinlogDescriptor,
    /// Kind-specific body bytes.
    pub body: Vec<u8>,
}

impl BinlogFile {
    /// Creates a binlog.
    #[must_use]
    pub fn new(kind: LogKind, descriptor: BinlogDescriptor, body: Vec<u8>) -> Self {
        Self {
            kind,
            descriptor,
            body,
        }
    }

    /// Encodes the binlog to bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor cannot be encoded.
    pub fn encode(&self) -> CodecResult<Vec<u8>> {
        let descriptor = to_cbor(&self.descriptor)?;
        let total = HEADER_SIZE + descriptor.len() + self.body.len() + CRC_SIZE;
        let mut buf = Vec::with_capacity(total);

        buf.extend_from_slice(&MAGIC);
        buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        buf.push(self.kind.as_byte());
        let descriptor_len = u32::try_from(descriptor.len())
            .map_err(|_| CodecError::encoding_failed("descriptor too large"))?;
        buf.extend_from_slice(&descriptor_len.to_le_bytes());
        buf.extend_from_slice(&descriptor);
        buf.extend_from_slice(&self.body);

        let crc = crc32fast::hash(&buf);
        buf.extend_from_slice(&crc.to_le_bytes());

        Ok(buf)
    }

    /// Decodes a binlog from bytes, verifying magic, version and checksum.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are truncated, corrupted or of an
    /// unknown version or kind.
    pub fn decode(data: &[u8]) -> CodecResult<Self> {
        if data.len() < HEADER_SIZE + CRC_SIZE {
            return Err(CodecError::UnexpectedEof);
        }

        let magic = [data[0], data[1], data[2], data[3]];
        if magic != MAGIC {
            return Err(CodecError::InvalidMagic { found: magic });
        }

        let version = u16::from_le_bytes([data[4], data[5]]);
        if version > FORMAT_VERSION {
            return Err(CodecError::UnsupportedVersion {
                version,
                max_supported: FORMAT_VERSION,
            });
        }

        let crc_offset = data.len() - CRC_SIZE;
        let stored_crc = u32::from_le_bytes([
            data[crc_offset],
            data[crc_offset + 1],
            data[crc_offset + 2],
            data[crc_offset + 3],
        ]);
        let computed_crc = crc32fast::hash(&data[..crc_offset]);
        if stored_crc != computed_crc {
            return Err(CodecError::ChecksumMismatch {
                expected: stored_crc,
                actual: computed_crc,
            });
        }

        let kind = LogKind::from_byte(data[6])
            .ok_or_else(|| CodecError::decoding_failed(format!("unknown log kind {}", data[6])))?;

        let descriptor_len = u32::from_le_bytes([data[7], data[8], data[9], data[10]]) as usize;
        if descriptor_len > MAX_DESCRIPTOR_LEN {
            return Err(CodecError::decoding_failed(format!(
                "descriptor length {descriptor_len} exceeds limit"
            )));
        }
        let body_start = HEADER_SIZE + descriptor_len;
        if body_start > crc_offset {
            return Err(CodecError::UnexpectedEof);
        }

        let descriptor: BinlogDescriptor = from_cbor(&data[HEADER_SIZE..body_start])?;
        let body = data[body_start..crc_offset].to_vec();

        Ok(Self {
            kind,
            descriptor,
            body,
        })
    }

    /// Fails unless this binlog is of the `expected` kind.
    pub(crate) fn expect_kind(&self, expected: LogKind) -> CodecResult<()> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(CodecError::UnexpectedLogKind {
                expected: expected.to_string(),
                actual: self.kind.to_string(),
            })
        }
    }
}

/// Encodes a value as CBOR.
pub(crate) fn to_cbor<T: Serialize>(value: &T) -> CodecResult<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf)
        .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
    Ok(buf)
}

/// Decodes a CBOR value.
pub(crate) fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
    ciborium::from_reader(bytes).map_err(|e| CodecError::decoding_failed(e.to_string()))
}
