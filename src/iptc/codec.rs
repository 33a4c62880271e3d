//! Binary codec for the IPTC dataset stream.
//!
//! Wire layout per dataset: a `0x1C` marker byte, one record id byte, one
//! dataset number byte, then either a 2-byte big-endian length (0..=32767)
//! or, when the high bit of the length field is set, a size-of-size field
//! whose low 15 bits give the number of following big-endian length bytes
//! (1..=4), then the payload. Numeric payloads are big-endian.
//!
//! The decoder is deliberately tolerant: some encoders pad between datasets,
//! so any byte that is not the marker is discarded and scanning continues
//! instead of treating the stream as corrupt.

use thiserror::Error;

use crate::iptc::{datasets, DatasetKey, IptcData, IptcEntry};
use crate::value::{ByteOrder, TypeTag, Value};

/// Dataset marker byte.
pub const MARKER: u8 = 0x1C;

/// Largest payload encodable without the extended-length escape.
const STANDARD_MAX: usize = 32767;

/// Why one dataset was skipped during decoding. The scan continues past
/// every one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    /// Extended-length size-of-size field exceeds 4 bytes.
    MalformedExtendedLength,
    /// Buffer ends inside the extended-length bytes.
    TruncatedExtendedLength,
    /// Payload parsed neither under its declared type nor as raw text.
    UnparsablePayload,
    /// A non-repeatable dataset was already present; the first occurrence
    /// wins.
    DuplicateNonRepeatable,
}

/// One skipped dataset and the reason it was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedField {
    pub key: DatasetKey,
    pub error: FieldError,
}

/// Outcome of a successful decode, possibly with per-field skips.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeReport {
    pub skipped: Vec<SkippedField>,
}

impl DecodeReport {
    /// True when every dataset in the stream was materialized.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// The single fatal decode condition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// A dataset declared a payload longer than the rest of the buffer.
    /// Everything decoded before this point is retained.
    #[error("dataset {key} declares {size} payload bytes but only {remaining} remain")]
    OversizedDataset {
        key: DatasetKey,
        size: u32,
        remaining: usize,
    },
}

/// Decode a binary IPTC block into `iptc`, replacing its prior contents.
pub fn decode(data: &[u8], iptc: &mut IptcData) -> Result<DecodeReport, DecodeError> {
    iptc.clear();
    let mut report = DecodeReport::default();
    let mut pos = 0usize;

    while data.len() - pos >= 6 {
        if data[pos] != MARKER {
            pos += 1;
            continue;
        }
        let key = DatasetKey::new(u16::from(data[pos + 1]), u16::from(data[pos + 2]));
        pos += 3;

        let size_data: u32;
        if data[pos] & 0x80 != 0 {
            // Extended dataset: the 2-byte field holds the length of the
            // length. A size-of-size of zero decodes to an empty payload.
            let size_of_size =
                usize::from(u16::from_be_bytes([data[pos], data[pos + 1]]) & 0x7FFF);
            pos += 2;
            if size_of_size > 4 {
                log::warn!("IPTC dataset {key} has malformed extended length; skipped");
                report.skipped.push(SkippedField {
                    key,
                    error: FieldError::MalformedExtendedLength,
                });
                continue;
            }
            if size_of_size > data.len() - pos {
                log::warn!("IPTC dataset {key} has truncated extended length; skipped");
                report.skipped.push(SkippedField {
                    key,
                    error: FieldError::TruncatedExtendedLength,
                });
                continue;
            }
            let mut size = 0u32;
            for &b in &data[pos..pos + size_of_size] {
                size = (size << 8) | u32::from(b);
            }
            pos += size_of_size;
            size_data = size;
        } else {
            size_data = u32::from(u16::from_be_bytes([data[pos], data[pos + 1]]));
            pos += 2;
        }

        let remaining = data.len() - pos;
        if size_data as usize > remaining {
            log::warn!("IPTC dataset {key} has invalid size {size_data}; decoding stopped");
            return Err(DecodeError::OversizedDataset {
                key,
                size: size_data,
                remaining,
            });
        }

        let payload = &data[pos..pos + size_data as usize];
        if let Err(error) = read_dataset(iptc, key, payload) {
            log::warn!("failed to read IPTC dataset {key} ({error:?}); skipped");
            report.skipped.push(SkippedField { key, error });
        }
        pos += size_data as usize;
    }

    Ok(report)
}

/// Materialize one payload as a typed entry, falling back to raw text when
/// the declared type rejects the bytes.
fn read_dataset(iptc: &mut IptcData, key: DatasetKey, payload: &[u8]) -> Result<(), FieldError> {
    let tag = datasets::expected_type(key.dataset, key.record);
    let value = match Value::read(tag, payload, ByteOrder::Big) {
        Ok(v) => v,
        Err(_) => Value::read(TypeTag::Str, payload, ByteOrder::Big)
            .map_err(|_| FieldError::UnparsablePayload)?,
    };
    iptc.add(IptcEntry::new(key, value))
        .map_err(|_| FieldError::DuplicateNonRepeatable)
}

/// Encode `iptc` to its binary form. An empty container yields an empty
/// buffer. Datasets are stable-sorted by record id; datasets within one
/// record keep their insertion order.
pub fn encode(iptc: &IptcData) -> Vec<u8> {
    if iptc.is_empty() {
        return Vec::new();
    }
    let total = iptc.size();
    let mut out = Vec::with_capacity(total);

    let mut sorted: Vec<&IptcEntry> = iptc.iter().collect();
    sorted.sort_by_key(|e| e.key.record);

    for entry in sorted {
        // Record and dataset ids occupy one byte each on the wire.
        debug_assert!(entry.key.record <= 0xFF && entry.key.dataset <= 0xFF);
        out.push(MARKER);
        out.push(entry.key.record as u8);
        out.push(entry.key.dataset as u8);

        let data = entry.value.write_binary(ByteOrder::Big);
        if data.len() > STANDARD_MAX {
            out.extend_from_slice(&(4u16 | 0x8000).to_be_bytes());
            out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        } else {
            out.extend_from_slice(&(data.len() as u16).to_be_bytes());
        }
        out.extend_from_slice(&data);
    }

    debug_assert_eq!(out.len(), total);
    out
}
