use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::{ChartError, ChartResult};

/// Bytes per field: one type tag followed by an 8-byte little-endian payload.
pub const BINARY_FIELD_WIDTH: usize = 9;
/// Tag of an IEEE-754 float64 payload.
pub const FIELD_FLOAT64: u8 = 0;
/// Tag of a float64 millisecond-epoch date payload.
pub const FIELD_DATE_MILLIS: u8 = 3;

/// Decoded binary field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryField {
    Float(f64),
    DateMillis(f64),
    /// Reserved or unknown tag.
    Null,
}

impl BinaryField {
    #[must_use]
    pub fn as_f64(self) -> Option<f64> {
        match self {
            Self::Float(value) | Self::DateMillis(value) => Some(value),
            Self::Null => None,
        }
    }
}

/// Object array packed into one shared buffer.
///
/// Record `i` starts at `offsets[i]`; channel `c` of a record lives at
/// `offset + c * BINARY_FIELD_WIDTH`.
#[derive(Debug, Clone)]
pub struct BinaryObjects {
    buffer: Rc<[u8]>,
    offsets: Vec<usize>,
    channels: IndexMap<String, usize>,
}

impl BinaryObjects {
    #[must_use]
    pub fn new(buffer: Rc<[u8]>, offsets: Vec<usize>, channels: IndexMap<String, usize>) -> Self {
        Self {
            buffer,
            offsets,
            channels,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    #[must_use]
    pub fn channel_index(&self, key: &str) -> Option<usize> {
        self.channels.get(key).copied()
    }

    /// Reads channel `channel` of record `record`.
    pub fn field(&self, record: usize, channel: usize) -> ChartResult<BinaryField> {
        let offset = *self.offsets.get(record).ok_or_else(|| {
            ChartError::InvalidData(format!("binary record {record} out of range"))
        })?;
        let start = offset + channel * BINARY_FIELD_WIDTH;
        let bytes = self
            .buffer
            .get(start..start + BINARY_FIELD_WIDTH)
            .ok_or_else(|| {
                ChartError::InvalidData(format!(
                    "binary field at byte {start} exceeds buffer of {} bytes",
                    self.buffer.len()
                ))
            })?;

        let mut payload = [0u8; 8];
        payload.copy_from_slice(&bytes[1..]);
        let value = f64::from_le_bytes(payload);
        Ok(match bytes[0] {
            FIELD_FLOAT64 => BinaryField::Float(value),
            FIELD_DATE_MILLIS => BinaryField::DateMillis(value),
            _ => BinaryField::Null,
        })
    }

    /// Encodes records of `(tag, value)` fields, one field per channel.
    ///
    /// Mostly useful for hosts and tests producing packed buffers.
    #[must_use]
    pub fn encode(channels: &[&str], records: &[Vec<(u8, f64)>]) -> Self {
        let mut buffer = Vec::with_capacity(records.len() * channels.len() * BINARY_FIELD_WIDTH);
        let mut offsets = Vec::with_capacity(records.len());
        for record in records {
            offsets.push(buffer.len());
            for (tag, value) in record {
                buffer.push(*tag);
                buffer.extend_from_slice(&value.to_le_bytes());
            }
        }
        let channels = channels
            .iter()
            .enumerate()
            .map(|(index, name)| ((*name).to_owned(), index))
            .collect();
        Self::new(buffer.into(), offsets, channels)
    }
}
