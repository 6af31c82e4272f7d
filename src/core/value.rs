// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Decoded value and message types.
//!
//! Field layouts are discovered at runtime from FMT records, so a decoded
//! message cannot be a struct per type: it is an ordered name → value
//! mapping with a tagged value type per field.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Reserved key under which a message's type name is serialized.
pub const PACKET_TYPE_KEY: &str = "mavpackettype";

/// A single decoded field value.
///
/// Covers every on-wire shape the format-character table can produce:
/// little-endian integers of 1/2/4/8 bytes, IEEE-754 floats, fixed-length
/// ASCII strings (NUL-trimmed), opaque byte strings, and the int16 array
/// used by the `a` format character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogValue {
    // Signed integers
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),

    // Unsigned integers
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),

    // Floating point (scaled fields always decode to Float64)
    Float32(f32),
    Float64(f64),

    // Fixed-length ASCII, trailing NULs stripped
    String(String),

    // Opaque byte string (BYTES_FIELDS override)
    Bytes(Vec<u8>),

    // int16[N] array fields
    Int16Array(Vec<i16>),
}

impl LogValue {
    /// Check if this value is a numeric type (integer or float).
    pub fn is_numeric(&self) -> bool {
        !matches!(
            self,
            LogValue::String(_) | LogValue::Bytes(_) | LogValue::Int16Array(_)
        )
    }

    /// Check if this value is a floating-point type.
    pub fn is_float(&self) -> bool {
        matches!(self, LogValue::Float32(_) | LogValue::Float64(_))
    }

    /// Try to convert this value to f64 (numeric values only).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            LogValue::Int8(v) => Some(*v as f64),
            LogValue::Int16(v) => Some(*v as f64),
            LogValue::Int32(v) => Some(*v as f64),
            LogValue::Int64(v) => Some(*v as f64),
            LogValue::UInt8(v) => Some(*v as f64),
            LogValue::UInt16(v) => Some(*v as f64),
            LogValue::UInt32(v) => Some(*v as f64),
            LogValue::UInt64(v) => Some(*v as f64),
            LogValue::Float32(v) => Some(*v as f64),
            LogValue::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to convert this value to i64 (integer types only).
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            LogValue::Int8(v) => Some(*v as i64),
            LogValue::Int16(v) => Some(*v as i64),
            LogValue::Int32(v) => Some(*v as i64),
            LogValue::Int64(v) => Some(*v),
            LogValue::UInt8(v) => Some(*v as i64),
            LogValue::UInt16(v) => Some(*v as i64),
            LogValue::UInt32(v) => Some(*v as i64),
            LogValue::UInt64(v) => {
                if *v <= i64::MAX as u64 {
                    Some(*v as i64)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Try to get the inner string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            LogValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get the inner bytes.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            LogValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Get the type name of this value as a string.
    pub fn type_name(&self) -> &'static str {
        match self {
            LogValue::Int8(_) => "int8",
            LogValue::Int16(_) => "int16",
            LogValue::Int32(_) => "int32",
            LogValue::Int64(_) => "int64",
            LogValue::UInt8(_) => "uint8",
            LogValue::UInt16(_) => "uint16",
            LogValue::UInt32(_) => "uint32",
            LogValue::UInt64(_) => "uint64",
            LogValue::Float32(_) => "float32",
            LogValue::Float64(_) => "float64",
            LogValue::String(_) => "string",
            LogValue::Bytes(_) => "bytes",
            LogValue::Int16Array(_) => "int16_array",
        }
    }

    /// Equality that treats two NaN floats as equal.
    ///
    /// Used when comparing against the reference implementation, where
    /// NaN-valued telemetry fields are common.
    pub fn eq_ignoring_nan(&self, other: &LogValue) -> bool {
        match (self, other) {
            (LogValue::Float32(a), LogValue::Float32(b)) => {
                a == b || (a.is_nan() && b.is_nan())
            }
            (LogValue::Float64(a), LogValue::Float64(b)) => {
                a == b || (a.is_nan() && b.is_nan())
            }
            _ => self == other,
        }
    }
}

impl fmt::Display for LogValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogValue::Int8(v) => write!(f, "{v}"),
            LogValue::Int16(v) => write!(f, "{v}"),
            LogValue::Int32(v) => write!(f, "{v}"),
            LogValue::Int64(v) => write!(f, "{v}"),
            LogValue::UInt8(v) => write!(f, "{v}"),
            LogValue::UInt16(v) => write!(f, "{v}"),
            LogValue::UInt32(v) => write!(f, "{v}"),
            LogValue::UInt64(v) => write!(f, "{v}"),
            LogValue::Float32(v) => write!(f, "{v}"),
            LogValue::Float64(v) => write!(f, "{v}"),
            LogValue::String(v) => write!(f, "\"{v}\""),
            LogValue::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            LogValue::Int16Array(v) => write!(f, "[{} elements]", v.len()),
        }
    }
}

/// A decoded log message: the descriptor name plus one value per field.
///
/// Field iteration order matches the descriptor's column order, which is
/// why the storage is an ordered vector rather than a hash map. FMT field
/// lists carry at most 16 entries, so linear lookup is not a concern.
#[derive(Debug, Clone, PartialEq)]
pub struct LogMessage {
    packet_type: String,
    fields: Vec<(String, LogValue)>,
}

impl LogMessage {
    /// Create an empty message for the given packet type.
    pub fn new(packet_type: impl Into<String>) -> Self {
        Self {
            packet_type: packet_type.into(),
            fields: Vec::new(),
        }
    }

    /// Create an empty message with pre-allocated field capacity.
    pub fn with_capacity(packet_type: impl Into<String>, capacity: usize) -> Self {
        Self {
            packet_type: packet_type.into(),
            fields: Vec::with_capacity(capacity),
        }
    }

    /// The descriptor name this message was decoded with (`mavpackettype`).
    pub fn packet_type(&self) -> &str {
        &self.packet_type
    }

    /// Append a field. Callers push fields in descriptor column order.
    pub fn push(&mut self, name: impl Into<String>, value: LogValue) {
        self.fields.push((name.into(), value));
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&LogValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Iterate fields in descriptor order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &LogValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of fields (excluding the packet-type entry).
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the message has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Equality that treats two NaN floats as equal, fieldwise.
    pub fn eq_ignoring_nan(&self, other: &LogMessage) -> bool {
        self.packet_type == other.packet_type
            && self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(other.fields.iter())
                .all(|((an, av), (bn, bv))| an == bn && av.eq_ignoring_nan(bv))
    }
}

impl Serialize for LogMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(PACKET_TYPE_KEY, &self.packet_type)?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
