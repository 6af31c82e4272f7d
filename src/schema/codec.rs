// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Wire codecs for format characters.
//!
//! Every format character of an FMT record maps to one [`FieldCodec`],
//! which knows its on-wire size and how to decode a little-endian field
//! slice into a [`LogValue`]. No alignment padding exists between fields.

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};

use crate::core::LogValue;

/// A field codec: on-wire size plus decode behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldCodec {
    /// 8-bit signed integer
    Int8,
    /// 16-bit signed integer
    Int16,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 8-bit unsigned integer
    UInt8,
    /// 16-bit unsigned integer
    UInt16,
    /// 32-bit unsigned integer
    UInt32,
    /// 64-bit unsigned integer
    UInt64,
    /// 32-bit IEEE-754 float
    Float32,
    /// 64-bit IEEE-754 float
    Float64,
    /// Fixed-length ASCII, NUL-padded on the wire
    Ascii(usize),
    /// Fixed-length opaque bytes
    Bytes(usize),
    /// Array of 16-bit signed integers
    Int16Array(usize),
}

impl FieldCodec {
    /// On-wire size in bytes.
    pub fn size(&self) -> usize {
        match self {
            FieldCodec::Int8 | FieldCodec::UInt8 => 1,
            FieldCodec::Int16 | FieldCodec::UInt16 => 2,
            FieldCodec::Int32 | FieldCodec::UInt32 | FieldCodec::Float32 => 4,
            FieldCodec::Int64 | FieldCodec::UInt64 | FieldCodec::Float64 => 8,
            FieldCodec::Ascii(n) | FieldCodec::Bytes(n) => *n,
            FieldCodec::Int16Array(n) => 2 * n,
        }
    }

    /// Decode a field slice of exactly [`size`](Self::size) bytes.
    ///
    /// The error value is a bare reason string; callers attach field and
    /// offset context when building a [`LogError`](crate::LogError).
    pub fn decode(&self, raw: &[u8]) -> std::result::Result<LogValue, String> {
        debug_assert_eq!(raw.len(), self.size());
        match self {
            FieldCodec::Int8 => Ok(LogValue::Int8(raw[0] as i8)),
            FieldCodec::UInt8 => Ok(LogValue::UInt8(raw[0])),
            FieldCodec::Int16 => Ok(LogValue::Int16(LittleEndian::read_i16(raw))),
            FieldCodec::UInt16 => Ok(LogValue::UInt16(LittleEndian::read_u16(raw))),
            FieldCodec::Int32 => Ok(LogValue::Int32(LittleEndian::read_i32(raw))),
            FieldCodec::UInt32 => Ok(LogValue::UInt32(LittleEndian::read_u32(raw))),
            FieldCodec::Int64 => Ok(LogValue::Int64(LittleEndian::read_i64(raw))),
            FieldCodec::UInt64 => Ok(LogValue::UInt64(LittleEndian::read_u64(raw))),
            FieldCodec::Float32 => Ok(LogValue::Float32(LittleEndian::read_f32(raw))),
            FieldCodec::Float64 => Ok(LogValue::Float64(LittleEndian::read_f64(raw))),
            FieldCodec::Ascii(_) => decode_ascii(raw).map(LogValue::String),
            FieldCodec::Bytes(_) => Ok(LogValue::Bytes(raw.to_vec())),
            FieldCodec::Int16Array(n) => {
                let mut values = Vec::with_capacity(*n);
                for pair in raw.chunks_exact(2) {
                    values.push(LittleEndian::read_i16(pair));
                }
                Ok(LogValue::Int16Array(values))
            }
        }
    }

    /// Parse a codec from its configuration name.
    ///
    /// Recognized: `int8..int64`, `uint8..uint64`, `float32`, `float64`,
    /// `char{N}`, `bytes{N}`, `int16x{N}`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "int8" => Some(FieldCodec::Int8),
            "int16" => Some(FieldCodec::Int16),
            "int32" => Some(FieldCodec::Int32),
            "int64" => Some(FieldCodec::Int64),
            "uint8" => Some(FieldCodec::UInt8),
            "uint16" => Some(FieldCodec::UInt16),
            "uint32" => Some(FieldCodec::UInt32),
            "uint64" => Some(FieldCodec::UInt64),
            "float32" => Some(FieldCodec::Float32),
            "float64" => Some(FieldCodec::Float64),
            _ => {
                if let Some(n) = name.strip_prefix("char") {
                    n.parse().ok().filter(|&n| n > 0).map(FieldCodec::Ascii)
                } else if let Some(n) = name.strip_prefix("bytes") {
                    n.parse().ok().filter(|&n| n > 0).map(FieldCodec::Bytes)
                } else if let Some(n) = name.strip_prefix("int16x") {
                    n.parse().ok().filter(|&n| n > 0).map(FieldCodec::Int16Array)
                } else {
                    None
                }
            }
        }
    }
}

impl fmt::Display for FieldCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldCodec::Int8 => write!(f, "int8"),
            FieldCodec::Int16 => write!(f, "int16"),
            FieldCodec::Int32 => write!(f, "int32"),
            FieldCodec::Int64 => write!(f, "int64"),
            FieldCodec::UInt8 => write!(f, "uint8"),
            FieldCodec::UInt16 => write!(f, "uint16"),
            FieldCodec::UInt32 => write!(f, "uint32"),
            FieldCodec::UInt64 => write!(f, "uint64"),
            FieldCodec::Float32 => write!(f, "float32"),
            FieldCodec::Float64 => write!(f, "float64"),
            FieldCodec::Ascii(n) => write!(f, "char{n}"),
            FieldCodec::Bytes(n) => write!(f, "bytes{n}"),
            FieldCodec::Int16Array(n) => write!(f, "int16x{n}"),
        }
    }
}

/// Decode a NUL-padded ASCII field: cut at the first NUL, then require
/// pure ASCII content.
pub(crate) fn decode_ascii(raw: &[u8]) -> std::result::Result<String, String> {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    let trimmed = &raw[..end];
    if !trimmed.is_ascii() {
        return Err(format!(
            "non-ASCII byte in string field: {:?}",
            &trimmed[..trimmed.len().min(8)]
        ));
    }
    // ASCII is always valid UTF-8
    Ok(String::from_utf8_lossy(trimmed).into_owned())
}
