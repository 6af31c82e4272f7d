// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Parsed FMT records.
//!
//! A [`FormatDescriptor`] is the in-memory form of one FMT record: the
//! identity of a message type plus a precomputed decode plan for its
//! payload. Descriptors are parsed once at registration and then drive the
//! scanner's hot loop.

use crate::config::LogConfig;
use crate::core::{LogError, LogMessage, LogValue, Result};
use crate::schema::codec::{decode_ascii, FieldCodec};

/// Implicit divisor applied to a field after decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldScale {
    /// Emit the decoded value unchanged
    None,
    /// Divide by 100 (centi-units)
    Centi,
    /// Divide by 10^7 (latitude/longitude degrees)
    DegE7,
}

/// Decode plan for a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    /// Wire codec for the field
    pub codec: FieldCodec,
    /// Scale factor applied after decoding
    pub scale: FieldScale,
    /// Emit the raw field bytes instead of a decoded value
    pub opaque: bool,
}

/// One message type's schema, learned from an FMT record.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatDescriptor {
    /// Type id, unique within a file
    pub type_id: u8,
    /// Total on-wire record length including the 3-byte preamble
    pub length: usize,
    /// Short type name, e.g. `GPS`
    pub name: String,
    /// Format string, one character per field
    pub format: String,
    /// Field names in wire order
    pub columns: Vec<String>,
    rules: Vec<FieldRule>,
}

impl FormatDescriptor {
    /// Parse a raw FMT record (starting at its sync marker) into a
    /// descriptor.
    ///
    /// Enforces the structural invariants: ASCII name/format/columns,
    /// matching format and column counts, known format characters, and a
    /// declared length equal to the preamble plus the field sizes.
    pub fn parse(record: &[u8], config: &LogConfig) -> Result<Self> {
        debug_assert!(record.len() >= config.format_msg_length);
        let layout = &config.fmt_layout;
        let body = &record[3..config.format_msg_length];

        let type_id = body[0];
        let length = body[1] as usize;

        let name_end = 2 + layout.name_len;
        let format_end = name_end + layout.format_len;
        let columns_end = format_end + layout.columns_len;

        let name = decode_ascii(&body[2..name_end])
            .map_err(|reason| LogError::malformed(type_id, reason))?
            .trim()
            .to_string();
        let format = decode_ascii(&body[name_end..format_end])
            .map_err(|reason| LogError::malformed(type_id, reason))?
            .trim()
            .to_string();
        let columns_raw = decode_ascii(&body[format_end..columns_end])
            .map_err(|reason| LogError::malformed(type_id, reason))?;
        let columns: Vec<String> = columns_raw
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from)
            .collect();

        if name.is_empty() {
            return Err(LogError::malformed(type_id, "empty name"));
        }
        if format.is_empty() {
            return Err(LogError::malformed(type_id, "empty format string"));
        }
        if columns.is_empty() {
            return Err(LogError::malformed(type_id, "empty column list"));
        }
        if format.chars().count() != columns.len() {
            return Err(LogError::malformed(
                type_id,
                format!(
                    "format string has {} characters but {} columns declared",
                    format.chars().count(),
                    columns.len()
                ),
            ));
        }

        let mut rules = Vec::with_capacity(columns.len());
        for (ch, column) in format.chars().zip(&columns) {
            let codec = *config.format_mapping.get(&ch).ok_or_else(|| {
                LogError::malformed(type_id, format!("unknown format character '{ch}'"))
            })?;
            let scale = if config.scale_factor_fields.contains(&ch) {
                FieldScale::Centi
            } else if ch == config.latitude_longitude_format {
                FieldScale::DegE7
            } else {
                FieldScale::None
            };
            rules.push(FieldRule {
                codec,
                scale,
                opaque: config.bytes_fields.contains(column),
            });
        }

        let payload_len: usize = rules.iter().map(|r| r.codec.size()).sum();
        if length != 3 + payload_len {
            return Err(LogError::malformed(
                type_id,
                format!(
                    "declared length {length} but format string needs {}",
                    3 + payload_len
                ),
            ));
        }

        Ok(Self {
            type_id,
            length,
            name,
            format,
            columns,
            rules,
        })
    }

    /// Build the FMT self-descriptor from the configured layout.
    ///
    /// An inconsistent configuration (layout total not matching the
    /// declared FMT length) is a fatal error: without this descriptor the
    /// decoder cannot be bootstrapped from the stream.
    pub fn bootstrap(config: &LogConfig) -> Result<Self> {
        let layout = &config.fmt_layout;
        if layout.body_len() + 3 != config.format_msg_length {
            return Err(LogError::config(
                "FMT_STRUCT",
                format!(
                    "layout body is {} bytes, FORMAT_MSG_LENGTH requires {}",
                    layout.body_len(),
                    config.format_msg_length - 3
                ),
            ));
        }
        let codecs = [
            FieldCodec::UInt8,
            FieldCodec::UInt8,
            FieldCodec::Ascii(layout.name_len),
            FieldCodec::Ascii(layout.format_len),
            FieldCodec::Ascii(layout.columns_len),
        ];
        Ok(Self {
            type_id: config.format_msg_type,
            length: config.format_msg_length,
            name: "FMT".to_string(),
            format: "BBnNZ".to_string(),
            columns: ["Type", "Length", "Name", "Format", "Columns"]
                .into_iter()
                .map(String::from)
                .collect(),
            rules: codecs
                .into_iter()
                .map(|codec| FieldRule {
                    codec,
                    scale: FieldScale::None,
                    opaque: false,
                })
                .collect(),
        })
    }

    /// Payload length: field bytes after the 3-byte preamble.
    pub fn payload_len(&self) -> usize {
        self.length - 3
    }

    /// Per-field decode plan, in wire order.
    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Decode a record payload (the bytes after the preamble) into a
    /// message. `offset` is the record start, used for error context only.
    pub fn decode_payload(&self, payload: &[u8], offset: usize) -> Result<LogMessage> {
        debug_assert_eq!(payload.len(), self.payload_len());
        let mut message = LogMessage::with_capacity(self.name.clone(), self.columns.len());
        let mut at = 0;

        for (rule, column) in self.rules.iter().zip(&self.columns) {
            let raw = &payload[at..at + rule.codec.size()];
            at += rule.codec.size();

            let value = if rule.opaque {
                LogValue::Bytes(raw.to_vec())
            } else {
                let decoded = rule.codec.decode(raw).map_err(|reason| {
                    LogError::decode(column, rule.codec.to_string(), offset, reason)
                })?;
                match rule.scale {
                    FieldScale::None => decoded,
                    FieldScale::Centi => LogValue::Float64(scaled(&decoded, column, rule, offset)? / 100.0),
                    FieldScale::DegE7 => LogValue::Float64(scaled(&decoded, column, rule, offset)? / 1e7),
                }
            };
            message.push(column.clone(), value);
        }

        Ok(message)
    }
}

fn scaled(value: &LogValue, column: &str, rule: &FieldRule, offset: usize) -> Result<f64> {
    value.as_f64().ok_or_else(|| {
        LogError::decode(
            column,
            rule.codec.to_string(),
            offset,
            "scale factor requires a numeric codec",
        )
    })
}
