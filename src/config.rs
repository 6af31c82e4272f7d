// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Format constants, injected rather than global.
//!
//! Every magic value of the log format (sync marker, FMT type id and
//! length, FMT body layout, format-character codec table, scale rules)
//! lives in a [`LogConfig`] that is passed to the format table and the
//! scanners. [`LogConfig::default`] carries the canonical MAVLink values;
//! [`LogConfig::from_file`] loads the JSON key/value document used for
//! overrides.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::core::{LogError, Result};
use crate::schema::codec::FieldCodec;

/// Canonical two-byte record sync marker.
pub const DEFAULT_MSG_HEADER: [u8; 2] = [0xA3, 0x95];

/// Canonical type id reserved for FMT records.
pub const DEFAULT_FORMAT_MSG_TYPE: u8 = 0x80;

/// Canonical on-wire length of an FMT record, preamble included.
pub const DEFAULT_FORMAT_MSG_LENGTH: usize = 89;

/// Sizes of the variable fields in an FMT record body.
///
/// The body follows the 3-byte preamble as `type_id:u8, length:u8,
/// name:ascii[N], format:ascii[N], columns:ascii[N]`; only the three ASCII
/// field sizes vary by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FmtLayout {
    /// Size of the NUL-padded name field
    pub name_len: usize,
    /// Size of the NUL-padded format-string field
    pub format_len: usize,
    /// Size of the NUL-padded comma-separated column-names field
    pub columns_len: usize,
}

impl Default for FmtLayout {
    fn default() -> Self {
        Self {
            name_len: 4,
            format_len: 16,
            columns_len: 64,
        }
    }
}

impl FmtLayout {
    /// Total body length: the two u8 fields plus the ASCII fields.
    pub fn body_len(&self) -> usize {
        2 + self.name_len + self.format_len + self.columns_len
    }

    /// Build a layout from the `FMT_STRUCT` config value, a sequence of
    /// `[size, kind]` pairs covering the record body after the preamble.
    pub fn from_pairs(pairs: &[(usize, String)]) -> Result<Self> {
        let expected_kinds = ["u8", "u8", "ascii", "ascii", "ascii"];
        if pairs.len() != expected_kinds.len() {
            return Err(LogError::config(
                "FMT_STRUCT",
                format!("expected 5 (size, kind) pairs, got {}", pairs.len()),
            ));
        }
        for ((size, kind), expected) in pairs.iter().zip(expected_kinds) {
            if kind != expected {
                return Err(LogError::config(
                    "FMT_STRUCT",
                    format!("expected kind '{expected}', got '{kind}'"),
                ));
            }
            if kind == "u8" && *size != 1 {
                return Err(LogError::config("FMT_STRUCT", "u8 fields must have size 1"));
            }
            if *size == 0 {
                return Err(LogError::config("FMT_STRUCT", "zero-sized field"));
            }
        }
        Ok(Self {
            name_len: pairs[2].0,
            format_len: pairs[3].0,
            columns_len: pairs[4].0,
        })
    }
}

/// Injected constants for one parsing run.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Two-byte synchronization marker opening every record
    pub msg_header: [u8; 2],
    /// Type id reserved for FMT records
    pub format_msg_type: u8,
    /// On-wire length of an FMT record, 3-byte preamble included
    pub format_msg_length: usize,
    /// Layout of the FMT record body
    pub fmt_layout: FmtLayout,
    /// Format character → wire codec
    pub format_mapping: HashMap<char, FieldCodec>,
    /// Format characters whose integer value is divided by 100
    pub scale_factor_fields: HashSet<char>,
    /// Format character whose i32 value is divided by 10^7 (degrees)
    pub latitude_longitude_format: char,
    /// Column names always emitted as opaque bytes
    pub bytes_fields: HashSet<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            msg_header: DEFAULT_MSG_HEADER,
            format_msg_type: DEFAULT_FORMAT_MSG_TYPE,
            format_msg_length: DEFAULT_FORMAT_MSG_LENGTH,
            fmt_layout: FmtLayout::default(),
            format_mapping: default_format_mapping(),
            scale_factor_fields: ['c', 'C', 'e', 'E'].into_iter().collect(),
            latitude_longitude_format: 'L',
            bytes_fields: ["Data", "Blob", "Payload"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// The canonical MAVLink format-character table.
pub fn default_format_mapping() -> HashMap<char, FieldCodec> {
    [
        ('a', FieldCodec::Int16Array(32)),
        ('b', FieldCodec::Int8),
        ('B', FieldCodec::UInt8),
        ('h', FieldCodec::Int16),
        ('H', FieldCodec::UInt16),
        ('i', FieldCodec::Int32),
        ('I', FieldCodec::UInt32),
        ('f', FieldCodec::Float32),
        ('d', FieldCodec::Float64),
        ('n', FieldCodec::Ascii(4)),
        ('N', FieldCodec::Ascii(16)),
        ('Z', FieldCodec::Ascii(64)),
        ('c', FieldCodec::Int16),
        ('C', FieldCodec::UInt16),
        ('e', FieldCodec::Int32),
        ('E', FieldCodec::UInt32),
        ('L', FieldCodec::Int32),
        ('M', FieldCodec::UInt8),
        ('q', FieldCodec::Int64),
        ('Q', FieldCodec::UInt64),
    ]
    .into_iter()
    .collect()
}

/// Raw shape of the JSON configuration document. Absent keys fall back to
/// the canonical defaults.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(rename = "MSG_HEADER")]
    msg_header: Option<String>,
    #[serde(rename = "FORMAT_MSG_TYPE")]
    format_msg_type: Option<u8>,
    #[serde(rename = "FORMAT_MSG_LENGTH")]
    format_msg_length: Option<usize>,
    #[serde(rename = "FMT_STRUCT")]
    fmt_struct: Option<Vec<(usize, String)>>,
    #[serde(rename = "FORMAT_MAPPING")]
    format_mapping: Option<HashMap<String, String>>,
    #[serde(rename = "SCALE_FACTOR_FIELDS")]
    scale_factor_fields: Option<Vec<String>>,
    #[serde(rename = "LATITUDE_LONGITUDE_FORMAT")]
    latitude_longitude_format: Option<String>,
    #[serde(rename = "BYTES_FIELDS")]
    bytes_fields: Option<Vec<String>>,
}

impl LogConfig {
    /// Load the configuration document from a JSON file, falling back to
    /// canonical defaults for absent keys.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| LogError::io(&path_str, format!("failed to read config: {e}")))?;
        Self::from_json(&text)
    }

    /// Parse the configuration document from a JSON string.
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawConfig = serde_json::from_str(text)
            .map_err(|e| LogError::config("<document>", e.to_string()))?;

        let mut config = LogConfig::default();

        if let Some(header) = raw.msg_header {
            let bytes = hex::decode(header.replace(' ', ""))
                .map_err(|e| LogError::config("MSG_HEADER", e.to_string()))?;
            if bytes.len() != 2 {
                return Err(LogError::config(
                    "MSG_HEADER",
                    format!("expected exactly 2 bytes, got {}", bytes.len()),
                ));
            }
            config.msg_header = [bytes[0], bytes[1]];
        }
        if let Some(type_id) = raw.format_msg_type {
            config.format_msg_type = type_id;
        }
        if let Some(length) = raw.format_msg_length {
            config.format_msg_length = length;
        }
        if let Some(pairs) = raw.fmt_struct {
            config.fmt_layout = FmtLayout::from_pairs(&pairs)?;
        }
        if let Some(mapping) = raw.format_mapping {
            let mut resolved = HashMap::with_capacity(mapping.len());
            for (key, name) in mapping {
                let ch = single_char("FORMAT_MAPPING", &key)?;
                let codec = FieldCodec::from_name(&name).ok_or_else(|| {
                    LogError::config("FORMAT_MAPPING", format!("unknown codec '{name}'"))
                })?;
                resolved.insert(ch, codec);
            }
            config.format_mapping = resolved;
        }
        if let Some(chars) = raw.scale_factor_fields {
            config.scale_factor_fields = chars
                .iter()
                .map(|s| single_char("SCALE_FACTOR_FIELDS", s))
                .collect::<Result<_>>()?;
        }
        if let Some(ch) = raw.latitude_longitude_format {
            config.latitude_longitude_format = single_char("LATITUDE_LONGITUDE_FORMAT", &ch)?;
        }
        if let Some(names) = raw.bytes_fields {
            config.bytes_fields = names.into_iter().collect();
        }

        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency of the constants.
    pub fn validate(&self) -> Result<()> {
        if self.format_msg_length < 3 {
            return Err(LogError::config(
                "FORMAT_MSG_LENGTH",
                "must cover at least the 3-byte preamble",
            ));
        }
        if self.fmt_layout.body_len() != self.format_msg_length - 3 {
            return Err(LogError::config(
                "FMT_STRUCT",
                format!(
                    "body layout totals {} bytes, FORMAT_MSG_LENGTH requires {}",
                    self.fmt_layout.body_len(),
                    self.format_msg_length - 3
                ),
            ));
        }
        if self.format_mapping.is_empty() {
            return Err(LogError::config("FORMAT_MAPPING", "mapping is empty"));
        }
        Ok(())
    }
}

fn single_char(key: &str, s: &str) -> Result<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(LogError::config(
            key,
            format!("expected a single character, got '{s}'"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_consistent() {
        let config = LogConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.msg_header, [0xA3, 0x95]);
        assert_eq!(config.format_msg_type, 128);
        assert_eq!(config.format_msg_length, 89);
        assert_eq!(config.fmt_layout.body_len(), 86);
        assert_eq!(config.format_mapping[&'L'], FieldCodec::Int32);
        assert!(config.scale_factor_fields.contains(&'c'));
        assert!(config.bytes_fields.contains("Data"));
    }

    #[test]
    fn test_from_json_overrides() {
        let config = LogConfig::from_json(
            r#"{
                "MSG_HEADER": "fe 01",
                "FORMAT_MSG_TYPE": 200,
                "SCALE_FACTOR_FIELDS": ["c"],
                "BYTES_FIELDS": ["Raw"]
            }"#,
        )
        .unwrap();
        assert_eq!(config.msg_header, [0xFE, 0x01]);
        assert_eq!(config.format_msg_type, 200);
        assert_eq!(
            config.scale_factor_fields,
            ['c'].into_iter().collect::<HashSet<_>>()
        );
        assert!(config.bytes_fields.contains("Raw"));
        assert!(!config.bytes_fields.contains("Data"));
        // Untouched keys keep their defaults
        assert_eq!(config.format_msg_length, 89);
    }

    #[test]
    fn test_from_json_bad_header() {
        assert!(LogConfig::from_json(r#"{"MSG_HEADER": "a395ff"}"#).is_err());
        assert!(LogConfig::from_json(r#"{"MSG_HEADER": "zz"}"#).is_err());
    }

    #[test]
    fn test_from_json_fmt_struct() {
        let config = LogConfig::from_json(
            r#"{
                "FORMAT_MSG_LENGTH": 53,
                "FMT_STRUCT": [[1, "u8"], [1, "u8"], [4, "ascii"], [12, "ascii"], [32, "ascii"]]
            }"#,
        )
        .unwrap();
        assert_eq!(config.fmt_layout.format_len, 12);
        assert_eq!(config.fmt_layout.columns_len, 32);

        // Layout totalling something else than FORMAT_MSG_LENGTH - 3 is rejected
        let result = LogConfig::from_json(
            r#"{
                "FMT_STRUCT": [[1, "u8"], [1, "u8"], [4, "ascii"], [12, "ascii"], [32, "ascii"]]
            }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_from_json_format_mapping() {
        let config = LogConfig::from_json(
            r#"{"FORMAT_MAPPING": {"x": "int8", "s": "char16"}}"#,
        )
        .unwrap();
        assert_eq!(config.format_mapping[&'x'], FieldCodec::Int8);
        assert_eq!(config.format_mapping[&'s'], FieldCodec::Ascii(16));

        assert!(LogConfig::from_json(r#"{"FORMAT_MAPPING": {"x": "nonsense"}}"#).is_err());
        assert!(LogConfig::from_json(r#"{"FORMAT_MAPPING": {"xy": "int8"}}"#).is_err());
    }
}
