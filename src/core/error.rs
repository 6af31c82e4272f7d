// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Error types for binary log parsing.
//!
//! Two families of failures exist:
//! - Fatal errors (`Io`, `Config`, `Cancelled`) surface to the caller of
//!   `decode_all` / `process_all`.
//! - Localized errors (`MalformedFormat`, `UnknownType`, `Decode`,
//!   mid-range `Truncated`) are absorbed by the scanner's resync loop and
//!   only show up in scan diagnostics.

use std::fmt;

/// Errors that can occur while opening or decoding a binary log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogError {
    /// File open, metadata, or mmap failure
    Io {
        /// Path of the file being accessed
        path: String,
        /// Underlying error message
        message: String,
    },

    /// FMT record failed a structural check
    MalformedFormat {
        /// Type id declared by the offending record
        type_id: u8,
        /// What check failed
        reason: String,
    },

    /// A record's declared length exceeds the remaining bytes
    Truncated {
        /// Offset of the record start
        offset: usize,
        /// Bytes the record claims to need
        requested: usize,
        /// Bytes actually available
        available: usize,
    },

    /// Type id not present in the format table
    UnknownType {
        /// The unregistered type id
        type_id: u8,
    },

    /// A single field failed to decode
    Decode {
        /// Field (column) name
        field: String,
        /// Codec that was applied
        codec: String,
        /// Offset of the record start
        offset: usize,
        /// What went wrong
        reason: String,
    },

    /// Cancellation was requested; no results are returned
    Cancelled,

    /// Configuration document is invalid
    Config {
        /// Offending configuration key
        key: String,
        /// Validation error message
        reason: String,
    },
}

impl LogError {
    /// Create an I/O error.
    pub fn io(path: impl Into<String>, message: impl Into<String>) -> Self {
        LogError::Io {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a malformed-FMT error.
    pub fn malformed(type_id: u8, reason: impl Into<String>) -> Self {
        LogError::MalformedFormat {
            type_id,
            reason: reason.into(),
        }
    }

    /// Create a truncated-record error.
    pub fn truncated(offset: usize, requested: usize, available: usize) -> Self {
        LogError::Truncated {
            offset,
            requested,
            available,
        }
    }

    /// Create an unknown-type error.
    pub fn unknown_type(type_id: u8) -> Self {
        LogError::UnknownType { type_id }
    }

    /// Create a field decode error.
    pub fn decode(
        field: impl Into<String>,
        codec: impl Into<String>,
        offset: usize,
        reason: impl Into<String>,
    ) -> Self {
        LogError::Decode {
            field: field.into(),
            codec: codec.into(),
            offset,
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(key: impl Into<String>, reason: impl Into<String>) -> Self {
        LogError::Config {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error is absorbed by the scanner's resync loop rather
    /// than surfaced to the caller.
    pub fn is_localized(&self) -> bool {
        matches!(
            self,
            LogError::MalformedFormat { .. }
                | LogError::UnknownType { .. }
                | LogError::Decode { .. }
                | LogError::Truncated { .. }
        )
    }
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogError::Io { path, message } => {
                write!(f, "I/O error on '{path}': {message}")
            }
            LogError::MalformedFormat { type_id, reason } => {
                write!(f, "Malformed FMT record for type {type_id}: {reason}")
            }
            LogError::Truncated {
                offset,
                requested,
                available,
            } => {
                write!(
                    f,
                    "Truncated record at offset {offset}: needs {requested} bytes, {available} available"
                )
            }
            LogError::UnknownType { type_id } => {
                write!(f, "Unknown message type id {type_id}")
            }
            LogError::Decode {
                field,
                codec,
                offset,
                reason,
            } => {
                write!(
                    f,
                    "Failed to decode field '{field}' ({codec}) in record at offset {offset}: {reason}"
                )
            }
            LogError::Cancelled => write!(f, "Operation cancelled"),
            LogError::Config { key, reason } => {
                write!(f, "Invalid configuration value for '{key}': {reason}")
            }
        }
    }
}

impl std::error::Error for LogError {}

/// Result type alias for log parsing operations.
pub type Result<T> = std::result::Result<T, LogError>;
