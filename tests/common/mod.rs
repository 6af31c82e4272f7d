// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for integration tests: synthetic log construction
//! and temp-file fixtures with cleanup guards.

#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use mavlog::LogConfig;

// ============================================================================
// Log construction
// ============================================================================

/// Builder for synthetic binary logs.
pub struct LogBuilder {
    config: LogConfig,
    data: Vec<u8>,
}

impl LogBuilder {
    pub fn new() -> Self {
        Self::with_config(LogConfig::default())
    }

    pub fn with_config(config: LogConfig) -> Self {
        Self {
            config,
            data: Vec::new(),
        }
    }

    /// Append an FMT record declaring a message type.
    pub fn fmt(mut self, type_id: u8, length: u8, name: &str, format: &str, columns: &str) -> Self {
        self.data.extend_from_slice(&self.config.msg_header);
        self.data.push(self.config.format_msg_type);
        self.data.push(type_id);
        self.data.push(length);
        for (text, len) in [
            (name, self.config.fmt_layout.name_len),
            (format, self.config.fmt_layout.format_len),
            (columns, self.config.fmt_layout.columns_len),
        ] {
            let mut bytes = text.as_bytes().to_vec();
            bytes.resize(len, 0);
            self.data.extend(bytes);
        }
        self
    }

    /// Append a data record with the given payload.
    pub fn record(mut self, type_id: u8, payload: &[u8]) -> Self {
        self.data.extend_from_slice(&self.config.msg_header);
        self.data.push(type_id);
        self.data.extend_from_slice(payload);
        self
    }

    /// Append raw bytes verbatim (corruption, junk, truncation material).
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.data.extend_from_slice(bytes);
        self
    }

    /// Drop the last `count` bytes (simulates a mid-record truncation).
    pub fn truncate_by(mut self, count: usize) -> Self {
        let keep = self.data.len().saturating_sub(count);
        self.data.truncate(keep);
        self
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn bytes(self) -> Vec<u8> {
        self.data
    }

    /// Write the log to a temp file; the guard removes it on drop.
    pub fn write_temp(self, name: &str) -> (PathBuf, CleanupGuard) {
        let path = temp_path(name);
        let mut file = fs::File::create(&path).expect("failed to create temp log");
        file.write_all(&self.data).expect("failed to write temp log");
        file.flush().unwrap();
        let guard = CleanupGuard(path.clone());
        (path, guard)
    }
}

impl Default for LogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn temp_path(name: &str) -> PathBuf {
    let random = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .subsec_nanos();
    std::env::temp_dir().join(format!(
        "mavlog_test_{}_{}_{}.bin",
        std::process::id(),
        name,
        random
    ))
}

/// Cleanup guard for test temporary files.
pub struct CleanupGuard(PathBuf);

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.0);
    }
}

// ============================================================================
// Payload helpers
// ============================================================================

/// Little-endian payload builder for data records.
#[derive(Default)]
pub struct Payload(Vec<u8>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(mut self, v: u8) -> Self {
        self.0.push(v);
        self
    }

    pub fn i16(mut self, v: i16) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u16(mut self, v: u16) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i32(mut self, v: i32) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u32(mut self, v: u32) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u64(mut self, v: u64) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn f32(mut self, v: f32) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn f64(mut self, v: f64) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn ascii(mut self, text: &str, len: usize) -> Self {
        let mut bytes = text.as_bytes().to_vec();
        bytes.resize(len, 0);
        self.0.extend(bytes);
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.0.extend_from_slice(bytes);
        self
    }

    pub fn bytes(self) -> Vec<u8> {
        self.0
    }
}
