// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Sequential record scanner.
//!
//! [`MessageScanner`] walks a byte range and emits decoded messages in
//! file order: find the sync marker, look the type byte up in the format
//! table, validate the candidate against the next record's marker, then
//! decode. FMT records update the table as a side effect and are never
//! emitted.
//!
//! Localized failures (unknown type id, malformed FMT, field decode
//! errors, a phantom marker inside a payload) never surface as errors:
//! the scanner advances one byte and retries header detection. They are
//! counted in [`ScanStats`].

use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::warn;

use crate::core::{LogError, LogMessage, Result};
use crate::schema::FormatTable;

/// Cooperative cancellation flag shared between a caller and scanners.
///
/// Scanners check the token between records, so cancellation lets the
/// current record finish decoding.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.inner.store(true, Ordering::Relaxed);
    }

    /// Check whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::Relaxed)
    }
}

/// Counters for failures absorbed by the resync loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Sync markers followed by a type id not in the table
    pub unknown_types: u64,
    /// FMT records rejected by structural checks
    pub malformed_formats: u64,
    /// Records where a field failed to decode
    pub decode_errors: u64,
    /// Total one-byte resync advances (includes candidates rejected by
    /// the tail-sync check)
    pub resyncs: u64,
}

/// Check that a record ending at `end` is followed by the sync marker of
/// the next record, or ends exactly at the range boundary.
///
/// This is what suppresses phantom records when the marker bytes happen
/// to appear inside a payload.
pub(crate) fn tail_sync_ok(data: &[u8], end: usize, hi: usize, header: [u8; 2]) -> bool {
    end == hi || (end + 2 <= hi && data[end..end + 2] == header)
}

/// Find the next sync marker at or after `from` with room for the type
/// byte before `hi`.
pub(crate) fn find_marker(data: &[u8], mut from: usize, hi: usize, header: [u8; 2]) -> Option<usize> {
    if hi < 3 {
        return None;
    }
    let limit = hi - 3;
    while from <= limit {
        let rel = data[from..=limit].iter().position(|&b| b == header[0])?;
        let pos = from + rel;
        if data[pos + 1] == header[1] {
            return Some(pos);
        }
        from = pos + 1;
    }
    None
}

/// Lazy iterator over decoded messages in a byte range.
///
/// Single-pass, constant extra memory: the caller pulls one message at a
/// time. The scanner owns its format table and keeps registering FMT
/// records as it encounters them.
pub struct MessageScanner<'a> {
    data: &'a [u8],
    table: FormatTable,
    header: [u8; 2],
    fmt_type: u8,
    pos: usize,
    hi: usize,
    filter: Option<String>,
    cancel: Option<CancelToken>,
    stats: ScanStats,
    last_record_offset: Option<usize>,
}

impl<'a> MessageScanner<'a> {
    /// Create a scanner over `data[range]` with the given table.
    ///
    /// # Errors
    ///
    /// Returns an error if the range does not lie within `data`.
    pub fn new(data: &'a [u8], table: FormatTable, range: Range<usize>) -> Result<Self> {
        if range.start > range.end || range.end > data.len() {
            return Err(LogError::truncated(
                range.start,
                range.end.saturating_sub(range.start),
                data.len().saturating_sub(range.start.min(data.len())),
            ));
        }
        let header = table.config().msg_header;
        let fmt_type = table.config().format_msg_type;
        Ok(Self {
            data,
            table,
            header,
            fmt_type,
            pos: range.start,
            hi: range.end,
            filter: None,
            cancel: None,
            stats: ScanStats::default(),
            last_record_offset: None,
        })
    }

    /// Only emit messages whose descriptor name equals `name`. Skipped
    /// records still advance by their full length, so FMT registration
    /// side effects are preserved.
    pub fn with_filter(mut self, name: Option<&str>) -> Self {
        self.filter = name.map(String::from);
        self
    }

    /// Attach a cancellation token checked between records.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Current scan position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Start offset of the most recently emitted message.
    pub fn last_record_offset(&self) -> Option<usize> {
        self.last_record_offset
    }

    /// Diagnostics for failures absorbed so far.
    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    /// Borrow the format table in its current state.
    pub fn table(&self) -> &FormatTable {
        &self.table
    }

    /// Consume the scanner and keep the table it built.
    pub fn into_table(self) -> FormatTable {
        self.table
    }
}

impl Iterator for MessageScanner<'_> {
    type Item = LogMessage;

    fn next(&mut self) -> Option<LogMessage> {
        loop {
            if let Some(token) = &self.cancel {
                if token.is_cancelled() {
                    return None;
                }
            }
            if self.pos >= self.hi {
                return None;
            }

            let pos = find_marker(self.data, self.pos, self.hi, self.header)?;
            let type_id = self.data[pos + 2];

            let Some(descriptor) = self.table.lookup(type_id) else {
                self.stats.unknown_types += 1;
                self.stats.resyncs += 1;
                self.pos = pos + 1;
                continue;
            };
            let length = descriptor.length;

            if pos + length > self.hi {
                // Truncated tail: every complete record has been emitted.
                return None;
            }

            if !tail_sync_ok(self.data, pos + length, self.hi, self.header) {
                self.stats.resyncs += 1;
                self.pos = pos + 1;
                continue;
            }

            if type_id == self.fmt_type {
                match self.table.register(&self.data[pos..pos + length]) {
                    Ok(()) => self.pos = pos + length,
                    Err(e) => {
                        warn!(offset = pos, error = %e, "skipping malformed FMT record");
                        self.stats.malformed_formats += 1;
                        self.stats.resyncs += 1;
                        self.pos = pos + 1;
                    }
                }
                continue;
            }

            if let Some(filter) = &self.filter {
                if descriptor.name != *filter {
                    self.pos = pos + length;
                    continue;
                }
            }

            match descriptor.decode_payload(&self.data[pos + 3..pos + length], pos) {
                Ok(message) => {
                    self.pos = pos + length;
                    self.last_record_offset = Some(pos);
                    return Some(message);
                }
                Err(e) => {
                    warn!(offset = pos, error = %e, "record failed to decode");
                    self.stats.decode_errors += 1;
                    self.stats.resyncs += 1;
                    self.pos = pos + 1;
                }
            }
        }
    }
}
