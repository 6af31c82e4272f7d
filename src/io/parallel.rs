// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Parallel log decoding.
//!
//! The coordinator converts the serial FMT-before-instance dependency
//! into one cheap pre-scan plus embarrassingly parallel decoding:
//!
//! 1. **Pre-scan** - a single sequential pass collects every FMT record
//!    into a complete format table.
//! 2. **Chunking** - the file is split into `worker_count` nominal
//!    slices, each boundary advanced to the next validated record start.
//! 3. **Decode** - workers scan their slices independently; each worker
//!    is a pure function of `(range, table)` and shares no mutable state.
//! 4. **Merge** - per-chunk outputs are concatenated in slice order,
//!    which preserves file order overall.
//!
//! Any worker failure aborts the whole run with the first error;
//! cancellation discards partial results.

use std::ops::Range;
use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::LogConfig;
use crate::core::{LogError, LogMessage, Result};
use crate::io::arena::MmapArena;
use crate::io::scan::{find_marker, tail_sync_ok, CancelToken, MessageScanner};
use crate::schema::FormatTable;

/// How chunk workers are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParallelMode {
    /// CPU-bound decoding on a rayon pool; each worker maps the file
    /// independently. Defaults to the available hardware parallelism.
    Workers,
    /// I/O-bound decoding on scoped threads sharing one mapping.
    /// Defaults to 16 workers.
    Threads,
}

impl ParallelMode {
    fn default_worker_count(self) -> usize {
        match self {
            ParallelMode::Workers => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(8),
            ParallelMode::Threads => 16,
        }
    }
}

/// Coordinator for decoding a whole file across workers.
#[derive(Debug, Clone)]
pub struct ParallelParser {
    path: String,
    mode: ParallelMode,
    worker_count: usize,
    config: Arc<LogConfig>,
    cancel: CancelToken,
}

impl ParallelParser {
    /// Create a coordinator for the given file and execution mode.
    pub fn new<P: AsRef<Path>>(path: P, mode: ParallelMode) -> Self {
        Self {
            path: path.as_ref().to_string_lossy().to_string(),
            mode,
            worker_count: mode.default_worker_count(),
            config: Arc::new(LogConfig::default()),
            cancel: CancelToken::new(),
        }
    }

    /// Override the worker count (clamped to at least one).
    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count.max(1);
        self
    }

    /// Use explicit format constants instead of the canonical defaults.
    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    /// A token that cancels this run when triggered. Workers finish
    /// their current record, then the run returns [`LogError::Cancelled`]
    /// without partial results.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// The file path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Decode the whole file, optionally keeping only messages of the
    /// named type, preserving file order.
    pub fn process_all(&self, filter: Option<&str>) -> Result<Vec<LogMessage>> {
        self.config.validate()?;
        let arena = MmapArena::open(&self.path)?;
        if arena.is_empty() {
            return Ok(Vec::new());
        }

        let table = prescan_formats(arena.data(), self.config.clone())?;
        let chunks = split_chunks(arena.data(), &table, self.worker_count);
        info!(
            path = %self.path,
            chunks = chunks.len(),
            workers = self.worker_count,
            descriptors = table.len(),
            "starting parallel decode"
        );

        let results = match self.mode {
            ParallelMode::Workers => self.run_workers(&chunks, &table, filter)?,
            ParallelMode::Threads => self.run_threads(&arena, &chunks, &table, filter),
        };

        if self.cancel.is_cancelled() {
            return Err(LogError::Cancelled);
        }

        let mut merged = Vec::new();
        for result in results {
            merged.extend(result?);
        }
        info!(messages = merged.len(), "parallel decode complete");
        Ok(merged)
    }

    /// Rayon pool; every chunk worker maps the file on its own, so a
    /// worker is a pure function of `(path, range, table)`.
    fn run_workers(
        &self,
        chunks: &[Range<usize>],
        table: &FormatTable,
        filter: Option<&str>,
    ) -> Result<Vec<Result<Vec<LogMessage>>>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.worker_count)
            .thread_name(|index| format!("mavlog-worker-{index}"))
            .build()
            .map_err(|e| LogError::io(&self.path, format!("failed to create thread pool: {e}")))?;

        let path = self.path.as_str();
        let cancel = &self.cancel;
        Ok(pool.install(|| {
            chunks
                .par_iter()
                .map(|range| {
                    if cancel.is_cancelled() {
                        return Ok(Vec::new());
                    }
                    let arena = MmapArena::open(path)?;
                    if range.end > arena.len() {
                        return Err(LogError::io(path, "file shrank during parallel decode"));
                    }
                    decode_chunk(arena.data(), range.clone(), table.clone(), filter, cancel)
                })
                .collect()
        }))
    }

    /// Scoped threads over one shared mapping; results come back through
    /// a channel tagged with the chunk index.
    fn run_threads(
        &self,
        arena: &MmapArena,
        chunks: &[Range<usize>],
        table: &FormatTable,
        filter: Option<&str>,
    ) -> Vec<Result<Vec<LogMessage>>> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let cancel = &self.cancel;
        let data = arena.data();

        std::thread::scope(|scope| {
            for (index, range) in chunks.iter().enumerate() {
                let sender = sender.clone();
                let table = table.clone();
                scope.spawn(move || {
                    let result = if cancel.is_cancelled() {
                        Ok(Vec::new())
                    } else {
                        decode_chunk(data, range.clone(), table, filter, cancel)
                    };
                    let _ = sender.send((index, result));
                });
            }
        });
        drop(sender);

        let mut results: Vec<Result<Vec<LogMessage>>> = chunks.iter().map(|_| Ok(Vec::new())).collect();
        for (index, result) in receiver.iter() {
            results[index] = result;
        }
        results
    }
}

/// Decode one chunk with a pre-built table.
fn decode_chunk(
    data: &[u8],
    range: Range<usize>,
    table: FormatTable,
    filter: Option<&str>,
    cancel: &CancelToken,
) -> Result<Vec<LogMessage>> {
    let scanner = MessageScanner::new(data, table, range)?
        .with_filter(filter)
        .with_cancel(cancel.clone());
    Ok(scanner.collect())
}

/// Sequential FMT-only pass building the complete format table.
///
/// Linear in the file size with trivial per-record work: known records
/// are stepped over by their declared length, everything else by one
/// byte.
pub fn prescan_formats(data: &[u8], config: Arc<LogConfig>) -> Result<FormatTable> {
    let mut table = FormatTable::bootstrap(config)?;
    let header = table.config().msg_header;
    let fmt_type = table.config().format_msg_type;
    let hi = data.len();

    let mut pos = 0;
    while let Some(p) = find_marker(data, pos, hi, header) {
        let length = match table.lookup(data[p + 2]) {
            Some(descriptor) => descriptor.length,
            None => {
                pos = p + 1;
                continue;
            }
        };
        if p + length > hi || !tail_sync_ok(data, p + length, hi, header) {
            pos = p + 1;
            continue;
        }
        if data[p + 2] == fmt_type {
            if let Err(e) = table.register(&data[p..p + length]) {
                warn!(offset = p, error = %e, "skipping malformed FMT record in pre-scan");
                pos = p + 1;
                continue;
            }
        }
        pos = p + length;
    }
    Ok(table)
}

/// Split the file into `worker_count` record-aligned slices.
///
/// Nominal equal-size boundaries are advanced to the next validated
/// record start; slice `i` ends where slice `i + 1` starts. Empty slices
/// are dropped.
pub fn split_chunks(data: &[u8], table: &FormatTable, worker_count: usize) -> Vec<Range<usize>> {
    let len = data.len();
    let count = worker_count.max(1);
    let nominal = (len / count).max(1);

    let mut boundaries = Vec::with_capacity(count + 1);
    boundaries.push(0);
    for i in 1..count {
        boundaries.push(align_to_record(data, i * nominal, table));
    }
    boundaries.push(len);

    boundaries
        .windows(2)
        .filter(|pair| pair[0] < pair[1])
        .map(|pair| pair[0]..pair[1])
        .collect()
}

/// Advance `from` to the next offset that starts a validated record:
/// a sync marker, a type id known to the table, and a passing tail-sync
/// check. Returns the end of the data if none exists.
fn align_to_record(data: &[u8], from: usize, table: &FormatTable) -> usize {
    let hi = data.len();
    let header = table.config().msg_header;
    let mut pos = from;
    while let Some(p) = find_marker(data, pos, hi, header) {
        if let Some(descriptor) = table.lookup(data[p + 2]) {
            let end = p + descriptor.length;
            if end <= hi && tail_sync_ok(data, end, hi, header) {
                return p;
            }
        }
        pos = p + 1;
    }
    hi
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogConfig;

    fn fmt_record(config: &LogConfig, type_id: u8, length: u8, name: &str, format: &str, columns: &str) -> Vec<u8> {
        let mut record = Vec::with_capacity(config.format_msg_length);
        record.extend_from_slice(&config.msg_header);
        record.push(config.format_msg_type);
        record.push(type_id);
        record.push(length);
        for (s, len) in [
            (name, config.fmt_layout.name_len),
            (format, config.fmt_layout.format_len),
            (columns, config.fmt_layout.columns_len),
        ] {
            let mut bytes = s.as_bytes().to_vec();
            bytes.resize(len, 0);
            record.extend(bytes);
        }
        record
    }

    fn data_record(config: &LogConfig, type_id: u8, payload: &[u8]) -> Vec<u8> {
        let mut record = Vec::with_capacity(3 + payload.len());
        record.extend_from_slice(&config.msg_header);
        record.push(type_id);
        record.extend_from_slice(payload);
        record
    }

    fn sample_log(config: &LogConfig, instances: usize) -> Vec<u8> {
        let mut data = fmt_record(config, 70, 6, "IMU", "Bh", "Id,AccX");
        for i in 0..instances {
            let mut payload = vec![(i % 250) as u8];
            payload.extend_from_slice(&(i as i16).to_le_bytes());
            data.extend(data_record(config, 70, &payload));
        }
        data
    }

    #[test]
    fn test_prescan_collects_all_formats() {
        let config = Arc::new(LogConfig::default());
        let mut data = sample_log(&config, 3);
        data.extend(fmt_record(&config, 71, 4, "MODE", "B", "Mode"));
        data.extend(data_record(&config, 71, &[1]));

        let table = prescan_formats(&data, config.clone()).unwrap();
        // FMT bootstrap + IMU + MODE
        assert_eq!(table.len(), 3);
        assert_eq!(table.lookup(70).unwrap().name, "IMU");
        assert_eq!(table.lookup(71).unwrap().name, "MODE");
    }

    #[test]
    fn test_split_chunks_cover_file_without_overlap() {
        let config = Arc::new(LogConfig::default());
        let data = sample_log(&config, 64);
        let table = prescan_formats(&data, config.clone()).unwrap();

        for workers in [1, 2, 4, 7] {
            let chunks = split_chunks(&data, &table, workers);
            assert!(!chunks.is_empty());
            assert_eq!(chunks[0].start, 0);
            assert_eq!(chunks.last().unwrap().end, data.len());
            for pair in chunks.windows(2) {
                assert_eq!(pair[0].end, pair[1].start);
            }
        }
    }

    #[test]
    fn test_chunk_boundaries_are_record_starts() {
        let config = Arc::new(LogConfig::default());
        let data = sample_log(&config, 64);
        let table = prescan_formats(&data, config.clone()).unwrap();

        let chunks = split_chunks(&data, &table, 4);
        for chunk in &chunks[1..] {
            let pos = chunk.start;
            assert_eq!(data[pos..pos + 2], config.msg_header);
            assert!(table.lookup(data[pos + 2]).is_some());
        }
    }

    #[test]
    fn test_align_past_end() {
        let config = Arc::new(LogConfig::default());
        let data = sample_log(&config, 1);
        let table = prescan_formats(&data, config.clone()).unwrap();
        assert_eq!(align_to_record(&data, data.len() - 2, &table), data.len());
    }

    #[test]
    fn test_default_worker_counts() {
        assert_eq!(ParallelMode::Threads.default_worker_count(), 16);
        assert!(ParallelMode::Workers.default_worker_count() >= 1);
    }
}
