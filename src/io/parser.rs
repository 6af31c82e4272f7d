// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Sequential log parser with scoped file acquisition.
//!
//! [`Parser::open`] maps the file; the mapping is released when the
//! parser is dropped, on every path. Each call to [`Parser::messages`]
//! starts a fresh scan from offset zero with a freshly bootstrapped
//! format table, so repeated scans are independent.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::config::LogConfig;
use crate::core::{LogMessage, Result};
use crate::io::arena::MmapArena;
use crate::io::scan::MessageScanner;
use crate::schema::FormatTable;

/// Sequential reader for one binary log file.
pub struct Parser {
    arena: MmapArena,
    config: Arc<LogConfig>,
}

impl Parser {
    /// Open a log file with the canonical format constants.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(path, LogConfig::default())
    }

    /// Open a log file with explicit format constants.
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: LogConfig) -> Result<Self> {
        config.validate()?;
        let arena = MmapArena::open(path)?;
        debug!(path = arena.path(), size = arena.len(), "opened log file");
        Ok(Self {
            arena,
            config: Arc::new(config),
        })
    }

    /// The file path.
    pub fn path(&self) -> &str {
        self.arena.path()
    }

    /// The mapped file size in bytes.
    pub fn file_size(&self) -> usize {
        self.arena.len()
    }

    /// The format constants in use.
    pub fn config(&self) -> &Arc<LogConfig> {
        &self.config
    }

    /// Lazily iterate decoded messages in file order.
    ///
    /// `filter` keeps only messages of the named type (FMT registration
    /// still happens for skipped records). `end_offset` bounds the scan:
    /// a record straddling it is not emitted.
    pub fn messages(
        &self,
        filter: Option<&str>,
        end_offset: Option<usize>,
    ) -> Result<MessageScanner<'_>> {
        let hi = end_offset
            .unwrap_or(self.arena.len())
            .min(self.arena.len());
        let table = FormatTable::bootstrap(self.config.clone())?;
        Ok(MessageScanner::new(self.arena.data(), table, 0..hi)?.with_filter(filter))
    }

    /// Decode the whole file into a vector.
    pub fn decode_all(&self, filter: Option<&str>) -> Result<Vec<LogMessage>> {
        Ok(self.messages(filter, None)?.collect())
    }
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("path", &self.arena.path())
            .field("size", &self.arena.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogError;
    use std::io::Write;

    fn write_temp(name: &str, data: &[u8]) -> String {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "mavlog_test_parser_{}_{}.bin",
            std::process::id(),
            name
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(data).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn test_open_missing_file() {
        let result = Parser::open("/nonexistent/never/log.bin");
        assert!(matches!(result, Err(LogError::Io { .. })));
    }

    #[test]
    fn test_open_invalid_config() {
        let path = write_temp("badcfg", &[]);
        let mut config = LogConfig::default();
        config.format_msg_length = 2;
        assert!(matches!(
            Parser::open_with_config(&path, config),
            Err(LogError::Config { .. })
        ));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_empty_file_decodes_to_nothing() {
        let path = write_temp("empty", &[]);
        let parser = Parser::open(&path).unwrap();
        assert_eq!(parser.decode_all(None).unwrap(), Vec::new());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_repeated_scans_are_independent() {
        let config = LogConfig::default();
        let mut data = Vec::new();
        data.extend_from_slice(&config.msg_header);
        data.push(config.format_msg_type);
        data.push(60);
        data.push(4);
        for (s, len) in [("MODE", 4), ("B", 16), ("Mode", 64)] {
            let mut bytes = s.as_bytes().to_vec();
            bytes.resize(len, 0);
            data.extend(bytes);
        }
        data.extend_from_slice(&config.msg_header);
        data.push(60);
        data.push(9);

        let path = write_temp("rescan", &data);
        let parser = Parser::open(&path).unwrap();
        let first = parser.decode_all(None).unwrap();
        let second = parser.decode_all(None).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first, second);
        let _ = std::fs::remove_file(&path);
    }
}
