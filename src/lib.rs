// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Mavlog
//!
//! Parsing library for MAVLink binary log files (`.BIN`), the
//! self-describing telemetry format emitted by ArduPilot-family
//! autopilots.
//!
//! A log is a sequence of length-delimited records. Field layouts are
//! declared in-stream by FMT records, so the decoder bootstraps itself
//! from the file: it starts knowing only the FMT layout and learns every
//! other message type as it scans.
//!
//! The library is organized by concern:
//! - `core/` - error taxonomy and decoded value/message types
//! - `schema/` - format-character codecs, FMT descriptors, the format table
//! - `io/` - mmap arena, the sequential scanner, and the parallel coordinator
//! - `config` - injected format constants (sync marker, FMT layout, codecs)
//!
//! ## Example: sequential decoding
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use mavlog::Parser;
//!
//! let parser = Parser::open("flight.bin")?;
//! for message in parser.messages(Some("GPS"), None)? {
//!     println!("{:?}", message.get("Lat"));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Example: parallel decoding
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use mavlog::{ParallelMode, ParallelParser};
//!
//! let parser = ParallelParser::new("flight.bin", ParallelMode::Workers);
//! let messages = parser.process_all(None)?;
//! println!("{} messages", messages.len());
//! # Ok(())
//! # }
//! ```

// Core types
pub mod core;

// Re-export core types for convenience
pub use self::core::{LogError, LogMessage, LogValue, Result, PACKET_TYPE_KEY};

// Injected format constants
pub mod config;

pub use config::{FmtLayout, LogConfig};

// Self-describing format machinery
pub mod schema;

pub use schema::{FieldCodec, FormatDescriptor, FormatTable};

// I/O: arena, sequential scanner, parallel coordinator
pub mod io;

pub use io::{CancelToken, MessageScanner, MmapArena, ParallelMode, ParallelParser, Parser, ScanStats};
