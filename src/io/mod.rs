// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! I/O layer: the mmap arena and the sequential/parallel readers.

pub mod arena;
pub mod parallel;
pub mod parser;
pub mod scan;

pub use arena::MmapArena;
pub use parallel::{ParallelMode, ParallelParser};
pub use parser::Parser;
pub use scan::{CancelToken, MessageScanner, ScanStats};
