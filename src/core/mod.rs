// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core types used throughout mavlog.
//!
//! This module provides the foundational types for the library:
//! - [`LogError`] - Error taxonomy for fatal and localized failures
//! - [`LogValue`] / [`LogMessage`] - Decoded value representation

pub mod error;
pub mod value;

pub use error::{LogError, Result};
pub use value::{LogMessage, LogValue, PACKET_TYPE_KEY};
