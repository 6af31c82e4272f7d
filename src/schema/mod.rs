// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Self-describing format machinery.
//!
//! The log format declares its own message layouts in-stream via FMT
//! records. This module turns those records into decode plans:
//! - [`codec`] - per-format-character wire codecs
//! - [`descriptor`] - parsed FMT records with precomputed field rules
//! - [`table`] - the type-id-keyed descriptor collection

pub mod codec;
pub mod descriptor;
pub mod table;

pub use codec::FieldCodec;
pub use descriptor::{FieldRule, FieldScale, FormatDescriptor};
pub use table::FormatTable;
