// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! The format table: everything the decoder has learned so far.
//!
//! A table starts with the single hard-coded FMT self-descriptor and
//! grows as FMT records are registered during a scan. Once registered, a
//! type id is immutable for the remainder of the file. The table is built
//! single-threaded (a scan or the parallel pre-scan) and then cloned to
//! workers, so there is no interior locking.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::LogConfig;
use crate::core::{LogError, Result};
use crate::schema::descriptor::FormatDescriptor;

/// Type-id-keyed collection of format descriptors.
#[derive(Debug, Clone)]
pub struct FormatTable {
    config: Arc<LogConfig>,
    entries: HashMap<u8, FormatDescriptor>,
}

impl FormatTable {
    /// Create a table containing exactly the FMT self-descriptor.
    pub fn bootstrap(config: Arc<LogConfig>) -> Result<Self> {
        let fmt = FormatDescriptor::bootstrap(&config)?;
        let mut entries = HashMap::new();
        entries.insert(fmt.type_id, fmt);
        Ok(Self { config, entries })
    }

    /// The configuration this table was built with.
    pub fn config(&self) -> &Arc<LogConfig> {
        &self.config
    }

    /// Parse a raw FMT record (starting at its sync marker) and install
    /// the resulting descriptor.
    ///
    /// A byte-identical duplicate registration is accepted silently; logs
    /// commonly repeat FMT records for resilience. A conflicting
    /// registration for an already-known type id is rejected and leaves
    /// the table untouched.
    pub fn register(&mut self, record: &[u8]) -> Result<()> {
        let descriptor = FormatDescriptor::parse(record, &self.config)?;
        match self.entries.get(&descriptor.type_id) {
            None => {
                self.entries.insert(descriptor.type_id, descriptor);
                Ok(())
            }
            Some(existing) if *existing == descriptor => Ok(()),
            Some(_) => Err(LogError::malformed(
                descriptor.type_id,
                "conflicting re-registration of an already-known type id",
            )),
        }
    }

    /// Look up the descriptor for a type id.
    pub fn lookup(&self, type_id: u8) -> Option<&FormatDescriptor> {
        self.entries.get(&type_id)
    }

    /// Number of registered descriptors (including the FMT bootstrap).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// A freshly bootstrapped table is never empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over registered descriptors in unspecified order.
    pub fn descriptors(&self) -> impl Iterator<Item = &FormatDescriptor> {
        self.entries.values()
    }
}
