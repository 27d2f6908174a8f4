//! # Aggregation Store
//!
//! Latest reading per originating node, last writer wins.
//!
//! Inbound handlers for both transports write here; reporting routines
//! read consistent snapshots. A single mutex guards the whole table: an
//! upsert replaces one whole entry and a snapshot copies the table under
//! the same lock, so readers never see a partially applied write.
//!
//! There is no sequencing. A stale reading that arrives after a fresher
//! one from the same source replaces it.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::sampler::Reading;

/// One row of the table
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationEntry {
    /// Network address of the sender
    pub source_key: String,
    /// Most recent reading from that sender
    pub reading: Reading,
}

/// Snapshot of the table, iterated in source-key order
pub type AggregationTable = BTreeMap<String, AggregationEntry>;

/// Concurrent latest-value store keyed by source address
#[derive(Debug, Default)]
pub struct AggregationStore {
    table: Mutex<AggregationTable>,
}

impl AggregationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the entry for `source_key`
    pub fn upsert(&self, source_key: &str, reading: Reading) {
        debug!(
            source = source_key,
            client_id = %reading.node_id,
            touch = reading.touch_value,
            battery = reading.battery_percent,
            "Sensor data updated"
        );

        let entry = AggregationEntry {
            source_key: source_key.to_string(),
            reading,
        };
        self.lock().insert(source_key.to_string(), entry);
    }

    /// Latest reading for one source
    pub fn get(&self, source_key: &str) -> Option<Reading> {
        self.lock().get(source_key).map(|entry| entry.reading.clone())
    }

    /// Copy of the whole table
    pub fn all(&self) -> AggregationTable {
        self.lock().clone()
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, AggregationTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
