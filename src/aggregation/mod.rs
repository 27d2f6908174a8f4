//! # Aggregation Module
//!
//! Merges readings from many nodes into a per-node latest-value table and
//! renders it for reporting.
//!
//! This module handles:
//! - Last-writer-wins upserts keyed by source address
//! - Consistent snapshots for readers
//! - JSON and compact text rendering

pub mod serializer;
pub mod store;

pub use store::{AggregationEntry, AggregationStore, AggregationTable};
