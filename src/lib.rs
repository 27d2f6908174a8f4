//! # Touch Telemetry Library
//!
//! Touch and battery telemetry from field nodes to a collector.
//!
//! A node assigns itself a small identity with two debounced buttons,
//! samples its contact sensor and battery, and pushes readings over a
//! point-to-point radio link or HTTP. A collector merges readings from
//! many nodes into a last-writer-wins table and reports it as JSON or as
//! a compact text line.

pub mod aggregation;
pub mod config;
pub mod error;
pub mod frame;
pub mod hal;
pub mod identity;
pub mod runtime;
pub mod sampler;
pub mod server;
pub mod transport;
