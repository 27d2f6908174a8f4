//! # Radio Frame Module
//!
//! Fixed-layout binary frame exchanged over the point-to-point radio link.
//!
//! This module handles:
//! - Frame layout constants and peer hardware addressing
//! - Encoding a [`Reading`](crate::sampler::Reading) into a 40-byte frame
//! - Decoding and validating received frames
//!
//! The layout is a wire contract between independently built senders and
//! receivers and must not change.

pub mod protocol;
pub mod encoder;
pub mod decoder;
