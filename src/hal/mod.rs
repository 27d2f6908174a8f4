//! # Hardware Abstraction Module
//!
//! Trait seams for the pins a field node reads, so the identity and
//! sampling logic can run against real sysfs files or test doubles.
//!
//! This module handles:
//! - Contact (touch) sensor reads
//! - Raw battery ADC reads
//! - Button level reads for identity assignment

pub mod sysfs;

use crate::error::Result;

/// Binary contact sensor
pub trait ContactSensor: Send {
    /// Read the current contact state (`true` = touched)
    fn read_contact(&mut self) -> Result<bool>;
}

/// Analog-to-digital converter wired to the battery voltage divider
pub trait BatteryAdc: Send {
    /// Read one raw ADC sample
    fn read_raw(&mut self) -> Result<u16>;
}

/// Digital button input
pub trait ButtonInput: Send {
    /// Read the raw electrical level (`true` = high)
    fn read_level(&mut self) -> Result<bool>;
}
