//! # Sampler Module
//!
//! Produces a [`Reading`] from the contact sensor and the battery ADC.
//!
//! This module handles:
//! - Single discrete reads of the contact sensor
//! - Averaging a burst of battery ADC samples to suppress rail noise
//! - Mapping the averaged voltage to a charge percentage

pub mod battery;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::config::SamplerConfig;
use crate::error::{Result, TelemetryError};
use crate::hal::{BatteryAdc, ContactSensor};
use battery::{BatteryCurve, LinearBatteryCurve, VoltageDivider};

/// Default number of ADC samples averaged per battery reading
pub const DEFAULT_SAMPLE_COUNT: usize = 100;

/// One telemetry reading from one node.
///
/// `battery_percent` is always within 0-100; [`Reading::new`] clamps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Identity of the originating node, as text
    pub node_id: String,
    /// Contact state (0 or 1 from local sensors)
    pub touch_value: i32,
    /// Estimated battery charge, 0-100
    pub battery_percent: f32,
}

impl Reading {
    /// Builds a reading, clamping the battery into 0-100 (NaN becomes 0)
    #[must_use]
    pub fn new(node_id: impl Into<String>, touch_value: i32, battery_percent: f32) -> Self {
        Self {
            node_id: node_id.into(),
            touch_value,
            battery_percent: clamp_percent(battery_percent),
        }
    }
}

/// Clamp a percentage into 0-100, mapping NaN to 0
pub fn clamp_percent(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

struct SensorHardware {
    contact: Box<dyn ContactSensor>,
    adc: Box<dyn BatteryAdc>,
}

/// Reads the local sensors.
///
/// The hardware sits behind a lock because both the send task and the
/// local-reading HTTP handler sample it.
pub struct TelemetrySampler {
    hardware: Mutex<SensorHardware>,
    divider: VoltageDivider,
    curve: Box<dyn BatteryCurve>,
    sample_count: usize,
}

impl std::fmt::Debug for TelemetrySampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetrySampler")
            .field("divider", &self.divider)
            .field("curve", &self.curve)
            .field("sample_count", &self.sample_count)
            .finish_non_exhaustive()
    }
}

impl TelemetrySampler {
    /// Creates a sampler.
    ///
    /// # Arguments
    ///
    /// * `contact` - Contact sensor input
    /// * `adc` - Battery ADC channel
    /// * `divider` - ADC front end used to convert counts to volts
    /// * `curve` - Voltage-to-percentage strategy
    /// * `sample_count` - ADC samples averaged per battery reading (at least 1)
    pub fn new(
        contact: Box<dyn ContactSensor>,
        adc: Box<dyn BatteryAdc>,
        divider: VoltageDivider,
        curve: Box<dyn BatteryCurve>,
        sample_count: usize,
    ) -> Self {
        Self {
            hardware: Mutex::new(SensorHardware { contact, adc }),
            divider,
            curve,
            sample_count: sample_count.max(1),
        }
    }

    /// Creates a sampler with the linear curve described by `config`
    pub fn from_config(
        config: &SamplerConfig,
        contact: Box<dyn ContactSensor>,
        adc: Box<dyn BatteryAdc>,
    ) -> Self {
        let divider = VoltageDivider::new(
            config.reference_voltage,
            config.adc_resolution,
            config.divider_r1,
            config.divider_r2,
            config.calibration_factor,
        );
        let curve = LinearBatteryCurve::new(config.empty_voltage, config.full_voltage);

        Self::new(contact, adc, divider, Box::new(curve), config.sample_count)
    }

    /// Single unfiltered read of the contact sensor: 0 or 1
    pub fn sample_touch(&self) -> Result<i32> {
        let touched = self.lock().contact.read_contact()?;
        Ok(i32::from(touched))
    }

    /// Mean cell voltage over `sample_count` ADC samples
    pub fn sample_battery_voltage(&self) -> Result<f32> {
        let mut hardware = self.lock();
        let mut total = 0.0f32;

        for _ in 0..self.sample_count {
            let raw = hardware.adc.read_raw()?;
            total += self.divider.to_voltage(raw);
        }

        Ok(total / self.sample_count as f32)
    }

    /// Battery charge estimate, 0-100
    pub fn battery_percent(&self) -> Result<f32> {
        let voltage = self.sample_battery_voltage()?;
        Ok(self.curve.percent(voltage))
    }

    /// Samples both sensors and tags the result with `node_id`
    pub fn read(&self, node_id: u8) -> Result<Reading> {
        let touch_value = self.sample_touch()?;
        let battery_percent = self.battery_percent()?;
        Ok(Reading::new(node_id.to_string(), touch_value, battery_percent))
    }

    /// [`read`](Self::read) on the blocking pool, for callers on a runtime worker
    pub async fn read_blocking(self: &Arc<Self>, node_id: u8) -> Result<Reading> {
        let sampler = Arc::clone(self);
        tokio::task::spawn_blocking(move || sampler.read(node_id))
            .await
            .map_err(|e| TelemetryError::Sensor(format!("Sampling task failed: {}", e)))?
    }

    fn lock(&self) -> MutexGuard<'_, SensorHardware> {
        self.hardware.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
