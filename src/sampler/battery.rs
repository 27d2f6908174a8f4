//! # Battery Estimation
//!
//! Converts raw ADC counts into a cell voltage and the voltage into a
//! charge percentage.
//!
//! ## Voltage Divider
//!
//! The cell is measured through a resistor divider so it fits the ADC
//! input range:
//!
//! `voltage = raw * (vref / resolution) * (r1 + r2) / r2 * calibration`
//!
//! ## Charge Curve
//!
//! Real discharge curves are not linear, so the voltage-to-percentage map
//! is a [`BatteryCurve`] strategy. [`LinearBatteryCurve`] maps 3.2 V to 0%
//! and 4.2 V to 100% by default.
//!
//! ```
//! use touch_telemetry::sampler::battery::{BatteryCurve, LinearBatteryCurve};
//!
//! let curve = LinearBatteryCurve::default();
//! assert_eq!(curve.percent(3.0), 0.0);
//! assert!((curve.percent(3.7) - 50.0).abs() < 0.001);
//! assert_eq!(curve.percent(4.5), 100.0);
//! ```

/// Voltage-to-percentage strategy
pub trait BatteryCurve: Send + Sync + std::fmt::Debug {
    /// Charge percentage for a cell voltage, always within 0-100
    fn percent(&self, voltage: f32) -> f32;
}

/// Straight line between an empty and a full voltage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearBatteryCurve {
    empty_voltage: f32,
    full_voltage: f32,
}

impl Default for LinearBatteryCurve {
    fn default() -> Self {
        Self {
            empty_voltage: 3.2,
            full_voltage: 4.2,
        }
    }
}

impl LinearBatteryCurve {
    /// Creates a curve between `empty_voltage` (0%) and `full_voltage` (100%).
    ///
    /// Callers are expected to pass `empty_voltage < full_voltage`; the
    /// configuration layer enforces it.
    #[must_use]
    pub fn new(empty_voltage: f32, full_voltage: f32) -> Self {
        Self {
            empty_voltage,
            full_voltage,
        }
    }
}

impl BatteryCurve for LinearBatteryCurve {
    fn percent(&self, voltage: f32) -> f32 {
        if voltage.is_nan() {
            return 0.0;
        }

        let percent =
            (voltage - self.empty_voltage) / (self.full_voltage - self.empty_voltage) * 100.0;
        percent.clamp(0.0, 100.0)
    }
}

/// ADC front end: reference voltage, resolution and divider resistors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoltageDivider {
    reference_voltage: f32,
    adc_resolution: u32,
    r1: f32,
    r2: f32,
    calibration_factor: f32,
}

impl Default for VoltageDivider {
    fn default() -> Self {
        Self {
            reference_voltage: 3.3,
            adc_resolution: 4096,
            r1: 100_000.0,
            r2: 10_000.0,
            calibration_factor: 1.0,
        }
    }
}

impl VoltageDivider {
    #[must_use]
    pub fn new(
        reference_voltage: f32,
        adc_resolution: u32,
        r1: f32,
        r2: f32,
        calibration_factor: f32,
    ) -> Self {
        Self {
            reference_voltage,
            adc_resolution,
            r1,
            r2,
            calibration_factor,
        }
    }

    /// Volts per ADC count at the cell, after the divider
    #[must_use]
    pub fn scale(&self) -> f32 {
        (self.reference_voltage / self.adc_resolution as f32) * (self.r1 + self.r2) / self.r2
            * self.calibration_factor
    }

    /// Cell voltage for one raw ADC sample
    #[must_use]
    pub fn to_voltage(&self, raw: u16) -> f32 {
        f32::from(raw) * self.scale()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_curve_endpoints() {
        let curve = LinearBatteryCurve::default();
        assert_eq!(curve.percent(3.2), 0.0);
        assert_eq!(curve.percent(4.2), 100.0);
    }

    #[test]
    fn test_linear_curve_clamps_outside_range() {
        let curve = LinearBatteryCurve::default();
        assert_eq!(curve.percent(0.0), 0.0);
        assert_eq!(curve.percent(-5.0), 0.0);
        assert_eq!(curve.percent(3.1), 0.0);
        assert_eq!(curve.percent(4.3), 100.0);
        assert_eq!(curve.percent(36.0), 100.0);
    }

    #[test]
    fn test_linear_curve_is_monotonic_and_bounded() {
        let curve = LinearBatteryCurve::default();
        let mut previous = curve.percent(2.0);

        for step in 0..=3000 {
            let voltage = 2.0 + step as f32 * 0.001;
            let percent = curve.percent(voltage);
            assert!((0.0..=100.0).contains(&percent), "{} V -> {}%", voltage, percent);
            assert!(percent >= previous, "not monotonic at {} V", voltage);
            previous = percent;
        }
    }

    #[test]
    fn test_linear_curve_non_finite_voltage() {
        let curve = LinearBatteryCurve::default();
        assert_eq!(curve.percent(f32::NAN), 0.0);
        assert_eq!(curve.percent(f32::INFINITY), 100.0);
        assert_eq!(curve.percent(f32::NEG_INFINITY), 0.0);
    }

    #[test]
    fn test_linear_curve_monotonic_up_to_infinity() {
        let curve = LinearBatteryCurve::default();
        let voltages = [f32::NEG_INFINITY, -1.0, 3.2, 3.5, 4.2, 1e30, f32::INFINITY];

        for pair in voltages.windows(2) {
            assert!(
                curve.percent(pair[0]) <= curve.percent(pair[1]),
                "{} -> {} not monotonic",
                pair[0],
                pair[1]
            );
        }
        assert_eq!(curve.percent(1e30), 100.0);
    }

    #[test]
    fn test_custom_curve_range() {
        let curve = LinearBatteryCurve::new(3.0, 4.0);
        assert!((curve.percent(3.25) - 25.0).abs() < 0.001);
    }

    #[test]
    fn test_divider_default_scale() {
        let divider = VoltageDivider::default();
        // 3.3 / 4096 * 11
        assert!((divider.scale() - 0.008_862_3).abs() < 1e-6);
        assert_eq!(divider.to_voltage(0), 0.0);
    }

    #[test]
    fn test_divider_calibration_factor() {
        let plain = VoltageDivider::default();
        let calibrated = VoltageDivider::new(3.3, 4096, 100_000.0, 10_000.0, 1.1);
        let raw = 440;
        assert!((calibrated.to_voltage(raw) - plain.to_voltage(raw) * 1.1).abs() < 1e-4);
    }
}
