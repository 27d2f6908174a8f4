//! Linux sysfs implementations of the hardware traits.
//!
//! GPIO pins are read from `/sys/class/gpio/gpioN/value` and the battery
//! ADC from an IIO channel such as
//! `/sys/bus/iio/devices/iio:device0/in_voltage0_raw`. Each read reopens the
//! file, which is how sysfs attributes are meant to be polled.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{BatteryAdc, ButtonInput, ContactSensor};
use crate::error::{Result, TelemetryError};

/// A single sysfs attribute file holding an integer value
#[derive(Debug, Clone)]
pub struct SysfsValue {
    path: PathBuf,
}

impl SysfsValue {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the attribute file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the attribute as an unsigned integer
    fn read_u32(&self) -> Result<u32> {
        let contents = fs::read_to_string(&self.path).map_err(|e| {
            TelemetryError::Sensor(format!("Failed to read {}: {}", self.path.display(), e))
        })?;

        contents.trim().parse::<u32>().map_err(|e| {
            TelemetryError::Sensor(format!(
                "Unexpected value {:?} in {}: {}",
                contents.trim(),
                self.path.display(),
                e
            ))
        })
    }
}

/// GPIO input read through sysfs (`0` = low, anything else = high)
#[derive(Debug, Clone)]
pub struct SysfsGpio {
    value: SysfsValue,
}

impl SysfsGpio {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            value: SysfsValue::new(path),
        }
    }

    fn read_high(&self) -> Result<bool> {
        let level = self.value.read_u32()? != 0;
        debug!("GPIO {} level: {}", self.value.path().display(), level);
        Ok(level)
    }
}

impl ContactSensor for SysfsGpio {
    fn read_contact(&mut self) -> Result<bool> {
        self.read_high()
    }
}

impl ButtonInput for SysfsGpio {
    fn read_level(&mut self) -> Result<bool> {
        self.read_high()
    }
}

/// IIO ADC channel read through sysfs
#[derive(Debug, Clone)]
pub struct SysfsAdc {
    value: SysfsValue,
}

impl SysfsAdc {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            value: SysfsValue::new(path),
        }
    }
}

impl BatteryAdc for SysfsAdc {
    fn read_raw(&mut self) -> Result<u16> {
        let raw = self.value.read_u32()?;
        u16::try_from(raw).map_err(|_| {
            TelemetryError::Sensor(format!(
                "ADC value {} from {} exceeds 16 bits",
                raw,
                self.value.path().display()
            ))
        })
    }
}
