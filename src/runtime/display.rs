//! # Status Display
//!
//! Receives the node's status on every display refresh.

use std::fmt;

use tracing::info;

use crate::error::Result;
use crate::sampler::Reading;

/// What the status display shows
#[derive(Debug, Clone, PartialEq)]
pub struct StatusLine {
    pub node_id: u8,
    pub touch_value: i32,
    pub battery_percent: f32,
}

impl StatusLine {
    #[must_use]
    pub fn new(node_id: u8, reading: &Reading) -> Self {
        Self {
            node_id,
            touch_value: reading.touch_value,
            battery_percent: reading.battery_percent,
        }
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {} | Touch: {} | Battery: {:.1}%",
            self.node_id, self.touch_value, self.battery_percent
        )
    }
}

/// Output device for the status line
pub trait StatusDisplay: Send {
    fn show(&mut self, status: &StatusLine) -> Result<()>;
}

/// Writes the status line to the log
#[derive(Debug, Default)]
pub struct LogDisplay;

impl StatusDisplay for LogDisplay {
    fn show(&mut self, status: &StatusLine) -> Result<()> {
        info!("{}", status);
        Ok(())
    }
}
