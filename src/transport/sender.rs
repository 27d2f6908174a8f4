//! # Transport Sender
//!
//! Samples the local sensors and pushes the reading through the
//! configured transport.

use std::sync::Arc;

use tracing::{info, warn};

use super::TelemetryTransport;
use crate::error::Result;
use crate::identity::IdentityAssigner;
use crate::sampler::{Reading, TelemetrySampler};

pub struct TransportSender {
    sampler: Arc<TelemetrySampler>,
    identity: Arc<IdentityAssigner>,
    transport: Box<dyn TelemetryTransport>,
}

impl std::fmt::Debug for TransportSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportSender")
            .field("transport", &self.transport.name())
            .finish_non_exhaustive()
    }
}

impl TransportSender {
    pub fn new(
        sampler: Arc<TelemetrySampler>,
        identity: Arc<IdentityAssigner>,
        transport: Box<dyn TelemetryTransport>,
    ) -> Self {
        Self {
            sampler,
            identity,
            transport,
        }
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    /// Sample under the current identity and deliver once
    pub async fn send_once(&self) -> Result<Reading> {
        let reading = self.sampler.read_blocking(self.identity.get()).await?;
        self.transport.deliver(&reading).await?;

        info!(
            transport = self.transport.name(),
            "Sent - ID: {}, Touch: {}, Battery: {:.1}%",
            reading.node_id,
            reading.touch_value,
            reading.battery_percent
        );

        Ok(reading)
    }

    /// One send tick. Failures are logged and the reading dropped.
    pub async fn tick(&self) -> bool {
        match self.send_once().await {
            Ok(_) => true,
            Err(e) => {
                warn!(transport = self.transport.name(), "Send failed: {}", e);
                false
            }
        }
    }
}
