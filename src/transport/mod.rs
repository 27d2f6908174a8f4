//! # Transport Module
//!
//! Delivers local readings to a collector.
//!
//! This module handles:
//! - The binary frame over the point-to-point radio link
//! - Form-encoded HTTP push
//! - Delivery status reporting
//! - Receiving radio frames into the aggregation store
//!
//! Delivery is fire-and-forget. A failed send is reported and the reading
//! is dropped; the next tick sends a fresh one.

pub mod http;
pub mod radio;
pub mod sender;

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::Result;
use crate::frame::protocol::PeerAddress;
use crate::sampler::Reading;

pub use http::HttpPushTransport;
pub use radio::{RadioLink, RadioReceiver, RadioTransport, UdpRadioLink};
pub use sender::TransportSender;

/// Outcome of one radio send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStatus {
    Success,
    Failure,
}

/// Strategy for pushing a reading to its collector
#[async_trait]
pub trait TelemetryTransport: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Sends one reading. No retry.
    async fn deliver(&self, reading: &Reading) -> Result<()>;
}

/// Receives the result of each radio send once it completes
#[cfg_attr(test, mockall::automock)]
pub trait SendStatusObserver: Send + Sync {
    fn on_send_status(&self, peer: &PeerAddress, status: SendStatus);
}

/// Observer that logs each outcome and keeps running counts
#[derive(Debug, Default)]
pub struct LoggingObserver {
    delivered: AtomicU64,
    failed: AtomicU64,
}

impl LoggingObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `(delivered, failed)` since start
    pub fn counts(&self) -> (u64, u64) {
        (
            self.delivered.load(Ordering::Relaxed),
            self.failed.load(Ordering::Relaxed),
        )
    }
}

impl SendStatusObserver for LoggingObserver {
    fn on_send_status(&self, peer: &PeerAddress, status: SendStatus) {
        match status {
            SendStatus::Success => {
                self.delivered.fetch_add(1, Ordering::Relaxed);
                info!(peer = %peer, "Last Packet Send Status: Delivery Success");
            }
            SendStatus::Failure => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                warn!(peer = %peer, "Last Packet Send Status: Delivery Fail");
            }
        }
    }
}
