//! # Radio Transport
//!
//! Point-to-point radio delivery of the 40-byte frame.
//!
//! On a host the link is carried by UDP datagrams: one frame per datagram,
//! sent to the configured link address. The peer's hardware address is
//! kept for registration and status reporting.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

use super::{SendStatus, SendStatusObserver, TelemetryTransport};
use crate::aggregation::AggregationStore;
use crate::error::{Result, TelemetryError};
use crate::frame::decoder::decode_frame;
use crate::frame::encoder::encode_reading;
use crate::frame::protocol::{PeerAddress, FRAME_SIZE};
use crate::sampler::Reading;

/// Receive buffer; anything longer than a frame is rejected after decode
const RECV_BUFFER_SIZE: usize = 256;

/// Trait for the raw frame link
#[async_trait]
pub trait RadioLink: Send + Sync {
    /// Send one frame to `peer`
    async fn send_frame(&self, peer: &PeerAddress, frame: &[u8]) -> io::Result<()>;
}

/// Radio link over a UDP socket
#[derive(Debug)]
pub struct UdpRadioLink {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpRadioLink {
    /// Bind the local socket and fix the delivery address
    ///
    /// # Arguments
    ///
    /// * `bind_address` - Local address, e.g. `0.0.0.0:0`
    /// * `target` - Address of the collector's receiver
    pub async fn bind(bind_address: &str, target: &str) -> Result<Self> {
        let target: SocketAddr = target
            .parse()
            .map_err(|e| {
                TelemetryError::Transport(format!("Invalid link address {}: {}", target, e))
            })?;
        let socket = UdpSocket::bind(bind_address).await?;

        debug!(local = ?socket.local_addr().ok(), %target, "Radio link bound");

        Ok(Self { socket, target })
    }
}

#[async_trait]
impl RadioLink for UdpRadioLink {
    async fn send_frame(&self, _peer: &PeerAddress, frame: &[u8]) -> io::Result<()> {
        let sent = self.socket.send_to(frame, self.target).await?;
        if sent != frame.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("Short send: {} of {} bytes", sent, frame.len()),
            ));
        }
        Ok(())
    }
}

/// Sends readings as radio frames to one registered peer
pub struct RadioTransport {
    link: Box<dyn RadioLink>,
    peer: PeerAddress,
    channel: u8,
    observer: Arc<dyn SendStatusObserver>,
}

impl std::fmt::Debug for RadioTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RadioTransport")
            .field("peer", &self.peer)
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}

impl RadioTransport {
    /// Register `peer` on `channel` and report every send to `observer`
    pub fn new(
        link: Box<dyn RadioLink>,
        peer: PeerAddress,
        channel: u8,
        observer: Arc<dyn SendStatusObserver>,
    ) -> Self {
        info!(peer = %peer, channel, "Radio peer registered");
        Self {
            link,
            peer,
            channel,
            observer,
        }
    }
}

#[async_trait]
impl TelemetryTransport for RadioTransport {
    fn name(&self) -> &'static str {
        "radio"
    }

    async fn deliver(&self, reading: &Reading) -> Result<()> {
        let frame = encode_reading(reading);

        match self.link.send_frame(&self.peer, &frame).await {
            Ok(()) => {
                self.observer.on_send_status(&self.peer, SendStatus::Success);
                Ok(())
            }
            Err(e) => {
                self.observer.on_send_status(&self.peer, SendStatus::Failure);
                Err(TelemetryError::Transport(format!(
                    "Radio send to {} failed: {}",
                    self.peer, e
                )))
            }
        }
    }
}

/// Collector side of the radio link
///
/// Each valid frame is stored under the sender's IP address.
#[derive(Debug)]
pub struct RadioReceiver {
    socket: UdpSocket,
    store: Arc<AggregationStore>,
}

impl RadioReceiver {
    pub async fn bind(bind_address: &str, store: Arc<AggregationStore>) -> Result<Self> {
        let socket = UdpSocket::bind(bind_address).await?;
        Ok(Self { socket, store })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Receive until the socket fails
    pub async fn run(self) -> Result<()> {
        info!(address = ?self.socket.local_addr().ok(), "Radio receiver listening");

        let mut buf = [0u8; RECV_BUFFER_SIZE];
        loop {
            let (len, source) = self.socket.recv_from(&mut buf).await?;
            if let Err(e) = self.handle_datagram(&buf[..len], source) {
                warn!(%source, len, expected = FRAME_SIZE, "Dropping radio frame: {}", e);
            }
        }
    }

    /// Decode one datagram and upsert it
    pub fn handle_datagram(&self, data: &[u8], source: SocketAddr) -> Result<Reading> {
        let reading = decode_frame(data)?.into_reading();
        self.store.upsert(&source.ip().to_string(), reading.clone());
        Ok(reading)
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Link that records sent frames
    #[derive(Clone, Default)]
    pub struct RecordingLink {
        pub sent: Arc<Mutex<Vec<(PeerAddress, Vec<u8>)>>>,
        pub send_error: Arc<Mutex<Option<io::ErrorKind>>>,
    }

    impl RecordingLink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn sent(&self) -> Vec<(PeerAddress, Vec<u8>)> {
            self.sent.lock().unwrap().clone()
        }

        pub fn set_send_error(&self, error: io::ErrorKind) {
            *self.send_error.lock().unwrap() = Some(error);
        }
    }

    #[async_trait]
    impl RadioLink for RecordingLink {
        async fn send_frame(&self, peer: &PeerAddress, frame: &[u8]) -> io::Result<()> {
            if let Some(error) = *self.send_error.lock().unwrap() {
                return Err(io::Error::new(error, "Mock send error"));
            }
            self.sent.lock().unwrap().push((*peer, frame.to_vec()));
            Ok(())
        }
    }
}
