//! # Radio Frame Constants and Types
//!
//! Frame layout (40 bytes, little-endian, no padding):
//!
//! ```text
//! offset  size  field
//!      0    32  client_id       NUL-terminated text
//!     32     4  touch_value     i32
//!     36     4  battery_percent f32 (IEEE 754)
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TelemetryError};
use crate::sampler::Reading;

/// Size of the client id field, including the terminating NUL
pub const FRAME_CLIENT_ID_SIZE: usize = 32;

/// Byte offset of the touch value
pub const FRAME_TOUCH_OFFSET: usize = 32;

/// Byte offset of the battery percentage
pub const FRAME_BATTERY_OFFSET: usize = 36;

/// Total frame size
pub const FRAME_SIZE: usize = 40;

/// Longest client id that fits with its terminator
pub const FRAME_CLIENT_ID_MAX_LEN: usize = FRAME_CLIENT_ID_SIZE - 1;

/// Radio channel used for the peer link (0 = follow the current channel)
pub const DEFAULT_RADIO_CHANNEL: u8 = 0;

/// Highest 2.4 GHz channel number accepted for the peer link
pub const MAX_RADIO_CHANNEL: u8 = 14;

/// Decoded radio frame
#[derive(Debug, Clone, PartialEq)]
pub struct RadioFrame {
    /// Sender's node identity as text
    pub client_id: String,
    /// Contact state
    pub touch_value: i32,
    /// Battery charge percentage
    pub battery_percent: f32,
}

impl RadioFrame {
    /// Builds a frame from a reading
    #[must_use]
    pub fn from_reading(reading: &Reading) -> Self {
        Self {
            client_id: reading.node_id.clone(),
            touch_value: reading.touch_value,
            battery_percent: reading.battery_percent,
        }
    }

    /// Converts the frame into a reading (battery clamped into 0-100)
    #[must_use]
    pub fn into_reading(self) -> Reading {
        Reading::new(self.client_id, self.touch_value, self.battery_percent)
    }
}

/// 6-byte hardware address of a radio peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerAddress(pub [u8; 6]);

impl PeerAddress {
    /// Broadcast address
    pub const BROADCAST: PeerAddress = PeerAddress([0xFF; 6]);

    #[must_use]
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}", a, b, c, d, e, g)
    }
}

impl FromStr for PeerAddress {
    type Err = TelemetryError;

    /// Parses `AA:BB:CC:DD:EE:FF` (also accepts `-` separators)
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || TelemetryError::Frame(format!("Invalid peer address: {:?}", s));

        let parts: Vec<&str> = s.trim().split([':', '-']).collect();
        if parts.len() != 6 {
            return Err(invalid());
        }

        let mut octets = [0u8; 6];
        for (octet, part) in octets.iter_mut().zip(parts) {
            if part.len() != 2 {
                return Err(invalid());
            }
            *octet = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }

        Ok(PeerAddress(octets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_constants() {
        assert_eq!(FRAME_CLIENT_ID_SIZE, 32);
        assert_eq!(FRAME_TOUCH_OFFSET, FRAME_CLIENT_ID_SIZE);
        assert_eq!(FRAME_BATTERY_OFFSET, FRAME_TOUCH_OFFSET + 4);
        assert_eq!(FRAME_SIZE, FRAME_BATTERY_OFFSET + 4);
        assert_eq!(FRAME_SIZE, 40);
    }

    #[test]
    fn test_peer_address_parse_and_display() {
        let peer: PeerAddress = "24:6f:28:12:34:56".parse().unwrap();
        assert_eq!(peer.octets(), [0x24, 0x6F, 0x28, 0x12, 0x34, 0x56]);
        assert_eq!(peer.to_string(), "24:6F:28:12:34:56");
    }

    #[test]
    fn test_peer_address_dash_separator() {
        let peer: PeerAddress = "FF-FF-FF-FF-FF-FF".parse().unwrap();
        assert_eq!(peer, PeerAddress::BROADCAST);
    }

    #[test]
    fn test_peer_address_invalid() {
        let invalid = [
            "",
            "24:6F:28:12:34",
            "24:6F:28:12:34:56:78",
            "24:6F:28:12:34:ZZ",
            "246:F:28:12:34:56",
        ];
        for s in invalid {
            assert!(s.parse::<PeerAddress>().is_err(), "{:?} should not parse", s);
        }
    }

    #[test]
    fn test_frame_reading_conversion() {
        let reading = Reading::new("3", 1, 87.3);
        let frame = RadioFrame::from_reading(&reading);
        assert_eq!(frame.client_id, "3");
        assert_eq!(frame.into_reading(), reading);
    }

    #[test]
    fn test_into_reading_clamps_battery() {
        let frame = RadioFrame {
            client_id: "1".to_string(),
            touch_value: 0,
            battery_percent: 250.0,
        };
        assert_eq!(frame.into_reading().battery_percent, 100.0);
    }
}
