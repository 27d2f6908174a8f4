//! # Radio Frame Encoder
//!
//! Encodes readings into the fixed 40-byte radio frame.

use bytes::{BufMut, Bytes, BytesMut};

use super::protocol::*;
use crate::sampler::Reading;

/// Encode a frame
///
/// # Arguments
///
/// * `frame` - Frame to encode
///
/// # Returns
///
/// * `Bytes` - Exactly [`FRAME_SIZE`] bytes
///
/// Client ids longer than 31 bytes are truncated (on a character boundary)
/// so the field always keeps its NUL terminator.
///
/// # Examples
///
/// ```
/// use touch_telemetry::frame::encoder::encode_frame;
/// use touch_telemetry::frame::protocol::{RadioFrame, FRAME_SIZE};
///
/// let frame = RadioFrame { client_id: "7".into(), touch_value: 1, battery_percent: 55.0 };
/// assert_eq!(encode_frame(&frame).len(), FRAME_SIZE);
/// ```
pub fn encode_frame(frame: &RadioFrame) -> Bytes {
    let mut buf = BytesMut::with_capacity(FRAME_SIZE);

    buf.put_slice(&encode_client_id(&frame.client_id));
    buf.put_i32_le(frame.touch_value);
    buf.put_f32_le(frame.battery_percent);

    buf.freeze()
}

/// Encode a reading straight into a frame
pub fn encode_reading(reading: &Reading) -> Bytes {
    encode_frame(&RadioFrame::from_reading(reading))
}

/// Encode the client id field: text, NUL terminator, zero padding
///
/// # Returns
///
/// * `[u8; 32]` - Field bytes
pub fn encode_client_id(client_id: &str) -> [u8; FRAME_CLIENT_ID_SIZE] {
    let mut field = [0u8; FRAME_CLIENT_ID_SIZE];

    let mut len = client_id.len().min(FRAME_CLIENT_ID_MAX_LEN);
    while !client_id.is_char_boundary(len) {
        len -= 1;
    }

    field[..len].copy_from_slice(&client_id.as_bytes()[..len]);
    field
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_frame_length() {
        let frame = encode_reading(&Reading::new("15", 0, 0.0));
        assert_eq!(frame.len(), FRAME_SIZE);
    }

    #[test]
    fn test_encode_frame_layout() {
        let frame = encode_reading(&Reading::new("7", 1, 55.0));

        assert_eq!(frame[0], b'7');
        assert_eq!(&frame[1..FRAME_CLIENT_ID_SIZE], &[0u8; 31][..]);
        assert_eq!(&frame[FRAME_TOUCH_OFFSET..FRAME_BATTERY_OFFSET], &1i32.to_le_bytes());
        assert_eq!(&frame[FRAME_BATTERY_OFFSET..FRAME_SIZE], &55.0f32.to_le_bytes());
    }

    #[test]
    fn test_encode_negative_touch_value() {
        let frame = encode_frame(&RadioFrame {
            client_id: "1".to_string(),
            touch_value: -2,
            battery_percent: 10.0,
        });
        assert_eq!(&frame[FRAME_TOUCH_OFFSET..FRAME_BATTERY_OFFSET], &[0xFE, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_encode_client_id_truncates_and_terminates() {
        let long = "x".repeat(40);
        let field = encode_client_id(&long);

        assert_eq!(&field[..31], "x".repeat(31).as_bytes());
        assert_eq!(field[31], 0);
    }

    #[test]
    fn test_encode_client_id_respects_char_boundary() {
        // 30 ASCII bytes + a 2-byte character would straddle byte 31
        let id = format!("{}é", "a".repeat(30));
        let field = encode_client_id(&id);

        assert_eq!(&field[..30], "a".repeat(30).as_bytes());
        assert_eq!(field[30], 0);
        assert_eq!(field[31], 0);
    }

    #[test]
    fn test_encode_empty_client_id() {
        assert_eq!(encode_client_id(""), [0u8; FRAME_CLIENT_ID_SIZE]);
    }
}
