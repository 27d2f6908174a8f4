//! # Radio Frame Decoder
//!
//! Decodes received radio frames.

use bytes::Buf;

use super::protocol::*;
use crate::error::{Result, TelemetryError};

/// Decode a complete radio frame
///
/// # Arguments
///
/// * `data` - Received bytes
///
/// # Returns
///
/// * `Result<RadioFrame>` - Decoded frame, or error if invalid
///
/// # Errors
///
/// Returns error if the frame is not exactly [`FRAME_SIZE`] bytes long.
/// Invalid UTF-8 in the client id is replaced rather than rejected.
pub fn decode_frame(data: &[u8]) -> Result<RadioFrame> {
    if data.len() != FRAME_SIZE {
        return Err(TelemetryError::Frame(format!(
            "Frame size {} does not match expected {}",
            data.len(),
            FRAME_SIZE
        )));
    }

    let client_id = decode_client_id(&data[..FRAME_CLIENT_ID_SIZE]);

    let mut rest = &data[FRAME_TOUCH_OFFSET..];
    let touch_value = rest.get_i32_le();
    let battery_percent = rest.get_f32_le();

    Ok(RadioFrame {
        client_id,
        touch_value,
        battery_percent,
    })
}

/// Decode the client id field: text up to the first NUL.
///
/// A field with no terminator is taken whole.
pub fn decode_client_id(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::encoder::{encode_frame, encode_reading};
    use crate::sampler::Reading;

    #[test]
    fn test_decode_frame_too_short() {
        let result = decode_frame(&[0u8; FRAME_SIZE - 1]);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_frame_too_long() {
        let result = decode_frame(&[0u8; FRAME_SIZE + 1]);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_reading_round_trip() {
        let frame = encode_reading(&Reading::new("7", 1, 55.0));
        let reading = decode_frame(&frame).unwrap().into_reading();

        assert_eq!(reading.node_id, "7");
        assert_eq!(reading.touch_value, 1);
        assert!((reading.battery_percent - 55.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_decode_hand_built_frame() {
        let mut data = [0u8; FRAME_SIZE];
        data[..2].copy_from_slice(b"12");
        data[32..36].copy_from_slice(&0i32.to_le_bytes());
        data[36..40].copy_from_slice(&87.3f32.to_le_bytes());

        let frame = decode_frame(&data).unwrap();
        assert_eq!(frame.client_id, "12");
        assert_eq!(frame.touch_value, 0);
        assert!((frame.battery_percent - 87.3).abs() < 0.001);
    }

    #[test]
    fn test_decode_ignores_bytes_after_terminator() {
        let mut data = encode_frame(&RadioFrame {
            client_id: "3".to_string(),
            touch_value: 1,
            battery_percent: 1.0,
        })
        .to_vec();
        data[5] = b'Z';

        assert_eq!(decode_frame(&data).unwrap().client_id, "3");
    }

    #[test]
    fn test_decode_unterminated_client_id() {
        let field = [b'a'; FRAME_CLIENT_ID_SIZE];
        assert_eq!(decode_client_id(&field), "a".repeat(32));
    }

    #[test]
    fn test_decode_invalid_utf8_client_id() {
        let mut field = [0u8; FRAME_CLIENT_ID_SIZE];
        field[0] = b'4';
        field[1] = 0xFF;
        assert_eq!(decode_client_id(&field), "4\u{FFFD}");
    }
}
