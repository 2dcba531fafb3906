//! Raw output frame and 12-bit sample decoding

use crate::error::{Mma8452qError, Result};

/// Bytes in one status + X/Y/Z burst read
pub const FRAME_LEN: usize = 7;

/// Largest positive 12-bit count
const MAX_COUNT: i16 = 2047;
/// 2^12, subtracted to sign-extend
const COUNT_SPAN: i16 = 4096;

/// One burst read starting at the status register
///
/// Byte 0 is STATUS, then X/Y/Z as MSB/LSB pairs holding left-justified
/// 12-bit samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame([u8; FRAME_LEN]);

impl RawFrame {
    pub fn new(bytes: [u8; FRAME_LEN]) -> Self {
        Self(bytes)
    }

    /// Build a frame from a received buffer, rejecting any other length
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let frame: [u8; FRAME_LEN] = bytes.try_into().map_err(|_| Mma8452qError::MalformedFrame {
            expected: FRAME_LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(frame))
    }

    /// STATUS register contents. Read along with the axes but not interpreted.
    pub fn status(&self) -> u8 {
        self.0[0]
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    fn axis(&self, msb: usize) -> i16 {
        decode_axis(self.0[msb], self.0[msb + 1])
    }
}

/// Raw 12-bit acceleration counts, each in [-2048, 2047]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Acceleration {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

/// Decode one axis from its MSB/LSB register pair
pub fn decode_axis(msb: u8, lsb: u8) -> i16 {
    // Left-justified: the low nibble of the LSB is padding
    let raw = (u16::from_be_bytes([msb, lsb]) >> 4) as i16;
    if raw > MAX_COUNT {
        raw - COUNT_SPAN
    } else {
        raw
    }
}

/// Decode X, Y and Z from a frame. The status byte is ignored.
pub fn decode(frame: &RawFrame) -> Acceleration {
    Acceleration {
        x: frame.axis(1),
        y: frame.axis(3),
        z: frame.axis(5),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Place a 12-bit count into MSB/LSB the way the device does
    fn pack(count: u16) -> (u8, u8) {
        let word = count << 4;
        ((word >> 8) as u8, word as u8)
    }

    #[test]
    fn test_twos_complement_boundaries() {
        let cases = [(2047u16, 2047i16), (2048, -2048), (4095, -1), (0, 0), (1, 1)];
        for (count, expected) in cases {
            let (msb, lsb) = pack(count);
            assert_eq!(decode_axis(msb, lsb), expected, "count {count}");
        }
    }

    #[test]
    fn test_byte_packing() {
        assert_eq!(decode_axis(0x7F, 0xF0), 2047);
        assert_eq!(decode_axis(0x80, 0x00), -2048);
    }

    #[test]
    fn test_padding_nibble_is_discarded() {
        assert_eq!(decode_axis(0x01, 0x0F), 16);
        assert_eq!(decode_axis(0xFF, 0xFF), -1);
    }

    #[test]
    fn test_decode_reference_frame() {
        let frame = RawFrame::new([0x00, 0x01, 0x00, 0x02, 0x10, 0xFF, 0xF0]);
        assert_eq!(decode(&frame), Acceleration { x: 16, y: 33, z: -1 });
    }

    #[test]
    fn test_decode_is_deterministic() {
        let frame = RawFrame::new([0x0F, 0x9A, 0xB0, 0x12, 0x30, 0x80, 0x10]);
        assert_eq!(decode(&frame), decode(&frame));
    }

    #[test]
    fn test_axes_decode_independently() {
        let frame = RawFrame::new([0xFF, 0x80, 0x00, 0x00, 0x00, 0x7F, 0xF0]);
        let accel = decode(&frame);
        assert_eq!(accel, Acceleration { x: -2048, y: 0, z: 2047 });
    }

    #[test]
    fn test_status_byte_does_not_affect_decoding() {
        let a = RawFrame::new([0x00, 0x12, 0x30, 0x45, 0x60, 0x78, 0x90]);
        let b = RawFrame::new([0xFF, 0x12, 0x30, 0x45, 0x60, 0x78, 0x90]);
        assert_eq!(b.status(), 0xFF);
        assert_eq!(decode(&a), decode(&b));
    }

    #[test]
    fn test_short_buffer_is_malformed() {
        let err = RawFrame::from_bytes(&[0x00, 0x01, 0x00]).unwrap_err();
        assert!(matches!(
            err,
            Mma8452qError::MalformedFrame { expected: 7, actual: 3 }
        ));
        assert!(RawFrame::from_bytes(&[0u8; 8]).is_err());
        assert!(RawFrame::from_bytes(&[0u8; 7]).is_ok());
    }
}
