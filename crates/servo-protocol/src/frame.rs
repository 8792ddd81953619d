//! Command Frame Layout
//!
//! Every frame on the wire is exactly five bytes with no delimiter or
//! length prefix:
//!
//! | byte | meaning       |
//! |------|---------------|
//! | 0    | command code  |
//! | 1..4 | payload       |
//! | 4    | checksum slot |

use crate::command;
use serde::{Deserialize, Serialize};

/// Width of one frame on the wire (bytes)
pub const FRAME_WIDTH: usize = 5;

/// Number of payload bytes in a frame
pub const PAYLOAD_LEN: usize = 3;

/// One fixed-width record extracted from the byte stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommandFrame {
    /// Command code
    pub command: u8,
    /// Command arguments
    pub payload: [u8; PAYLOAD_LEN],
    /// Trailing byte, nominally an XOR checksum
    pub checksum: u8,
}

impl CommandFrame {
    /// Build a frame with a valid XOR checksum
    pub fn new(command: u8, payload: [u8; PAYLOAD_LEN]) -> Self {
        let mut frame = Self {
            command,
            payload,
            checksum: 0,
        };
        frame.checksum = frame.expected_checksum();
        frame
    }

    /// Build a "set servo positions" frame as the host sends it
    pub fn set_servo_positions(leg1: u8, leg2: u8) -> Self {
        Self::new(command::SET_SERVO_POSITIONS, [leg1, leg2, 0])
    }

    /// Interpret raw wire bytes
    pub fn from_bytes(bytes: &[u8; FRAME_WIDTH]) -> Self {
        Self {
            command: bytes[0],
            payload: [bytes[1], bytes[2], bytes[3]],
            checksum: bytes[4],
        }
    }

    /// Serialize to wire bytes
    pub fn to_bytes(&self) -> [u8; FRAME_WIDTH] {
        [
            self.command,
            self.payload[0],
            self.payload[1],
            self.payload[2],
            self.checksum,
        ]
    }

    /// XOR of the command byte and payload
    pub fn expected_checksum(&self) -> u8 {
        self.payload.iter().fold(self.command, |acc, &b| acc ^ b)
    }

    /// Whether the trailing byte matches `expected_checksum`
    pub fn checksum_valid(&self) -> bool {
        self.checksum == self.expected_checksum()
    }
}

impl From<[u8; FRAME_WIDTH]> for CommandFrame {
    fn from(bytes: [u8; FRAME_WIDTH]) -> Self {
        Self::from_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_order() {
        let frame = CommandFrame::from_bytes(&[0x01, 45, 135, 0, 0xAA]);
        assert_eq!(frame.command, 0x01);
        assert_eq!(frame.payload, [45, 135, 0]);
        assert_eq!(frame.checksum, 0xAA);
        assert_eq!(frame.to_bytes(), [0x01, 45, 135, 0, 0xAA]);
    }

    #[test]
    fn test_set_servo_positions_checksum() {
        let frame = CommandFrame::set_servo_positions(80, 45);
        assert_eq!(frame.to_bytes(), [0x01, 80, 45, 0, 0x01 ^ 80 ^ 45]);
        assert!(frame.checksum_valid());
    }

    #[test]
    fn test_zero_trailing_byte_is_not_a_valid_checksum() {
        let frame = CommandFrame::from([0x01, 45, 135, 0, 0]);
        assert!(!frame.checksum_valid());
        assert_eq!(frame.expected_checksum(), 0x01 ^ 45 ^ 135);
    }
}
