//! Servo Link Error Types

use byte_ring::RingError;
use thiserror::Error;

/// Errors that can occur while framing or interpreting commands
///
/// None of these are fatal to the control loop: they are logged and the
/// loop keeps driving the actuators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Receive ring was full when a byte arrived
    ///
    /// The decoder never returns this itself: ingestion counts overflows in
    /// `IngestReport` and keeps going. It exists so callers pushing into the
    /// ring directly can convert a `RingError` with `?`.
    #[error("Receive buffer overflow (capacity {capacity} bytes)")]
    BufferOverflow { capacity: usize },

    /// Decoded frame carried an unrecognized command code
    #[error("Unknown command code {0:02X}")]
    UnknownCommand(u8),

    /// Trailing byte did not match the XOR of the frame body
    #[error("Checksum mismatch: expected {expected:02X}, got {actual:02X}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    /// Ring cannot hold a full frame with room to spare
    #[error("Ring capacity {capacity} must exceed frame width {frame_width}")]
    CapacityTooSmall { capacity: usize, frame_width: usize },

    /// Decoder asked the ring for more bytes than it holds
    #[error("Ring underflow: requested {requested}, available {available}")]
    Underflow { requested: usize, available: usize },
}

impl From<RingError> for ProtocolError {
    fn from(err: RingError) -> Self {
        match err {
            RingError::BufferOverflow { capacity } => ProtocolError::BufferOverflow { capacity },
            RingError::Underflow {
                requested,
                available,
            } => ProtocolError::Underflow {
                requested,
                available,
            },
        }
    }
}
