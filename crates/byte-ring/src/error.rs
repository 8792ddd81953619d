//! Ring Error Types

use thiserror::Error;

/// Errors reported by `ByteRing`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RingError {
    /// Push attempted while the ring already held `capacity` unread bytes
    #[error("Ring buffer overflow (capacity {capacity} bytes)")]
    BufferOverflow { capacity: usize },

    /// Pop requested more bytes than are unread
    #[error("Requested {requested} bytes but only {available} available")]
    Underflow { requested: usize, available: usize },
}
