//! Byte Sources Feeding the Ring

use std::collections::VecDeque;

/// Non-blocking producer of received bytes (a UART receive register,
/// a channel fed by a serial reader task, a test fixture)
pub trait ByteSource {
    /// Take the next received byte, or `None` if nothing is pending
    fn read_byte(&mut self) -> Option<u8>;
}

impl ByteSource for VecDeque<u8> {
    fn read_byte(&mut self) -> Option<u8> {
        self.pop_front()
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_byte(&mut self) -> Option<u8> {
        (**self).read_byte()
    }
}

/// Outcome of draining a source into the ring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Bytes taken from the source
    pub received: usize,
    /// Bytes that hit a full ring
    pub overflowed: usize,
}
