//! Byte Ring
//!
//! Fixed-capacity circular byte buffer that absorbs a serial receive stream
//! and serves it back in FIFO order. The overflow behavior is an explicit
//! `OverflowPolicy`; the default reproduces the legacy firmware, which
//! overwrites unread bytes without noticing.

mod buffer;
mod error;
mod source;

pub use buffer::{ByteRing, OverflowPolicy, DEFAULT_CAPACITY};
pub use error::RingError;
pub use source::{ByteSource, IngestReport};
