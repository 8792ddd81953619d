//! Servo Link Protocol
//!
//! Framing layer for the host → device servo command link: five-byte
//! command frames decoded from a `ByteRing`, the typed commands they carry,
//! and the encoder the host uses to build them.

mod command;
mod decoder;
mod error;
mod frame;

pub use command::Command;
pub use decoder::{ChecksumMode, DecoderStats, FrameDecoder};
pub use error::ProtocolError;
pub use frame::{CommandFrame, FRAME_WIDTH, PAYLOAD_LEN};

/// Command code constants
pub mod code {
    pub use crate::command::SET_SERVO_POSITIONS;
}
