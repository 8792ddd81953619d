//! Command Codes and Typed Commands

use crate::error::ProtocolError;
use crate::frame::CommandFrame;
use serde::{Deserialize, Serialize};

/// Set both servo targets: payload[0] = leg 1, payload[1] = leg 2
pub const SET_SERVO_POSITIONS: u8 = 0x01;

/// Typed interpretation of a decoded frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// New target angles for both actuators (not range checked)
    SetServoPositions { leg1: u8, leg2: u8 },
}

impl Command {
    /// Interpret a frame, rejecting unrecognized codes
    pub fn parse(frame: &CommandFrame) -> Result<Self, ProtocolError> {
        match frame.command {
            SET_SERVO_POSITIONS => Ok(Command::SetServoPositions {
                leg1: frame.payload[0],
                leg2: frame.payload[1],
            }),
            code => Err(ProtocolError::UnknownCommand(code)),
        }
    }

    /// Encode into a frame with a valid checksum
    pub fn to_frame(&self) -> CommandFrame {
        match *self {
            Command::SetServoPositions { leg1, leg2 } => {
                CommandFrame::set_servo_positions(leg1, leg2)
            }
        }
    }
}

impl TryFrom<&CommandFrame> for Command {
    type Error = ProtocolError;

    fn try_from(frame: &CommandFrame) -> Result<Self, Self::Error> {
        Command::parse(frame)
    }
}
