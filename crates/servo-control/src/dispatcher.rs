//! Command Dispatcher
//!
//! Applies decoded frames to the actuator targets in decode order.

use crate::actuator::ActuatorState;
use servo_protocol::{Command, CommandFrame, FrameDecoder, ProtocolError};
use tracing::{info, warn};

/// Outcome of draining the decoder once
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Frames that changed the targets
    pub applied: usize,
    /// Frames dropped (unknown command)
    pub rejected: usize,
}

/// Interprets frames and owns the actuator targets
#[derive(Debug, Clone)]
pub struct Dispatcher {
    state: ActuatorState,
    angle_limit: Option<u8>,
    total: DispatchReport,
}

impl Dispatcher {
    /// Create a dispatcher starting from `state`
    pub fn new(state: ActuatorState) -> Self {
        Self {
            state,
            angle_limit: None,
            total: DispatchReport::default(),
        }
    }

    /// Clamp commanded angles to `limit` before applying them
    pub fn with_angle_limit(mut self, limit: Option<u8>) -> Self {
        self.angle_limit = limit;
        self
    }

    /// Apply one frame
    ///
    /// Unknown codes leave the targets untouched and are returned as
    /// `UnknownCommand` for the caller to report.
    pub fn dispatch(&mut self, frame: &CommandFrame) -> Result<Command, ProtocolError> {
        let command = Command::parse(frame)?;
        match command {
            Command::SetServoPositions { leg1, leg2 } => {
                info!(
                    "Received servo position command: leg1={}, leg2={}",
                    leg1, leg2
                );
                self.state.leg1 = self.limit(leg1);
                self.state.leg2 = self.limit(leg2);
            }
        }
        Ok(command)
    }

    fn limit(&self, angle: u8) -> u8 {
        match self.angle_limit {
            Some(max) => angle.min(max),
            None => angle,
        }
    }

    /// Dispatch every frame the decoder can produce right now
    pub fn drain(&mut self, decoder: &mut FrameDecoder) -> DispatchReport {
        let mut report = DispatchReport::default();
        while let Some(frame) = decoder.next_frame() {
            match self.dispatch(&frame) {
                Ok(_) => report.applied += 1,
                Err(e) => {
                    report.rejected += 1;
                    warn!("Ignoring frame {:02X?}: {}", frame.to_bytes(), e);
                }
            }
        }
        self.total.applied += report.applied;
        self.total.rejected += report.rejected;
        report
    }

    /// Current actuator targets
    pub fn state(&self) -> ActuatorState {
        self.state
    }

    /// Lifetime totals
    pub fn totals(&self) -> DispatchReport {
        self.total
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(ActuatorState::default())
    }
}
