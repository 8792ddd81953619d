//! Actuator targets and output seam
//!
//! PWM generation is outside this crate; anything that can take an angle
//! implements `Actuator`.

use crate::config::HOME_ANGLE;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Output for one servo channel
pub trait Actuator {
    /// Drive the output toward `angle` (degrees)
    fn write_angle(&mut self, angle: u8);
}

/// Target angles for both legs, last write wins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorState {
    pub leg1: u8,
    pub leg2: u8,
}

impl ActuatorState {
    /// Both legs at `angle`
    pub fn uniform(angle: u8) -> Self {
        Self {
            leg1: angle,
            leg2: angle,
        }
    }
}

impl Default for ActuatorState {
    fn default() -> Self {
        Self::uniform(HOME_ANGLE)
    }
}

/// In-memory actuator that records every angle written (no hardware required)
#[derive(Debug, Clone, Default)]
pub struct MockServo {
    pin: u8,
    writes: Vec<u8>,
}

impl MockServo {
    /// Create a mock servo on `pin`
    pub fn new(pin: u8) -> Self {
        Self {
            pin,
            writes: Vec::new(),
        }
    }

    /// Pin this servo is attached to
    pub fn pin(&self) -> u8 {
        self.pin
    }

    /// Every angle written so far
    pub fn writes(&self) -> &[u8] {
        &self.writes
    }

    /// Most recent angle written
    pub fn last(&self) -> Option<u8> {
        self.writes.last().copied()
    }
}

impl Actuator for MockServo {
    fn write_angle(&mut self, angle: u8) {
        self.writes.push(angle);
    }
}

/// Actuator that logs target changes, for running the loop on a host
#[derive(Debug, Clone)]
pub struct TracingServo {
    name: &'static str,
    pin: u8,
    current: Option<u8>,
}

impl TracingServo {
    /// Create a logging servo
    pub fn new(name: &'static str, pin: u8) -> Self {
        Self {
            name,
            pin,
            current: None,
        }
    }
}

impl Actuator for TracingServo {
    fn write_angle(&mut self, angle: u8) {
        if self.current != Some(angle) {
            info!("{} (pin {}) -> {} deg", self.name, self.pin, angle);
            self.current = Some(angle);
        }
    }
}

impl<A: Actuator + ?Sized> Actuator for Box<A> {
    fn write_angle(&mut self, angle: u8) {
        (**self).write_angle(angle)
    }
}
