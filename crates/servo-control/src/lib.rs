//! Servo Control
//!
//! Dispatcher and poll loop that turn decoded command frames into actuator
//! targets, plus the link configuration they are built from.

mod actuator;
mod config;
mod control;
mod dispatcher;

pub use actuator::{Actuator, ActuatorState, MockServo, TracingServo};
pub use config::{ConfigError, LinkConfig, ENV_PREFIX, HOME_ANGLE, MAX_SERVO_ANGLE};
pub use control::{ControlLoop, CycleReport};
pub use dispatcher::{DispatchReport, Dispatcher};
