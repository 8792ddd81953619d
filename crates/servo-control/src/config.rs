//! Link configuration
//!
//! Firmware constants live in `LinkConfig::default()`. A host build can
//! override them from a file and from `SERVO_LINK_*` environment variables.

use byte_ring::{ByteRing, OverflowPolicy, DEFAULT_CAPACITY};
use serde::{Deserialize, Serialize};
use servo_protocol::{ChecksumMode, FrameDecoder, FRAME_WIDTH};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "SERVO_LINK";

/// Neutral servo angle the actuators boot into
pub const HOME_ANGLE: u8 = 90;

/// Upper end of the servo range (degrees)
pub const MAX_SERVO_ANGLE: u8 = 180;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Source could not be read or deserialized
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    /// Values are inconsistent
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Servo link configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Serial link speed (baud)
    pub baud_rate: u32,

    /// Receive ring capacity (bytes); must exceed the frame width
    pub ring_capacity: usize,

    /// Behavior when a byte arrives at a full ring
    pub overflow_policy: OverflowPolicy,

    /// Whether the trailing frame byte is validated
    pub checksum_mode: ChecksumMode,

    /// Output pins for the two actuators
    pub leg1_pin: u8,
    pub leg2_pin: u8,

    /// Angle both actuators hold until the first command arrives
    pub initial_angle: u8,

    /// Clamp commanded angles to `max_angle` before applying them
    pub clamp_angles: bool,

    /// Clamp ceiling (degrees)
    pub max_angle: u8,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            ring_capacity: DEFAULT_CAPACITY,
            overflow_policy: OverflowPolicy::Overwrite,
            checksum_mode: ChecksumMode::Ignore,
            leg1_pin: 3,
            leg2_pin: 5,
            initial_angle: HOME_ANGLE,
            clamp_angles: false,
            max_angle: MAX_SERVO_ANGLE,
        }
    }
}

impl LinkConfig {
    /// Hardened config: rejects bytes on a full ring, validates checksums,
    /// clamps angles into the servo range
    pub fn hardened() -> Self {
        Self {
            overflow_policy: OverflowPolicy::DropNewest,
            checksum_mode: ChecksumMode::Xor,
            clamp_angles: true,
            ..Default::default()
        }
    }

    /// Layer defaults, an optional file, then `SERVO_LINK_*` overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    fn load_with_prefix(path: Option<&Path>, env_prefix: &str) -> Result<Self, ConfigError> {
        let mut builder =
            ::config::Config::builder().add_source(::config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            info!("Loading link configuration from {}", path.display());
            builder = builder.add_source(::config::File::from(path));
        }

        let loaded: Self = builder
            .add_source(::config::Environment::with_prefix(env_prefix).try_parsing(true))
            .build()?
            .try_deserialize()?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ring_capacity <= FRAME_WIDTH {
            return Err(ConfigError::Invalid(format!(
                "ring_capacity {} must exceed frame width {}",
                self.ring_capacity, FRAME_WIDTH
            )));
        }
        if self.max_angle > MAX_SERVO_ANGLE {
            return Err(ConfigError::Invalid(format!(
                "max_angle {} exceeds servo range {}",
                self.max_angle, MAX_SERVO_ANGLE
            )));
        }
        if self.baud_rate == 0 {
            return Err(ConfigError::Invalid("baud_rate must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Build the receive ring and decoder this config describes
    pub fn build_decoder(&self) -> Result<FrameDecoder, ConfigError> {
        self.validate()?;
        let ring = ByteRing::with_policy(self.ring_capacity, self.overflow_policy);
        let decoder = FrameDecoder::new(ring)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?
            .with_checksum_mode(self.checksum_mode);
        Ok(decoder)
    }

    /// Clamp ceiling, if clamping is enabled
    pub fn angle_limit(&self) -> Option<u8> {
        self.clamp_angles.then_some(self.max_angle)
    }
}
