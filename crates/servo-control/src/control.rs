//! Control Loop
//!
//! One cooperative, non-blocking cycle: drain the byte source into the ring,
//! dispatch every complete frame, then drive both actuators to their
//! targets. Link errors never stop the loop.

use crate::actuator::{Actuator, ActuatorState};
use crate::config::{ConfigError, LinkConfig};
use crate::dispatcher::{DispatchReport, Dispatcher};
use byte_ring::{ByteSource, IngestReport};
use servo_protocol::FrameDecoder;
use tracing::{debug, info};

/// What happened during one cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub ingest: IngestReport,
    pub dispatch: DispatchReport,
}

/// Owns the link state and the two actuator outputs
pub struct ControlLoop<S, A> {
    source: S,
    decoder: FrameDecoder,
    dispatcher: Dispatcher,
    leg1: A,
    leg2: A,
    cycles: u64,
}

impl<S: ByteSource, A: Actuator> ControlLoop<S, A> {
    /// Build the loop from configuration
    pub fn new(config: &LinkConfig, source: S, leg1: A, leg2: A) -> Result<Self, ConfigError> {
        let decoder = config.build_decoder()?;
        let dispatcher = Dispatcher::new(ActuatorState::uniform(config.initial_angle))
            .with_angle_limit(config.angle_limit());

        info!(
            "Control loop ready: ring={}B policy={:?} checksum={:?}",
            config.ring_capacity, config.overflow_policy, config.checksum_mode
        );

        Ok(Self {
            source,
            decoder,
            dispatcher,
            leg1,
            leg2,
            cycles: 0,
        })
    }

    /// Run one ingest → dispatch → actuate cycle
    pub fn cycle(&mut self) -> CycleReport {
        let ingest = self.decoder.ingest(&mut self.source);
        let dispatch = self.dispatcher.drain(&mut self.decoder);

        let state = self.dispatcher.state();
        self.leg1.write_angle(state.leg1);
        self.leg2.write_angle(state.leg2);

        self.cycles += 1;
        let report = CycleReport { ingest, dispatch };
        if report.ingest.received > 0 {
            debug!("Cycle {}: {:?}", self.cycles, report);
        }
        report
    }

    /// Cycle until `stop` returns true for a cycle's report
    pub fn run_until<F>(&mut self, mut stop: F)
    where
        F: FnMut(&CycleReport) -> bool,
    {
        loop {
            let report = self.cycle();
            if stop(&report) {
                break;
            }
        }
    }

    /// Current actuator targets
    pub fn state(&self) -> ActuatorState {
        self.dispatcher.state()
    }

    /// Number of cycles run
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Borrow the decoder (and through it the ring)
    pub fn decoder(&self) -> &FrameDecoder {
        &self.decoder
    }

    /// Borrow the dispatcher
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Mutably borrow the byte source
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Borrow both actuators
    pub fn actuators(&self) -> (&A, &A) {
        (&self.leg1, &self.leg2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::MockServo;
    use servo_protocol::CommandFrame;
    use std::collections::VecDeque;

    fn control_loop(config: &LinkConfig) -> ControlLoop<VecDeque<u8>, MockServo> {
        ControlLoop::new(
            config,
            VecDeque::new(),
            MockServo::new(config.leg1_pin),
            MockServo::new(config.leg2_pin),
        )
        .unwrap()
    }

    #[test]
    fn test_idle_cycle_holds_home() {
        let mut ctl = control_loop(&LinkConfig::default());
        let report = ctl.cycle();

        assert_eq!(report, CycleReport::default());
        let (leg1, leg2) = ctl.actuators();
        assert_eq!(leg1.writes(), &[90]);
        assert_eq!(leg2.writes(), &[90]);
    }

    #[test]
    fn test_cycle_applies_command() {
        let mut ctl = control_loop(&LinkConfig::default());
        ctl.source_mut().extend([0x01, 45, 135, 0, 0]);

        let report = ctl.cycle();
        assert_eq!(report.ingest.received, 5);
        assert_eq!(report.dispatch.applied, 1);
        assert_eq!(ctl.state(), ActuatorState { leg1: 45, leg2: 135 });

        ctl.cycle();
        let (leg1, leg2) = ctl.actuators();
        assert_eq!(leg1.writes(), &[45, 45]);
        assert_eq!(leg2.writes(), &[135, 135]);
        assert_eq!(ctl.cycles(), 2);
    }

    #[test]
    fn test_split_frame_across_cycles() {
        let mut ctl = control_loop(&LinkConfig::default());
        ctl.source_mut().extend([0x01, 20]);
        assert_eq!(ctl.cycle().dispatch.applied, 0);

        ctl.source_mut().extend([160, 0, 0]);
        assert_eq!(ctl.cycle().dispatch.applied, 1);
        assert_eq!(ctl.state(), ActuatorState { leg1: 20, leg2: 160 });
    }

    #[test]
    fn test_hardened_loop_survives_link_errors() {
        let mut ctl = control_loop(&LinkConfig::hardened());
        let mut burst = vec![0x01, 1, 2, 3, 0]; // bad checksum
        burst.extend(CommandFrame::set_servo_positions(200, 100).to_bytes());
        ctl.source_mut().extend(burst);

        let report = ctl.cycle();
        assert_eq!(report.dispatch.applied, 1);
        assert_eq!(ctl.decoder().stats().checksum_failures, 1);
        assert_eq!(ctl.state(), ActuatorState { leg1: 180, leg2: 100 });
    }

    #[test]
    fn test_run_until_stops() {
        let mut ctl = control_loop(&LinkConfig::default());
        ctl.source_mut().extend([0x01, 1, 1, 0, 0]);

        ctl.run_until(|report| report.dispatch.applied > 0);
        assert_eq!(ctl.cycles(), 1);
        assert_eq!(ctl.dispatcher().totals().applied, 1);
    }
}
