// Vehicle-side motion controller
//
// Running: drive whatever command is buffered.
// Failsafe: both motors {Stop, 0}, no matter what is buffered.
// Only a fresh valid command leaves Failsafe.

use tracing::{info, warn};

use super::sink::MotorOutputSink;
use crate::config::SpeedLimits;
use crate::messages::{
    CommandFrame, Direction, DriveOutputs, MotionState, MotorChannel, MotorOutput,
};

pub struct MotionController<S: MotorOutputSink> {
    sink: S,
    limits: SpeedLimits,
    state: MotionState,
    command: Option<CommandFrame>,
}

impl<S: MotorOutputSink> MotionController<S> {
    /// Starts in Failsafe until the first valid command arrives
    pub fn new(sink: S, limits: SpeedLimits) -> Self {
        Self {
            sink,
            limits,
            state: MotionState::Failsafe,
            command: None,
        }
    }

    /// Map a command to outputs, each motor on its own
    pub fn apply(&self, frame: CommandFrame) -> DriveOutputs {
        DriveOutputs {
            left: speed_to_output(frame.left, &self.limits),
            right: speed_to_output(frame.right, &self.limits),
        }
    }

    /// A validated command arrived
    pub fn on_command(&mut self, frame: CommandFrame) {
        if self.state == MotionState::Failsafe {
            info!("Command received, leaving failsafe");
            self.state = MotionState::Running;
        }
        self.command = Some(frame);
    }

    /// Link lost: stop and forget the buffered command
    pub fn enter_failsafe(&mut self) {
        if self.state == MotionState::Running {
            warn!("Entering failsafe, stopping both motors");
        }
        self.state = MotionState::Failsafe;
        self.command = None;
    }

    /// Compute this tick's outputs and write them to the sink, once per motor
    pub fn update(&mut self) -> DriveOutputs {
        let outputs = match (self.state, self.command) {
            (MotionState::Running, Some(frame)) => self.apply(frame),
            _ => DriveOutputs::STOP,
        };

        for (channel, output) in [
            (MotorChannel::Left, outputs.left),
            (MotorChannel::Right, outputs.right),
        ] {
            if let Err(e) = self.sink.set_motor(channel, output.direction, output.duty) {
                warn!("Failed to set {:?} motor: {}", channel, e);
            }
        }

        outputs
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

/// Sign picks the direction, magnitude is clamped to the max.
/// Anything under the min duty cannot turn the motor, so it becomes a stop.
fn speed_to_output(speed: i16, limits: &SpeedLimits) -> MotorOutput {
    let duty = speed.unsigned_abs().min(limits.max as u16) as u8;
    if duty < limits.min {
        return MotorOutput::STOP;
    }

    let direction = if speed > 0 {
        Direction::Forward
    } else {
        Direction::Reverse
    };
    MotorOutput::new(direction, duty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MotorError;

    /// Sink that remembers every call
    #[derive(Default)]
    struct Recorder {
        calls: Vec<(MotorChannel, Direction, u8)>,
    }

    impl MotorOutputSink for Recorder {
        fn set_motor(
            &mut self,
            channel: MotorChannel,
            direction: Direction,
            duty: u8,
        ) -> Result<(), MotorError> {
            self.calls.push((channel, direction, duty));
            Ok(())
        }
    }

    struct Broken;

    impl MotorOutputSink for Broken {
        fn set_motor(&mut self, _: MotorChannel, _: Direction, _: u8) -> Result<(), MotorError> {
            Err(MotorError::Io(std::io::Error::other("bridge unplugged")))
        }
    }

    fn controller() -> MotionController<Recorder> {
        MotionController::new(Recorder::default(), SpeedLimits::default())
    }

    #[test]
    fn test_sub_threshold_is_stop() {
        let ctl = controller();
        for s in -255i16..=255 {
            let out = ctl.apply(CommandFrame::new(s, s));
            if s.abs() < 50 {
                assert_eq!(out.left, MotorOutput::STOP, "speed {}", s);
                assert_eq!(out.right, MotorOutput::STOP, "speed {}", s);
            } else {
                assert_eq!(out.left.duty as i16, s.abs());
                assert_ne!(out.left.direction, Direction::Stop);
            }
        }
    }

    #[test]
    fn test_threshold_boundary() {
        let ctl = controller();
        let out = ctl.apply(CommandFrame::new(50, -49));
        assert_eq!(out.left, MotorOutput::new(Direction::Forward, 50));
        assert_eq!(out.right, MotorOutput::STOP);
    }

    #[test]
    fn test_mixed_command() {
        let ctl = controller();
        let out = ctl.apply(CommandFrame::new(200, -30));
        assert_eq!(out.left, MotorOutput::new(Direction::Forward, 200));
        assert_eq!(out.right, MotorOutput::STOP);
    }

    #[test]
    fn test_full_ahead() {
        let ctl = controller();
        let out = ctl.apply(CommandFrame::new(255, 255));
        assert_eq!(out.left, MotorOutput::new(Direction::Forward, 255));
        assert_eq!(out.right, MotorOutput::new(Direction::Forward, 255));
    }

    #[test]
    fn test_reverse_and_clamp() {
        let limits = SpeedLimits {
            min: 50,
            max: 180,
            default: 100,
        };
        let ctl = MotionController::new(Recorder::default(), limits);
        let out = ctl.apply(CommandFrame::new(-255, 120));
        assert_eq!(out.left, MotorOutput::new(Direction::Reverse, 180));
        assert_eq!(out.right, MotorOutput::new(Direction::Forward, 120));
    }

    #[test]
    fn test_starts_in_failsafe() {
        let mut ctl = controller();
        assert_eq!(ctl.state(), MotionState::Failsafe);
        assert_eq!(ctl.update(), DriveOutputs::STOP);
        assert_eq!(
            ctl.sink().calls,
            vec![
                (MotorChannel::Left, Direction::Stop, 0),
                (MotorChannel::Right, Direction::Stop, 0)
            ]
        );
    }

    #[test]
    fn test_failsafe_ignores_buffered_command() {
        let mut ctl = controller();
        ctl.on_command(CommandFrame::new(200, 200));
        assert_eq!(ctl.state(), MotionState::Running);
        assert_eq!(ctl.update().left, MotorOutput::new(Direction::Forward, 200));

        ctl.enter_failsafe();
        assert_eq!(ctl.state(), MotionState::Failsafe);
        assert_eq!(ctl.update(), DriveOutputs::STOP);
        // Still stopped on later ticks
        assert_eq!(ctl.update(), DriveOutputs::STOP);

        ctl.on_command(CommandFrame::new(-100, 100));
        assert_eq!(ctl.state(), MotionState::Running);
        let out = ctl.update();
        assert_eq!(out.left, MotorOutput::new(Direction::Reverse, 100));
        assert_eq!(out.right, MotorOutput::new(Direction::Forward, 100));
    }

    #[test]
    fn test_sink_errors_do_not_stop_the_loop() {
        let mut ctl = MotionController::new(Broken, SpeedLimits::default());
        ctl.on_command(CommandFrame::new(100, 100));
        assert_eq!(ctl.update().left, MotorOutput::new(Direction::Forward, 100));
    }
}
