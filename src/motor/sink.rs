// Motor output capability the controller writes through

use tracing::debug;

use crate::error::MotorError;
use crate::messages::{Direction, MotorChannel, MotorOutput};

/// Board-specific motor output. The control core only depends on this.
pub trait MotorOutputSink {
    fn set_motor(
        &mut self,
        channel: MotorChannel,
        direction: Direction,
        duty: u8,
    ) -> Result<(), MotorError>;
}

/// Simulation sink: no hardware, outputs only go to the log
#[derive(Debug, Default)]
pub struct LogSink {
    left: MotorOutput,
    right: MotorOutput,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self, channel: MotorChannel) -> MotorOutput {
        match channel {
            MotorChannel::Left => self.left,
            MotorChannel::Right => self.right,
        }
    }
}

impl MotorOutputSink for LogSink {
    fn set_motor(
        &mut self,
        channel: MotorChannel,
        direction: Direction,
        duty: u8,
    ) -> Result<(), MotorError> {
        let output = MotorOutput::new(direction, duty);
        let slot = match channel {
            MotorChannel::Left => &mut self.left,
            MotorChannel::Right => &mut self.right,
        };
        if *slot != output {
            debug!("[sim] {:?} motor -> {:?} @ {}", channel, direction, duty);
        }
        *slot = output;
        Ok(())
    }
}
