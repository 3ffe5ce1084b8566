// Message and state types passed between the link, controller and runtime

use serde::{Deserialize, Serialize};

/// Magnitude bound for a commanded speed on the wire
pub const SPEED_RANGE: i16 = 255;

/// Per-motor speed command from the control station.
/// Sign is direction, magnitude is PWM duty. Both fields stay in [-255, 255].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommandFrame {
    pub left: i16,
    pub right: i16,
}

impl CommandFrame {
    pub fn new(left: i16, right: i16) -> Self {
        Self { left, right }
    }

    pub fn stop() -> Self {
        Self::default()
    }

    pub fn in_range(&self) -> bool {
        (-SPEED_RANGE..=SPEED_RANGE).contains(&self.left)
            && (-SPEED_RANGE..=SPEED_RANGE).contains(&self.right)
    }
}

/// H-bridge direction for one motor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Reverse,
    #[default]
    Stop,
}

/// What one motor is told to do. `duty` is 0 or within the speed limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MotorOutput {
    pub direction: Direction,
    pub duty: u8,
}

impl MotorOutput {
    pub const STOP: MotorOutput = MotorOutput {
        direction: Direction::Stop,
        duty: 0,
    };

    pub fn new(direction: Direction, duty: u8) -> Self {
        Self { direction, duty }
    }
}

/// Differential drive output, left and right never interact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DriveOutputs {
    pub left: MotorOutput,
    pub right: MotorOutput,
}

impl DriveOutputs {
    pub const STOP: DriveOutputs = DriveOutputs {
        left: MotorOutput::STOP,
        right: MotorOutput::STOP,
    };
}

/// Motor channel on the H-bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorChannel {
    Left,
    Right,
}

/// Link health as seen by the vehicle, derived from time since the last valid frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    Connected,
    Stale,
    Lost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionState {
    Running,
    Failsafe,
}

/// Health status published by the vehicle runtime once per tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleStatus {
    pub link: LinkState,
    pub motion: MotionState,
    pub outputs: DriveOutputs,
    /// Frames that failed decoding or arrived out of order
    pub rejected: u64,
    /// Frames from addresses other than the configured peer
    pub discarded: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_range() {
        assert!(CommandFrame::new(255, -255).in_range());
        assert!(!CommandFrame::new(256, 0).in_range());
        assert!(!CommandFrame::new(0, i16::MIN).in_range());
    }

    #[test]
    fn test_status_json_shape() {
        let status = VehicleStatus {
            link: LinkState::Lost,
            motion: MotionState::Failsafe,
            outputs: DriveOutputs::STOP,
            rejected: 0,
            discarded: 2,
        };
        let json = serde_json::to_value(status).unwrap();
        assert_eq!(json["link"], "lost");
        assert_eq!(json["motion"], "failsafe");
        assert_eq!(json["outputs"]["left"]["direction"], "stop");
        assert_eq!(json["discarded"], 2);
    }
}
