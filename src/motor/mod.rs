// Motor control for the boat's two-motor differential drive
//
// Provides:
// - MotionController: command -> per-motor direction + duty, with failsafe
// - MotorOutputSink: the board-facing output capability
// - Serial H-bridge bridge and a log-only simulation sink

mod bridge;
pub mod controller;
pub mod sink;

pub use bridge::{ChannelLevels, HBridgeBridge};
pub use controller::MotionController;
pub use sink::{LogSink, MotorOutputSink};
