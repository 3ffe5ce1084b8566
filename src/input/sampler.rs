// Operator input -> command frames

use crate::messages::{CommandFrame, SPEED_RANGE};

/// Stick positions, each in [-1.0, 1.0]. Positive is ahead.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawInput {
    pub left: f32,
    pub right: f32,
}

impl RawInput {
    pub fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    /// Single-stick mix: throttle ahead/astern, steer right positive
    pub fn arcade(throttle: f32, steer: f32) -> Self {
        let left = throttle + steer;
        let right = throttle - steer;
        // Keep the ratio between sides when one saturates
        let peak = left.abs().max(right.abs()).max(1.0);
        Self {
            left: left / peak,
            right: right / peak,
        }
    }
}

/// Anything that can report the operator's current input without blocking
pub trait InputSource {
    fn read(&mut self) -> RawInput;
}

pub struct InputSampler<I: InputSource> {
    source: I,
    dead_zone: f32,
}

impl<I: InputSource> InputSampler<I> {
    pub fn new(source: I, dead_zone: f32) -> Self {
        Self { source, dead_zone }
    }

    /// Read the source once and produce a frame
    pub fn sample(&mut self) -> CommandFrame {
        let raw = self.source.read();
        CommandFrame::new(
            self.scale(raw.left),
            self.scale(raw.right),
        )
    }

    pub fn source(&self) -> &I {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut I {
        &mut self.source
    }

    /// Linear map to [-255, 255]; small deflections read as centred
    fn scale(&self, value: f32) -> i16 {
        if !value.is_finite() {
            return 0;
        }
        let value = value.clamp(-1.0, 1.0);
        if value.abs() < self.dead_zone {
            return 0;
        }
        (value * SPEED_RANGE as f32).round() as i16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(RawInput);

    impl InputSource for Fixed {
        fn read(&mut self) -> RawInput {
            self.0
        }
    }

    fn sampler(left: f32, right: f32) -> InputSampler<Fixed> {
        InputSampler::new(Fixed(RawInput::new(left, right)), 0.08)
    }

    #[test]
    fn test_linear_mapping() {
        assert_eq!(sampler(1.0, -1.0).sample(), CommandFrame::new(255, -255));
        assert_eq!(
            sampler(200.0 / 255.0, -30.0 / 255.0).sample(),
            CommandFrame::new(200, -30)
        );
        assert_eq!(sampler(0.5, 0.0).sample(), CommandFrame::new(128, 0));
    }

    #[test]
    fn test_dead_zone() {
        assert_eq!(sampler(0.05, -0.079).sample(), CommandFrame::new(0, 0));
        assert_eq!(sampler(0.08, 0.0).sample().left, 20);
    }

    #[test]
    fn test_out_of_range_input_clamped() {
        let frame = sampler(3.0, -7.5).sample();
        assert_eq!(frame, CommandFrame::new(255, -255));
        assert!(frame.in_range());

        let frame = sampler(f32::NAN, f32::INFINITY).sample();
        assert_eq!(frame, CommandFrame::new(0, 0));
    }

    #[test]
    fn test_arcade_mix() {
        let straight = RawInput::arcade(0.5, 0.0);
        assert_eq!(straight, RawInput::new(0.5, 0.5));

        let spin = RawInput::arcade(0.0, 1.0);
        assert_eq!(spin, RawInput::new(1.0, -1.0));

        // Full throttle with a turn keeps the outer side at full
        let turn = RawInput::arcade(1.0, 0.5);
        assert_eq!(turn.left, 1.0);
        assert!((turn.right - 1.0 / 3.0).abs() < 1e-6);
    }
}
