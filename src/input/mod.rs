// Control-station input: sources and the fixed-cadence sampler

pub mod keyboard;
pub mod sampler;

pub use keyboard::KeyboardInput;
pub use sampler::{InputSampler, InputSource, RawInput};
