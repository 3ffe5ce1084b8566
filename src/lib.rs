//! Control core for a two-motor RC boat: a low-latency radio link from a
//! control station to the vehicle, and the vehicle-side motor control loop
//! with a link-loss failsafe.

pub mod codec;
pub mod config;
pub mod error;
pub mod input;
pub mod link;
pub mod messages;
pub mod motor;
pub mod runtime;
pub mod supervisor;
