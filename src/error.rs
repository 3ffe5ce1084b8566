// Error types shared across the link, codec and motor layers

use crate::link::Role;

/// Startup configuration problems. These are fatal: the runtime refuses to start.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0:?} address is the FF:FF:FF:FF:FF:FF placeholder, provision a real address first")]
    UnconfiguredAddress(Role),

    #[error("peer address {0} is the local radio's own address")]
    SelfPeer(String),

    #[error("invalid hardware address {input:?}: {reason}")]
    BadAddress { input: String, reason: &'static str },

    #[error("invalid speed limits: min={min}, default={default}, max={max}")]
    SpeedLimits { min: u8, default: u8, max: u8 },

    #[error("invalid timing: {0}")]
    Timing(&'static str),

    #[error("invalid dead-zone {0}, expected 0.0 <= dz < 1.0")]
    DeadZone(f32),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Rejected wire frames. Recoverable: the frame is dropped and prior state kept.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("bad frame length: expected {expected} bytes, got {actual}")]
    BadLength { expected: usize, actual: usize },

    #[error("checksum mismatch: expected 0x{expected:04X}, got 0x{actual:04X}")]
    BadChecksum { expected: u16, actual: u16 },

    #[error("speed {value} outside [-255, 255]")]
    OutOfRange { value: i16 },
}

/// Send failures. Retryable by the caller, never retried internally.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error("radio channel busy")]
    ChannelBusy,

    #[error("peer unreachable")]
    PeerUnreachable,

    #[error("link not configured with a peer")]
    NotConfigured,
}

/// Motor output sink failures
#[derive(Debug, thiserror::Error)]
pub enum MotorError {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
