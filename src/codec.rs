// Fixed-width wire codec for command frames
//
// Layout (little-endian, 8 bytes):
// [seq: u16][left: i16][right: i16][crc16: u16]
// CRC is CRC-16/CCITT-FALSE over the first 6 bytes.

use crate::error::DecodeError;
use crate::messages::{CommandFrame, SPEED_RANGE};

/// Bytes on the wire per frame
pub const FRAME_LEN: usize = 8;

const BODY_LEN: usize = FRAME_LEN - 2;

/// A command frame with its link sequence number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireFrame {
    pub seq: u16,
    pub command: CommandFrame,
}

impl WireFrame {
    pub fn new(seq: u16, command: CommandFrame) -> Self {
        Self { seq, command }
    }
}

pub fn encode(frame: &WireFrame) -> [u8; FRAME_LEN] {
    let mut out = [0u8; FRAME_LEN];
    out[0..2].copy_from_slice(&frame.seq.to_le_bytes());
    out[2..4].copy_from_slice(&frame.command.left.to_le_bytes());
    out[4..6].copy_from_slice(&frame.command.right.to_le_bytes());

    let crc = crc16_ccitt_false(&out[..BODY_LEN]);
    out[BODY_LEN..].copy_from_slice(&crc.to_le_bytes());
    out
}

/// Validate and decode untrusted bytes from the air.
/// Nothing reaches the motors unless length, checksum and range all check out.
pub fn decode(bytes: &[u8]) -> Result<WireFrame, DecodeError> {
    let buf: &[u8; FRAME_LEN] = bytes.try_into().map_err(|_| DecodeError::BadLength {
        expected: FRAME_LEN,
        actual: bytes.len(),
    })?;

    let received = u16::from_le_bytes([buf[6], buf[7]]);
    let computed = crc16_ccitt_false(&buf[..BODY_LEN]);
    if received != computed {
        return Err(DecodeError::BadChecksum {
            expected: computed,
            actual: received,
        });
    }

    let seq = u16::from_le_bytes([buf[0], buf[1]]);
    let left = checked_speed(i16::from_le_bytes([buf[2], buf[3]]))?;
    let right = checked_speed(i16::from_le_bytes([buf[4], buf[5]]))?;

    Ok(WireFrame::new(seq, CommandFrame::new(left, right)))
}

fn checked_speed(value: i16) -> Result<i16, DecodeError> {
    if (-SPEED_RANGE..=SPEED_RANGE).contains(&value) {
        Ok(value)
    } else {
        Err(DecodeError::OutOfRange { value })
    }
}

/// True when `seq` is ahead of `last`, allowing for wraparound.
/// Anything in the half window behind `last` counts as old.
pub fn is_newer(seq: u16, last: u16) -> bool {
    let diff = seq.wrapping_sub(last);
    diff != 0 && diff < 0x8000
}

pub fn crc16_ccitt_false(bytes: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &b in bytes {
        crc ^= (b as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}
