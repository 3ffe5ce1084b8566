// Serial GPIO/PWM bridge driving an L298N dual H-bridge
//
// The bridge board owns the pins; we tell it which levels to set.
// Packet format: [0xFF, 0xFF, Length, Instruction, Params..., Checksum]
// Length counts instruction + params + checksum. Checksum is the one's
// complement of the byte sum from Length onwards.

use serialport::{self, SerialPort};
use std::io::Write;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::sink::MotorOutputSink;
use crate::config::{HBridgePins, PinMap};
use crate::error::MotorError;
use crate::messages::{Direction, MotorChannel};

pub const DEFAULT_BAUDRATE: u32 = 115_200;
pub const DEFAULT_TIMEOUT_MS: u64 = 50;

/// Packet header bytes
const HEADER: [u8; 2] = [0xFF, 0xFF];

#[repr(u8)]
#[derive(Debug, Clone, Copy)]
pub enum Instruction {
    /// Params: [in_a_pin, in_a_level, in_b_pin, in_b_level, enable_pin, duty]
    SetChannel = 0x03,
    /// No params: bridge drops every pin low
    AllStop = 0x05,
}

/// Pin levels for one H-bridge channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelLevels {
    pub in_a: bool,
    pub in_b: bool,
    pub duty: u8,
}

impl ChannelLevels {
    /// L298N truth table. Stop is coast (both inputs low, enable 0);
    /// opposing inputs are never driven high together.
    pub fn for_output(direction: Direction, duty: u8) -> Self {
        match direction {
            Direction::Forward => Self {
                in_a: true,
                in_b: false,
                duty,
            },
            Direction::Reverse => Self {
                in_a: false,
                in_b: true,
                duty,
            },
            Direction::Stop => Self {
                in_a: false,
                in_b: false,
                duty: 0,
            },
        }
    }
}

/// H-bridge driver reached through a serial bridge board
pub struct HBridgeBridge {
    port: Box<dyn SerialPort>,
    pins: PinMap,
}

impl HBridgeBridge {
    pub fn open(port_name: &str, pins: PinMap) -> Result<Self, MotorError> {
        Self::open_with_baudrate(port_name, DEFAULT_BAUDRATE, pins)
    }

    pub fn open_with_baudrate(
        port_name: &str,
        baudrate: u32,
        pins: PinMap,
    ) -> Result<Self, MotorError> {
        info!("Opening H-bridge bridge on {} @ {} baud", port_name, baudrate);
        let port = serialport::new(port_name, baudrate)
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .open()?;

        let mut bridge = Self { port, pins };
        // Start from a known state
        bridge.stop()?;
        Ok(bridge)
    }

    fn checksum(data: &[u8]) -> u8 {
        let sum: u16 = data.iter().map(|&b| b as u16).sum();
        (!sum & 0xFF) as u8
    }

    fn build_packet(instruction: Instruction, params: &[u8]) -> Vec<u8> {
        let length = (params.len() + 2) as u8; // instruction + params + checksum
        let mut packet = Vec::with_capacity(5 + params.len());

        packet.extend_from_slice(&HEADER);
        packet.push(length);
        packet.push(instruction as u8);
        packet.extend_from_slice(params);

        let checksum = Self::checksum(&packet[2..]);
        packet.push(checksum);
        packet
    }

    fn channel_packet(pins: &HBridgePins, levels: ChannelLevels) -> Vec<u8> {
        let params = [
            pins.in_a,
            levels.in_a as u8,
            pins.in_b,
            levels.in_b as u8,
            pins.enable,
            levels.duty,
        ];
        Self::build_packet(Instruction::SetChannel, &params)
    }

    fn send_packet(&mut self, packet: &[u8]) -> Result<(), MotorError> {
        self.port.write_all(packet)?;
        self.port.flush()?;
        Ok(())
    }

    /// Drop every pin low on the bridge
    pub fn stop(&mut self) -> Result<(), MotorError> {
        info!("Stopping both motors");
        let packet = Self::build_packet(Instruction::AllStop, &[]);
        self.send_packet(&packet)
    }
}

impl MotorOutputSink for HBridgeBridge {
    fn set_motor(
        &mut self,
        channel: MotorChannel,
        direction: Direction,
        duty: u8,
    ) -> Result<(), MotorError> {
        let pins = match channel {
            MotorChannel::Left => self.pins.left,
            MotorChannel::Right => self.pins.right,
        };
        let levels = ChannelLevels::for_output(direction, duty);
        debug!(
            "{:?} motor: in_a={} in_b={} duty={}",
            channel, levels.in_a, levels.in_b, levels.duty
        );
        let packet = Self::channel_packet(&pins, levels);
        self.send_packet(&packet)
    }
}

impl Drop for HBridgeBridge {
    fn drop(&mut self) {
        // Leave the boat stopped when the runtime exits
        if let Err(e) = self.stop() {
            warn!("Failed to stop motors on drop: {}", e);
        }
    }
}
