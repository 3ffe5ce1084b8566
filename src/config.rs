// Timeouts, topics, pins, speed limits and the startup config object
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::link::AddressBook;

// Vehicle loop frequency
pub const VEHICLE_HZ: u64 = 50;

// Control station send period
pub const SEND_PERIOD: Duration = Duration::from_millis(50);

// Gap after which the link is reported stale (two missed frames)
pub const STALE_AFTER: Duration = Duration::from_millis(100);

// Silence after which the boat stops
pub const LINK_TIMEOUT: Duration = Duration::from_millis(250);

// Zenoh topics
pub const TOPIC_LINK_BASE: &str = "boat/link"; // radio frames: boat/link/<dest>/<src>
pub const TOPIC_HEALTH: &str = "boat/state/health"; // vehicle status

// Speed limits (PWM duty, 0-255)
pub const MIN_SPEED: u8 = 50; // below this the motors stall, so output is forced to 0
pub const MAX_SPEED: u8 = 255; // 100% PWM
pub const DEFAULT_SPEED: u8 = 200; // starting speed for button input

// Stick dead-zone as a fraction of full deflection
pub const DEAD_ZONE: f32 = 0.08;

// L298N wiring on the boat's ESP32-S3
pub const MOTOR_A_IN1_PIN: u8 = 18; // left motor direction 1
pub const MOTOR_A_IN2_PIN: u8 = 17; // left motor direction 2
pub const MOTOR_A_ENA_PIN: u8 = 5; // left motor PWM
pub const MOTOR_B_IN3_PIN: u8 = 16; // right motor direction 1
pub const MOTOR_B_IN4_PIN: u8 = 4; // right motor direction 2
pub const MOTOR_B_ENB_PIN: u8 = 6; // right motor PWM

/// PWM duty bounds shared by the sampler and the motion controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedLimits {
    pub min: u8,
    pub max: u8,
    pub default: u8,
}

impl SpeedLimits {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min == 0 || self.min > self.default || self.default > self.max {
            return Err(ConfigError::SpeedLimits {
                min: self.min,
                default: self.default,
                max: self.max,
            });
        }
        Ok(())
    }
}

impl Default for SpeedLimits {
    fn default() -> Self {
        Self {
            min: MIN_SPEED,
            max: MAX_SPEED,
            default: DEFAULT_SPEED,
        }
    }
}

/// Direction and enable pins for one H-bridge channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HBridgePins {
    pub in_a: u8,
    pub in_b: u8,
    pub enable: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinMap {
    pub left: HBridgePins,
    pub right: HBridgePins,
}

impl Default for PinMap {
    fn default() -> Self {
        Self {
            left: HBridgePins {
                in_a: MOTOR_A_IN1_PIN,
                in_b: MOTOR_A_IN2_PIN,
                enable: MOTOR_A_ENA_PIN,
            },
            right: HBridgePins {
                in_a: MOTOR_B_IN3_PIN,
                in_b: MOTOR_B_IN4_PIN,
                enable: MOTOR_B_ENB_PIN,
            },
        }
    }
}

/// Everything the runtime needs, built once at startup and passed by reference.
/// Missing fields in a JSON file fall back to the constants above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoatConfig {
    pub addresses: AddressBook,
    pub speed: SpeedLimits,
    pub pins: PinMap,
    pub dead_zone: f32,
    #[serde(with = "millis")]
    pub send_period: Duration,
    pub vehicle_hz: u64,
    #[serde(with = "millis")]
    pub stale_after: Duration,
    #[serde(with = "millis")]
    pub link_timeout: Duration,
    /// Serial port of the H-bridge GPIO bridge; None runs without motors
    pub motor_port: Option<String>,
}

impl Default for BoatConfig {
    fn default() -> Self {
        Self {
            addresses: AddressBook::default(),
            speed: SpeedLimits::default(),
            pins: PinMap::default(),
            dead_zone: DEAD_ZONE,
            send_period: SEND_PERIOD,
            vehicle_hz: VEHICLE_HZ,
            stale_after: STALE_AFTER,
            link_timeout: LINK_TIMEOUT,
            motor_port: None,
        }
    }
}

impl BoatConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Startup checks. Any failure here means the runtime must not start.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.addresses.validate()?;
        self.speed.validate()?;

        if !(0.0..1.0).contains(&self.dead_zone) {
            return Err(ConfigError::DeadZone(self.dead_zone));
        }
        if self.send_period.is_zero() || self.vehicle_hz == 0 {
            return Err(ConfigError::Timing("loop periods must be non-zero"));
        }
        if self.stale_after >= self.link_timeout {
            return Err(ConfigError::Timing("stale_after must be shorter than link_timeout"));
        }
        if self.vehicle_hz > 1000 {
            return Err(ConfigError::Timing("vehicle_hz above 1000 rounds to a zero period"));
        }
        if self.link_timeout <= self.send_period {
            return Err(ConfigError::Timing("link_timeout must exceed the send period"));
        }
        if self.vehicle_period() >= self.link_timeout {
            return Err(ConfigError::Timing("vehicle period must be shorter than link_timeout"));
        }
        Ok(())
    }

    pub fn vehicle_period(&self) -> Duration {
        Duration::from_millis(1000 / self.vehicle_hz)
    }
}

// Durations are written as integer milliseconds in config files
mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::{PeerAddress, Role};

    fn provisioned() -> BoatConfig {
        BoatConfig {
            addresses: AddressBook {
                control: PeerAddress::new([0x24, 0x6F, 0x28, 0xAA, 0xBB, 0x01]),
                vehicle: PeerAddress::new([0x24, 0x6F, 0x28, 0xAA, 0xBB, 0x02]),
            },
            ..BoatConfig::default()
        }
    }

    #[test]
    fn test_default_constants_valid() {
        let speed = SpeedLimits::default();
        assert!(speed.min <= speed.default && speed.default <= speed.max);
        assert!(speed.validate().is_ok());
        assert!(provisioned().validate().is_ok());
    }

    #[test]
    fn test_unprovisioned_defaults_refused() {
        assert!(matches!(
            BoatConfig::default().validate(),
            Err(ConfigError::UnconfiguredAddress(Role::Control))
        ));
    }

    #[test]
    fn test_bad_speed_limits() {
        let mut config = provisioned();
        config.speed = SpeedLimits {
            min: 210,
            max: 255,
            default: 200,
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SpeedLimits { .. })
        ));
    }

    #[test]
    fn test_bad_timing() {
        let mut config = provisioned();
        config.stale_after = Duration::from_millis(300);
        assert!(matches!(config.validate(), Err(ConfigError::Timing(_))));

        // Too fast: 1000 / 2000 would be a zero period
        let mut config = provisioned();
        config.vehicle_hz = 2000;
        assert!(matches!(config.validate(), Err(ConfigError::Timing(_))));

        // Too slow: a 500ms tick cannot honour a 250ms timeout
        let mut config = provisioned();
        config.vehicle_hz = 2;
        assert!(matches!(config.validate(), Err(ConfigError::Timing(_))));

        // Fastest accepted rate still yields a usable period
        let mut config = provisioned();
        config.vehicle_hz = 1000;
        assert!(config.validate().is_ok());
        assert_eq!(config.vehicle_period(), Duration::from_millis(1));
    }

    #[test]
    fn test_partial_json() {
        let json = r#"{
            "addresses": { "control": "24:6F:28:AA:BB:01", "vehicle": "24:6F:28:AA:BB:02" },
            "link_timeout": 400,
            "motor_port": "/dev/ttyUSB0"
        }"#;
        let config: BoatConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.link_timeout, Duration::from_millis(400));
        assert_eq!(config.send_period, SEND_PERIOD);
        assert_eq!(config.speed, SpeedLimits::default());
        assert_eq!(config.motor_port.as_deref(), Some("/dev/ttyUSB0"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_vehicle_period() {
        assert_eq!(provisioned().vehicle_period(), Duration::from_millis(20));
    }
}
