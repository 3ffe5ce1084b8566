// 6-byte radio hardware addresses and the control/vehicle address book

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Hardware address of one end of the radio link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeerAddress([u8; 6]);

impl PeerAddress {
    /// Placeholder value shipped before provisioning. Also the broadcast address.
    pub const UNCONFIGURED: PeerAddress = PeerAddress([0xFF; 6]);

    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> [u8; 6] {
        self.0
    }

    pub fn is_unconfigured(&self) -> bool {
        *self == Self::UNCONFIGURED
    }

    /// Lowercase hex without separators, usable as a zenoh key chunk
    pub fn key_chunk(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            a, b, c, d, e, g
        )
    }
}

impl FromStr for PeerAddress {
    type Err = ConfigError;

    /// Accepts `AA:BB:CC:DD:EE:FF`, `AA-BB-CC-DD-EE-FF` or `aabbccddeeff`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = |reason| ConfigError::BadAddress {
            input: s.to_string(),
            reason,
        };

        let hex: String = s.trim().chars().filter(|c| *c != ':' && *c != '-').collect();
        if hex.len() != 12 {
            return Err(bad("expected 6 bytes"));
        }

        let mut bytes = [0u8; 6];
        for (i, byte) in bytes.iter_mut().enumerate() {
            let pair = hex.get(i * 2..i * 2 + 2).ok_or_else(|| bad("not ASCII hex"))?;
            *byte = u8::from_str_radix(pair, 16).map_err(|_| bad("not hex"))?;
        }
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for PeerAddress {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PeerAddress> for String {
    fn from(addr: PeerAddress) -> Self {
        addr.to_string()
    }
}

/// Which end of the link this process is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Control,
    Vehicle,
}

/// The two provisioned addresses, one per role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBook {
    pub control: PeerAddress,
    pub vehicle: PeerAddress,
}

impl AddressBook {
    pub fn local(&self, role: Role) -> PeerAddress {
        match role {
            Role::Control => self.control,
            Role::Vehicle => self.vehicle,
        }
    }

    pub fn peer(&self, role: Role) -> PeerAddress {
        match role {
            Role::Control => self.vehicle,
            Role::Vehicle => self.control,
        }
    }

    /// Both addresses must be provisioned before the link may run
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.control.is_unconfigured() {
            return Err(ConfigError::UnconfiguredAddress(Role::Control));
        }
        if self.vehicle.is_unconfigured() {
            return Err(ConfigError::UnconfiguredAddress(Role::Vehicle));
        }
        Ok(())
    }
}

impl Default for AddressBook {
    fn default() -> Self {
        Self {
            control: PeerAddress::UNCONFIGURED,
            vehicle: PeerAddress::UNCONFIGURED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formats() {
        let expected = PeerAddress::new([0xA0, 0xB1, 0xC2, 0xD3, 0xE4, 0xF5]);
        assert_eq!("A0:B1:C2:D3:E4:F5".parse::<PeerAddress>().unwrap(), expected);
        assert_eq!("a0-b1-c2-d3-e4-f5".parse::<PeerAddress>().unwrap(), expected);
        assert_eq!("a0b1c2d3e4f5".parse::<PeerAddress>().unwrap(), expected);
        assert_eq!(expected.to_string(), "A0:B1:C2:D3:E4:F5");
        assert_eq!(expected.key_chunk(), "a0b1c2d3e4f5");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("A0:B1:C2".parse::<PeerAddress>().is_err());
        assert!("zz:b1:c2:d3:e4:f5".parse::<PeerAddress>().is_err());
        // multi-byte chars must not panic on slicing
        assert!("éééééé".parse::<PeerAddress>().is_err());
    }

    #[test]
    fn test_sentinel_detection() {
        assert!(PeerAddress::new([0xFF; 6]).is_unconfigured());
        assert!(!PeerAddress::new([0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE]).is_unconfigured());
    }

    #[test]
    fn test_address_book_roles() {
        let book = AddressBook {
            control: PeerAddress::new([1, 2, 3, 4, 5, 6]),
            vehicle: PeerAddress::new([6, 5, 4, 3, 2, 1]),
        };
        assert_eq!(book.local(Role::Control), book.peer(Role::Vehicle));
        assert_eq!(book.local(Role::Vehicle), book.peer(Role::Control));
        assert!(book.validate().is_ok());

        let unprovisioned = AddressBook::default();
        assert!(matches!(
            unprovisioned.validate(),
            Err(ConfigError::UnconfiguredAddress(Role::Control))
        ));
    }

    #[test]
    fn test_serde_as_string() {
        let addr = PeerAddress::new([0x24, 0x6F, 0x28, 0x00, 0x11, 0x22]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"24:6F:28:00:11:22\"");
        let back: PeerAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
