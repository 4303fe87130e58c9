// ── Device domain types ──

use std::fmt;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

/// Number a participant occupies on the link network (1-4 for real players,
/// higher numbers for virtual participants and mixers).
pub type PlayerNumber = u8;

/// Player numbers that real CDJs occupy.
pub const REAL_PLAYER_NUMBERS: std::ops::RangeInclusive<PlayerNumber> = 1..=4;

/// Highest player number a virtual participant may claim.
pub const MAX_PLAYER_NUMBER: PlayerNumber = 15;

/// A link-protocol device seen on the local network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Device {
    /// Name the device announces itself with.
    pub name: String,
    /// Address the announcements came from.
    pub address: Ipv4Addr,
    /// Player number, when the observer knows it.
    pub number: Option<PlayerNumber>,
}

impl Device {
    pub fn new(name: impl Into<String>, address: Ipv4Addr) -> Self {
        Self {
            name: name.into(),
            address,
            number: None,
        }
    }

    #[must_use]
    pub fn with_number(mut self, number: PlayerNumber) -> Self {
        self.number = Some(number);
        self
    }

    /// Human-readable description used in alerts and sort order.
    pub fn description(&self) -> String {
        match self.number {
            Some(number) => format!("{} #{number} ({})", self.name, self.address),
            None => format!("{} ({})", self.name, self.address),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_includes_number_when_known() {
        let address = Ipv4Addr::new(169, 254, 1, 2);
        assert_eq!(
            Device::new("CDJ-3000", address).with_number(2).description(),
            "CDJ-3000 #2 (169.254.1.2)"
        );
        assert_eq!(Device::new("DJM-900NXS2", address).description(), "DJM-900NXS2 (169.254.1.2)");
    }
}
