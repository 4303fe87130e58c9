// ── Network interface snapshots ──

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

/// Marker rendered for interfaces without a broadcast-capable IPv4 address.
pub const NO_IPV4_ADDRESSES: &str = "No IPv4 addresses";

/// One IPv4 address bound to an interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipv4Binding {
    pub address: Ipv4Addr,
    pub prefix_len: u8,
    /// Broadcast address; absent on point-to-point links.
    pub broadcast: Option<Ipv4Addr>,
}

impl Ipv4Binding {
    pub fn new(address: Ipv4Addr, prefix_len: u8, broadcast: Option<Ipv4Addr>) -> Self {
        Self {
            address,
            prefix_len: prefix_len.min(32),
            broadcast,
        }
    }

    /// A broadcast-capable binding with the broadcast address derived from the prefix.
    pub fn broadcast_capable(address: Ipv4Addr, prefix_len: u8) -> Self {
        let mut binding = Self::new(address, prefix_len, None);
        let host_bits = !u32::from(binding.netmask());
        binding.broadcast = Some(Ipv4Addr::from(u32::from(address) | host_bits));
        binding
    }

    /// Prefix length of a dotted netmask.
    pub fn prefix_from_netmask(netmask: Ipv4Addr) -> u8 {
        // A u32 has at most 32 set bits.
        u8::try_from(u32::from(netmask).count_ones()).unwrap_or(32)
    }

    pub fn netmask(&self) -> Ipv4Addr {
        let bits = u32::MAX
            .checked_shl(32_u32.saturating_sub(u32::from(self.prefix_len)))
            .unwrap_or(0);
        Ipv4Addr::from(bits)
    }

    /// Whether `ip` lives on the same subnet as this binding.
    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        let mask = u32::from(self.netmask());
        u32::from(self.address) & mask == u32::from(ip) & mask
    }

    pub fn is_broadcast_capable(&self) -> bool {
        self.broadcast.is_some()
    }
}

/// Snapshot of a local network interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInterface {
    /// Raw OS name (e.g. `en0`).
    pub name: String,
    /// Friendly name; equals `name` where the OS has no separate label.
    pub display_name: String,
    pub up: bool,
    pub loopback: bool,
    pub ipv4: Vec<Ipv4Binding>,
}

impl NetworkInterface {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            up: true,
            loopback: false,
            ipv4: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    #[must_use]
    pub fn with_ipv4(mut self, binding: Ipv4Binding) -> Self {
        self.ipv4.push(binding);
        self
    }

    /// Comma-joined `address/prefix` list of broadcast-capable addresses,
    /// or [`NO_IPV4_ADDRESSES`].
    pub fn ipv4_summary(&self) -> String {
        let addresses: Vec<String> = self
            .ipv4
            .iter()
            .filter(|binding| binding.is_broadcast_capable())
            .map(|binding| format!("{}/{}", binding.address, binding.prefix_len))
            .collect();
        if addresses.is_empty() {
            NO_IPV4_ADDRESSES.to_owned()
        } else {
            addresses.join(", ")
        }
    }

    /// `"<display-name> (<raw-name>): <ipv4-summary>"`
    pub fn describe(&self) -> String {
        format!("{} ({}): {}", self.display_name, self.name, self.ipv4_summary())
    }

    /// Up, not loopback.
    pub fn is_usable(&self) -> bool {
        self.up && !self.loopback
    }

    /// First binding whose subnet contains `ip`.
    pub fn binding_for(&self, ip: Ipv4Addr) -> Option<&Ipv4Binding> {
        self.ipv4.iter().find(|binding| binding.contains(ip))
    }

    pub fn reaches(&self, ip: Ipv4Addr) -> bool {
        self.binding_for(ip).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_joins_broadcast_addresses() {
        let iface = NetworkInterface::new("eth0")
            .with_ipv4(Ipv4Binding::broadcast_capable(Ipv4Addr::new(10, 0, 0, 5), 24))
            .with_ipv4(Ipv4Binding::broadcast_capable(Ipv4Addr::new(10, 0, 0, 6), 24));
        assert_eq!(iface.ipv4_summary(), "10.0.0.5/24, 10.0.0.6/24");
        assert_eq!(iface.describe(), "eth0 (eth0): 10.0.0.5/24, 10.0.0.6/24");
    }

    #[test]
    fn summary_skips_point_to_point_addresses() {
        let iface = NetworkInterface::new("utun3")
            .with_display_name("VPN")
            .with_ipv4(Ipv4Binding::new(Ipv4Addr::new(10, 8, 0, 2), 32, None));
        assert_eq!(iface.describe(), "VPN (utun3): No IPv4 addresses");
    }

    #[test]
    fn subnet_membership_follows_prefix() {
        let binding = Ipv4Binding::broadcast_capable(Ipv4Addr::new(169, 254, 10, 1), 16);
        assert_eq!(binding.broadcast, Some(Ipv4Addr::new(169, 254, 255, 255)));
        assert!(binding.contains(Ipv4Addr::new(169, 254, 200, 7)));
        assert!(!binding.contains(Ipv4Addr::new(192, 168, 1, 7)));

        let everything = Ipv4Binding::new(Ipv4Addr::new(10, 0, 0, 1), 0, None);
        assert_eq!(everything.netmask(), Ipv4Addr::UNSPECIFIED);
        assert!(everything.contains(Ipv4Addr::new(8, 8, 8, 8)));
    }

    #[test]
    fn prefix_is_derived_from_netmask() {
        assert_eq!(Ipv4Binding::prefix_from_netmask(Ipv4Addr::new(255, 255, 255, 0)), 24);
        assert_eq!(Ipv4Binding::prefix_from_netmask(Ipv4Addr::new(255, 255, 0, 0)), 16);
    }
}
