// ── Network diagnostics ──
//
// Read-only introspection of local interfaces, rendered for the
// troubleshooting report and the multi-interface conflict warning.
// Reports are recomputed on every request; interface state changes
// underneath us while the operator is plugging cables in.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::{Ipv4Binding, NetworkInterface};
use crate::presence::PresenceClaimant;

/// Source of local interface snapshots.
pub trait InterfaceSource: Send + Sync {
    fn interfaces(&self) -> Result<Vec<NetworkInterface>, CoreError>;
}

/// Reads interfaces from the host operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemInterfaces;

/// One address entry as the OS reports it; interfaces with several
/// addresses show up once per address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInterfaceEntry {
    pub name: String,
    pub up: bool,
    pub loopback: bool,
    /// Set for IPv4 entries only.
    pub ipv4: Option<Ipv4Binding>,
}

/// Fold per-address entries into one snapshot per interface, in OS order.
///
/// An interface counts as up or loopback if any of its entries says so.
pub fn group_entries(
    entries: impl IntoIterator<Item = RawInterfaceEntry>,
) -> Vec<NetworkInterface> {
    let mut grouped: IndexMap<String, NetworkInterface> = IndexMap::new();
    for entry in entries {
        let iface = grouped.entry(entry.name.clone()).or_insert_with(|| {
            let mut iface = NetworkInterface::new(entry.name.clone());
            iface.up = false;
            iface
        });
        iface.up |= entry.up;
        iface.loopback |= entry.loopback;
        if let Some(binding) = entry.ipv4 {
            iface.ipv4.push(binding);
        }
    }
    grouped.into_values().collect()
}

impl InterfaceSource for SystemInterfaces {
    fn interfaces(&self) -> Result<Vec<NetworkInterface>, CoreError> {
        let interfaces = group_entries(host_entries()?);
        debug!(count = interfaces.len(), "enumerated network interfaces");
        Ok(interfaces)
    }
}

#[cfg(unix)]
fn host_entries() -> Result<Vec<RawInterfaceEntry>, CoreError> {
    use std::net::{Ipv4Addr, SocketAddrV4};

    use nix::ifaddrs::getifaddrs;
    use nix::net::if_::InterfaceFlags;
    use nix::sys::socket::SockaddrStorage;

    fn ipv4_of(addr: Option<&SockaddrStorage>) -> Option<Ipv4Addr> {
        addr.and_then(SockaddrStorage::as_sockaddr_in)
            .map(|sin| *SocketAddrV4::from(*sin).ip())
    }

    let entries = getifaddrs().map_err(|e| CoreError::Interfaces {
        reason: e.to_string(),
    })?;
    Ok(entries
        .map(|entry| {
            let ipv4 = ipv4_of(entry.address.as_ref()).map(|address| {
                let prefix = ipv4_of(entry.netmask.as_ref())
                    .map_or(32, Ipv4Binding::prefix_from_netmask);
                let broadcast = if entry.flags.contains(InterfaceFlags::IFF_BROADCAST) {
                    ipv4_of(entry.broadcast.as_ref())
                } else {
                    None
                };
                Ipv4Binding::new(address, prefix, broadcast)
            });
            RawInterfaceEntry {
                name: entry.interface_name,
                up: entry.flags.contains(InterfaceFlags::IFF_UP),
                loopback: entry.flags.contains(InterfaceFlags::IFF_LOOPBACK),
                ipv4,
            }
        })
        .collect())
}

// No interface flags here; the adapter list only carries operational ones.
#[cfg(not(unix))]
fn host_entries() -> Result<Vec<RawInterfaceEntry>, CoreError> {
    let raw = if_addrs::get_if_addrs().map_err(|e| CoreError::Interfaces {
        reason: e.to_string(),
    })?;
    Ok(raw
        .into_iter()
        .map(|entry| RawInterfaceEntry {
            loopback: entry.is_loopback(),
            up: true,
            ipv4: match &entry.addr {
                if_addrs::IfAddr::V4(v4) => Some(Ipv4Binding::new(
                    v4.ip,
                    Ipv4Binding::prefix_from_netmask(v4.netmask),
                    v4.broadcast,
                )),
                if_addrs::IfAddr::V6(_) => None,
            },
            name: entry.name,
        })
        .collect())
}

/// Descriptions of every usable (up, non-loopback) interface, sorted.
pub fn list_interfaces(source: &dyn InterfaceSource) -> Result<Vec<String>, CoreError> {
    let mut descriptions: Vec<String> = source
        .interfaces()?
        .iter()
        .filter(|iface| iface.is_usable())
        .map(NetworkInterface::describe)
        .collect();
    descriptions.sort();
    Ok(descriptions)
}

/// Descriptions of the interfaces that all saw link traffic, sorted.
///
/// Empty unless more than one interface is involved.
pub fn list_conflicting_interfaces(claimant: &dyn PresenceClaimant) -> Vec<String> {
    let matching = claimant.matching_interfaces();
    if matching.len() < 2 {
        return Vec::new();
    }
    let mut descriptions: Vec<String> = matching.iter().map(NetworkInterface::describe).collect();
    descriptions.sort();
    descriptions
}

// ── Troubleshooting report ───────────────────────────────────────

/// Interface report shown while no devices can be found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkReport {
    pub interfaces: Vec<String>,
    /// Set when the interfaces could not be listed at all.
    pub failure: Option<String>,
}

impl NetworkReport {
    /// Take a fresh snapshot. Enumeration failures end up in the report.
    pub fn collect(source: &dyn InterfaceSource) -> Self {
        match list_interfaces(source) {
            Ok(interfaces) => Self {
                interfaces,
                failure: None,
            },
            Err(e) => {
                warn!(error = %e, "network report without interface list");
                Self {
                    interfaces: Vec::new(),
                    failure: Some(e.to_string()),
                }
            }
        }
    }
}

impl fmt::Display for NetworkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "No DJ Link devices have been found yet.")?;
        if let Some(ref failure) = self.failure {
            return write!(f, "{failure}");
        }
        if self.interfaces.is_empty() {
            return write!(
                f,
                "No usable network interfaces were found. Connect this computer \
                 to the network your players and mixer are on."
            );
        }
        writeln!(
            f,
            "Make sure your players and mixer are powered on and connected to \
             the same network as one of these interfaces:"
        )?;
        for description in &self.interfaces {
            write!(f, "\n  {description}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::NO_IPV4_ADDRESSES;
    use crate::test_support::{FakeClaimant, FakeInterfaces};

    fn wired() -> NetworkInterface {
        NetworkInterface::new("en0")
            .with_display_name("Ethernet")
            .with_ipv4(Ipv4Binding::broadcast_capable(Ipv4Addr::new(10, 0, 0, 5), 24))
            .with_ipv4(Ipv4Binding::broadcast_capable(Ipv4Addr::new(10, 0, 0, 6), 24))
    }

    fn wifi() -> NetworkInterface {
        NetworkInterface::new("en1")
            .with_display_name("Wi-Fi")
            .with_ipv4(Ipv4Binding::broadcast_capable(Ipv4Addr::new(192, 168, 1, 20), 24))
    }

    #[test]
    fn lists_usable_interfaces_sorted() {
        let mut loopback = NetworkInterface::new("lo0")
            .with_ipv4(Ipv4Binding::new(Ipv4Addr::LOCALHOST, 8, None));
        loopback.loopback = true;
        let mut down = NetworkInterface::new("en5");
        down.up = false;
        let bare = NetworkInterface::new("bridge0").with_display_name("Bridge");

        let source = FakeInterfaces::new(vec![wifi(), loopback, wired(), down, bare]);
        assert_eq!(
            list_interfaces(&source).expect("interfaces"),
            vec![
                "Bridge (bridge0): No IPv4 addresses".to_owned(),
                "Ethernet (en0): 10.0.0.5/24, 10.0.0.6/24".to_owned(),
                "Wi-Fi (en1): 192.168.1.20/24".to_owned(),
            ]
        );
    }

    fn entry(
        name: &str,
        up: bool,
        loopback: bool,
        ipv4: Option<Ipv4Binding>,
    ) -> RawInterfaceEntry {
        RawInterfaceEntry {
            name: name.to_owned(),
            up,
            loopback,
            ipv4,
        }
    }

    #[test]
    fn host_entries_group_per_interface_with_flags() {
        let interfaces = group_entries(vec![
            entry("lo", true, true, Some(Ipv4Binding::new(Ipv4Addr::LOCALHOST, 8, None))),
            entry(
                "eth0",
                true,
                false,
                Some(Ipv4Binding::broadcast_capable(Ipv4Addr::new(10, 0, 0, 5), 24)),
            ),
            // IPv6 entry of the same interface.
            entry("eth0", true, false, None),
            entry(
                "ifb0",
                false,
                false,
                Some(Ipv4Binding::broadcast_capable(Ipv4Addr::new(10, 99, 0, 1), 24)),
            ),
            entry(
                "eth0",
                true,
                false,
                Some(Ipv4Binding::broadcast_capable(Ipv4Addr::new(10, 0, 0, 6), 24)),
            ),
            entry(
                "tun0",
                true,
                false,
                Some(Ipv4Binding::new(Ipv4Addr::new(172, 16, 0, 2), 32, None)),
            ),
        ]);

        let names: Vec<&str> = interfaces.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["lo", "eth0", "ifb0", "tun0"]);
        assert!(interfaces[0].loopback);
        assert!(!interfaces[2].up);
        assert_eq!(interfaces[1].ipv4_summary(), "10.0.0.5/24, 10.0.0.6/24");
        assert_eq!(interfaces[3].ipv4_summary(), NO_IPV4_ADDRESSES);

        assert_eq!(
            list_interfaces(&FakeInterfaces::new(interfaces)).expect("interfaces"),
            vec![
                "eth0 (eth0): 10.0.0.5/24, 10.0.0.6/24".to_owned(),
                "tun0 (tun0): No IPv4 addresses".to_owned(),
            ]
        );
    }

    #[test]
    fn enumeration_failures_propagate() {
        let source = FakeInterfaces::failing("permission denied");
        assert!(matches!(
            list_interfaces(&source),
            Err(CoreError::Interfaces { .. })
        ));

        let report = NetworkReport::collect(&source);
        assert!(report.interfaces.is_empty());
        assert!(report.to_string().contains("permission denied"));
    }

    #[test]
    fn single_matching_interface_is_no_conflict() {
        assert!(list_conflicting_interfaces(&FakeClaimant::online(1)).is_empty());
        assert!(
            list_conflicting_interfaces(&FakeClaimant::online(1).with_matching(vec![wired()]))
                .is_empty()
        );
    }

    #[test]
    fn multiple_matching_interfaces_are_listed_sorted() {
        let claimant = FakeClaimant::online(1).with_matching(vec![wifi(), wired()]);
        assert_eq!(
            list_conflicting_interfaces(&claimant),
            vec![
                "Ethernet (en0): 10.0.0.5/24, 10.0.0.6/24".to_owned(),
                "Wi-Fi (en1): 192.168.1.20/24".to_owned(),
            ]
        );
    }

    #[test]
    fn report_lists_each_interface_on_its_own_line() {
        let report = NetworkReport::collect(&FakeInterfaces::new(vec![wired(), wifi()]));
        let text = report.to_string();
        assert!(text.starts_with("No DJ Link devices have been found yet.\n"));
        assert!(text.ends_with(
            "\n  Ethernet (en0): 10.0.0.5/24, 10.0.0.6/24\n  Wi-Fi (en1): 192.168.1.20/24"
        ));
    }
}
