//! UDP adapters for the link collaborators the core drives.

mod claimant;
mod observer;
mod packet;

use std::net::Ipv4Addr;
use std::sync::Arc;

use arc_swap::ArcSwapOption;

pub use claimant::UdpPresenceClaimant;
pub use observer::UdpDeviceObserver;

/// Address our own presence announces from while a claim is held.
///
/// Shared between the claimant, which sets it, and the observer, which
/// must not sight our own keep-alives as a device.
#[derive(Debug, Clone, Default)]
pub struct LocalPresence(Arc<ArcSwapOption<Ipv4Addr>>);

impl LocalPresence {
    pub fn set(&self, address: Option<Ipv4Addr>) {
        self.0.store(address.map(Arc::new));
    }

    pub fn is(&self, address: Ipv4Addr) -> bool {
        self.0.load().as_deref() == Some(&address)
    }
}
