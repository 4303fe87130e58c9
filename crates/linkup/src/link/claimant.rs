// ── Virtual presence ──
//
// Claims a player number on the interface the observed devices live on and
// keeps announcing it until dropped.

use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket as StdUdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use linkup_config::PresenceSettings;
use linkup_core::{
    ClaimError, Device, DeviceObserver, InterfaceSource, Ipv4Binding, NetworkInterface,
    PlayerNumber, PresenceClaimant, REAL_PLAYER_NUMBERS,
};

use super::{LocalPresence, packet};

/// Name the presence announces itself with.
const PRESENCE_NAME: &str = "linkup";

const ANNOUNCE_INTERVAL: Duration = Duration::from_millis(1500);

struct Claim {
    interface: NetworkInterface,
    binding: Ipv4Binding,
    player: PlayerNumber,
    announcer: CancellationToken,
}

/// [`PresenceClaimant`] that binds the status port and broadcasts keep-alives.
pub struct UdpPresenceClaimant {
    observer: Arc<dyn DeviceObserver>,
    interfaces: Arc<dyn InterfaceSource>,
    settings: PresenceSettings,
    use_real_player_number: AtomicBool,
    claim: ArcSwapOption<Claim>,
    local: LocalPresence,
    cancel: CancellationToken,
}

impl UdpPresenceClaimant {
    pub fn new(
        observer: Arc<dyn DeviceObserver>,
        interfaces: Arc<dyn InterfaceSource>,
        settings: PresenceSettings,
    ) -> Self {
        Self {
            observer,
            interfaces,
            settings,
            use_real_player_number: AtomicBool::new(false),
            claim: ArcSwapOption::empty(),
            local: LocalPresence::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Publish the claimed address so the observer can skip our keep-alives.
    #[must_use]
    pub fn with_local_presence(mut self, local: LocalPresence) -> Self {
        self.local = local;
        self
    }

    /// Leave the network. A later `start` claims afresh.
    pub fn stop(&self) {
        if let Some(claim) = self.claim.swap(None) {
            claim.announcer.cancel();
            self.local.set(None);
            info!(player = claim.player, "presence released");
        }
    }

    fn usable_interfaces(&self) -> Result<Vec<NetworkInterface>, ClaimError> {
        let interfaces = self
            .interfaces
            .interfaces()
            .map_err(|e| ClaimError::Interfaces {
                reason: e.to_string(),
            })?;
        Ok(interfaces
            .into_iter()
            .filter(NetworkInterface::is_usable)
            .collect())
    }

    fn bind(&self, address: Ipv4Addr) -> Result<UdpSocket, ClaimError> {
        let socket_addr = SocketAddrV4::new(address, self.settings.status_port);
        let bind_error = |e: std::io::Error| ClaimError::from_bind(socket_addr.into(), e);

        tokio::runtime::Handle::try_current().map_err(|e| bind_error(std::io::Error::other(e)))?;
        let socket = StdUdpSocket::bind(socket_addr).map_err(bind_error)?;
        socket.set_broadcast(true).map_err(bind_error)?;
        socket.set_nonblocking(true).map_err(bind_error)?;
        UdpSocket::from_std(socket).map_err(bind_error)
    }

    fn spawn_announcer(&self, socket: UdpSocket, claim: &Claim) {
        let Some(broadcast) = claim.binding.broadcast else {
            warn!(
                interface = %claim.interface.name,
                "claimed address cannot broadcast; presence is silent"
            );
            return;
        };
        let target = SocketAddrV4::new(broadcast, self.settings.announce_port);
        let keep_alive = packet::keep_alive(PRESENCE_NAME, claim.player, claim.binding.address);
        let cancel = claim.announcer.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(ANNOUNCE_INTERVAL);
            loop {
                tokio::select! {
                    () = cancel.cancelled() => return,
                    _ = ticker.tick() => {
                        if let Err(e) = socket.send_to(&keep_alive, target).await {
                            warn!(error = %e, %target, "keep-alive send failed");
                        }
                    }
                }
            }
        });
    }
}

impl PresenceClaimant for UdpPresenceClaimant {
    fn configure(&self, use_real_player_number: bool) {
        self.use_real_player_number
            .store(use_real_player_number, Ordering::Release);
    }

    fn start(&self) -> Result<PlayerNumber, ClaimError> {
        if let Some(claim) = self.claim.load_full() {
            return Ok(claim.player);
        }

        let devices = self.observer.current_devices();
        let first = devices.first().ok_or(ClaimError::NoDevices)?;
        let interface = best_interface(&self.usable_interfaces()?, &devices).ok_or(
            ClaimError::NoInterface {
                address: first.address,
            },
        )?;
        let binding = interface
            .ipv4
            .iter()
            .find(|binding| devices.iter().any(|d| binding.contains(d.address)))
            .cloned()
            .ok_or(ClaimError::NoInterface {
                address: first.address,
            })?;

        let player = choose_player(
            self.use_real_player_number.load(Ordering::Acquire),
            &devices,
            self.settings.virtual_player_number,
        )?;
        let socket = self.bind(binding.address)?;
        debug!(
            address = %binding.address,
            port = self.settings.status_port,
            "status socket bound"
        );

        let claim = Claim {
            interface,
            binding,
            player,
            announcer: self.cancel.child_token(),
        };
        self.local.set(Some(claim.binding.address));
        self.spawn_announcer(socket, &claim);
        info!(player, interface = %claim.interface.name, "presence online");
        self.claim.store(Some(Arc::new(claim)));
        Ok(player)
    }

    fn matching_interfaces(&self) -> Vec<NetworkInterface> {
        let devices = self.observer.current_devices();
        match self.usable_interfaces() {
            Ok(interfaces) => interfaces
                .into_iter()
                .filter(|iface| devices.iter().any(|d| iface.reaches(d.address)))
                .collect(),
            Err(e) => {
                warn!(error = %e, "cannot match interfaces against devices");
                Vec::new()
            }
        }
    }

    fn claimed_interface(&self) -> Option<NetworkInterface> {
        self.claim.load().as_ref().map(|claim| claim.interface.clone())
    }

    fn find_unreachable_peers(&self) -> Vec<Device> {
        let guard = self.claim.load();
        let Some(claim) = guard.as_ref() else {
            return Vec::new();
        };
        self.observer
            .current_devices()
            .into_iter()
            .filter(|device| !claim.interface.reaches(device.address))
            .collect()
    }
}

impl Drop for UdpPresenceClaimant {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Interface reaching the most devices; earliest in OS order on ties.
fn best_interface(interfaces: &[NetworkInterface], devices: &[Device]) -> Option<NetworkInterface> {
    let mut best: Option<(&NetworkInterface, usize)> = None;
    for iface in interfaces {
        let reached = devices.iter().filter(|d| iface.reaches(d.address)).count();
        if reached > 0 && best.is_none_or(|(_, most)| reached > most) {
            best = Some((iface, reached));
        }
    }
    best.map(|(iface, _)| iface.clone())
}

/// Lowest free real number when asked for one, else the configured virtual number.
fn choose_player(
    use_real_player_number: bool,
    devices: &[Device],
    virtual_number: PlayerNumber,
) -> Result<PlayerNumber, ClaimError> {
    if !use_real_player_number {
        return Ok(virtual_number);
    }
    REAL_PLAYER_NUMBERS
        .find(|n| devices.iter().all(|d| d.number != Some(*n)))
        .ok_or_else(|| ClaimError::NoPlayerNumber {
            range: format!(
                "{}-{}",
                REAL_PLAYER_NUMBERS.start(),
                REAL_PLAYER_NUMBERS.end()
            ),
        })
}
