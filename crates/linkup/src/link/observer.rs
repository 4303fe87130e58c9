// ── Passive device observer ──
//
// Listens on the announcement port and remembers who has been talking.
// Sightings expire so a device that is unplugged drops out of the list.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket as StdUdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use linkup_core::{CoreError, Device, DeviceObserver};

use super::{LocalPresence, packet};

struct Sighting {
    device: Device,
    last_seen: Instant,
}

/// [`DeviceObserver`] backed by a UDP socket on the announcement port.
pub struct UdpDeviceObserver {
    port: u16,
    timeout: Duration,
    sightings: Arc<DashMap<Ipv4Addr, Sighting>>,
    running: Arc<AtomicBool>,
    local: LocalPresence,
    cancel: CancellationToken,
}

impl UdpDeviceObserver {
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self {
            port,
            timeout,
            sightings: Arc::new(DashMap::new()),
            running: Arc::new(AtomicBool::new(false)),
            local: LocalPresence::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Skip announcements coming from our own presence.
    #[must_use]
    pub fn with_local_presence(mut self, local: LocalPresence) -> Self {
        self.local = local;
        self
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Stop listening. Sightings already recorded are kept until they expire.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    fn record(sightings: &DashMap<Ipv4Addr, Sighting>, local: &LocalPresence, device: Device) {
        let address = device.address;
        if local.is(address) {
            trace!(%address, "ignored own keep-alive");
            return;
        }
        let fresh = sightings
            .insert(
                address,
                Sighting {
                    device,
                    last_seen: Instant::now(),
                },
            )
            .is_none();
        if fresh {
            debug!(%address, "new device sighted");
        }
    }

    fn bind(&self) -> Result<UdpSocket, CoreError> {
        let start_error = |reason: String| CoreError::ObserverStart {
            port: self.port,
            reason,
        };
        tokio::runtime::Handle::try_current().map_err(|e| start_error(e.to_string()))?;

        let address = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, self.port);
        let socket = StdUdpSocket::bind(address).map_err(|e| start_error(e.to_string()))?;
        socket
            .set_nonblocking(true)
            .map_err(|e| start_error(e.to_string()))?;
        UdpSocket::from_std(socket).map_err(|e| start_error(e.to_string()))
    }
}

impl DeviceObserver for UdpDeviceObserver {
    fn start(&self) -> Result<(), CoreError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }

        let socket = match self.bind() {
            Ok(socket) => socket,
            Err(e) => {
                self.running.store(false, Ordering::Release);
                return Err(e);
            }
        };
        info!(port = self.port, "listening for DJ Link announcements");

        let sightings = Arc::clone(&self.sightings);
        let running = Arc::clone(&self.running);
        let local = self.local.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            receive_loop(&socket, &sightings, &local, &cancel).await;
            running.store(false, Ordering::Release);
        });
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn current_devices(&self) -> Vec<Device> {
        let timeout = self.timeout;
        self.sightings.retain(|address, sighting| {
            let alive = sighting.last_seen.elapsed() < timeout;
            if !alive {
                debug!(%address, "device sighting expired");
            }
            alive
        });
        let mut devices: Vec<Device> = self
            .sightings
            .iter()
            .map(|entry| entry.device.clone())
            .collect();
        devices.sort_by_key(|device| device.address);
        devices
    }
}

impl Drop for UdpDeviceObserver {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn receive_loop(
    socket: &UdpSocket,
    sightings: &DashMap<Ipv4Addr, Sighting>,
    local: &LocalPresence,
    cancel: &CancellationToken,
) {
    let mut buf = [0_u8; 1500];
    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                debug!("device observer stopped");
                return;
            }
            received = socket.recv_from(&mut buf) => match received {
                Ok((len, SocketAddr::V4(from))) => {
                    let data = buf.get(..len).unwrap_or_default();
                    match packet::parse_announcement(data, *from.ip()) {
                        Some(device) => UdpDeviceObserver::record(sightings, local, device),
                        None => trace!(%from, len, "ignored non-link datagram"),
                    }
                }
                Ok((_, from)) => trace!(%from, "ignored IPv6 datagram"),
                Err(e) => warn!(error = %e, "announcement receive failed"),
            },
        }
    }
}
