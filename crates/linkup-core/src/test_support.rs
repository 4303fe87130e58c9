// ── Test doubles for the link collaborators ──

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::diagnostics::{InterfaceSource, NetworkReport};
use crate::error::{ClaimError, CoreError};
use crate::model::{Device, NetworkInterface, PlayerNumber};
use crate::presence::{DeviceObserver, PresenceClaimant};
use crate::session::SessionControl;
use crate::surface::{AlertKind, IndicatorHandle, SessionSurface, StartupHooks};

// ── Observer ──

/// Returns no devices until poll `appear_at` (1-based), then `devices`.
#[derive(Default)]
pub struct FakeObserver {
    devices: Vec<Device>,
    appear_at: Option<usize>,
    polls: AtomicUsize,
    starts: AtomicUsize,
    quit_at: Mutex<Option<(usize, Arc<RecordingSurface>)>>,
}

impl FakeObserver {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn appearing_at(poll: usize, devices: Vec<Device>) -> Self {
        Self {
            devices,
            appear_at: Some(poll),
            ..Self::default()
        }
    }

    /// Press "quit" on the surface while answering poll `poll`.
    pub fn quit_at(&self, poll: usize, surface: Arc<RecordingSurface>) {
        *self.quit_at.lock().expect("lock") = Some((poll, surface));
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }
}

impl DeviceObserver for FakeObserver {
    fn start(&self) -> Result<(), CoreError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.starts() > 0
    }

    fn current_devices(&self) -> Vec<Device> {
        let poll = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((at, ref surface)) = *self.quit_at.lock().expect("lock") {
            if poll == at {
                surface.control().expect("control").quit();
            }
        }
        match self.appear_at {
            Some(at) if poll >= at => self.devices.clone(),
            _ => Vec::new(),
        }
    }
}

// ── Claimant ──

pub struct FakeClaimant {
    player: Option<PlayerNumber>,
    matching: Vec<NetworkInterface>,
    unreachable: Vec<Device>,
    configured: Mutex<Option<bool>>,
    starts: AtomicUsize,
}

impl FakeClaimant {
    pub fn online(player: PlayerNumber) -> Self {
        Self {
            player: Some(player),
            matching: Vec::new(),
            unreachable: Vec::new(),
            configured: Mutex::new(None),
            starts: AtomicUsize::new(0),
        }
    }

    /// Fails every start with an address conflict.
    pub fn failing() -> Self {
        Self {
            player: None,
            ..Self::online(0)
        }
    }

    pub fn with_matching(mut self, interfaces: Vec<NetworkInterface>) -> Self {
        self.matching = interfaces;
        self
    }

    pub fn with_unreachable(mut self, devices: Vec<Device>) -> Self {
        self.unreachable = devices;
        self
    }

    pub fn configured(&self) -> Option<bool> {
        *self.configured.lock().expect("lock")
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }
}

impl PresenceClaimant for FakeClaimant {
    fn configure(&self, use_real_player_number: bool) {
        *self.configured.lock().expect("lock") = Some(use_real_player_number);
    }

    fn start(&self) -> Result<PlayerNumber, ClaimError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.player.ok_or_else(|| ClaimError::AddressInUse {
            address: "10.0.0.5:50002".parse().expect("socket address"),
        })
    }

    fn matching_interfaces(&self) -> Vec<NetworkInterface> {
        self.matching.clone()
    }

    fn claimed_interface(&self) -> Option<NetworkInterface> {
        self.player?;
        self.matching.first().cloned()
    }

    fn find_unreachable_peers(&self) -> Vec<Device> {
        self.unreachable.clone()
    }
}

// ── Interfaces ──

pub struct FakeInterfaces {
    result: Result<Vec<NetworkInterface>, String>,
}

impl FakeInterfaces {
    pub fn new(interfaces: Vec<NetworkInterface>) -> Self {
        Self {
            result: Ok(interfaces),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            result: Err(reason.to_owned()),
        }
    }
}

impl InterfaceSource for FakeInterfaces {
    fn interfaces(&self) -> Result<Vec<NetworkInterface>, CoreError> {
        self.result.clone().map_err(|reason| CoreError::Interfaces { reason })
    }
}

// ── Surface ──

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    ShowSearching(IndicatorHandle),
    ShowTroubleshooting(IndicatorHandle, String),
    Refresh(IndicatorHandle, String),
    Dismiss(IndicatorHandle),
    Alert(AlertKind, String, String),
}

#[derive(Default)]
pub struct RecordingSurface {
    events: Mutex<Vec<SurfaceEvent>>,
    control: Mutex<Option<SessionControl>>,
    next_handle: AtomicU64,
    quit_after_refreshes: Mutex<Option<usize>>,
}

impl RecordingSurface {
    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.events.lock().expect("lock").clone()
    }

    /// Control of the most recently shown indicator.
    pub fn control(&self) -> Option<SessionControl> {
        self.control.lock().expect("lock").clone()
    }

    /// Press "quit" when the report has been refreshed `count` times.
    pub fn quit_after_refreshes(&self, count: usize) {
        *self.quit_after_refreshes.lock().expect("lock") = Some(count);
    }

    pub fn first_indicator(&self) -> Option<IndicatorHandle> {
        self.events().into_iter().find_map(|event| match event {
            SurfaceEvent::ShowSearching(handle) | SurfaceEvent::ShowTroubleshooting(handle, _) => {
                Some(handle)
            }
            _ => None,
        })
    }

    pub fn troubleshooting_shown(&self) -> usize {
        self.count(|event| matches!(event, SurfaceEvent::ShowTroubleshooting(..)))
    }

    pub fn refreshes(&self) -> usize {
        self.count(|event| matches!(event, SurfaceEvent::Refresh(..)))
    }

    pub fn dismissals_of(&self, handle: IndicatorHandle) -> usize {
        self.count(|event| *event == SurfaceEvent::Dismiss(handle))
    }

    pub fn alerts(&self) -> Vec<(AlertKind, String, String)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SurfaceEvent::Alert(kind, title, message) => Some((kind, title, message)),
                _ => None,
            })
            .collect()
    }

    fn count(&self, predicate: impl Fn(&SurfaceEvent) -> bool) -> usize {
        self.events
            .lock()
            .expect("lock")
            .iter()
            .filter(|event| predicate(event))
            .count()
    }

    fn record(&self, event: SurfaceEvent) {
        self.events.lock().expect("lock").push(event);
    }

    fn handle(&self) -> IndicatorHandle {
        IndicatorHandle::new(self.next_handle.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

impl SessionSurface for RecordingSurface {
    fn show_searching(&self, control: SessionControl) -> IndicatorHandle {
        let handle = self.handle();
        *self.control.lock().expect("lock") = Some(control);
        self.record(SurfaceEvent::ShowSearching(handle));
        handle
    }

    fn show_troubleshooting(
        &self,
        report: &NetworkReport,
        control: SessionControl,
    ) -> IndicatorHandle {
        let handle = self.handle();
        *self.control.lock().expect("lock") = Some(control);
        self.record(SurfaceEvent::ShowTroubleshooting(handle, report.to_string()));
        handle
    }

    fn refresh_troubleshooting(&self, handle: IndicatorHandle, report: &NetworkReport) {
        self.record(SurfaceEvent::Refresh(handle, report.to_string()));
        let limit = *self.quit_after_refreshes.lock().expect("lock");
        if limit.is_some_and(|limit| self.refreshes() >= limit) {
            if let Some(control) = self.control() {
                control.quit();
            }
        }
    }

    fn dismiss(&self, handle: IndicatorHandle) {
        self.record(SurfaceEvent::Dismiss(handle));
    }

    fn alert(&self, kind: AlertKind, title: &str, message: &str) {
        self.record(SurfaceEvent::Alert(kind, title.to_owned(), message.to_owned()));
    }
}

// ── Hooks ──

#[derive(Default)]
pub struct RecordingHooks {
    finishes: AtomicUsize,
    quits: AtomicUsize,
}

impl RecordingHooks {
    pub fn finishes(&self) -> usize {
        self.finishes.load(Ordering::SeqCst)
    }

    pub fn quits(&self) -> usize {
        self.quits.load(Ordering::SeqCst)
    }
}

impl StartupHooks for RecordingHooks {
    fn finish_startup(&self) {
        self.finishes.fetch_add(1, Ordering::SeqCst);
    }

    fn application_quit(&self) {
        self.quits.fetch_add(1, Ordering::SeqCst);
    }
}
