// ── Acquisition state machine ──
//
// Searches the network for link devices, escalates to troubleshooting when
// none show up, claims a virtual presence once they do, and reports
// topology problems found after claiming. The operator can continue
// offline or quit at any poll.

use std::fmt::{self, Write as _};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::AcquisitionConfig;
use crate::diagnostics::{InterfaceSource, NetworkReport, list_conflicting_interfaces};
use crate::error::CoreError;
use crate::model::{Device, NetworkInterface, PlayerNumber};
use crate::presence::{DeviceObserver, PresenceClaimant};
use crate::session::{AcquisitionSession, Mode, SessionControl};
use crate::surface::{AlertKind, SessionSurface, StartupHooks};

pub const CLAIM_FAILED_TITLE: &str = "Unable to Go Online";
pub const CONFLICT_TITLE: &str = "Multiple Network Interfaces Found";

// ── AcquisitionState ─────────────────────────────────────────────

/// Acquisition state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionState {
    Idle,
    Searching,
    Troubleshooting,
    Claiming,
    Online { player: PlayerNumber },
    ClaimFailed,
    Offline,
    Quit,
}

impl fmt::Display for AcquisitionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Searching => f.write_str("searching"),
            Self::Troubleshooting => f.write_str("troubleshooting"),
            Self::Claiming => f.write_str("claiming"),
            Self::Online { player } => write!(f, "online (player {player})"),
            Self::ClaimFailed => f.write_str("claim failed"),
            Self::Offline => f.write_str("offline"),
            Self::Quit => f.write_str("quit"),
        }
    }
}

/// How an acquisition attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Online { player: PlayerNumber },
    ClaimFailed,
    Offline,
    Quit,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&AcquisitionState::from(*self), f)
    }
}

impl From<Outcome> for AcquisitionState {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Online { player } => Self::Online { player },
            Outcome::ClaimFailed => Self::ClaimFailed,
            Outcome::Offline => Self::Offline,
            Outcome::Quit => Self::Quit,
        }
    }
}

/// Result of a single poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// Sleep one cadence and poll again.
    Continue,
    /// Devices are visible; go online.
    Claim,
    /// The operator ended the attempt.
    Done(Outcome),
}

/// Everything the state machine talks to, injected by the application.
#[derive(Clone)]
pub struct Collaborators {
    pub observer: Arc<dyn DeviceObserver>,
    pub claimant: Arc<dyn PresenceClaimant>,
    pub interfaces: Arc<dyn InterfaceSource>,
    pub surface: Arc<dyn SessionSurface>,
    pub hooks: Arc<dyn StartupHooks>,
}

// ── Acquisition ──────────────────────────────────────────────────

/// Drives online-presence acquisition.
///
/// Cheaply cloneable via `Arc<AcquisitionInner>`. At most one attempt runs
/// at a time; [`run()`](Self::run) returns [`CoreError::AlreadyRunning`]
/// while another attempt is in flight.
#[derive(Clone)]
pub struct Acquisition {
    inner: Arc<AcquisitionInner>,
}

struct AcquisitionInner {
    config: AcquisitionConfig,
    parts: Collaborators,
    state: watch::Sender<AcquisitionState>,
    active: AtomicBool,
}

impl Acquisition {
    pub fn new(config: AcquisitionConfig, parts: Collaborators) -> Self {
        let (state, _) = watch::channel(AcquisitionState::Idle);
        Self {
            inner: Arc::new(AcquisitionInner {
                config,
                parts,
                state,
                active: AtomicBool::new(false),
            }),
        }
    }

    pub fn config(&self) -> &AcquisitionConfig {
        &self.inner.config
    }

    /// Subscribe to state changes.
    pub fn state(&self) -> watch::Receiver<AcquisitionState> {
        self.inner.state.subscribe()
    }

    /// Run the attempt on the tokio runtime, off the caller's thread.
    pub fn spawn(&self, use_real_player_number: bool) -> JoinHandle<Result<Outcome, CoreError>> {
        let acquisition = self.clone();
        tokio::spawn(async move { acquisition.run(use_real_player_number).await })
    }

    /// Run one acquisition attempt to its terminal outcome, then hand
    /// control to the startup hooks.
    ///
    /// `use_real_player_number` is captured here and used unchanged when
    /// the presence is claimed.
    pub async fn run(&self, use_real_player_number: bool) -> Result<Outcome, CoreError> {
        let _guard = ActiveGuard::acquire(&self.inner.active)?;
        let parts = &self.inner.parts;

        if let Err(e) = parts.observer.start() {
            warn!(error = %e, "device observer did not start; devices cannot be seen");
        }

        let control = SessionControl::new();
        let indicator = parts.surface.show_searching(control.clone());
        let mut session = AcquisitionSession::new(
            control,
            indicator,
            self.inner.config.search_budget,
            use_real_player_number,
        );
        self.publish(AcquisitionState::Searching);
        info!(
            budget = self.inner.config.search_budget,
            escalation_delay = ?self.inner.config.escalation_delay(),
            use_real_player_number, "searching for DJ Link devices"
        );

        let outcome = loop {
            match self.poll(&mut session) {
                Step::Continue => tokio::time::sleep(self.inner.config.poll_interval).await,
                Step::Claim => break self.claim(&session),
                Step::Done(outcome) => break outcome,
            }
        };

        self.publish(outcome.into());
        info!(%outcome, "acquisition finished");

        if outcome == Outcome::Quit {
            parts.hooks.application_quit();
        } else {
            parts.hooks.finish_startup();
        }
        Ok(outcome)
    }

    /// One poll of the loop, in priority order: quit, offline, devices,
    /// budget.
    pub(crate) fn poll(&self, session: &mut AcquisitionSession) -> Step {
        let parts = &self.inner.parts;

        if session.control().quit_requested() {
            parts.surface.dismiss(session.indicator());
            return Step::Done(Outcome::Quit);
        }
        if session.control().offline_requested() {
            parts.surface.dismiss(session.indicator());
            return Step::Done(Outcome::Offline);
        }

        let devices = parts.observer.current_devices();
        if !devices.is_empty() {
            debug!(count = devices.len(), mode = %session.mode(), "devices sighted");
            return Step::Claim;
        }

        if session.budget_exhausted() {
            let report = NetworkReport::collect(parts.interfaces.as_ref());
            let refresh_budget = self.inner.config.refresh_budget;
            match session.mode() {
                Mode::Searching => {
                    parts.surface.dismiss(session.indicator());
                    let handle = parts
                        .surface
                        .show_troubleshooting(&report, session.control().clone());
                    session.escalate(handle, refresh_budget);
                    self.publish(AcquisitionState::Troubleshooting);
                    info!(
                        interfaces = report.interfaces.len(),
                        refresh_period = ?self.inner.config.refresh_period(),
                        "no devices found; showing network troubleshooting"
                    );
                }
                Mode::Troubleshooting => {
                    parts
                        .surface
                        .refresh_troubleshooting(session.indicator(), &report);
                    session.rearm(refresh_budget);
                    debug!(
                        interfaces = report.interfaces.len(),
                        "refreshed network troubleshooting"
                    );
                }
            }
            return Step::Continue;
        }

        session.spend_try();
        Step::Continue
    }

    /// Go online. Claim failures and topology problems become alerts; none
    /// of them sends the session back to searching.
    fn claim(&self, session: &AcquisitionSession) -> Outcome {
        let parts = &self.inner.parts;

        parts.surface.dismiss(session.indicator());
        self.publish(AcquisitionState::Claiming);

        parts.claimant.configure(session.use_real_player_number());
        let player = match parts.claimant.start() {
            Ok(player) => player,
            Err(e) => {
                error!(error = %e, "could not claim a presence on the network");
                parts.surface.alert(
                    AlertKind::Error,
                    CLAIM_FAILED_TITLE,
                    &claim_failed_message(&e),
                );
                return Outcome::ClaimFailed;
            }
        };
        info!(player, "claimed presence on the network");

        let conflicts = list_conflicting_interfaces(parts.claimant.as_ref());
        if !conflicts.is_empty() {
            warn!(count = conflicts.len(), "link traffic seen on several interfaces");
            parts
                .surface
                .alert(AlertKind::Warning, CONFLICT_TITLE, &conflict_message(&conflicts));
        }

        let mut unreachable = parts.claimant.find_unreachable_peers();
        if !unreachable.is_empty() {
            unreachable.sort_by_key(Device::description);
            let claimed = parts.claimant.claimed_interface();
            warn!(count = unreachable.len(), "devices unreachable from claimed interface");
            parts.surface.alert(
                AlertKind::Error,
                unreachable_title(unreachable.len()),
                &unreachable_message(&unreachable, claimed.as_ref()),
            );
        }

        Outcome::Online { player }
    }

    fn publish(&self, state: AcquisitionState) {
        self.inner.state.send_replace(state);
    }
}

/// Marks the acquisition busy for the lifetime of one attempt.
struct ActiveGuard<'a>(&'a AtomicBool);

impl<'a> ActiveGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, CoreError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| CoreError::AlreadyRunning)?;
        Ok(Self(flag))
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ── Alert text ───────────────────────────────────────────────────

fn claim_failed_message(err: &crate::error::ClaimError) -> String {
    let mut message = format!("Could not join the DJ Link network: {err}.");
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        let _ = write!(message, "\nCaused by: {cause}");
        source = cause.source();
    }
    message.push_str("\n\nContinuing offline.");
    message
}

fn conflict_message(interfaces: &[String]) -> String {
    let mut message = String::from(
        "DJ Link traffic was seen on more than one network interface. This can \
         cause unreliable communication with your devices; connect them through \
         a single interface:\n",
    );
    for description in interfaces {
        message.push_str("\n  ");
        message.push_str(description);
    }
    message
}

fn unreachable_title(count: usize) -> &'static str {
    if count == 1 {
        "Unreachable Device"
    } else {
        "Unreachable Devices"
    }
}

fn unreachable_message(devices: &[Device], claimed: Option<&NetworkInterface>) -> String {
    let (count, noun, verb) = if devices.len() == 1 {
        ("1".to_owned(), "device", "is")
    } else {
        (devices.len().to_string(), "devices", "are")
    };
    let location = claimed.map_or_else(
        || "the network interface in use".to_owned(),
        |iface| format!("interface {}", iface.describe()),
    );
    let mut message = format!(
        "{count} {noun} {verb} visible but cannot be reached from {location}. \
         Check that every device is on the same subnet:\n"
    );
    for device in devices {
        message.push_str("\n  ");
        message.push_str(&device.description());
    }
    message
}
