//! Online-presence acquisition for DJ Link tools.
//!
//! This crate owns the logic that gets an application onto a DJ Link
//! network, independent of any UI toolkit or link library:
//!
//! - **[`Acquisition`]**: the state machine. [`run()`](Acquisition::run)
//!   polls the [`DeviceObserver`] on a fixed cadence, escalates to a network
//!   troubleshooting report when nothing shows up, claims a presence through
//!   the [`PresenceClaimant`] once devices are sighted, and raises alerts for
//!   claim failures, multi-interface conflicts and unreachable devices.
//!
//! - **[`SessionSurface`]** / **[`SessionControl`]**: the presentation
//!   contract. The surface shows and dismisses indicators and alerts; the
//!   control lets the operator continue offline or quit from any thread.
//!
//! - **Diagnostics** ([`diagnostics`]): interface listing and conflict
//!   detection used by the troubleshooting report.
//!
//! Collaborators are injected through [`Collaborators`]; nothing here is a
//! process-wide singleton.

pub mod acquisition;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod model;
pub mod presence;
pub mod session;
pub mod surface;

#[cfg(test)]
mod test_support;

// ── Primary re-exports ──────────────────────────────────────────────
pub use acquisition::{Acquisition, AcquisitionState, Collaborators, Outcome};
pub use config::AcquisitionConfig;
pub use diagnostics::{
    InterfaceSource, NetworkReport, SystemInterfaces, list_conflicting_interfaces, list_interfaces,
};
pub use error::{ClaimError, CoreError};
pub use presence::{DeviceObserver, PresenceClaimant};
pub use session::{AcquisitionSession, Mode, SessionControl};
pub use surface::{AlertKind, IndicatorHandle, SessionSurface, StartupHooks};

pub use model::{
    Device, Ipv4Binding, MAX_PLAYER_NUMBER, NO_IPV4_ADDRESSES, NetworkInterface, PlayerNumber,
    REAL_PLAYER_NUMBERS,
};
