// ── Session UI surface ──
//
// The presentation contract the acquisition loop drives. Implementations
// marshal each call onto their own UI thread and return immediately; the
// loop never waits for the operator to acknowledge anything.

use std::fmt;

use serde::Serialize;
use strum::{AsRefStr, Display};

use crate::diagnostics::NetworkReport;
use crate::session::SessionControl;

/// Opaque reference to an indicator shown by a [`SessionSurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndicatorHandle(u64);

impl IndicatorHandle {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for IndicatorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "indicator#{}", self.0)
    }
}

/// Severity of an operator alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Warning,
    Error,
}

/// Presentation layer driven by the acquisition loop.
pub trait SessionSurface: Send + Sync {
    /// Show the "searching for devices" indicator.
    fn show_searching(&self, control: SessionControl) -> IndicatorHandle;

    /// Show the troubleshooting report.
    fn show_troubleshooting(&self, report: &NetworkReport, control: SessionControl)
    -> IndicatorHandle;

    /// Replace the report of an indicator returned by `show_troubleshooting`.
    fn refresh_troubleshooting(&self, handle: IndicatorHandle, report: &NetworkReport);

    /// Remove an indicator.
    fn dismiss(&self, handle: IndicatorHandle);

    /// Fire-and-forget notification.
    fn alert(&self, kind: AlertKind, title: &str, message: &str);
}

/// What happens after an acquisition attempt ends.
pub trait StartupHooks: Send + Sync {
    /// Continue application startup. Runs once after every outcome except quit.
    fn finish_startup(&self);

    /// Shut the application down. Runs instead of `finish_startup` on quit.
    fn application_quit(&self);
}
