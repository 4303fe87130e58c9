// ── Acquisition session ──
//
// The single in-flight acquisition attempt. Cancellation flags are shared
// with the presentation layer through `SessionControl`; everything else is
// owned by the poll loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use strum::Display;

use crate::surface::IndicatorHandle;

/// Which indicator the session is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Mode {
    Searching,
    Troubleshooting,
}

#[derive(Debug, Default)]
struct SessionFlags {
    continue_offline: AtomicBool,
    quit: AtomicBool,
}

/// Operator-side handle on the session's cancellation flags.
///
/// Handed to the surface with each indicator; safe to trigger from any
/// thread. Each flag can be raised once and is never lowered.
#[derive(Debug, Clone, Default)]
pub struct SessionControl {
    flags: Arc<SessionFlags>,
}

impl SessionControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the session to stop searching and continue offline.
    ///
    /// Returns `false` if this was already requested.
    pub fn continue_offline(&self) -> bool {
        raise(&self.flags.continue_offline)
    }

    /// Ask the session to stop searching and quit the application.
    ///
    /// Returns `false` if this was already requested.
    pub fn quit(&self) -> bool {
        raise(&self.flags.quit)
    }

    pub fn offline_requested(&self) -> bool {
        self.flags.continue_offline.load(Ordering::Acquire)
    }

    pub fn quit_requested(&self) -> bool {
        self.flags.quit.load(Ordering::Acquire)
    }
}

fn raise(flag: &AtomicBool) -> bool {
    flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_ok()
}

/// State of one acquisition attempt, owned by the poll loop.
#[derive(Debug)]
pub struct AcquisitionSession {
    control: SessionControl,
    tries_remaining: u32,
    use_real_player_number: bool,
    indicator: IndicatorHandle,
    mode: Mode,
}

impl AcquisitionSession {
    pub(crate) fn new(
        control: SessionControl,
        indicator: IndicatorHandle,
        search_budget: u32,
        use_real_player_number: bool,
    ) -> Self {
        Self {
            control,
            tries_remaining: search_budget,
            use_real_player_number,
            indicator,
            mode: Mode::Searching,
        }
    }

    pub fn control(&self) -> &SessionControl {
        &self.control
    }

    pub fn tries_remaining(&self) -> u32 {
        self.tries_remaining
    }

    pub fn use_real_player_number(&self) -> bool {
        self.use_real_player_number
    }

    pub fn indicator(&self) -> IndicatorHandle {
        self.indicator
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub(crate) fn budget_exhausted(&self) -> bool {
        self.tries_remaining == 0
    }

    pub(crate) fn spend_try(&mut self) {
        self.tries_remaining = self.tries_remaining.saturating_sub(1);
    }

    /// Swap the searching indicator for the troubleshooting one.
    pub(crate) fn escalate(&mut self, indicator: IndicatorHandle, refresh_budget: u32) {
        debug_assert_eq!(self.mode, Mode::Searching);
        self.indicator = indicator;
        self.mode = Mode::Troubleshooting;
        self.tries_remaining = refresh_budget;
    }

    pub(crate) fn rearm(&mut self, refresh_budget: u32) {
        self.tries_remaining = refresh_budget;
    }
}
