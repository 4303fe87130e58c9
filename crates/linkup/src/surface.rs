//! Terminal rendition of the acquisition surface.
//!
//! Indicators are `indicatif` spinners on stderr; the troubleshooting
//! report rides along as a multi-line spinner message so refreshes happen
//! in place. Alerts are printed below them. Operator input arrives from
//! Ctrl-C (quit) and from stdin (`o` + Enter continues offline). Every
//! Ctrl-C also counts as an interrupt, so one press that lands while a claim
//! is in flight still ends the online hold afterwards.

use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use tokio::sync::Notify;
use dashmap::DashMap;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use owo_colors::OwoColorize;
use tracing::debug;

use linkup_core::{AlertKind, IndicatorHandle, NetworkReport, SessionControl, SessionSurface};

const SEARCHING: &str = "Searching for DJ Link devices...";
const KEYS_HINT: &str = "Type o + Enter to continue offline, Ctrl-C to quit.";
const TICK: Duration = Duration::from_millis(100);

/// What a line typed by the operator asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorInput {
    Offline,
    Quit,
    Ignored,
}

impl OperatorInput {
    pub fn parse(line: &str) -> Self {
        match line.trim().to_ascii_lowercase().as_str() {
            "o" | "offline" => Self::Offline,
            "q" | "quit" => Self::Quit,
            _ => Self::Ignored,
        }
    }
}

pub struct TerminalSurface {
    indicators: DashMap<IndicatorHandle, ProgressBar>,
    next_handle: AtomicU64,
    control: ArcSwapOption<SessionControl>,
    interrupt: Notify,
    color: bool,
    hidden: bool,
}

impl TerminalSurface {
    pub fn new(color: bool, quiet: bool) -> Self {
        Self {
            indicators: DashMap::new(),
            next_handle: AtomicU64::new(0),
            control: ArcSwapOption::empty(),
            interrupt: Notify::new(),
            color,
            hidden: quiet,
        }
    }

    /// Route Ctrl-C and stdin lines to the current session's control.
    pub fn listen_for_operator(self: &Arc<Self>) {
        let surface = Arc::clone(self);
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                surface.interrupt();
            }
        });

        // Blocking reads stay off the runtime; the thread dies with the process.
        let surface = Arc::clone(self);
        std::thread::spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                surface.apply(OperatorInput::parse(&line));
            }
        });
    }

    /// Quit the current session, if any, and wake whoever waits in
    /// [`interrupted`](Self::interrupted).
    pub fn interrupt(&self) {
        self.apply(OperatorInput::Quit);
        // A stored permit survives until the next wait.
        self.interrupt.notify_one();
    }

    /// Resolves on the next Ctrl-C, or at once if one arrived since the
    /// last wait.
    pub async fn interrupted(&self) {
        self.interrupt.notified().await;
    }

    /// Apply operator input to the current session. Returns whether it took effect.
    pub fn apply(&self, input: OperatorInput) -> bool {
        let Some(control) = self.control.load_full() else {
            return false;
        };
        let applied = match input {
            OperatorInput::Offline => control.continue_offline(),
            OperatorInput::Quit => control.quit(),
            OperatorInput::Ignored => false,
        };
        if applied {
            debug!(?input, "operator input applied");
        }
        applied
    }

    fn show(&self, message: String, control: SessionControl) -> IndicatorHandle {
        self.control.store(Some(Arc::new(control)));

        let bar = if self.hidden {
            ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden())
        } else {
            ProgressBar::new_spinner()
        };
        let style = ProgressStyle::with_template(if self.color {
            "{spinner:.cyan} {msg}"
        } else {
            "{spinner} {msg}"
        })
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        bar.set_message(message);
        bar.enable_steady_tick(TICK);

        let handle = IndicatorHandle::new(self.next_handle.fetch_add(1, Ordering::Relaxed) + 1);
        self.indicators.insert(handle, bar);
        handle
    }

    fn troubleshooting_message(report: &NetworkReport) -> String {
        format!("{report}\n\n{KEYS_HINT}")
    }

    fn alert_text(&self, kind: AlertKind, title: &str, message: &str) -> String {
        let heading = match (kind, self.color) {
            (AlertKind::Warning, true) => format!("{} {}", "warning:".yellow().bold(), title.bold()),
            (AlertKind::Error, true) => format!("{} {}", "error:".red().bold(), title.bold()),
            (_, false) => format!("{}: {title}", kind.as_ref()),
        };
        let body: Vec<String> = message.lines().map(|line| format!("  {line}")).collect();
        format!("{heading}\n{}", body.join("\n"))
    }

    #[cfg(test)]
    fn message_of(&self, handle: IndicatorHandle) -> Option<String> {
        self.indicators.get(&handle).map(|bar| bar.message())
    }
}

impl SessionSurface for TerminalSurface {
    fn show_searching(&self, control: SessionControl) -> IndicatorHandle {
        self.show(format!("{SEARCHING}\n{KEYS_HINT}"), control)
    }

    fn show_troubleshooting(
        &self,
        report: &NetworkReport,
        control: SessionControl,
    ) -> IndicatorHandle {
        self.show(Self::troubleshooting_message(report), control)
    }

    fn refresh_troubleshooting(&self, handle: IndicatorHandle, report: &NetworkReport) {
        if let Some(bar) = self.indicators.get(&handle) {
            bar.set_message(Self::troubleshooting_message(report));
        }
    }

    fn dismiss(&self, handle: IndicatorHandle) {
        if let Some((_, bar)) = self.indicators.remove(&handle) {
            bar.finish_and_clear();
        }
    }

    fn alert(&self, kind: AlertKind, title: &str, message: &str) {
        if self.hidden && kind == AlertKind::Warning {
            return;
        }
        eprintln!("{}", self.alert_text(kind, title, message));
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn report(interfaces: &[&str]) -> NetworkReport {
        NetworkReport {
            interfaces: interfaces.iter().map(|s| (*s).to_owned()).collect(),
            failure: None,
        }
    }

    #[test]
    fn parses_operator_lines() {
        assert_eq!(OperatorInput::parse("o\n"), OperatorInput::Offline);
        assert_eq!(OperatorInput::parse(" Offline "), OperatorInput::Offline);
        assert_eq!(OperatorInput::parse("q"), OperatorInput::Quit);
        assert_eq!(OperatorInput::parse(""), OperatorInput::Ignored);
    }

    #[test]
    fn input_goes_to_the_latest_session_once() {
        let surface = TerminalSurface::new(false, true);
        assert!(!surface.apply(OperatorInput::Offline));

        let control = SessionControl::new();
        let handle = surface.show_searching(control.clone());
        assert!(surface.apply(OperatorInput::Offline));
        assert!(!surface.apply(OperatorInput::Offline));
        assert!(control.offline_requested());
        surface.dismiss(handle);
    }

    #[test]
    fn troubleshooting_refreshes_in_place() {
        let surface = TerminalSurface::new(false, true);
        let handle = surface.show_troubleshooting(&report(&[]), SessionControl::new());
        assert!(
            surface
                .message_of(handle)
                .expect("shown")
                .contains("No usable network interfaces")
        );

        surface.refresh_troubleshooting(handle, &report(&["Ethernet (en0): 10.0.0.5/24"]));
        let message = surface.message_of(handle).expect("still shown");
        assert!(message.contains("\n  Ethernet (en0): 10.0.0.5/24"));
        assert!(message.ends_with(KEYS_HINT));

        surface.dismiss(handle);
        assert_eq!(surface.message_of(handle), None);
        // Dismissing twice is harmless.
        surface.dismiss(handle);
    }

    #[tokio::test]
    async fn interrupt_quits_the_session_and_is_remembered() {
        let surface = TerminalSurface::new(false, true);
        let control = SessionControl::new();
        let handle = surface.show_searching(control.clone());
        surface.dismiss(handle);

        // Arrives while nobody is waiting, e.g. during the claim.
        surface.interrupt();
        assert!(control.quit_requested());
        tokio::time::timeout(Duration::from_secs(1), surface.interrupted())
            .await
            .expect("pending interrupt wakes the hold");
    }

    #[tokio::test(start_paused = true)]
    async fn interrupted_waits_for_the_next_press() {
        let surface = TerminalSurface::new(false, true);
        let waited = tokio::time::timeout(Duration::from_secs(5), surface.interrupted()).await;
        assert!(waited.is_err());
    }

    #[test]
    fn handles_are_unique() {
        let surface = TerminalSurface::new(false, true);
        let first = surface.show_searching(SessionControl::new());
        let second = surface.show_searching(SessionControl::new());
        assert_ne!(first, second);
    }

    #[test]
    fn plain_alerts_indent_the_message() {
        let surface = TerminalSurface::new(false, false);
        assert_eq!(
            surface.alert_text(AlertKind::Error, "Unreachable Device", "line one\nline two"),
            "error: Unreachable Device\n  line one\n  line two"
        );
    }
}
