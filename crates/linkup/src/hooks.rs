//! Application lifecycle driven by the acquisition's startup hooks.

use strum::Display;
use tokio::sync::watch;
use tracing::info;

use linkup_core::StartupHooks;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Lifecycle {
    Starting,
    Running,
    Quitting,
}

/// [`StartupHooks`] that publish the lifecycle for the command to act on.
pub struct CliHooks {
    lifecycle: watch::Sender<Lifecycle>,
}

impl CliHooks {
    pub fn new() -> Self {
        let (lifecycle, _) = watch::channel(Lifecycle::Starting);
        Self { lifecycle }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        *self.lifecycle.borrow()
    }
}

impl Default for CliHooks {
    fn default() -> Self {
        Self::new()
    }
}

impl StartupHooks for CliHooks {
    fn finish_startup(&self) {
        self.lifecycle.send_replace(Lifecycle::Running);
        info!("startup finished");
    }

    fn application_quit(&self) {
        self.lifecycle.send_replace(Lifecycle::Quitting);
        info!("quit requested by operator");
    }
}
