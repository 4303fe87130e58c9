//! `linkup acquire`: run the acquisition with the UDP adapters and the
//! terminal surface, then hold the presence until Ctrl-C.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use linkup_core::{
    Acquisition, Collaborators, CoreError, InterfaceSource, Outcome, PlayerNumber,
    PresenceClaimant, SystemInterfaces,
};

use crate::cli::{AcquireArgs, GlobalOpts};
use crate::config;
use crate::error::{CliError, exit_code};
use crate::hooks::{CliHooks, Lifecycle};
use crate::link::{LocalPresence, UdpDeviceObserver, UdpPresenceClaimant};
use crate::output;
use crate::surface::TerminalSurface;

#[derive(Debug, Serialize)]
struct AcquireSummary {
    outcome: String,
    player: Option<PlayerNumber>,
    interface: Option<String>,
}

fn detail(summary: &AcquireSummary) -> String {
    let mut lines = vec![format!("Outcome:   {}", summary.outcome)];
    if let Some(player) = summary.player {
        lines.push(format!("Player:    {player}"));
    }
    if let Some(ref interface) = summary.interface {
        lines.push(format!("Interface: {interface}"));
    }
    lines.join("\n")
}

/// Exit code for an attempt's outcome.
fn outcome_exit_code(outcome: Outcome) -> i32 {
    match outcome {
        Outcome::Online { .. } | Outcome::Offline => exit_code::SUCCESS,
        Outcome::ClaimFailed => exit_code::GENERAL,
        Outcome::Quit => exit_code::INTERRUPTED,
    }
}

pub async fn handle(args: AcquireArgs, global: &GlobalOpts) -> Result<i32, CliError> {
    let mut cfg = config::load(global)?;
    config::apply_acquire_overrides(&mut cfg, &args)?;

    let interfaces: Arc<dyn InterfaceSource> = Arc::new(SystemInterfaces);
    let local = LocalPresence::default();
    let observer = Arc::new(
        UdpDeviceObserver::new(cfg.presence.announce_port, cfg.device_timeout())
            .with_local_presence(local.clone()),
    );
    let claimant = Arc::new(
        UdpPresenceClaimant::new(observer.clone(), Arc::clone(&interfaces), cfg.presence.clone())
            .with_local_presence(local),
    );
    let surface = Arc::new(TerminalSurface::new(
        output::should_color(&global.color, &std::io::stderr()),
        global.quiet,
    ));
    let hooks = Arc::new(CliHooks::new());
    surface.listen_for_operator();

    let acquisition = Acquisition::new(
        cfg.to_acquisition_config(),
        Collaborators {
            observer: observer.clone(),
            claimant: claimant.clone(),
            interfaces,
            surface: surface.clone(),
            hooks: hooks.clone(),
        },
    );

    let mut state = acquisition.state();
    let watcher = tokio::spawn(async move {
        while state.changed().await.is_ok() {
            debug!(state = %*state.borrow_and_update(), "acquisition state changed");
        }
    });

    let outcome = acquisition
        .spawn(cfg.use_real_player_number)
        .await
        .map_err(CoreError::from)??;
    watcher.abort();

    if hooks.lifecycle() == Lifecycle::Quitting {
        observer.stop();
        return Ok(exit_code::INTERRUPTED);
    }

    let summary = AcquireSummary {
        outcome: outcome.to_string(),
        player: match outcome {
            Outcome::Online { player } => Some(player),
            _ => None,
        },
        interface: claimant.claimed_interface().map(|iface| iface.describe()),
    };
    let out = output::render_single(&global.output, &summary, detail, |s| s.outcome.clone());
    output::print_output(&out, global.quiet);

    if let Outcome::Online { player } = outcome {
        if !args.once {
            if !global.quiet {
                eprintln!("Online as player {player}. Press Ctrl-C to leave the network.");
            }
            surface.interrupted().await;
        }
        claimant.stop();
    }
    observer.stop();
    Ok(outcome_exit_code(outcome))
}
