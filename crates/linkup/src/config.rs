//! CLI configuration: a thin wrapper around `linkup_config` shared types.
//!
//! Adds resolution that respects `--config` and the per-command flag
//! overrides of `acquire`.

use std::path::PathBuf;

use crate::cli::{AcquireArgs, GlobalOpts};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use linkup_config::{Config, config_path, load_config_from, save_config_to};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Config file in effect: `--config` / `LINKUP_CONFIG`, else the platform default.
pub fn resolve_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(load_config_from(&resolve_path(global))?)
}

/// Fold `acquire` flags over the loaded config. Flags win.
pub fn apply_acquire_overrides(config: &mut Config, args: &AcquireArgs) -> Result<(), CliError> {
    if args.real_player_number {
        config.use_real_player_number = true;
    }
    if let Some(number) = args.player {
        config.presence.virtual_player_number = number;
    }
    config.validate()?;
    Ok(())
}
