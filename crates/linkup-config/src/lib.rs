//! Shared configuration for linkup tools.
//!
//! TOML settings merged with `LINKUP_` environment variables, and the
//! translation to `linkup_core::AcquisitionConfig`. The CLI adds flag
//! overrides on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use linkup_core::{AcquisitionConfig, MAX_PLAYER_NUMBER, PlayerNumber};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Claim one of the real player numbers (1-4) instead of a virtual one.
    #[serde(default)]
    pub use_real_player_number: bool,

    #[serde(default)]
    pub acquisition: AcquisitionSettings,

    #[serde(default)]
    pub presence: PresenceSettings,
}

/// Timing of the device search.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AcquisitionSettings {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Polls before the troubleshooting report is shown.
    #[serde(default = "default_search_budget")]
    pub search_budget: u32,

    /// Polls between troubleshooting refreshes.
    #[serde(default = "default_refresh_budget")]
    pub refresh_budget: u32,
}

impl Default for AcquisitionSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            search_budget: default_search_budget(),
            refresh_budget: default_refresh_budget(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    u64::try_from(linkup_core::config::DEFAULT_POLL_INTERVAL.as_millis()).unwrap_or(100)
}
fn default_search_budget() -> u32 {
    linkup_core::config::DEFAULT_SEARCH_BUDGET
}
fn default_refresh_budget() -> u32 {
    linkup_core::config::DEFAULT_REFRESH_BUDGET
}

/// Sockets and numbering of the virtual presence.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PresenceSettings {
    /// UDP port devices announce themselves on.
    #[serde(default = "default_announce_port")]
    pub announce_port: u16,

    /// UDP port the presence receives status traffic on.
    #[serde(default = "default_status_port")]
    pub status_port: u16,

    /// Player number claimed when real numbers are not requested.
    #[serde(default = "default_virtual_player_number")]
    pub virtual_player_number: PlayerNumber,

    /// Devices silent for this long are no longer considered visible.
    #[serde(default = "default_device_timeout_ms")]
    pub device_timeout_ms: u64,
}

impl Default for PresenceSettings {
    fn default() -> Self {
        Self {
            announce_port: default_announce_port(),
            status_port: default_status_port(),
            virtual_player_number: default_virtual_player_number(),
            device_timeout_ms: default_device_timeout_ms(),
        }
    }
}

fn default_announce_port() -> u16 {
    50000
}
fn default_status_port() -> u16 {
    50002
}
fn default_virtual_player_number() -> PlayerNumber {
    5
}
fn default_device_timeout_ms() -> u64 {
    10_000
}

impl Config {
    /// Reject settings the acquisition loop cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.acquisition.poll_interval_ms == 0 {
            return Err(ConfigError::Validation {
                field: "acquisition.poll_interval_ms".into(),
                reason: "must be greater than zero".into(),
            });
        }
        let number = self.presence.virtual_player_number;
        if !(1..=MAX_PLAYER_NUMBER).contains(&number) {
            return Err(ConfigError::Validation {
                field: "presence.virtual_player_number".into(),
                reason: format!("expected 1-{MAX_PLAYER_NUMBER}, got {number}"),
            });
        }
        if self.presence.announce_port == self.presence.status_port {
            return Err(ConfigError::Validation {
                field: "presence.status_port".into(),
                reason: format!(
                    "must differ from announce_port ({})",
                    self.presence.announce_port
                ),
            });
        }
        Ok(())
    }

    /// Translate into the core's runtime configuration.
    pub fn to_acquisition_config(&self) -> AcquisitionConfig {
        AcquisitionConfig {
            poll_interval: Duration::from_millis(self.acquisition.poll_interval_ms),
            search_budget: self.acquisition.search_budget,
            refresh_budget: self.acquisition.refresh_budget,
        }
    }

    pub fn device_timeout(&self) -> Duration {
        Duration::from_millis(self.presence.device_timeout_ms)
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "linkup", "linkup").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("linkup");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load a Config from a specific file + environment.
///
/// Nested keys use a double underscore, e.g.
/// `LINKUP_ACQUISITION__SEARCH_BUDGET=50`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("LINKUP_").split("__"))
        .extract()?;
    config.validate()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML, creating parent directories as needed.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = load_config_from(&dir.path().join("absent.toml")).expect("defaults load");
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.to_acquisition_config(), AcquisitionConfig::default());
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "use_real_player_number = true\n\n[acquisition]\nsearch_budget = 50\n",
        )
        .expect("write config");

        let cfg = load_config_from(&path).expect("config loads");
        assert!(cfg.use_real_player_number);
        assert_eq!(cfg.acquisition.search_budget, 50);
        assert_eq!(cfg.acquisition.refresh_budget, 20);
        assert_eq!(cfg.presence, PresenceSettings::default());
        assert_eq!(
            cfg.to_acquisition_config().escalation_delay(),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.presence.virtual_player_number = 7;
        cfg.acquisition.poll_interval_ms = 250;

        save_config_to(&cfg, &path).expect("save");
        assert_eq!(load_config_from(&path).expect("load"), cfg);
    }

    #[test]
    fn rejects_unusable_settings() {
        let mut cfg = Config::default();
        cfg.acquisition.poll_interval_ms = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Validation { .. })));

        let mut cfg = Config::default();
        cfg.presence.virtual_player_number = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Validation { .. })));

        let mut cfg = Config::default();
        cfg.presence.status_port = cfg.presence.announce_port;
        let err = cfg.validate().expect_err("ports collide");
        assert_eq!(
            err.to_string(),
            "invalid presence.status_port: must differ from announce_port (50000)"
        );
    }
}
