//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use linkup_config::ConfigError;
use linkup_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFLICT: i32 = 6;
    pub const NETWORK: i32 = 7;
    /// Operator asked to quit (128 + SIGINT).
    pub const INTERRUPTED: i32 = 130;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Network ──────────────────────────────────────────────────────
    #[error("Cannot inspect the local network: {reason}")]
    #[diagnostic(
        code(linkup::network),
        help(
            "linkup needs to list interfaces and listen on UDP port {port}.\n\
             Check that no other DJ software is holding the port, then retry."
        )
    )]
    Network { reason: String, port: u16 },

    // ── Acquisition ──────────────────────────────────────────────────
    #[error("Acquisition failed: {message}")]
    #[diagnostic(code(linkup::acquisition))]
    Acquisition { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(linkup::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration file already exists at {path}")]
    #[diagnostic(
        code(linkup::config_exists),
        help("Use --force to overwrite it, or edit the file directly.")
    )]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(
        code(linkup::config),
        help("Fix the file, or start over with: linkup config init --force")
    )]
    Config(ConfigError),

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(linkup::io))]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Network { .. } => exit_code::NETWORK,
            Self::Validation { .. } | Self::Config(_) => exit_code::USAGE,
            Self::ConfigExists { .. } => exit_code::CONFLICT,
            Self::Acquisition { .. } | Self::Io(_) => exit_code::GENERAL,
        }
    }
}

// ── Conversions ──────────────────────────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config(other),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ObserverStart { port, reason } => Self::Network { reason, port },
            CoreError::Interfaces { reason } => Self::Network {
                reason,
                port: linkup_config::PresenceSettings::default().announce_port,
            },
            CoreError::AlreadyRunning => Self::Acquisition {
                message: "another attempt is already running".into(),
            },
            CoreError::Worker { message } => Self::Acquisition { message },
        }
    }
}
