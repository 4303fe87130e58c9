// ── Core error types ──
//
// `CoreError` covers infrastructure failures of the acquisition machinery.
// `ClaimError` explains why a presence could not be established; it never
// escapes `Acquisition::run`, it is turned into an operator alert instead.

use std::net::{Ipv4Addr, SocketAddr};

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Acquisition errors ───────────────────────────────────────────
    #[error("An acquisition attempt is already in progress")]
    AlreadyRunning,

    #[error("Acquisition worker failed: {message}")]
    Worker { message: String },

    // ── Collaborator errors ──────────────────────────────────────────
    #[error("Cannot start device observer on port {port}: {reason}")]
    ObserverStart { port: u16, reason: String },

    #[error("Cannot list network interfaces: {reason}")]
    Interfaces { reason: String },
}

impl From<tokio::task::JoinError> for CoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        CoreError::Worker {
            message: err.to_string(),
        }
    }
}

/// Why the presence claimant could not go online.
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("no DJ Link devices are visible any more")]
    NoDevices,

    #[error("no local interface is on the same network as {address}")]
    NoInterface { address: Ipv4Addr },

    #[error("cannot list network interfaces: {reason}")]
    Interfaces { reason: String },

    #[error("no free player number is available (all of {range} are in use)")]
    NoPlayerNumber { range: String },

    #[error("address {address} is already in use by another program")]
    AddressInUse { address: SocketAddr },

    #[error("cannot bind {address}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

impl ClaimError {
    /// Map a socket bind failure into the matching claim error.
    pub fn from_bind(address: SocketAddr, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::AddrInUse {
            Self::AddressInUse { address }
        } else {
            Self::Bind { address, source }
        }
    }
}
