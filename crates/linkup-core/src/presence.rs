// ── Link collaborators ──
//
// The passive device listener and the virtual presence are owned by an
// external link library. The acquisition machinery only talks to them
// through these traits, so front ends inject real adapters and tests
// inject fakes.

use crate::error::{ClaimError, CoreError};
use crate::model::{Device, NetworkInterface, PlayerNumber};

/// Passive listener recording which link devices are currently visible.
pub trait DeviceObserver: Send + Sync {
    /// Start listening. Starting an already running observer is a no-op.
    fn start(&self) -> Result<(), CoreError>;

    fn is_running(&self) -> bool;

    /// Non-blocking snapshot of the devices visible right now.
    fn current_devices(&self) -> Vec<Device>;
}

/// Virtual participant the application injects onto the link network.
pub trait PresenceClaimant: Send + Sync {
    /// Whether to claim a real player number (1-4) instead of a virtual one.
    fn configure(&self, use_real_player_number: bool);

    /// Go online, returning the claimed player number.
    fn start(&self) -> Result<PlayerNumber, ClaimError>;

    /// Interfaces on which link traffic has been observed.
    fn matching_interfaces(&self) -> Vec<NetworkInterface>;

    /// Interface the presence was claimed on, once online.
    fn claimed_interface(&self) -> Option<NetworkInterface>;

    /// Devices seen during discovery that cannot be reached from the
    /// claimed interface.
    fn find_unreachable_peers(&self) -> Vec<Device>;
}
