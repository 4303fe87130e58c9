// ── Domain model ──

pub mod device;
pub mod interface;

pub use device::{Device, MAX_PLAYER_NUMBER, PlayerNumber, REAL_PLAYER_NUMBERS};
pub use interface::{Ipv4Binding, NO_IPV4_ADDRESSES, NetworkInterface};
