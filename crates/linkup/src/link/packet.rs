// ── DJ Link announcement packets ──
//
// Only the keep-alive layout is understood: enough to name a device, learn
// its player number and announce our own presence. Anything else carrying
// the header magic still counts as a sighting.

use std::net::Ipv4Addr;
use std::ops::Range;

use linkup_core::{Device, PlayerNumber};

/// Every DJ Link packet starts with these bytes.
pub const MAGIC: &[u8; 10] = b"Qspt1WmJOL";

const KIND_OFFSET: usize = 0x0a;
const KEEP_ALIVE: u8 = 0x06;
const NAME: Range<usize> = 0x0c..0x20;
const NUMBER_OFFSET: usize = 0x24;
const DEVICE_KIND_OFFSET: usize = 0x25;
const IP: Range<usize> = 0x2c..0x30;
const KEEP_ALIVE_LEN: usize = 0x36;
const KEEP_ALIVE_LEN_BYTES: [u8; 2] = [0x00, 0x36];

/// Device kind byte announced by players.
const PLAYER_KIND: u8 = 0x01;

/// Interpret a datagram received from `from`. `None` unless it carries the magic.
pub fn parse_announcement(data: &[u8], from: Ipv4Addr) -> Option<Device> {
    if !data.starts_with(MAGIC) {
        return None;
    }
    let fallback = Device::new(format!("device@{from}"), from);
    if data.get(KIND_OFFSET) != Some(&KEEP_ALIVE) || data.len() < KEEP_ALIVE_LEN {
        return Some(fallback);
    }

    let name = data
        .get(NAME)
        .map(|raw| String::from_utf8_lossy(raw).trim_end_matches('\0').trim().to_owned())
        .filter(|name| !name.is_empty());
    let mut device = match name {
        Some(name) => Device::new(name, from),
        None => fallback,
    };
    if let Some(&number) = data.get(NUMBER_OFFSET).filter(|n| **n != 0) {
        device = device.with_number(number);
    }
    Some(device)
}

/// Keep-alive announcing `name` as player `number` at `address`.
pub fn keep_alive(name: &str, number: PlayerNumber, address: Ipv4Addr) -> Vec<u8> {
    let mut packet = vec![0_u8; KEEP_ALIVE_LEN];
    packet[..MAGIC.len()].copy_from_slice(MAGIC);
    packet[KIND_OFFSET] = KEEP_ALIVE;

    let name = name.as_bytes();
    let len = name.len().min(NAME.len());
    packet[NAME.start..NAME.start + len].copy_from_slice(&name[..len]);

    packet[0x20] = 0x01;
    packet[0x21] = 0x02;
    packet[0x22..0x24].copy_from_slice(&KEEP_ALIVE_LEN_BYTES);
    packet[NUMBER_OFFSET] = number;
    packet[DEVICE_KIND_OFFSET] = PLAYER_KIND;
    // MAC (0x26..0x2c) stays zeroed; virtual participants have none.
    packet[IP].copy_from_slice(&address.octets());
    packet[0x30] = 0x01;
    packet[0x34] = PLAYER_KIND;
    packet
}
