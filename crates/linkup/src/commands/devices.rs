//! Device listing: listen for announcements for a while, then report.

use std::time::Duration;

use indicatif::ProgressBar;
use serde::Serialize;
use tabled::Tabled;

use linkup_core::{Device, DeviceObserver, NetworkInterface, SystemInterfaces};

use crate::cli::{DevicesArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::link::UdpDeviceObserver;
use crate::output;

use super::interfaces::usable_interfaces;

/// A sighted device and the interface it can be reached through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct SightedDevice {
    #[serde(flatten)]
    device: Device,
    interface: Option<String>,
}

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Player")]
    number: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Interface")]
    interface: String,
}

impl From<&SightedDevice> for DeviceRow {
    fn from(d: &SightedDevice) -> Self {
        Self {
            name: d.device.name.clone(),
            number: d.device.number.map(|n| n.to_string()).unwrap_or_default(),
            address: d.device.address.to_string(),
            interface: d.interface.clone().unwrap_or_else(|| "-".into()),
        }
    }
}

fn attach_interfaces(devices: Vec<Device>, interfaces: &[NetworkInterface]) -> Vec<SightedDevice> {
    devices
        .into_iter()
        .map(|device| SightedDevice {
            interface: interfaces
                .iter()
                .find(|iface| iface.reaches(device.address))
                .map(|iface| iface.name.clone()),
            device,
        })
        .collect()
}

pub async fn handle(args: DevicesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let observer = UdpDeviceObserver::new(cfg.presence.announce_port, cfg.device_timeout());
    observer.start()?;
    tracing::debug!(port = observer.port(), wait = args.wait, "collecting announcements");

    let spinner = if global.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    spinner.set_message(format!("Listening for DJ Link devices for {}s...", args.wait));
    spinner.enable_steady_tick(Duration::from_millis(100));
    tokio::time::sleep(Duration::from_secs(args.wait)).await;
    spinner.finish_and_clear();

    let devices = observer.current_devices();
    observer.stop();
    let sighted = attach_interfaces(devices, &usable_interfaces(&SystemInterfaces)?);

    let out = output::render_list(
        &global.output,
        &sighted,
        |d| DeviceRow::from(d),
        |d| d.device.description(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
