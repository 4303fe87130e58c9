//! Interface listing: the same view the troubleshooting report gives.

use tabled::Tabled;

use linkup_core::{InterfaceSource, NetworkInterface, SystemInterfaces};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct InterfaceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Display Name")]
    display_name: String,
    #[tabled(rename = "IPv4")]
    ipv4: String,
}

impl From<&NetworkInterface> for InterfaceRow {
    fn from(iface: &NetworkInterface) -> Self {
        Self {
            name: iface.name.clone(),
            display_name: iface.display_name.clone(),
            ipv4: iface.ipv4_summary(),
        }
    }
}

/// Usable interfaces, ordered like the troubleshooting report.
pub fn usable_interfaces(source: &dyn InterfaceSource) -> Result<Vec<NetworkInterface>, CliError> {
    let mut interfaces: Vec<NetworkInterface> = source
        .interfaces()?
        .into_iter()
        .filter(NetworkInterface::is_usable)
        .collect();
    interfaces.sort_by_key(NetworkInterface::describe);
    Ok(interfaces)
}

pub fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let interfaces = usable_interfaces(&SystemInterfaces)?;
    let out = output::render_list(
        &global.output,
        &interfaces,
        |iface| InterfaceRow::from(iface),
        NetworkInterface::describe,
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
