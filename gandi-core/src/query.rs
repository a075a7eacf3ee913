//! Lookups over the interfaces and disks embedded in a server record

use crate::error::{GandiError, Result};
use crate::types::{Disk, IfaceType, IpObject, Server};

/// Restricts which IP objects [`ip_objects_of`] returns.
///
/// Unset fields do not filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IpFilter {
    pub iface_type: Option<IfaceType>,
    pub version: Option<u8>,
}

impl IpFilter {
    /// Public interfaces only, optionally of one IP version
    pub fn public(version: Option<u8>) -> Self {
        Self {
            iface_type: Some(IfaceType::Public),
            version,
        }
    }
}

/// Flatten the IP objects of all interfaces of `server` that match `filter`.
///
/// An interface without IPs contributes nothing.
pub fn ip_objects_of<'a>(server: &'a Server, filter: IpFilter) -> Vec<&'a IpObject> {
    server
        .ifaces
        .iter()
        .filter(|iface| filter.iface_type.map_or(true, |t| iface.iface_type == t))
        .flat_map(|iface| iface.ips.iter())
        .filter(|ip| filter.version.map_or(true, |v| ip.version == v))
        .collect()
}

/// Addresses of the public IPs of `server`
pub fn public_ips_of(server: &Server, version: Option<u8>) -> Vec<String> {
    ip_objects_of(server, IpFilter::public(version))
        .into_iter()
        .map(|ip| ip.ip.clone())
        .collect()
}

/// Reverse DNS names of the public IPs of `server`.
///
/// IPs without a reverse name yield `None`, keeping positions aligned with
/// [`public_ips_of`].
pub fn public_reverses_of(server: &Server, version: Option<u8>) -> Vec<Option<String>> {
    ip_objects_of(server, IpFilter::public(version))
        .into_iter()
        .map(|ip| ip.reverse.clone())
        .collect()
}

/// The disk `server` boots from.
///
/// # Errors
///
/// Returns [`GandiError::MissingBootDisk`] if no disk carries the flag.
pub fn boot_disk(server: &Server) -> Result<&Disk> {
    server
        .disks
        .iter()
        .find(|disk| disk.is_boot_disk)
        .ok_or(GandiError::MissingBootDisk {
            server_id: server.id,
        })
}

/// Display label of the boot disk of `server`.
pub fn boot_disk_label(server: &Server) -> Result<&str> {
    boot_disk(server)?
        .label
        .as_deref()
        .ok_or(GandiError::MissingBootDisk {
            server_id: server.id,
        })
}
