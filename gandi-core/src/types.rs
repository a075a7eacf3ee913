//! Core types and data structures for the Gandi hosting API
//!
//! Records returned by the provider may carry nil for any optional field and
//! for collections, so every such field here accepts both a missing key and
//! an explicit null.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Terminal value of an operation's `step` field
pub const OPERATION_DONE: &str = "DONE";

/// Server state while the provider is still building it
pub const STATE_BEING_CREATED: &str = "being_created";

/// Server state once it is stopped
pub const STATE_HALTED: &str = "halted";

/// Deserialize a nil or missing collection as its default (empty) value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Asynchronous provider-side action (create, stop, delete, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Operation identifier, used to poll `operation.info`
    pub id: i64,
    /// Progress marker. `DONE` is terminal, anything else is transient.
    #[serde(default, deserialize_with = "null_as_default")]
    pub step: String,
    /// Kind of operation (`vm_create`, `disk_create`, `iface_create`, ...)
    #[serde(default, rename = "type")]
    pub op_type: Option<String>,
    /// Server the operation acts on
    #[serde(default)]
    pub vm_id: Option<i64>,
    /// Disk the operation acts on
    #[serde(default)]
    pub disk_id: Option<i64>,
    /// Network interface the operation acts on
    #[serde(default)]
    pub iface_id: Option<i64>,
}

impl Operation {
    /// Whether the operation has reached its terminal state.
    ///
    /// The comparison is exact: `"done"` is not terminal.
    pub fn is_done(&self) -> bool {
        self.step == OPERATION_DONE
    }

    /// Whether this operation is of the given kind
    pub fn is_type(&self, kind: &str) -> bool {
        self.op_type.as_deref() == Some(kind)
    }
}

/// Type tag of a network interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IfaceType {
    Public,
    Private,
    #[serde(other)]
    Unknown,
}

/// IP resource attached to a network interface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpObject {
    #[serde(default)]
    pub id: Option<i64>,
    /// Address in textual form
    pub ip: String,
    /// Reverse DNS name, when the provider assigned one
    #[serde(default)]
    pub reverse: Option<String>,
    /// IP protocol version (4 or 6)
    pub version: u8,
}

/// Network interface of a server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Iface {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "type")]
    pub iface_type: IfaceType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ips: Vec<IpObject>,
}

/// Disk attached to a server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disk {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    /// Display label (the source image name for system disks)
    #[serde(default)]
    pub label: Option<String>,
    /// Size in MB
    #[serde(default)]
    pub size: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_boot_disk: bool,
}

/// Full server (VM) record as returned by `vm.info`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hostname: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cores: i64,
    /// Memory in MB
    #[serde(default, deserialize_with = "null_as_default")]
    pub memory: i64,
    /// Creation timestamp as sent by the provider (ISO 8601 basic format)
    #[serde(default)]
    pub date_created: Option<String>,
    /// Lifecycle state (`being_created`, `running`, `halted`, ...)
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(default)]
    pub datacenter_id: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub disks: Vec<Disk>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ifaces: Vec<Iface>,
}

impl Server {
    /// Whether the provider is still building this server
    pub fn is_being_created(&self) -> bool {
        self.state == STATE_BEING_CREATED
    }

    /// Whether the server is stopped
    pub fn is_halted(&self) -> bool {
        self.state == STATE_HALTED
    }
}

/// Abbreviated server record as returned by `vm.list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmSummary {
    pub id: i64,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

/// Hosting datacenter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datacenter {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
}

/// Operating system image usable as a system disk source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(default)]
    pub os_arch: Option<String>,
    #[serde(default)]
    pub datacenter_id: Option<i64>,
    /// Disk to clone when creating a server from this image
    pub disk_id: i64,
}

/// CPU architecture filter for image listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OsArch {
    #[serde(rename = "x86-32")]
    X86_32,
    #[serde(rename = "x86-64")]
    X86_64,
}

impl OsArch {
    pub fn as_str(&self) -> &'static str {
        match self {
            OsArch::X86_32 => "x86-32",
            OsArch::X86_64 => "x86-64",
        }
    }
}

impl fmt::Display for OsArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter argument of `image.list`.
///
/// Unset filters are sent as nil rather than omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageFilter {
    pub sort_by: String,
    pub datacenter_id: Option<i64>,
    pub os_arch: Option<OsArch>,
}

impl Default for ImageFilter {
    fn default() -> Self {
        Self {
            sort_by: "label".to_string(),
            datacenter_id: None,
            os_arch: None,
        }
    }
}

/// Server request payload of `vm.create_from`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSpec {
    pub hostname: String,
    pub cores: i64,
    /// Memory in MB
    pub memory: i64,
    /// Bandwidth in KB/s
    pub bandwidth: i64,
    pub ip_version: u8,
    pub datacenter_id: i64,
    pub login: String,
    pub password: String,
}

/// System disk request payload of `vm.create_from`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskSpec {
    pub datacenter_id: i64,
    pub name: String,
}

impl DiskSpec {
    /// Disk name used when none is given explicitly
    pub fn default_name(hostname: &str) -> String {
        format!("disk_{}", hostname)
    }
}
