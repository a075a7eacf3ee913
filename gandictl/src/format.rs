//! Output formatting utilities for the CLI
//!
//! Provides table and JSON formatting with colors.

use anyhow::Result;
use chrono::NaiveDateTime;
use colored::*;
use gandi_core::{boot_disk_label, public_ips_of, Datacenter, Image, Server};
use serde::Serialize;

use tabled::{settings::Style, Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Format datacenter list
pub fn format_datacenters(datacenters: &[Datacenter], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(datacenters)?),
        OutputFormat::Table => {
            #[derive(Tabled)]
            struct DatacenterRow {
                #[tabled(rename = "ID")]
                id: String,
                #[tabled(rename = "Name")]
                name: String,
                #[tabled(rename = "Country")]
                country: String,
            }

            let rows: Vec<DatacenterRow> = datacenters
                .iter()
                .map(|dc| DatacenterRow {
                    id: dc.id.to_string(),
                    name: dc.name.clone(),
                    country: dc.country.clone().unwrap_or_default(),
                })
                .collect();

            let table = Table::new(rows).with(Style::rounded()).to_string();
            Ok(format!("{}\n{}", "Datacenters:".bold(), table))
        }
    }
}

/// Format image list
pub fn format_images(images: &[Image], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(images)?),
        OutputFormat::Table => {
            #[derive(Tabled)]
            struct ImageRow {
                #[tabled(rename = "ID")]
                id: String,
                #[tabled(rename = "Name")]
                label: String,
                #[tabled(rename = "Arch")]
                arch: String,
                #[tabled(rename = "Datacenter")]
                datacenter: String,
            }

            let rows: Vec<ImageRow> = images
                .iter()
                .map(|image| ImageRow {
                    id: image.id.to_string(),
                    label: image.label.cyan().to_string(),
                    arch: image.os_arch.clone().unwrap_or_default(),
                    datacenter: image
                        .datacenter_id
                        .map(|id| id.to_string())
                        .unwrap_or_default(),
                })
                .collect();

            let table = Table::new(rows).with(Style::rounded()).to_string();
            Ok(format!("{}\n{}", "Images:".bold(), table))
        }
    }
}

/// One line of the server listing
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct ServerRow {
    #[tabled(rename = "ID")]
    pub id: i64,
    #[tabled(rename = "Hostname")]
    pub hostname: String,
    #[tabled(rename = "Date Created")]
    pub date_created: String,
    #[tabled(rename = "Cores")]
    pub cores: i64,
    #[tabled(rename = "Memory")]
    pub memory: String,
    #[tabled(rename = "Image")]
    pub image: String,
    #[tabled(rename = "State")]
    pub state: String,
    #[tabled(rename = "Public IPs")]
    pub public_ips: String,
}

impl ServerRow {
    /// Summarize `server`, listing its public addresses of `ip_version`.
    ///
    /// # Errors
    ///
    /// Fails when the server has no labelled boot disk.
    pub fn from_server(server: &Server, ip_version: u8) -> gandi_core::Result<Self> {
        Ok(Self {
            id: server.id,
            hostname: server.hostname.clone(),
            date_created: server
                .date_created
                .as_deref()
                .map(date_part)
                .unwrap_or_default(),
            cores: server.cores,
            memory: format!("{}mb", server.memory),
            image: boot_disk_label(server)?.to_string(),
            state: server.state.clone(),
            public_ips: public_ips_of(server, Some(ip_version)).join(", "),
        })
    }
}

/// Format server list
pub fn format_servers(rows: &[ServerRow], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(rows)?),
        OutputFormat::Table => {
            let table = Table::new(rows).with(Style::rounded()).to_string();
            Ok(format!("{}\n{}", "Servers:".bold(), table))
        }
    }
}

/// Calendar date of a provider timestamp (`20110615T10:23:45` → `2011-06-15`).
///
/// Unparseable input is returned up to its time separator.
pub fn date_part(timestamp: &str) -> String {
    for pattern in ["%Y%m%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(timestamp, pattern) {
            return parsed.date().to_string();
        }
    }
    timestamp
        .split('T')
        .next()
        .unwrap_or(timestamp)
        .to_string()
}

/// Format a `Label: value` detail line
pub fn format_detail(label: &str, value: impl std::fmt::Display) -> String {
    format!("{}: {}", label.cyan(), value)
}

/// Caption printed before a wait; dots follow on the same line
pub fn format_progress(caption: &str) -> String {
    caption.magenta().to_string()
}

/// Format success message
pub fn format_success(message: &str) -> String {
    format!("{} {}", "✓".green().bold(), message)
}

/// Format warning message
pub fn format_warning(message: &str) -> String {
    format!("{} {}", "WARNING:".yellow().bold(), message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn server() -> Server {
        serde_json::from_value(json!({
            "id": 7,
            "hostname": "web1",
            "cores": 2,
            "memory": 512,
            "date_created": "20110615T10:23:45",
            "state": "running",
            "disks": [
                {"id": 1, "label": "data", "is_boot_disk": false},
                {"id": 2, "label": "Ubuntu 10.04 64 bits", "is_boot_disk": true}
            ],
            "ifaces": [
                {"type": "public", "ips": [
                    {"ip": "95.142.160.10", "version": 4, "reverse": "xvm-160-10.ghst.net"},
                    {"ip": "2001:4b98:dc0::10", "version": 6}
                ]},
                {"type": "private", "ips": [{"ip": "10.0.0.2", "version": 4}]}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_format_success() {
        let message = format_success("Operation completed");
        assert!(message.contains("✓"));
        assert!(message.contains("Operation completed"));
    }

    #[test]
    fn test_format_warning() {
        let message = format_warning("Deleted server 7 named web1");
        assert!(message.contains("WARNING:"));
        assert!(message.contains("Deleted server 7 named web1"));
    }

    #[test]
    fn test_date_part() {
        assert_eq!(date_part("20110615T10:23:45"), "2011-06-15");
        assert_eq!(date_part("2011-06-15T10:23:45"), "2011-06-15");
        assert_eq!(date_part("yesterdayTnoon"), "yesterday");
    }

    #[test]
    fn test_server_row() {
        let row = ServerRow::from_server(&server(), 4).unwrap();
        assert_eq!(row.id, 7);
        assert_eq!(row.date_created, "2011-06-15");
        assert_eq!(row.memory, "512mb");
        assert_eq!(row.image, "Ubuntu 10.04 64 bits");
        assert_eq!(row.public_ips, "95.142.160.10");

        let row = ServerRow::from_server(&server(), 6).unwrap();
        assert_eq!(row.public_ips, "2001:4b98:dc0::10");
    }

    #[test]
    fn test_server_row_requires_boot_disk() {
        let mut server = server();
        server.disks.retain(|disk| !disk.is_boot_disk);
        assert!(ServerRow::from_server(&server, 4).is_err());
    }

    #[test]
    fn test_format_servers_table() {
        let rows = vec![ServerRow::from_server(&server(), 4).unwrap()];
        let output = format_servers(&rows, OutputFormat::Table).unwrap();
        assert!(output.contains("Date Created"));
        assert!(output.contains("Public IPs"));
        assert!(output.contains("web1"));
        assert!(output.contains("512mb"));
    }

    #[test]
    fn test_format_datacenters_json() {
        let dcs = vec![Datacenter {
            id: 1,
            name: "Equinix Paris".to_string(),
            country: Some("France".to_string()),
        }];
        let output = format_datacenters(&dcs, OutputFormat::Json).unwrap();
        assert!(output.contains("Equinix Paris"));
        assert!(output.contains("France"));
    }

    #[test]
    fn test_format_images_table() {
        let images = vec![Image {
            id: 42,
            label: "Debian 5 64 bits".to_string(),
            os_arch: Some("x86-64".to_string()),
            datacenter_id: Some(1),
            disk_id: 4242,
        }];
        let output = format_images(&images, OutputFormat::Table).unwrap();
        assert!(output.contains("Debian 5 64 bits"));
        assert!(output.contains("x86-64"));
        assert!(output.contains("42"));
    }
}
