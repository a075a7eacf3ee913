//! Gandi Core Library
//!
//! Shared types, lookups, and errors for the Gandi hosting CLI.
//! This crate is used by both the RPC transport and the CLI.

pub mod config;
pub mod error;
pub mod query;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use config::default_config_path;
pub use error::*;
pub use query::{
    boot_disk, boot_disk_label, ip_objects_of, public_ips_of, public_reverses_of, IpFilter,
};
pub use types::*;
