//! Gandi hosting CLI library
//!
//! This library provides the core functionality for the `gandictl` tool:
//! a typed client for the provider's XML-RPC API, the operation poller, the
//! SSH readiness probe, and the bootstrap handoff used by `server create`.
//!
//! ```no_run
//! use gandi_rpc::{CodecOptions, HttpTransport, DEFAULT_ENDPOINT};
//! use gandictl::client::GandiClient;
//! use gandictl::operation::{await_completion, DEFAULT_POLL_INTERVAL};
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let transport = HttpTransport::new(
//!     DEFAULT_ENDPOINT,
//!     Duration::from_secs(30),
//!     CodecOptions::nil_tolerant(),
//! )?;
//! let client = GandiClient::new(transport, "my-api-key");
//!
//! let stop = client.vm_stop(42).await?;
//! await_completion(&client, stop, DEFAULT_POLL_INTERVAL, || {}).await?;
//! # Ok(())
//! # }
//! ```

/// Configuration-management bootstrap of new servers.
pub mod bootstrap;

// Internal CLI implementation - not part of public API
#[doc(hidden)]
pub mod cli;

/// Typed client for the provider API.
pub mod client;

/// Configuration types for the CLI tool.
pub mod config;

// Internal formatting functions - not part of public API
#[doc(hidden)]
pub mod format;

pub mod operation;
pub mod probe;
pub mod prompt;
pub mod provision;

#[cfg(test)]
pub mod test_utils;
