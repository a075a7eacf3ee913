//! Handoff to the configuration-management bootstrap.
//!
//! Installing the agent is delegated to an external bootstrap command (by
//! default `knife bootstrap`); this module only assembles its invocation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tracing::{debug, info};

/// Bootstrap command used when none is configured
pub const DEFAULT_BOOTSTRAP_COMMAND: &str = "knife bootstrap";

/// Bootstrap template used when none is configured
pub const DEFAULT_DISTRO: &str = "ubuntu10.04-gems";

/// Everything the bootstrap needs to reach and enrol a new server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapRequest {
    /// Address the bootstrap connects to
    pub host: String,
    pub ssh_user: String,
    pub ssh_password: String,
    pub identity_file: Option<String>,
    /// Name the node registers under
    pub node_name: String,
    pub run_list: Vec<String>,
    pub environment: Option<String>,
    pub distro: String,
    pub bootstrap_version: Option<String>,
    pub template_file: Option<String>,
    /// Install pre-release agent packages
    pub prerelease: bool,
    pub use_sudo: bool,
}

impl BootstrapRequest {
    /// Node name used when none is given: `<hostname>_gandi-<id>`
    pub fn default_node_name(hostname: &str, server_id: i64) -> String {
        format!("{}_gandi-{}", hostname, server_id)
    }
}

/// Trait for bootstrap abstraction
///
/// This trait enables testing of the create flow without spawning processes.
#[async_trait]
pub trait Bootstrapper: Send + Sync {
    /// Run the bootstrap to completion
    async fn bootstrap(&self, request: &BootstrapRequest) -> Result<()>;
}

/// Runs an external bootstrap command with stdio inherited
#[derive(Debug, Clone)]
pub struct KnifeBootstrap {
    command: String,
}

impl Default for KnifeBootstrap {
    fn default() -> Self {
        Self::new(DEFAULT_BOOTSTRAP_COMMAND)
    }
}

impl KnifeBootstrap {
    /// Create a bootstrapper running `command`, split on whitespace
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Full argument vector for `request`, program first.
    ///
    /// The SSH password is passed as `--ssh-password <password>`, as `knife
    /// bootstrap` expects, so it shows in the process list while the
    /// bootstrap runs. Only the argument count is logged.
    pub fn command_line(&self, request: &BootstrapRequest) -> Vec<String> {
        let mut args: Vec<String> = self.command.split_whitespace().map(String::from).collect();

        args.push(request.host.clone());
        args.extend(["--ssh-user".to_string(), request.ssh_user.clone()]);
        args.extend(["--ssh-password".to_string(), request.ssh_password.clone()]);
        if let Some(identity) = &request.identity_file {
            args.extend(["--identity-file".to_string(), identity.clone()]);
        }
        args.extend(["--node-name".to_string(), request.node_name.clone()]);
        if !request.run_list.is_empty() {
            args.extend(["--run-list".to_string(), request.run_list.join(",")]);
        }
        if let Some(environment) = &request.environment {
            args.extend(["--environment".to_string(), environment.clone()]);
        }
        args.extend(["--distro".to_string(), request.distro.clone()]);
        if let Some(version) = &request.bootstrap_version {
            args.extend(["--bootstrap-version".to_string(), version.clone()]);
        }
        if let Some(template) = &request.template_file {
            args.extend(["--template-file".to_string(), template.clone()]);
        }
        if request.prerelease {
            args.push("--prerelease".to_string());
        }
        if request.use_sudo {
            args.push("--sudo".to_string());
        }

        args
    }
}

#[async_trait]
impl Bootstrapper for KnifeBootstrap {
    async fn bootstrap(&self, request: &BootstrapRequest) -> Result<()> {
        let args = self.command_line(request);
        let (program, rest) = args
            .split_first()
            .context("Bootstrap command is empty")?;

        info!("Bootstrapping {} as node '{}'", request.host, request.node_name);
        debug!("Running {} with {} arguments", program, rest.len());

        let status = tokio::process::Command::new(program)
            .args(rest)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .with_context(|| format!("Failed to run bootstrap command '{}'", program))?;

        if !status.success() {
            return Err(anyhow::anyhow!(
                "Bootstrap of {} failed ({})",
                request.host,
                status
            ));
        }

        Ok(())
    }
}
