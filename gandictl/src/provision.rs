//! `server create`: gather the server spec, create the server, wait for it
//! to come up, and hand it over to the bootstrap.

use anyhow::{Context, Result};
use gandi_core::validation::{
    validate_bandwidth, validate_cores, validate_hostname, validate_id, validate_ip_version,
    validate_memory, validate_password,
};
use gandi_core::{
    ip_objects_of, DiskSpec, GandiError, Image, IpFilter, IpObject, Server, ServerSpec,
};
use gandi_rpc::RpcTransport;
use std::io::Write;
use tracing::{debug, info};

use crate::bootstrap::{BootstrapRequest, Bootstrapper, DEFAULT_DISTRO};
use crate::cli::CreateArgs;
use crate::client::GandiClient;
use crate::config::{CliConfig, CreateDefaults};
use crate::format::{format_detail, format_progress};
use crate::operation::await_completion;
use crate::probe::wait_until_ready;
use crate::prompt::{NumberCheck, Prompter};

/// User the bootstrap logs in as
const BOOTSTRAP_SSH_USER: &str = "root";

/// Everything `vm.create_from` needs
#[derive(Debug, Clone, PartialEq)]
pub struct CreatePlan {
    pub server: ServerSpec,
    pub disk: DiskSpec,
    pub image_id: i64,
}

/// Outcome of a successful `server create`
#[derive(Debug, Clone)]
pub struct CreatedServer {
    pub server: Server,
    pub image: Image,
    /// Public address of the requested IP version
    pub address: IpObject,
    pub password: String,
    /// Bootstrap that was run, if any
    pub bootstrap: Option<BootstrapRequest>,
}

impl CreatedServer {
    /// Host name used to reach the server: its reverse DNS name, else its IP
    pub fn host(&self) -> &str {
        self.address.reverse.as_deref().unwrap_or(&self.address.ip)
    }
}

fn resolve_number(
    value: Option<i64>,
    prompter: &dyn Prompter,
    message: &str,
    default: Option<i64>,
    check: NumberCheck,
) -> Result<i64> {
    match value {
        Some(value) => Ok(value),
        None => prompter.number(message, default, Some(check)),
    }
}

/// Resolve each spec value from its flag, else the stored default, else a
/// prompt.
///
/// Flag and stored values are not validated here; the provider rejects what
/// it does not accept.
pub fn resolve_plan(
    args: &CreateArgs,
    stored: &CreateDefaults,
    prompter: &dyn Prompter,
) -> Result<CreatePlan> {
    let hostname = match &args.server_name {
        Some(name) => name.clone(),
        None => prompter.text("Name of the server: ", None, Some(validate_hostname))?,
    };

    let cores = resolve_number(
        args.cores.or(stored.cores),
        prompter,
        "Number of CPU cores: ",
        Some(1),
        validate_cores,
    )?;

    let memory = resolve_number(
        args.memory.or(stored.memory),
        prompter,
        "Amount of memory (MB): ",
        Some(256),
        validate_memory,
    )?;

    let bandwidth = resolve_number(
        args.bandwidth.or(stored.bandwidth),
        prompter,
        "Bandwidth (MB): ",
        Some(5),
        validate_bandwidth,
    )?;
    let bandwidth = bandwidth.checked_mul(1024).ok_or_else(|| {
        GandiError::InvalidInput(format!("Bandwidth of {} MB is too large", bandwidth))
    })?;

    let ip_version = resolve_number(
        args.ip_version.or(stored.ip_version),
        prompter,
        "IP protocol version: ",
        Some(4),
        validate_ip_version,
    )?;
    let ip_version = u8::try_from(ip_version)
        .map_err(|_| GandiError::InvalidInput(format!("Unknown IP version {}", ip_version)))?;

    let datacenter_id = resolve_number(
        args.datacenter_id.or(stored.datacenter_id),
        prompter,
        "Datacenter id: ",
        None,
        validate_id,
    )?;

    // The platform refuses 'root' here; the bootstrap logs in as root anyway
    let login = match args.login.clone().or_else(|| stored.login.clone()) {
        Some(login) => login,
        None => prompter.text("Username: ", Some("admin"), None)?,
    };

    let password = match &args.password {
        Some(password) => password.clone(),
        None => prompter.secret("Password: ", Some(validate_password))?,
    };

    let disk = DiskSpec {
        datacenter_id,
        name: args
            .disk_name
            .clone()
            .unwrap_or_else(|| DiskSpec::default_name(&hostname)),
    };

    let image_id = resolve_number(
        args.image_id.or(stored.image_id),
        prompter,
        "Image id (see `gandictl image list` output): ",
        None,
        validate_id,
    )?;

    Ok(CreatePlan {
        server: ServerSpec {
            hostname,
            cores,
            memory,
            bandwidth,
            ip_version,
            datacenter_id,
            login,
            password,
        },
        disk,
        image_id,
    })
}

fn print_tick() {
    print!(".");
    let _ = std::io::stdout().flush();
}

fn bootstrap_request(
    args: &CreateArgs,
    stored: &CreateDefaults,
    created: &CreatedServer,
) -> BootstrapRequest {
    BootstrapRequest {
        host: created.host().to_string(),
        ssh_user: BOOTSTRAP_SSH_USER.to_string(),
        ssh_password: created.password.clone(),
        identity_file: args
            .identity_file
            .clone()
            .or_else(|| stored.identity_file.clone()),
        node_name: args.node_name.clone().unwrap_or_else(|| {
            BootstrapRequest::default_node_name(&created.server.hostname, created.server.id)
        }),
        run_list: args.run_list(),
        environment: args
            .environment
            .clone()
            .or_else(|| stored.environment.clone()),
        distro: args
            .distro
            .clone()
            .or_else(|| stored.distro.clone())
            .unwrap_or_else(|| DEFAULT_DISTRO.to_string()),
        bootstrap_version: args
            .bootstrap_version
            .clone()
            .or_else(|| stored.bootstrap_version.clone()),
        template_file: args
            .template_file
            .clone()
            .or_else(|| stored.template_file.clone()),
        prerelease: args.prerelease,
        use_sudo: !args.no_sudo,
    }
}

/// Create a server from `args` and bootstrap it.
///
/// Sequence: resolve the plan, `image.info`, `vm.create_from`, wait for the
/// `vm_create` operation, `vm.info`, pick the first public address of the
/// requested IP version, wait for sshd, pause for `ssh.settle_delay`, run the
/// bootstrap. With `--no-bootstrap` the last three steps are skipped.
///
/// Nothing is rolled back: a failure after `vm.create_from` leaves the server
/// in place.
pub async fn create_server<T: RpcTransport>(
    client: &GandiClient<T>,
    config: &CliConfig,
    args: &CreateArgs,
    prompter: &dyn Prompter,
    bootstrapper: &dyn Bootstrapper,
) -> Result<CreatedServer> {
    println!();
    let plan = resolve_plan(args, &config.create, prompter)?;

    let image = client
        .image_info(plan.image_id)
        .await
        .with_context(|| format!("Failed to look up image {}", plan.image_id))?;
    debug!("Image {} clones disk {}", image.label, image.disk_id);

    let operations = client
        .vm_create_from(&plan.server, &plan.disk, image.disk_id)
        .await?;
    let vm_create = operations
        .into_iter()
        .find(|op| op.is_type("vm_create"))
        .ok_or_else(|| GandiError::OperationNotFound("vm_create".to_string()))?;

    println!();
    print!("{}", format_progress("Creating the server."));
    let done = await_completion(client, vm_create.clone(), config.poll_interval(), print_tick)
        .await?;
    println!();

    let vm_id = done
        .vm_id
        .or(vm_create.vm_id)
        .context("The vm_create operation does not name the created server")?;
    let server = client.vm_info(vm_id).await?;
    info!("Server {} ({}) created", server.hostname, server.id);

    let version = plan.server.ip_version;
    let address = ip_objects_of(&server, IpFilter::public(Some(version)))
        .into_iter()
        .next()
        .cloned()
        .ok_or(GandiError::NoPublicAddress {
            server_id: server.id,
            version,
        })?;

    let mut created = CreatedServer {
        server,
        image,
        address,
        password: plan.server.password,
        bootstrap: None,
    };

    println!();
    println!(
        "{}",
        format_detail(
            "Public DNS Name",
            created.address.reverse.as_deref().unwrap_or_default()
        )
    );
    println!("{}", format_detail("Public IP Address", &created.address.ip));
    println!("{}", format_detail("Password", &created.password));

    if args.no_bootstrap {
        info!("Skipping bootstrap of {}", created.host());
    } else {
        println!();
        print!("{}", format_progress("Waiting for sshd."));
        let banner = wait_until_ready(created.host(), &config.ssh.probe_settings(), print_tick)
            .await?;
        debug!("sshd on {} is up: {:?}", created.host(), banner);
        tokio::time::sleep(config.ssh.settle_delay()).await;
        println!("done");

        let request = bootstrap_request(args, &config.create, &created);
        bootstrapper.bootstrap(&request).await?;
        created.bootstrap = Some(request);
    }

    print_summary(&created, args);
    Ok(created)
}

fn print_summary(created: &CreatedServer, args: &CreateArgs) {
    let environment = created
        .bootstrap
        .as_ref()
        .and_then(|request| request.environment.clone())
        .or_else(|| args.environment.clone())
        .unwrap_or_else(|| "_default".to_string());

    println!();
    println!("{}", format_detail("Instance ID", created.server.id));
    println!("{}", format_detail("Name", &created.server.hostname));
    println!("{}", format_detail("Memory", created.server.memory));
    println!("{}", format_detail("Cores", created.server.cores));
    println!("{}", format_detail("Image", &created.image.label));
    println!(
        "{}",
        format_detail(
            "Public DNS Name",
            created.address.reverse.as_deref().unwrap_or_default()
        )
    );
    println!("{}", format_detail("Public IP Address", &created.address.ip));
    println!("{}", format_detail("Password", &created.password));
    println!("{}", format_detail("Environment", environment));
    println!("{}", format_detail("Run List", args.run_list().join(", ")));
}
