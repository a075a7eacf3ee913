//! Command execution handlers

use anyhow::{Context, Result};
use colored::*;
use gandi_core::{boot_disk_label, GandiError, Image, ImageFilter, OsArch, Server};
use gandi_rpc::RpcTransport;
use std::path::Path;
use tracing::{debug, info};

use crate::bootstrap::Bootstrapper;
use crate::client::GandiClient;
use crate::config::CliConfig;
use crate::format::{
    format_datacenters, format_detail, format_images, format_progress, format_servers,
    format_success, format_warning, ServerRow,
};
use crate::operation::await_completion;
use crate::prompt::Prompter;
use crate::provision::create_server;

use super::commands::*;

fn print_tick() {
    use std::io::Write;
    print!(".");
    let _ = std::io::stdout().flush();
}

/// Handle datacenter commands
pub async fn handle_datacenter<T: RpcTransport>(
    client: &GandiClient<T>,
    command: DatacenterCommands,
    format: &OutputFormat,
) -> Result<()> {
    match command {
        DatacenterCommands::List => {
            let datacenters = client.datacenter_list().await?;
            println!("{}", format_datacenters(&datacenters, format.into())?);
        }
    }

    Ok(())
}

/// Handle image commands
pub async fn handle_image<T: RpcTransport>(
    client: &GandiClient<T>,
    command: ImageCommands,
    format: &OutputFormat,
) -> Result<()> {
    match command {
        ImageCommands::List {
            datacenter_id,
            arch_32,
            arch_64,
        } => {
            let images = list_images(client, datacenter_id, arch_32, arch_64).await?;
            println!("{}", format_images(&images, format.into())?);
        }
    }

    Ok(())
}

/// Images sorted by label, narrowed to a datacenter and/or an architecture
pub async fn list_images<T: RpcTransport>(
    client: &GandiClient<T>,
    datacenter_id: Option<i64>,
    arch_32: bool,
    arch_64: bool,
) -> Result<Vec<Image>> {
    let os_arch = match (arch_32, arch_64) {
        (true, _) => Some(OsArch::X86_32),
        (_, true) => Some(OsArch::X86_64),
        _ => None,
    };
    if let Some(arch) = os_arch {
        debug!("Restricting images to {}", arch);
    }

    let filter = ImageFilter {
        datacenter_id,
        os_arch,
        ..Default::default()
    };
    Ok(client.image_list(&filter).await?)
}

/// Handle server commands
pub async fn handle_server<T: RpcTransport>(
    client: &GandiClient<T>,
    command: ServerCommands,
    config: &CliConfig,
    format: &OutputFormat,
    prompter: &dyn Prompter,
    bootstrapper: &dyn Bootstrapper,
) -> Result<()> {
    match command {
        ServerCommands::List { ip_version } => {
            let rows = list_servers(client, ip_version).await?;
            println!("{}", format_servers(&rows, format.into())?);
        }
        ServerCommands::Create(args) => {
            create_server(client, config, &args, prompter, bootstrapper).await?;
        }
        ServerCommands::Delete { server_id, yes } => {
            delete_server(client, config, server_id, yes, prompter).await?;
        }
    }

    Ok(())
}

/// One row per server, each fetched in full with `vm.info`
pub async fn list_servers<T: RpcTransport>(
    client: &GandiClient<T>,
    ip_version: u8,
) -> Result<Vec<ServerRow>> {
    let mut rows = Vec::new();
    for summary in client.vm_list().await? {
        let server = client.vm_info(summary.id).await?;
        rows.push(ServerRow::from_server(&server, ip_version)?);
    }
    Ok(rows)
}

fn print_server_details(server: &Server) {
    println!();
    println!("{}", format_detail("Server ID", server.id));
    println!("{}", format_detail("Name", server.hostname.bold()));
    if let Some(description) = &server.description {
        println!("{}", format_detail("Description", description));
    }
    println!("{}", format_detail("Memory", server.memory));
    println!("{}", format_detail("Cores", server.cores));
    println!(
        "{}",
        format_detail(
            "Datacenter ID",
            server
                .datacenter_id
                .map(|id| id.to_string())
                .unwrap_or_default()
        )
    );
    // Servers still being created may not have their boot disk yet
    let image = boot_disk_label(server).unwrap_or("-");
    println!("{}", format_detail("Image", image));
    println!("{}", format_detail("State", &server.state));
}

/// Stop (unless already halted) and delete a server.
///
/// Refused while the server is still being created. Declining the
/// confirmation returns [`GandiError::Cancelled`] before anything changes.
pub async fn delete_server<T: RpcTransport>(
    client: &GandiClient<T>,
    config: &CliConfig,
    server_id: i64,
    assume_yes: bool,
    prompter: &dyn Prompter,
) -> Result<()> {
    let server = client.vm_info(server_id).await?;
    print_server_details(&server);

    if server.is_being_created() {
        return Err(GandiError::Precondition(
            "This server is being created, wait for this to end and try again".to_string(),
        )
        .into());
    }

    println!();
    println!("===============================================");
    if !assume_yes && !prompter.confirm("Do you really want to delete this server?")? {
        return Err(GandiError::Cancelled.into());
    }

    if !server.is_halted() {
        println!();
        print!("{}", format_progress("Stopping server."));
        let stop = client.vm_stop(server.id).await?;
        await_completion(client, stop, config.poll_interval(), print_tick).await?;
    }

    let delete = client.vm_delete(server.id).await?;
    println!("\n");
    print!("{}", format_progress("Deleting server."));
    await_completion(client, delete, config.poll_interval(), print_tick).await?;

    println!("\n");
    info!("Deleted server {} ({})", server.id, server.hostname);
    println!(
        "{}",
        format_warning(&format!(
            "Deleted server {} named {}",
            server.id.to_string().bold(),
            server.hostname.bold()
        ))
    );

    Ok(())
}

/// Handle config commands.
///
/// `set` and `reset` edit the config file itself, not the merged
/// configuration, so values coming from flags or the environment are never
/// written out.
pub async fn handle_config(
    command: ConfigCommands,
    current_config: &CliConfig,
    config_path: &Path,
    format: &OutputFormat,
) -> Result<()> {
    match command {
        ConfigCommands::Show => match format {
            OutputFormat::Json => {
                let mut shown = current_config.clone();
                shown.api_key = shown.api_key.map(|_| "********".to_string());
                println!("{}", serde_json::to_string_pretty(&shown)?);
            }
            OutputFormat::Table => {
                let api_key = match &current_config.api_key {
                    Some(_) => "set".green().to_string(),
                    None => "not set".red().to_string(),
                };
                println!("CLI Configuration ({}):", config_path.display());
                println!("{:<20} Value", "Setting");
                println!("{}", "-".repeat(40));
                println!("{:<20} {}", "API key", api_key);
                println!("{:<20} {}", "Endpoint", current_config.endpoint);
                println!("{:<20} {}", "Output Format", current_config.output_format);
                println!("{:<20} {}", "Verbose", current_config.verbose);
                println!("{:<20} {}s", "Timeout", current_config.timeout);
                println!("{:<20} {}s", "Poll Interval", current_config.poll_interval);
                println!("{:<20} {}", "SSH Port", current_config.ssh.port);
                println!("{:<20} {}s", "Settle Delay", current_config.ssh.settle_delay);
                let create = toml::to_string(&current_config.create)?;
                if !create.trim().is_empty() {
                    println!();
                    println!("[create]");
                    print!("{}", create);
                }
            }
        },
        ConfigCommands::Set { key, value } => {
            let mut config = CliConfig::load_from(config_path)?;
            config.set_value(&key, &value)?;
            config
                .save_to(config_path)
                .with_context(|| format!("Failed to save {}", config_path.display()))?;

            let shown = if key == "api_key" { "********" } else { value.as_str() };
            println!("{}", format_success(&format!("Set {} = {}", key, shown)));
        }
        ConfigCommands::Reset => {
            CliConfig::default().save_to(config_path)?;
            println!("{}", format_success("Configuration reset to defaults"));
        }
    }

    Ok(())
}

/// Generate shell completion script
pub fn generate_completion(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}
