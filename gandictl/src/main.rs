//! Gandi hosting CLI
//!
//! Command-line interface for listing, creating and deleting Gandi servers.

use anyhow::Result;
use clap::Parser;
use gandi_rpc::{CodecOptions, HttpTransport};
use gandictl::bootstrap::{KnifeBootstrap, DEFAULT_BOOTSTRAP_COMMAND};
use gandictl::cli::{
    generate_completion, handle_config, handle_datacenter, handle_image, handle_server, Cli,
    Commands, OutputFormat,
};
use gandictl::client::GandiClient;
use gandictl::config::{resolve_config_path, CliConfig};
use gandictl::prompt::{InquirePrompter, NonInteractive, Prompter};
use std::path::Path;
use tracing::debug;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref());

    // Build configuration using priority chain: defaults → file → env → CLI args.
    // Env and file only fill unset values, so env is applied first.
    let mut builder = CliConfig::builder().with_env_overrides();

    // Load config file (unless --no-config is specified)
    if !cli.no_config {
        builder = builder.with_config_file(Some(config_path.as_path()))?;
    }

    // Apply CLI argument overrides (highest priority)
    if let Some(ref key) = cli.api_key {
        builder = builder.with_api_key(key)?;
    }
    if let Some(ref endpoint) = cli.endpoint {
        builder = builder.with_endpoint(endpoint)?;
    }
    if let Some(ref format) = cli.format {
        builder = builder.with_output_format(format.as_str())?;
    }
    if cli.verbose {
        builder = builder.with_verbose(true);
    }

    // Build final configuration with validation
    let config = match builder.build() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            if cli.verbose {
                eprintln!("Error details: {:?}", e);
            }
            std::process::exit(1);
        }
    };

    init_tracing(config.verbose);

    let output_format = match config.output_format.as_str() {
        "json" => OutputFormat::Json,
        _ => OutputFormat::Table,
    };
    debug!("Output format: {:?}", output_format);

    let result = run(
        cli.command,
        &config,
        &config_path,
        &output_format,
        cli.non_interactive,
    )
    .await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        if config.verbose {
            eprintln!("Error details: {:?}", e);
        }
        std::process::exit(1);
    }

    Ok(())
}

fn connect(config: &CliConfig) -> Result<GandiClient<HttpTransport>> {
    let api_key = config.require_api_key()?;
    let transport = HttpTransport::new(
        &config.endpoint,
        config.request_timeout(),
        CodecOptions::nil_tolerant(),
    )?;
    debug!("Endpoint: {}", transport.endpoint());
    Ok(GandiClient::new(transport, api_key))
}

async fn run(
    command: Commands,
    config: &CliConfig,
    config_path: &Path,
    format: &OutputFormat,
    non_interactive: bool,
) -> Result<()> {
    match command {
        Commands::Datacenter { command } => {
            handle_datacenter(&connect(config)?, command, format).await
        }
        Commands::Image { command } => handle_image(&connect(config)?, command, format).await,
        Commands::Server { command } => {
            let client = connect(config)?;
            let prompter: Box<dyn Prompter> = if non_interactive {
                Box::new(NonInteractive)
            } else {
                Box::new(InquirePrompter)
            };
            let bootstrapper = KnifeBootstrap::new(
                config
                    .create
                    .bootstrap_command
                    .as_deref()
                    .unwrap_or(DEFAULT_BOOTSTRAP_COMMAND),
            );
            handle_server(
                &client,
                command,
                config,
                format,
                prompter.as_ref(),
                &bootstrapper,
            )
            .await
        }
        Commands::Config { command } => handle_config(command, config, config_path, format).await,
        Commands::Completion { shell } => {
            generate_completion(shell);
            Ok(())
        }
    }
}

/// Log to stderr so tables on stdout stay clean
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
